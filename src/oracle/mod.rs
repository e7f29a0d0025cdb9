// SPDX-License-Identifier: Apache-2.0

//! The boolean oracle capability consumed by the encoder and CEGIS engine.
//!
//! An oracle context accepts terms from a `TermStore`, answers satisfiability
//! queries, and hands back witnesses that can evaluate any term. Contexts are
//! independent: creating a new one never shares state with another.

pub mod varisat_backend;

use std::fmt;

use crate::term::{TermRef, TermStore, VarId};

pub use varisat_backend::VarisatOracle;

#[derive(Debug)]
pub enum OracleError {
    SolverError(String),
}

impl fmt::Display for OracleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OracleError::SolverError(msg) => write!(f, "solver error: {}", msg),
        }
    }
}

impl std::error::Error for OracleError {}

#[derive(Debug)]
pub enum CheckResult<W> {
    Sat(W),
    Unsat,
}

pub trait Witness {
    /// The value the oracle chose for `var`, or `None` if the context never
    /// saw the variable.
    fn value(&self, var: VarId) -> Option<bool>;

    /// Evaluates `term`, completing unseen variables with `default`.
    fn eval_with_default(
        &self,
        store: &TermStore,
        term: TermRef,
        default: &mut impl FnMut(VarId) -> bool,
    ) -> bool {
        let mut value_of = |var: VarId| self.value(var).unwrap_or_else(|| default(var));
        store.eval(term, &mut value_of)
    }

    /// Evaluates `term`, completing unseen variables with `false`.
    fn eval(&self, store: &TermStore, term: TermRef) -> bool {
        self.eval_with_default(store, term, &mut |_| false)
    }
}

pub trait Oracle: Sized {
    type Witness: Witness;

    /// Creates a fresh, empty, independent context.
    fn new_context() -> Self;

    /// Adds `term` as a permanent assertion.
    fn assert_term(&mut self, store: &TermStore, term: TermRef) -> Result<(), OracleError>;

    fn check(&mut self) -> Result<CheckResult<Self::Witness>, OracleError>;
}

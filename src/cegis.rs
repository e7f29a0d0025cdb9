// SPDX-License-Identifier: Apache-2.0

//! Counterexample-guided synthesis of parameterized gate tables.
//!
//! Each iteration asks the long-lived synthesis context for a candidate
//! parameter assignment, then checks the candidate against the whole input
//! space in a fresh verification context. A counterexample is turned into a
//! direct constraint on the parameters by simulating the implementation, so
//! the synthesis context only ever sees small gate-local constraints.

use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::ser::{Serialize, Serializer};

use crate::circuit::CircuitError;
use crate::encoder::Encoding;
use crate::oracle::{CheckResult, Oracle, OracleError, Witness};
use crate::term::TermRef;
use crate::truth_table::{row_index, row_inputs};

#[derive(Debug, Clone)]
pub struct CegisOptions {
    pub max_iterations: usize,
}

impl Default for CegisOptions {
    fn default() -> Self {
        Self {
            max_iterations: 10_000,
        }
    }
}

/// A primary-input assignment, in the implementation's primary-input order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TestVector {
    pub assignment: Vec<(String, bool)>,
}

impl TestVector {
    pub fn get(&self, name: &str) -> Option<bool> {
        self.assignment
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| *v)
    }

    pub fn to_map(&self) -> HashMap<String, bool> {
        self.assignment.iter().cloned().collect()
    }
}

impl fmt::Display for TestVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .assignment
            .iter()
            .map(|(name, value)| format!("{}={}", name, if *value { 1 } else { 0 }))
            .collect();
        write!(f, "{}", parts.join(" "))
    }
}

impl Serialize for TestVector {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.assignment.iter().map(|(name, value)| (name, value)))
    }
}

/// Synthesized truth-table rows per gate, in implementation dependency order.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct ParamAssignment {
    gates: Vec<(String, Vec<bool>)>,
}

impl ParamAssignment {
    pub fn get(&self, gate: &str) -> Option<&[bool]> {
        self.gates
            .iter()
            .find(|(name, _)| name == gate)
            .map(|(_, bits)| bits.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[bool])> {
        self.gates
            .iter()
            .map(|(name, bits)| (name.as_str(), bits.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.gates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.gates.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum FailureReason {
    /// No parameter assignment satisfies the accumulated counterexamples.
    Infeasible,
    BudgetExhausted,
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::Infeasible => write!(f, "no valid solution exists"),
            FailureReason::BudgetExhausted => write!(f, "iteration limit reached"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CegisOutcome {
    Success {
        assignment: ParamAssignment,
        iterations: usize,
        counterexamples: Vec<TestVector>,
    },
    Failed {
        iterations: usize,
        counterexamples: Vec<TestVector>,
        reason: FailureReason,
    },
}

impl CegisOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, CegisOutcome::Success { .. })
    }

    pub fn iterations(&self) -> usize {
        match self {
            CegisOutcome::Success { iterations, .. } | CegisOutcome::Failed { iterations, .. } => {
                *iterations
            }
        }
    }

    pub fn counterexamples(&self) -> &[TestVector] {
        match self {
            CegisOutcome::Success {
                counterexamples, ..
            }
            | CegisOutcome::Failed {
                counterexamples, ..
            } => counterexamples,
        }
    }
}

#[derive(Debug)]
pub enum CegisError {
    Oracle(OracleError),
    Circuit(CircuitError),
}

impl fmt::Display for CegisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CegisError::Oracle(e) => write!(f, "oracle failure during CEGIS: {}", e),
            CegisError::Circuit(e) => write!(f, "circuit error during CEGIS: {}", e),
        }
    }
}

impl std::error::Error for CegisError {}

impl From<OracleError> for CegisError {
    fn from(e: OracleError) -> Self {
        CegisError::Oracle(e)
    }
}

impl From<CircuitError> for CegisError {
    fn from(e: CircuitError) -> Self {
        CegisError::Circuit(e)
    }
}

/// One CEGIS run over an encoding. Owns the synthesis context for the
/// lifetime of the run.
pub struct CegisEngine<'e, 'c, O: Oracle> {
    encoding: &'e mut Encoding<'c>,
    synth: O,
    /// Per parameterized gate, the implementation's original table rows; used
    /// to complete parameters the synthesis witness leaves unconstrained.
    original_rows: Vec<Vec<bool>>,
    counterexamples: Vec<TestVector>,
    seen: HashSet<TestVector>,
}

impl<'e, 'c, O: Oracle> CegisEngine<'e, 'c, O> {
    pub fn new(encoding: &'e mut Encoding<'c>) -> Result<Self, CegisError> {
        let mut original_rows = Vec::with_capacity(encoding.param_gates.len());
        for param_gate in &encoding.param_gates {
            let gate = encoding
                .impl_circuit
                .get_gate(&param_gate.gate_name)
                .ok_or_else(|| CircuitError::UnknownGate(param_gate.gate_name.clone()))?;
            let arity = gate.num_inputs();
            let rows: Vec<bool> = (0..(1usize << arity))
                .map(|row| gate.truth_table.evaluate(&row_inputs(row, arity)))
                .collect();
            original_rows.push(rows);
        }
        Ok(CegisEngine {
            encoding,
            synth: O::new_context(),
            original_rows,
            counterexamples: Vec::new(),
            seen: HashSet::new(),
        })
    }

    pub fn counterexamples(&self) -> &[TestVector] {
        &self.counterexamples
    }

    /// Asks the synthesis context for a candidate; `None` if the accumulated
    /// constraints are unsatisfiable.
    fn propose(&mut self) -> Result<Option<Vec<Vec<bool>>>, CegisError> {
        let witness = match self.synth.check()? {
            CheckResult::Unsat => return Ok(None),
            CheckResult::Sat(witness) => witness,
        };
        let store = &self.encoding.terms;
        let mut candidate = Vec::with_capacity(self.encoding.param_gates.len());
        for (param_gate, original) in self.encoding.param_gates.iter().zip(&self.original_rows) {
            let bits: Vec<bool> = param_gate
                .params
                .iter()
                .zip(original.iter())
                .map(|(param, default)| witness.eval_with_default(store, *param, &mut |_| *default))
                .collect();
            candidate.push(bits);
        }
        Ok(Some(candidate))
    }

    /// Checks the candidate against every input assignment in a fresh
    /// context; returns a counterexample if one exists.
    fn verify(&mut self, candidate: &[Vec<bool>]) -> Result<Option<TestVector>, CegisError> {
        let encoding = &mut *self.encoding;
        let mut verifier = O::new_context();
        verifier.assert_term(&encoding.terms, encoding.behavior)?;
        for (param_gate, bits) in encoding.param_gates.iter().zip(candidate) {
            for (param, bit) in param_gate.params.iter().zip(bits) {
                let pinned = if *bit {
                    *param
                } else {
                    encoding.terms.not(*param)
                };
                verifier.assert_term(&encoding.terms, pinned)?;
            }
        }
        let incorrect = encoding.terms.not(encoding.correctness);
        verifier.assert_term(&encoding.terms, incorrect)?;
        match verifier.check()? {
            CheckResult::Unsat => Ok(None),
            CheckResult::Sat(witness) => {
                let assignment = encoding
                    .inputs
                    .iter()
                    .map(|(name, term)| (name.clone(), witness.eval(&encoding.terms, *term)))
                    .collect();
                Ok(Some(TestVector { assignment }))
            }
        }
    }

    /// Builds the parameter constraint implied by `cex`: each parameterized
    /// gate must produce the specification gate's value on the input pattern
    /// the implementation presents to it.
    fn constraint_for(
        &mut self,
        cex: &TestVector,
        candidate: &[Vec<bool>],
    ) -> Result<TermRef, CegisError> {
        let encoding = &mut *self.encoding;
        let values = encoding.impl_circuit.simulate(&cex.to_map())?;
        let mut literals: Vec<TermRef> = Vec::with_capacity(encoding.param_gates.len());
        let mut candidate_satisfies = true;
        for (param_gate, bits) in encoding.param_gates.iter().zip(candidate) {
            let gate = encoding
                .impl_circuit
                .get_gate(&param_gate.gate_name)
                .ok_or_else(|| CircuitError::UnknownGate(param_gate.gate_name.clone()))?;
            let spec_gate = encoding
                .spec_circuit
                .get_gate(&param_gate.gate_name)
                .ok_or_else(|| CircuitError::UnknownGate(param_gate.gate_name.clone()))?;
            let gate_inputs: Vec<bool> = gate.inputs.iter().map(|net| values[net]).collect();
            let row = row_index(&gate_inputs);
            let expected = spec_gate.truth_table.evaluate(&gate_inputs);
            log::debug!(
                "cegis; constraint {}[{}] = {} (inputs {:?})",
                param_gate.gate_name,
                row,
                expected,
                gate_inputs
            );
            if bits[row] != expected {
                candidate_satisfies = false;
            }
            let param = param_gate.params[row];
            literals.push(if expected {
                param
            } else {
                encoding.terms.not(param)
            });
        }
        let constraint = encoding.terms.and(&literals);
        if !candidate_satisfies {
            return Ok(constraint);
        }
        // The gate-local constraint does not exclude the current candidate;
        // exclude its exact parameter vector as well.
        if !encoding.param_gates.is_empty() {
            log::warn!(
                "cegis; counterexample {} does not refute the candidate; adding blocking clause",
                cex
            );
        }
        let mut differs: Vec<TermRef> = Vec::new();
        for (param_gate, bits) in encoding.param_gates.iter().zip(candidate) {
            for (param, bit) in param_gate.params.iter().zip(bits) {
                differs.push(if *bit {
                    encoding.terms.not(*param)
                } else {
                    *param
                });
            }
        }
        // With no parameters this is constant false.
        let blocking = encoding.terms.or(&differs);
        Ok(encoding.terms.and(&[constraint, blocking]))
    }

    fn to_assignment(&self, candidate: Vec<Vec<bool>>) -> ParamAssignment {
        ParamAssignment {
            gates: self
                .encoding
                .param_gates
                .iter()
                .map(|g| g.gate_name.clone())
                .zip(candidate)
                .collect(),
        }
    }

    pub fn run(mut self, options: &CegisOptions) -> Result<CegisOutcome, CegisError> {
        for iteration in 1..=options.max_iterations {
            log::info!(
                "cegis; iteration: {} counterexamples: {}",
                iteration,
                self.counterexamples.len()
            );
            let candidate = match self.propose()? {
                Some(candidate) => candidate,
                None => {
                    log::info!("cegis; no candidate satisfies the counterexamples");
                    return Ok(CegisOutcome::Failed {
                        iterations: iteration,
                        counterexamples: self.counterexamples,
                        reason: FailureReason::Infeasible,
                    });
                }
            };
            log::debug!("cegis; candidate: {:?}", candidate);
            let cex = match self.verify(&candidate)? {
                Some(cex) => cex,
                None => {
                    log::info!("cegis; candidate verified at iteration {}", iteration);
                    let assignment = self.to_assignment(candidate);
                    return Ok(CegisOutcome::Success {
                        assignment,
                        iterations: iteration,
                        counterexamples: self.counterexamples,
                    });
                }
            };
            log::debug!("cegis; counterexample: {}", cex);
            let constraint = self.constraint_for(&cex, &candidate)?;
            self.synth.assert_term(&self.encoding.terms, constraint)?;
            if self.seen.insert(cex.clone()) {
                self.counterexamples.push(cex);
            }
        }
        log::info!(
            "cegis; iteration budget of {} exhausted",
            options.max_iterations
        );
        Ok(CegisOutcome::Failed {
            iterations: options.max_iterations,
            counterexamples: self.counterexamples,
            reason: FailureReason::BudgetExhausted,
        })
    }
}

/// Runs CEGIS to completion over `encoding` with a fresh synthesis context.
pub fn run<O: Oracle>(
    encoding: &mut Encoding<'_>,
    options: &CegisOptions,
) -> Result<CegisOutcome, CegisError> {
    CegisEngine::<O>::new(encoding)?.run(options)
}

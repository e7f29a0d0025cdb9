// SPDX-License-Identifier: Apache-2.0

//! Oracle backend over the varisat CDCL solver.
//!
//! Terms are lowered to CNF with Tseitin clauses; each context keeps its own
//! term-to-literal cache, so a term shared by two contexts is lowered once per
//! context.

use std::collections::{HashMap, HashSet};

use varisat::{ExtendFormula, Lit};

use crate::oracle::{CheckResult, Oracle, OracleError, Witness};
use crate::term::{TermNode, TermRef, TermStore, VarId};

pub struct VarisatOracle {
    solver: varisat::Solver<'static>,
    term_to_lit: HashMap<TermRef, Lit>,
    var_to_lit: HashMap<VarId, Lit>,
    true_lit: Option<Lit>,
}

#[derive(Debug, Clone)]
pub struct VarisatWitness {
    values: HashMap<VarId, bool>,
}

impl Witness for VarisatWitness {
    fn value(&self, var: VarId) -> Option<bool> {
        self.values.get(&var).copied()
    }
}

// Tseitin clauses for: output <=> AND(operands)
// (output ∨ ¬a1 ∨ ... ∨ ¬an), and (¬output ∨ ai) for every i.
fn add_tseitsin_and(solver: &mut impl ExtendFormula, operands: &[Lit], output: Lit) {
    let mut clause: Vec<Lit> = operands.iter().map(|l| !*l).collect();
    clause.push(output);
    solver.add_clause(&clause);
    for operand in operands {
        solver.add_clause(&[*operand, !output]);
    }
}

// Tseitin clauses for: output <=> OR(operands)
// (¬output ∨ a1 ∨ ... ∨ an), and (output ∨ ¬ai) for every i.
fn add_tseitsin_or(solver: &mut impl ExtendFormula, operands: &[Lit], output: Lit) {
    let mut clause: Vec<Lit> = operands.to_vec();
    clause.push(!output);
    solver.add_clause(&clause);
    for operand in operands {
        solver.add_clause(&[!*operand, output]);
    }
}

// Clauses for m = c ? t : e are:
// (!c | !t | m) & (!c | t | !m) & (c | !e | m) & (c | e | !m)
fn add_tseitsin_ite(solver: &mut impl ExtendFormula, c: Lit, t: Lit, e: Lit, output: Lit) {
    solver.add_clause(&[!c, !t, output]);
    solver.add_clause(&[!c, t, !output]);
    solver.add_clause(&[c, !e, output]);
    solver.add_clause(&[c, e, !output]);
}

// Clauses for m = a XOR b are:
// (!a | !b | !m) & (a | b | !m) & (a | !b | m) & (!a | b | m)
fn add_tseitsin_xor(solver: &mut impl ExtendFormula, a: Lit, b: Lit, output: Lit) {
    solver.add_clause(&[!a, !b, !output]);
    solver.add_clause(&[a, b, !output]);
    solver.add_clause(&[a, !b, output]);
    solver.add_clause(&[!a, b, output]);
}

impl VarisatOracle {
    fn true_lit(&mut self) -> Lit {
        if let Some(lit) = self.true_lit {
            return lit;
        }
        let lit = self.solver.new_lit();
        self.solver.add_clause(&[lit]);
        self.true_lit = Some(lit);
        lit
    }

    fn var_lit(&mut self, var: VarId) -> Lit {
        if let Some(lit) = self.var_to_lit.get(&var) {
            return *lit;
        }
        let lit = self.solver.new_lit();
        self.var_to_lit.insert(var, lit);
        lit
    }

    /// Returns the literal equivalent to `term`, adding defining clauses for
    /// any sub-terms not yet lowered in this context.
    fn lower(&mut self, store: &TermStore, term: TermRef) -> Lit {
        let mut worklist = vec![term];
        while let Some(current) = worklist.pop() {
            if self.term_to_lit.contains_key(&current) {
                continue;
            }
            let node = store.get(current);
            let pending: Vec<TermRef> = node
                .get_operands()
                .into_iter()
                .filter(|op| !self.term_to_lit.contains_key(op))
                .collect();
            if !pending.is_empty() {
                worklist.push(current); // Revisit after dependencies
                worklist.extend(pending);
                continue;
            }
            let lit = match node {
                TermNode::Const(true) => self.true_lit(),
                TermNode::Const(false) => !self.true_lit(),
                TermNode::Var(var) => self.var_lit(*var),
                TermNode::Not(t) => !self.term_to_lit[t],
                TermNode::And(ts) => {
                    let operands: Vec<Lit> = ts.iter().map(|t| self.term_to_lit[t]).collect();
                    let output = self.solver.new_lit();
                    add_tseitsin_and(&mut self.solver, &operands, output);
                    output
                }
                TermNode::Or(ts) => {
                    let operands: Vec<Lit> = ts.iter().map(|t| self.term_to_lit[t]).collect();
                    let output = self.solver.new_lit();
                    add_tseitsin_or(&mut self.solver, &operands, output);
                    output
                }
                TermNode::Ite { cond, then, else_ } => {
                    let c = self.term_to_lit[cond];
                    let t = self.term_to_lit[then];
                    let e = self.term_to_lit[else_];
                    let output = self.solver.new_lit();
                    add_tseitsin_ite(&mut self.solver, c, t, e, output);
                    output
                }
                TermNode::Iff(a, b) => {
                    let a = self.term_to_lit[a];
                    let b = self.term_to_lit[b];
                    // a <=> b is the negation of a XOR b.
                    let output = self.solver.new_lit();
                    add_tseitsin_xor(&mut self.solver, a, b, !output);
                    output
                }
            };
            self.term_to_lit.insert(current, lit);
        }
        self.term_to_lit[&term]
    }
}

impl Oracle for VarisatOracle {
    type Witness = VarisatWitness;

    fn new_context() -> Self {
        VarisatOracle {
            solver: varisat::Solver::new(),
            term_to_lit: HashMap::new(),
            var_to_lit: HashMap::new(),
            true_lit: None,
        }
    }

    fn assert_term(&mut self, store: &TermStore, term: TermRef) -> Result<(), OracleError> {
        // Top-level conjunctions are asserted conjunct by conjunct rather than
        // through a defining literal.
        let mut worklist = vec![term];
        while let Some(current) = worklist.pop() {
            match store.get(current) {
                TermNode::And(ts) => worklist.extend(ts.iter().rev().cloned()),
                TermNode::Const(true) => {}
                _ => {
                    let lit = self.lower(store, current);
                    self.solver.add_clause(&[lit]);
                }
            }
        }
        Ok(())
    }

    fn check(&mut self) -> Result<CheckResult<VarisatWitness>, OracleError> {
        match self.solver.solve() {
            Ok(false) => Ok(CheckResult::Unsat),
            Ok(true) => {
                let model = self.solver.model().ok_or_else(|| {
                    OracleError::SolverError("no model available after SAT".to_string())
                })?;
                let model_set: HashSet<Lit> = model.into_iter().collect();
                let values = self
                    .var_to_lit
                    .iter()
                    .map(|(var, lit)| (*var, model_set.contains(lit)))
                    .collect();
                Ok(CheckResult::Sat(VarisatWitness { values }))
            }
            Err(e) => Err(OracleError::SolverError(format!("{:?}", e))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::term::Namespace;

    fn sat(store: &TermStore, terms: &[TermRef]) -> Option<VarisatWitness> {
        let mut oracle = VarisatOracle::new_context();
        for t in terms {
            oracle.assert_term(store, *t).unwrap();
        }
        match oracle.check().unwrap() {
            CheckResult::Sat(w) => Some(w),
            CheckResult::Unsat => None,
        }
    }

    #[test]
    fn test_simple_sat_unsat() {
        let mut store = TermStore::new();
        let a = store.var(Namespace::Input, "a");
        let not_a = store.not(a);
        assert!(sat(&store, &[a]).is_some());
        assert!(sat(&store, &[a, not_a]).is_none());
        let f = store.constant(false);
        assert!(sat(&store, &[f]).is_none());
    }

    #[test]
    fn test_witness_satisfies_assertions() {
        let mut store = TermStore::new();
        let a = store.var(Namespace::Input, "a");
        let b = store.var(Namespace::Input, "b");
        let c = store.var(Namespace::Input, "c");
        let xor = {
            let eq = store.iff(a, b);
            store.not(eq)
        };
        let ite = store.ite(c, a, b);
        let or = store.or(&[xor, c]);
        let goal = store.and(&[or, ite]);
        let w = sat(&store, &[goal]).unwrap();
        assert!(w.eval(&store, goal));
    }

    #[test]
    fn test_unseen_variable_completion() {
        let mut store = TermStore::new();
        let a = store.var(Namespace::Input, "a");
        let unseen = store.var(Namespace::Param, "p");
        let w = sat(&store, &[a]).unwrap();
        let unseen_var = store.as_var(unseen).unwrap();
        assert_eq!(w.value(unseen_var), None);
        assert!(!w.eval(&store, unseen));
        assert!(w.eval_with_default(&store, unseen, &mut |_| true));
        assert!(w.eval(&store, a));
    }

    #[test]
    fn test_contexts_are_independent() {
        let mut store = TermStore::new();
        let a = store.var(Namespace::Input, "a");
        let not_a = store.not(a);
        let mut first = VarisatOracle::new_context();
        first.assert_term(&store, a).unwrap();
        let mut second = VarisatOracle::new_context();
        second.assert_term(&store, not_a).unwrap();
        assert!(matches!(first.check().unwrap(), CheckResult::Sat(_)));
        assert!(matches!(second.check().unwrap(), CheckResult::Sat(_)));
        // Incremental assertion into the first context.
        first.assert_term(&store, not_a).unwrap();
        assert!(matches!(first.check().unwrap(), CheckResult::Unsat));
    }
}

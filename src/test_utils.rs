// SPDX-License-Identifier: Apache-2.0

//! Helpers shared by unit tests, integration tests and the driver tests:
//! small sample circuits, seeded random circuit generation, and an
//! exhaustive-search oracle used to cross-check the SAT backend.

use std::collections::HashMap;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::circuit::{Circuit, Gate};
use crate::oracle::{CheckResult, Oracle, OracleError, Witness};
use crate::term::{TermRef, TermStore, VarId};
use crate::truth_table::{row_inputs, TruthTable};

/// Circuit with a single gate `gate` reading every primary input, in order,
/// and driving the only primary output.
pub fn single_gate_circuit(name: &str, inputs: &[&str], gate: &str, onset: &[&str]) -> Circuit {
    let table = TruthTable::new(inputs.len(), onset).unwrap();
    Circuit::new(
        name,
        inputs.iter().map(|s| s.to_string()).collect(),
        vec![gate.to_string()],
        vec![Gate::new(gate, inputs, table)],
    )
    .unwrap()
}

/// Implementation `f = AND(a, b)` against specification `f = OR(a, b)`.
pub fn and_or_pair() -> (Circuit, Circuit) {
    (
        single_gate_circuit("impl", &["a", "b"], "f", &["11"]),
        single_gate_circuit("spec", &["a", "b"], "f", &["1-", "-1"]),
    )
}

pub struct RandomCircuitOptions {
    pub num_inputs: usize,
    pub num_gates: usize,
    pub num_outputs: usize,
}

impl Default for RandomCircuitOptions {
    fn default() -> Self {
        Self {
            num_inputs: 4,
            num_gates: 8,
            num_outputs: 2,
        }
    }
}

/// Generates an acyclic circuit of one- and two-input gates with random
/// tables. Each gate reads primary inputs or earlier gates; the last
/// `num_outputs` gates are the primary outputs.
pub fn random_circuit(rng: &mut impl Rng, name: &str, options: &RandomCircuitOptions) -> Circuit {
    assert!(options.num_inputs > 0);
    assert!(options.num_outputs <= options.num_gates);
    let primary_inputs: Vec<String> = (0..options.num_inputs).map(|i| format!("i{}", i)).collect();
    let mut nets: Vec<String> = primary_inputs.clone();
    let mut gates: Vec<Gate> = Vec::with_capacity(options.num_gates);
    for i in 0..options.num_gates {
        let arity = rng.gen_range(1..=2).min(nets.len());
        let inputs: Vec<&str> = nets
            .choose_multiple(rng, arity)
            .map(|s| s.as_str())
            .collect();
        let rows: Vec<bool> = (0..(1usize << arity)).map(|_| rng.gen()).collect();
        let table = TruthTable::from_canonical(arity, &rows).unwrap();
        let gate_name = format!("g{}", i);
        gates.push(Gate::new(&gate_name, &inputs, table));
        nets.push(gate_name);
    }
    let primary_outputs: Vec<String> = gates[options.num_gates - options.num_outputs..]
        .iter()
        .map(|g| g.name.clone())
        .collect();
    Circuit::new(name, primary_inputs, primary_outputs, gates).unwrap()
}

/// Returns a copy of `circuit` where one randomly chosen gate computes a
/// different function, together with that gate's name.
pub fn mutate_random_gate(rng: &mut impl Rng, circuit: &Circuit) -> (Circuit, String) {
    let gate = circuit.gates().choose(rng).unwrap();
    let arity = gate.num_inputs();
    let mut rows: Vec<bool> = (0..(1usize << arity))
        .map(|row| gate.truth_table.evaluate(&row_inputs(row, arity)))
        .collect();
    let forced = rng.gen_range(0..rows.len());
    for (row, bit) in rows.iter_mut().enumerate() {
        if row == forced || rng.gen_bool(0.25) {
            *bit = !*bit;
        }
    }
    let table = TruthTable::from_canonical(arity, &rows).unwrap();
    let mutated = circuit
        .with_replaced_tables(&[(gate.name.clone(), table)])
        .unwrap();
    (mutated, gate.name.clone())
}

/// Largest number of variables `BruteForceOracle` will enumerate.
pub const MAX_BRUTE_FORCE_VARS: usize = 20;

/// Oracle that answers by enumerating every assignment of the variables in
/// its assertions, lowest assignment first.
pub struct BruteForceOracle {
    store: Option<TermStore>,
    assertions: Vec<TermRef>,
}

#[derive(Debug, Clone)]
pub struct BruteForceWitness {
    values: HashMap<VarId, bool>,
}

impl Witness for BruteForceWitness {
    fn value(&self, var: VarId) -> Option<bool> {
        self.values.get(&var).copied()
    }
}

impl Oracle for BruteForceOracle {
    type Witness = BruteForceWitness;

    fn new_context() -> Self {
        BruteForceOracle {
            store: None,
            assertions: Vec::new(),
        }
    }

    fn assert_term(&mut self, store: &TermStore, term: TermRef) -> Result<(), OracleError> {
        // Stores only grow, so the latest snapshot covers earlier assertions.
        self.store = Some(store.clone());
        self.assertions.push(term);
        Ok(())
    }

    fn check(&mut self) -> Result<CheckResult<BruteForceWitness>, OracleError> {
        let store = match &self.store {
            Some(store) => store,
            None => {
                return Ok(CheckResult::Sat(BruteForceWitness {
                    values: HashMap::new(),
                }))
            }
        };
        let mut vars: Vec<VarId> = self
            .assertions
            .iter()
            .flat_map(|t| store.support(*t))
            .collect();
        vars.sort();
        vars.dedup();
        if vars.len() > MAX_BRUTE_FORCE_VARS {
            return Err(OracleError::SolverError(format!(
                "brute force oracle: {} variables exceeds limit of {}",
                vars.len(),
                MAX_BRUTE_FORCE_VARS
            )));
        }
        for bits in 0..(1u64 << vars.len()) {
            let values: HashMap<VarId, bool> = vars
                .iter()
                .enumerate()
                .map(|(i, v)| (*v, (bits >> i) & 1 == 1))
                .collect();
            let holds = self
                .assertions
                .iter()
                .all(|t| store.eval(*t, &mut |v| values[&v]));
            if holds {
                return Ok(CheckResult::Sat(BruteForceWitness { values }));
            }
        }
        Ok(CheckResult::Unsat)
    }
}

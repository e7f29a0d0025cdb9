// SPDX-License-Identifier: Apache-2.0

//! Concrete evaluation of circuits on primary-input assignments.

use std::collections::HashMap;

use crate::circuit::{Circuit, CircuitError};
use crate::truth_table::row_inputs;

/// Value of every net (primary inputs and gate outputs) after simulation.
pub type NetValues = HashMap<String, bool>;

/// Circuits with more primary inputs than this are not exhaustively
/// enumerated.
pub const MAX_EXHAUSTIVE_INPUTS: usize = 20;

impl Circuit {
    /// Evaluates every gate against the given primary-input values, walking
    /// gates in dependency order so each gate's inputs are already computed.
    pub fn simulate(&self, inputs: &HashMap<String, bool>) -> Result<NetValues, CircuitError> {
        let mut env: NetValues =
            HashMap::with_capacity(self.primary_inputs.len() + self.gates().len());
        for pi in &self.primary_inputs {
            let value = inputs
                .get(pi)
                .ok_or_else(|| CircuitError::MissingPrimaryInputValue(pi.clone()))?;
            env.insert(pi.clone(), *value);
        }
        for gate in self.dependency_order()? {
            let gate_inputs: Vec<bool> = gate.inputs.iter().map(|net| env[net]).collect();
            let output = gate.truth_table.evaluate(&gate_inputs);
            env.insert(gate.name.clone(), output);
        }
        Ok(env)
    }

    /// Primary-output values in declaration order.
    pub fn simulate_outputs(
        &self,
        inputs: &HashMap<String, bool>,
    ) -> Result<Vec<bool>, CircuitError> {
        let env = self.simulate(inputs)?;
        Ok(self.primary_outputs.iter().map(|po| env[po]).collect())
    }
}

/// Enumerates every primary-input assignment of `lhs` and returns the first
/// one on which the two circuits' outputs differ, or `None` if they agree
/// everywhere.
///
/// Outputs are compared by name, so declaration order may differ between the
/// two circuits. More than `MAX_EXHAUSTIVE_INPUTS` primary inputs is an
/// error.
pub fn exhaustive_mismatch(
    lhs: &Circuit,
    rhs: &Circuit,
) -> Result<Option<HashMap<String, bool>>, CircuitError> {
    let input_count = lhs.primary_inputs.len();
    if input_count > MAX_EXHAUSTIVE_INPUTS {
        return Err(CircuitError::TooManyInputs {
            count: input_count,
            limit: MAX_EXHAUSTIVE_INPUTS,
        });
    }
    for row in 0..(1usize << input_count) {
        let assignment: HashMap<String, bool> = lhs
            .primary_inputs
            .iter()
            .cloned()
            .zip(row_inputs(row, input_count))
            .collect();
        let lhs_values = lhs.simulate(&assignment)?;
        let rhs_values = rhs.simulate(&assignment)?;
        let differs = lhs
            .primary_outputs
            .iter()
            .any(|po| Some(&lhs_values[po]) != rhs_values.get(po));
        if differs {
            log::debug!("exhaustive_mismatch; outputs differ at {:?}", assignment);
            return Ok(Some(assignment));
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::Gate;
    use crate::truth_table::TruthTable;
    use maplit::hashmap;

    fn and_or_circuit() -> Circuit {
        Circuit::new(
            "and_or",
            vec!["a".to_string(), "b".to_string()],
            vec!["f".to_string()],
            vec![
                Gate::new("g1", &["a", "b"], TruthTable::new(2, &["11"]).unwrap()),
                Gate::new(
                    "f",
                    &["g1", "b"],
                    TruthTable::new(2, &["1-", "-1"]).unwrap(),
                ),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_simulate_and_or() {
        let c = and_or_circuit();
        let values = c
            .simulate(&hashmap! {"a".to_string() => true, "b".to_string() => false})
            .unwrap();
        assert!(!values["g1"]);
        assert!(!values["f"]);

        let values = c
            .simulate(&hashmap! {"a".to_string() => true, "b".to_string() => true})
            .unwrap();
        assert!(values["g1"]);
        assert!(values["f"]);
    }

    #[test]
    fn test_simulate_missing_input() {
        let c = and_or_circuit();
        assert_eq!(
            c.simulate(&hashmap! {"a".to_string() => true}),
            Err(CircuitError::MissingPrimaryInputValue("b".to_string()))
        );
    }

    #[test]
    fn test_simulate_outputs_passthrough_input() {
        let c = Circuit::new(
            "wire",
            vec!["a".to_string()],
            vec!["a".to_string()],
            vec![],
        )
        .unwrap();
        let inputs = hashmap! {"a".to_string() => true};
        assert_eq!(c.simulate_outputs(&inputs).unwrap(), vec![true]);
    }

    #[test]
    fn test_exhaustive_mismatch() {
        let c = and_or_circuit();
        // f = (a & b) | b = b
        let just_b = Circuit::new(
            "just_b",
            vec!["a".to_string(), "b".to_string()],
            vec!["f".to_string()],
            vec![Gate::new("f", &["b"], TruthTable::new(1, &["1"]).unwrap())],
        )
        .unwrap();
        assert_eq!(exhaustive_mismatch(&c, &just_b).unwrap(), None);

        let just_a = Circuit::new(
            "just_a",
            vec!["a".to_string(), "b".to_string()],
            vec!["f".to_string()],
            vec![Gate::new("f", &["a"], TruthTable::new(1, &["1"]).unwrap())],
        )
        .unwrap();
        let mismatch = exhaustive_mismatch(&c, &just_a).unwrap().unwrap();
        assert_ne!(mismatch["a"], mismatch["b"]);
    }

    #[test]
    fn test_exhaustive_mismatch_too_many_inputs() {
        let inputs: Vec<String> = (0..=MAX_EXHAUSTIVE_INPUTS)
            .map(|i| format!("i{}", i))
            .collect();
        let wide = Circuit::new(
            "wide",
            inputs.clone(),
            vec!["f".to_string()],
            vec![Gate::new("f", &["i0"], TruthTable::new(1, &["1"]).unwrap())],
        )
        .unwrap();
        assert_eq!(
            exhaustive_mismatch(&wide, &wide),
            Err(CircuitError::TooManyInputs {
                count: MAX_EXHAUSTIVE_INPUTS + 1,
                limit: MAX_EXHAUSTIVE_INPUTS,
            })
        );
    }
}

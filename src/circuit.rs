// SPDX-License-Identifier: Apache-2.0

//! Named-net combinational circuits: gates drive nets named after themselves
//! and read primary inputs or other gates' nets.

use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::truth_table::TruthTable;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gate {
    /// Output net name; unique within a circuit.
    pub name: String,
    /// Ordered input nets. The first input is the most significant bit of a
    /// truth-table row index.
    pub inputs: Vec<String>,
    pub truth_table: TruthTable,
}

impl Gate {
    pub fn new(name: &str, inputs: &[&str], truth_table: TruthTable) -> Self {
        Gate {
            name: name.to_string(),
            inputs: inputs.iter().map(|s| s.to_string()).collect(),
            truth_table,
        }
    }

    pub fn num_inputs(&self) -> usize {
        self.inputs.len()
    }
}

/// What drives a net.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetSource<'a> {
    PrimaryInput,
    Gate(&'a Gate),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CircuitError {
    DuplicatePrimaryInput(String),
    DuplicatePrimaryOutput(String),
    DuplicateGate(String),
    /// A gate is named after a primary input net.
    GateDrivesPrimaryInput(String),
    UnresolvedNet {
        net: String,
        /// The gate (or "primary output") that referenced it.
        referenced_by: String,
    },
    ArityMismatch {
        gate: String,
        inputs: usize,
        table_inputs: usize,
    },
    /// Gates that never became ready during dependency ordering, in
    /// declaration order.
    Cycle { unresolved: Vec<String> },
    MissingPrimaryInputValue(String),
    UnknownGate(String),
    /// Too many primary inputs to enumerate every assignment.
    TooManyInputs {
        count: usize,
        limit: usize,
    },
}

impl fmt::Display for CircuitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CircuitError::DuplicatePrimaryInput(name) => {
                write!(f, "duplicate primary input '{}'", name)
            }
            CircuitError::DuplicatePrimaryOutput(name) => {
                write!(f, "duplicate primary output '{}'", name)
            }
            CircuitError::DuplicateGate(name) => {
                write!(f, "net '{}' driven by multiple gates", name)
            }
            CircuitError::GateDrivesPrimaryInput(name) => {
                write!(f, "gate drives primary input net '{}'", name)
            }
            CircuitError::UnresolvedNet { net, referenced_by } => write!(
                f,
                "net '{}' referenced by {} is neither a primary input nor a gate",
                net, referenced_by
            ),
            CircuitError::ArityMismatch {
                gate,
                inputs,
                table_inputs,
            } => write!(
                f,
                "gate '{}' has {} inputs but its truth table has {}",
                gate, inputs, table_inputs
            ),
            CircuitError::Cycle { unresolved } => {
                write!(f, "combinational loop detected: {:?}", unresolved)
            }
            CircuitError::MissingPrimaryInputValue(name) => {
                write!(f, "no value provided for primary input '{}'", name)
            }
            CircuitError::UnknownGate(name) => write!(f, "no gate named '{}'", name),
            CircuitError::TooManyInputs { count, limit } => write!(
                f,
                "{} primary inputs is too many to enumerate; limit is {}",
                count, limit
            ),
        }
    }
}

impl std::error::Error for CircuitError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Circuit {
    pub name: String,
    pub primary_inputs: Vec<String>,
    pub primary_outputs: Vec<String>,
    gates: Vec<Gate>,
    gate_index: HashMap<String, usize>,
}

impl Circuit {
    /// Builds a circuit and checks that every referenced net resolves.
    ///
    /// Acyclicity is not checked here; `dependency_order` reports loops.
    pub fn new(
        name: &str,
        primary_inputs: Vec<String>,
        primary_outputs: Vec<String>,
        gates: Vec<Gate>,
    ) -> Result<Self, CircuitError> {
        let mut seen_inputs = HashSet::new();
        for pi in &primary_inputs {
            if !seen_inputs.insert(pi.as_str()) {
                return Err(CircuitError::DuplicatePrimaryInput(pi.clone()));
            }
        }
        let mut seen_outputs = HashSet::new();
        for po in &primary_outputs {
            if !seen_outputs.insert(po.as_str()) {
                return Err(CircuitError::DuplicatePrimaryOutput(po.clone()));
            }
        }

        let mut gate_index = HashMap::with_capacity(gates.len());
        for (i, gate) in gates.iter().enumerate() {
            if seen_inputs.contains(gate.name.as_str()) {
                return Err(CircuitError::GateDrivesPrimaryInput(gate.name.clone()));
            }
            if gate_index.insert(gate.name.clone(), i).is_some() {
                return Err(CircuitError::DuplicateGate(gate.name.clone()));
            }
            if gate.inputs.len() != gate.truth_table.num_inputs() {
                return Err(CircuitError::ArityMismatch {
                    gate: gate.name.clone(),
                    inputs: gate.inputs.len(),
                    table_inputs: gate.truth_table.num_inputs(),
                });
            }
        }

        let resolves = |net: &str| seen_inputs.contains(net) || gate_index.contains_key(net);
        for gate in &gates {
            for input in &gate.inputs {
                if !resolves(input) {
                    return Err(CircuitError::UnresolvedNet {
                        net: input.clone(),
                        referenced_by: format!("gate '{}'", gate.name),
                    });
                }
            }
        }
        for po in &primary_outputs {
            if !resolves(po) {
                return Err(CircuitError::UnresolvedNet {
                    net: po.clone(),
                    referenced_by: "primary output".to_string(),
                });
            }
        }

        Ok(Circuit {
            name: name.to_string(),
            primary_inputs,
            primary_outputs,
            gates,
            gate_index,
        })
    }

    /// Gates in declaration order.
    pub fn gates(&self) -> &[Gate] {
        &self.gates
    }

    pub fn get_gate(&self, name: &str) -> Option<&Gate> {
        self.gate_index.get(name).map(|i| &self.gates[*i])
    }

    /// Declaration index of the named gate.
    pub fn gate_position(&self, name: &str) -> Option<usize> {
        self.gate_index.get(name).copied()
    }

    pub fn is_primary_input(&self, net: &str) -> bool {
        self.primary_inputs.iter().any(|pi| pi == net)
    }

    pub fn lookup(&self, net: &str) -> Option<NetSource<'_>> {
        if let Some(gate) = self.get_gate(net) {
            Some(NetSource::Gate(gate))
        } else if self.is_primary_input(net) {
            Some(NetSource::PrimaryInput)
        } else {
            None
        }
    }

    /// Returns a copy of this circuit with the named gates' truth tables
    /// replaced. Each replacement must keep the gate's arity.
    pub fn with_replaced_tables(
        &self,
        replacements: &[(String, TruthTable)],
    ) -> Result<Circuit, CircuitError> {
        let mut result = self.clone();
        for (name, table) in replacements {
            let index = *self
                .gate_index
                .get(name)
                .ok_or_else(|| CircuitError::UnknownGate(name.clone()))?;
            let gate = &mut result.gates[index];
            if gate.inputs.len() != table.num_inputs() {
                return Err(CircuitError::ArityMismatch {
                    gate: name.clone(),
                    inputs: gate.inputs.len(),
                    table_inputs: table.num_inputs(),
                });
            }
            gate.truth_table = table.clone();
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn and2() -> TruthTable {
        TruthTable::new(2, &["11"]).unwrap()
    }

    #[test]
    fn test_lookup() {
        let c = Circuit::new(
            "c",
            vec!["a".to_string(), "b".to_string()],
            vec!["g".to_string()],
            vec![Gate::new("g", &["a", "b"], and2())],
        )
        .unwrap();
        assert_eq!(c.lookup("a"), Some(NetSource::PrimaryInput));
        assert!(matches!(c.lookup("g"), Some(NetSource::Gate(g)) if g.name == "g"));
        assert_eq!(c.lookup("zzz"), None);
    }

    #[test]
    fn test_unresolved_gate_input() {
        let err = Circuit::new(
            "c",
            vec!["a".to_string()],
            vec!["g".to_string()],
            vec![Gate::new("g", &["a", "nope"], and2())],
        )
        .unwrap_err();
        assert_eq!(
            err,
            CircuitError::UnresolvedNet {
                net: "nope".to_string(),
                referenced_by: "gate 'g'".to_string(),
            }
        );
    }

    #[test]
    fn test_unresolved_primary_output() {
        let err = Circuit::new(
            "c",
            vec!["a".to_string()],
            vec!["f".to_string()],
            vec![],
        )
        .unwrap_err();
        assert!(matches!(err, CircuitError::UnresolvedNet { ref net, .. } if net == "f"));
    }

    #[test]
    fn test_duplicates_rejected() {
        assert_eq!(
            Circuit::new(
                "c",
                vec!["a".to_string(), "a".to_string()],
                vec![],
                vec![],
            ),
            Err(CircuitError::DuplicatePrimaryInput("a".to_string()))
        );
        let buf = TruthTable::new(1, &["1"]).unwrap();
        assert_eq!(
            Circuit::new(
                "c",
                vec!["a".to_string()],
                vec![],
                vec![
                    Gate::new("g", &["a"], buf.clone()),
                    Gate::new("g", &["a"], buf.clone()),
                ],
            ),
            Err(CircuitError::DuplicateGate("g".to_string()))
        );
        assert_eq!(
            Circuit::new(
                "c",
                vec!["a".to_string()],
                vec![],
                vec![Gate::new("a", &["a"], buf)],
            ),
            Err(CircuitError::GateDrivesPrimaryInput("a".to_string()))
        );
    }

    #[test]
    fn test_arity_mismatch() {
        let err = Circuit::new(
            "c",
            vec!["a".to_string()],
            vec![],
            vec![Gate::new("g", &["a"], and2())],
        )
        .unwrap_err();
        assert!(matches!(err, CircuitError::ArityMismatch { .. }));
    }

    #[test]
    fn test_with_replaced_tables() {
        let c = Circuit::new(
            "c",
            vec!["a".to_string(), "b".to_string()],
            vec!["g".to_string()],
            vec![Gate::new("g", &["a", "b"], and2())],
        )
        .unwrap();
        let or = TruthTable::new(2, &["1-", "-1"]).unwrap();
        let replaced = c
            .with_replaced_tables(&[("g".to_string(), or.clone())])
            .unwrap();
        assert_eq!(replaced.get_gate("g").unwrap().truth_table, or);
        assert_eq!(c.get_gate("g").unwrap().truth_table, and2());
        assert_eq!(
            c.with_replaced_tables(&[("h".to_string(), and2())]),
            Err(CircuitError::UnknownGate("h".to_string()))
        );
    }
}

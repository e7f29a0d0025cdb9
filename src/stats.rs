// SPDX-License-Identifier: Apache-2.0

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::circuit::Circuit;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CircuitStats {
    pub name: String,
    pub primary_inputs: usize,
    pub primary_outputs: usize,
    pub gates: usize,
    /// Gate-kind name to number of gates of that kind.
    pub gate_kinds: BTreeMap<String, usize>,
}

impl CircuitStats {
    pub fn from_circuit(circuit: &Circuit) -> Self {
        let mut gate_kinds: BTreeMap<String, usize> = BTreeMap::new();
        for gate in circuit.gates() {
            *gate_kinds
                .entry(gate.truth_table.classify().to_string())
                .or_insert(0) += 1;
        }
        CircuitStats {
            name: circuit.name.clone(),
            primary_inputs: circuit.primary_inputs.len(),
            primary_outputs: circuit.primary_outputs.len(),
            gates: circuit.gates().len(),
            gate_kinds,
        }
    }
}

impl fmt::Display for CircuitStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Circuit: {}", self.name)?;
        writeln!(f, "  Primary inputs:  {}", self.primary_inputs)?;
        writeln!(f, "  Primary outputs: {}", self.primary_outputs)?;
        writeln!(f, "  Gates: {}", self.gates)?;
        writeln!(f, "  Gate types:")?;
        for (kind, count) in &self.gate_kinds {
            writeln!(f, "    {}: {}", kind, count)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blif::parse_blif;
    use maplit::btreemap;
    use pretty_assertions::assert_eq;

    const TWO_ANDS_ONE_OR: &str = "\
.model s
.inputs a b
.outputs f
.names a b x
11 1
.names a b y
11 1
.names x y f
1- 1
-1 1
.end
";

    #[test]
    fn test_stats_histogram() {
        let c = parse_blif(TWO_ANDS_ONE_OR).unwrap();
        let stats = CircuitStats::from_circuit(&c);
        assert_eq!(
            stats.gate_kinds,
            btreemap! {"AND".to_string() => 2, "OR".to_string() => 1}
        );
        assert_eq!(
            stats.to_string(),
            "Circuit: s\n  Primary inputs:  2\n  Primary outputs: 1\n  Gates: 3\n  \
             Gate types:\n    AND: 2\n    OR: 1\n"
        );
    }
}

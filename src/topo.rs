// SPDX-License-Identifier: Apache-2.0

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use crate::circuit::{Circuit, CircuitError, Gate};

/// Returns (topological order, None) if acyclic, or (partial order,
/// Some(not_visited_gate_indices)) if a cycle is detected. Indices are gate
/// declaration indices.
///
/// Among ready gates the one declared first is always emitted first, so the
/// order (and anything named after it) is reproducible run to run.
pub fn topo_order_and_cycle_check(circuit: &Circuit) -> (Vec<usize>, Option<Vec<usize>>) {
    let gates = circuit.gates();
    let gate_count = gates.len();
    let mut indegree = vec![0usize; gate_count];
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); gate_count];
    for (i, gate) in gates.iter().enumerate() {
        for input in &gate.inputs {
            // Primary inputs impose no ordering.
            if let Some(producer) = circuit.gate_position(input) {
                indegree[i] += 1;
                dependents[producer].push(i);
            }
        }
    }
    let mut ready: BinaryHeap<Reverse<usize>> = BinaryHeap::new();
    for (i, degree) in indegree.iter().enumerate() {
        if *degree == 0 {
            ready.push(Reverse(i));
        }
    }
    let mut topo: Vec<usize> = Vec::with_capacity(gate_count);
    while let Some(Reverse(gate_id)) = ready.pop() {
        topo.push(gate_id);
        for &dependent in &dependents[gate_id] {
            indegree[dependent] -= 1;
            if indegree[dependent] == 0 {
                ready.push(Reverse(dependent));
            }
        }
    }
    if topo.len() != gate_count {
        let not_visited: Vec<usize> = (0..gate_count).filter(|i| indegree[*i] > 0).collect();
        (topo, Some(not_visited))
    } else {
        (topo, None)
    }
}

/// Returns the circuit's gates with every gate after the gates that drive its
/// inputs.
pub fn dependency_order(circuit: &Circuit) -> Result<Vec<&Gate>, CircuitError> {
    let (order, cycle) = topo_order_and_cycle_check(circuit);
    if let Some(not_visited) = cycle {
        let unresolved: Vec<String> = not_visited
            .iter()
            .map(|i| circuit.gates()[*i].name.clone())
            .collect();
        log::error!(
            "dependency_order; circuit '{}' ordered {} of {} gates; unresolved: {:?}",
            circuit.name,
            order.len(),
            circuit.gates().len(),
            unresolved
        );
        return Err(CircuitError::Cycle { unresolved });
    }
    Ok(order.iter().map(|i| &circuit.gates()[*i]).collect())
}

impl Circuit {
    pub fn dependency_order(&self) -> Result<Vec<&Gate>, CircuitError> {
        dependency_order(self)
    }
}

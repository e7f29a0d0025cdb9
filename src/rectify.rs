// SPDX-License-Identifier: Apache-2.0

//! Request-level rectification: choose the gates to fix, encode, run CEGIS
//! and decode the synthesized tables into per-gate fixes.

use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;

use crate::cegis::{self, CegisOptions, CegisOutcome, FailureReason, ParamAssignment, TestVector};
use crate::circuit::{Circuit, CircuitError};
use crate::encoder::{encode, EncodeError};
use crate::oracle::Oracle;
use crate::rectify_error::RectifyError;
use crate::truth_table::TruthTable;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FixSelection {
    Gates(Vec<String>),
    /// Every gate of the implementation.
    All,
}

impl FixSelection {
    /// Resolves the selection against `implementation`; every named gate must
    /// exist there.
    pub fn resolve(&self, implementation: &Circuit) -> Result<BTreeSet<String>, EncodeError> {
        match self {
            FixSelection::All => Ok(implementation
                .gates()
                .iter()
                .map(|g| g.name.clone())
                .collect()),
            FixSelection::Gates(names) => {
                for name in names {
                    if implementation.get_gate(name).is_none() {
                        return Err(EncodeError::UnknownFixGate(name.clone()));
                    }
                }
                Ok(names.iter().cloned().collect())
            }
        }
    }
}

/// A synthesized replacement for one gate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GateFix {
    pub gate: String,
    pub original_kind: String,
    pub new_kind: String,
    /// New table rows; row `i` is the output for the input pattern with row
    /// index `i`.
    pub table: Vec<bool>,
    pub changed: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct RectifyReport {
    pub circuit: String,
    pub gates_to_fix: Vec<String>,
    pub total_parameters: usize,
    pub success: bool,
    pub iterations: usize,
    pub counterexamples: Vec<TestVector>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<FailureReason>,
    pub fixes: Vec<GateFix>,
    #[serde(skip)]
    pub assignment: Option<ParamAssignment>,
}

impl RectifyReport {
    /// The implementation with every fix applied, when rectification
    /// succeeded.
    pub fn rectified(&self, implementation: &Circuit) -> Result<Option<Circuit>, RectifyError> {
        match &self.assignment {
            Some(assignment) => Ok(Some(apply_fixes(implementation, assignment)?)),
            None => Ok(None),
        }
    }
}

impl fmt::Display for RectifyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "=".repeat(50);
        writeln!(f, "{}", rule)?;
        writeln!(f, "RESULTS")?;
        writeln!(f, "{}", rule)?;
        if self.success {
            writeln!(f, "Status: SUCCESS")?;
            writeln!(f, "Iterations (test patterns): {}", self.iterations)?;
            writeln!(f)?;
            writeln!(f, "Fixes found:")?;
            for fix in &self.fixes {
                if fix.changed {
                    writeln!(f, "  {}: {} -> {}", fix.gate, fix.original_kind, fix.new_kind)?;
                } else {
                    writeln!(f, "  {}: {} (unchanged)", fix.gate, fix.original_kind)?;
                }
            }
        } else {
            writeln!(f, "Status: FAILED")?;
            writeln!(f, "Iterations: {}", self.iterations)?;
            if let Some(reason) = &self.reason {
                writeln!(f, "Reason: {}", reason)?;
            }
        }
        Ok(())
    }
}

fn decode_fixes(
    implementation: &Circuit,
    assignment: &ParamAssignment,
) -> Result<Vec<GateFix>, RectifyError> {
    let mut fixes = Vec::with_capacity(assignment.len());
    for (gate_name, rows) in assignment.iter() {
        let gate = implementation
            .get_gate(gate_name)
            .ok_or_else(|| CircuitError::UnknownGate(gate_name.to_string()))?;
        let original_kind = gate.truth_table.classify().to_string();
        let new_kind = TruthTable::from_canonical(gate.num_inputs(), rows)?
            .classify()
            .to_string();
        fixes.push(GateFix {
            gate: gate_name.to_string(),
            changed: original_kind != new_kind,
            original_kind,
            new_kind,
            table: rows.to_vec(),
        });
    }
    Ok(fixes)
}

/// Returns `implementation` with each gate in `assignment` replaced by its
/// synthesized table.
pub fn apply_fixes(
    implementation: &Circuit,
    assignment: &ParamAssignment,
) -> Result<Circuit, RectifyError> {
    let mut replacements: Vec<(String, TruthTable)> = Vec::with_capacity(assignment.len());
    for (gate_name, rows) in assignment.iter() {
        let gate = implementation
            .get_gate(gate_name)
            .ok_or_else(|| CircuitError::UnknownGate(gate_name.to_string()))?;
        replacements.push((
            gate_name.to_string(),
            TruthTable::from_canonical(gate.num_inputs(), rows)?,
        ));
    }
    implementation
        .with_replaced_tables(&replacements)
        .map_err(RectifyError::from)
}

pub fn rectify<O: Oracle>(
    implementation: &Circuit,
    specification: &Circuit,
    selection: &FixSelection,
    options: &CegisOptions,
) -> Result<RectifyReport, RectifyError> {
    let gates_to_fix = selection.resolve(implementation)?;
    let mut encoding = encode(implementation, specification, &gates_to_fix)?;
    let total_parameters = encoding.params.len();
    log::info!(
        "rectify; circuit: {} gates to fix: {:?} total parameters: {}",
        implementation.name,
        gates_to_fix,
        total_parameters
    );

    let outcome = cegis::run::<O>(&mut encoding, options)?;
    let gates_to_fix: Vec<String> = gates_to_fix.into_iter().collect();
    let report = match outcome {
        CegisOutcome::Success {
            assignment,
            iterations,
            counterexamples,
        } => RectifyReport {
            circuit: implementation.name.clone(),
            gates_to_fix,
            total_parameters,
            success: true,
            iterations,
            counterexamples,
            reason: None,
            fixes: decode_fixes(implementation, &assignment)?,
            assignment: Some(assignment),
        },
        CegisOutcome::Failed {
            iterations,
            counterexamples,
            reason,
        } => RectifyReport {
            circuit: implementation.name.clone(),
            gates_to_fix,
            total_parameters,
            success: false,
            iterations,
            counterexamples,
            reason: Some(reason),
            fixes: vec![],
            assignment: None,
        },
    };
    Ok(report)
}

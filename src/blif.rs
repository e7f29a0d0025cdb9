// SPDX-License-Identifier: Apache-2.0

//! Reader and writer for the combinational subset of BLIF.
//!
//! Supported: `.model`, `.inputs`, `.outputs` (repeatable), `.names` with
//! single-output cover rows, and `.end`. `.latch`, `.subckt` and `.gate` are
//! rejected; other directives are ignored.

use std::fmt;
use std::path::Path;

use crate::circuit::{Circuit, CircuitError, Gate};
use crate::truth_table::{Cube, TruthTable, TruthTableError};

#[derive(Debug)]
pub enum BlifError {
    Syntax { line: usize, msg: String },
    Unsupported { line: usize, directive: String },
    TruthTable {
        line: usize,
        source: TruthTableError,
    },
    Circuit(CircuitError),
    Io {
        path: String,
        source: std::io::Error,
    },
}

impl fmt::Display for BlifError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlifError::Syntax { line, msg } => write!(f, "line {}: {}", line, msg),
            BlifError::Unsupported { line, directive } => {
                write!(f, "line {}: {} not supported", line, directive)
            }
            BlifError::TruthTable { line, source } => write!(f, "line {}: {}", line, source),
            BlifError::Circuit(e) => write!(f, "{}", e),
            BlifError::Io { path, source } => write!(f, "could not read {}: {}", path, source),
        }
    }
}

impl std::error::Error for BlifError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BlifError::TruthTable { source, .. } => Some(source),
            BlifError::Circuit(e) => Some(e),
            BlifError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<CircuitError> for BlifError {
    fn from(e: CircuitError) -> Self {
        BlifError::Circuit(e)
    }
}

impl BlifError {
    /// 1-based source line of the error, when it has one.
    pub fn line(&self) -> Option<usize> {
        match self {
            BlifError::Syntax { line, .. }
            | BlifError::Unsupported { line, .. }
            | BlifError::TruthTable { line, .. } => Some(*line),
            _ => None,
        }
    }
}

/// Strips comments, drops blank lines and joins `\` continuations. Each
/// logical line keeps the number of its first physical line.
fn logical_lines(text: &str) -> Vec<(usize, String)> {
    let mut result = Vec::new();
    let mut pending: Option<(usize, String)> = None;
    for (i, raw) in text.lines().enumerate() {
        let line_number = i + 1;
        let without_comment = match raw.find('#') {
            Some(pos) => &raw[..pos],
            None => raw,
        };
        let trimmed = without_comment.trim();
        if trimmed.is_empty() {
            continue;
        }
        if let Some(body) = trimmed.strip_suffix('\\') {
            let entry = pending.get_or_insert_with(|| (line_number, String::new()));
            entry.1.push_str(body);
            entry.1.push(' ');
            continue;
        }
        match pending.take() {
            Some((first, mut joined)) => {
                joined.push_str(trimmed);
                result.push((first, joined));
            }
            None => result.push((line_number, trimmed.to_string())),
        }
    }
    // A trailing continuation with nothing after it still counts.
    if let Some(entry) = pending {
        result.push(entry);
    }
    result
}

struct PendingGate {
    line: usize,
    output: String,
    inputs: Vec<String>,
    cubes: Vec<Cube>,
    constant_true: bool,
}

impl PendingGate {
    fn add_row(&mut self, line: usize, tokens: &[&str]) -> Result<(), BlifError> {
        if self.inputs.is_empty() {
            match tokens {
                ["1"] => self.constant_true = true,
                ["0"] => {}
                _ => {
                    return Err(BlifError::Syntax {
                        line,
                        msg: format!("invalid constant row: {}", tokens.join(" ")),
                    })
                }
            }
            return Ok(());
        }
        let (cube_text, output) = match tokens {
            [cube] => (*cube, "1"),
            [cube, output] => (*cube, *output),
            _ => {
                return Err(BlifError::Syntax {
                    line,
                    msg: format!("invalid truth table row: {}", tokens.join(" ")),
                })
            }
        };
        let cube =
            Cube::parse(cube_text).map_err(|source| BlifError::TruthTable { line, source })?;
        if cube.len() != self.inputs.len() {
            return Err(BlifError::TruthTable {
                line,
                source: TruthTableError::CubeWidthMismatch {
                    cube: cube_text.to_string(),
                    num_inputs: self.inputs.len(),
                },
            });
        }
        match output {
            "1" => self.cubes.push(cube),
            "0" => {}
            _ => {
                return Err(BlifError::Syntax {
                    line,
                    msg: format!("invalid output value '{}'", output),
                })
            }
        }
        Ok(())
    }

    fn into_gate(self) -> Result<Gate, BlifError> {
        let truth_table = if self.inputs.is_empty() {
            TruthTable::constant(self.constant_true)
        } else {
            TruthTable::from_cubes(self.inputs.len(), self.cubes).map_err(|source| {
                BlifError::TruthTable {
                    line: self.line,
                    source,
                }
            })?
        };
        Ok(Gate {
            name: self.output,
            inputs: self.inputs,
            truth_table,
        })
    }
}

pub fn parse_blif(text: &str) -> Result<Circuit, BlifError> {
    let mut name = "unnamed".to_string();
    let mut primary_inputs: Vec<String> = Vec::new();
    let mut primary_outputs: Vec<String> = Vec::new();
    let mut gates: Vec<Gate> = Vec::new();
    let mut current: Option<PendingGate> = None;

    for (line, text) in logical_lines(text) {
        let tokens: Vec<&str> = text.split_whitespace().collect();
        let directive = tokens[0];
        if !directive.starts_with('.') {
            match current.as_mut() {
                Some(gate) => gate.add_row(line, &tokens)?,
                None => {
                    return Err(BlifError::Syntax {
                        line,
                        msg: "truth table row without .names".to_string(),
                    })
                }
            }
            continue;
        }
        if let Some(gate) = current.take() {
            gates.push(gate.into_gate()?);
        }
        match directive {
            ".model" => {
                if let Some(model_name) = tokens.get(1) {
                    name = model_name.to_string();
                }
            }
            ".inputs" => primary_inputs.extend(tokens[1..].iter().map(|s| s.to_string())),
            ".outputs" => primary_outputs.extend(tokens[1..].iter().map(|s| s.to_string())),
            ".names" => {
                let Some((output, inputs)) = tokens[1..].split_last() else {
                    return Err(BlifError::Syntax {
                        line,
                        msg: ".names requires at least one signal".to_string(),
                    });
                };
                current = Some(PendingGate {
                    line,
                    output: output.to_string(),
                    inputs: inputs.iter().map(|s| s.to_string()).collect(),
                    cubes: Vec::new(),
                    constant_true: false,
                });
            }
            ".end" => break,
            ".latch" | ".subckt" | ".gate" => {
                return Err(BlifError::Unsupported {
                    line,
                    directive: directive.to_string(),
                })
            }
            _ => log::debug!("parse_blif; ignoring directive {} on line {}", directive, line),
        }
    }
    if let Some(gate) = current.take() {
        gates.push(gate.into_gate()?);
    }

    let circuit = Circuit::new(&name, primary_inputs, primary_outputs, gates)?;
    log::debug!(
        "parse_blif; model '{}' inputs: {} outputs: {} gates: {}",
        circuit.name,
        circuit.primary_inputs.len(),
        circuit.primary_outputs.len(),
        circuit.gates().len()
    );
    Ok(circuit)
}

pub fn parse_blif_file(path: &Path) -> Result<Circuit, BlifError> {
    let text = std::fs::read_to_string(path).map_err(|source| BlifError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_blif(&text)
}

/// Renders `circuit` as BLIF, gates in declaration order.
pub fn emit_blif(circuit: &Circuit) -> String {
    let mut out = String::new();
    out.push_str(&format!(".model {}\n", circuit.name));
    out.push_str(&format!(".inputs {}\n", circuit.primary_inputs.join(" ")));
    out.push_str(&format!(".outputs {}\n", circuit.primary_outputs.join(" ")));
    for gate in circuit.gates() {
        out.push_str(".names");
        for input in &gate.inputs {
            out.push(' ');
            out.push_str(input);
        }
        out.push(' ');
        out.push_str(&gate.name);
        out.push('\n');
        out.push_str(&gate.truth_table.to_string());
    }
    out.push_str(".end\n");
    out
}

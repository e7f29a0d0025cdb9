// SPDX-License-Identifier: Apache-2.0

//! Encodes an implementation/specification circuit pair as boolean terms for
//! rectification.
//!
//! Gates of the implementation that are in the fix-set become lookup tables
//! over fresh parameter variables; every other gate of both circuits is
//! encoded from its onset cubes. The two circuits read the same primary-input
//! variables but otherwise live in disjoint namespaces.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;

use crate::circuit::{Circuit, CircuitError, Gate};
use crate::term::{Namespace, TermRef, TermStore};
use crate::truth_table::{CubeValue, TruthTable};

/// Largest gate arity we parameterize. The counterexample-to-constraint step
/// addresses a parameter by the gate's input pattern, which we only support
/// for these small tables.
pub const MAX_PARAMETERIZED_ARITY: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    Circuit(CircuitError),
    PrimaryInputMismatch {
        impl_only: Vec<String>,
        spec_only: Vec<String>,
    },
    PrimaryOutputMismatch {
        impl_only: Vec<String>,
        spec_only: Vec<String>,
    },
    UnknownFixGate(String),
    /// The gate to fix has no same-named gate in the specification.
    MissingSpecGate(String),
    SpecArityMismatch {
        gate: String,
        impl_arity: usize,
        spec_arity: usize,
    },
    UnsupportedArity {
        gate: String,
        arity: usize,
    },
}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EncodeError::Circuit(e) => write!(f, "{}", e),
            EncodeError::PrimaryInputMismatch {
                impl_only,
                spec_only,
            } => write!(
                f,
                "circuits have different primary inputs; impl only: {:?}, spec only: {:?}",
                impl_only, spec_only
            ),
            EncodeError::PrimaryOutputMismatch {
                impl_only,
                spec_only,
            } => write!(
                f,
                "circuits have different primary outputs; impl only: {:?}, spec only: {:?}",
                impl_only, spec_only
            ),
            EncodeError::UnknownFixGate(name) => write!(
                f,
                "gate to fix '{}' is not a gate of the implementation",
                name
            ),
            EncodeError::MissingSpecGate(name) => write!(
                f,
                "gate to fix '{}' has no counterpart in the specification",
                name
            ),
            EncodeError::SpecArityMismatch {
                gate,
                impl_arity,
                spec_arity,
            } => write!(
                f,
                "gate to fix '{}' has {} inputs in the implementation but {} in the specification",
                gate, impl_arity, spec_arity
            ),
            EncodeError::UnsupportedArity { gate, arity } => write!(
                f,
                "gate '{}' has {} inputs; parameterized gates support at most {}",
                gate, arity, MAX_PARAMETERIZED_ARITY
            ),
        }
    }
}

impl std::error::Error for EncodeError {}

impl From<CircuitError> for EncodeError {
    fn from(e: CircuitError) -> Self {
        EncodeError::Circuit(e)
    }
}

/// How an implementation gate is encoded; decided once per encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateRole {
    Fixed,
    /// `params[i]` is the gate output for the input pattern with row index `i`.
    Parameterized { params: Vec<TermRef> },
}

/// A gate being synthesized and its parameter variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamGate {
    pub gate_name: String,
    pub params: Vec<TermRef>,
}

pub struct Encoding<'c> {
    pub terms: TermStore,
    /// All parameter variables, gate by gate in implementation dependency
    /// order.
    pub params: Vec<TermRef>,
    pub param_gates: Vec<ParamGate>,
    /// Shared primary-input variables, in implementation declaration order.
    pub inputs: Vec<(String, TermRef)>,
    /// Conjunction of `out == f(inputs)` for every gate of both circuits.
    pub behavior: TermRef,
    /// Conjunction of `impl_out == spec_out` for every primary output.
    pub correctness: TermRef,
    pub roles: HashMap<String, GateRole>,
    pub impl_signals: HashMap<String, TermRef>,
    pub spec_signals: HashMap<String, TermRef>,
    pub impl_circuit: &'c Circuit,
    pub spec_circuit: &'c Circuit,
}

impl<'c> Encoding<'c> {
    pub fn input_names(&self) -> Vec<&str> {
        self.inputs.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn output_names(&self) -> &[String] {
        &self.impl_circuit.primary_outputs
    }
}

/// Returns the sum-of-products term for `tt` over `inputs`.
pub fn encode_fixed(store: &mut TermStore, inputs: &[TermRef], tt: &TruthTable) -> TermRef {
    assert_eq!(inputs.len(), tt.num_inputs());
    let mut products: Vec<TermRef> = Vec::with_capacity(tt.onset_cubes().len());
    for cube in tt.onset_cubes() {
        if cube.is_tautology() {
            return store.constant(true);
        }
        let mut literals: Vec<TermRef> = Vec::new();
        for (value, input) in cube.values().iter().zip(inputs.iter()) {
            match value {
                CubeValue::One => literals.push(*input),
                CubeValue::Zero => literals.push(store.not(*input)),
                CubeValue::DontCare => {}
            }
        }
        products.push(store.and(&literals));
    }
    // An empty onset is constant false.
    store.or(&products)
}

// Selects params[row_index(inputs)] with a tree of conditionals on the inputs,
// first input outermost.
fn select_by_inputs(store: &mut TermStore, inputs: &[TermRef], params: &[TermRef]) -> TermRef {
    debug_assert_eq!(params.len(), 1usize << inputs.len());
    match inputs.split_first() {
        None => params[0],
        Some((first, rest)) => {
            let half = params.len() / 2;
            let when_false = select_by_inputs(store, rest, &params[..half]);
            let when_true = select_by_inputs(store, rest, &params[half..]);
            store.ite(*first, when_true, when_false)
        }
    }
}

// Allocates the `2^arity` parameter variables of a lookup-table gate, named
// `gate[row]`.
fn parameter_vars(
    store: &mut TermStore,
    gate_name: &str,
    arity: usize,
) -> Result<Vec<TermRef>, EncodeError> {
    if arity > MAX_PARAMETERIZED_ARITY {
        return Err(EncodeError::UnsupportedArity {
            gate: gate_name.to_string(),
            arity,
        });
    }
    Ok((0..(1usize << arity))
        .map(|i| store.fresh_var(Namespace::Param, &format!("{}[{}]", gate_name, i)))
        .collect())
}

/// Encodes a lookup-table gate with `2^arity` fresh parameter variables.
///
/// For two inputs `[a, b]` the term is `a ? (b ? p3 : p2) : (b ? p1 : p0)`.
pub fn encode_parameterized(
    store: &mut TermStore,
    gate_name: &str,
    inputs: &[TermRef],
) -> Result<(TermRef, Vec<TermRef>), EncodeError> {
    let params = parameter_vars(store, gate_name, inputs.len())?;
    let output = select_by_inputs(store, inputs, &params);
    Ok((output, params))
}

fn set_difference(lhs: &[String], rhs: &[String]) -> Vec<String> {
    let rhs: HashSet<&String> = rhs.iter().collect();
    lhs.iter().filter(|s| !rhs.contains(s)).cloned().collect()
}

fn check_same_interface(
    impl_circuit: &Circuit,
    spec_circuit: &Circuit,
) -> Result<(), EncodeError> {
    let impl_only = set_difference(&impl_circuit.primary_inputs, &spec_circuit.primary_inputs);
    let spec_only = set_difference(&spec_circuit.primary_inputs, &impl_circuit.primary_inputs);
    if !impl_only.is_empty() || !spec_only.is_empty() {
        return Err(EncodeError::PrimaryInputMismatch {
            impl_only,
            spec_only,
        });
    }
    let impl_only = set_difference(
        &impl_circuit.primary_outputs,
        &spec_circuit.primary_outputs,
    );
    let spec_only = set_difference(
        &spec_circuit.primary_outputs,
        &impl_circuit.primary_outputs,
    );
    if !impl_only.is_empty() || !spec_only.is_empty() {
        return Err(EncodeError::PrimaryOutputMismatch {
            impl_only,
            spec_only,
        });
    }
    Ok(())
}

/// Validates that every gate to fix can be parameterized and has a
/// same-arity counterpart in the specification.
pub fn check_fix_set(
    impl_circuit: &Circuit,
    spec_circuit: &Circuit,
    gates_to_fix: &BTreeSet<String>,
) -> Result<(), EncodeError> {
    for name in gates_to_fix {
        let gate = impl_circuit
            .get_gate(name)
            .ok_or_else(|| EncodeError::UnknownFixGate(name.clone()))?;
        if gate.num_inputs() > MAX_PARAMETERIZED_ARITY {
            return Err(EncodeError::UnsupportedArity {
                gate: name.clone(),
                arity: gate.num_inputs(),
            });
        }
        let spec_gate = spec_circuit
            .get_gate(name)
            .ok_or_else(|| EncodeError::MissingSpecGate(name.clone()))?;
        if spec_gate.num_inputs() != gate.num_inputs() {
            return Err(EncodeError::SpecArityMismatch {
                gate: name.clone(),
                impl_arity: gate.num_inputs(),
                spec_arity: spec_gate.num_inputs(),
            });
        }
    }
    Ok(())
}

fn gate_input_terms(gate: &Gate, signals: &HashMap<String, TermRef>) -> Vec<TermRef> {
    gate.inputs.iter().map(|net| signals[net]).collect()
}

// Decides how each implementation gate is encoded, allocating parameter
// variables for the gates to fix in dependency order.
fn resolve_roles(
    terms: &mut TermStore,
    impl_order: &[&Gate],
    gates_to_fix: &BTreeSet<String>,
) -> Result<HashMap<String, GateRole>, EncodeError> {
    let mut roles: HashMap<String, GateRole> = HashMap::with_capacity(impl_order.len());
    for gate in impl_order {
        let role = if gates_to_fix.contains(&gate.name) {
            GateRole::Parameterized {
                params: parameter_vars(terms, &gate.name, gate.num_inputs())?,
            }
        } else {
            GateRole::Fixed
        };
        roles.insert(gate.name.clone(), role);
    }
    Ok(roles)
}

pub fn encode<'c>(
    impl_circuit: &'c Circuit,
    spec_circuit: &'c Circuit,
    gates_to_fix: &BTreeSet<String>,
) -> Result<Encoding<'c>, EncodeError> {
    check_same_interface(impl_circuit, spec_circuit)?;
    check_fix_set(impl_circuit, spec_circuit, gates_to_fix)?;
    let impl_order = impl_circuit.dependency_order()?;
    let spec_order = spec_circuit.dependency_order()?;

    let mut terms = TermStore::new();
    let mut constraints: Vec<TermRef> = Vec::new();

    let mut inputs: Vec<(String, TermRef)> =
        Vec::with_capacity(impl_circuit.primary_inputs.len());
    for pi in &impl_circuit.primary_inputs {
        inputs.push((pi.clone(), terms.var(Namespace::Input, pi)));
    }

    let roles = resolve_roles(&mut terms, &impl_order, gates_to_fix)?;
    let mut impl_signals: HashMap<String, TermRef> = inputs.iter().cloned().collect();
    let mut all_params: Vec<TermRef> = Vec::new();
    let mut param_gates: Vec<ParamGate> = Vec::new();
    for gate in impl_order {
        let gate_inputs = gate_input_terms(gate, &impl_signals);
        let out = terms.var(Namespace::Impl, &gate.name);
        let function = match &roles[&gate.name] {
            GateRole::Fixed => encode_fixed(&mut terms, &gate_inputs, &gate.truth_table),
            GateRole::Parameterized { params } => {
                all_params.extend(params.iter().cloned());
                param_gates.push(ParamGate {
                    gate_name: gate.name.clone(),
                    params: params.clone(),
                });
                select_by_inputs(&mut terms, &gate_inputs, params)
            }
        };
        constraints.push(terms.iff(out, function));
        impl_signals.insert(gate.name.clone(), out);
    }

    // Only the primary inputs are shared with the implementation.
    let mut spec_signals: HashMap<String, TermRef> = inputs.iter().cloned().collect();
    for gate in spec_order {
        let gate_inputs = gate_input_terms(gate, &spec_signals);
        let out = terms.var(Namespace::Spec, &gate.name);
        let function = encode_fixed(&mut terms, &gate_inputs, &gate.truth_table);
        constraints.push(terms.iff(out, function));
        spec_signals.insert(gate.name.clone(), out);
    }

    let mut output_equalities: Vec<TermRef> =
        Vec::with_capacity(impl_circuit.primary_outputs.len());
    for po in &impl_circuit.primary_outputs {
        let impl_out = impl_signals[po];
        let spec_out = spec_signals[po];
        output_equalities.push(terms.iff(impl_out, spec_out));
    }
    let correctness = terms.and(&output_equalities);
    let behavior = terms.and(&constraints);

    log::info!(
        "encode; impl '{}' gates: {} spec '{}' gates: {} parameters: {} terms: {}",
        impl_circuit.name,
        impl_circuit.gates().len(),
        spec_circuit.name,
        spec_circuit.gates().len(),
        all_params.len(),
        terms.len()
    );

    Ok(Encoding {
        terms,
        params: all_params,
        param_gates,
        inputs,
        behavior,
        correctness,
        roles,
        impl_signals,
        spec_signals,
        impl_circuit,
        spec_circuit,
    })
}

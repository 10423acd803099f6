// SPDX-License-Identifier: Apache-2.0

//! Single-pattern simulation, fault-free or with stuck-at overrides.
//!
//! Propagation uses a worklist seeded with every gate in
//! [`Netlist::eval_order`]: declaration order for a topologically declared
//! file, otherwise a dependency order, so a gate declared before its drivers
//! is evaluated after them rather than rejected. After a gate is evaluated
//! its value is copied onto its fanout stubs, and any stub that is itself a
//! gate is appended to the worklist so it is evaluated again with the new
//! value. Termination relies on the netlist being acyclic, which
//! [`Netlist::from_raw`] enforces.
//!
//! Fault overrides are re-imposed after every write into the snapshot, so a
//! stuck-at signal can never be observed with its driven value.
//!
//! Stubs of a primary input are loaded from the pattern bit, not from the
//! (possibly faulted) input itself. A stuck-at on a fanout primary input
//! therefore only changes the stem, which no gate reads; faults on the
//! individual branches are what model a faulty input pin.

use std::collections::VecDeque;
use std::iter::zip;

use crate::fault::FaultSet;
use crate::gate_eval::{evaluate, EvalError};
use crate::netlist::{Netlist, SignalId};

/// Value snapshot for one simulation run. `None` means "not yet computed".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignalValues {
    values: Vec<Option<bool>>,
}

impl SignalValues {
    pub fn new(signal_count: usize) -> Self {
        Self {
            values: vec![None; signal_count],
        }
    }

    pub fn get(&self, id: SignalId) -> Option<bool> {
        self.values.get(id.index()).copied().flatten()
    }

    pub fn set(&mut self, id: SignalId, value: bool) {
        self.values[id.index()] = Some(value);
    }
}

/// How characters of an externally supplied bit string are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PatternDecoding {
    /// `'1'` is true, any other character is false.
    #[default]
    Lenient,
    /// Only `'0'` and `'1'` are accepted.
    Strict,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimError {
    PatternLength { expected: usize, got: usize },
    InvalidPatternChar { position: usize, found: char },
    UnknownFaultSignal(SignalId),
    MissingOperand { gate: String, operand: String },
    Eval { gate: String, error: EvalError },
    UnresolvedOutput(String),
}

impl std::fmt::Display for SimError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SimError::PatternLength { expected, got } => write!(
                f,
                "input pattern has {} bit(s) but the netlist has {} primary input(s)",
                got, expected
            ),
            SimError::InvalidPatternChar { position, found } => write!(
                f,
                "input pattern character '{}' at position {} is not '0' or '1'",
                found, position
            ),
            SimError::UnknownFaultSignal(id) => {
                write!(f, "fault targets signal #{} which is not in the netlist", id.index())
            }
            SimError::MissingOperand { gate, operand } => write!(
                f,
                "gate '{}' evaluated before operand '{}' had a value",
                gate, operand
            ),
            SimError::Eval { gate, error } => write!(f, "evaluating gate '{}': {}", gate, error),
            SimError::UnresolvedOutput(name) => {
                write!(f, "primary output '{}' has no value after simulation", name)
            }
        }
    }
}

impl std::error::Error for SimError {}

/// Decodes a bit string (most significant bit first, one character per
/// primary input in declaration order).
pub fn decode_pattern(
    pattern: &str,
    input_count: usize,
    decoding: PatternDecoding,
) -> Result<Vec<bool>, SimError> {
    let got = pattern.chars().count();
    if got != input_count {
        return Err(SimError::PatternLength {
            expected: input_count,
            got,
        });
    }
    pattern
        .chars()
        .enumerate()
        .map(|(position, c)| match (c, decoding) {
            ('1', _) => Ok(true),
            ('0', _) | (_, PatternDecoding::Lenient) => Ok(false),
            (found, PatternDecoding::Strict) => {
                Err(SimError::InvalidPatternChar { position, found })
            }
        })
        .collect()
}

/// Forces every faulted signal to its stuck value.
fn apply_overrides(faults: &FaultSet, values: &mut SignalValues) {
    for fault in faults.iter() {
        values.set(fault.signal, fault.value);
    }
}

/// Copies `value` onto the stubs of `origin`; stubs that are also gates go
/// back on the worklist.
fn propagate_to_stubs(
    netlist: &Netlist,
    origin: SignalId,
    value: bool,
    faults: &FaultSet,
    values: &mut SignalValues,
    mut worklist: Option<&mut VecDeque<SignalId>>,
) {
    let stubs = netlist.stubs_of(origin);
    if stubs.is_empty() {
        return;
    }
    for &stub in stubs {
        values.set(stub, value);
        if netlist.is_gate(stub) {
            if let Some(worklist) = worklist.as_deref_mut() {
                log::trace!("rescheduling gate {} fed by {}", netlist.name(stub), netlist.name(origin));
                worklist.push_back(stub);
            }
        }
    }
    apply_overrides(faults, values);
}

/// Simulates one input pattern given as booleans and returns the primary
/// output values in declaration order.
///
/// Gates may be declared in any order; they are evaluated in the netlist's
/// dependency order, so a forward reference is not an error.
pub fn simulate_bits(
    netlist: &Netlist,
    inputs: &[bool],
    faults: &FaultSet,
) -> Result<Vec<bool>, SimError> {
    if inputs.len() != netlist.primary_inputs().len() {
        return Err(SimError::PatternLength {
            expected: netlist.primary_inputs().len(),
            got: inputs.len(),
        });
    }
    if let Some(fault) = faults
        .iter()
        .find(|fault| fault.signal.index() >= netlist.signal_count())
    {
        return Err(SimError::UnknownFaultSignal(fault.signal));
    }

    let mut values = SignalValues::new(netlist.signal_count());
    for (input, value) in zip(netlist.primary_inputs(), inputs) {
        values.set(*input, *value);
    }
    apply_overrides(faults, &mut values);
    for (input, value) in zip(netlist.primary_inputs(), inputs) {
        propagate_to_stubs(netlist, *input, *value, faults, &mut values, None);
    }

    let mut worklist: VecDeque<SignalId> = netlist.eval_order().iter().copied().collect();
    while let Some(gate_id) = worklist.pop_front() {
        let Some(gate) = netlist.gate(gate_id) else {
            continue;
        };
        let output = evaluate(gate, &values).map_err(|error| match error {
            EvalError::MissingOperand(operand) => SimError::MissingOperand {
                gate: netlist.name(gate_id).to_string(),
                operand: netlist.name(operand).to_string(),
            },
            error => SimError::Eval {
                gate: netlist.name(gate_id).to_string(),
                error,
            },
        })?;
        log::trace!("{} = {}", netlist.name(gate_id), output);
        values.set(gate_id, output);
        apply_overrides(faults, &mut values);
        let stem_value = faults.forced_value(gate_id).unwrap_or(output);
        propagate_to_stubs(
            netlist,
            gate_id,
            stem_value,
            faults,
            &mut values,
            Some(&mut worklist),
        );
    }

    netlist
        .primary_outputs()
        .iter()
        .map(|output| {
            values
                .get(*output)
                .ok_or_else(|| SimError::UnresolvedOutput(netlist.name(*output).to_string()))
        })
        .collect()
}

/// Simulates one bit-string pattern using lenient decoding.
///
/// A netlist whose gates reference signals declared later is reordered, not
/// rejected; see [`simulate_bits`].
pub fn simulate(netlist: &Netlist, pattern: &str, faults: &FaultSet) -> Result<Vec<bool>, SimError> {
    simulate_with_decoding(netlist, pattern, faults, PatternDecoding::Lenient)
}

pub fn simulate_with_decoding(
    netlist: &Netlist,
    pattern: &str,
    faults: &FaultSet,
    decoding: PatternDecoding,
) -> Result<Vec<bool>, SimError> {
    let inputs = decode_pattern(pattern, netlist.primary_inputs().len(), decoding)?;
    simulate_bits(netlist, &inputs, faults)
}

/// Pairs output values with the primary output names.
pub fn named_outputs<'a>(netlist: &'a Netlist, outputs: &[bool]) -> Vec<(&'a str, bool)> {
    zip(netlist.primary_outputs(), outputs)
        .map(|(id, value)| (netlist.name(*id), *value))
        .collect()
}

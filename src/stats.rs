// SPDX-License-Identifier: Apache-2.0

//! Structural summary of a netlist.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::gate_eval::GateKind;
use crate::netlist::{Netlist, SignalId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetlistSummary {
    pub inputs: usize,
    pub outputs: usize,
    pub gates: usize,
    /// Signals with more than one reader.
    pub fanout_stems: usize,
    pub fanout_stubs: usize,
    /// Size of the single stuck-at fault universe.
    pub stuck_at_faults: usize,
    /// Longest gate chain from a primary input to any signal.
    pub logic_depth: usize,
    pub gate_kinds: BTreeMap<GateKind, usize>,
}

/// Depth of every gate output; primary inputs are at depth 0 and stubs take
/// the depth of their origin.
fn gate_depths(netlist: &Netlist) -> HashMap<SignalId, usize> {
    let mut depths: HashMap<SignalId, usize> = HashMap::new();
    let depth_of = |depths: &HashMap<SignalId, usize>, id: SignalId| -> usize {
        if let Some(depth) = depths.get(&id) {
            return *depth;
        }
        netlist
            .origin_of(id)
            .and_then(|origin| depths.get(&origin).copied())
            .unwrap_or(0)
    };
    for &gate_id in netlist.eval_order() {
        let Some(gate) = netlist.gate(gate_id) else {
            continue;
        };
        let deepest_operand = gate
            .operands()
            .iter()
            .map(|operand| depth_of(&depths, *operand))
            .max()
            .unwrap_or(0);
        depths.insert(gate_id, deepest_operand + 1);
    }
    depths
}

pub fn get_summary_stats(netlist: &Netlist) -> NetlistSummary {
    let mut gate_kinds: BTreeMap<GateKind, usize> = BTreeMap::new();
    for (_, gate) in netlist.gates() {
        *gate_kinds.entry(gate.kind()).or_insert(0) += 1;
    }
    let logic_depth = gate_depths(netlist).values().copied().max().unwrap_or(0);
    let inputs = netlist.primary_inputs().len();
    NetlistSummary {
        inputs,
        outputs: netlist.primary_outputs().len(),
        gates: netlist.gate_count(),
        fanout_stems: netlist.fanout_map().len(),
        fanout_stubs: netlist.stub_count(),
        stuck_at_faults: 2 * (inputs + netlist.gate_count() + netlist.stub_count()),
        logic_depth,
        gate_kinds,
    }
}

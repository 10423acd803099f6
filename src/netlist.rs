// SPDX-License-Identifier: Apache-2.0

//! Structural netlist model with fanout-stub expansion.
//!
//! Whenever a signal feeds more than one gate input, each of those input
//! occurrences is rewritten to a distinct stub signal named
//! `<origin>_<k>` (with `k` counting from 1 in gate declaration and operand
//! order). A stuck-at fault can then be placed on one branch without touching
//! the others.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};

use string_interner::backend::StringBackend;
use string_interner::symbol::SymbolU32;
use string_interner::{StringInterner, Symbol};

use crate::bench_parser::RawNetlist;
use crate::gate_eval::GateKind;

/// Dense handle for a named node of the netlist: a primary input, a gate
/// output or a fanout stub.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SignalId(u32);

impl SignalId {
    pub fn index(self) -> usize {
        self.0 as usize
    }

    fn from_symbol(symbol: SymbolU32) -> Self {
        SignalId(symbol.to_usize() as u32)
    }

    fn to_symbol(self) -> Option<SymbolU32> {
        SymbolU32::try_from_usize(self.index())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gate {
    kind: GateKind,
    operands: Vec<SignalId>,
}

impl Gate {
    pub fn kind(&self) -> GateKind {
        self.kind
    }

    /// Operands after fanout expansion.
    pub fn operands(&self) -> &[SignalId] {
        &self.operands
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetlistError {
    UnknownGateKind { gate: String, kind: String },
    ArityMismatch { gate: String, kind: GateKind, got: usize },
    DanglingOperand { gate: String, operand: String },
    DuplicateSignal(String),
    UndrivenOutput(String),
    StubNameCollision { origin: String, stub: String },
    CombinationalCycle { gate: String },
}

impl std::fmt::Display for NetlistError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NetlistError::UnknownGateKind { gate, kind } => {
                write!(f, "gate '{}' has unrecognized kind '{}'", gate, kind)
            }
            NetlistError::ArityMismatch { gate, kind, got } => write!(
                f,
                "gate '{}' of kind {} has {} operand(s); expected {}",
                gate,
                kind,
                got,
                if kind.is_unary() {
                    "exactly 1"
                } else {
                    "at least 2"
                }
            ),
            NetlistError::DanglingOperand { gate, operand } => write!(
                f,
                "gate '{}' references '{}' which is neither a primary input nor a gate",
                gate, operand
            ),
            NetlistError::DuplicateSignal(name) => {
                write!(f, "signal '{}' is declared more than once", name)
            }
            NetlistError::UndrivenOutput(name) => write!(
                f,
                "primary output '{}' is neither a primary input nor a gate",
                name
            ),
            NetlistError::StubNameCollision { origin, stub } => write!(
                f,
                "fanout stub '{}' of '{}' collides with a primary input",
                stub, origin
            ),
            NetlistError::CombinationalCycle { gate } => {
                write!(f, "combinational cycle through gate '{}'", gate)
            }
        }
    }
}

impl std::error::Error for NetlistError {}

/// Immutable, fanout-expanded netlist.
pub struct Netlist {
    interner: StringInterner<StringBackend<SymbolU32>>,
    primary_inputs: Vec<SignalId>,
    primary_outputs: Vec<SignalId>,
    /// Gates in declaration order.
    gates: Vec<(SignalId, Gate)>,
    gate_index: HashMap<SignalId, usize>,
    /// Origin signal to its stubs, in the order origins first fanned out.
    fanout_map: Vec<(SignalId, Vec<SignalId>)>,
    fanout_index: HashMap<SignalId, usize>,
    stub_origin: HashMap<SignalId, SignalId>,
    eval_order: Vec<SignalId>,
}

impl Netlist {
    /// Builds the netlist from parsed structural records, expanding fanout
    /// and validating the structure.
    pub fn from_raw(raw: &RawNetlist) -> Result<Netlist, NetlistError> {
        let mut interner: StringInterner<StringBackend<SymbolU32>> = StringInterner::new();
        let mut declared: HashSet<&str> = HashSet::new();

        let mut primary_inputs = Vec::with_capacity(raw.inputs.len());
        for name in raw.inputs.iter() {
            if !declared.insert(name.as_str()) {
                return Err(NetlistError::DuplicateSignal(name.clone()));
            }
            primary_inputs.push(SignalId::from_symbol(interner.get_or_intern(name)));
        }
        let input_names: HashSet<&str> = raw.inputs.iter().map(|s| s.as_str()).collect();

        let mut kinds = Vec::with_capacity(raw.gates.len());
        for (name, raw_gate) in raw.gates.iter() {
            if !declared.insert(name.as_str()) {
                return Err(NetlistError::DuplicateSignal(name.clone()));
            }
            let kind: GateKind =
                raw_gate
                    .kind
                    .parse()
                    .map_err(|_| NetlistError::UnknownGateKind {
                        gate: name.clone(),
                        kind: raw_gate.kind.clone(),
                    })?;
            if !kind.accepts_operand_count(raw_gate.operands.len()) {
                return Err(NetlistError::ArityMismatch {
                    gate: name.clone(),
                    kind,
                    got: raw_gate.operands.len(),
                });
            }
            kinds.push(kind);
            interner.get_or_intern(name);
        }

        for (name, raw_gate) in raw.gates.iter() {
            for operand in raw_gate.operands.iter() {
                if !declared.contains(operand.as_str()) {
                    return Err(NetlistError::DanglingOperand {
                        gate: name.clone(),
                        operand: operand.clone(),
                    });
                }
            }
        }

        let mut primary_outputs = Vec::with_capacity(raw.outputs.len());
        for name in raw.outputs.iter() {
            match interner.get(name) {
                Some(symbol) if declared.contains(name.as_str()) => {
                    primary_outputs.push(SignalId::from_symbol(symbol))
                }
                _ => return Err(NetlistError::UndrivenOutput(name.clone())),
            }
        }

        // Count how many gate operand occurrences reference each signal.
        let mut use_count: HashMap<&str, usize> = HashMap::new();
        for (_, raw_gate) in raw.gates.iter() {
            for operand in raw_gate.operands.iter() {
                *use_count.entry(operand.as_str()).or_insert(0) += 1;
            }
        }

        let mut gates = Vec::with_capacity(raw.gates.len());
        let mut gate_index = HashMap::with_capacity(raw.gates.len());
        let mut fanout_map: Vec<(SignalId, Vec<SignalId>)> = Vec::new();
        let mut fanout_index: HashMap<SignalId, usize> = HashMap::new();
        let mut stub_origin: HashMap<SignalId, SignalId> = HashMap::new();
        for ((name, raw_gate), kind) in raw.gates.iter().zip(kinds) {
            let mut operands = Vec::with_capacity(raw_gate.operands.len());
            for operand in raw_gate.operands.iter() {
                let origin = SignalId::from_symbol(interner.get_or_intern(operand));
                if use_count[operand.as_str()] <= 1 {
                    operands.push(origin);
                    continue;
                }
                let slot = *fanout_index.entry(origin).or_insert_with(|| {
                    fanout_map.push((origin, Vec::new()));
                    fanout_map.len() - 1
                });
                let branch = fanout_map[slot].1.len() + 1;
                let stub_name = format!("{}_{}", operand, branch);
                if input_names.contains(stub_name.as_str()) {
                    return Err(NetlistError::StubNameCollision {
                        origin: operand.clone(),
                        stub: stub_name,
                    });
                }
                if declared.contains(stub_name.as_str()) {
                    log::warn!(
                        "fanout stub '{}' of '{}' aliases gate '{}'; the gate is re-evaluated when '{}' changes",
                        stub_name,
                        operand,
                        stub_name,
                        operand
                    );
                }
                let stub = SignalId::from_symbol(interner.get_or_intern(&stub_name));
                fanout_map[slot].1.push(stub);
                stub_origin.insert(stub, origin);
                operands.push(stub);
            }
            let id = SignalId::from_symbol(interner.get_or_intern(name));
            gate_index.insert(id, gates.len());
            gates.push((id, Gate { kind, operands }));
        }

        for input in raw.inputs.iter() {
            if !use_count.contains_key(input.as_str()) && !raw.outputs.contains(input) {
                log::warn!("primary input '{}' drives nothing", input);
            }
        }

        let mut netlist = Netlist {
            interner,
            primary_inputs,
            primary_outputs,
            gates,
            gate_index,
            fanout_map,
            fanout_index,
            stub_origin,
            eval_order: Vec::new(),
        };
        netlist.eval_order = netlist.compute_eval_order()?;
        log::info!(
            "built netlist: {} inputs, {} outputs, {} gates, {} fanout stubs",
            netlist.primary_inputs.len(),
            netlist.primary_outputs.len(),
            netlist.gates.len(),
            netlist.stub_count()
        );
        Ok(netlist)
    }

    /// Returns the index of the gate whose value `signal` carries, looking
    /// through a stub to its origin.
    fn driving_gate(&self, signal: SignalId) -> Option<usize> {
        if let Some(&index) = self.gate_index.get(&signal) {
            return Some(index);
        }
        self.stub_origin
            .get(&signal)
            .and_then(|origin| self.gate_index.get(origin).copied())
    }

    /// Stable topological order over the gates: among the gates whose
    /// drivers are all scheduled, the earliest declared one goes first. For a
    /// netlist declared in topological order this is the declaration order.
    fn compute_eval_order(&self) -> Result<Vec<SignalId>, NetlistError> {
        let n = self.gates.len();
        let mut in_degree = vec![0usize; n];
        let mut consumers: Vec<Vec<usize>> = vec![Vec::new(); n];
        for (consumer, (id, gate)) in self.gates.iter().enumerate() {
            for operand in gate.operands.iter() {
                if let Some(driver) = self.driving_gate(*operand) {
                    consumers[driver].push(consumer);
                    in_degree[consumer] += 1;
                }
            }
            // A gate that is also a stub gets rewritten whenever its origin
            // is.
            if let Some(origin) = self.stub_origin.get(id) {
                if let Some(&driver) = self.gate_index.get(origin) {
                    consumers[driver].push(consumer);
                    in_degree[consumer] += 1;
                }
            }
        }

        let mut ready: BinaryHeap<Reverse<usize>> = in_degree
            .iter()
            .enumerate()
            .filter(|(_, degree)| **degree == 0)
            .map(|(i, _)| Reverse(i))
            .collect();
        let mut order = Vec::with_capacity(n);
        while let Some(Reverse(current)) = ready.pop() {
            order.push(self.gates[current].0);
            for &consumer in consumers[current].iter() {
                in_degree[consumer] -= 1;
                if in_degree[consumer] == 0 {
                    ready.push(Reverse(consumer));
                }
            }
        }

        if order.len() != n {
            let stuck = in_degree
                .iter()
                .position(|degree| *degree > 0)
                .map(|i| self.name(self.gates[i].0).to_string())
                .unwrap_or_default();
            return Err(NetlistError::CombinationalCycle { gate: stuck });
        }
        let reordered = order
            .iter()
            .zip(self.gates.iter())
            .any(|(scheduled, (declared, _))| scheduled != declared);
        if reordered {
            log::info!("gate declarations are not topologically ordered; evaluating in dependency order");
        }
        Ok(order)
    }

    pub fn primary_inputs(&self) -> &[SignalId] {
        &self.primary_inputs
    }

    pub fn primary_outputs(&self) -> &[SignalId] {
        &self.primary_outputs
    }

    /// Gates in declaration order.
    pub fn gates(&self) -> impl Iterator<Item = (SignalId, &Gate)> {
        self.gates.iter().map(|(id, gate)| (*id, gate))
    }

    pub fn gate_count(&self) -> usize {
        self.gates.len()
    }

    pub fn gate(&self, id: SignalId) -> Option<&Gate> {
        self.gate_index.get(&id).map(|&i| &self.gates[i].1)
    }

    pub fn is_gate(&self, id: SignalId) -> bool {
        self.gate_index.contains_key(&id)
    }

    /// Order in which the simulator first visits the gates.
    pub fn eval_order(&self) -> &[SignalId] {
        &self.eval_order
    }

    pub fn fanout_map(&self) -> &[(SignalId, Vec<SignalId>)] {
        &self.fanout_map
    }

    /// Stubs fed by `id`; empty when `id` has fan-out of at most one.
    pub fn stubs_of(&self, id: SignalId) -> &[SignalId] {
        match self.fanout_index.get(&id) {
            Some(&slot) => &self.fanout_map[slot].1,
            None => &[],
        }
    }

    pub fn origin_of(&self, stub: SignalId) -> Option<SignalId> {
        self.stub_origin.get(&stub).copied()
    }

    pub fn stub_count(&self) -> usize {
        self.fanout_map.iter().map(|(_, stubs)| stubs.len()).sum()
    }

    /// Number of distinct signal ids; every id's `index()` is below this.
    pub fn signal_count(&self) -> usize {
        self.interner.len()
    }

    pub fn name(&self, id: SignalId) -> &str {
        id.to_symbol()
            .and_then(|symbol| self.interner.resolve(symbol))
            .unwrap_or("<unknown>")
    }

    pub fn signal_id(&self, name: &str) -> Option<SignalId> {
        self.interner.get(name).map(SignalId::from_symbol)
    }

    pub fn names(&self, ids: &[SignalId]) -> Vec<&str> {
        ids.iter().map(|id| self.name(*id)).collect()
    }
}

impl std::fmt::Debug for Netlist {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Netlist")
            .field("primary_inputs", &self.names(&self.primary_inputs))
            .field("primary_outputs", &self.names(&self.primary_outputs))
            .field("gate_count", &self.gates.len())
            .field("stub_count", &self.stub_count())
            .finish()
    }
}

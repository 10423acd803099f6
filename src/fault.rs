// SPDX-License-Identifier: Apache-2.0

//! Stuck-at fault candidates and their enumeration.

use serde::Serialize;

use crate::netlist::{Netlist, SignalId};

/// One signal forced to a constant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StuckAt {
    pub signal: SignalId,
    pub value: bool,
}

/// A fault candidate: one or more signals, each forced to a constant. No
/// signal appears twice.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FaultSet {
    /// Sorted by signal.
    faults: Vec<StuckAt>,
}

impl FaultSet {
    /// The fault-free configuration.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn single(signal: SignalId, value: bool) -> Self {
        Self {
            faults: vec![StuckAt { signal, value }],
        }
    }

    /// Builds a set from individual stuck-at faults; returns `None` if a
    /// signal is listed more than once.
    pub fn from_faults<I: IntoIterator<Item = StuckAt>>(faults: I) -> Option<Self> {
        let mut faults: Vec<StuckAt> = faults.into_iter().collect();
        faults.sort();
        if faults.windows(2).any(|w| w[0].signal == w[1].signal) {
            return None;
        }
        Some(Self { faults })
    }

    /// Union of two sets, or `None` if they force a common signal.
    pub fn try_merge(&self, other: &FaultSet) -> Option<FaultSet> {
        FaultSet::from_faults(self.faults.iter().chain(other.faults.iter()).copied())
    }

    pub fn iter(&self) -> impl Iterator<Item = &StuckAt> {
        self.faults.iter()
    }

    pub fn len(&self) -> usize {
        self.faults.len()
    }

    pub fn is_empty(&self) -> bool {
        self.faults.is_empty()
    }

    pub fn is_multi(&self) -> bool {
        self.faults.len() > 1
    }

    pub fn forced_value(&self, signal: SignalId) -> Option<bool> {
        self.faults
            .binary_search_by_key(&signal, |f| f.signal)
            .ok()
            .map(|i| self.faults[i].value)
    }

    /// Renders as e.g. `16_1/SA1+7/SA0` using the netlist's signal names.
    pub fn display<'a>(&'a self, netlist: &'a Netlist) -> FaultSetDisplay<'a> {
        FaultSetDisplay {
            faults: self,
            netlist,
        }
    }

    pub fn to_named(&self, netlist: &Netlist) -> Vec<NamedStuckAt> {
        self.faults
            .iter()
            .map(|f| NamedStuckAt {
                signal: netlist.name(f.signal).to_string(),
                stuck_at: u8::from(f.value),
            })
            .collect()
    }
}

pub struct FaultSetDisplay<'a> {
    faults: &'a FaultSet,
    netlist: &'a Netlist,
}

impl std::fmt::Display for FaultSetDisplay<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.faults.is_empty() {
            return write!(f, "<fault-free>");
        }
        for (i, fault) in self.faults.iter().enumerate() {
            if i > 0 {
                write!(f, "+")?;
            }
            write!(
                f,
                "{}/SA{}",
                self.netlist.name(fault.signal),
                u8::from(fault.value)
            )?;
        }
        Ok(())
    }
}

/// Name-based form of a stuck-at fault for reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NamedStuckAt {
    pub signal: String,
    pub stuck_at: u8,
}

/// Two candidates (stuck-at-1 then stuck-at-0) for every primary input, every
/// gate output and every fanout stub.
pub fn enumerate_single_faults(netlist: &Netlist) -> Vec<FaultSet> {
    let fanout_signals = netlist
        .fanout_map()
        .iter()
        .flat_map(|(_, stubs)| stubs.iter().copied());
    let signals = netlist
        .primary_inputs()
        .iter()
        .copied()
        .chain(netlist.gates().map(|(id, _)| id))
        .chain(fanout_signals);

    let signal_count =
        netlist.primary_inputs().len() + netlist.gate_count() + netlist.stub_count();
    let mut faults = Vec::with_capacity(2 * signal_count);
    for signal in signals {
        faults.push(FaultSet::single(signal, true));
        faults.push(FaultSet::single(signal, false));
    }
    log::info!("enumerated {} single stuck-at faults", faults.len());
    faults
}

/// Calls `f` with every `k`-element index combination of `0..n` in
/// lexicographic order.
fn for_each_combination(n: usize, k: usize, mut f: impl FnMut(&[usize])) {
    if k == 0 || k > n {
        return;
    }
    let mut indices: Vec<usize> = (0..k).collect();
    loop {
        f(&indices);
        // Find the rightmost index that can still move right.
        let Some(i) = (0..k).rev().find(|&i| indices[i] != i + n - k) else {
            return;
        };
        indices[i] += 1;
        for j in i + 1..k {
            indices[j] = indices[j - 1] + 1;
        }
    }
}

/// Every combination of at least `min_size` (and at most `max_size`, if
/// given) candidates, merged into one multi-fault. Combinations in which two
/// candidates force the same signal are skipped.
///
/// Combinations are produced by increasing size and, within a size, in
/// lexicographic order of candidate positions. The count grows
/// combinatorially, so callers should bound `max_size` for anything but tiny
/// candidate lists.
pub fn enumerate_multi_faults(
    candidates: &[FaultSet],
    min_size: usize,
    max_size: Option<usize>,
) -> Vec<FaultSet> {
    let min_size = min_size.max(2);
    let max_size = max_size.unwrap_or(candidates.len()).min(candidates.len());
    let mut multi = Vec::new();
    for size in min_size..=max_size {
        let before = multi.len();
        for_each_combination(candidates.len(), size, |combo| {
            let merged = FaultSet::from_faults(
                combo
                    .iter()
                    .flat_map(|&i| candidates[i].iter().copied()),
            );
            if let Some(merged) = merged {
                multi.push(merged);
            }
        });
        log::debug!("size {}: {} multi-fault combinations", size, multi.len() - before);
    }
    multi
}

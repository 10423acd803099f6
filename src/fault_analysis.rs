// SPDX-License-Identifier: Apache-2.0

//! Exhaustive fault detection.
//!
//! The fault-free response to every input pattern is computed once. Each
//! fault candidate is then simulated pattern by pattern, in numeric order,
//! until some pattern's outputs diverge from the fault-free response (the
//! fault is detected) or the pattern space is exhausted (the fault is
//! undetectable).
//!
//! Faults are independent of each other, so the candidate list can be spread
//! over a pool of scoped worker threads sharing the netlist and truth table
//! read-only.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::fault::FaultSet;
use crate::netlist::Netlist;
use crate::pattern::{fill_pattern_bits, pattern_count, pattern_to_string, MAX_PATTERN_INPUTS};
use crate::sim::{simulate_bits, SimError};

pub const DEFAULT_MAX_INPUTS: usize = 24;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisOptions {
    /// Worker threads; 0 means one per available CPU.
    pub threads: usize,
    /// Largest primary input count accepted for exhaustive enumeration.
    pub max_inputs: usize,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            threads: 1,
            max_inputs: DEFAULT_MAX_INPUTS,
        }
    }
}

impl AnalysisOptions {
    pub fn worker_count(&self, job_count: usize) -> usize {
        let threads = if self.threads == 0 {
            num_cpus::get()
        } else {
            self.threads
        };
        std::cmp::max(1, std::cmp::min(threads, job_count))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    TooManyInputs { inputs: usize, max: usize },
    /// The fault-free reference run failed; nothing can be classified.
    FaultFree { pattern: String, error: SimError },
    /// A faulty run failed. `fault` is the rendered fault set.
    Faulty {
        fault: String,
        pattern: String,
        error: SimError,
    },
    WorkerPanicked,
}

impl std::fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnalysisError::TooManyInputs { inputs, max } => write!(
                f,
                "netlist has {} primary inputs; exhaustive analysis is limited to {}",
                inputs, max
            ),
            AnalysisError::FaultFree { pattern, error } => {
                write!(f, "fault-free simulation of pattern {} failed: {}", pattern, error)
            }
            AnalysisError::Faulty {
                fault,
                pattern,
                error,
            } => write!(
                f,
                "simulation of fault {} on pattern {} failed: {}",
                fault, pattern, error
            ),
            AnalysisError::WorkerPanicked => write!(f, "fault analysis worker panicked"),
        }
    }
}

impl std::error::Error for AnalysisError {}

/// Fault-free primary output values for every input pattern, indexed by
/// pattern number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TruthTable {
    input_count: usize,
    rows: Vec<Vec<bool>>,
}

impl TruthTable {
    pub fn compute(netlist: &Netlist, max_inputs: usize) -> Result<TruthTable, AnalysisError> {
        let input_count = netlist.primary_inputs().len();
        let limit = std::cmp::min(max_inputs, MAX_PATTERN_INPUTS);
        let count = match pattern_count(input_count) {
            Some(count) if input_count <= limit => count,
            _ => {
                return Err(AnalysisError::TooManyInputs {
                    inputs: input_count,
                    max: limit,
                })
            }
        };
        let none = FaultSet::none();
        let mut bits = vec![false; input_count];
        let mut rows = Vec::with_capacity(count as usize);
        for pattern in 0..count {
            fill_pattern_bits(pattern, &mut bits);
            let outputs =
                simulate_bits(netlist, &bits, &none).map_err(|error| AnalysisError::FaultFree {
                    pattern: pattern_to_string(pattern, input_count),
                    error,
                })?;
            rows.push(outputs);
        }
        log::info!("computed fault-free truth table over {} patterns", count);
        Ok(TruthTable { input_count, rows })
    }

    pub fn input_count(&self) -> usize {
        self.input_count
    }

    pub fn pattern_count(&self) -> u64 {
        self.rows.len() as u64
    }

    pub fn row(&self, pattern: u64) -> &[bool] {
        &self.rows[pattern as usize]
    }

    /// `(pattern number, outputs)` in numeric pattern order.
    pub fn iter(&self) -> impl Iterator<Item = (u64, &[bool])> {
        self.rows
            .iter()
            .enumerate()
            .map(|(p, row)| (p as u64, row.as_slice()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FaultOutcome {
    /// First pattern (in numeric order) whose outputs diverge.
    Detected { pattern: u64 },
    Undetectable,
}

impl FaultOutcome {
    pub fn is_detected(&self) -> bool {
        matches!(self, FaultOutcome::Detected { .. })
    }
}

/// Classification of a fault list; `outcomes[i]` belongs to `faults[i]`.
#[derive(Debug, Clone)]
pub struct FaultAnalysis {
    faults: Vec<FaultSet>,
    outcomes: Vec<FaultOutcome>,
    input_count: usize,
    duration: Duration,
}

impl FaultAnalysis {
    pub fn faults(&self) -> &[FaultSet] {
        &self.faults
    }

    pub fn outcomes(&self) -> &[FaultOutcome] {
        &self.outcomes
    }

    pub fn iter(&self) -> impl Iterator<Item = (&FaultSet, FaultOutcome)> {
        self.faults.iter().zip(self.outcomes.iter().copied())
    }

    pub fn detected(&self) -> Vec<&FaultSet> {
        self.iter()
            .filter(|(_, outcome)| outcome.is_detected())
            .map(|(fault, _)| fault)
            .collect()
    }

    pub fn undetectable(&self) -> Vec<&FaultSet> {
        self.iter()
            .filter(|(_, outcome)| !outcome.is_detected())
            .map(|(fault, _)| fault)
            .collect()
    }

    pub fn detected_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_detected()).count()
    }

    pub fn undetectable_count(&self) -> usize {
        self.outcomes.len() - self.detected_count()
    }

    pub fn input_count(&self) -> usize {
        self.input_count
    }

    /// Wall time of the whole analysis, truth table included.
    pub fn duration(&self) -> Duration {
        self.duration
    }
}

/// Simulates `fault` against every pattern until the first divergence.
pub fn classify_fault(
    netlist: &Netlist,
    truth_table: &TruthTable,
    fault: &FaultSet,
) -> Result<FaultOutcome, AnalysisError> {
    let mut bits = vec![false; truth_table.input_count()];
    for (pattern, expected) in truth_table.iter() {
        fill_pattern_bits(pattern, &mut bits);
        let outputs = simulate_bits(netlist, &bits, fault).map_err(|error| AnalysisError::Faulty {
            fault: fault.display(netlist).to_string(),
            pattern: pattern_to_string(pattern, truth_table.input_count()),
            error,
        })?;
        if outputs != expected {
            log::debug!(
                "{} detected by {}",
                fault.display(netlist),
                pattern_to_string(pattern, truth_table.input_count())
            );
            return Ok(FaultOutcome::Detected { pattern });
        }
    }
    log::debug!("{} is undetectable", fault.display(netlist));
    Ok(FaultOutcome::Undetectable)
}

fn classify_sequential(
    netlist: &Netlist,
    truth_table: &TruthTable,
    faults: &[FaultSet],
) -> Result<Vec<FaultOutcome>, AnalysisError> {
    faults
        .iter()
        .map(|fault| classify_fault(netlist, truth_table, fault))
        .collect()
}

fn classify_parallel(
    netlist: &Netlist,
    truth_table: &TruthTable,
    faults: &[FaultSet],
    worker_count: usize,
) -> Result<Vec<FaultOutcome>, AnalysisError> {
    let next = AtomicUsize::new(0);
    let failed = AtomicBool::new(false);

    let worker_results: Vec<Result<Vec<(usize, FaultOutcome)>, AnalysisError>> =
        std::thread::scope(|scope| {
            let next = &next;
            let failed = &failed;
            let handles: Vec<_> = (0..worker_count)
                .map(|_| {
                    scope.spawn(move || {
                        let mut classified = Vec::new();
                        loop {
                            if failed.load(Ordering::SeqCst) {
                                break;
                            }
                            let index = next.fetch_add(1, Ordering::SeqCst);
                            if index >= faults.len() {
                                break;
                            }
                            match classify_fault(netlist, truth_table, &faults[index]) {
                                Ok(outcome) => classified.push((index, outcome)),
                                Err(e) => {
                                    failed.store(true, Ordering::SeqCst);
                                    return Err(e);
                                }
                            }
                        }
                        Ok(classified)
                    })
                })
                .collect();
            handles
                .into_iter()
                .map(|handle| handle.join().unwrap_or(Err(AnalysisError::WorkerPanicked)))
                .collect()
        });

    let mut outcomes: Vec<Option<FaultOutcome>> = vec![None; faults.len()];
    for result in worker_results {
        for (index, outcome) in result? {
            outcomes[index] = Some(outcome);
        }
    }
    // Every index below faults.len() was claimed by exactly one worker, and
    // no worker failed.
    outcomes
        .into_iter()
        .map(|outcome| outcome.ok_or(AnalysisError::WorkerPanicked))
        .collect()
}

/// Classifies every fault candidate as detected or undetectable under
/// exhaustive stimulus.
///
/// Any simulation failure aborts the whole analysis: a partial classification
/// would misstate coverage.
pub fn analyze(
    netlist: &Netlist,
    faults: &[FaultSet],
    options: &AnalysisOptions,
) -> Result<FaultAnalysis, AnalysisError> {
    let start = Instant::now();
    let truth_table = TruthTable::compute(netlist, options.max_inputs)?;
    let worker_count = options.worker_count(faults.len());
    log::info!(
        "classifying {} faults over {} patterns with {} worker(s)",
        faults.len(),
        truth_table.pattern_count(),
        worker_count
    );
    let outcomes = if worker_count <= 1 {
        classify_sequential(netlist, &truth_table, faults)?
    } else {
        classify_parallel(netlist, &truth_table, faults, worker_count)?
    };
    let analysis = FaultAnalysis {
        faults: faults.to_vec(),
        outcomes,
        input_count: truth_table.input_count(),
        duration: start.elapsed(),
    };
    log::info!(
        "fault analysis done: {} detected, {} undetectable in {:?}",
        analysis.detected_count(),
        analysis.undetectable_count(),
        analysis.duration()
    );
    Ok(analysis)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fault::enumerate_single_faults;
    use crate::test_utils::{build_netlist, AND2_BENCH, C17_BENCH, REDUNDANT_BENCH};
    use pretty_assertions::assert_eq;

    fn outcome_of(netlist: &Netlist, analysis: &FaultAnalysis, rendered: &str) -> FaultOutcome {
        analysis
            .iter()
            .find(|(fault, _)| fault.display(netlist).to_string() == rendered)
            .map(|(_, outcome)| outcome)
            .unwrap()
    }

    #[test]
    fn test_and2_truth_table() {
        let netlist = build_netlist(AND2_BENCH);
        let table = TruthTable::compute(&netlist, DEFAULT_MAX_INPUTS).unwrap();
        let rows: Vec<Vec<bool>> = table.iter().map(|(_, row)| row.to_vec()).collect();
        assert_eq!(
            rows,
            vec![vec![false], vec![false], vec![false], vec![true]]
        );
    }

    #[test]
    fn test_and2_first_detecting_pattern() {
        let netlist = build_netlist(AND2_BENCH);
        let g = netlist.signal_id("G").unwrap();
        let one = netlist.signal_id("1").unwrap();
        let analysis = analyze(
            &netlist,
            &[FaultSet::single(g, true), FaultSet::single(one, false)],
            &AnalysisOptions::default(),
        )
        .unwrap();
        assert_eq!(
            analysis.outcomes(),
            &[
                FaultOutcome::Detected { pattern: 0b00 },
                FaultOutcome::Detected { pattern: 0b11 }
            ]
        );
    }

    #[test]
    fn test_redundant_circuit() {
        let netlist = build_netlist(REDUNDANT_BENCH);
        let faults = enumerate_single_faults(&netlist);
        let analysis = analyze(&netlist, &faults, &AnalysisOptions::default()).unwrap();
        let undetectable: Vec<String> = analysis
            .undetectable()
            .iter()
            .map(|f| f.display(&netlist).to_string())
            .collect();
        assert_eq!(
            undetectable,
            vec!["a/SA1", "a/SA0", "b/SA1", "b/SA0", "g1/SA0", "a_1/SA0"]
        );
        assert_eq!(faults.len(), 12);
        assert_eq!(analysis.detected_count(), 6);
        assert_eq!(
            outcome_of(&netlist, &analysis, "a_1/SA1"),
            FaultOutcome::Detected { pattern: 0b01 }
        );
        assert_eq!(
            outcome_of(&netlist, &analysis, "a_2/SA0"),
            FaultOutcome::Detected { pattern: 0b10 }
        );
    }

    #[test]
    fn test_c17_first_detecting_patterns() {
        let netlist = build_netlist(C17_BENCH);
        let faults = enumerate_single_faults(&netlist);
        let analysis = analyze(&netlist, &faults, &AnalysisOptions::default()).unwrap();
        let undetectable: Vec<String> = analysis
            .undetectable()
            .iter()
            .map(|f| f.display(&netlist).to_string())
            .collect();
        // Input 3 fans out, so only its branches 3_1 and 3_2 are observable.
        assert_eq!(undetectable, vec!["3/SA1", "3/SA0"]);
        assert_eq!(analysis.detected_count(), 32);
        let expected = [
            ("1/SA1", 0b00100),
            ("3_1/SA1", 0b10000),
            ("3_2/SA0", 0b00111),
            ("11_1/SA1", 0b01110),
            ("11_2/SA0", 0b00001),
            ("16_2/SA1", 0b01000),
        ];
        for (rendered, pattern) in expected {
            assert_eq!(
                outcome_of(&netlist, &analysis, rendered),
                FaultOutcome::Detected { pattern },
                "{}",
                rendered
            );
        }
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let netlist = build_netlist(C17_BENCH);
        let faults = enumerate_single_faults(&netlist);
        let sequential = analyze(&netlist, &faults, &AnalysisOptions::default()).unwrap();
        for threads in [2, 4, 0] {
            let options = AnalysisOptions {
                threads,
                ..AnalysisOptions::default()
            };
            let parallel = analyze(&netlist, &faults, &options).unwrap();
            assert_eq!(parallel.outcomes(), sequential.outcomes());
            assert_eq!(parallel.faults(), sequential.faults());
        }
    }

    #[test]
    fn test_detected_and_undetectable_partition_faults() {
        let netlist = build_netlist(REDUNDANT_BENCH);
        let faults = enumerate_single_faults(&netlist);
        let analysis = analyze(&netlist, &faults, &AnalysisOptions::default()).unwrap();
        let detected = analysis.detected();
        let undetectable = analysis.undetectable();
        assert_eq!(detected.len() + undetectable.len(), faults.len());
        for fault in faults.iter() {
            let in_detected = detected.contains(&fault);
            let in_undetectable = undetectable.contains(&fault);
            assert!(in_detected != in_undetectable);
        }
    }

    #[test]
    fn test_forcing_a_constant_signal_to_its_value_is_undetectable() {
        // `k` is always 0, so stuck-at-0 on it changes nothing.
        let netlist = build_netlist(
            "INPUT(a)\nOUTPUT(y)\nn = NOT(a)\nk = AND(a, n)\ny = OR(k, a)\n",
        );
        let k = netlist.signal_id("k").unwrap();
        let analysis = analyze(
            &netlist,
            &[FaultSet::single(k, false), FaultSet::single(k, true)],
            &AnalysisOptions::default(),
        )
        .unwrap();
        assert_eq!(
            analysis.outcomes(),
            &[
                FaultOutcome::Undetectable,
                FaultOutcome::Detected { pattern: 0 }
            ]
        );
    }

    #[test]
    fn test_too_many_inputs() {
        let netlist = build_netlist(C17_BENCH);
        let options = AnalysisOptions {
            threads: 1,
            max_inputs: 4,
        };
        let err = analyze(&netlist, &[], &options).unwrap_err();
        assert_eq!(err, AnalysisError::TooManyInputs { inputs: 5, max: 4 });
    }

    #[test]
    fn test_fault_on_foreign_signal_aborts() {
        let small = build_netlist(AND2_BENCH);
        let big = build_netlist(C17_BENCH);
        let foreign = big.signal_id("16_2").unwrap();
        let err = analyze(
            &small,
            &[FaultSet::single(foreign, true)],
            &AnalysisOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, AnalysisError::Faulty { .. }), "{:?}", err);
    }
}

// SPDX-License-Identifier: Apache-2.0

//! Exhaustive single stuck-at fault simulation for combinational gate-level
//! netlists.
//!
//! The flow is:
//!
//! 1. parse a `.bench` description into a [`bench_parser::RawNetlist`];
//! 2. build a [`netlist::Netlist`], which expands every multi-fanout signal
//!    into per-branch stubs;
//! 3. enumerate fault candidates with [`fault::enumerate_single_faults`]
//!    (and optionally [`fault::enumerate_multi_faults`]);
//! 4. classify every candidate against the exhaustive fault-free truth table
//!    with [`fault_analysis::analyze`];
//! 5. summarize the result via [`metrics::FaultMetrics`].

pub mod bench_parser;
pub mod fault;
pub mod fault_analysis;
pub mod fsim_error;
pub mod gate_eval;
pub mod io;
pub mod metrics;
pub mod netlist;
pub mod pattern;
pub mod sim;
pub mod stats;

#[cfg(test)]
pub(crate) mod test_utils;

pub use fsim_error::FsimError;

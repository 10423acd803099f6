// SPDX-License-Identifier: Apache-2.0

//! The `fault-sim` subcommand: exhaustive fault classification and the
//! coverage report.

use std::path::Path;

use clap::ArgMatches;
use fsim::fault::{enumerate_multi_faults, enumerate_single_faults, NamedStuckAt};
use fsim::fault_analysis::{analyze, AnalysisOptions, FaultAnalysis, FaultOutcome};
use fsim::io::load_netlist_from_path;
use fsim::metrics::FaultMetrics;
use fsim::netlist::Netlist;
use fsim::pattern::pattern_to_string;
use serde::Serialize;

use crate::config::{resolve, resolve_flag, FsimConfig, ReportFormat};
use crate::report_cli_error::{report_anyhow_and_exit, report_cli_error_and_exit};

const SUBCOMMAND: &str = "fault-sim";

/// Multi-fault combinations grow combinatorially; pairs only unless asked.
pub const DEFAULT_MAX_FAULT_SIZE: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum FaultMode {
    Single,
    Multi,
}

#[derive(Serialize)]
struct FaultEntry {
    fault: Vec<NamedStuckAt>,
    #[serde(flatten)]
    outcome: FaultOutcome,
    /// Bit-string form of the detecting pattern.
    #[serde(skip_serializing_if = "Option::is_none")]
    detected_by: Option<String>,
}

#[derive(Serialize)]
struct FaultSimReport {
    netlist: String,
    mode: FaultMode,
    inputs: usize,
    patterns: u64,
    metrics: FaultMetrics,
    #[serde(skip_serializing_if = "Option::is_none")]
    faults: Option<Vec<FaultEntry>>,
}

fn fault_entries(netlist: &Netlist, analysis: &FaultAnalysis) -> Vec<FaultEntry> {
    analysis
        .iter()
        .map(|(fault, outcome)| FaultEntry {
            fault: fault.to_named(netlist),
            outcome,
            detected_by: match outcome {
                FaultOutcome::Detected { pattern } => {
                    Some(pattern_to_string(pattern, analysis.input_count()))
                }
                FaultOutcome::Undetectable => None,
            },
        })
        .collect()
}

fn format_percent(value: Option<f64>) -> String {
    match value {
        Some(value) => format!("{:.2}%", value),
        None => "undefined".to_string(),
    }
}

fn print_text(report: &FaultSimReport, netlist: &Netlist, analysis: &FaultAnalysis) {
    let m = &report.metrics;
    println!("Netlist: {}", report.netlist);
    println!("Primary inputs: {} ({} patterns)", report.inputs, report.patterns);
    let mode = match report.mode {
        FaultMode::Single => "single",
        FaultMode::Multi => "multi",
    };
    println!("Faults: {} ({})", m.total_faults, mode);
    println!("Detected: {}", m.detected);
    println!("Undetectable: {}", m.undetectable);
    if report.faults.is_some() {
        for (fault, outcome) in analysis.iter() {
            match outcome {
                FaultOutcome::Detected { pattern } => println!(
                    "  {} detected by {}",
                    fault.display(netlist),
                    pattern_to_string(pattern, analysis.input_count())
                ),
                FaultOutcome::Undetectable => {
                    println!("  {} undetectable", fault.display(netlist))
                }
            }
        }
    }
    println!("Fault coverage: {}", format_percent(Some(m.coverage_percent)));
    println!("Fault efficiency: {}", format_percent(m.efficiency_percent));
    println!("Duration: {:.6} seconds", m.duration_secs);
}

pub fn handle_fault_sim(matches: &ArgMatches, config: &FsimConfig) {
    let Some(path) = matches.get_one::<String>("bench") else {
        report_cli_error_and_exit("netlist path is required", Some(SUBCOMMAND), vec![]);
    };
    let defaults = AnalysisOptions::default();
    let options = AnalysisOptions {
        threads: resolve(matches, "threads", config.threads, defaults.threads),
        max_inputs: resolve(matches, "max_inputs", config.max_inputs, defaults.max_inputs),
    };
    let format_str = resolve(matches, "format", config.format.clone(), "text".to_string());
    let format: ReportFormat = match format_str.parse() {
        Ok(format) => format,
        Err(e) => report_cli_error_and_exit(&e, Some(SUBCOMMAND), vec![]),
    };
    let multi = matches.get_flag("multi_fault");
    let max_fault_size = resolve(
        matches,
        "max_fault_size",
        config.max_fault_size,
        DEFAULT_MAX_FAULT_SIZE,
    );
    let list_faults = resolve_flag(matches, "list_faults", None);

    let netlist = match load_netlist_from_path(Path::new(path)) {
        Ok(netlist) => netlist,
        Err(e) => report_anyhow_and_exit(SUBCOMMAND, &e),
    };

    let singles = enumerate_single_faults(&netlist);
    let (mode, faults) = if multi {
        let faults = enumerate_multi_faults(&singles, 2, Some(max_fault_size));
        log::info!(
            "enumerated {} multi-fault combinations of size 2..={}",
            faults.len(),
            max_fault_size
        );
        (FaultMode::Multi, faults)
    } else {
        (FaultMode::Single, singles)
    };

    let analysis = match analyze(&netlist, &faults, &options) {
        Ok(analysis) => analysis,
        Err(e) => report_cli_error_and_exit(
            &e.to_string(),
            Some(SUBCOMMAND),
            vec![("netlist", path)],
        ),
    };
    let metrics = match FaultMetrics::from_analysis(&analysis) {
        Ok(metrics) => metrics,
        Err(e) => report_cli_error_and_exit(
            &e.to_string(),
            Some(SUBCOMMAND),
            vec![("netlist", path)],
        ),
    };

    let report = FaultSimReport {
        netlist: path.to_string(),
        mode,
        inputs: analysis.input_count(),
        patterns: 1u64 << analysis.input_count(),
        metrics,
        faults: if list_faults {
            Some(fault_entries(&netlist, &analysis))
        } else {
            None
        },
    };
    match format {
        ReportFormat::Text => print_text(&report, &netlist, &analysis),
        ReportFormat::Json => match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{}", json),
            Err(e) => report_cli_error_and_exit(
                "serializing report",
                Some(SUBCOMMAND),
                vec![("error", &e.to_string())],
            ),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_percent() {
        assert_eq!(format_percent(Some(100.0)), "100.00%");
        assert_eq!(format_percent(Some(71.42857142857143)), "71.43%");
        assert_eq!(format_percent(None), "undefined");
    }
}

// SPDX-License-Identifier: Apache-2.0

use std::path::Path;

use clap::ArgMatches;
use fsim::io::load_netlist_from_path;
use fsim::netlist::Netlist;
use fsim::stats::{get_summary_stats, NetlistSummary};
use serde::Serialize;

use crate::config::{resolve, FsimConfig, ReportFormat};
use crate::report_cli_error::{report_anyhow_and_exit, report_cli_error_and_exit};

const SUBCOMMAND: &str = "bench-info";

#[derive(Serialize)]
struct BenchInfoReport<'a> {
    netlist: String,
    summary: NetlistSummary,
    inputs: Vec<&'a str>,
    outputs: Vec<&'a str>,
    gates: Vec<GateReport<'a>>,
    fanout: Vec<FanoutReport<'a>>,
}

#[derive(Serialize)]
struct GateReport<'a> {
    name: &'a str,
    kind: &'static str,
    operands: Vec<&'a str>,
}

#[derive(Serialize)]
struct FanoutReport<'a> {
    stem: &'a str,
    stubs: Vec<&'a str>,
}

fn build_report<'a>(path: &Path, netlist: &'a Netlist) -> BenchInfoReport<'a> {
    BenchInfoReport {
        netlist: path.display().to_string(),
        summary: get_summary_stats(netlist),
        inputs: netlist.names(netlist.primary_inputs()),
        outputs: netlist.names(netlist.primary_outputs()),
        gates: netlist
            .gates()
            .map(|(id, gate)| GateReport {
                name: netlist.name(id),
                kind: gate.kind().as_str(),
                operands: netlist.names(gate.operands()),
            })
            .collect(),
        fanout: netlist
            .fanout_map()
            .iter()
            .map(|(stem, stubs)| FanoutReport {
                stem: netlist.name(*stem),
                stubs: netlist.names(stubs),
            })
            .collect(),
    }
}

fn print_text(report: &BenchInfoReport) {
    let s = &report.summary;
    println!("Netlist: {}", report.netlist);
    println!("Inputs ({}): {}", s.inputs, report.inputs.join(", "));
    println!("Outputs ({}): {}", s.outputs, report.outputs.join(", "));
    println!("Gates ({}):", s.gates);
    for gate in report.gates.iter() {
        println!("  {} = {}({})", gate.name, gate.kind, gate.operands.join(", "));
    }
    println!("Fanout stems ({}):", s.fanout_stems);
    for fanout in report.fanout.iter() {
        println!("  {} -> {}", fanout.stem, fanout.stubs.join(", "));
    }
    println!("Fanout stubs: {}", s.fanout_stubs);
    println!("Logic depth: {}", s.logic_depth);
    println!("Gate kinds:");
    for (kind, count) in s.gate_kinds.iter() {
        println!("  {}: {}", kind, count);
    }
    println!("Stuck-at faults: {}", s.stuck_at_faults);
}

pub fn handle_bench_info(matches: &ArgMatches, config: &FsimConfig) {
    let Some(path) = matches.get_one::<String>("bench") else {
        report_cli_error_and_exit("netlist path is required", Some(SUBCOMMAND), vec![]);
    };
    let format_str = resolve(matches, "format", config.format.clone(), "text".to_string());
    let format: ReportFormat = match format_str.parse() {
        Ok(format) => format,
        Err(e) => report_cli_error_and_exit(&e, Some(SUBCOMMAND), vec![]),
    };
    let path = Path::new(path);
    let netlist = match load_netlist_from_path(path) {
        Ok(netlist) => netlist,
        Err(e) => report_anyhow_and_exit(SUBCOMMAND, &e),
    };
    let report = build_report(path, &netlist);
    match format {
        ReportFormat::Text => print_text(&report),
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

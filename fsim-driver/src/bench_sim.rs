// SPDX-License-Identifier: Apache-2.0

use std::path::Path;

use clap::ArgMatches;
use fsim::fault::{FaultSet, StuckAt};
use fsim::io::load_netlist_from_path;
use fsim::netlist::Netlist;
use fsim::sim::{named_outputs, simulate_with_decoding, PatternDecoding};

use crate::config::{resolve_switch, FsimConfig};
use crate::report_cli_error::{report_anyhow_and_exit, report_cli_error_and_exit};

const SUBCOMMAND: &str = "sim";

/// Parses `SIGNAL=0` / `SIGNAL=1`. The split is on the last `=` so signal
/// names containing `=` are not ambiguous.
pub fn parse_fault_spec(netlist: &Netlist, spec: &str) -> Result<StuckAt, String> {
    let Some((name, value)) = spec.rsplit_once('=') else {
        return Err(format!("fault '{}' is not of the form SIGNAL=0|1", spec));
    };
    let value = match value {
        "0" => false,
        "1" => true,
        _ => {
            return Err(format!(
                "fault '{}' has stuck-at value '{}'; expected 0 or 1",
                spec, value
            ))
        }
    };
    let Some(signal) = netlist.signal_id(name) else {
        return Err(format!("fault '{}' names unknown signal '{}'", spec, name));
    };
    Ok(StuckAt { signal, value })
}

pub fn parse_fault_specs<'a, I: IntoIterator<Item = &'a str>>(
    netlist: &Netlist,
    specs: I,
) -> Result<FaultSet, String> {
    let faults = specs
        .into_iter()
        .map(|spec| parse_fault_spec(netlist, spec))
        .collect::<Result<Vec<StuckAt>, String>>()?;
    FaultSet::from_faults(faults).ok_or_else(|| "a signal is faulted more than once".to_string())
}

pub fn handle_sim(matches: &ArgMatches, config: &FsimConfig) {
    let (Some(path), Some(pattern)) = (
        matches.get_one::<String>("bench"),
        matches.get_one::<String>("pattern"),
    ) else {
        report_cli_error_and_exit(
            "netlist path and pattern are required",
            Some(SUBCOMMAND),
            vec![],
        );
    };
    let decoding = if resolve_switch(
        matches,
        "strict_patterns",
        "no_strict_patterns",
        config.strict_patterns,
    ) {
        PatternDecoding::Strict
    } else {
        PatternDecoding::Lenient
    };
    let netlist = match load_netlist_from_path(Path::new(path)) {
        Ok(netlist) => netlist,
        Err(e) => report_anyhow_and_exit(SUBCOMMAND, &e),
    };
    let specs = matches
        .get_many::<String>("fault")
        .map(|values| values.map(String::as_str).collect::<Vec<&str>>())
        .unwrap_or_default();
    let faults = match parse_fault_specs(&netlist, specs) {
        Ok(faults) => faults,
        Err(e) => report_cli_error_and_exit(&e, Some(SUBCOMMAND), vec![]),
    };
    log::info!("simulating {} with {}", pattern, faults.display(&netlist));

    let outputs = match simulate_with_decoding(&netlist, pattern, &faults, decoding) {
        Ok(outputs) => outputs,
        Err(e) => report_cli_error_and_exit(
            &e.to_string(),
            Some(SUBCOMMAND),
            vec![("pattern", pattern), ("netlist", path)],
        ),
    };
    if !faults.is_empty() {
        println!("Faults: {}", faults.display(&netlist));
    }
    for (name, value) in named_outputs(&netlist, &outputs) {
        println!("{} = {}", name, u8::from(value));
    }
}

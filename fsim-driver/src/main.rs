// SPDX-License-Identifier: Apache-2.0

//! Command line driver for exhaustive stuck-at fault simulation of
//! combinational `.bench` netlists.
//!
//! Commands are given like:
//!
//! ```text
//! fsim-driver <global-options> <command> <command-args-and-options>
//! ```
//!
//! Commands are:
//!
//! - bench-info: Prints the structure of a netlist after fanout expansion.
//! - sim: Simulates a single input pattern, optionally with faults injected.
//! - fault-sim: Classifies every fault candidate under exhaustive stimulus
//!   and reports fault coverage and fault efficiency.
//!
//! Sample usage:
//!
//! ```shell
//! $ cargo run -- bench-info tests/data/c17.bench
//! $ cargo run -- sim tests/data/c17.bench 01000 --fault 16_1=1
//! $ cargo run -- --config fsim.toml fault-sim tests/data/c17.bench \
//!     --threads 4 --list-faults --format json
//! ```

mod bench_info;
mod bench_sim;
mod config;
mod fault_sim;
mod report_cli_error;

use clap::{Arg, ArgAction};

use crate::config::{find_config_path, load_config, FsimConfig};
use crate::report_cli_error::{report_anyhow_and_exit, report_cli_error_and_exit};

trait AppExt {
    fn add_bench_arg(self) -> Self;
    fn add_format_arg(self) -> Self;
    fn add_switch(self, id: &'static str, long: &'static str, help: &'static str) -> Self;
    fn add_usize_arg(self, id: &'static str, long: &'static str, help: &'static str) -> Self;
}

impl AppExt for clap::Command {
    fn add_bench_arg(self) -> Self {
        (self as clap::Command).arg(
            Arg::new("bench")
                .value_name("BENCH")
                .help("The .bench netlist (optionally .gz compressed)")
                .required(true)
                .index(1),
        )
    }

    fn add_format_arg(self) -> Self {
        (self as clap::Command).arg(
            Arg::new("format")
                .long("format")
                .value_name("FORMAT")
                .help("Report format")
                .value_parser(["text", "json"])
                .action(ArgAction::Set),
        )
    }

    /// A presence-only boolean switch, e.g. `--multi-fault`.
    fn add_switch(self, id: &'static str, long: &'static str, help: &'static str) -> Self {
        (self as clap::Command).arg(
            Arg::new(id)
                .long(long)
                .action(ArgAction::SetTrue)
                .help(help),
        )
    }

    fn add_usize_arg(self, id: &'static str, long: &'static str, help: &'static str) -> Self {
        (self as clap::Command).arg(
            Arg::new(id)
                .long(long)
                .value_name("N")
                .value_parser(clap::value_parser!(usize))
                .action(ArgAction::Set)
                .help(help),
        )
    }
}

fn main() {
    let _ = env_logger::try_init();

    log::info!(
        "fsim-driver starting; version: {}",
        env!("CARGO_PKG_VERSION")
    );

    let matches = clap::Command::new("fsim-driver")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Exhaustive stuck-at fault simulation for combinational netlists")
        .arg(
            Arg::new("config")
                .long("config")
                .value_name("CONFIG")
                .help("Path to an fsim.toml file")
                .action(ArgAction::Set),
        )
        .subcommand(clap::Command::new("version").about("Prints the version of the driver"))
        .subcommand(
            clap::Command::new("bench-info")
                .about("Prints netlist structure, fanout expansion and fault count")
                .add_bench_arg()
                .add_format_arg(),
        )
        .subcommand(
            clap::Command::new("sim")
                .about("Simulates one input pattern")
                .add_bench_arg()
                .arg(
                    Arg::new("pattern")
                        .value_name("PATTERN")
                        .help("Bit string, one character per primary input, first input first")
                        .required(true)
                        .index(2),
                )
                .arg(
                    Arg::new("fault")
                        .long("fault")
                        .value_name("SIGNAL=0|1")
                        .help("Stuck-at fault to inject; may be repeated")
                        .action(ArgAction::Append),
                )
                .add_switch(
                    "strict_patterns",
                    "strict-patterns",
                    "Reject pattern characters other than 0 and 1",
                )
                .arg(
                    Arg::new("no_strict_patterns")
                        .long("no-strict-patterns")
                        .help("Read any character other than 1 as 0, even if the config file sets strict_patterns")
                        .action(ArgAction::SetTrue)
                        .conflicts_with("strict_patterns"),
                ),
        )
        .subcommand(
            clap::Command::new("fault-sim")
                .about("Classifies all stuck-at faults and reports coverage")
                .add_bench_arg()
                .add_switch(
                    "multi_fault",
                    "multi-fault",
                    "Analyze combinations of two or more single faults",
                )
                .add_usize_arg(
                    "max_fault_size",
                    "max-fault-size",
                    "Largest multi-fault combination size (default 2)",
                )
                .add_usize_arg(
                    "threads",
                    "threads",
                    "Worker threads; 0 uses one per CPU (default 1)",
                )
                .add_usize_arg(
                    "max_inputs",
                    "max-inputs",
                    "Refuse netlists with more primary inputs (default 24)",
                )
                .add_switch(
                    "list_faults",
                    "list-faults",
                    "Report the outcome of every fault",
                )
                .add_format_arg(),
        )
        .get_matches();

    let config: FsimConfig = match find_config_path(&matches) {
        Some(path) => {
            if !path.exists() {
                report_cli_error_and_exit(
                    "config file does not exist",
                    None,
                    vec![("path", &path.display().to_string())],
                );
            }
            match load_config(&path) {
                Ok(config) => config,
                Err(e) => report_anyhow_and_exit("config", &e),
            }
        }
        None => FsimConfig::default(),
    };

    if let Some(matches) = matches.subcommand_matches("bench-info") {
        bench_info::handle_bench_info(matches, &config);
    } else if let Some(matches) = matches.subcommand_matches("sim") {
        bench_sim::handle_sim(matches, &config);
    } else if let Some(matches) = matches.subcommand_matches("fault-sim") {
        fault_sim::handle_fault_sim(matches, &config);
    } else if let Some(_matches) = matches.subcommand_matches("version") {
        println!("{}", env!("CARGO_PKG_VERSION"));
    } else {
        report_cli_error_and_exit("No valid subcommand provided.", None, vec![]);
    }
}

// SPDX-License-Identifier: Apache-2.0

use crate::bench_parser::parse_bench;
use crate::netlist::Netlist;

pub const C17_BENCH: &str = include_str!("../tests/data/c17.bench");

/// `y = a OR (a AND b)`: the AND cone is redundant.
pub const REDUNDANT_BENCH: &str = include_str!("../tests/data/redundant.bench");

pub const AND2_BENCH: &str = "INPUT(1)\nINPUT(2)\nOUTPUT(G)\nG = AND(1, 2)\n";

pub fn build_netlist(text: &str) -> Netlist {
    let _ = env_logger::builder().is_test(true).try_init();
    let raw = parse_bench(text).unwrap();
    Netlist::from_raw(&raw).unwrap()
}

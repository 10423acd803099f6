// SPDX-License-Identifier: Apache-2.0

//! Reading `.bench` netlists from disk, plain or gzip-compressed.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use anyhow::{anyhow, Result};
use flate2::read::MultiGzDecoder;

use crate::bench_parser::{parse_bench, RawNetlist};
use crate::netlist::Netlist;

/// Reads the whole file, transparently decompressing `*.gz`.
pub fn read_bench_text(path: &Path) -> Result<String> {
    let file = File::open(path)
        .map_err(|e| anyhow!("opening netlist '{}': {}", path.display(), e))?;
    let is_gz = path.extension().map(|e| e == "gz").unwrap_or(false);
    let mut reader: Box<dyn Read> = if is_gz {
        Box::new(MultiGzDecoder::new(BufReader::new(file)))
    } else {
        Box::new(BufReader::new(file))
    };
    let mut text = String::new();
    reader
        .read_to_string(&mut text)
        .map_err(|e| anyhow!("reading netlist '{}': {}", path.display(), e))?;
    Ok(text)
}

pub fn load_bench_from_path(path: &Path) -> Result<RawNetlist> {
    let text = read_bench_text(path)?;
    let raw = parse_bench(&text).map_err(|e| anyhow!("{}: {}", path.display(), e))?;
    log::debug!(
        "parsed {}: {} inputs, {} outputs, {} gates",
        path.display(),
        raw.inputs.len(),
        raw.outputs.len(),
        raw.gates.len()
    );
    Ok(raw)
}

/// Parses and builds the netlist in one step.
pub fn load_netlist_from_path(path: &Path) -> Result<Netlist> {
    let raw = load_bench_from_path(path)?;
    let netlist =
        Netlist::from_raw(&raw).map_err(|e| anyhow!("{}: {}", path.display(), e))?;
    log::info!(
        "loaded {}: {} signals after fanout expansion",
        path.display(),
        netlist.signal_count()
    );
    Ok(netlist)
}

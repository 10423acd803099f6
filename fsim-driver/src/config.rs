// SPDX-License-Identifier: Apache-2.0

//! Optional `fsim.toml` configuration.
//!
//! Every setting can also be given on the command line; a flag always wins
//! over the file, and the file wins over the built-in default. Boolean
//! settings that the file can turn on also have a `--no-...` flag to turn
//! them back off.
//!
//! ```toml
//! [fault_sim]
//! threads = 0          # 0 = one worker per CPU
//! max_inputs = 20
//! max_fault_size = 3
//! strict_patterns = true
//! format = "json"
//! ```

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use clap::ArgMatches;
use serde::Deserialize;

pub const CONFIG_FILE_NAME: &str = "fsim.toml";

#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FsimConfig {
    /// Worker threads for fault analysis; 0 means one per available CPU.
    pub threads: Option<usize>,

    /// Refuse exhaustive analysis of netlists with more primary inputs.
    pub max_inputs: Option<usize>,

    /// Reject pattern characters other than `0` and `1`.
    pub strict_patterns: Option<bool>,

    /// Largest multi-fault combination size.
    pub max_fault_size: Option<usize>,

    /// `text` or `json`.
    pub format: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FsimConfigFile {
    #[serde(default)]
    fault_sim: FsimConfig,
}

/// Resolves which config file to read: the `--config` flag if given,
/// otherwise `fsim.toml` in the working directory if it exists.
pub fn find_config_path(matches: &ArgMatches) -> Option<PathBuf> {
    if let Some(path) = matches.get_one::<String>("config") {
        return Some(PathBuf::from(path));
    }
    let cwd_path = std::env::current_dir().ok()?.join(CONFIG_FILE_NAME);
    if cwd_path.exists() {
        log::info!(
            "Using {} in current directory: {}",
            CONFIG_FILE_NAME,
            cwd_path.display()
        );
        Some(cwd_path)
    } else {
        None
    }
}

pub fn parse_config(text: &str) -> Result<FsimConfig> {
    let file: FsimConfigFile =
        toml::from_str(text).map_err(|e| anyhow!("parsing config: {}", e))?;
    Ok(file.fault_sim)
}

pub fn load_config(path: &Path) -> Result<FsimConfig> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("reading config '{}': {}", path.display(), e))?;
    let config = parse_config(&text).map_err(|e| anyhow!("{}: {}", path.display(), e))?;
    log::debug!("loaded config from {}: {:?}", path.display(), config);
    Ok(config)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Text,
    Json,
}

impl std::str::FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(ReportFormat::Text),
            "json" => Ok(ReportFormat::Json),
            _ => Err(format!(
                "unknown report format '{}'; expected 'text' or 'json'",
                s
            )),
        }
    }
}

/// Flag value if present, else the config value, else `default`.
pub fn resolve<T: Clone + Send + Sync + 'static>(
    matches: &ArgMatches,
    flag: &str,
    from_config: Option<T>,
    default: T,
) -> T {
    if let Some(value) = matches.get_one::<T>(flag) {
        value.clone()
    } else if let Some(value) = from_config {
        value
    } else {
        default
    }
}

/// Boolean flags are spelled `--flag` with no value; presence wins, absence
/// defers to the config file.
pub fn resolve_flag(matches: &ArgMatches, flag: &str, from_config: Option<bool>) -> bool {
    matches.get_flag(flag) || from_config.unwrap_or(false)
}

/// Like `resolve_flag`, but an `off` flag can override a `true` from the
/// config file. The two flags are expected to conflict in clap.
pub fn resolve_switch(
    matches: &ArgMatches,
    on: &str,
    off: &str,
    from_config: Option<bool>,
) -> bool {
    if matches.get_flag(on) {
        true
    } else if matches.get_flag(off) {
        false
    } else {
        from_config.unwrap_or(false)
    }
}

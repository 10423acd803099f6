// SPDX-License-Identifier: Apache-2.0

use colored::Colorize;

/// Prints a fatal command-line error (and any `key: value` details) to stderr
/// and exits with status 1.
pub fn report_cli_error_and_exit(
    message: &str,
    subcommand: Option<&str>,
    details: Vec<(&str, &str)>,
) -> ! {
    let prefix = match subcommand {
        Some(subcommand) => format!("fsim-driver {}: ", subcommand),
        None => "fsim-driver: ".to_string(),
    };
    eprintln!("{}{}", prefix, message.red().bold());
    for (key, value) in details {
        eprintln!("  {}: {}", key.dimmed(), value);
    }
    std::process::exit(1);
}

/// Reports an `anyhow` error, listing each underlying cause as a detail line.
pub fn report_anyhow_and_exit(subcommand: &str, error: &anyhow::Error) -> ! {
    let causes: Vec<String> = error.chain().skip(1).map(|c| c.to_string()).collect();
    let details = causes.iter().map(|c| ("caused by", c.as_str())).collect();
    report_cli_error_and_exit(&error.to_string(), Some(subcommand), details)
}

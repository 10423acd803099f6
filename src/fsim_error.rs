// SPDX-License-Identifier: Apache-2.0

use crate::bench_parser::ParseError;
use crate::fault_analysis::AnalysisError;
use crate::metrics::MetricsError;
use crate::netlist::NetlistError;
use crate::sim::SimError;

/// Umbrella error for callers that drive several stages in a row.
#[derive(Debug)]
pub enum FsimError {
    Parse(ParseError),
    Netlist(NetlistError),
    Sim(SimError),
    Analysis(AnalysisError),
    Metrics(MetricsError),
}

impl std::fmt::Display for FsimError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FsimError::Parse(e) => write!(f, "fsim error: {}", e),
            FsimError::Netlist(e) => write!(f, "fsim error: {}", e),
            FsimError::Sim(e) => write!(f, "fsim error: {}", e),
            FsimError::Analysis(e) => write!(f, "fsim error: {}", e),
            FsimError::Metrics(e) => write!(f, "fsim error: {}", e),
        }
    }
}

impl std::error::Error for FsimError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FsimError::Parse(e) => Some(e),
            FsimError::Netlist(e) => Some(e),
            FsimError::Sim(e) => Some(e),
            FsimError::Analysis(e) => Some(e),
            FsimError::Metrics(e) => Some(e),
        }
    }
}

impl From<ParseError> for FsimError {
    fn from(e: ParseError) -> Self {
        FsimError::Parse(e)
    }
}

impl From<NetlistError> for FsimError {
    fn from(e: NetlistError) -> Self {
        FsimError::Netlist(e)
    }
}

impl From<SimError> for FsimError {
    fn from(e: SimError) -> Self {
        FsimError::Sim(e)
    }
}

impl From<AnalysisError> for FsimError {
    fn from(e: AnalysisError) -> Self {
        FsimError::Analysis(e)
    }
}

impl From<MetricsError> for FsimError {
    fn from(e: MetricsError) -> Self {
        FsimError::Metrics(e)
    }
}

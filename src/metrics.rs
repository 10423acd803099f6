// SPDX-License-Identifier: Apache-2.0

//! Fault coverage and fault efficiency.
//!
//! Coverage is the detected share of all faults. Efficiency is the detected
//! share of the faults that could be detected at all, i.e. with provably
//! undetectable faults removed from the denominator.

use serde::Serialize;

use crate::fault_analysis::FaultAnalysis;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricsError {
    EmptyFaultList,
    /// Every fault is undetectable; efficiency has no denominator.
    NoDetectableFaults,
    /// `detected + undetectable` exceeds the total.
    InconsistentCounts {
        detected: usize,
        undetectable: usize,
        total: usize,
    },
}

impl std::fmt::Display for MetricsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MetricsError::EmptyFaultList => write!(f, "fault list is empty"),
            MetricsError::NoDetectableFaults => write!(
                f,
                "fault efficiency is undefined: every fault is undetectable"
            ),
            MetricsError::InconsistentCounts {
                detected,
                undetectable,
                total,
            } => write!(
                f,
                "{} detected plus {} undetectable faults exceeds the total of {}",
                detected, undetectable, total
            ),
        }
    }
}

impl std::error::Error for MetricsError {}

/// Detected faults as a percentage of all faults.
pub fn fault_coverage(detected: usize, total: usize) -> Result<f64, MetricsError> {
    if total == 0 {
        return Err(MetricsError::EmptyFaultList);
    }
    if detected > total {
        return Err(MetricsError::InconsistentCounts {
            detected,
            undetectable: 0,
            total,
        });
    }
    Ok(detected as f64 / total as f64 * 100.0)
}

/// Detected faults as a percentage of the faults that are not provably
/// undetectable.
pub fn fault_efficiency(
    detected: usize,
    undetectable: usize,
    total: usize,
) -> Result<f64, MetricsError> {
    if total == 0 {
        return Err(MetricsError::EmptyFaultList);
    }
    if detected + undetectable > total {
        return Err(MetricsError::InconsistentCounts {
            detected,
            undetectable,
            total,
        });
    }
    let detectable = total - undetectable;
    if detectable == 0 {
        return Err(MetricsError::NoDetectableFaults);
    }
    Ok(detected as f64 / detectable as f64 * 100.0)
}

/// Summary of one analysis run, as reported to users.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FaultMetrics {
    pub total_faults: usize,
    pub detected: usize,
    pub undetectable: usize,
    pub coverage_percent: f64,
    /// `None` when every fault is undetectable.
    pub efficiency_percent: Option<f64>,
    pub duration_secs: f64,
}

impl FaultMetrics {
    pub fn from_analysis(analysis: &FaultAnalysis) -> Result<FaultMetrics, MetricsError> {
        let total = analysis.faults().len();
        let detected = analysis.detected_count();
        let undetectable = analysis.undetectable_count();
        let coverage_percent = fault_coverage(detected, total)?;
        let efficiency_percent = match fault_efficiency(detected, undetectable, total) {
            Ok(efficiency) => Some(efficiency),
            Err(MetricsError::NoDetectableFaults) => {
                log::warn!("fault efficiency undefined: no detectable faults");
                None
            }
            Err(e) => return Err(e),
        };
        Ok(FaultMetrics {
            total_faults: total,
            detected,
            undetectable,
            coverage_percent,
            efficiency_percent,
            duration_secs: analysis.duration().as_secs_f64(),
        })
    }

    pub fn efficiency(&self) -> Result<f64, MetricsError> {
        self.efficiency_percent
            .ok_or(MetricsError::NoDetectableFaults)
    }
}

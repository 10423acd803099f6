// SPDX-License-Identifier: Apache-2.0

//! End-to-end runs of the fault simulation flow over the sample netlists.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use fsim::fault::{enumerate_multi_faults, enumerate_single_faults, FaultSet};
use fsim::fault_analysis::{analyze, AnalysisOptions, FaultOutcome};
use fsim::io::load_netlist_from_path;
use fsim::metrics::{fault_coverage, fault_efficiency, FaultMetrics, MetricsError};
use fsim::netlist::Netlist;
use fsim::pattern::pattern_to_string;
use fsim::sim::simulate;
use maplit::hashmap;
use pretty_assertions::assert_eq;

fn data_path(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("data")
        .join(name)
}

fn load(name: &str) -> Netlist {
    let _ = env_logger::builder().is_test(true).try_init();
    load_netlist_from_path(&data_path(name)).unwrap()
}

fn first_detections(netlist: &Netlist, options: &AnalysisOptions) -> HashMap<String, String> {
    let faults = enumerate_single_faults(netlist);
    let analysis = analyze(netlist, &faults, options).unwrap();
    analysis
        .iter()
        .filter_map(|(fault, outcome)| match outcome {
            FaultOutcome::Detected { pattern } => Some((
                fault.display(netlist).to_string(),
                pattern_to_string(pattern, analysis.input_count()),
            )),
            FaultOutcome::Undetectable => None,
        })
        .collect()
}

#[test]
fn test_c17_coverage_with_masked_input_stem() {
    let netlist = load("c17.bench");
    let faults = enumerate_single_faults(&netlist);
    assert_eq!(faults.len(), 34);
    let analysis = analyze(&netlist, &faults, &AnalysisOptions::default()).unwrap();
    let undetectable: Vec<String> = analysis
        .undetectable()
        .into_iter()
        .map(|fault| fault.display(&netlist).to_string())
        .collect();
    assert_eq!(undetectable, vec!["3/SA1", "3/SA0"]);
    let metrics = FaultMetrics::from_analysis(&analysis).unwrap();
    assert_eq!(metrics.detected, 32);
    assert_eq!(metrics.undetectable, 2);
    assert!((metrics.coverage_percent - 94.11764705882354).abs() < 1e-9);
    assert_eq!(metrics.efficiency_percent, Some(100.0));
}

#[test]
fn test_c17_first_detecting_patterns_of_fanout_branches() {
    let netlist = load("c17.bench");
    let detections = first_detections(&netlist, &AnalysisOptions::default());
    let expected: HashMap<&str, &str> = hashmap! {
        "3_1/SA1" => "10000",
        "3_1/SA0" => "10100",
        "3_2/SA1" => "00011",
        "3_2/SA0" => "00111",
        "11_1/SA1" => "01110",
        "11_1/SA0" => "01000",
        "11_2/SA1" => "00111",
        "11_2/SA0" => "00001",
        "16_1/SA1" => "01000",
        "16_1/SA0" => "00000",
        "16_2/SA1" => "01000",
        "16_2/SA0" => "00000",
    };
    for (fault, pattern) in expected {
        assert_eq!(detections.get(fault).map(String::as_str), Some(pattern), "{}", fault);
    }
}

#[test]
fn test_detecting_pattern_really_distinguishes_the_fault() {
    let netlist = load("c17.bench");
    let faults = enumerate_single_faults(&netlist);
    let analysis = analyze(&netlist, &faults, &AnalysisOptions::default()).unwrap();
    for (fault, outcome) in analysis.iter() {
        let FaultOutcome::Detected { pattern } = outcome else {
            continue;
        };
        let bits = pattern_to_string(pattern, netlist.primary_inputs().len());
        let good = simulate(&netlist, &bits, &FaultSet::none()).unwrap();
        let bad = simulate(&netlist, &bits, fault).unwrap();
        assert_ne!(good, bad, "{} at {}", fault.display(&netlist), bits);
    }
}

#[test]
fn test_redundant_circuit_has_undetectable_faults() {
    let netlist = load("redundant.bench");
    let options = AnalysisOptions::default();
    let faults = enumerate_single_faults(&netlist);
    let analysis = analyze(&netlist, &faults, &options).unwrap();
    let undetectable: Vec<String> = analysis
        .undetectable()
        .into_iter()
        .map(|fault| fault.display(&netlist).to_string())
        .collect();
    assert_eq!(
        undetectable,
        vec!["a/SA1", "a/SA0", "b/SA1", "b/SA0", "g1/SA0", "a_1/SA0"]
    );

    let metrics = FaultMetrics::from_analysis(&analysis).unwrap();
    assert_eq!(metrics.total_faults, 12);
    assert_eq!(metrics.detected, 6);
    assert!((metrics.coverage_percent - 50.0).abs() < 1e-9);
    assert_eq!(metrics.efficiency_percent, Some(100.0));

    let detections = first_detections(&netlist, &options);
    assert_eq!(
        detections,
        hashmap! {
            "g1/SA1".to_string() => "00".to_string(),
            "g2/SA1".to_string() => "00".to_string(),
            "g2/SA0".to_string() => "10".to_string(),
            "a_1/SA1".to_string() => "01".to_string(),
            "a_2/SA1".to_string() => "00".to_string(),
            "a_2/SA0".to_string() => "10".to_string(),
        }
    );
}

#[test]
fn test_thread_count_does_not_change_results() {
    let netlist = load("c17.bench");
    let sequential = first_detections(&netlist, &AnalysisOptions::default());
    let parallel = first_detections(
        &netlist,
        &AnalysisOptions {
            threads: 3,
            ..AnalysisOptions::default()
        },
    );
    assert_eq!(sequential, parallel);
}

#[test]
fn test_multi_fault_analysis() {
    let netlist = load("redundant.bench");
    let singles = enumerate_single_faults(&netlist);
    let pairs = enumerate_multi_faults(&singles, 2, Some(2));
    // 6 signals, 2 polarities each: C(12, 2) minus the 6 same-signal pairs.
    assert_eq!(pairs.len(), 66 - 6);
    let analysis = analyze(&netlist, &pairs, &AnalysisOptions::default()).unwrap();
    assert_eq!(
        analysis.detected_count() + analysis.undetectable_count(),
        pairs.len()
    );
    // Both redundant faults together still leave the output intact.
    let b = netlist.signal_id("b").unwrap();
    let g1 = netlist.signal_id("g1").unwrap();
    let both = FaultSet::single(b, true)
        .try_merge(&FaultSet::single(g1, false))
        .unwrap();
    let outcome = analysis
        .iter()
        .find(|(fault, _)| **fault == both)
        .map(|(_, outcome)| outcome);
    assert_eq!(outcome, Some(FaultOutcome::Undetectable));
}

#[test]
fn test_metric_edge_cases() {
    assert_eq!(fault_coverage(0, 0), Err(MetricsError::EmptyFaultList));
    assert_eq!(
        fault_efficiency(0, 3, 3),
        Err(MetricsError::NoDetectableFaults)
    );
    let coverage = fault_coverage(7, 10).unwrap();
    let efficiency = fault_efficiency(7, 2, 10).unwrap();
    assert!(efficiency >= coverage);
}

//! Integration tests for abstat
//!
//! These tests exercise the end-to-end behavior of the analysis pipeline:
//! construction, plain deltas, subgroup analysis, trends, and assembly.

use std::collections::BTreeMap;

use abstat::{
    BinLabel, Column, DataFrame, DeltaKey, DeltaWorker, DerivedKpi, Experiment, ExperimentError,
    FeatureCheckOptions, FixedHorizon, SgaOptions, Statistic, TrendOptions, Weights, WorkerConfig,
    to_json,
};

fn strings(vals: &[&str]) -> Vec<String> {
    vals.iter().map(|s| s.to_string()).collect()
}

/// The two-variant conversion scenario: A (control) converts half the time,
/// B three times out of four.
fn conversion_frame() -> DataFrame {
    DataFrame::from_columns([
        (
            "entity".to_string(),
            Column::Text(strings(&["e1", "e2", "e3", "e4", "e5", "e6", "e7", "e8"])),
        ),
        (
            "variant".to_string(),
            Column::Text(strings(&["A", "A", "A", "A", "B", "B", "B", "B"])),
        ),
        (
            "conversion".to_string(),
            Column::Numeric(vec![0.0, 1.0, 1.0, 0.0, 1.0, 1.0, 1.0, 0.0]),
        ),
    ])
    .unwrap()
}

/// A larger frame with a bindable feature column and a time column.
fn rich_frame() -> DataFrame {
    let n = 120usize;
    let mut entity = Vec::new();
    let mut variant = Vec::new();
    let mut orders = Vec::new();
    let mut depth = Vec::new();
    let mut time = Vec::new();

    for i in 0..n {
        entity.push(format!("e{}", i));
        let arm = match i % 3 {
            0 => "A",
            1 => "B",
            _ => "C",
        };
        variant.push(arm.to_string());
        // B runs a little hotter than A, C a little colder
        let base = match arm {
            "A" => 10.0,
            "B" => 12.0,
            _ => 9.0,
        };
        orders.push(base + (i % 5) as f64 * 0.1);
        depth.push((i % 8) as f64);
        time.push((i % 4 + 1) as f64);
    }

    DataFrame::from_columns([
        ("entity".to_string(), Column::Text(entity)),
        ("variant".to_string(), Column::Text(variant)),
        ("orders".to_string(), Column::Numeric(orders)),
        ("depth".to_string(), Column::Numeric(depth)),
        ("time_since_treatment".to_string(), Column::Numeric(time)),
    ])
    .unwrap()
}

fn rich_experiment() -> Experiment {
    Experiment::new(
        "A",
        rich_frame(),
        BTreeMap::new(),
        Some(strings(&["orders"])),
        vec![],
    )
    .unwrap()
}

fn loose_worker() -> WorkerConfig {
    WorkerConfig {
        min_observations: 1,
        ..Default::default()
    }
}

/// An empty frame that still carries the required columns.
fn empty_frame(with_time: bool) -> DataFrame {
    let mut columns = vec![
        ("entity".to_string(), Column::Text(vec![])),
        ("variant".to_string(), Column::Text(vec![])),
        ("orders".to_string(), Column::Numeric(vec![])),
    ];
    if with_time {
        columns.push(("time_since_treatment".to_string(), Column::Numeric(vec![])));
    }
    DataFrame::from_columns(columns).unwrap()
}

#[test]
fn test_missing_column_is_fatal_and_atomic() {
    let result = Experiment::new(
        "A",
        conversion_frame(),
        BTreeMap::new(),
        Some(strings(&["conversion", "sessions"])),
        vec![],
    );
    // no partially constructed experiment exists; the error names the column
    match result {
        Err(ExperimentError::MissingColumn(c)) => assert_eq!(c, "sessions"),
        other => panic!("expected a missing-column error, got {:?}", other.err()),
    }
}

#[test]
fn test_conversion_scenario_delta() {
    let exp = Experiment::new(
        "A",
        conversion_frame(),
        BTreeMap::new(),
        Some(strings(&["conversion"])),
        vec![],
    )
    .unwrap();

    let result = exp.delta("fixed_horizon", &loose_worker()).unwrap();

    // B improves conversion by 0.25 and the interval brackets the estimate
    let b = result.get("conversion", "B").unwrap();
    assert!((b.statistics.estimate - 0.25).abs() < 1e-12);
    let (lo, hi) = b.statistics.interval().unwrap();
    assert!(lo <= b.statistics.estimate && b.statistics.estimate <= hi);

    // the control against itself centers at zero
    let a = result.get("conversion", "A").unwrap();
    assert!((a.statistics.estimate - 0.0).abs() < f64::EPSILON);
    let (lo, hi) = a.statistics.interval().unwrap();
    assert!(lo <= 0.0 && 0.0 <= hi);
}

#[test]
fn test_delta_table_is_canonical_long_format() {
    let exp = Experiment::new(
        "A",
        conversion_frame(),
        BTreeMap::new(),
        Some(strings(&["conversion"])),
        vec![],
    )
    .unwrap();

    let table = exp.delta("fixed_horizon", &loose_worker()).unwrap().to_table();
    assert_eq!(table.bin_level(), "bin");

    let uplift = table
        .get(&DeltaKey::unbinned("B", "conversion", Statistic::Uplift))
        .unwrap();
    assert!((uplift - 0.25).abs() < 1e-12);
    let lo = table
        .get(&DeltaKey::unbinned("B", "conversion", Statistic::UpliftPctile).at_percentile(2.5))
        .unwrap();
    let hi = table
        .get(&DeltaKey::unbinned("B", "conversion", Statistic::UpliftPctile).at_percentile(97.5))
        .unwrap();
    assert!(lo < uplift && uplift < hi);
}

#[test]
fn test_weighted_delta_equals_unweighted_without_reference() {
    // conversion has no reference KPI, so weighting is a no-op
    let exp = Experiment::new(
        "A",
        conversion_frame(),
        BTreeMap::new(),
        Some(strings(&["conversion"])),
        vec![],
    )
    .unwrap();

    assert_eq!(exp.weights("conversion", "B").unwrap(), Weights::Unit);

    let direct = FixedHorizon::new(loose_worker());
    let unweighted = direct.compare(
        &exp.kpi_values("conversion", "B").unwrap(),
        &exp.kpi_values("conversion", "A").unwrap(),
    );
    let through_delta = exp.delta("fixed_horizon", &loose_worker()).unwrap();
    let weighted = &through_delta.get("conversion", "B").unwrap().statistics;

    assert_eq!(weighted.estimate, unweighted.estimate);
    assert_eq!(weighted.sample_size_x, unweighted.sample_size_x);
}

#[test]
fn test_derived_ratio_kpi_round_trip() {
    let mut frame = conversion_frame();
    frame
        .insert_column(
            "revenue",
            Column::Numeric(vec![0.0, 8.0, 6.0, 0.0, 9.0, 12.0, 6.0, 0.0]),
        )
        .unwrap();

    let exp = Experiment::new(
        "A",
        frame,
        BTreeMap::new(),
        Some(strings(&["rpc"])),
        vec![DerivedKpi::new("rpc", "revenue/conversion")],
    )
    .unwrap();

    let stored = exp
        .frame()
        .column("rpc")
        .and_then(Column::as_numeric)
        .unwrap();
    let revenue = exp
        .frame()
        .column("revenue")
        .and_then(Column::as_numeric)
        .unwrap();
    let conversion = exp
        .frame()
        .column("conversion")
        .and_then(Column::as_numeric)
        .unwrap();
    for i in 0..stored.len() {
        let expected = revenue[i] / conversion[i];
        if expected.is_nan() {
            assert!(stored[i].is_nan());
        } else {
            assert!((stored[i] - expected).abs() < 1e-12);
        }
    }
    assert_eq!(exp.reference_kpi("rpc"), Some("revenue"));
}

#[test]
fn test_sga_never_reports_the_control() {
    let exp = rich_experiment();
    let options = SgaOptions {
        features: Some(strings(&["depth"])),
        worker: loose_worker(),
        ..Default::default()
    };
    let analysis = exp.sga(&options).unwrap();

    assert!(!analysis.table.is_empty());
    let variants = analysis.table.variants();
    assert!(!variants.contains(&"A"));
    assert!(variants.contains(&"B"));
    assert!(variants.contains(&"C"));
    assert_eq!(analysis.table.bin_level(), "subgroup");

    // the applied binning is returned for boundary reporting
    assert_eq!(analysis.binnings.len(), 1);
    assert_eq!(analysis.binnings[0].0, "depth");
}

#[test]
fn test_sga_keys_carry_the_feature_name() {
    let exp = rich_experiment();
    let options = SgaOptions {
        features: Some(strings(&["depth"])),
        n_bins: 2,
        worker: loose_worker(),
        ..Default::default()
    };
    let analysis = exp.sga(&options).unwrap();

    for (key, _) in analysis.table.iter() {
        assert_eq!(key.subgroup_metric, "depth");
        assert_eq!(key.metric, "orders");
        assert_eq!(key.subgroup, "-");
        assert!(key.bin.is_numeric());
    }
}

#[test]
fn test_sga_on_empty_data_warns_and_returns_empty() {
    let exp = Experiment::new("A", empty_frame(false), BTreeMap::new(), None, vec![]).unwrap();
    let analysis = exp.sga(&SgaOptions::default()).unwrap();

    assert!(analysis.table.is_empty());
    assert!(analysis.warnings.get("sga").is_some());
}

#[test]
fn test_trend_cumulative_sample_sizes_are_monotone() {
    let exp = rich_experiment();
    let analysis = exp
        .trend(&TrendOptions {
            cumulative: true,
            worker: loose_worker(),
            ..Default::default()
        })
        .unwrap();

    assert_eq!(analysis.table.bin_level(), "time");
    assert!(analysis.binning.is_some());

    let total_b = rich_frame()
        .column("variant")
        .and_then(Column::as_text)
        .unwrap()
        .iter()
        .filter(|v| *v == "B")
        .count() as f64;

    let mut previous = 0.0;
    let bins: Vec<BinLabel> = analysis.table.bins().into_iter().cloned().collect();
    assert_eq!(bins.len(), 4);
    for bin in &bins {
        let size = analysis
            .table
            .get(&DeltaKey::binned(
                "B",
                bin.clone(),
                "orders",
                "-",
                Statistic::SampleSize,
            ))
            .unwrap();
        assert!(size >= previous);
        previous = size;
    }
    // the last (latest) bin covers the variant's whole sample
    assert_eq!(previous, total_b);
}

#[test]
fn test_trend_non_cumulative_uses_exact_time_slices() {
    let exp = rich_experiment();
    let analysis = exp
        .trend(&TrendOptions {
            cumulative: false,
            worker: loose_worker(),
            ..Default::default()
        })
        .unwrap();

    let bins: Vec<BinLabel> = analysis.table.bins().into_iter().cloned().collect();
    let sizes: Vec<f64> = bins
        .iter()
        .map(|bin| {
            analysis
                .table
                .get(&DeltaKey::binned(
                    "B",
                    bin.clone(),
                    "orders",
                    "-",
                    Statistic::SampleSize,
                ))
                .unwrap()
        })
        .collect();
    // 40 B rows spread evenly over 4 time points
    assert_eq!(sizes, vec![10.0, 10.0, 10.0, 10.0]);
}

#[test]
fn test_trend_without_time_column_warns_and_returns_empty() {
    let exp = Experiment::new(
        "A",
        conversion_frame(),
        BTreeMap::new(),
        Some(strings(&["conversion"])),
        vec![],
    )
    .unwrap();

    let analysis = exp.trend(&TrendOptions::default()).unwrap();
    assert!(analysis.table.is_empty());
    assert!(analysis.binning.is_none());
    assert_eq!(
        analysis.warnings.get("trend"),
        Some("need time column for trend analysis, returning empty result")
    );
}

#[test]
fn test_trend_on_empty_data_warns_and_returns_empty() {
    let exp = Experiment::new("A", empty_frame(true), BTreeMap::new(), None, vec![]).unwrap();
    let analysis = exp.trend(&TrendOptions::default()).unwrap();

    assert!(analysis.table.is_empty());
    assert!(analysis.warnings.get("trend").is_some());
}

#[test]
fn test_group_sequential_through_delta() {
    let exp = rich_experiment();
    let result = exp.delta("group_sequential", &loose_worker()).unwrap();

    // the B arm carries a 2.0 shift over tight noise: stop
    let b = result.get("orders", "B").unwrap();
    assert_eq!(b.statistics.stop, Some(true));
    // self-comparison of the control never stops
    let a = result.get("orders", "A").unwrap();
    assert_eq!(a.statistics.stop, Some(false));
}

#[test]
fn test_feature_check_flags_imbalance() {
    let mut frame = rich_frame();
    // a categorical feature perfectly correlated with the C arm
    let variants = frame.column("variant").and_then(Column::as_text).unwrap();
    let platform: Vec<String> = variants
        .iter()
        .map(|v| {
            if v == "C" {
                "ios".to_string()
            } else {
                "android".to_string()
            }
        })
        .collect();
    frame
        .insert_column("platform", Column::Text(platform))
        .unwrap();

    let exp = Experiment::new(
        "A",
        frame,
        BTreeMap::new(),
        Some(strings(&["orders"])),
        vec![],
    )
    .unwrap();

    let analysis = exp
        .feature_check(&FeatureCheckOptions {
            features: Some(strings(&["platform"])),
            threshold: 0.05,
            worker: loose_worker(),
            ..Default::default()
        })
        .unwrap();

    let ok_c = analysis
        .table
        .get(&DeltaKey::unbinned("C", "platform", Statistic::Ok))
        .unwrap();
    assert_eq!(ok_c, 0.0);
    // the control against itself is trivially balanced
    let ok_a = analysis
        .table
        .get(&DeltaKey::unbinned("A", "platform", Statistic::Ok))
        .unwrap();
    assert_eq!(ok_a, 1.0);
}

#[test]
fn test_report_exports_to_json() {
    let exp = rich_experiment();
    let analysis = exp
        .sga(&SgaOptions {
            features: Some(strings(&["depth"])),
            worker: loose_worker(),
            ..Default::default()
        })
        .unwrap();

    let report = abstat::AnalysisReport::new(
        exp.control_variant(),
        exp.variants(),
        exp.metadata().clone(),
        analysis.table,
        analysis.warnings,
    );
    let json = to_json(&report).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();

    assert_eq!(value["meta"]["control_variant"], "A");
    assert_eq!(value["table"]["bin_level"], "subgroup");
    assert!(!value["table"]["rows"].as_array().unwrap().is_empty());
}

#[test]
fn test_bootstrap_delta_brackets_the_normal_estimate() {
    let exp = rich_experiment();
    let cfg = WorkerConfig {
        assume_normal: false,
        nruns: 2_000,
        min_observations: 1,
        ..Default::default()
    };
    let result = exp.delta("fixed_horizon", &cfg).unwrap();

    let b = &result.get("orders", "B").unwrap().statistics;
    let (lo, hi) = b.interval().unwrap();
    assert!(lo <= b.estimate && b.estimate <= hi);
    assert!((b.estimate - 2.0).abs() < 0.2);
}

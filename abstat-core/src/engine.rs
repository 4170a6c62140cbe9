//! The shared binned-delta engine.
//!
//! Everything subgroup analysis and trend analysis do lands here: assign each
//! row a bin label, walk the distinct bins in order, and within each bin's
//! row subset run the delta worker for every variant present against the
//! control subset. Bins of a numerical binning are walked in ascending
//! midpoint order and support cumulative "everything up to here" selection;
//! categorical bins keep discovery order and reject cumulative use.
//!
//! The engine deliberately compares every non-control variant found in a
//! subset, not just a nominal treatment variant: a slice holding variants
//! beyond the requested pair emits rows for all of them.

use abstat_binning::{BinLabel, Binning, CategoricalBinning, LabelFormat, NumericalBinning};
use abstat_report::{DeltaKey, DeltaTable, statistic_rows};
use abstat_stats::DeltaWorker;

use crate::experiment::ExperimentError;
use crate::frame::Column;

/// Three-column projection the engine operates on: variant labels, the
/// binning-source column, and the KPI values, row-aligned.
pub(crate) struct Projection<'a> {
    pub variant: &'a [String],
    pub feature: &'a Column,
    pub kpi: &'a [f64],
}

#[derive(Debug)]
pub(crate) struct EngineOutput {
    pub table: DeltaTable,
    pub binning: Binning,
}

#[allow(clippy::too_many_arguments)]
pub(crate) fn binned_deltas(
    projection: &Projection<'_>,
    control: &str,
    binning: Option<Binning>,
    n_bins: usize,
    cumulative: bool,
    format: LabelFormat,
    worker: &dyn DeltaWorker,
    metric: &str,
    subgroup_metric: &str,
    bin_level: &str,
) -> Result<EngineOutput, ExperimentError> {
    let binning = match binning {
        Some(b) => b,
        None => match projection.feature {
            Column::Numeric(values) => {
                Binning::Numerical(NumericalBinning::equal_frequency(values, n_bins)?)
            }
            Column::Text(values) => Binning::Categorical(CategoricalBinning::from_values(values)),
        },
    };

    if cumulative && !binning.is_numeric() {
        return Err(ExperimentError::CumulativeCategorical);
    }

    let labels: Vec<Option<BinLabel>> = match projection.feature {
        Column::Numeric(values) => binning.label_numeric(values, format)?,
        Column::Text(values) => binning.label_text(values)?,
    };

    // distinct bins: ascending for orderable labels, discovery order otherwise
    let mut bins: Vec<BinLabel> = Vec::new();
    for label in labels.iter().flatten() {
        if !bins.contains(label) {
            bins.push(label.clone());
        }
    }
    if binning.is_numeric() {
        bins.sort();
    }

    let mut buffer: Vec<(DeltaKey, f64)> = Vec::new();
    for bin in &bins {
        let mut selected: Vec<usize> = Vec::new();
        for (i, label) in labels.iter().enumerate() {
            if let Some(label) = label {
                let keep = if cumulative { label <= bin } else { label == bin };
                if keep {
                    selected.push(i);
                }
            }
        }

        let control_sample: Vec<f64> = selected
            .iter()
            .filter(|&&i| projection.variant[i] == control)
            .map(|&i| projection.kpi[i])
            .collect();

        let mut present: Vec<&str> = Vec::new();
        for &i in &selected {
            let v = projection.variant[i].as_str();
            if v != control && !present.contains(&v) {
                present.push(v);
            }
        }

        for variant in present {
            let treatment_sample: Vec<f64> = selected
                .iter()
                .filter(|&&i| projection.variant[i] == variant)
                .map(|&i| projection.kpi[i])
                .collect();
            let statistics = worker.compare(&treatment_sample, &control_sample);
            buffer.extend(statistic_rows(
                variant,
                bin,
                metric,
                subgroup_metric,
                &statistics,
            ));
        }
    }

    let mut table = DeltaTable::new(bin_level);
    table.extend(buffer);
    Ok(EngineOutput { table, binning })
}

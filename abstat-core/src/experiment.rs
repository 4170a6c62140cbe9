//! Experiment dataset and the plain delta analysis.

use std::collections::BTreeMap;

use abstat_binning::BinningError;
use abstat_logic::{Expr, FormulaError, parse_formula};
use abstat_report::{DeltaTable, Diagnostics, NO_LEVEL, statistic_rows};
use abstat_stats::{DeltaStatistics, StatsError, WorkerConfig, worker_for};
use fxhash::FxHashMap;
use thiserror::Error;

use crate::frame::{Column, DataFrame, FrameError};
use crate::weights::{self, Weights};

/// Entity-identifier column every dataset must carry.
pub const ENTITY_COLUMN: &str = "entity";
/// Variant-label column every dataset must carry.
pub const VARIANT_COLUMN: &str = "variant";
/// Time column required by trend analysis.
pub const TIME_COLUMN: &str = "time_since_treatment";

/// A KPI computed from other columns via a formula.
#[derive(Debug, Clone)]
pub struct DerivedKpi {
    /// Name of the new column
    pub name: String,
    /// Arithmetic formula over existing KPI names, e.g. `"revenue/orders"`
    pub formula: String,
}

impl DerivedKpi {
    /// Convenience constructor.
    pub fn new(name: &str, formula: &str) -> Self {
        Self {
            name: name.to_string(),
            formula: formula.to_string(),
        }
    }
}

/// Errors from experiment construction or analysis
#[derive(Debug, Error)]
pub enum ExperimentError {
    #[error("no column `{0}` provided")]
    MissingColumn(String),

    #[error("formula for derived KPI `{kpi}` is invalid: {source}")]
    Formula {
        kpi: String,
        #[source]
        source: FormulaError,
    },

    #[error("control variant `{0}` is not present in the data")]
    UnknownControlVariant(String),

    #[error("variant `{0}` is not present in the data")]
    UnknownVariant(String),

    #[error("`{0}` is not a reported KPI")]
    UnknownKpi(String),

    #[error("unknown feature column `{0}`")]
    UnknownFeature(String),

    #[error("cannot calculate cumulative deltas for non-numerical binnings")]
    CumulativeCategorical,

    #[error(transparent)]
    NotImplemented(#[from] StatsError),

    #[error(transparent)]
    Frame(#[from] FrameError),

    #[error(transparent)]
    Binning(#[from] BinningError),
}

/// A validated, immutable experiment dataset.
///
/// Construction checks every required column, evaluates derived KPIs in
/// declaration order, discovers the variants, and verifies the control
/// variant is among them (unless the dataset has no rows at all, in which
/// case every analysis returns an empty result with a warning). Afterwards
/// the data never changes; each analysis call builds a fresh result.
#[derive(Debug, Clone)]
pub struct Experiment {
    control_variant: String,
    frame: DataFrame,
    metadata: BTreeMap<String, String>,
    report_kpis: Vec<String>,
    derived_names: Vec<String>,
    reference_kpis: FxHashMap<String, String>,
    variants: Vec<String>,
}

fn push_unique(list: &mut Vec<String>, value: &str) {
    if !list.iter().any(|v| v == value) {
        list.push(value.to_string());
    }
}

impl Experiment {
    /// Build an experiment from a data snapshot.
    ///
    /// `report_kpis` defaults to every numeric column of the input.
    /// Derived KPIs are evaluated in declaration order, so later formulas may
    /// reference earlier derived columns. Validation happens before any
    /// column is added: a missing required column or an invalid formula
    /// leaves nothing half-built.
    pub fn new(
        control_variant: impl Into<String>,
        frame: DataFrame,
        metadata: BTreeMap<String, String>,
        report_kpis: Option<Vec<String>>,
        derived_kpis: Vec<DerivedKpi>,
    ) -> Result<Self, ExperimentError> {
        let control_variant = control_variant.into();
        let report_kpis = report_kpis.unwrap_or_else(|| frame.numeric_column_names());

        let mut parsed: Vec<(String, Expr)> = Vec::new();
        for dk in &derived_kpis {
            let expr = parse_formula(&dk.formula).map_err(|source| ExperimentError::Formula {
                kpi: dk.name.clone(),
                source,
            })?;
            parsed.push((dk.name.clone(), expr));
        }
        let derived_names: Vec<String> = parsed.iter().map(|(n, _)| n.clone()).collect();

        // required raw columns, in deterministic order: reported KPIs first,
        // then the experiment columns, then formula identifiers
        let mut required: Vec<String> = Vec::new();
        for kpi in &report_kpis {
            push_unique(&mut required, kpi);
        }
        push_unique(&mut required, ENTITY_COLUMN);
        push_unique(&mut required, VARIANT_COLUMN);
        for (_, expr) in &parsed {
            for ident in expr.identifiers() {
                push_unique(&mut required, &ident);
            }
        }
        required.retain(|c| !derived_names.contains(c));

        for column in &required {
            if !frame.contains(column) {
                return Err(ExperimentError::MissingColumn(column.clone()));
            }
        }

        let mut variants: Vec<String> = Vec::new();
        if let Some(labels) = frame.column(VARIANT_COLUMN).and_then(Column::as_text) {
            for v in labels {
                push_unique(&mut variants, v);
            }
        }
        if !variants.is_empty() && !variants.iter().any(|v| *v == control_variant) {
            return Err(ExperimentError::UnknownControlVariant(control_variant));
        }

        // evaluate derived KPIs against the snapshot
        let mut frame = frame;
        let mut reference_kpis = FxHashMap::default();
        for (name, expr) in &parsed {
            let mut inputs: FxHashMap<String, Vec<f64>> = FxHashMap::default();
            for ident in expr.identifiers() {
                let column = frame
                    .column(&ident)
                    .ok_or_else(|| ExperimentError::MissingColumn(ident.clone()))?;
                inputs.insert(ident.clone(), column.to_numeric(&ident)?);
            }
            let values = expr
                .eval(&inputs, frame.nrows())
                .map_err(|source| ExperimentError::Formula {
                    kpi: name.clone(),
                    source,
                })?;
            frame.set_column(name, Column::Numeric(values))?;
            if let Some(reference) = expr.reference_kpi() {
                reference_kpis.insert(name.clone(), reference.to_string());
            }
        }

        Ok(Self {
            control_variant,
            frame,
            metadata,
            report_kpis,
            derived_names,
            reference_kpis,
            variants,
        })
    }

    /// The control variant label.
    pub fn control_variant(&self) -> &str {
        &self.control_variant
    }

    /// Variants discovered in the data, in first-appearance order.
    pub fn variants(&self) -> &[String] {
        &self.variants
    }

    /// The KPIs this experiment reports on.
    pub fn report_kpis(&self) -> &[String] {
        &self.report_kpis
    }

    /// The reference KPI of a ratio-style derived KPI, if it has one.
    pub fn reference_kpi(&self, kpi: &str) -> Option<&str> {
        self.reference_kpis.get(kpi).map(String::as_str)
    }

    /// The validated data snapshot, including derived columns.
    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    /// Caller-supplied metadata.
    pub fn metadata(&self) -> &BTreeMap<String, String> {
        &self.metadata
    }

    pub(crate) fn variant_labels(&self) -> &[String] {
        match self.frame.column(VARIANT_COLUMN) {
            Some(Column::Text(labels)) => labels,
            _ => &[],
        }
    }

    /// KPI values restricted to one variant's rows.
    pub fn kpi_values(&self, kpi: &str, variant: &str) -> Result<Vec<f64>, ExperimentError> {
        let column = self
            .frame
            .column(kpi)
            .ok_or_else(|| ExperimentError::UnknownKpi(kpi.to_string()))?;
        let values = column.to_numeric(kpi)?;
        Ok(self
            .variant_labels()
            .iter()
            .zip(values)
            .filter(|(label, _)| *label == variant)
            .map(|(_, v)| v)
            .collect())
    }

    /// Per-row weights for a (KPI, variant) sample.
    ///
    /// Unit for KPIs without a reference KPI; otherwise the reference-share
    /// vector of the weights module, aligned to the variant's rows.
    pub fn weights(&self, kpi: &str, variant: &str) -> Result<Weights, ExperimentError> {
        match self.reference_kpis.get(kpi) {
            None => Ok(Weights::Unit),
            Some(reference) => {
                let x = self.kpi_values(reference, variant)?;
                Ok(Weights::PerRow(weights::per_row(&x)))
            }
        }
    }

    pub(crate) fn weighted_kpi(&self, kpi: &str, variant: &str) -> Result<Vec<f64>, ExperimentError> {
        let values = self.kpi_values(kpi, variant)?;
        Ok(self.weights(kpi, variant)?.apply(&values))
    }

    pub(crate) fn resolve_kpis(
        &self,
        requested: Option<&[String]>,
    ) -> Result<Vec<String>, ExperimentError> {
        match requested {
            None => Ok(self.report_kpis.clone()),
            Some(list) => {
                for kpi in list {
                    if !self.report_kpis.iter().any(|k| k == kpi) {
                        return Err(ExperimentError::UnknownKpi(kpi.clone()));
                    }
                }
                Ok(list.to_vec())
            }
        }
    }

    /// Feature columns available for subgroup analysis and feature checks:
    /// everything except the experiment columns, the time column, and the
    /// reported or derived KPIs.
    pub(crate) fn default_features(&self) -> Vec<String> {
        self.frame
            .column_names()
            .iter()
            .filter(|n| {
                let n = n.as_str();
                n != ENTITY_COLUMN
                    && n != VARIANT_COLUMN
                    && n != TIME_COLUMN
                    && !self.report_kpis.iter().any(|k| k == n)
                    && !self.derived_names.iter().any(|k| k == n)
            })
            .cloned()
            .collect()
    }

    /// Plain delta: compare every reported KPI for every variant (the control
    /// included, trivially against itself) using the named worker.
    ///
    /// Methods: `fixed_horizon`, `group_sequential`, `bayes_factor`,
    /// `bayes_precision`. An unknown name is a fatal error.
    pub fn delta(&self, method: &str, config: &WorkerConfig) -> Result<DeltaResult, ExperimentError> {
        let worker = worker_for(method, config)?;

        let mut comparisons = BTreeMap::new();
        for kpi in &self.report_kpis {
            let control_sample = self.weighted_kpi(kpi, &self.control_variant)?;
            for variant in &self.variants {
                let treatment_sample = self.weighted_kpi(kpi, variant)?;
                let statistics = worker.compare(&treatment_sample, &control_sample);
                comparisons.insert(
                    (kpi.clone(), variant.clone()),
                    VariantComparison {
                        control_variant: self.control_variant.clone(),
                        treatment_variant: variant.clone(),
                        statistics,
                    },
                );
            }
        }

        Ok(DeltaResult {
            comparisons,
            warnings: Diagnostics::default(),
        })
    }
}

/// One (KPI, variant) comparison from the plain delta analysis
#[derive(Debug, Clone)]
pub struct VariantComparison {
    /// Control variant the delta is measured against
    pub control_variant: String,
    /// Compared variant
    pub treatment_variant: String,
    /// Worker output
    pub statistics: DeltaStatistics,
}

/// Result of the plain delta analysis, keyed by (KPI, variant)
#[derive(Debug, Clone)]
pub struct DeltaResult {
    comparisons: BTreeMap<(String, String), VariantComparison>,
    /// Warnings recorded during the analysis
    pub warnings: Diagnostics,
}

impl DeltaResult {
    /// The comparison for a (KPI, variant) pair.
    pub fn get(&self, kpi: &str, variant: &str) -> Option<&VariantComparison> {
        self.comparisons
            .get(&(kpi.to_string(), variant.to_string()))
    }

    /// All comparisons in (KPI, variant) order.
    pub fn iter(&self) -> impl Iterator<Item = (&(String, String), &VariantComparison)> {
        self.comparisons.iter()
    }

    /// Number of comparisons.
    pub fn len(&self) -> usize {
        self.comparisons.len()
    }

    /// Whether any comparison was computed.
    pub fn is_empty(&self) -> bool {
        self.comparisons.is_empty()
    }

    /// Render the result in the canonical long format, interchangeable with
    /// subgroup and trend tables.
    pub fn to_table(&self) -> DeltaTable {
        let mut table = DeltaTable::new("bin");
        for ((kpi, variant), comparison) in &self.comparisons {
            table.extend(statistic_rows(
                variant,
                &abstat_binning::BinLabel::Unbinned,
                kpi,
                NO_LEVEL,
                &comparison.statistics,
            ));
        }
        table
    }
}

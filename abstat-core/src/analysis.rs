//! Subgroup, trend, and feature-check analyses.

use abstat_binning::{BinLabel, Binning, BinningError, LabelFormat, NumericalBinning};
use abstat_report::{DeltaKey, DeltaTable, Diagnostics, NO_LEVEL, Statistic, statistic_rows};
use abstat_stats::{DeltaWorker, FixedHorizon, WorkerConfig, chi_square};

use crate::engine::{Projection, binned_deltas};
use crate::experiment::{Experiment, ExperimentError, TIME_COLUMN};
use crate::frame::Column;

/// Default bin count for subgroup analysis
pub const DEFAULT_BINS: usize = 4;

/// Options for subgroup analysis
#[derive(Debug, Clone)]
pub struct SgaOptions {
    /// KPIs to analyze; defaults to every reported KPI
    pub kpis: Option<Vec<String>>,
    /// Feature columns to bin by; defaults to every non-KPI data column
    pub features: Option<Vec<String>>,
    /// Bin count when no binning is supplied
    pub n_bins: usize,
    /// Pre-built binning to apply instead of deriving one per feature
    pub binning: Option<Binning>,
    /// Worker configuration (fixed-horizon)
    pub worker: WorkerConfig,
}

impl Default for SgaOptions {
    fn default() -> Self {
        Self {
            kpis: None,
            features: None,
            n_bins: DEFAULT_BINS,
            binning: None,
            worker: WorkerConfig::default(),
        }
    }
}

/// Result of a subgroup analysis
#[derive(Debug, Clone)]
pub struct SgaAnalysis {
    /// Assembled table; the bin level is named `subgroup`
    pub table: DeltaTable,
    /// Binning applied per feature, for reporting bin boundaries
    pub binnings: Vec<(String, Binning)>,
    /// Warnings recorded during the analysis
    pub warnings: Diagnostics,
}

/// Options for trend analysis
#[derive(Debug, Clone)]
pub struct TrendOptions {
    /// KPIs to analyze; defaults to every reported KPI
    pub kpis: Option<Vec<String>>,
    /// Accumulate each time bin over everything before it
    pub cumulative: bool,
    /// Worker configuration (fixed-horizon)
    pub worker: WorkerConfig,
}

impl Default for TrendOptions {
    fn default() -> Self {
        Self {
            kpis: None,
            cumulative: true,
            worker: WorkerConfig::default(),
        }
    }
}

/// Result of a trend analysis
#[derive(Debug, Clone)]
pub struct TrendAnalysis {
    /// Assembled table; the bin level is named `time`
    pub table: DeltaTable,
    /// The time binning applied, absent when the analysis degenerated
    pub binning: Option<Binning>,
    /// Warnings recorded during the analysis
    pub warnings: Diagnostics,
}

/// Options for pre-treatment feature checks
#[derive(Debug, Clone)]
pub struct FeatureCheckOptions {
    /// Features to check; defaults to every non-KPI data column
    pub features: Option<Vec<String>>,
    /// Variants to check; defaults to all, the control included
    pub variants: Option<Vec<String>>,
    /// p-value threshold for categorical balance
    pub threshold: f64,
    /// Worker configuration (fixed-horizon)
    pub worker: WorkerConfig,
}

impl Default for FeatureCheckOptions {
    fn default() -> Self {
        Self {
            features: None,
            variants: None,
            threshold: 0.05,
            worker: WorkerConfig::default(),
        }
    }
}

/// Result of a feature check
#[derive(Debug, Clone)]
pub struct FeatureCheckAnalysis {
    /// Assembled table with per-(feature, variant) rows including `ok`
    pub table: DeltaTable,
    /// Warnings recorded during the analysis
    pub warnings: Diagnostics,
}

impl Experiment {
    /// Subgroup analysis: for every requested KPI and feature, bin the
    /// feature and compare each non-control variant against the control
    /// within each bin independently.
    ///
    /// An empty dataset is not an error: the result is an empty table with a
    /// warning recorded under `sga`.
    pub fn sga(&self, options: &SgaOptions) -> Result<SgaAnalysis, ExperimentError> {
        let mut warnings = Diagnostics::default();
        let mut table = DeltaTable::new("subgroup");

        if self.frame().is_empty() {
            warnings.warn("sga", "empty data set entered to analysis, returning empty result");
            return Ok(SgaAnalysis {
                table,
                binnings: Vec::new(),
                warnings,
            });
        }

        let kpis = self.resolve_kpis(options.kpis.as_deref())?;
        let features = self.resolve_features(options.features.as_deref())?;
        let worker = FixedHorizon::new(options.worker.clone());

        let mut binnings: Vec<(String, Binning)> = Vec::new();
        for kpi in &kpis {
            let kpi_values = self.column_as_numeric(kpi)?;
            for feature in &features {
                let feature_column = self
                    .frame()
                    .column(feature)
                    .ok_or_else(|| ExperimentError::UnknownFeature(feature.clone()))?;
                let projection = Projection {
                    variant: self.variant_labels(),
                    feature: feature_column,
                    kpi: &kpi_values,
                };
                let out = binned_deltas(
                    &projection,
                    self.control_variant(),
                    options.binning.clone(),
                    options.n_bins,
                    false,
                    LabelFormat::Standard,
                    &worker,
                    kpi,
                    feature,
                    "subgroup",
                )?;
                table.merge(out.table);
                if !binnings.iter().any(|(f, _)| f == feature) {
                    binnings.push((feature.clone(), out.binning));
                }
            }
        }

        Ok(SgaAnalysis {
            table,
            binnings,
            warnings,
        })
    }

    /// Trend analysis: one bin per distinct `time_since_treatment` value,
    /// cumulative by default, comparing each non-control variant against the
    /// control per time bin.
    ///
    /// A missing time column or an empty dataset is not an error: the result
    /// is an empty table with a warning recorded under `trend`.
    pub fn trend(&self, options: &TrendOptions) -> Result<TrendAnalysis, ExperimentError> {
        let mut warnings = Diagnostics::default();
        let empty = |warnings: Diagnostics| TrendAnalysis {
            table: DeltaTable::new("time"),
            binning: None,
            warnings,
        };

        if self.frame().is_empty() {
            warnings.warn("trend", "empty data set entered to analysis, returning empty result");
            return Ok(empty(warnings));
        }
        if !self.frame().contains(TIME_COLUMN) {
            warnings.warn("trend", "need time column for trend analysis, returning empty result");
            return Ok(empty(warnings));
        }

        let time = self.column_as_numeric(TIME_COLUMN)?;
        let binning = match NumericalBinning::closed_points(&time) {
            Ok(b) => b,
            Err(BinningError::EmptyData) => {
                warnings.warn("trend", "time column holds no observations, returning empty result");
                return Ok(empty(warnings));
            }
            Err(e) => return Err(e.into()),
        };

        let kpis = self.resolve_kpis(options.kpis.as_deref())?;
        let worker = FixedHorizon::new(options.worker.clone());
        let time_column = Column::Numeric(time);

        let mut table = DeltaTable::new("time");
        let mut applied = None;
        for kpi in &kpis {
            let kpi_values = self.column_as_numeric(kpi)?;
            let projection = Projection {
                variant: self.variant_labels(),
                feature: &time_column,
                kpi: &kpi_values,
            };
            let out = binned_deltas(
                &projection,
                self.control_variant(),
                Some(Binning::Numerical(binning.clone())),
                DEFAULT_BINS,
                options.cumulative,
                LabelFormat::Mid,
                &worker,
                kpi,
                NO_LEVEL,
                "time",
            )?;
            table.merge(out.table);
            applied = Some(out.binning);
        }

        Ok(TrendAnalysis {
            table,
            binning: applied,
            warnings,
        })
    }

    /// Pre-treatment feature check: are the variants balanced on each raw
    /// feature? Numeric features run the delta worker against the control
    /// (`ok` when the interval brackets 0); categorical features run the
    /// chi-square homogeneity test (`ok` when p exceeds the threshold).
    pub fn feature_check(
        &self,
        options: &FeatureCheckOptions,
    ) -> Result<FeatureCheckAnalysis, ExperimentError> {
        let mut warnings = Diagnostics::default();
        let mut table = DeltaTable::new("bin");

        if self.frame().is_empty() {
            warnings.warn(
                "feature_check",
                "empty data set entered to analysis, returning empty result",
            );
            return Ok(FeatureCheckAnalysis { table, warnings });
        }

        let features = self.resolve_features(options.features.as_deref())?;
        let variants: Vec<String> = match &options.variants {
            None => self.variants().to_vec(),
            Some(list) => {
                for v in list {
                    if !self.variants().iter().any(|known| known == v) {
                        return Err(ExperimentError::UnknownVariant(v.clone()));
                    }
                }
                list.clone()
            }
        };
        let worker = FixedHorizon::new(options.worker.clone());

        for feature in &features {
            let column = self
                .frame()
                .column(feature)
                .ok_or_else(|| ExperimentError::UnknownFeature(feature.clone()))?;
            match column {
                Column::Numeric(values) => {
                    let baseline = self.select_rows(values, self.control_variant());
                    for variant in &variants {
                        let sample = self.select_rows(values, variant);
                        let statistics = worker.compare(&sample, &baseline);
                        let ok = match statistics.interval() {
                            Some((lo, hi)) if lo.is_finite() && hi.is_finite() => {
                                if lo <= 0.0 && 0.0 <= hi {
                                    1.0
                                } else {
                                    0.0
                                }
                            }
                            _ => f64::NAN,
                        };
                        table.extend(statistic_rows(
                            variant,
                            &BinLabel::Unbinned,
                            feature,
                            NO_LEVEL,
                            &statistics,
                        ));
                        table.insert(DeltaKey::unbinned(variant, feature, Statistic::Ok), ok);
                    }
                }
                Column::Text(values) => {
                    let baseline = self.select_text_rows(values, self.control_variant());
                    for variant in &variants {
                        let sample = self.select_text_rows(values, variant);
                        let result = chi_square(&sample, &baseline);
                        let ok = if result.p_value.is_nan() {
                            f64::NAN
                        } else if result.p_value > options.threshold {
                            1.0
                        } else {
                            0.0
                        };
                        table.insert(
                            DeltaKey::unbinned(variant, feature, Statistic::ChiSquareP),
                            result.p_value,
                        );
                        table.insert(
                            DeltaKey::unbinned(variant, feature, Statistic::SampleSize),
                            sample.len() as f64,
                        );
                        table.insert(DeltaKey::unbinned(variant, feature, Statistic::Ok), ok);
                    }
                }
            }
        }

        Ok(FeatureCheckAnalysis { table, warnings })
    }

    fn resolve_features(
        &self,
        requested: Option<&[String]>,
    ) -> Result<Vec<String>, ExperimentError> {
        match requested {
            None => Ok(self.default_features()),
            Some(list) => {
                for feature in list {
                    if !self.frame().contains(feature) {
                        return Err(ExperimentError::UnknownFeature(feature.clone()));
                    }
                }
                Ok(list.to_vec())
            }
        }
    }

    fn column_as_numeric(&self, name: &str) -> Result<Vec<f64>, ExperimentError> {
        self.frame()
            .column(name)
            .ok_or_else(|| ExperimentError::UnknownKpi(name.to_string()))?
            .to_numeric(name)
            .map_err(Into::into)
    }

    fn select_rows(&self, values: &[f64], variant: &str) -> Vec<f64> {
        self.variant_labels()
            .iter()
            .zip(values)
            .filter(|(label, _)| *label == variant)
            .map(|(_, &v)| v)
            .collect()
    }

    fn select_text_rows(&self, values: &[String], variant: &str) -> Vec<String> {
        self.variant_labels()
            .iter()
            .zip(values)
            .filter(|(label, _)| *label == variant)
            .map(|(_, v)| v.clone())
            .collect()
    }
}

//! The canonical composite key.

use abstat_binning::BinLabel;
use serde::Serialize;
use std::cmp::Ordering;

/// Placeholder for an unused key level.
pub const NO_LEVEL: &str = "-";

/// Which statistic a row carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Statistic {
    /// Point estimate of the delta (treatment minus control)
    Uplift,
    /// Confidence bound at the row's percentile
    UpliftPctile,
    /// Treatment-side sample size
    SampleSize,
    /// Treatment-side mean
    VariantMean,
    /// Early-stopping decision (1.0 = stop)
    Stop,
    /// Chi-square p-value (categorical feature checks)
    ChiSquareP,
    /// Feature-check verdict (1.0 = balanced)
    Ok,
}

impl std::fmt::Display for Statistic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Statistic::Uplift => "uplift",
            Statistic::UpliftPctile => "uplift_pctile",
            Statistic::SampleSize => "sample_size",
            Statistic::VariantMean => "variant_mean",
            Statistic::Stop => "stop",
            Statistic::ChiSquareP => "chi_square_p",
            Statistic::Ok => "ok",
        };
        write!(f, "{}", name)
    }
}

/// The 7-part key addressing one value in a delta table.
///
/// Level order is fixed: variant, bin, metric, subgroup_metric, subgroup,
/// statistic, percentile. `subgroup_metric` names the column that produced
/// the binning (`-` when unbinned); `subgroup` is reserved for a second-level
/// breakdown and currently always `-`; `percentile` is set only for
/// `uplift_pctile` rows.
#[derive(Debug, Clone, Serialize)]
pub struct DeltaKey {
    /// Compared (treatment) variant
    pub variant: String,
    /// Bin label (`-` when unbinned)
    pub bin: BinLabel,
    /// KPI or feature column the row describes
    pub metric: String,
    /// Column that produced the binning, or `-`
    pub subgroup_metric: String,
    /// Reserved second-level breakdown, always `-`
    pub subgroup: String,
    /// Statistic carried by the row
    pub statistic: Statistic,
    /// Percentile for confidence-bound rows
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percentile: Option<f64>,
}

impl DeltaKey {
    /// Key for an unbinned row (plain delta, feature check).
    pub fn unbinned(variant: &str, metric: &str, statistic: Statistic) -> Self {
        Self {
            variant: variant.to_string(),
            bin: BinLabel::Unbinned,
            metric: metric.to_string(),
            subgroup_metric: NO_LEVEL.to_string(),
            subgroup: NO_LEVEL.to_string(),
            statistic,
            percentile: None,
        }
    }

    /// Key for a binned row.
    pub fn binned(
        variant: &str,
        bin: BinLabel,
        metric: &str,
        subgroup_metric: &str,
        statistic: Statistic,
    ) -> Self {
        Self {
            variant: variant.to_string(),
            bin,
            metric: metric.to_string(),
            subgroup_metric: subgroup_metric.to_string(),
            subgroup: NO_LEVEL.to_string(),
            statistic,
            percentile: None,
        }
    }

    /// The same key at a given percentile.
    pub fn at_percentile(mut self, percentile: f64) -> Self {
        self.percentile = Some(percentile);
        self
    }
}

impl PartialEq for DeltaKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for DeltaKey {}

impl PartialOrd for DeltaKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DeltaKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.variant
            .cmp(&other.variant)
            .then_with(|| self.bin.cmp(&other.bin))
            .then_with(|| self.metric.cmp(&other.metric))
            .then_with(|| self.subgroup_metric.cmp(&other.subgroup_metric))
            .then_with(|| self.subgroup.cmp(&other.subgroup))
            .then_with(|| self.statistic.cmp(&other.statistic))
            .then_with(|| cmp_percentile(self.percentile, other.percentile))
    }
}

fn cmp_percentile(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(x), Some(y)) => x.total_cmp(&y),
    }
}

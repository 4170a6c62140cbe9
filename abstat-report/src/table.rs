//! Long-format delta tables.

use std::collections::BTreeMap;

use abstat_binning::BinLabel;
use abstat_stats::DeltaStatistics;
use serde::ser::{SerializeStruct, Serializer};
use serde::Serialize;

use crate::key::{DeltaKey, Statistic};

/// A long-format table of delta results keyed by the canonical 7-part key.
///
/// Keys are unique: inserting a key that already exists overwrites the old
/// value, which is also what de-duplicates overlapping engine passes.
/// Iteration is always in sorted key order.
#[derive(Debug, Clone, Default)]
pub struct DeltaTable {
    bin_level: String,
    rows: BTreeMap<DeltaKey, f64>,
}

impl DeltaTable {
    /// New empty table whose bin level carries the given name
    /// (`bin`, `subgroup` or `time`).
    pub fn new(bin_level: &str) -> Self {
        Self {
            bin_level: bin_level.to_string(),
            rows: BTreeMap::new(),
        }
    }

    /// What the bin component of the key means for this table.
    pub fn bin_level(&self) -> &str {
        &self.bin_level
    }

    /// Insert one row; an existing key is overwritten.
    pub fn insert(&mut self, key: DeltaKey, value: f64) {
        self.rows.insert(key, value);
    }

    /// Insert many rows.
    pub fn extend(&mut self, rows: impl IntoIterator<Item = (DeltaKey, f64)>) {
        for (key, value) in rows {
            self.insert(key, value);
        }
    }

    /// Absorb another table's rows.
    pub fn merge(&mut self, other: DeltaTable) {
        self.rows.extend(other.rows);
    }

    /// Value at a key.
    pub fn get(&self, key: &DeltaKey) -> Option<f64> {
        self.rows.get(key).copied()
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows in sorted key order.
    pub fn iter(&self) -> impl Iterator<Item = (&DeltaKey, f64)> {
        self.rows.iter().map(|(k, &v)| (k, v))
    }

    /// Distinct compared variants, in key order.
    pub fn variants(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for key in self.rows.keys() {
            if out.last() != Some(&key.variant.as_str()) && !out.contains(&key.variant.as_str()) {
                out.push(&key.variant);
            }
        }
        out
    }

    /// Distinct bin labels, in label order.
    pub fn bins(&self) -> Vec<&BinLabel> {
        let mut out: Vec<&BinLabel> = Vec::new();
        for key in self.rows.keys() {
            if !out.contains(&&key.bin) {
                out.push(&key.bin);
            }
        }
        out.sort();
        out
    }
}

impl Serialize for DeltaTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Row<'a> {
            #[serde(flatten)]
            key: &'a DeltaKey,
            value: f64,
        }

        let rows: Vec<Row<'_>> = self
            .rows
            .iter()
            .map(|(key, &value)| Row { key, value })
            .collect();

        let mut st = serializer.serialize_struct("DeltaTable", 2)?;
        st.serialize_field("bin_level", &self.bin_level)?;
        st.serialize_field("rows", &rows)?;
        st.end()
    }
}

/// Expand one worker comparison into table rows.
///
/// Emits `uplift`, one `uplift_pctile` per confidence bound, `sample_size`,
/// `variant_mean`, and `stop` when the worker made a stopping decision.
/// Control-side sample size and mean stay on the `DeltaStatistics` value and
/// are not table rows; the control never appears as a compared variant.
pub fn statistic_rows(
    variant: &str,
    bin: &BinLabel,
    metric: &str,
    subgroup_metric: &str,
    statistics: &DeltaStatistics,
) -> Vec<(DeltaKey, f64)> {
    let key = |statistic| DeltaKey::binned(variant, bin.clone(), metric, subgroup_metric, statistic);

    let mut rows = vec![
        (key(Statistic::Uplift), statistics.estimate),
        (
            key(Statistic::SampleSize),
            statistics.sample_size_x as f64,
        ),
        (key(Statistic::VariantMean), statistics.mean_x),
    ];
    for bound in &statistics.confidence_interval {
        rows.push((
            key(Statistic::UpliftPctile).at_percentile(bound.percentile),
            bound.value,
        ));
    }
    if let Some(stop) = statistics.stop {
        rows.push((key(Statistic::Stop), if stop { 1.0 } else { 0.0 }));
    }
    rows
}

//! Categorical binning.

use crate::BinLabel;

/// Unordered bins over a text column: one bin per distinct category.
#[derive(Debug, Clone)]
pub struct CategoricalBinning {
    categories: Vec<String>,
}

impl CategoricalBinning {
    /// Build from the distinct values of a column, in first-appearance order.
    pub fn from_values(values: &[String]) -> Self {
        let mut categories: Vec<String> = Vec::new();
        for v in values {
            if !categories.iter().any(|c| c == v) {
                categories.push(v.clone());
            }
        }
        Self { categories }
    }

    /// The known categories, in first-appearance order.
    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    /// Label every value; values outside the known categories map to `None`.
    pub fn label(&self, values: &[String]) -> Vec<Option<BinLabel>> {
        values
            .iter()
            .map(|v| {
                self.categories
                    .iter()
                    .any(|c| c == v)
                    .then(|| BinLabel::Category(v.clone()))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(vals: &[&str]) -> Vec<String> {
        vals.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_appearance_order() {
        let binning = CategoricalBinning::from_values(&strings(&["de", "at", "de", "ch", "at"]));
        assert_eq!(binning.categories(), strings(&["de", "at", "ch"]).as_slice());
    }

    #[test]
    fn test_label_known_and_unknown() {
        let binning = CategoricalBinning::from_values(&strings(&["de", "at"]));
        let labels = binning.label(&strings(&["at", "fr"]));
        assert_eq!(labels[0], Some(BinLabel::Category("at".into())));
        assert_eq!(labels[1], None);
    }
}

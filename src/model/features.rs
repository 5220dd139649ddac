use std::collections::BTreeMap;

use crate::types::{FourFactors, FOUR_FACTORS};

/// Intercept column, always 1.0.
pub const CONST_FEATURE: &str = "const";
pub const HOME_SUFFIX: &str = "_h";
pub const AWAY_SUFFIX: &str = "_a";

/// One game's predictors. Keys iterate in lexicographic order, which is the
/// column order the regression was fitted with.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FeatureRow(BTreeMap<String, f64>);

impl FeatureRow {
    /// Merge home and away four factors into a single row, suffixing each
    /// factor with `_h` / `_a`.
    pub fn for_matchup(home: &FourFactors, away: &FourFactors) -> Self {
        let mut cols = BTreeMap::new();
        cols.insert(CONST_FEATURE.to_string(), 1.0);
        for (name, value) in home.named() {
            cols.insert(format!("{name}{HOME_SUFFIX}"), value);
        }
        for (name, value) in away.named() {
            cols.insert(format!("{name}{AWAY_SUFFIX}"), value);
        }
        Self(cols)
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.0.get(name).copied()
    }

    #[cfg(test)]
    pub fn columns(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.0.len()
    }
}

/// Every column name `FeatureRow::for_matchup` produces.
pub fn matchup_feature_names() -> Vec<String> {
    let mut names = vec![CONST_FEATURE.to_string()];
    for suffix in [HOME_SUFFIX, AWAY_SUFFIX] {
        names.extend(FOUR_FACTORS.iter().map(|f| format!("{f}{suffix}")));
    }
    names.sort();
    names
}

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use statrs::statistics::Statistics;

use crate::error::{AppError, Result};
use crate::model::{FeatureRow, Regression};

/// On-disk form of a fitted model, written by the fitting job.
///
/// ```json
/// { "coefficients": { "const": 1.5, "efg_pct_h": 110.2, ... },
///   "residual_std": 12.1 }
/// ```
/// `residuals` may be given instead of `residual_std`.
#[derive(Debug, Deserialize)]
struct ModelFile {
    coefficients: BTreeMap<String, f64>,
    residual_std: Option<f64>,
    #[serde(default)]
    residuals: Vec<f64>,
}

/// Ordinary least squares fit: prediction is the dot product of the
/// coefficients with the matching feature columns.
#[derive(Debug, Clone)]
pub struct LinearModel {
    coefficients: BTreeMap<String, f64>,
    residual_std: f64,
}

impl LinearModel {
    pub fn new(coefficients: BTreeMap<String, f64>, residual_std: f64) -> Result<Self> {
        if coefficients.is_empty() {
            return Err(AppError::Model("model has no coefficients".to_string()));
        }
        if !residual_std.is_finite() || residual_std <= 0.0 {
            return Err(AppError::Model(format!(
                "residual std must be positive, got {residual_std}"
            )));
        }
        Ok(Self { coefficients, residual_std })
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let file: ModelFile = serde_json::from_str(raw)?;
        let std = match file.residual_std {
            Some(std) => std,
            None => population_std(&file.residuals).ok_or_else(|| {
                AppError::Model("model file needs residual_std or residuals".to_string())
            })?,
        };
        Self::new(file.coefficients, std)
    }
}

impl Regression for LinearModel {
    fn predict(&self, row: &FeatureRow) -> Result<f64> {
        self.coefficients.iter().try_fold(0.0, |acc, (name, coef)| {
            let value = row
                .get(name)
                .ok_or_else(|| AppError::MissingFeatureData(format!("feature column {name}")))?;
            Ok(acc + coef * value)
        })
    }

    fn residual_std(&self) -> f64 {
        self.residual_std
    }

    fn feature_names(&self) -> Vec<&str> {
        self.coefficients.keys().map(String::as_str).collect()
    }
}

/// Population (ddof = 0) standard deviation. `None` for no residuals.
fn population_std(xs: &[f64]) -> Option<f64> {
    if xs.is_empty() {
        return None;
    }
    Some(xs.iter().population_std_dev())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{predict_matchup, probe_schema};
    use crate::types::FourFactors;

    fn flat(v: f64) -> FourFactors {
        FourFactors {
            efg_pct: v,
            tov_pct: v,
            orb_pct: v,
            ft_rate: v,
            opp_efg_pct: v,
            opp_tov_pct: v,
            drb_pct: v,
            opp_ft_rate: v,
        }
    }

    #[test]
    fn predicts_dot_product_with_intercept() {
        let model = LinearModel::from_json(
            r#"{"coefficients": {"const": 2.0, "efg_pct_h": 100.0, "efg_pct_a": -100.0},
                "residual_std": 11.5}"#,
        )
        .unwrap();
        let home = FourFactors { efg_pct: 0.55, ..flat(0.0) };
        let away = FourFactors { efg_pct: 0.50, ..flat(0.0) };
        let pred = predict_matchup(&model, &home, &away).unwrap();
        assert!((pred - 7.0).abs() < 1e-9, "got {pred}");
        assert_eq!(model.residual_std(), 11.5);
    }

    #[test]
    fn residual_std_falls_back_to_residuals() {
        let model = LinearModel::from_json(
            r#"{"coefficients": {"const": 0.0}, "residuals": [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]}"#,
        )
        .unwrap();
        assert!((model.residual_std() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn empty_residuals_are_rejected() {
        let raw = r#"{"coefficients": {"const": 1.0}, "residuals": []}"#;
        assert!(matches!(LinearModel::from_json(raw), Err(AppError::Model(_))));
    }

    #[test]
    fn invalid_model_files_are_rejected() {
        for raw in [
            r#"{"coefficients": {"const": 1.0}}"#,
            r#"{"coefficients": {"const": 1.0}, "residual_std": 0.0}"#,
            r#"{"coefficients": {}, "residual_std": 10.0}"#,
        ] {
            assert!(matches!(LinearModel::from_json(raw), Err(AppError::Model(_))), "{raw}");
        }
    }

    #[test]
    fn missing_feature_column_is_reported() {
        let mut coefs = BTreeMap::new();
        coefs.insert("pace_h".to_string(), 1.0);
        let model = LinearModel::new(coefs, 10.0).unwrap();
        let row = FeatureRow::for_matchup(&flat(0.5), &flat(0.5));
        assert!(matches!(model.predict(&row), Err(AppError::MissingFeatureData(_))));
        assert!(matches!(probe_schema(&model), Err(AppError::Model(_))));
    }

    #[test]
    fn probe_accepts_four_factor_models() {
        let mut coefs = BTreeMap::new();
        coefs.insert("const".to_string(), 1.0);
        coefs.insert("tov_pct_a".to_string(), 0.8);
        coefs.insert("opp_efg_pct_h".to_string(), -90.0);
        let model = LinearModel::new(coefs, 12.0).unwrap();
        assert!(probe_schema(&model).is_ok());
    }
}

pub mod features;
pub mod linear;

pub use features::FeatureRow;
pub use linear::LinearModel;

use crate::error::{AppError, Result};
use crate::types::FourFactors;

/// A regression fitted elsewhere. Only inference happens here.
pub trait Regression {
    /// Predicted home-minus-away margin for one game.
    fn predict(&self, row: &FeatureRow) -> Result<f64>;

    /// Standard deviation of the fitted model's residuals.
    fn residual_std(&self) -> f64;

    /// Names of the columns the model reads from a `FeatureRow`.
    fn feature_names(&self) -> Vec<&str>;
}

/// Predict a single matchup from each side's four factors.
pub fn predict_matchup<R: Regression>(
    model: &R,
    home: &FourFactors,
    away: &FourFactors,
) -> Result<f64> {
    let row = FeatureRow::for_matchup(home, away);
    model.predict(&row)
}

/// Check that every column the model reads is one the matchup builder
/// produces, so a mismatched model file fails before any game is processed.
pub fn probe_schema<R: Regression>(model: &R) -> Result<()> {
    let available = features::matchup_feature_names();
    let unknown: Vec<&str> = model
        .feature_names()
        .into_iter()
        .filter(|name| !available.iter().any(|a| a == name))
        .collect();
    if !unknown.is_empty() {
        return Err(AppError::Model(format!(
            "model reads columns the feature builder does not produce: {}",
            unknown.join(", ")
        )));
    }
    Ok(())
}

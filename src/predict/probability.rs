use statrs::distribution::{ContinuousCDF, Normal};

use crate::error::{AppError, Result};
use crate::types::ProbabilityFunction;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineProbability {
    pub probability: f64,
    /// `None` when the line sits exactly on the prediction.
    pub function: Option<ProbabilityFunction>,
}

/// How likely the posted line would be if the model were true, i.e. if the
/// residuals were homoscedastic and normal around `prediction`.
///
/// `line` is the stored home spread (negative favors home), so the margin it
/// implies is `-line`. The tail away from the prediction is reported: CDF when
/// the line implies less than the prediction, SF when it implies more.
pub fn line_probability(prediction: f64, line: f64, std: f64) -> Result<LineProbability> {
    let line_prediction = -line;
    if prediction == line_prediction {
        return Ok(LineProbability { probability: 0.5, function: None });
    }

    let dist = Normal::new(prediction, std)
        .map_err(|e| AppError::Model(format!("residual distribution (std={std}): {e}")))?;

    Ok(if prediction > line_prediction {
        LineProbability {
            probability: dist.cdf(line_prediction),
            function: Some(ProbabilityFunction::Cdf),
        }
    } else {
        LineProbability {
            probability: dist.sf(line_prediction),
            function: Some(ProbabilityFunction::Sf),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_on_prediction_is_exactly_half() {
        for (pred, line) in [(4.5, -4.5), (-3.0, 3.0), (0.0, 0.0)] {
            let p = line_probability(pred, line, 12.0).unwrap();
            assert_eq!(p.probability, 0.5);
            assert_eq!(p.function, None);
        }
    }

    #[test]
    fn line_above_prediction_uses_survival_function() {
        // line -4.5 implies a 4.5 point home win; model says 3.0
        let p = line_probability(3.0, -4.5, 10.0).unwrap();
        assert_eq!(p.function, Some(ProbabilityFunction::Sf));
        let expected = 1.0 - Normal::new(3.0, 10.0).unwrap().cdf(4.5);
        assert!((p.probability - expected).abs() < 1e-12);
        assert!(p.probability < 0.5 && p.probability > 0.4);
    }

    #[test]
    fn line_below_prediction_uses_cdf() {
        let p = line_probability(8.0, -2.0, 10.0).unwrap();
        assert_eq!(p.function, Some(ProbabilityFunction::Cdf));
        let expected = Normal::new(8.0, 10.0).unwrap().cdf(2.0);
        assert!((p.probability - expected).abs() < 1e-12);
        assert!(p.probability < 0.5);
    }

    #[test]
    fn tails_are_symmetric() {
        let below = line_probability(0.0, -5.0, 8.0).unwrap();
        let above = line_probability(0.0, 5.0, 8.0).unwrap();
        assert!((below.probability - above.probability).abs() < 1e-12);
    }

    #[test]
    fn non_positive_std_is_a_model_error() {
        assert!(matches!(line_probability(1.0, 2.0, 0.0), Err(AppError::Model(_))));
        assert!(matches!(line_probability(1.0, 2.0, -3.0), Err(AppError::Model(_))));
    }
}

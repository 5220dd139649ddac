use crate::types::BetResult;

/// Grade a finished game against its line.
///
/// WIN means the final margin and the model's prediction landed on the same
/// side of the line; this measures the model's call, not a wager's payout.
/// A margin exactly on the line is a PUSH whatever the prediction was.
pub fn grade(home_score: i64, away_score: i64, line: f64, prediction: f64) -> BetResult {
    let score_margin = (home_score - away_score) as f64;
    let line_inverse = -line;

    if score_margin == line_inverse {
        BetResult::Push
    } else if score_margin < line_inverse && prediction < line_inverse {
        BetResult::Win
    } else if score_margin > line_inverse && prediction > line_inverse {
        BetResult::Win
    } else {
        BetResult::Loss
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn margin_and_prediction_over_the_line_win() {
        // margin 5 vs line_inverse 4.5, prediction 6.0 also over
        assert_eq!(grade(100, 95, -4.5, 6.0), BetResult::Win);
    }

    #[test]
    fn margin_and_prediction_under_the_line_win() {
        assert_eq!(grade(100, 98, -4.5, 1.0), BetResult::Win);
        assert_eq!(grade(90, 110, 3.0, -8.0), BetResult::Win);
    }

    #[test]
    fn opposite_sides_lose() {
        assert_eq!(grade(100, 95, -4.5, 3.0), BetResult::Loss);
        assert_eq!(grade(100, 99, -4.5, 9.0), BetResult::Loss);
    }

    #[test]
    fn margin_on_the_line_is_push_for_any_prediction() {
        for prediction in [-20.0, 0.0, 5.0, 5.5, 30.0] {
            assert_eq!(grade(105, 100, -5.0, prediction), BetResult::Push);
        }
        assert_eq!(grade(100, 100, 0.0, 2.0), BetResult::Push);
    }

    #[test]
    fn prediction_on_the_line_loses() {
        assert_eq!(grade(110, 100, -4.5, 4.5), BetResult::Loss);
    }
}

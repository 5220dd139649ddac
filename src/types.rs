use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::teams::{normalize, Team};

// ---------------------------------------------------------------------------
// Game identity
// ---------------------------------------------------------------------------

/// Natural key of a scheduled game. Unique per league year across the
/// schedule, odds and prediction tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GameIdentity {
    pub home_team: Team,
    pub away_team: Team,
    pub start_time: NaiveDateTime,
}

impl std::fmt::Display for GameIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} @ {} ({})", self.away_team, self.home_team, self.start_time)
    }
}

// ---------------------------------------------------------------------------
// Odds
// ---------------------------------------------------------------------------

/// One game as it came off the odds feed. Team names are upper-cased but not
/// yet normalized.
#[derive(Debug, Clone, PartialEq)]
pub struct OddsLine {
    pub home_team: String,
    pub away_team: String,
    pub start_time: NaiveDateTime,
    /// Home perspective; negative means the home team is favored.
    pub spread: Option<f64>,
    pub home_spread_price: Option<i32>,
    pub away_spread_price: Option<i32>,
    pub home_moneyline: Option<i32>,
    pub away_moneyline: Option<i32>,
    pub scrape_time: NaiveDateTime,
}

/// An `OddsLine` with canonical teams, ready to persist.
#[derive(Debug, Clone, PartialEq)]
pub struct OddsRecord {
    pub game: GameIdentity,
    pub spread: Option<f64>,
    pub home_spread_price: Option<i32>,
    pub away_spread_price: Option<i32>,
    pub home_moneyline: Option<i32>,
    pub away_moneyline: Option<i32>,
    pub scrape_time: NaiveDateTime,
}

impl TryFrom<&OddsLine> for OddsRecord {
    type Error = AppError;

    fn try_from(line: &OddsLine) -> Result<Self> {
        Ok(Self {
            game: GameIdentity {
                home_team: normalize(&line.home_team)?,
                away_team: normalize(&line.away_team)?,
                start_time: line.start_time,
            },
            spread: line.spread,
            home_spread_price: line.home_spread_price,
            away_spread_price: line.away_spread_price,
            home_moneyline: line.home_moneyline,
            away_moneyline: line.away_moneyline,
            scrape_time: line.scrape_time,
        })
    }
}

// ---------------------------------------------------------------------------
// Team stats (four factors)
// ---------------------------------------------------------------------------

/// Column names of the four factors, offensive then defensive.
pub const FOUR_FACTORS: [&str; 8] = [
    "efg_pct",
    "tov_pct",
    "orb_pct",
    "ft_rate",
    "opp_efg_pct",
    "opp_tov_pct",
    "drb_pct",
    "opp_ft_rate",
];

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct FourFactors {
    pub efg_pct: f64,
    pub tov_pct: f64,
    pub orb_pct: f64,
    pub ft_rate: f64,
    pub opp_efg_pct: f64,
    pub opp_tov_pct: f64,
    pub drb_pct: f64,
    pub opp_ft_rate: f64,
}

impl FourFactors {
    /// Values paired with their names, in `FOUR_FACTORS` order.
    pub fn named(&self) -> [(&'static str, f64); 8] {
        [
            (FOUR_FACTORS[0], self.efg_pct),
            (FOUR_FACTORS[1], self.tov_pct),
            (FOUR_FACTORS[2], self.orb_pct),
            (FOUR_FACTORS[3], self.ft_rate),
            (FOUR_FACTORS[4], self.opp_efg_pct),
            (FOUR_FACTORS[5], self.opp_tov_pct),
            (FOUR_FACTORS[6], self.drb_pct),
            (FOUR_FACTORS[7], self.opp_ft_rate),
        ]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TeamStats {
    pub team: Team,
    pub factors: FourFactors,
    pub scrape_time: NaiveDateTime,
}

// ---------------------------------------------------------------------------
// Predictions
// ---------------------------------------------------------------------------

/// Which tail of the residual distribution a line probability came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbabilityFunction {
    Cdf,
    Sf,
}

impl std::fmt::Display for ProbabilityFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProbabilityFunction::Cdf => write!(f, "cdf"),
            ProbabilityFunction::Sf => write!(f, "sf"),
        }
    }
}

impl FromStr for ProbabilityFunction {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "cdf" => Ok(ProbabilityFunction::Cdf),
            "sf" => Ok(ProbabilityFunction::Sf),
            other => Err(AppError::InvalidRecord(format!("probability function {other:?}"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BetResult {
    Win,
    Loss,
    Push,
}

impl std::fmt::Display for BetResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            BetResult::Win => "WIN",
            BetResult::Loss => "LOSS",
            BetResult::Push => "PUSH",
        };
        write!(f, "{s}")
    }
}

impl FromStr for BetResult {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "WIN" => Ok(BetResult::Win),
            "LOSS" => Ok(BetResult::Loss),
            "PUSH" => Ok(BetResult::Push),
            other => Err(AppError::InvalidRecord(format!("bet result {other:?}"))),
        }
    }
}

/// A prediction staged for insertion.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPrediction {
    pub game: GameIdentity,
    /// Predicted home-minus-away margin.
    pub prediction: f64,
    /// Spread copied from the odds record at prediction time.
    pub line: f64,
    pub probability: f64,
    pub function: Option<ProbabilityFunction>,
    pub odds_id: i64,
    pub game_id: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bet_result_round_trips_through_text() {
        for r in [BetResult::Win, BetResult::Loss, BetResult::Push] {
            assert_eq!(r.to_string().parse::<BetResult>().unwrap(), r);
        }
        assert!(matches!("win".parse::<BetResult>(), Err(AppError::InvalidRecord(_))));
    }

    #[test]
    fn odds_record_requires_known_teams() {
        let t = chrono::NaiveDate::from_ymd_opt(2025, 3, 26)
            .unwrap()
            .and_hms_opt(19, 30, 0)
            .unwrap();
        let mut line = OddsLine {
            home_team: "LOS ANGELES LAKERS".to_string(),
            away_team: "BOSTON CELTICS".to_string(),
            start_time: t,
            spread: Some(-4.5),
            home_spread_price: Some(-110),
            away_spread_price: Some(-110),
            home_moneyline: None,
            away_moneyline: None,
            scrape_time: t,
        };
        let rec = OddsRecord::try_from(&line).unwrap();
        assert_eq!(rec.game.home_team, Team::LosAngelesLakers);
        assert_eq!(rec.game.away_team, Team::BostonCeltics);

        line.away_team = "SEATTLE SUPERSONICS".to_string();
        assert!(matches!(OddsRecord::try_from(&line), Err(AppError::UnknownTeam(_))));
    }
}

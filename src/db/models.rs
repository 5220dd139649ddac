//! Row types for the tables in `migrations/`. Conversions into domain types
//! validate stored text (team names, bet results) and fail with
//! `AppError::InvalidRecord` rather than yielding nulls.

use chrono::NaiveDateTime;

use crate::error::{AppError, Result};
use crate::teams::Team;
use crate::types::{FourFactors, GameIdentity, TeamStats};
#[cfg(test)]
use crate::types::{BetResult, ProbabilityFunction};

fn stored_team(name: &str) -> Result<Team> {
    name.parse::<Team>()
        .map_err(|_| AppError::InvalidRecord(format!("team {name:?}")))
}

fn stored_identity(home: &str, away: &str, start_time: NaiveDateTime) -> Result<GameIdentity> {
    Ok(GameIdentity {
        home_team: stored_team(home)?,
        away_team: stored_team(away)?,
        start_time,
    })
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ScheduleRow {
    pub id: i64,
    pub start_time: NaiveDateTime,
    pub home_team_score: Option<i64>,
    pub away_team_score: Option<i64>,
}

impl ScheduleRow {
    /// Both scores, once the game has a final result. Zero means not played.
    pub fn final_score(&self) -> Option<(i64, i64)> {
        match (self.home_team_score, self.away_team_score) {
            (Some(h), Some(a)) if h > 0 && a > 0 => Some((h, a)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TeamStatsRow {
    pub team_name: String,
    pub efg_pct: f64,
    pub tov_pct: f64,
    pub orb_pct: f64,
    pub ft_rate: f64,
    pub opp_efg_pct: f64,
    pub opp_tov_pct: f64,
    pub drb_pct: f64,
    pub opp_ft_rate: f64,
    pub scrape_time: NaiveDateTime,
}

impl TryFrom<TeamStatsRow> for TeamStats {
    type Error = AppError;

    fn try_from(row: TeamStatsRow) -> Result<Self> {
        Ok(TeamStats {
            team: stored_team(&row.team_name)?,
            factors: FourFactors {
                efg_pct: row.efg_pct,
                tov_pct: row.tov_pct,
                orb_pct: row.orb_pct,
                ft_rate: row.ft_rate,
                opp_efg_pct: row.opp_efg_pct,
                opp_tov_pct: row.opp_tov_pct,
                drb_pct: row.drb_pct,
                opp_ft_rate: row.opp_ft_rate,
            },
            scrape_time: row.scrape_time,
        })
    }
}

/// The columns of an odds row the predictor needs.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OddsRow {
    pub id: i64,
    pub home_team: String,
    pub away_team: String,
    pub start_time: NaiveDateTime,
    pub spread: Option<f64>,
    pub game_id: Option<i64>,
}

impl OddsRow {
    pub fn identity(&self) -> Result<GameIdentity> {
        stored_identity(&self.home_team, &self.away_team, self.start_time)
    }
}

/// The columns of a prediction row settlement reads.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PredictionRow {
    pub id: i64,
    pub home_team: String,
    pub away_team: String,
    pub start_time: NaiveDateTime,
    pub prediction: f64,
    pub line: f64,
    pub probability: f64,
    pub home_team_score: Option<i64>,
    pub away_team_score: Option<i64>,
    pub game_id: Option<i64>,
}

impl PredictionRow {
    pub fn identity(&self) -> Result<GameIdentity> {
        stored_identity(&self.home_team, &self.away_team, self.start_time)
    }
}

/// Write-once columns of a prediction, checked by tests.
#[cfg(test)]
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PredictionAudit {
    pub probability_function: Option<String>,
    pub bet_result: Option<String>,
    pub odds_id: Option<i64>,
    pub created_at: NaiveDateTime,
}

#[cfg(test)]
impl PredictionAudit {
    pub fn bet_result(&self) -> Result<Option<BetResult>> {
        self.bet_result.as_deref().map(str::parse).transpose()
    }

    pub fn probability_function(&self) -> Result<Option<ProbabilityFunction>> {
        self.probability_function.as_deref().map(str::parse).transpose()
    }
}

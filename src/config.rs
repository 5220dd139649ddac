use crate::error::{AppError, Result};

pub const ODDS_URL: &str =
    "https://www.bovada.lv/services/sports/event/v2/events/A/description/basketball/nba";
pub const ODDS_PLAYOFF_URL: &str =
    "https://www.bovada.lv/services/sports/event/v2/events/A/description/basketball/nba-playoffs";

/// Timeout for a single odds feed request (seconds).
pub const HTTP_TIMEOUT_SECS: u64 = 30;

/// Default league year. The 2024-25 season is league year 2025.
pub const DEFAULT_LEAGUE_YEAR: i32 = 2025;

/// Odds feed endpoints, tried in order.
#[derive(Debug, Clone)]
pub struct OddsEndpoints {
    pub primary: String,
    /// Playoff-specific feed, used when the primary returns no events.
    pub fallback: String,
}

/// The subset of configuration the pipeline needs.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub league_year: i32,
    pub odds_endpoints: OddsEndpoints,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub league_year: i32,
    pub odds_endpoints: OddsEndpoints,
    pub log_level: String,
    pub db_path: String,
    /// JSON file holding the fitted regression (MODEL_PATH)
    pub model_path: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            league_year: match std::env::var("LEAGUE_YEAR") {
                Ok(v) => parse_league_year(&v)?,
                Err(_) => DEFAULT_LEAGUE_YEAR,
            },
            odds_endpoints: OddsEndpoints {
                primary: std::env::var("ODDS_URL").unwrap_or_else(|_| ODDS_URL.to_string()),
                fallback: std::env::var("ODDS_PLAYOFF_URL")
                    .unwrap_or_else(|_| ODDS_PLAYOFF_URL.to_string()),
            },
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            db_path: std::env::var("DB_PATH").unwrap_or_else(|_| "nba_predict.db".to_string()),
            model_path: std::env::var("MODEL_PATH").unwrap_or_else(|_| "model.json".to_string()),
        })
    }

    pub fn pipeline(&self) -> PipelineConfig {
        PipelineConfig {
            league_year: self.league_year,
            odds_endpoints: self.odds_endpoints.clone(),
        }
    }
}

fn parse_league_year(raw: &str) -> Result<i32> {
    let year = raw
        .trim()
        .parse::<i32>()
        .map_err(|_| AppError::Config("LEAGUE_YEAR must be a year, e.g. 2025".to_string()))?;
    if !(1947..=2100).contains(&year) {
        return Err(AppError::Config(format!("LEAGUE_YEAR {year} is out of range")));
    }
    Ok(year)
}

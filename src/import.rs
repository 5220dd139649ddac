//! Loaders for the schedule and team-stat exports produced by the external
//! scrapers. Both take a JSON array and write it in one transaction.

use std::path::Path;

use chrono::NaiveDateTime;
use serde::Deserialize;
use sqlx::SqlitePool;
use tracing::{error, info};

use crate::db::{ScheduleRepo, TeamStatsRepo};
use crate::error::{AppError, Result};
use crate::teams::normalize;
use crate::types::{FourFactors, GameIdentity, TeamStats};

#[derive(Debug, Deserialize)]
struct ScheduleEntry {
    start_time: NaiveDateTime,
    home_team: String,
    away_team: String,
    #[serde(default)]
    home_team_score: Option<i64>,
    #[serde(default)]
    away_team_score: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct StatsEntry {
    team_name: String,
    #[serde(flatten)]
    factors: FourFactors,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ImportSummary {
    pub written: usize,
    /// Raw names that did not normalize; their rows were skipped.
    pub unknown_teams: Vec<String>,
}

/// The unknown name behind a failed `normalize`. Anything else is passed up.
fn unknown_team(e: AppError) -> Result<String> {
    match e {
        AppError::UnknownTeam(name) => Ok(name),
        other => Err(other),
    }
}

pub async fn import_schedule(pool: &SqlitePool, league_year: i32, path: &Path) -> Result<ImportSummary> {
    let raw = std::fs::read_to_string(path)?;
    import_schedule_json(pool, league_year, &raw).await
}

pub async fn import_schedule_json(
    pool: &SqlitePool,
    league_year: i32,
    raw: &str,
) -> Result<ImportSummary> {
    let entries: Vec<ScheduleEntry> = serde_json::from_str(raw)?;
    let mut summary = ImportSummary::default();

    let mut tx = pool.begin().await?;
    let mut repo = ScheduleRepo::new(&mut tx);
    for entry in &entries {
        let game = match (normalize(&entry.home_team), normalize(&entry.away_team)) {
            (Ok(home_team), Ok(away_team)) => GameIdentity {
                home_team,
                away_team,
                start_time: entry.start_time,
            },
            (Err(e), _) | (_, Err(e)) => {
                error!(error = %e, "skipping schedule row");
                summary.unknown_teams.push(unknown_team(e)?);
                continue;
            }
        };

        // A row the odds feed created earlier for this matchup and day is
        // the same game at the feed's tip-off time.
        let placeholder = match repo.find(league_year, &game).await? {
            Some(_) => None,
            None => {
                repo.find_same_day(league_year, game.home_team, game.away_team, game.start_time.date())
                    .await?
            }
        };
        match placeholder {
            Some(row) => {
                info!(
                    game = %game,
                    from = %row.start_time,
                    "moving game to its scheduled tip-off"
                );
                repo.reschedule(row.id, game.start_time, entry.home_team_score, entry.away_team_score)
                    .await?;
            }
            None => {
                repo.upsert(league_year, &game, entry.home_team_score, entry.away_team_score)
                    .await?;
            }
        }
        summary.written += 1;
    }
    tx.commit().await?;

    info!(
        written = summary.written,
        unknown_teams = summary.unknown_teams.len(),
        "schedule imported"
    );
    Ok(summary)
}

pub async fn import_stats(
    pool: &SqlitePool,
    league_year: i32,
    path: &Path,
    now: NaiveDateTime,
) -> Result<ImportSummary> {
    let raw = std::fs::read_to_string(path)?;
    import_stats_json(pool, league_year, &raw, now).await
}

/// Insert one snapshot per team, stamped `now`. At most one snapshot is
/// taken per calendar day.
pub async fn import_stats_json(
    pool: &SqlitePool,
    league_year: i32,
    raw: &str,
    now: NaiveDateTime,
) -> Result<ImportSummary> {
    let entries: Vec<StatsEntry> = serde_json::from_str(raw)?;
    let mut summary = ImportSummary::default();

    let mut tx = pool.begin().await?;
    let mut repo = TeamStatsRepo::new(&mut tx);

    if let Some(last) = repo.last_scrape_time(league_year).await? {
        if last.date() == now.date() {
            info!(last = %last, "team stats already imported today, skipping");
            return Ok(summary);
        }
    }

    for entry in entries {
        let team = match normalize(&entry.team_name) {
            Ok(team) => team,
            Err(e) => {
                error!(error = %e, "skipping team stats row");
                summary.unknown_teams.push(unknown_team(e)?);
                continue;
            }
        };
        let stats = TeamStats { team, factors: entry.factors, scrape_time: now };
        repo.insert(league_year, &stats).await?;
        summary.written += 1;
    }
    tx.commit().await?;

    info!(
        written = summary.written,
        unknown_teams = summary.unknown_teams.len(),
        "team stats imported"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::db::memory_pool;
    use crate::teams::Team;

    fn at(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    const STATS: &str = r#"[
        {"team_name": "Miami Heat*", "efg_pct": 0.53, "tov_pct": 0.12, "orb_pct": 0.24,
         "ft_rate": 0.21, "opp_efg_pct": 0.52, "opp_tov_pct": 0.14, "drb_pct": 0.76,
         "opp_ft_rate": 0.18},
        {"team_name": "Vancouver Grizzlies", "efg_pct": 0.5, "tov_pct": 0.1, "orb_pct": 0.2,
         "ft_rate": 0.2, "opp_efg_pct": 0.5, "opp_tov_pct": 0.1, "drb_pct": 0.7,
         "opp_ft_rate": 0.2}
    ]"#;

    #[tokio::test]
    async fn schedule_import_upserts_and_keeps_scores() {
        let pool = memory_pool().await;
        let first = r#"[
            {"start_time": "2025-03-26T19:30:00", "home_team": "Los Angeles Lakers",
             "away_team": "Boston Celtics", "home_team_score": 112, "away_team_score": 104},
            {"start_time": "2025-03-27T19:00:00", "home_team": "Seattle SuperSonics",
             "away_team": "Boston Celtics"}
        ]"#;
        let summary = import_schedule_json(&pool, 2025, first).await.unwrap();
        assert_eq!(summary.written, 1);
        assert_eq!(summary.unknown_teams, vec!["Seattle SuperSonics".to_string()]);

        let again = r#"[{"start_time": "2025-03-26T19:30:00", "home_team": "LOS ANGELES LAKERS",
                         "away_team": "BOSTON CELTICS"}]"#;
        import_schedule_json(&pool, 2025, again).await.unwrap();

        let mut conn = pool.acquire().await.unwrap();
        let game = GameIdentity {
            home_team: Team::LosAngelesLakers,
            away_team: Team::BostonCeltics,
            start_time: NaiveDate::from_ymd_opt(2025, 3, 26)
                .unwrap()
                .and_hms_opt(19, 30, 0)
                .unwrap(),
        };
        let row = ScheduleRepo::new(&mut conn).find(2025, &game).await.unwrap().unwrap();
        assert_eq!(row.final_score(), Some((112, 104)));
    }

    #[tokio::test]
    async fn schedule_import_adopts_a_same_day_row_from_the_odds_feed() {
        let pool = memory_pool().await;
        let feed_time = GameIdentity {
            home_team: Team::LosAngelesLakers,
            away_team: Team::BostonCeltics,
            start_time: NaiveDate::from_ymd_opt(2025, 3, 26)
                .unwrap()
                .and_hms_opt(19, 30, 0)
                .unwrap(),
        };
        let mut conn = pool.acquire().await.unwrap();
        let id = ScheduleRepo::new(&mut conn).insert(2025, &feed_time).await.unwrap();
        drop(conn);

        let export = r#"[{"start_time": "2025-03-26T19:00:00", "home_team": "Los Angeles Lakers",
                          "away_team": "Boston Celtics", "home_team_score": 112,
                          "away_team_score": 104}]"#;
        let summary = import_schedule_json(&pool, 2025, export).await.unwrap();
        assert_eq!(summary.written, 1);

        let mut conn = pool.acquire().await.unwrap();
        let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM schedule")
            .fetch_one(&mut *conn)
            .await
            .unwrap();
        assert_eq!(rows, 1);
        let row = ScheduleRepo::new(&mut conn).get(id).await.unwrap().unwrap();
        assert_eq!(row.start_time, at(26, 19));
        assert_eq!(row.final_score(), Some((112, 104)));
    }

    #[tokio::test]
    async fn stats_import_once_per_day() {
        let pool = memory_pool().await;

        let summary = import_stats_json(&pool, 2025, STATS, at(25, 9)).await.unwrap();
        assert_eq!(summary.written, 1);
        assert_eq!(summary.unknown_teams, vec!["Vancouver Grizzlies".to_string()]);

        let same_day = import_stats_json(&pool, 2025, STATS, at(25, 18)).await.unwrap();
        assert_eq!(same_day, ImportSummary::default());

        let next_day = import_stats_json(&pool, 2025, STATS, at(26, 9)).await.unwrap();
        assert_eq!(next_day.written, 1);

        let mut conn = pool.acquire().await.unwrap();
        let latest = TeamStatsRepo::new(&mut conn)
            .latest(2025, Team::MiamiHeat)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(latest.scrape_time, at(26, 9));
        assert_eq!(latest.factors.efg_pct, 0.53);
    }
}

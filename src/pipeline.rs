use std::future::Future;

use chrono::{Local, NaiveDateTime};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{error, info, warn};

use crate::config::PipelineConfig;
use crate::db::{OddsRepo, PredictionRepo, ScheduleRepo, TeamStatsRepo};
use crate::error::{AppError, Result};
use crate::fetcher::{fetch_odds_feed, http_client};
use crate::model::{predict_matchup, Regression};
use crate::odds::{parse_feed, ParsedFeed};
use crate::predict::{grade, line_probability};
use crate::types::{BetResult, GameIdentity, NewPrediction, OddsLine, OddsRecord};

#[derive(Debug, Default, Clone, PartialEq)]
pub struct IngestSummary {
    pub upserted: usize,
    /// Games linked to a schedule row that had to be created for them.
    pub new_games: usize,
    pub unknown_teams: Vec<String>,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct PredictSummary {
    pub candidates: usize,
    pub inserted: usize,
    /// Already predicted by an overlapping run.
    pub duplicates: usize,
    pub skipped_missing_stats: usize,
    pub skipped_missing_features: usize,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct SettleSummary {
    pub scored: usize,
    pub wins: usize,
    pub losses: usize,
    pub pushes: usize,
}

impl SettleSummary {
    pub fn graded(&self) -> usize {
        self.wins + self.losses + self.pushes
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct CycleSummary {
    /// `None` when the odds feed had no data and the cycle stopped early.
    pub ingest: Option<IngestSummary>,
    pub predict: Option<PredictSummary>,
    pub settle: Option<SettleSummary>,
}

/// One pass of scrape, normalize, predict, persist and settle. Each step is
/// its own transaction, so a failure keeps what earlier steps committed.
pub struct Pipeline {
    config: PipelineConfig,
    pool: SqlitePool,
    client: reqwest::Client,
}

impl Pipeline {
    pub fn new(config: PipelineConfig, pool: SqlitePool) -> Result<Self> {
        Ok(Self::with_client(config, pool, http_client()?))
    }

    pub fn with_client(config: PipelineConfig, pool: SqlitePool, client: reqwest::Client) -> Self {
        Self { config, pool, client }
    }

    /// Full cycle. Stops cleanly after the scrape if there is no odds data.
    pub async fn run_cycle<R: Regression>(&self, model: &R) -> Result<CycleSummary> {
        let Some(ingest) = self.scrape_and_ingest().await? else {
            info!("No odds data available, ending cycle");
            return Ok(CycleSummary::default());
        };
        let predict = self.predict_new(model).await?;
        let settle = self.settle().await?;
        Ok(CycleSummary {
            ingest: Some(ingest),
            predict: Some(predict),
            settle: Some(settle),
        })
    }

    pub async fn scrape_only(&self) -> Result<CycleSummary> {
        let ingest = self.scrape_and_ingest().await?;
        if ingest.is_none() {
            info!("No odds data available");
        }
        Ok(CycleSummary { ingest, ..Default::default() })
    }

    pub async fn predict_only<R: Regression>(&self, model: &R) -> Result<CycleSummary> {
        let predict = self.predict_new(model).await?;
        let settle = self.settle().await?;
        Ok(CycleSummary {
            ingest: None,
            predict: Some(predict),
            settle: Some(settle),
        })
    }

    async fn scrape_and_ingest(&self) -> Result<Option<IngestSummary>> {
        match self.scrape().await? {
            Some(lines) => Ok(Some(self.ingest_lines(&lines).await?)),
            None => Ok(None),
        }
    }

    /// Fetch and parse the odds feed. `None` means no data from any endpoint.
    pub async fn scrape(&self) -> Result<Option<Vec<OddsLine>>> {
        let now = Local::now().naive_local();
        let Some(groups) = fetch_odds_feed(&self.client, &self.config.odds_endpoints).await? else {
            return Ok(None);
        };
        match parse_feed(&groups, now, now)? {
            ParsedFeed::NoData => Ok(None),
            ParsedFeed::Lines(lines) => {
                info!(games = lines.len(), "Odds feed parsed");
                Ok(Some(lines))
            }
        }
    }

    /// Normalize, link to the schedule and upsert a batch of lines. Unknown
    /// team names skip only their own game.
    pub async fn ingest_lines(&self, lines: &[OddsLine]) -> Result<IngestSummary> {
        let mut unknown_teams = Vec::new();
        let mut records = Vec::with_capacity(lines.len());
        for line in lines {
            match OddsRecord::try_from(line) {
                Ok(record) => records.push(record),
                Err(AppError::UnknownTeam(name)) => {
                    error!(
                        home = %line.home_team,
                        away = %line.away_team,
                        team = %name,
                        "Unknown team in odds feed, skipping game"
                    );
                    unknown_teams.push(name);
                }
                Err(e) => return Err(e),
            }
        }

        let records = &records[..];
        let (upserted, new_games) = retry_on_conflict("odds", move || self.write_odds(records)).await?;

        let summary = IngestSummary { upserted, new_games, unknown_teams };
        info!(
            upserted = summary.upserted,
            new_games = summary.new_games,
            unknown_teams = summary.unknown_teams.len(),
            "Odds ingested"
        );
        Ok(summary)
    }

    async fn write_odds(&self, records: &[OddsRecord]) -> Result<(usize, usize)> {
        let year = self.config.league_year;
        let mut new_games = 0;
        let mut tx = self.pool.begin().await?;
        for record in records {
            let (game_id, created) = link_schedule(&mut tx, year, &record.game).await?;
            if created {
                new_games += 1;
            }
            OddsRepo::new(&mut tx).upsert(year, record, Some(game_id)).await?;
        }
        tx.commit().await?;
        Ok((records.len(), new_games))
    }

    /// Predict every game that has a spread and no prediction yet, then
    /// persist the batch.
    pub async fn predict_new<R: Regression>(&self, model: &R) -> Result<PredictSummary> {
        let year = self.config.league_year;
        let mut summary = PredictSummary::default();
        let mut staged = Vec::new();

        let mut conn = self.pool.acquire().await?;
        let candidates = OddsRepo::new(&mut conn).awaiting_prediction(year).await?;
        summary.candidates = candidates.len();

        for odds in candidates {
            let Some(line) = odds.spread else { continue };
            let game = odds.identity()?;

            let mut stats = TeamStatsRepo::new(&mut conn);
            let home = stats.latest(year, game.home_team).await?;
            let away = stats.latest(year, game.away_team).await?;
            let (Some(home), Some(away)) = (home, away) else {
                warn!(game = %game, "No team stats, skipping prediction");
                summary.skipped_missing_stats += 1;
                continue;
            };

            let prediction = match predict_matchup(model, &home.factors, &away.factors) {
                Ok(p) => p,
                Err(AppError::MissingFeatureData(what)) => {
                    warn!(game = %game, missing = %what, "Feature row incomplete, skipping prediction");
                    summary.skipped_missing_features += 1;
                    continue;
                }
                Err(e) => return Err(e),
            };
            let lp = line_probability(prediction, line, model.residual_std())?;

            info!(
                "{} @ {} {}: model {:+.1}, line {:+.1}, p={:.3} ({})",
                game.away_team,
                game.home_team,
                game.start_time.format("%Y-%m-%d %H:%M"),
                prediction,
                line,
                lp.probability,
                lp.function.map_or("even".to_string(), |f| f.to_string()),
            );

            staged.push(NewPrediction {
                game,
                prediction,
                line,
                probability: lp.probability,
                function: lp.function,
                odds_id: odds.id,
                game_id: odds.game_id,
            });
        }
        drop(conn);

        let (inserted, duplicates) = self.persist_predictions(&staged, Local::now().naive_local()).await?;
        summary.inserted = inserted;
        summary.duplicates = duplicates;

        info!(
            candidates = summary.candidates,
            inserted = summary.inserted,
            duplicates = summary.duplicates,
            missing_stats = summary.skipped_missing_stats,
            missing_features = summary.skipped_missing_features,
            "Predictions made"
        );
        Ok(summary)
    }

    /// Insert the batch in one transaction. If another run got there first,
    /// redo it row by row and keep whichever prediction is already stored.
    async fn persist_predictions(
        &self,
        staged: &[NewPrediction],
        created_at: NaiveDateTime,
    ) -> Result<(usize, usize)> {
        match self.insert_predictions(staged, created_at).await {
            Ok(n) => Ok((n, 0)),
            Err(e) if e.is_unique_violation() => {
                warn!("Prediction batch hit an existing row, retrying one by one");
                let year = self.config.league_year;
                let mut inserted = 0;
                let mut tx = self.pool.begin().await?;
                let mut repo = PredictionRepo::new(&mut tx);
                for p in staged {
                    if repo.insert_if_absent(year, p, created_at).await? {
                        inserted += 1;
                    }
                }
                tx.commit().await?;
                Ok((inserted, staged.len() - inserted))
            }
            Err(e) => Err(e),
        }
    }

    async fn insert_predictions(&self, staged: &[NewPrediction], created_at: NaiveDateTime) -> Result<usize> {
        let year = self.config.league_year;
        let mut tx = self.pool.begin().await?;
        let mut repo = PredictionRepo::new(&mut tx);
        for p in staged {
            repo.insert(year, p, created_at).await?;
        }
        tx.commit().await?;
        Ok(staged.len())
    }

    /// Copy final scores onto predictions, then grade each scored prediction
    /// exactly once.
    pub async fn settle(&self) -> Result<SettleSummary> {
        let year = self.config.league_year;
        let mut summary = SettleSummary::default();
        let mut tx = self.pool.begin().await?;

        let unscored = PredictionRepo::new(&mut tx).missing_scores(year).await?;
        for p in unscored {
            let schedule = match p.game_id {
                Some(id) => ScheduleRepo::new(&mut tx).get(id).await?,
                None => ScheduleRepo::new(&mut tx).find(year, &p.identity()?).await?,
            };
            if let Some((home, away)) = schedule.as_ref().and_then(|s| s.final_score()) {
                PredictionRepo::new(&mut tx).set_scores(p.id, home, away).await?;
                summary.scored += 1;
            }
        }

        let ungraded = PredictionRepo::new(&mut tx).ungraded(year).await?;
        for p in ungraded {
            let (Some(home), Some(away)) = (p.home_team_score, p.away_team_score) else {
                continue;
            };
            let result = grade(home, away, p.line, p.prediction);
            if !PredictionRepo::new(&mut tx).set_bet_result(p.id, result).await? {
                continue;
            }
            info!(
                game = %p.identity()?,
                score = %format!("{home}-{away}"),
                prediction = p.prediction,
                line = p.line,
                probability = p.probability,
                result = %result,
                "Prediction graded"
            );
            match result {
                BetResult::Win => summary.wins += 1,
                BetResult::Loss => summary.losses += 1,
                BetResult::Push => summary.pushes += 1,
            }
        }
        tx.commit().await?;

        info!(
            scored = summary.scored,
            graded = summary.graded(),
            wins = summary.wins,
            losses = summary.losses,
            pushes = summary.pushes,
            "Predictions settled"
        );
        Ok(summary)
    }
}

/// Run a write step, and run it once more if it lost a unique-key race with
/// another cycle. The step must be its own transaction.
async fn retry_on_conflict<T, F, Fut>(step: &str, mut attempt: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    match attempt().await {
        Err(e) if e.is_unique_violation() => {
            warn!(step, "Write raced another run, retrying: {e}");
            attempt().await
        }
        other => other,
    }
}

/// Schedule row for a game: exact identity first, then the same matchup on
/// the same day, else a new row. Returns the id and whether it was created.
async fn link_schedule(conn: &mut SqliteConnection, year: i32, game: &GameIdentity) -> Result<(i64, bool)> {
    let mut schedule = ScheduleRepo::new(conn);
    if let Some(row) = schedule.find(year, game).await? {
        return Ok((row.id, false));
    }
    let date = game.start_time.date();
    if let Some(row) = schedule
        .find_same_day(year, game.home_team, game.away_team, date)
        .await?
    {
        return Ok((row.id, false));
    }
    Ok((schedule.insert(year, game).await?, true))
}

use chrono::NaiveDateTime;
use sqlx::SqliteConnection;

#[cfg(test)]
use crate::db::models::PredictionAudit;
use crate::db::models::PredictionRow;
use crate::error::Result;
use crate::types::{BetResult, NewPrediction};
#[cfg(test)]
use crate::types::GameIdentity;

const INSERT: &str = r#"
    INSERT INTO predictions (
        league_year, home_team, away_team, start_time,
        prediction, line, probability, probability_function,
        odds_id, game_id, created_at
    ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
"#;

pub struct PredictionRepo<'c> {
    conn: &'c mut SqliteConnection,
}

impl<'c> PredictionRepo<'c> {
    pub fn new(conn: &'c mut SqliteConnection) -> Self {
        Self { conn }
    }

    /// Plain insert. Fails with a unique violation if the game already has
    /// a prediction.
    pub async fn insert(
        &mut self,
        league_year: i32,
        p: &NewPrediction,
        created_at: NaiveDateTime,
    ) -> Result<i64> {
        let id = bind_new(sqlx::query(INSERT), league_year, p, created_at)
            .execute(&mut *self.conn)
            .await?
            .last_insert_rowid();
        Ok(id)
    }

    /// Insert unless the game already has a prediction. Returns whether a row
    /// was written.
    pub async fn insert_if_absent(
        &mut self,
        league_year: i32,
        p: &NewPrediction,
        created_at: NaiveDateTime,
    ) -> Result<bool> {
        let sql = format!("{INSERT} ON CONFLICT DO NOTHING");
        let done = bind_new(sqlx::query(&sql), league_year, p, created_at)
            .execute(&mut *self.conn)
            .await?;
        Ok(done.rows_affected() == 1)
    }

    #[cfg(test)]
    pub async fn find(&mut self, league_year: i32, game: &GameIdentity) -> Result<Option<PredictionRow>> {
        let row = sqlx::query_as::<_, PredictionRow>(
            r#"
            SELECT * FROM predictions
            WHERE league_year = ? AND home_team = ? AND away_team = ? AND start_time = ?
            "#,
        )
        .bind(league_year)
        .bind(game.home_team.name())
        .bind(game.away_team.name())
        .bind(game.start_time)
        .fetch_optional(&mut *self.conn)
        .await?;
        Ok(row)
    }

    #[cfg(test)]
    pub async fn audit(&mut self, id: i64) -> Result<PredictionAudit> {
        let row = sqlx::query_as::<_, PredictionAudit>("SELECT * FROM predictions WHERE id = ?")
            .bind(id)
            .fetch_one(&mut *self.conn)
            .await?;
        Ok(row)
    }

    /// Ungraded predictions still waiting on a final score. Zero counts as
    /// no score.
    pub async fn missing_scores(&mut self, league_year: i32) -> Result<Vec<PredictionRow>> {
        let rows = sqlx::query_as::<_, PredictionRow>(
            r#"
            SELECT * FROM predictions
            WHERE league_year = ? AND bet_result IS NULL
              AND (home_team_score IS NULL OR away_team_score IS NULL
                   OR home_team_score = 0 OR away_team_score = 0)
            ORDER BY start_time, id
            "#,
        )
        .bind(league_year)
        .fetch_all(&mut *self.conn)
        .await?;
        Ok(rows)
    }

    pub async fn set_scores(&mut self, id: i64, home_score: i64, away_score: i64) -> Result<()> {
        sqlx::query(
            "UPDATE predictions SET home_team_score = ?, away_team_score = ? WHERE id = ?",
        )
        .bind(home_score)
        .bind(away_score)
        .bind(id)
        .execute(&mut *self.conn)
        .await?;
        Ok(())
    }

    /// Scored predictions with no bet result yet.
    pub async fn ungraded(&mut self, league_year: i32) -> Result<Vec<PredictionRow>> {
        let rows = sqlx::query_as::<_, PredictionRow>(
            r#"
            SELECT * FROM predictions
            WHERE league_year = ? AND bet_result IS NULL
              AND home_team_score > 0 AND away_team_score > 0
            ORDER BY start_time, id
            "#,
        )
        .bind(league_year)
        .fetch_all(&mut *self.conn)
        .await?;
        Ok(rows)
    }

    /// Record a result. A graded prediction is never regraded; returns false
    /// if the row already had one.
    pub async fn set_bet_result(&mut self, id: i64, result: BetResult) -> Result<bool> {
        let done = sqlx::query(
            "UPDATE predictions SET bet_result = ? WHERE id = ? AND bet_result IS NULL",
        )
        .bind(result.to_string())
        .bind(id)
        .execute(&mut *self.conn)
        .await?;
        Ok(done.rows_affected() == 1)
    }
}

fn bind_new<'q>(
    q: sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>>,
    league_year: i32,
    p: &NewPrediction,
    created_at: NaiveDateTime,
) -> sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>> {
    q.bind(league_year)
        .bind(p.game.home_team.name())
        .bind(p.game.away_team.name())
        .bind(p.game.start_time)
        .bind(p.prediction)
        .bind(p.line)
        .bind(p.probability)
        .bind(p.function.map(|f| f.to_string()))
        .bind(p.odds_id)
        .bind(p.game_id)
        .bind(created_at)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::db::{memory_pool, OddsRepo};
    use crate::teams::Team;
    use crate::types::{OddsRecord, ProbabilityFunction};

    fn at(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, day)
            .unwrap()
            .and_hms_opt(hour, 30, 0)
            .unwrap()
    }

    async fn staged(conn: &mut SqliteConnection) -> NewPrediction {
        let game = GameIdentity {
            home_team: Team::LosAngelesLakers,
            away_team: Team::BostonCeltics,
            start_time: at(26, 19),
        };
        let odds_id = OddsRepo::new(conn)
            .upsert(
                2025,
                &OddsRecord {
                    game,
                    spread: Some(-4.5),
                    home_spread_price: Some(-110),
                    away_spread_price: Some(-110),
                    home_moneyline: None,
                    away_moneyline: None,
                    scrape_time: at(25, 9),
                },
                None,
            )
            .await
            .unwrap();
        NewPrediction {
            game,
            prediction: 6.0,
            line: -4.5,
            probability: 0.44,
            function: Some(ProbabilityFunction::Cdf),
            odds_id,
            game_id: None,
        }
    }

    #[tokio::test]
    async fn second_insert_for_a_game_is_rejected() {
        let pool = memory_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        let p = staged(&mut conn).await;
        let mut repo = PredictionRepo::new(&mut conn);

        repo.insert(2025, &p, at(25, 10)).await.unwrap();
        let err = repo.insert(2025, &p, at(25, 11)).await.unwrap_err();
        assert!(err.is_unique_violation());
        assert!(!repo.insert_if_absent(2025, &p, at(25, 11)).await.unwrap());

        let row = repo.find(2025, &p.game).await.unwrap().unwrap();
        let audit = repo.audit(row.id).await.unwrap();
        assert_eq!(audit.created_at, at(25, 10));
        assert_eq!(audit.odds_id, Some(p.odds_id));
        assert_eq!(audit.probability_function().unwrap(), Some(ProbabilityFunction::Cdf));
    }

    #[tokio::test]
    async fn bet_result_is_written_once() {
        let pool = memory_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        let p = staged(&mut conn).await;
        let mut repo = PredictionRepo::new(&mut conn);

        let id = repo.insert(2025, &p, at(25, 10)).await.unwrap();
        assert_eq!(repo.missing_scores(2025).await.unwrap().len(), 1);
        assert!(repo.ungraded(2025).await.unwrap().is_empty());

        repo.set_scores(id, 100, 95).await.unwrap();
        assert!(repo.missing_scores(2025).await.unwrap().is_empty());
        assert_eq!(repo.ungraded(2025).await.unwrap().len(), 1);

        assert!(repo.set_bet_result(id, BetResult::Win).await.unwrap());
        assert!(!repo.set_bet_result(id, BetResult::Loss).await.unwrap());
        assert!(repo.ungraded(2025).await.unwrap().is_empty());

        let audit = repo.audit(id).await.unwrap();
        assert_eq!(audit.bet_result().unwrap(), Some(BetResult::Win));
    }

    #[tokio::test]
    async fn zero_scores_stay_in_the_missing_set() {
        let pool = memory_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        let p = staged(&mut conn).await;
        let mut repo = PredictionRepo::new(&mut conn);

        let id = repo.insert(2025, &p, at(25, 10)).await.unwrap();
        repo.set_scores(id, 0, 0).await.unwrap();
        assert_eq!(repo.missing_scores(2025).await.unwrap().len(), 1);
        assert!(repo.ungraded(2025).await.unwrap().is_empty());
    }
}

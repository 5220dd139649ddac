use sqlx::SqliteConnection;

use crate::db::models::OddsRow;
use crate::error::Result;
#[cfg(test)]
use crate::types::GameIdentity;
use crate::types::OddsRecord;

pub struct OddsRepo<'c> {
    conn: &'c mut SqliteConnection,
}

impl<'c> OddsRepo<'c> {
    pub fn new(conn: &'c mut SqliteConnection) -> Self {
        Self { conn }
    }

    /// Write the latest line for a game. A re-scrape overwrites the stored
    /// prices in place, so the row id stays the same across scrapes.
    pub async fn upsert(
        &mut self,
        league_year: i32,
        record: &OddsRecord,
        game_id: Option<i64>,
    ) -> Result<i64> {
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO odds (
                league_year, home_team, away_team, start_time,
                spread, home_spread_price, away_spread_price,
                home_moneyline, away_moneyline, scrape_time, game_id
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (league_year, home_team, away_team, start_time) DO UPDATE SET
                spread            = excluded.spread,
                home_spread_price = excluded.home_spread_price,
                away_spread_price = excluded.away_spread_price,
                home_moneyline    = excluded.home_moneyline,
                away_moneyline    = excluded.away_moneyline,
                scrape_time       = excluded.scrape_time,
                game_id           = COALESCE(excluded.game_id, odds.game_id)
            RETURNING id
            "#,
        )
        .bind(league_year)
        .bind(record.game.home_team.name())
        .bind(record.game.away_team.name())
        .bind(record.game.start_time)
        .bind(record.spread)
        .bind(record.home_spread_price)
        .bind(record.away_spread_price)
        .bind(record.home_moneyline)
        .bind(record.away_moneyline)
        .bind(record.scrape_time)
        .bind(game_id)
        .fetch_one(&mut *self.conn)
        .await?;
        Ok(id)
    }

    #[cfg(test)]
    pub async fn find(&mut self, league_year: i32, game: &GameIdentity) -> Result<Option<OddsRow>> {
        let row = sqlx::query_as::<_, OddsRow>(
            r#"
            SELECT * FROM odds
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

    /// Odds with a posted spread that no prediction has been made for yet.
    pub async fn awaiting_prediction(&mut self, league_year: i32) -> Result<Vec<OddsRow>> {
        let rows = sqlx::query_as::<_, OddsRow>(
            r#"
            SELECT o.* FROM odds o
            LEFT JOIN predictions p
                ON  p.league_year = o.league_year
                AND p.home_team   = o.home_team
                AND p.away_team   = o.away_team
                AND p.start_time  = o.start_time
            WHERE o.league_year = ? AND o.spread IS NOT NULL AND p.id IS NULL
            ORDER BY o.start_time, o.id
            "#,
        )
        .bind(league_year)
        .fetch_all(&mut *self.conn)
        .await?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::db::memory_pool;
    use crate::teams::Team;

    fn record(spread: Option<f64>) -> OddsRecord {
        let t = NaiveDate::from_ymd_opt(2025, 3, 26)
            .unwrap()
            .and_hms_opt(19, 30, 0)
            .unwrap();
        OddsRecord {
            game: GameIdentity {
                home_team: Team::LosAngelesLakers,
                away_team: Team::BostonCeltics,
                start_time: t,
            },
            spread,
            home_spread_price: Some(-110),
            away_spread_price: Some(-110),
            home_moneyline: Some(-180),
            away_moneyline: Some(150),
            scrape_time: t,
        }
    }

    #[tokio::test]
    async fn rescrape_updates_in_place() {
        let pool = memory_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = OddsRepo::new(&mut conn);

        let first = repo.upsert(2025, &record(Some(-4.5)), None).await.unwrap();
        let second = repo.upsert(2025, &record(Some(-5.5)), None).await.unwrap();
        assert_eq!(first, second);

        let row = repo.find(2025, &record(None).game).await.unwrap().unwrap();
        assert_eq!(row.spread, Some(-5.5));
        assert_eq!(row.identity().unwrap(), record(None).game);

        let (count, moneyline): (i64, Option<i64>) =
            sqlx::query_as("SELECT COUNT(*), MAX(home_moneyline) FROM odds")
                .fetch_one(&mut *conn)
                .await
                .unwrap();
        assert_eq!((count, moneyline), (1, Some(-180)));
    }

    #[tokio::test]
    async fn lines_without_a_spread_are_not_awaiting_prediction() {
        let pool = memory_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = OddsRepo::new(&mut conn);

        repo.upsert(2025, &record(None), None).await.unwrap();
        assert!(repo.awaiting_prediction(2025).await.unwrap().is_empty());

        repo.upsert(2025, &record(Some(-4.5)), None).await.unwrap();
        assert_eq!(repo.awaiting_prediction(2025).await.unwrap().len(), 1);
        assert!(repo.awaiting_prediction(2024).await.unwrap().is_empty());
    }
}

use chrono::{NaiveDate, NaiveDateTime};
use sqlx::SqliteConnection;

use crate::db::models::ScheduleRow;
use crate::error::Result;
use crate::teams::Team;
use crate::types::GameIdentity;

pub struct ScheduleRepo<'c> {
    conn: &'c mut SqliteConnection,
}

impl<'c> ScheduleRepo<'c> {
    pub fn new(conn: &'c mut SqliteConnection) -> Self {
        Self { conn }
    }

    pub async fn get(&mut self, id: i64) -> Result<Option<ScheduleRow>> {
        let row = sqlx::query_as::<_, ScheduleRow>("SELECT * FROM schedule WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *self.conn)
            .await?;
        Ok(row)
    }

    pub async fn find(&mut self, league_year: i32, game: &GameIdentity) -> Result<Option<ScheduleRow>> {
        let row = sqlx::query_as::<_, ScheduleRow>(
            r#"
            SELECT * FROM schedule
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

    /// Same matchup on the same calendar day, for feeds whose tip-off time
    /// drifts from the published schedule.
    pub async fn find_same_day(
        &mut self,
        league_year: i32,
        home_team: Team,
        away_team: Team,
        date: NaiveDate,
    ) -> Result<Option<ScheduleRow>> {
        let row = sqlx::query_as::<_, ScheduleRow>(
            r#"
            SELECT * FROM schedule
            WHERE league_year = ? AND home_team = ? AND away_team = ? AND date(start_time) = ?
            ORDER BY start_time
            LIMIT 1
            "#,
        )
        .bind(league_year)
        .bind(home_team.name())
        .bind(away_team.name())
        .bind(date.format("%Y-%m-%d").to_string())
        .fetch_optional(&mut *self.conn)
        .await?;
        Ok(row)
    }

    pub async fn insert(&mut self, league_year: i32, game: &GameIdentity) -> Result<i64> {
        let id = sqlx::query(
            r#"
            INSERT INTO schedule (league_year, start_time, home_team, away_team)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(league_year)
        .bind(game.start_time)
        .bind(game.home_team.name())
        .bind(game.away_team.name())
        .execute(&mut *self.conn)
        .await?
        .last_insert_rowid();
        Ok(id)
    }

    /// Move a game to its published tip-off time and record any known
    /// scores. Used when the row was first created from the odds feed.
    pub async fn reschedule(
        &mut self,
        id: i64,
        start_time: NaiveDateTime,
        home_score: Option<i64>,
        away_score: Option<i64>,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE schedule SET
                start_time      = ?,
                home_team_score = COALESCE(?, home_team_score),
                away_team_score = COALESCE(?, away_team_score)
            WHERE id = ?
            "#,
        )
        .bind(start_time)
        .bind(home_score)
        .bind(away_score)
        .bind(id)
        .execute(&mut *self.conn)
        .await?;
        Ok(())
    }

    /// Insert or refresh a game. Known scores are never replaced by nulls.
    pub async fn upsert(
        &mut self,
        league_year: i32,
        game: &GameIdentity,
        home_score: Option<i64>,
        away_score: Option<i64>,
    ) -> Result<i64> {
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO schedule (league_year, start_time, home_team, away_team,
                                  home_team_score, away_team_score)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT (league_year, home_team, away_team, start_time) DO UPDATE SET
                home_team_score = COALESCE(excluded.home_team_score, schedule.home_team_score),
                away_team_score = COALESCE(excluded.away_team_score, schedule.away_team_score)
            RETURNING id
            "#,
        )
        .bind(league_year)
        .bind(game.start_time)
        .bind(game.home_team.name())
        .bind(game.away_team.name())
        .bind(home_score)
        .bind(away_score)
        .fetch_one(&mut *self.conn)
        .await?;
        Ok(id)
    }
}

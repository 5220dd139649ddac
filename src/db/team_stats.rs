use chrono::NaiveDateTime;
use sqlx::SqliteConnection;

use crate::db::models::TeamStatsRow;
use crate::error::Result;
use crate::teams::Team;
use crate::types::TeamStats;

pub struct TeamStatsRepo<'c> {
    conn: &'c mut SqliteConnection,
}

impl<'c> TeamStatsRepo<'c> {
    pub fn new(conn: &'c mut SqliteConnection) -> Self {
        Self { conn }
    }

    pub async fn insert(&mut self, league_year: i32, stats: &TeamStats) -> Result<()> {
        let f = &stats.factors;
        sqlx::query(
            r#"
            INSERT INTO team_stats (
                league_year, team_name,
                efg_pct, tov_pct, orb_pct, ft_rate,
                opp_efg_pct, opp_tov_pct, drb_pct, opp_ft_rate,
                scrape_time
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(league_year)
        .bind(stats.team.name())
        .bind(f.efg_pct)
        .bind(f.tov_pct)
        .bind(f.orb_pct)
        .bind(f.ft_rate)
        .bind(f.opp_efg_pct)
        .bind(f.opp_tov_pct)
        .bind(f.drb_pct)
        .bind(f.opp_ft_rate)
        .bind(stats.scrape_time)
        .execute(&mut *self.conn)
        .await?;
        Ok(())
    }

    /// Most recent snapshot for a team, if any.
    pub async fn latest(&mut self, league_year: i32, team: Team) -> Result<Option<TeamStats>> {
        let row = sqlx::query_as::<_, TeamStatsRow>(
            r#"
            SELECT * FROM team_stats
            WHERE league_year = ? AND team_name = ?
            ORDER BY scrape_time DESC, id DESC
            LIMIT 1
            "#,
        )
        .bind(league_year)
        .bind(team.name())
        .fetch_optional(&mut *self.conn)
        .await?;
        row.map(TeamStats::try_from).transpose()
    }

    pub async fn last_scrape_time(&mut self, league_year: i32) -> Result<Option<NaiveDateTime>> {
        let t = sqlx::query_scalar::<_, NaiveDateTime>(
            r#"
            SELECT scrape_time FROM team_stats
            WHERE league_year = ?
            ORDER BY scrape_time DESC
            LIMIT 1
            "#,
        )
        .bind(league_year)
        .fetch_optional(&mut *self.conn)
        .await?;
        Ok(t)
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::db::memory_pool;
    use crate::types::FourFactors;

    fn snapshot(team: Team, day: u32, efg: f64) -> TeamStats {
        TeamStats {
            team,
            factors: FourFactors {
                efg_pct: efg,
                tov_pct: 0.12,
                orb_pct: 0.25,
                ft_rate: 0.2,
                opp_efg_pct: 0.52,
                opp_tov_pct: 0.13,
                drb_pct: 0.75,
                opp_ft_rate: 0.19,
            },
            scrape_time: NaiveDate::from_ymd_opt(2025, 3, day)
                .unwrap()
                .and_hms_opt(9, 0, 0)
                .unwrap(),
        }
    }

    #[tokio::test]
    async fn latest_snapshot_wins() {
        let pool = memory_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = TeamStatsRepo::new(&mut conn);

        assert!(repo.latest(2025, Team::MiamiHeat).await.unwrap().is_none());
        assert!(repo.last_scrape_time(2025).await.unwrap().is_none());

        repo.insert(2025, &snapshot(Team::MiamiHeat, 24, 0.51)).await.unwrap();
        repo.insert(2025, &snapshot(Team::MiamiHeat, 25, 0.53)).await.unwrap();

        let latest = repo.latest(2025, Team::MiamiHeat).await.unwrap().unwrap();
        assert_eq!(latest, snapshot(Team::MiamiHeat, 25, 0.53));
        assert_eq!(
            repo.last_scrape_time(2025).await.unwrap(),
            Some(snapshot(Team::MiamiHeat, 25, 0.0).scrape_time)
        );
    }
}

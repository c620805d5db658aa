use std::str::FromStr;

use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Pool, Sqlite,
};
use tracing::{debug, info};

use crate::models::{Fixture, Pairing, Participant, Slot};

/// SQLite tip sheet of one league: roster, fixtures, pairings and tips.
///
/// The sheet owns its connection pool. Call [`TipSheet::close`] when done.
pub struct TipSheet {
    pool: Pool<Sqlite>,
}

/// Database row of a participant
#[derive(sqlx::FromRow)]
struct ParticipantRow {
    slot: i64,
    name: String,
}

/// Database row of a fixture
#[derive(sqlx::FromRow)]
struct FixtureRow {
    position: i64,
    home: String,
    away: String,
}

impl From<ParticipantRow> for Participant {
    fn from(row: ParticipantRow) -> Self {
        Participant::new(row.name.trim(), Slot(row.slot))
    }
}

impl TipSheet {
    /// Open the sheet and make sure the schema exists
    pub async fn open(database_url: &str) -> Result<Self> {
        // Create data directory if needed
        if let Some(path) = database_url.strip_prefix("sqlite:") {
            if let Some(parent) = std::path::Path::new(path).parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)
                        .context("Failed to create tip sheet directory")?;
                }
            }
        }

        let options = SqliteConnectOptions::from_str(database_url)
            .context("Invalid tip sheet URL")?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .context("Failed to open tip sheet")?;

        let sheet = Self { pool };
        sheet.init_schema().await?;

        info!("Tip sheet {} opened", database_url);
        Ok(sheet)
    }

    /// Release the connection pool
    pub async fn close(self) {
        self.pool.close().await;
        info!("Tip sheet closed");
    }

    /// Initialize database schema
    async fn init_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS participants (
                slot INTEGER PRIMARY KEY,
                name TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .context("Failed to create participants table")?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS fixtures (
                matchday INTEGER NOT NULL,
                position INTEGER NOT NULL,
                home TEXT NOT NULL,
                away TEXT NOT NULL,
                home_goals INTEGER,
                away_goals INTEGER,
                PRIMARY KEY (matchday, position)
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .context("Failed to create fixtures table")?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS pairings (
                matchday INTEGER NOT NULL,
                position INTEGER NOT NULL,
                first TEXT NOT NULL,
                second TEXT NOT NULL,
                written_at TEXT NOT NULL,
                PRIMARY KEY (matchday, position)
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .context("Failed to create pairings table")?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS tips (
                matchday INTEGER NOT NULL,
                position INTEGER NOT NULL,
                slot INTEGER NOT NULL,
                home_goals INTEGER NOT NULL,
                away_goals INTEGER NOT NULL,
                written_at TEXT NOT NULL,
                PRIMARY KEY (matchday, position, slot)
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .context("Failed to create tips table")?;

        Ok(())
    }

    /// Add or rename the participant in a slot
    pub async fn insert_participant(&self, name: &str, slot: Slot) -> Result<()> {
        sqlx::query("INSERT OR REPLACE INTO participants (slot, name) VALUES (?, ?)")
            .bind(slot.0)
            .bind(name)
            .execute(&self.pool)
            .await
            .context("Failed to insert participant")?;

        Ok(())
    }

    /// Add a fixture, with its result if already played
    pub async fn insert_fixture(
        &self,
        matchday: i64,
        position: i64,
        fixture: &Fixture,
        result: Option<(u32, u32)>,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT OR REPLACE INTO fixtures (matchday, position, home, away, home_goals, away_goals)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(matchday)
        .bind(position)
        .bind(&fixture.home)
        .bind(&fixture.away)
        .bind(result.map(|(home, _)| home as i64))
        .bind(result.map(|(_, away)| away as i64))
        .execute(&self.pool)
        .await
        .context("Failed to insert fixture")?;

        Ok(())
    }

    /// Participants in slot order, blank names skipped
    pub async fn read_participants(&self) -> Result<Vec<Participant>> {
        info!("Reading participants...");

        let rows = sqlx::query_as::<_, ParticipantRow>(
            r#"
            SELECT slot, name FROM participants
            WHERE TRIM(name) <> ''
            ORDER BY slot
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to read participants")?;

        for row in &rows {
            debug!("Participant found: {} (slot {})", row.name, row.slot);
        }

        Ok(rows.into_iter().map(Participant::from).collect())
    }

    /// Lowest matchday without any result yet
    pub async fn next_matchday(&self) -> Result<Option<i64>> {
        let row: Option<(i64,)> = sqlx::query_as(
            r#"
            SELECT matchday FROM fixtures
            GROUP BY matchday
            HAVING COUNT(home_goals) = 0
            ORDER BY matchday
            LIMIT 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await
        .context("Failed to find next matchday")?;

        Ok(row.map(|r| r.0))
    }

    /// Fixtures of a matchday in sheet order
    pub async fn read_fixtures(&self, matchday: i64) -> Result<Vec<Fixture>> {
        Ok(self
            .fixture_rows(matchday)
            .await?
            .into_iter()
            .map(|row| Fixture::new(row.home, row.away))
            .collect())
    }

    async fn fixture_rows(&self, matchday: i64) -> Result<Vec<FixtureRow>> {
        sqlx::query_as::<_, FixtureRow>(
            r#"
            SELECT position, home, away FROM fixtures
            WHERE matchday = ?
            ORDER BY position
            "#,
        )
        .bind(matchday)
        .fetch_all(&self.pool)
        .await
        .context("Failed to read fixtures")
    }

    /// Replace the pairings of a matchday, returns rows written
    pub async fn write_pairings(&self, matchday: i64, pairings: &[Pairing]) -> Result<usize> {
        info!("Writing {} pairings...", pairings.len());

        let written_at = Utc::now().to_rfc3339();
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM pairings WHERE matchday = ?")
            .bind(matchday)
            .execute(&mut *tx)
            .await
            .context("Failed to clear pairings")?;

        for (position, pairing) in pairings.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO pairings (matchday, position, first, second, written_at)
                VALUES (?, ?, ?, ?, ?)
                "#,
            )
            .bind(matchday)
            .bind(position as i64)
            .bind(&pairing.first)
            .bind(&pairing.second)
            .bind(&written_at)
            .execute(&mut *tx)
            .await
            .context("Failed to write pairing")?;
        }

        tx.commit().await.context("Failed to commit pairings")?;
        Ok(pairings.len())
    }

    /// Read back the pairings of a matchday
    pub async fn read_pairings(&self, matchday: i64) -> Result<Vec<Pairing>> {
        let rows: Vec<(String, String)> = sqlx::query_as(
            r#"
            SELECT first, second FROM pairings
            WHERE matchday = ?
            ORDER BY position
            "#,
        )
        .bind(matchday)
        .fetch_all(&self.pool)
        .await
        .context("Failed to read pairings")?;

        Ok(rows
            .into_iter()
            .map(|(first, second)| Pairing::new(first, second))
            .collect())
    }

    /// Write every participant's tips into the fixture rows they belong to
    pub async fn write_tips(&self, matchday: i64, participants: &[Participant]) -> Result<usize> {
        let fixtures = self.fixture_rows(matchday).await?;
        let written_at = Utc::now().to_rfc3339();
        let mut written = 0;

        let mut tx = self.pool.begin().await?;

        for fixture in &fixtures {
            for participant in participants {
                let Some(tip) = participant.tip_for(&fixture.home, &fixture.away) else {
                    continue;
                };

                debug!(
                    "Writing tip [{}, {}] for {}: {}:{}",
                    fixture.position,
                    participant.slot.0,
                    participant.name,
                    tip.home_goals,
                    tip.away_goals
                );

                sqlx::query(
                    r#"
                    INSERT OR REPLACE INTO tips
                        (matchday, position, slot, home_goals, away_goals, written_at)
                    VALUES (?, ?, ?, ?, ?, ?)
                    "#,
                )
                .bind(matchday)
                .bind(fixture.position)
                .bind(participant.slot.0)
                .bind(tip.home_goals as i64)
                .bind(tip.away_goals as i64)
                .bind(&written_at)
                .execute(&mut *tx)
                .await
                .context("Failed to write tip")?;

                written += 1;
            }
        }

        tx.commit().await.context("Failed to commit tips")?;

        info!("{} tips written", written);
        Ok(written)
    }

    /// Tips stored for one participant, in fixture order
    pub async fn read_tips(&self, matchday: i64, slot: Slot) -> Result<Vec<(i64, u32, u32)>> {
        let rows: Vec<(i64, i64, i64)> = sqlx::query_as(
            r#"
            SELECT position, home_goals, away_goals FROM tips
            WHERE matchday = ? AND slot = ?
            ORDER BY position
            "#,
        )
        .bind(matchday)
        .bind(slot.0)
        .fetch_all(&self.pool)
        .await
        .context("Failed to read tips")?;

        rows.into_iter()
            .map(|(position, home, away)| {
                let home = u32::try_from(home)
                    .with_context(|| format!("Invalid home goals {} at {}", home, position))?;
                let away = u32::try_from(away)
                    .with_context(|| format!("Invalid away goals {} at {}", away, position))?;
                Ok::<_, anyhow::Error>((position, home, away))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Tip;

    async fn sheet_in(dir: &tempfile::TempDir) -> TipSheet {
        let url = format!("sqlite:{}", dir.path().join("sheet.db").display());
        TipSheet::open(&url).await.unwrap()
    }

    async fn seed(sheet: &TipSheet) {
        sheet.insert_participant("Alice", Slot(12)).await.unwrap();
        sheet.insert_participant("Bob", Slot(15)).await.unwrap();
        sheet.insert_participant("  ", Slot(18)).await.unwrap();

        let played = [("Bayern", "Dortmund", Some((1, 0))), ("Schalke", "Leipzig", None)];
        for (i, (home, away, result)) in played.iter().enumerate() {
            sheet
                .insert_fixture(1, i as i64, &Fixture::new(*home, *away), *result)
                .await
                .unwrap();
        }

        let open = [("Leipzig", "Bayern"), ("Dortmund", "Schalke")];
        for day in [2, 3] {
            for (i, (home, away)) in open.iter().enumerate() {
                sheet
                    .insert_fixture(day, i as i64, &Fixture::new(*home, *away), None)
                    .await
                    .unwrap();
            }
        }
    }

    #[tokio::test]
    async fn test_read_participants_skips_blank_slots() {
        let dir = tempfile::tempdir().unwrap();
        let sheet = sheet_in(&dir).await;
        seed(&sheet).await;

        let participants = sheet.read_participants().await.unwrap();

        let names: Vec<&str> = participants.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Alice", "Bob"]);
        assert_eq!(participants[1].slot, Slot(15));
        sheet.close().await;
    }

    #[tokio::test]
    async fn test_next_matchday_is_first_without_results() {
        let dir = tempfile::tempdir().unwrap();
        let sheet = sheet_in(&dir).await;
        seed(&sheet).await;

        assert_eq!(sheet.next_matchday().await.unwrap(), Some(2));
        assert_eq!(
            sheet.read_fixtures(2).await.unwrap(),
            vec![
                Fixture::new("Leipzig", "Bayern"),
                Fixture::new("Dortmund", "Schalke")
            ]
        );
        sheet.close().await;
    }

    #[tokio::test]
    async fn test_empty_sheet_has_no_next_matchday() {
        let dir = tempfile::tempdir().unwrap();
        let sheet = sheet_in(&dir).await;

        assert_eq!(sheet.next_matchday().await.unwrap(), None);
        sheet.close().await;
    }

    #[tokio::test]
    async fn test_write_pairings_replaces_previous() {
        let dir = tempfile::tempdir().unwrap();
        let sheet = sheet_in(&dir).await;
        seed(&sheet).await;

        sheet
            .write_pairings(2, &[Pairing::new("Bob", "Alice")])
            .await
            .unwrap();
        let written = sheet
            .write_pairings(2, &[Pairing::new("Alice", "Bob")])
            .await
            .unwrap();

        assert_eq!(written, 1);
        let pairings = sheet.read_pairings(2).await.unwrap();
        assert_eq!(pairings.len(), 1);
        assert_eq!(pairings[0].first, "Alice");
        sheet.close().await;
    }

    #[tokio::test]
    async fn test_write_tips_by_fixture_and_slot() {
        let dir = tempfile::tempdir().unwrap();
        let sheet = sheet_in(&dir).await;
        seed(&sheet).await;

        let mut participants = sheet.read_participants().await.unwrap();
        participants[0].tips = vec![
            Tip {
                fixture: Fixture::new("Dortmund", "Schalke"),
                home_goals: 2,
                away_goals: 2,
            },
            Tip {
                fixture: Fixture::new("Leipzig", "Bayern"),
                home_goals: 0,
                away_goals: 3,
            },
        ];

        let written = sheet.write_tips(2, &participants).await.unwrap();

        assert_eq!(written, 2);
        assert_eq!(
            sheet.read_tips(2, Slot(12)).await.unwrap(),
            vec![(0, 0, 3), (1, 2, 2)]
        );
        assert!(sheet.read_tips(2, Slot(15)).await.unwrap().is_empty());
        sheet.close().await;
    }

    #[tokio::test]
    async fn test_read_tips_rejects_negative_goals() {
        let dir = tempfile::tempdir().unwrap();
        let sheet = sheet_in(&dir).await;

        sqlx::query(
            "INSERT INTO tips (matchday, position, slot, home_goals, away_goals, written_at) \
             VALUES (1, 0, 12, -1, 2, 'now')",
        )
        .execute(&sheet.pool)
        .await
        .unwrap();

        assert!(sheet.read_tips(1, Slot(12)).await.is_err());
        sheet.close().await;
    }
}

use std::env;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use matchday_tips::db::TipSheet;
use matchday_tips::models::{Fixture, Slot};

/// Sheet description as exported from the league spreadsheet
#[derive(Debug, Deserialize)]
struct SheetFile {
    participants: Vec<ParticipantEntry>,
    matchdays: Vec<MatchdayEntry>,
}

#[derive(Debug, Deserialize)]
struct ParticipantEntry {
    name: String,
    slot: i64,
}

#[derive(Debug, Deserialize)]
struct MatchdayEntry {
    number: i64,
    fixtures: Vec<FixtureEntry>,
}

#[derive(Debug, Deserialize)]
struct FixtureEntry {
    home: String,
    away: String,
    /// Final score once played
    #[serde(default)]
    result: Option<(u32, u32)>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "import_sheet=info,matchday_tips=info,warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        anyhow::bail!("usage: {} <sheet.json> <sheet.db>", args[0]);
    }

    let content = std::fs::read_to_string(Path::new(&args[1]))
        .with_context(|| format!("Failed to read {}", args[1]))?;
    let sheet_file: SheetFile =
        serde_json::from_str(&content).context("Failed to parse sheet JSON")?;

    let sheet = TipSheet::open(&format!("sqlite:{}", args[2])).await?;
    let result = import(&sheet, &sheet_file).await;
    sheet.close().await;
    result
}

async fn import(sheet: &TipSheet, sheet_file: &SheetFile) -> Result<()> {
    for entry in &sheet_file.participants {
        sheet.insert_participant(&entry.name, Slot(entry.slot)).await?;
    }
    info!("Imported {} participants", sheet_file.participants.len());

    let mut fixture_count = 0;
    for matchday in &sheet_file.matchdays {
        for (position, entry) in matchday.fixtures.iter().enumerate() {
            let fixture = Fixture::new(entry.home.as_str(), entry.away.as_str());
            sheet
                .insert_fixture(matchday.number, position as i64, &fixture, entry.result)
                .await?;
            fixture_count += 1;
        }
    }
    info!(
        "Imported {} fixtures on {} matchdays",
        fixture_count,
        sheet_file.matchdays.len()
    );

    Ok(())
}

use std::io::Write;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::config::LeagueSettings;
use crate::db::TipSheet;
use crate::forum::ForumClient;
use crate::matching::{PairingError, PairingResolver, ScoreStrategyKind, TipExtractor, TipReport};
use crate::models::{Fixture, Pairing, Participant, Post, FIXTURES_PER_MATCHDAY};

/// Result of reading one matchday thread
#[derive(Debug)]
pub struct ThreadOutcome {
    pub pairings: Result<Vec<Pairing>, PairingError>,
    pub tips: TipReport,
}

/// Worker that reads one league's matchday thread into its tip sheet
pub struct LeagueWorker {
    forum: Arc<ForumClient>,
    score_strategy: ScoreStrategyKind,
}

impl LeagueWorker {
    /// Create a new league worker
    pub fn new(forum: Arc<ForumClient>, score_strategy: ScoreStrategyKind) -> Self {
        Self {
            forum,
            score_strategy,
        }
    }

    /// Process a league; the tip sheet is closed whatever the outcome
    pub async fn run(&self, league: &LeagueSettings) -> Result<()> {
        info!("Parsing {}", league.name);

        let sheet = TipSheet::open(&league.database_url()).await?;
        let result = self.process(league, &sheet).await;
        sheet.close().await;

        result
    }

    async fn process(&self, league: &LeagueSettings, sheet: &TipSheet) -> Result<()> {
        let (participants, thread_url) =
            tokio::join!(sheet.read_participants(), prompt_thread_url(&league.name));
        let mut participants = participants?;

        let Some(thread_url) = thread_url? else {
            info!("No thread URL given, skipping {}", league.name);
            return Ok(());
        };

        let Some(matchday) = sheet.next_matchday().await? else {
            warn!("{} has no open matchday", league.name);
            return Ok(());
        };
        let fixtures = sheet.read_fixtures(matchday).await?;

        if participants.is_empty() || fixtures.is_empty() {
            anyhow::bail!(
                "{} has {} participants and {} fixtures on matchday {}",
                league.name,
                participants.len(),
                fixtures.len(),
                matchday
            );
        }
        if fixtures.len() != FIXTURES_PER_MATCHDAY {
            warn!(
                "Matchday {} has {} fixtures, expected {}",
                matchday,
                fixtures.len(),
                FIXTURES_PER_MATCHDAY
            );
        }

        info!(
            "{} participants found. Using {} to get tips for matchday {}.",
            participants.len(),
            thread_url,
            matchday
        );

        let posts = self.forum.fetch_posts(&thread_url).await?;
        let outcome = read_thread(&posts, &fixtures, &mut participants, self.score_strategy);
        info!("All data parsed");

        match &outcome.pairings {
            Ok(pairings) => {
                sheet.write_pairings(matchday, pairings).await?;
                info!("Pairings written");
            }
            Err(e) => warn!("No pairings written: {}. Insert them manually.", e),
        }

        if outcome.tips.parsed_count() > 0 {
            sheet.write_tips(matchday, &participants).await?;
            info!("Tips written");
        } else {
            warn!("No tips written");
        }

        for name in outcome.tips.did_not_submit() {
            warn!("Enter tips of {} manually if they did tip", name);
        }

        Ok(())
    }
}

/// Run both extraction passes over the same snapshot
pub fn read_thread(
    posts: &[Post],
    fixtures: &[Fixture],
    participants: &mut [Participant],
    score_strategy: ScoreStrategyKind,
) -> ThreadOutcome {
    let pairings = PairingResolver::default().resolve(posts, participants);
    let tips = TipExtractor::new(score_strategy.build()).extract(posts, fixtures, participants);

    ThreadOutcome { pairings, tips }
}

/// Ask the operator for the thread URL; `None` when left empty
async fn prompt_thread_url(league: &str) -> Result<Option<String>> {
    let prompt = format!("URL of the current matchday thread for {}: ", league);

    tokio::task::spawn_blocking(move || -> Result<Option<String>> {
        let mut stdout = std::io::stdout();
        write!(stdout, "{}", prompt)?;
        stdout.flush()?;

        let mut line = String::new();
        std::io::stdin()
            .read_line(&mut line)
            .context("Failed to read thread URL")?;

        let url = line.trim();
        Ok((!url.is_empty()).then(|| url.to_string()))
    })
    .await
    .context("Prompt task failed")?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Slot;

    #[test]
    fn test_read_thread() {
        let fixtures = vec![
            Fixture::new("Bayern", "Dortmund"),
            Fixture::new("Schalke", "Leipzig"),
        ];
        let mut participants = vec![
            Participant::new("Alice", Slot(12)),
            Participant::new("Bob", Slot(15)),
        ];
        let posts = vec![
            Post::new(
                "p1",
                "Admin",
                "Spieltag 2\nAlice (A) : Bob\n\nSa 15:30 Bayern - Dortmund\nSa 18:30 Schalke - Leipzig",
            ),
            Post::new(
                "p2",
                "Bob",
                "Sa 15:30 Bayern - Dortmund 1:1\nSa 18:30 Schalke - Leipzig 2:0",
            ),
            Post::new("p3", "Alice", "Ups, vergessen"),
        ];

        let outcome = read_thread(
            &posts,
            &fixtures,
            &mut participants,
            ScoreStrategyKind::Kickoff,
        );

        assert_eq!(outcome.pairings, Ok(vec![Pairing::new("Alice", "Bob")]));
        assert_eq!(participants[1].tips.len(), 2);
        assert_eq!(participants[1].tips[1].home_goals, 2);
        assert_eq!(outcome.tips.did_not_submit(), vec!["Alice"]);
    }
}

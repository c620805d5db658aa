use std::collections::HashSet;

use tracing::{debug, info, warn};

use crate::matching::{ScoreStrategy, TrailingScore};
use crate::models::{Fixture, Participant, Post, Tip};

/// What happened to a participant during a tip pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TipNotice {
    /// Tips read from the post, one per fixture
    Parsed { participant: String, source_id: String },

    /// A full set was already present, the post was not read
    AlreadyComplete { participant: String, source_id: String },

    /// The post did not yield one tip per fixture; enter them manually
    Incomplete {
        participant: String,
        source_id: String,
        found: usize,
        expected: usize,
    },

    /// Post skipped because an earlier post of the same author failed
    Skipped { participant: String, source_id: String },

    /// No tips at the end of the pass
    DidNotSubmit { participant: String },
}

/// Notices of one tip pass, in the order they happened
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TipReport {
    pub notices: Vec<TipNotice>,
}

impl TipReport {
    /// Participants that need their tips entered by hand
    pub fn did_not_submit(&self) -> Vec<&str> {
        self.notices
            .iter()
            .filter_map(|n| match n {
                TipNotice::DidNotSubmit { participant } => Some(participant.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn parsed_count(&self) -> usize {
        self.notices
            .iter()
            .filter(|n| matches!(n, TipNotice::Parsed { .. }))
            .count()
    }
}

/// Reads participants' tips from their posts
pub struct TipExtractor {
    strategy: Box<dyn ScoreStrategy>,
}

impl TipExtractor {
    pub fn new(strategy: Box<dyn ScoreStrategy>) -> Self {
        Self { strategy }
    }

    /// Fill each participant's tips from their posts.
    ///
    /// A post either yields exactly one tip per fixture or leaves the
    /// participant with no tips at all. Failures never stop the pass.
    pub fn extract(
        &self,
        posts: &[Post],
        fixtures: &[Fixture],
        participants: &mut [Participant],
    ) -> TipReport {
        info!("Parsing tips of {} participants...", participants.len());

        let expected = fixtures.len();
        let mut report = TipReport::default();
        let mut abandoned: HashSet<usize> = HashSet::new();

        for post in posts {
            let Some(index) = participants.iter().position(|p| p.is_named(&post.author)) else {
                continue;
            };
            let participant = &mut participants[index];

            debug!("{} wrote post {}", participant.name, post.source_id);

            if abandoned.contains(&index) {
                debug!(
                    "Skipping post {} of {}, an earlier post failed",
                    post.source_id, participant.name
                );
                report.notices.push(TipNotice::Skipped {
                    participant: participant.name.clone(),
                    source_id: post.source_id.clone(),
                });
                continue;
            }

            if !participant.tips.is_empty() && participant.tips.len() == expected {
                info!(
                    "{} already has {} tips, please check post {}",
                    participant.name, expected, post.source_id
                );
                report.notices.push(TipNotice::AlreadyComplete {
                    participant: participant.name.clone(),
                    source_id: post.source_id.clone(),
                });
                continue;
            }

            participant.tips = post
                .lines()
                .filter_map(|line| self.parse_line(line, fixtures))
                .collect();

            if !covers_every_fixture(&participant.tips, fixtures) {
                warn!(
                    "Tips of {} in post {} could not be read ({} of {}), enter them manually",
                    participant.name,
                    post.source_id,
                    participant.tips.len(),
                    expected
                );
                report.notices.push(TipNotice::Incomplete {
                    participant: participant.name.clone(),
                    source_id: post.source_id.clone(),
                    found: participant.tips.len(),
                    expected,
                });
                participant.tips.clear();
                abandoned.insert(index);
                continue;
            }

            info!("Tips of {} in post {} read", participant.name, post.source_id);
            report.notices.push(TipNotice::Parsed {
                participant: participant.name.clone(),
                source_id: post.source_id.clone(),
            });
        }

        for participant in participants.iter().filter(|p| p.tips.is_empty()) {
            info!("{} obviously did not tip", participant.name);
            report.notices.push(TipNotice::DidNotSubmit {
                participant: participant.name.clone(),
            });
        }

        report
    }

    /// A tip line names exactly one fixture and carries a score
    fn parse_line(&self, line: &str, fixtures: &[Fixture]) -> Option<Tip> {
        let lowered = line.to_lowercase();

        let mut mentioned = fixtures.iter().filter(|f| f.is_mentioned_in(&lowered));
        let fixture = mentioned.next()?;
        if mentioned.next().is_some() {
            debug!("Line names several fixtures: {}", line.trim());
            return None;
        }

        let (home_goals, away_goals) = self.strategy.pick_score(&lowered, fixture)?;

        debug!(
            "Tip {} - {} {}:{}",
            fixture.home, fixture.away, home_goals, away_goals
        );

        Some(Tip {
            fixture: fixture.clone(),
            home_goals,
            away_goals,
        })
    }
}

impl Default for TipExtractor {
    fn default() -> Self {
        Self::new(Box::new(TrailingScore))
    }
}

/// Exactly one tip per fixture, none twice
fn covers_every_fixture(tips: &[Tip], fixtures: &[Fixture]) -> bool {
    if tips.len() != fixtures.len() {
        return false;
    }

    let covered: HashSet<&Fixture> = tips.iter().map(|t| &t.fixture).collect();
    covered.len() == fixtures.len()
}

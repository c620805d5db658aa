use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::Fixture;

/// `Name (A) : Other (N)`, venue markers optional. Not anchored, so list
/// numbering before and comments after a pairing are left alone.
static PAIRING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\S+?)\s*(?:\([AN]\))?\s*:\s+([^\s(]+)(?:\s*\([AN]\))?")
        .expect("pairing regex")
});

/// Kickoff times and scores: `15:30`, `2:1`, `2-1`. No spaces around the
/// separator, otherwise `Schalke 04 - 1. FC Köln` would read as a pair.
static NUMBER_PAIR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([0-9]+)[:\-]([0-9]+)").expect("number pair regex"));

/// Reads the participant token pairs of one announcement line
pub trait PairingLineParser: Send + Sync {
    fn parse_line<'l>(&self, line: &'l str) -> Vec<(&'l str, &'l str)>;
}

/// `A : B` pairings, each side optionally tagged `(A)` or `(N)`
#[derive(Debug, Default, Clone, Copy)]
pub struct VenueMarkerLines;

impl PairingLineParser for VenueMarkerLines {
    fn parse_line<'l>(&self, line: &'l str) -> Vec<(&'l str, &'l str)> {
        PAIRING
            .captures_iter(line)
            .filter_map(|caps| Some((caps.get(1)?.as_str(), caps.get(2)?.as_str())))
            .collect()
    }
}

/// A `digits:digits` occurrence in a tip line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NumberPair<'l> {
    /// Byte offset of the match in the line
    pub start: usize,
    pub left: &'l str,
    pub right: &'l str,
}

impl NumberPair<'_> {
    fn goals(&self) -> Option<(u32, u32)> {
        Some((self.left.parse().ok()?, self.right.parse().ok()?))
    }
}

/// All number pairs of a line, left to right
pub fn number_pairs(line: &str) -> Vec<NumberPair<'_>> {
    NUMBER_PAIR
        .captures_iter(line)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            Some(NumberPair {
                start: whole.start(),
                left: caps.get(1)?.as_str(),
                right: caps.get(2)?.as_str(),
            })
        })
        .collect()
}

/// Picks the predicted score out of a line already known to name one fixture
pub trait ScoreStrategy: Send + Sync {
    /// `line` is lowercased; returns (home goals, away goals)
    fn pick_score(&self, line: &str, fixture: &Fixture) -> Option<(u32, u32)>;
}

/// Forum template lines: kickoff time first, tip second. Exactly two pairs.
#[derive(Debug, Default, Clone, Copy)]
pub struct KickoffThenScore;

impl ScoreStrategy for KickoffThenScore {
    fn pick_score(&self, line: &str, _fixture: &Fixture) -> Option<(u32, u32)> {
        match number_pairs(line).as_slice() {
            [_kickoff, score] => score.goals(),
            _ => None,
        }
    }
}

/// Like [`KickoffThenScore`], but a lone pair also counts when it comes after
/// both team names. A lone pair in front of the names is a kickoff time.
#[derive(Debug, Default, Clone, Copy)]
pub struct TrailingScore;

impl ScoreStrategy for TrailingScore {
    fn pick_score(&self, line: &str, fixture: &Fixture) -> Option<(u32, u32)> {
        match number_pairs(line).as_slice() {
            [_kickoff, score] => score.goals(),
            [score] => {
                let end = names_end(line, fixture)?;
                if score.start >= end {
                    score.goals()
                } else {
                    None
                }
            }
            _ => None,
        }
    }
}

/// Byte offset right after the later of the two team names
fn names_end(line: &str, fixture: &Fixture) -> Option<usize> {
    let home = fixture.home.to_lowercase();
    let away = fixture.away.to_lowercase();
    let home_end = line.find(&home)? + home.len();
    let away_end = line.find(&away)? + away.len();
    Some(home_end.max(away_end))
}

/// Config selector for the score strategy
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum ScoreStrategyKind {
    #[default]
    Trailing,
    Kickoff,
}

impl ScoreStrategyKind {
    pub fn build(&self) -> Box<dyn ScoreStrategy> {
        match self {
            ScoreStrategyKind::Trailing => Box::new(TrailingScore),
            ScoreStrategyKind::Kickoff => Box::new(KickoffThenScore),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ScoreStrategyKind::Trailing => "trailing",
            ScoreStrategyKind::Kickoff => "kickoff",
        }
    }
}

impl FromStr for ScoreStrategyKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "trailing" => Ok(ScoreStrategyKind::Trailing),
            "kickoff" => Ok(ScoreStrategyKind::Kickoff),
            other => anyhow::bail!("unknown score strategy: {}", other),
        }
    }
}

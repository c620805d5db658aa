//! Pairing and tip extraction from forum posts.
//!
//! Both passes read the same fixture and participant snapshot. Neither returns
//! half-built results: a pairing set is complete or an error, and a
//! participant's tips are one per fixture or empty.

pub mod error;
pub mod pairing;
pub mod strategy;
pub mod tips;

pub use error::PairingError;
pub use pairing::PairingResolver;
pub use strategy::{
    KickoffThenScore, PairingLineParser, ScoreStrategy, ScoreStrategyKind, TrailingScore,
    VenueMarkerLines,
};
pub use tips::{TipExtractor, TipNotice, TipReport};

use crate::models::{Fixture, Pairing, Participant, Post};

/// Resolve the matchday pairings with the default line parser
pub fn resolve_pairings(
    posts: &[Post],
    participants: &[Participant],
) -> Result<Vec<Pairing>, PairingError> {
    PairingResolver::default().resolve(posts, participants)
}

/// Extract tips with the default score strategy
pub fn extract_tips(
    posts: &[Post],
    fixtures: &[Fixture],
    participants: &mut [Participant],
) -> TipReport {
    TipExtractor::default().extract(posts, fixtures, participants)
}

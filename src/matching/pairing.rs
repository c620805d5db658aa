use tracing::{debug, info, warn};

use crate::matching::{PairingError, PairingLineParser, VenueMarkerLines};
use crate::models::{Pairing, Participant, Post};

/// Finds the pairing announcement in a thread and reads the pairings from it
pub struct PairingResolver {
    line_parser: Box<dyn PairingLineParser>,
}

impl PairingResolver {
    /// Create a resolver reading lines with the given parser
    pub fn new(line_parser: Box<dyn PairingLineParser>) -> Self {
        Self { line_parser }
    }

    /// Resolve the pairings of the matchday.
    ///
    /// The first post naming every participant is taken as the announcement.
    /// Lines that do not resolve to two unpaired participants are skipped, and
    /// once the full set is collected an unresolved line ends the scan.
    pub fn resolve(
        &self,
        posts: &[Post],
        participants: &[Participant],
    ) -> Result<Vec<Pairing>, PairingError> {
        if participants.is_empty() {
            return Err(PairingError::NoParticipants);
        }

        info!("Parsing pairings...");

        let post = find_pairing_post(posts, participants).ok_or_else(|| {
            warn!("Could not find post with pairings, insert them manually");
            PairingError::NoPairingPostFound
        })?;

        info!("Post with pairings: {}", post.source_id);

        let expected = participants.len() / 2;
        let mut pairings: Vec<Pairing> = Vec::with_capacity(expected);

        for line in post.lines() {
            for (left, right) in self.line_parser.parse_line(line) {
                match resolve_pair(left, right, participants, &pairings) {
                    Some(pairing) => {
                        debug!("Pairing: {} vs {}", pairing.first, pairing.second);
                        pairings.push(pairing);
                    }
                    None if pairings.len() == expected => {
                        warn!(
                            "Ignoring '{}' and following lines in {}, pairings already complete",
                            line.trim(),
                            post.source_id
                        );
                        return Ok(pairings);
                    }
                    None => {
                        debug!("Unresolved pairing: {} : {}", left, right);
                    }
                }
            }
        }

        if pairings.len() != expected {
            warn!(
                "Could not parse pairings from {} ({} of {}), insert them manually",
                post.source_id,
                pairings.len(),
                expected
            );
            return Err(PairingError::IncompletePairingSet {
                source_id: post.source_id.clone(),
                found: pairings.len(),
                expected,
            });
        }

        info!("{} pairings parsed", pairings.len());
        Ok(pairings)
    }
}

impl Default for PairingResolver {
    fn default() -> Self {
        Self::new(Box::new(VenueMarkerLines))
    }
}

/// First post whose body mentions every participant, ignoring case
fn find_pairing_post<'p>(posts: &'p [Post], participants: &[Participant]) -> Option<&'p Post> {
    let names: Vec<String> = participants.iter().map(|p| p.name.to_lowercase()).collect();

    posts.iter().find(|post| {
        let body = post.body.to_lowercase();
        names.iter().all(|name| body.contains(name.as_str()))
    })
}

/// Exact-name lookup of both tokens; self pairings and repeats do not resolve
fn resolve_pair(
    left: &str,
    right: &str,
    participants: &[Participant],
    taken: &[Pairing],
) -> Option<Pairing> {
    let first = participants.iter().find(|p| p.name == left)?;
    let second = participants.iter().find(|p| p.name == right)?;

    if first.name == second.name {
        return None;
    }

    if taken
        .iter()
        .any(|p| p.involves(&first.name) || p.involves(&second.name))
    {
        return None;
    }

    Some(Pairing::new(first.name.clone(), second.name.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Slot;

    fn roster(names: &[&str]) -> Vec<Participant> {
        names
            .iter()
            .enumerate()
            .map(|(i, name)| Participant::new(*name, Slot(12 + 3 * i as i64)))
            .collect()
    }

    fn post(id: &str, author: &str, body: &str) -> Post {
        Post::new(id, author, body)
    }

    #[test]
    fn test_resolves_simple_announcement() {
        let participants = roster(&["Alice", "Bob", "Charlie", "Dave"]);
        let posts = vec![post("p1", "Admin", "Alice : Bob\nCharlie : Dave")];

        let pairings = PairingResolver::default()
            .resolve(&posts, &participants)
            .unwrap();

        assert_eq!(
            pairings,
            vec![Pairing::new("Alice", "Bob"), Pairing::new("Charlie", "Dave")]
        );
    }

    #[test]
    fn test_uses_first_post_naming_everyone() {
        let participants = roster(&["Alice", "Bob"]);
        let posts = vec![
            post("p1", "Alice", "Hi Bob"),
            post("p2", "Admin", "Spieltag 3\r\nalice (A) : bob\r\nAlice (A) : Bob (N)"),
            post("p3", "Admin", "Bob : Alice"),
        ];

        let pairings = PairingResolver::default()
            .resolve(&posts, &participants)
            .unwrap();

        assert_eq!(pairings, vec![Pairing::new("Alice", "Bob")]);
        assert_eq!(pairings[0].first, "Alice");
    }

    #[test]
    fn test_no_post_mentions_everyone() {
        let participants = roster(&["Alice", "Bob", "Charlie", "Dave"]);
        let posts = vec![post("p1", "Alice", "Alice : Bob")];

        let result = PairingResolver::default().resolve(&posts, &participants);

        assert_eq!(result, Err(PairingError::NoPairingPostFound));
    }

    #[test]
    fn test_empty_thread() {
        let participants = roster(&["Alice", "Bob"]);

        let result = PairingResolver::default().resolve(&[], &participants);

        assert_eq!(result, Err(PairingError::NoPairingPostFound));
    }

    #[test]
    fn test_empty_roster_is_guarded() {
        let posts = vec![post("p1", "Admin", "Alice : Bob")];

        let result = PairingResolver::default().resolve(&posts, &[]);

        assert_eq!(result, Err(PairingError::NoParticipants));
    }

    #[test]
    fn test_incomplete_set_is_discarded() {
        let participants = roster(&["Alice", "Bob", "Charlie", "Dave"]);
        let posts = vec![post("p1", "Admin", "Alice : Bob\nCharlie : Dora\nDave was late")];

        let result = PairingResolver::default().resolve(&posts, &participants);

        assert_eq!(
            result,
            Err(PairingError::IncompletePairingSet {
                source_id: "p1".to_string(),
                found: 1,
                expected: 2,
            })
        );
    }

    #[test]
    fn test_unresolved_line_before_completion_is_skipped() {
        let participants = roster(&["Alice", "Bob", "Charlie", "Dave"]);
        let body = "Paarungen: heute\nAlice : Bob\nFoo : Bar\nCharlie : Dave";
        let posts = vec![post("p1", "Admin", body)];

        let pairings = PairingResolver::default()
            .resolve(&posts, &participants)
            .unwrap();

        assert_eq!(pairings.len(), 2);
    }

    #[test]
    fn test_numbered_announcement() {
        let participants = roster(&["Alice", "Bob", "Charlie", "Dave"]);
        let posts = vec![post("p1", "Admin", "1. Alice : Bob\n2. Charlie : Dave")];

        let pairings = PairingResolver::default()
            .resolve(&posts, &participants)
            .unwrap();

        assert_eq!(
            pairings,
            vec![Pairing::new("Alice", "Bob"), Pairing::new("Charlie", "Dave")]
        );
    }

    #[test]
    fn test_comment_after_pairing() {
        let participants = roster(&["Alice", "Bob", "Charlie", "Dave"]);
        let posts = vec![post("p1", "Admin", "Alice : Bob (Topspiel)\nCharlie : Dave")];

        let pairings = PairingResolver::default()
            .resolve(&posts, &participants)
            .unwrap();

        assert_eq!(
            pairings,
            vec![Pairing::new("Alice", "Bob"), Pairing::new("Charlie", "Dave")]
        );
    }

    #[test]
    fn test_trailing_noise_after_complete_set_is_ignored() {
        let participants = roster(&["Alice", "Bob", "Charlie", "Dave"]);
        let body = "Alice : Bob\nCharlie : Dave\nTipps bis: Freitag\nBob : Alice";
        let posts = vec![post("p1", "Admin", body)];

        let pairings = PairingResolver::default()
            .resolve(&posts, &participants)
            .unwrap();

        assert_eq!(
            pairings,
            vec![Pairing::new("Alice", "Bob"), Pairing::new("Charlie", "Dave")]
        );
    }

    #[test]
    fn test_no_participant_is_paired_twice() {
        let participants = roster(&["Alice", "Bob", "Charlie", "Dave"]);
        let body = "Alice : Bob\nAlice : Charlie\nCharlie : Dave";
        let posts = vec![post("p1", "Admin", body)];

        let pairings = PairingResolver::default()
            .resolve(&posts, &participants)
            .unwrap();

        let mut names: Vec<&str> = pairings
            .iter()
            .flat_map(|p| [p.first.as_str(), p.second.as_str()])
            .collect();
        names.sort();
        assert_eq!(names, vec!["Alice", "Bob", "Charlie", "Dave"]);
    }

    #[test]
    fn test_names_resolve_case_sensitively() {
        let participants = roster(&["Alice", "Bob"]);
        let posts = vec![post("p1", "Admin", "alice : bob")];

        let result = PairingResolver::default().resolve(&posts, &participants);

        assert!(matches!(
            result,
            Err(PairingError::IncompletePairingSet { found: 0, .. })
        ));
    }
}

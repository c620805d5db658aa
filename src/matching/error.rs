use thiserror::Error;

/// Reasons the pairing announcement could not be read
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PairingError {
    #[error("no participants to pair")]
    NoParticipants,

    #[error("no post mentions every participant")]
    NoPairingPostFound,

    #[error("pairing post {source_id} yielded {found} of {expected} pairings")]
    IncompletePairingSet {
        source_id: String,
        found: usize,
        expected: usize,
    },
}

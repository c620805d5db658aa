pub mod league;

pub use league::{read_thread, LeagueWorker, ThreadOutcome};

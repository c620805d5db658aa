pub mod fixture;
pub mod participant;
pub mod post;

pub use fixture::{Fixture, Tip, FIXTURES_PER_MATCHDAY};
pub use participant::{Pairing, Participant, Slot};
pub use post::Post;

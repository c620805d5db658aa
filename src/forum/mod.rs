pub mod client;
pub mod html;

pub use client::ForumClient;

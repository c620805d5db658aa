pub mod config;
pub mod db;
pub mod forum;
pub mod matching;
pub mod models;
pub mod workers;

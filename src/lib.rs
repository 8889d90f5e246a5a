pub mod ai;
pub mod announce;
pub mod bot;
pub mod config;
pub mod error;
pub mod help;
pub mod lyrics;
pub mod music;
pub mod openai;
pub mod pagination;
pub mod releases;
pub mod spotify;
pub mod tickets;
pub mod types;
pub mod welcome;
pub mod youtube;

pub use bot::run;

//! Octagon-AI
//!
//! Scrapes fighter statistics and fight histories from ufcstats.com, joins
//! them into a matchup table and trains a neural classifier that predicts
//! fight winners.

pub mod config;
pub mod dataset;
pub mod error;
pub mod model;
pub mod retry;
pub mod scraper;
pub mod storage;
pub mod types;

pub use error::{Error, Result};

//! SQLite storage for crawled fighter data
//!
//! Persists the fighter index, the per-fighter statistics and the derived
//! fight table between CLI runs.

pub mod repository;
pub mod schema;

pub use repository::FighterRepository;
pub use schema::create_tables;

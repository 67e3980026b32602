//! Tabular dataset construction.
//!
//! - `fights`: fight history accumulation and win indicators
//! - `matchups`: joins fights with fighter stats into a feature table
//! - `prep`: standardization and stratified train/test split

pub mod fights;
pub mod matchups;
pub mod prep;

pub use fights::{FightColumns, FightHistory, FightTable, FighterBouts};
pub use matchups::{DroppedRow, MatchupDataset, MatchupNames, STATS_COLUMNS};
pub use prep::{splitting_data, standardization, Split, StandardScaler};

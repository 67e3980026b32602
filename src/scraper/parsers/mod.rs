//! HTML parsers for ufcstats.com pages.

pub mod fields;
pub mod history;
pub mod listing;
pub mod stats;

pub use fields::LabeledFields;
pub use history::HistoryParser;
pub use listing::ListingParser;
pub use stats::StatsParser;

//! Record types shared by the scraper, the dataset builder and storage.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Profile page URL of a single fighter.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FighterUrl(String);

impl FighterUrl {
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FighterUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FighterUrl {
    fn from(url: &str) -> Self {
        Self::new(url)
    }
}

/// One row of fighter statistics.
///
/// Every numeric statistic the site can mark with `--` is an `Option`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct FighterStatsRecord {
    pub url: String,
    pub name: String,
    pub record: String,
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
    pub height_cm: Option<f64>,
    pub weight_lbs: Option<f64>,
    pub reach_inch: Option<f64>,
    pub stance: String,
    pub debut: Option<i32>,
    // Striking
    pub slpm: Option<f64>,
    pub str_acc: Option<f64>,
    pub sapm: Option<f64>,
    pub str_def: Option<f64>,
    // Grappling
    pub td_avg: Option<f64>,
    pub td_acc: Option<f64>,
    pub td_def: Option<f64>,
    pub sub_avg: Option<f64>,
}

/// Outcome of a bout from the listed fighter's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FightResult {
    Win,
    Loss,
    Draw,
    #[serde(rename = "nc")]
    NoContest,
}

impl FightResult {
    /// Parse the outcome flag text shown on a profile page.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "win" => Some(Self::Win),
            "loss" => Some(Self::Loss),
            "draw" => Some(Self::Draw),
            "nc" => Some(Self::NoContest),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Win => "win",
            Self::Loss => "loss",
            Self::Draw => "draw",
            Self::NoContest => "nc",
        }
    }

    /// Indicator pair `(fighters_win, opponents_win)`.
    pub fn indicators(&self) -> (i8, i8) {
        match self {
            Self::Win => (1, 0),
            Self::Loss => (0, 1),
            Self::Draw => (1, 1),
            Self::NoContest => (-1, -1),
        }
    }
}

impl fmt::Display for FightResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One bout instance with its derived indicator pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FightRecord {
    pub fighter: String,
    pub opponent: String,
    pub result: FightResult,
    pub fighters_win: i8,
    pub opponents_win: i8,
}

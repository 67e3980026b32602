//! Fight history parser for ufcstats.com profile pages.
//!
//! The fight table lists, for each bout, both fighters' names and the event
//! name as plain black links. Event names are filtered out by pattern; the
//! remaining names alternate fighter / opponent.

use scraper::{Html, Selector};

use crate::dataset::fights::FighterBouts;
use crate::Result;

/// Substrings that mark a link as an event or promotion rather than a fighter
pub const EVENT_MARKERS: [&str; 18] = [
    "vs.",
    "UFC",
    "Strikeforce",
    ":",
    "Affliction",
    "WCFC",
    "EliteXC",
    "PRIDE",
    "Destiny",
    "WFA",
    "Sengoku",
    "IFL",
    "DREAM",
    "Ultimate",
    "Bushido",
    "BodogFight",
    " - ",
    "UCC",
];

/// Outcome flag of a scheduled, not yet fought bout
const UPCOMING_FLAG: &str = "next";

/// Whether a link text names a fighter
pub fn is_fighter_name(text: &str) -> bool {
    !text.chars().any(|c| c.is_ascii_digit()) && !EVENT_MARKERS.iter().any(|m| text.contains(m))
}

/// Parser for the fight history table of a profile page
pub struct HistoryParser;

impl HistoryParser {
    /// Parse fight history from HTML
    pub fn parse(html: &str, url: &str) -> Result<FighterBouts> {
        let document = Html::parse_document(html);
        Self::extract(&document, url)
    }

    /// Extract fight history from an already parsed page.
    ///
    /// Fails with a consistency violation when the names do not pair up
    /// with the outcome flags.
    pub fn extract(document: &Html, url: &str) -> Result<FighterBouts> {
        let link_selector = Selector::parse("a.b-link.b-link_style_black").unwrap();
        let flag_selector = Selector::parse("i.b-flag__text").unwrap();

        let mut bouts = FighterBouts {
            url: url.to_string(),
            ..Default::default()
        };

        let names = document
            .select(&link_selector)
            .map(|a| a.text().collect::<String>().trim().to_string())
            .filter(|t| is_fighter_name(t));

        for (i, name) in names.enumerate() {
            if i % 2 == 0 {
                bouts.fighter.push(name);
            } else {
                bouts.opponent.push(name);
            }
        }

        bouts.result = document
            .select(&flag_selector)
            .map(|i| i.text().collect::<String>().trim().to_string())
            .filter(|t| t != UPCOMING_FLAG)
            .collect();

        bouts.check_consistency()?;
        Ok(bouts)
    }
}

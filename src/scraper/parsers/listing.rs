//! Fighter listing parser for ufcstats.com
//!
//! URL: http://ufcstats.com/statistics/fighters?char=a&page=1

use scraper::{Html, Selector};

/// Parser for alphabetical fighter listing pages
pub struct ListingParser;

impl ListingParser {
    /// Link targets of every anchor inside a statistics table cell, in page
    /// order. A row links the same profile from several cells, so the
    /// result may contain duplicates.
    pub fn parse(html: &str) -> Vec<String> {
        let document = Html::parse_document(html);
        let link_selector = Selector::parse("td.b-statistics__table-col a[href]").unwrap();

        document
            .select(&link_selector)
            .filter_map(|a| a.value().attr("href"))
            .map(|href| href.trim().to_string())
            .filter(|href| !href.is_empty())
            .collect()
    }
}

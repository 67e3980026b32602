//! Fighter statistics parser for ufcstats.com profile pages.

use scraper::{Html, Selector};

use super::fields::{self, LabeledFields, Malformed, Parsed};
use crate::types::FighterStatsRecord;
use crate::{Error, Result};

/// Parser for the header and statistics list of a profile page
pub struct StatsParser;

impl StatsParser {
    /// Parse fighter statistics from HTML
    pub fn parse(html: &str, url: &str) -> Result<FighterStatsRecord> {
        let document = Html::parse_document(html);
        Self::extract(&document, url)
    }

    /// Extract fighter statistics from an already parsed page
    pub fn extract(document: &Html, url: &str) -> Result<FighterStatsRecord> {
        let (name, record) = Self::parse_header(document, url)?;
        let (wins, losses, draws) =
            fields::parse_record(&record).map_err(|_| field_error(url, "Record", &record))?;

        let stats = LabeledFields::from_document(document);
        let field = |label: &str| require(&stats, url, label);

        Ok(FighterStatsRecord {
            url: url.to_string(),
            name,
            record,
            wins,
            losses,
            draws,
            height_cm: parse_field(url, "Height", field("Height")?, fields::parse_height)?,
            weight_lbs: parse_field(url, "Weight", field("Weight")?, fields::parse_weight)?,
            reach_inch: parse_field(url, "Reach", field("Reach")?, fields::parse_reach)?,
            stance: field("Stance")?.to_string(),
            debut: parse_field(url, "DOB", field("DOB")?, fields::parse_year)?,
            slpm: parse_field(url, "SLpM", field("SLpM")?, fields::parse_rate)?,
            str_acc: parse_field(url, "Str. Acc.", field("Str. Acc.")?, fields::parse_percent)?,
            sapm: parse_field(url, "SApM", field("SApM")?, fields::parse_rate)?,
            str_def: parse_field(url, "Str. Def", field("Str. Def")?, fields::parse_percent)?,
            td_avg: parse_field(url, "TD Avg.", field("TD Avg.")?, fields::parse_rate)?,
            td_acc: parse_field(url, "TD Acc.", field("TD Acc.")?, fields::parse_percent)?,
            td_def: parse_field(url, "TD Def.", field("TD Def.")?, fields::parse_percent)?,
            sub_avg: parse_field(url, "Sub. Avg.", field("Sub. Avg.")?, fields::parse_rate)?,
        })
    }

    /// Name and raw record line from the page title
    fn parse_header(document: &Html, url: &str) -> Result<(String, String)> {
        let span_selector = Selector::parse("span").unwrap();
        let spans: Vec<String> = document
            .select(&span_selector)
            .map(|s| s.text().collect::<String>().trim().to_string())
            .collect();

        let name = first_text(document, "span.b-content__title-highlight")
            .or_else(|| spans.first().cloned())
            .filter(|n| !n.is_empty())
            .ok_or_else(|| Error::ParseLayoutMismatch {
                url: url.to_string(),
                field: "Name".to_string(),
                detail: "no title span on page".to_string(),
            })?;

        let record = first_text(document, "span.b-content__title-record")
            .or_else(|| spans.get(1).cloned())
            .ok_or_else(|| Error::ParseLayoutMismatch {
                url: url.to_string(),
                field: "Record".to_string(),
                detail: "no record span on page".to_string(),
            })?;

        Ok((name, record))
    }
}

fn require<'a>(stats: &'a LabeledFields, url: &str, label: &str) -> Result<&'a str> {
    stats.get(label).ok_or_else(|| Error::ParseLayoutMismatch {
        url: url.to_string(),
        field: label.to_string(),
        detail: format!("missing from statistics list ({} items found)", stats.len()),
    })
}

fn first_text(document: &Html, selector: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;
    document
        .select(&selector)
        .next()
        .map(|e| e.text().collect::<String>().trim().to_string())
}

fn parse_field<T>(url: &str, name: &str, raw: &str, parse: fn(&str) -> Parsed<T>) -> Result<Option<T>> {
    parse(raw).map_err(|Malformed| field_error(url, name, raw))
}

fn field_error(url: &str, field: &str, raw: &str) -> Error {
    Error::FieldFormat {
        url: url.to_string(),
        field: field.to_string(),
        raw: raw.to_string(),
    }
}

//! Labeled field extraction for fighter profile pages.
//!
//! Profile statistics are rendered as `<li>` items of the form
//! `<i class="b-list__box-item-title">Str. Acc.:</i> 45%`. Items are looked
//! up by their normalized label instead of their position in the list, so a
//! reordered or padded list still parses.

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::sync::OnceLock;

/// The site's marker for an absent statistic
pub const MISSING: &str = "--";

/// Centimeters per foot as a divisor (1 / 30.48)
const FEET_PER_CM: f64 = 0.032808;

/// A value was present but did not have the expected shape
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Malformed;

/// `Ok(None)` is the `--` sentinel, `Err(Malformed)` an unparseable value.
pub type Parsed<T> = Result<Option<T>, Malformed>;

/// Label -> value pairs of a profile's statistics list
#[derive(Debug, Clone, Default)]
pub struct LabeledFields {
    fields: Vec<(String, String)>,
}

impl LabeledFields {
    /// Collect every labeled statistic item on the page
    pub fn from_document(document: &Html) -> Self {
        let item_selector =
            Selector::parse("li.b-list__box-list-item.b-list__box-list-item_type_block").unwrap();

        let fields = document
            .select(&item_selector)
            .filter_map(|item| Self::split_item(&item))
            .collect();

        Self { fields }
    }

    fn split_item(item: &ElementRef) -> Option<(String, String)> {
        let mut label = None;
        let mut value = String::new();

        for child in item.children() {
            if let Some(elem) = ElementRef::wrap(child) {
                if elem.value().classes().any(|c| c == "b-list__box-item-title") {
                    label = Some(elem.text().collect::<String>());
                } else {
                    value.extend(elem.text());
                }
            } else if let Some(text) = child.value().as_text() {
                value.push_str(text);
            }
        }

        // No title element: fall back to "Label: value"
        let (label, value) = match label {
            Some(label) => (label, value),
            None => {
                let (label, value) = value.split_once(':')?;
                (label.to_string(), value.to_string())
            }
        };

        let label = normalize_label(&label);
        if label.is_empty() {
            return None;
        }
        Some((label, collapse_whitespace(&value)))
    }

    /// Raw value of the first item whose label matches
    pub fn get(&self, label: &str) -> Option<&str> {
        let wanted = normalize_label(label);
        self.fields
            .iter()
            .find(|(l, _)| *l == wanted)
            .map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Lowercase, trailing `:`/`.` removed, inner whitespace collapsed
pub fn normalize_label(label: &str) -> String {
    collapse_whitespace(label)
        .trim_end_matches([':', '.'])
        .trim()
        .to_lowercase()
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Parse `"Record: W-L-D"`, tolerating a trailing annotation on the draws
/// token such as `"0 (1 NC)"`.
pub fn parse_record(raw: &str) -> Result<(u32, u32, u32), Malformed> {
    let (_, tally) = raw.split_once(':').ok_or(Malformed)?;
    let tokens: Vec<&str> = tally.split('-').map(str::trim).collect();
    if tokens.len() < 3 {
        return Err(Malformed);
    }

    let wins = tokens[0].parse().map_err(|_| Malformed)?;
    let losses = tokens[1].parse().map_err(|_| Malformed)?;

    let last = tokens[tokens.len() - 1];
    let draws_token = if last.len() == 1 {
        last
    } else {
        last.split(' ').next().unwrap_or(last)
    };
    let draws = draws_token.parse().map_err(|_| Malformed)?;

    Ok((wins, losses, draws))
}

/// `5' 11"` to centimeters
pub fn parse_height(raw: &str) -> Parsed<f64> {
    static HEIGHT_RE: OnceLock<Regex> = OnceLock::new();
    let re = HEIGHT_RE.get_or_init(|| Regex::new(r#"^(\d+)'\s*(\d+)"?$"#).unwrap());

    // A single token is the sentinel
    if raw.split_whitespace().count() <= 1 {
        return if raw.trim() == MISSING || raw.trim().is_empty() {
            Ok(None)
        } else {
            Err(Malformed)
        };
    }

    let caps = re.captures(raw.trim()).ok_or(Malformed)?;
    let feet: f64 = caps[1].parse().map_err(|_| Malformed)?;
    let inches: f64 = caps[2].parse().map_err(|_| Malformed)?;
    Ok(Some(feet / FEET_PER_CM + (inches / 12.0) / FEET_PER_CM))
}

/// `"155 lbs."` to pounds
pub fn parse_weight(raw: &str) -> Parsed<f64> {
    let token = raw.split_whitespace().next().unwrap_or(MISSING);
    parse_number(token)
}

/// `72"` to inches
pub fn parse_reach(raw: &str) -> Parsed<f64> {
    let token = raw.split('"').next().unwrap_or(MISSING).trim();
    parse_number(token)
}

/// Year of a `"Mon DD, YYYY"` date; no comma means no date
pub fn parse_year(raw: &str) -> Parsed<i32> {
    let segments: Vec<&str> = raw.split(',').collect();
    if segments.len() == 1 {
        return Ok(None);
    }
    segments[1].trim().parse().map(Some).map_err(|_| Malformed)
}

/// `"45%"` to the fraction `0.45`
pub fn parse_percent(raw: &str) -> Parsed<f64> {
    let token = raw.split('%').next().unwrap_or(MISSING).trim();
    if token == MISSING {
        return Ok(None);
    }
    let percent: u32 = token.parse().map_err(|_| Malformed)?;
    Ok(Some(percent as f64 / 100.0))
}

/// Per-minute or per-15-minute averages
pub fn parse_rate(raw: &str) -> Parsed<f64> {
    parse_number(raw.trim())
}

fn parse_number(token: &str) -> Parsed<f64> {
    if token == MISSING {
        return Ok(None);
    }
    token.parse().map(Some).map_err(|_| Malformed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_record() {
        assert_eq!(parse_record("Record: 24-7-1"), Ok((24, 7, 1)));
        assert_eq!(parse_record("Record: 24-7-0 (1 NC)"), Ok((24, 7, 0)));
        assert_eq!(parse_record("Record: 10-2-12"), Ok((10, 2, 12)));
        assert_eq!(parse_record("Record:"), Err(Malformed));
        assert_eq!(parse_record("24-7-1"), Err(Malformed));
    }

    #[test]
    fn test_parse_height() {
        let cm = parse_height("5' 11\"").unwrap().unwrap();
        assert!((cm - 180.34).abs() < 0.1);
        let cm = parse_height("6' 4\"").unwrap().unwrap();
        assert!((cm - 193.04).abs() < 0.1);
        assert_eq!(parse_height("--"), Ok(None));
        assert_eq!(parse_height("tall guy"), Err(Malformed));
    }

    #[test]
    fn test_parse_height_feet_and_inches() {
        let cm = parse_height("5' 0\"").unwrap().unwrap();
        assert_eq!(cm, 5.0 / 0.032808);
    }

    #[test]
    fn test_parse_weight_and_reach() {
        assert_eq!(parse_weight("155 lbs."), Ok(Some(155.0)));
        assert_eq!(parse_weight("--"), Ok(None));
        assert_eq!(parse_reach("72\""), Ok(Some(72.0)));
        assert_eq!(parse_reach("--"), Ok(None));
        assert_eq!(parse_reach("long"), Err(Malformed));
    }

    #[test]
    fn test_parse_year() {
        assert_eq!(parse_year("Jul 14, 1988"), Ok(Some(1988)));
        assert_eq!(parse_year("--"), Ok(None));
        assert_eq!(parse_year("Jul 14, soon"), Err(Malformed));
    }

    #[test]
    fn test_parse_percent() {
        assert_eq!(parse_percent("45%"), Ok(Some(0.45)));
        assert_eq!(parse_percent("100%"), Ok(Some(1.0)));
        assert_eq!(parse_percent("--"), Ok(None));
        assert_eq!(parse_percent("4.5%"), Err(Malformed));
    }

    #[test]
    fn test_parse_rate() {
        assert_eq!(parse_rate("3.29"), Ok(Some(3.29)));
        assert_eq!(parse_rate(" 0.00 "), Ok(Some(0.0)));
        assert_eq!(parse_rate("--"), Ok(None));
    }

    #[test]
    fn test_normalize_label() {
        assert_eq!(normalize_label("Str. Acc.:"), "str. acc");
        assert_eq!(normalize_label("  STANCE: "), "stance");
        assert_eq!(normalize_label("TD\n   Avg.:"), "td avg");
    }

    #[test]
    fn test_labeled_fields_from_document() {
        let html = r#"
        <ul>
          <li class="b-list__box-list-item b-list__box-list-item_type_block">
            <i class="b-list__box-item-title b-list__box-item-title_type_width">Str. Acc.:</i>
            45%
          </li>
          <li class="b-list__box-list-item b-list__box-list-item_type_block">
            <i class="b-list__box-item-title b-list__box-item-title_font_lowercase">&nbsp;</i>
          </li>
          <li class="b-list__box-list-item b-list__box-list-item_type_block">Reach: 72"</li>
        </ul>"#;
        let document = Html::parse_document(html);
        let fields = LabeledFields::from_document(&document);

        assert_eq!(fields.len(), 2);
        assert_eq!(fields.get("Str. Acc.:"), Some("45%"));
        assert_eq!(fields.get("reach"), Some("72\""));
        assert_eq!(fields.get("height"), None);
    }
}

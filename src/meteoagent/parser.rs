// K-index widget markup parser.
// Pure extraction of the today/tomorrow values from the widget HTML.

use scraper::{Html, Selector};

use crate::error::ParseError;

use super::types::{Day, KIndex};

const TODAY_SELECTOR: &str = ".widget-kindex__forecast_one .meta__value strong";
const TOMORROW_SELECTOR: &str = ".widget-kindex__forecast_two .meta__value strong";

fn selector_for(day: Day) -> &'static str {
    match day {
        Day::Today => TODAY_SELECTOR,
        Day::Tomorrow => TOMORROW_SELECTOR,
    }
}

/// Extract `(today, tomorrow)` from the widget page.
///
/// Each marker holds a label followed by the value, e.g. `Kp 3`. The value
/// must be an integer in 1..=9; anything else is a [`ParseError`].
pub fn parse_kindex(html: &str) -> Result<(KIndex, KIndex), ParseError> {
    let document = Html::parse_document(html);

    let today = extract(&document, Day::Today)?;
    let tomorrow = extract(&document, Day::Tomorrow)?;

    Ok((today, tomorrow))
}

fn extract(document: &Html, day: Day) -> Result<KIndex, ParseError> {
    let raw = selector_for(day);
    let selector = Selector::parse(raw).map_err(|e| ParseError::Selector {
        selector: raw.to_string(),
        reason: e.to_string(),
    })?;

    let text = document
        .select(&selector)
        .next()
        .map(|el| el.text().collect::<String>())
        .ok_or(ParseError::MissingMarker(day))?;

    parse_value(day, text.trim())
}

/// Parse the value token out of a marker's text.
fn parse_value(day: Day, text: &str) -> Result<KIndex, ParseError> {
    let token = text
        .split_whitespace()
        .nth(1)
        .ok_or_else(|| ParseError::MissingValue {
            day,
            text: text.to_string(),
        })?;

    let value: i64 = token.parse().map_err(|_| ParseError::NotAnInteger {
        day,
        token: token.to_string(),
    })?;

    KIndex::try_from(value).map_err(|value| ParseError::OutOfRange { day, value })
}

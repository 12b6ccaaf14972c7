//! Stateless helpers turning scraped text into typed values.

use crate::types::{Currency, RawCell};

/// Codes recognized inside cell text; the first hit in this order wins.
pub const KNOWN_CURRENCIES: [&str; 22] = [
    "AUD", "BRL", "CAD", "CHF", "CNY", "CZK", "DKK", "EUR", "GBP", "HKD", "JPY", "KRW", "MNT",
    "MXN", "NOK", "PLN", "RUB", "THB", "TRY", "UAH", "USD", "VND",
];

const BILLION_MARKERS: [&str; 3] = ["Mrd.", "Mrd", "Bn"];
const MILLION_MARKERS: [&str; 3] = ["Mio.", "Mio", "Mn"];

/// Invisible formatting characters that scraped labels carry around.
const FORMAT_CHARS: [char; 6] = [
    '\u{00AD}', // soft hyphen
    '\u{200B}',
    '\u{200C}',
    '\u{200D}',
    '\u{2060}',
    '\u{FEFF}',
];

/// Scale written next to a number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scale {
    Million,
    Billion,
}

impl Scale {
    pub fn factor(&self) -> f64 {
        match self {
            Scale::Million => 1e6,
            Scale::Billion => 1e9,
        }
    }
}

/// `1000EUR` -> `EUR`
pub fn find_currency(text: &str) -> Option<Currency> {
    KNOWN_CURRENCIES
        .iter()
        .find(|code| text.contains(*code))
        .and_then(|code| Currency::new(code))
}

pub fn strip_currency(text: &str, currency: Option<&Currency>) -> String {
    match currency {
        Some(currency) => text.replace(currency.code(), "").trim().to_string(),
        None => text.trim().to_string(),
    }
}

/// Removes a scale marker (`Mrd.`, `Bn`, `Mio.`, `Mn`) and reports which one was found.
pub fn strip_scale(text: &str) -> (String, Option<Scale>) {
    let markers = BILLION_MARKERS
        .iter()
        .map(|m| (*m, Scale::Billion))
        .chain(MILLION_MARKERS.iter().map(|m| (*m, Scale::Million)));

    for (marker, scale) in markers {
        if text.contains(marker) {
            return (text.replacen(marker, "", 1).trim().to_string(), Some(scale));
        }
    }
    (text.trim().to_string(), None)
}

/// Parses a decimal number written with either separator convention.
///
/// A comma after the last dot is the decimal separator (`1.200,23`),
/// otherwise commas separate thousands (`1,200.23`). Percent signs and
/// whitespace are ignored.
pub fn parse_number(text: &str) -> Option<f64> {
    let mut t: String = text
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '%' && *c != '\u{202F}')
        .map(|c| if c == '\u{2212}' { '-' } else { c })
        .collect();

    let dot_pos = t.rfind('.');
    let comma_pos = t.rfind(',');
    if comma_pos > dot_pos {
        t = t.replace('.', "").replace(',', ".");
    } else {
        t = t.replace(',', "");
    }

    let well_formed = t.chars().any(|c| c.is_ascii_digit())
        && t
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | '+'));
    if !well_formed {
        return None;
    }
    t.parse::<f64>().ok()
}

/// Value of a numeric table cell; text goes through currency and percent
/// stripping first.
pub fn cell_to_f64(cell: &RawCell) -> Option<f64> {
    match cell {
        RawCell::Number(v) if !v.is_nan() => Some(*v),
        RawCell::Text(text) => {
            let currency = find_currency(text);
            parse_number(&strip_currency(text, currency.as_ref()))
        }
        _ => None,
    }
}

/// Removes invisible formatting characters and surrounding whitespace.
pub fn clean_label(label: &str) -> String {
    label
        .chars()
        .filter(|c| !FORMAT_CHARS.contains(c))
        .collect::<String>()
        .trim()
        .to_string()
}

/// Reads a column header as a year: `2014`, `2014e` and `13/14` (-> 2014).
pub fn parse_year(header: &RawCell) -> Option<i32> {
    let text = match header {
        RawCell::Number(v) if v.fract() == 0.0 && v.is_finite() => format!("{}", *v as i64),
        RawCell::Text(text) => text.trim().to_string(),
        _ => return None,
    };

    let text = text
        .strip_suffix('e')
        .or_else(|| text.strip_suffix('E'))
        .unwrap_or(text.as_str())
        .trim();

    let text = match text.rsplit_once('/') {
        Some((_, short)) => {
            let short = short.trim();
            if short.len() != 2 || !short.chars().all(|c| c.is_ascii_digit()) {
                return None;
            }
            format!("20{short}")
        }
        None => text.to_string(),
    };

    if text.len() != 4 || !text.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    text.parse::<i32>().ok().filter(|year| *year != 0)
}

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_currency() {
        assert_eq!(find_currency("1.200,23 EUR").unwrap().code(), "EUR");
        assert_eq!(find_currency("1000USD").unwrap().code(), "USD");
        assert!(find_currency("1.200,23").is_none());
    }

    #[test]
    fn test_parse_number_separators() {
        assert_eq!(parse_number("1.200,23"), Some(1200.23));
        assert_eq!(parse_number("1,200.23"), Some(1200.23));
        assert_eq!(parse_number("3,5"), Some(3.5));
        assert_eq!(parse_number("3.5"), Some(3.5));
        assert_eq!(parse_number("1.28 %"), Some(1.28));
        assert_eq!(parse_number("-0,45"), Some(-0.45));
        assert_eq!(parse_number("\u{2212}2,10"), Some(-2.1));
    }

    #[test]
    fn test_parse_number_rejects_garbage() {
        assert_eq!(parse_number("-"), None);
        assert_eq!(parse_number("n.a."), None);
        assert_eq!(parse_number("NaN"), None);
        assert_eq!(parse_number("inf"), None);
        assert_eq!(parse_number(""), None);
    }

    #[test]
    fn test_strip_scale() {
        assert_eq!(strip_scale("1,2 Mrd."), ("1,2".to_string(), Some(Scale::Billion)));
        assert_eq!(strip_scale("350 Mio."), ("350".to_string(), Some(Scale::Million)));
        assert_eq!(strip_scale("1,2 Bn"), ("1,2".to_string(), Some(Scale::Billion)));
        assert_eq!(strip_scale("350 Mn"), ("350".to_string(), Some(Scale::Million)));
        assert_eq!(strip_scale("350"), ("350".to_string(), None));
    }

    #[test]
    fn test_cell_to_f64() {
        assert_eq!(cell_to_f64(&RawCell::from("1,00 EUR")), Some(1.0));
        assert_eq!(cell_to_f64(&RawCell::Number(2.5)), Some(2.5));
        assert_eq!(cell_to_f64(&RawCell::Number(f64::NAN)), None);
        assert_eq!(cell_to_f64(&RawCell::Missing), None);
    }

    #[test]
    fn test_clean_label() {
        assert_eq!(clean_label("Gesamt\u{00AD}verbindlichkeiten "), "Gesamtverbindlichkeiten");
        assert_eq!(clean_label("\u{FEFF}Umsatz\u{200B}"), "Umsatz");
    }

    #[test]
    fn test_parse_year() {
        assert_eq!(parse_year(&RawCell::from("2014")), Some(2014));
        assert_eq!(parse_year(&RawCell::from("2014e")), Some(2014));
        assert_eq!(parse_year(&RawCell::from("13/14")), Some(2014));
        assert_eq!(parse_year(&RawCell::from(" 24/25e ")), Some(2025));
        assert_eq!(parse_year(&RawCell::Number(2023.0)), Some(2023));
        assert_eq!(parse_year(&RawCell::from("Unnamed: 0")), None);
        assert_eq!(parse_year(&RawCell::from("214")), None);
        assert_eq!(parse_year(&RawCell::from("20145")), None);
        assert_eq!(parse_year(&RawCell::from("0000")), None);
        assert_eq!(parse_year(&RawCell::Missing), None);
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(0.123, 2), 0.12);
        assert_eq!(round_to(19.999, 2), 20.0);
    }
}

//! Free-text Italian date standardization.
//!
//! Month names are translated to English, then a fixed list of formats is
//! tried in order. Formats that lack a day or year are completed with the
//! defaults day 1 and year 1900 before parsing.

use chrono::NaiveDate;

/// Returned for empty or unparseable input.
pub const UNKNOWN_DATE: &str = "1900-01-01";

const DEFAULT_DAY: &str = "1";
const DEFAULT_YEAR: &str = "1900";

/// Italian month name → English month name, lowercase and all-caps.
const MONTHS: [(&str, &str); 24] = [
    ("gennaio", "January"),
    ("febbraio", "February"),
    ("marzo", "March"),
    ("aprile", "April"),
    ("maggio", "May"),
    ("giugno", "June"),
    ("luglio", "July"),
    ("agosto", "August"),
    ("settembre", "September"),
    ("ottobre", "October"),
    ("novembre", "November"),
    ("dicembre", "December"),
    ("GENNAIO", "JANUARY"),
    ("FEBBRAIO", "FEBRUARY"),
    ("MARZO", "MARCH"),
    ("APRILE", "APRIL"),
    ("MAGGIO", "MAY"),
    ("GIUGNO", "JUNE"),
    ("LUGLIO", "JULY"),
    ("AGOSTO", "AUGUST"),
    ("SETTEMBRE", "SEPTEMBER"),
    ("OTTOBRE", "OCTOBER"),
    ("NOVEMBRE", "NOVEMBER"),
    ("DICEMBRE", "DECEMBER"),
];

/// Which components a format is missing.
#[derive(Debug, Clone, Copy)]
enum Missing {
    Nothing,
    Day,
    DayAndYear,
}

struct DateFormat {
    pattern: &'static str,
    missing: Missing,
}

/// Most specific first. Order matters: "day month" and "month year"
/// shapes are ambiguous.
const FORMATS: [DateFormat; 8] = [
    DateFormat { pattern: "%d %B %Y", missing: Missing::Nothing },
    DateFormat { pattern: "%d %b %Y", missing: Missing::Nothing },
    DateFormat { pattern: "%B %d, %Y", missing: Missing::Nothing },
    DateFormat { pattern: "%d/%m/%Y", missing: Missing::Nothing },
    DateFormat { pattern: "%Y-%m-%d", missing: Missing::Nothing },
    DateFormat { pattern: "%B %Y", missing: Missing::Day },
    DateFormat { pattern: "%b %Y", missing: Missing::Day },
    DateFormat { pattern: "%B", missing: Missing::DayAndYear },
];

impl DateFormat {
    fn parse(&self, text: &str) -> Option<NaiveDate> {
        match self.missing {
            Missing::Nothing => NaiveDate::parse_from_str(text, self.pattern).ok(),
            Missing::Day => NaiveDate::parse_from_str(
                &format!("{DEFAULT_DAY} {text}"),
                &format!("%d {}", self.pattern),
            )
            .ok(),
            Missing::DayAndYear => NaiveDate::parse_from_str(
                &format!("{DEFAULT_DAY} {text} {DEFAULT_YEAR}"),
                &format!("%d {} %Y", self.pattern),
            )
            .ok(),
        }
    }
}

/// Replace every Italian month name with its English equivalent.
pub fn translate_months(raw: &str) -> String {
    MONTHS
        .iter()
        .fold(raw.to_string(), |acc, (it, en)| acc.replace(it, en))
}

/// Standardize a free-text date into `YYYY-MM-DD`. Never fails.
pub fn standardize_date(raw: Option<&str>) -> String {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return UNKNOWN_DATE.to_string();
    };

    let translated = translate_months(raw);

    FORMATS
        .iter()
        .find_map(|format| format.parse(&translated))
        .map(|date| date.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| UNKNOWN_DATE.to_string())
}

//! Text normalization for the Aranjuez schedule page: ASCII folding of
//! Spanish weekday/month names, the closed mojibake correction table,
//! year disambiguation, and address/phone cleanup.

use crate::constants::COUNTRY_CALLING_CODE;
use chrono::{Datelike, NaiveDate, Weekday};
use deunicode::deunicode;

/// Spanish month names in calendar order, accentless lowercase.
const MONTHS: [&str; 12] = [
    "enero",
    "febrero",
    "marzo",
    "abril",
    "mayo",
    "junio",
    "julio",
    "agosto",
    "septiembre",
    "octubre",
    "noviembre",
    "diciembre",
];

/// Spanish weekday names Monday..Sunday, accentless lowercase.
const WEEKDAYS: [&str; 7] = [
    "lunes",
    "martes",
    "miercoles",
    "jueves",
    "viernes",
    "sabado",
    "domingo",
];

/// Closed correction table for weekday names the page publishes with broken
/// encoding. Keys are what the mojibake folds to; these two are the only
/// corrupted forms observed on the source page.
const WEEKDAY_CORRECTIONS: [(&str, &str); 2] =
    [("mia(c)rcoles", "miercoles"), ("sa!bado", "sabado")];

/// Folds text to trimmed, lowercased ASCII for name comparison.
pub fn fold(text: &str) -> String {
    deunicode(&text.trim().to_lowercase())
}

/// Folds a declared weekday name and repairs the known corrupted forms.
pub fn canonical_weekday(raw: &str) -> String {
    let folded = fold(raw);
    for (corrupt, fixed) in WEEKDAY_CORRECTIONS {
        if folded == corrupt {
            return fixed.to_string();
        }
    }
    folded
}

/// Resolves a folded Spanish month name to its 1-based number.
pub fn month_number(name: &str) -> Option<u32> {
    let folded = fold(name);
    MONTHS
        .iter()
        .position(|m| *m == folded)
        .map(|idx| idx as u32 + 1)
}

/// The accentless lowercase Spanish name of a weekday.
pub fn weekday_name(weekday: Weekday) -> &'static str {
    WEEKDAYS[weekday.num_days_from_monday() as usize]
}

/// Resolves a month/day pair with no year against a declared weekday name.
///
/// The page never states the year, so candidates are tried in a fixed
/// order (base year, previous, next) and the first whose actual weekday
/// matches the declared one wins. Returns `None` when no candidate
/// matches, or when the day does not exist in any candidate year.
pub fn resolve_date(
    month: u32,
    day: u32,
    declared_weekday: &str,
    base_year: i32,
) -> Option<NaiveDate> {
    let candidates = [base_year, base_year - 1, base_year + 1];
    candidates
        .into_iter()
        .filter_map(|year| NaiveDate::from_ymd_opt(year, month, day))
        .find(|date| weekday_name(date.weekday()) == declared_weekday)
}

/// Cleans a raw street-address fragment from the page.
///
/// Removes the mojibake artifacts the source is known to emit, the `c/`
/// street abbreviation, non-breaking spaces and commas, and title-cases
/// the `avd.` avenue abbreviation.
pub fn normalize_address(raw: &str) -> String {
    raw.replace('Â', "")
        .replace('Ã', "í")
        .replace('\u{a0}', " ")
        .replace("c/", "")
        .replace(',', "")
        .replace("avd.", "Avd.")
        .trim()
        .to_string()
}

/// Normalizes a contact fragment into an international phone number.
///
/// The fragment must carry the page's literal `Tel.:` label; anything else
/// yields `None`. The digits are stripped of artifacts and spacing and
/// prefixed with the fixed country calling code.
pub fn normalize_phone(raw: &str) -> Option<String> {
    let digits = raw
        .trim()
        .strip_prefix("Tel.:")?
        .replace('Â', "")
        .replace('Ã', "")
        .replace('\u{a0}', "")
        .replace(' ', "");
    Some(format!("{}{}", COUNTRY_CALLING_CODE, digits.trim()))
}

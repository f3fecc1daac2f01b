// Parsing and formatting helpers shared by the loader and the report layer.
//
// All the "dirty" cell handling lives here so the rest of the code can work
// with clean `Option`-typed values. Formatting follows the Brazilian locale
// used by the source workbook: `.` for thousands, `,` for decimals.
use chrono::{NaiveDate, NaiveDateTime};
use num_format::{Locale, ToFormattedString};

/// Marker rendered for any metric whose denominator or inputs are missing.
/// Undefined values must never leak as `0`, `NaN` or `inf` into a table.
pub const NA: &str = "n/a";

/// Parse a locale-formatted decimal string into `f64`.
///
/// Accepts the workbook's convention: `.` as thousands separator and `,` as
/// decimal separator (`"1.234,56"` -> `1234.56`). Anything that still fails
/// after normalization returns `None` — coercion never raises.
pub fn parse_decimal_br(s: &str) -> Option<f64> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if s.chars().any(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    let normalized = s.replace('.', "").replace(',', ".");
    normalized.parse::<f64>().ok()
}

/// Parse a date cell permissively. Tries the ISO and Brazilian day-first
/// layouts, with and without a time component. Returns `None` on failure.
pub fn parse_date_safe(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    for fmt in ["%Y-%m-%d", "%d/%m/%Y"] {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d);
        }
    }
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%d/%m/%Y %H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }
    None
}

pub fn average(v: &[f64]) -> Option<f64> {
    if v.is_empty() {
        return None;
    }
    let sum: f64 = v.iter().copied().sum();
    Some(sum / v.len() as f64)
}

pub fn median(mut v: Vec<f64>) -> Option<f64> {
    if v.is_empty() {
        return None;
    }
    v.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = v.len() / 2;
    Some(if v.len() % 2 == 1 {
        v[mid]
    } else {
        (v[mid - 1] + v[mid]) / 2.0
    })
}

/// Format a number with Brazilian separators: `1234567.89` -> `"1.234.567,89"`.
///
/// The integer portion goes through `num-format` (which groups with commas)
/// and the separators are swapped afterwards, mirroring how the original
/// dashboard rendered currency.
pub fn format_number_br(n: f64, decimals: usize) -> String {
    let neg = n < 0.0;
    let s = format!("{:.*}", decimals, n.abs());
    let mut parts = s.split('.');
    let int_part = parts.next().unwrap_or("0");
    let frac_part = parts.next();
    let int_val: i64 = int_part.parse().unwrap_or(0);
    let mut res = int_val.to_formatted_string(&Locale::en).replace(',', ".");
    if let Some(frac) = frac_part {
        res.push(',');
        res.push_str(frac);
    }
    if neg {
        format!("-{}", res)
    } else {
        res
    }
}

pub fn format_int_br(n: i64) -> String {
    n.to_formatted_string(&Locale::en).replace(',', ".")
}

/// Currency with no decimals, e.g. `"R$ 1.234.568"`. `None` renders as [`NA`].
pub fn format_money(v: Option<f64>) -> String {
    match v {
        Some(v) => format!("R$ {}", format_number_br(v, 0)),
        None => NA.to_string(),
    }
}

/// Percentage with one decimal, e.g. `"12,3%"`. `None` renders as [`NA`].
pub fn format_pct(v: Option<f64>) -> String {
    match v {
        Some(v) => format!("{}%", format_number_br(v, 1)),
        None => NA.to_string(),
    }
}

pub fn format_count(v: Option<f64>) -> String {
    match v {
        Some(v) => format_int_br(v.round() as i64),
        None => NA.to_string(),
    }
}

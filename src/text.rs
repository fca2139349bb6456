//! Shared text helpers: year inference, matching normalization and file-name slugs

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Fiscal-year ranges such as "2024-25", "2023/2024" or "2022–23"
    static ref YEAR_RANGE_REGEX: Regex = Regex::new(
        r"(20\d{2})\s*[-/–—]\s*(\d{2,4})"
    ).unwrap();

    // "FY24", "FY 2024", "fy-23"
    static ref FISCAL_YEAR_REGEX: Regex = Regex::new(
        r"(?i)fy[\s\-]?(\d{2,4})"
    ).unwrap();

    static ref YEAR_REGEX: Regex = Regex::new(r"20\d{2}").unwrap();
}

/// Complete a range end against the century of its start year ("2022", "23" -> 2023).
pub fn complete_range_end(start: i32, end_raw: &str) -> Option<i32> {
    let end: i32 = end_raw.parse().ok()?;
    if end_raw.len() == 2 {
        Some(start / 100 * 100 + end)
    } else {
        Some(end)
    }
}

/// Best-effort year inference from free text such as a title or URL.
///
/// A range resolves to its end year, provided the end is not earlier than
/// the year before its start. Otherwise an "FY" token is used, and failing
/// that the largest `20xx` number in the text.
pub fn guess_year(text: &str) -> Option<i32> {
    if text.is_empty() {
        return None;
    }

    if let Some(caps) = YEAR_RANGE_REGEX.captures(text) {
        let start: Option<i32> = caps[1].parse().ok();
        if let Some(start) = start {
            if let Some(end) = complete_range_end(start, &caps[2]) {
                if end >= start - 1 {
                    return Some(end);
                }
            }
        }
    }

    if let Some(caps) = FISCAL_YEAR_REGEX.captures(text) {
        let raw = &caps[1];
        let value: i32 = raw.parse().ok()?;
        return if raw.len() == 2 { Some(2000 + value) } else { Some(value) };
    }

    YEAR_REGEX
        .find_iter(text)
        .filter_map(|m| m.as_str().parse::<i32>().ok())
        .max()
}

/// Lower-case and strip everything that is not an ASCII letter or digit.
pub fn normalize(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect()
}

/// Join the non-empty parts and turn them into a lower-case `_`-separated slug.
pub fn safe_name(parts: &[&str]) -> String {
    let joined = parts
        .iter()
        .filter(|p| !p.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join("_");

    let mut slug = String::with_capacity(joined.len());
    let mut pending_separator = false;
    for c in joined.to_lowercase().chars() {
        if c.is_ascii_alphanumeric() {
            if pending_separator && !slug.is_empty() {
                slug.push('_');
            }
            pending_separator = false;
            slug.push(c);
        } else {
            pending_separator = true;
        }
    }
    slug
}

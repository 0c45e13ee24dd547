//! Small pure helpers shared by pages, commands and scenarios.

use crate::result::{CheckError, CheckResult};
use chrono::{SecondsFormat, Utc};
use regex::Regex;
use std::sync::OnceLock;

static EMAIL: OnceLock<Option<Regex>> = OnceLock::new();
static NUMBER: OnceLock<Option<Regex>> = OnceLock::new();

/// Numeric value of a displayed amount such as `Rs. 1300`
///
/// Everything except digits and `.` is dropped, then stray dots at either
/// end, so the `.` of a currency prefix never becomes a decimal point.
pub fn parse_currency(text: &str) -> CheckResult<f64> {
    let kept: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    let digits = kept.trim_matches('.');
    digits
        .parse::<f64>()
        .map_err(|_| CheckError::assertion(format!("no amount in {text:?}")))
}

/// Same elements, any order
#[must_use]
pub fn arrays_equal_ignore_order<T: Ord + Clone>(a: &[T], b: &[T]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut a = a.to_vec();
    let mut b = b.to_vec();
    a.sort();
    b.sort();
    a == b
}

/// Capitalize each whitespace-separated word, lowercasing the rest
#[must_use]
pub fn to_title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut at_word_start = true;
    for c in s.chars() {
        if c.is_whitespace() {
            at_word_start = true;
            out.push(c);
        } else if at_word_start {
            at_word_start = false;
            out.extend(c.to_uppercase());
        } else {
            out.extend(c.to_lowercase());
        }
    }
    out
}

/// `local@domain.tld` shape check
#[must_use]
pub fn is_valid_email(email: &str) -> bool {
    EMAIL
        .get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").ok())
        .as_ref()
        .is_some_and(|re| re.is_match(email))
}

/// Every integer or decimal number in a string
#[must_use]
pub fn extract_numbers(s: &str) -> Vec<f64> {
    NUMBER
        .get_or_init(|| Regex::new(r"\d+(\.\d+)?").ok())
        .as_ref()
        .map(|re| {
            re.find_iter(s)
                .filter_map(|m| m.as_str().parse().ok())
                .collect()
        })
        .unwrap_or_default()
}

/// Current time as `iso` (RFC 3339, default), `unix` seconds or `readable`
#[must_use]
pub fn timestamp(format: &str) -> String {
    let now = Utc::now();
    match format.to_ascii_lowercase().as_str() {
        "unix" => now.timestamp().to_string(),
        "readable" => now.format("%Y-%m-%d %H:%M:%S").to_string(),
        _ => now.to_rfc3339_opts(SecondsFormat::Millis, true),
    }
}

/// Timestamp safe for file names
#[must_use]
pub fn file_stamp() -> String {
    timestamp("iso").replace([':', '.'], "-")
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_parse_currency() {
        assert!((parse_currency("Rs. 500").unwrap() - 500.0).abs() < f64::EPSILON);
        assert!((parse_currency("Rs. 1,300").unwrap() - 1300.0).abs() < f64::EPSILON);
        assert!((parse_currency("$12.50").unwrap() - 12.5).abs() < f64::EPSILON);
        assert!(parse_currency("free").is_err());
    }

    #[test]
    fn test_arrays_equal_ignore_order() {
        assert!(arrays_equal_ignore_order(&["Polo", "H&M"], &["H&M", "Polo"]));
        assert!(!arrays_equal_ignore_order(&["Polo"], &["Polo", "Polo"]));
        assert!(!arrays_equal_ignore_order(&[1, 2], &[1, 3]));
    }

    #[test]
    fn test_title_case() {
        assert_eq!(to_title_case("blue TOP for women"), "Blue Top For Women");
        assert_eq!(to_title_case(""), "");
    }

    #[test]
    fn test_email_shape() {
        assert!(is_valid_email("testuser_1@example.com"));
        assert!(!is_valid_email("no at sign.com"));
        assert!(!is_valid_email("a@b"));
    }

    #[test]
    fn test_extract_numbers() {
        assert_eq!(extract_numbers("Rs. 500 x 2 = 1000.50"), vec![500.0, 2.0, 1000.5]);
        assert!(extract_numbers("none").is_empty());
    }

    #[test]
    fn test_timestamp_formats() {
        assert!(timestamp("unix").parse::<i64>().is_ok());
        assert!(timestamp("ISO").ends_with('Z'));
        assert_eq!(timestamp("readable").len(), 19);
        assert!(!file_stamp().contains(':'));
    }

    proptest! {
        #[test]
        fn prop_currency_roundtrips_integers(n in 0u32..10_000_000) {
            let shown = format!("Rs. {n}");
            prop_assert!((parse_currency(&shown).unwrap() - f64::from(n)).abs() < f64::EPSILON);
        }
    }
}

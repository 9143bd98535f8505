//! Phone and email extraction from free text.

use once_cell::sync::Lazy;
use regex::Regex;

/// Russian mobile numbers: +7/8 prefix, optional separators, 10 digits.
static PHONE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:\+7|8)[- ]?(?:\(\d{3}\)|\d{3})[- ]?\d{3}[- ]?\d{2}[- ]?\d{2}").unwrap()
});

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b").unwrap());

/// All phone-shaped matches in order of appearance. In-text duplicates
/// are preserved; deduplication against the store happens later, on the
/// canonical forms.
pub fn find_phone_numbers(text: &str) -> Vec<String> {
    PHONE_RE
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// All email-shaped matches in order of appearance, verbatim.
pub fn find_emails(text: &str) -> Vec<String> {
    EMAIL_RE
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Canonical display form used as the deduplication key.
///
/// Strips every non-digit, then formats from digit positions 1..11.
/// A leading digit other than 7/8 returns the input unchanged.
pub fn format_phone_number(number: &str) -> String {
    let digits: String = number.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.starts_with('8') {
        format!(
            "8 ({}) {}-{}-{}",
            digit_group(&digits, 1, 4),
            digit_group(&digits, 4, 7),
            digit_group(&digits, 7, 9),
            digit_group(&digits, 9, 11)
        )
    } else if digits.starts_with('7') {
        format!(
            "+7 ({}) {}-{}-{}",
            digit_group(&digits, 1, 4),
            digit_group(&digits, 4, 7),
            digit_group(&digits, 7, 9),
            digit_group(&digits, 9, 11)
        )
    } else {
        number.to_string()
    }
}

// Out-of-range bounds clamp to a short (possibly empty) group rather
// than panicking; the digit string is ASCII so byte indexing is safe.
fn digit_group(digits: &str, start: usize, end: usize) -> &str {
    let end = end.min(digits.len());
    let start = start.min(end);
    &digits[start..end]
}

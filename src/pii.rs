//! Heuristic detection of personally-identifying free text.
//!
//! Flags email addresses and phone numbers. Digit runs that are obviously not
//! phone numbers (all zeros, all ones, counting sequences) are ignored. A
//! rejected candidate does not hide an overlapping one that starts later.

use regex::Regex;
use std::sync::LazyLock;

const EMAIL_PATTERN: &str = r"(?i)[a-z0-9._%+-]+@[a-z0-9.-]+\.[a-z]{2,}";

const PHONE_PATTERNS: [&str; 3] = [
    // North American: optional +1, area code with optional parens, exchange, subscriber
    r"(?:\+?1[-.\s]?)?\(?\d{3}\)?[-.\s]?\d{3}[-.\s]?\d{4}",
    // International: +CC then up to four digit groups
    r"\+\d{1,3}[-.\s]?\d{1,4}[-.\s]?\d{1,4}[-.\s]?\d{1,4}[-.\s]?\d{1,9}",
    // Bare digit run
    r"\d{10,11}",
];

const MIN_PHONE_DIGITS: usize = 10;
const MAX_PHONE_DIGITS: usize = 15;

static EMAIL: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(EMAIL_PATTERN).ok());

static PHONES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    PHONE_PATTERNS
        .iter()
        .filter_map(|pattern| Regex::new(pattern).ok())
        .collect()
});

/// Whether `text` looks like it contains an email address or phone number.
///
/// ```
/// use datapress::pii::has_pii;
///
/// assert!(has_pii("Contact me at user@example.com"));
/// assert!(has_pii("Call (415) 555-7890 for info"));
/// assert!(!has_pii("Numbers like 0123456789 are filtered"));
/// ```
pub fn has_pii(text: &str) -> bool {
    if text.trim().is_empty() {
        return false;
    }

    if EMAIL.as_ref().is_some_and(|re| re.is_match(text)) {
        return true;
    }

    PHONES.iter().any(|re| has_plausible_match(re, text))
}

/// Scan for a plausible candidate, retrying one character past each
/// rejected match so overlapping candidates are still tried.
fn has_plausible_match(re: &Regex, text: &str) -> bool {
    let mut start = 0;
    while let Some(m) = re.find_at(text, start) {
        if is_plausible_phone(m.as_str()) {
            return true;
        }
        let step = text[m.start()..].chars().next().map_or(1, char::len_utf8);
        start = m.start() + step;
    }
    false
}

fn is_plausible_phone(candidate: &str) -> bool {
    let digits: String = candidate.chars().filter(char::is_ascii_digit).collect();

    if !(MIN_PHONE_DIGITS..=MAX_PHONE_DIGITS).contains(&digits.len()) {
        return false;
    }
    if digits.bytes().all(|b| b == b'0') || digits.bytes().all(|b| b == b'1') {
        return false;
    }
    !matches!(digits.as_str(), "1234567890" | "0123456789")
}

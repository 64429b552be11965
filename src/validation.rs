//! Small input validators shared by configuration and request handlers.

use std::sync::LazyLock;

use regex::Regex;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9\-]+(\.[A-Za-z0-9\-]+)+$")
        .expect("email pattern compiles")
});

/// Returns true when `value` looks like a deliverable email address.
pub fn is_valid_email(value: &str) -> bool {
    value.len() <= 255 && EMAIL_RE.is_match(value)
}

/// Lowercases and trims an email for storage and lookups.
pub fn normalize_email(value: &str) -> String {
    value.trim().to_ascii_lowercase()
}

/// Trims `value` and rejects it when empty or longer than `max` characters.
pub fn required_text(value: &str, max: usize) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed.chars().count() > max {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_common_addresses() {
        assert!(is_valid_email("owner@bistro.example"));
        assert!(is_valid_email("first.last+tag@sub.domain.io"));
        assert!(is_valid_email("platform@system.local"));
    }

    #[test]
    fn rejects_malformed_addresses() {
        assert!(!is_valid_email(""));
        assert!(!is_valid_email("no-at-sign"));
        assert!(!is_valid_email("two@@example.com"));
        assert!(!is_valid_email("user@nodot"));
        assert!(!is_valid_email("spaces in@example.com"));
    }

    #[test]
    fn normalizes_email_case_and_whitespace() {
        assert_eq!(normalize_email("  Chef@Bistro.Example "), "chef@bistro.example");
    }

    #[test]
    fn required_text_enforces_bounds() {
        assert_eq!(required_text("  Starters ", 20), Some("Starters".to_string()));
        assert_eq!(required_text("   ", 20), None);
        assert_eq!(required_text(&"x".repeat(21), 20), None);
    }
}

use std::sync::LazyLock;

use regex::Regex;

// Intentionally loose: one local part, one domain, at least one dot in the
// domain. Deliverability is the mail provider's problem, not ours.
static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email regex is valid"));

/// Trim surrounding whitespace and lowercase, so lookups and the uniqueness
/// check see one canonical form per address.
pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_addresses() {
        assert!(is_valid_email("user@example.com"));
        assert!(is_valid_email("first.last+tag@sub.example.co"));
    }

    #[test]
    fn rejects_malformed_addresses() {
        assert!(!is_valid_email(""));
        assert!(!is_valid_email("plainaddress"));
        assert!(!is_valid_email("no-at.example.com"));
        assert!(!is_valid_email("user@nodot"));
        assert!(!is_valid_email("spaces in@example.com"));
        assert!(!is_valid_email("user@@example.com"));
    }

    #[test]
    fn normalization_trims_and_lowercases() {
        assert_eq!(normalize_email("  User@Example.COM  "), "user@example.com");
    }
}

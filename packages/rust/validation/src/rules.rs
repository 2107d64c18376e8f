//! Field-level checks used by the contact form validator.
//!
//! Each rule is a pure `&str -> bool` predicate.

use std::sync::LazyLock;

use regex::Regex;

/// Absent, empty, or whitespace-only.
pub(crate) fn is_blank(value: Option<&str>) -> bool {
    value.is_none_or(|v| v.trim().is_empty())
}

/// Whether `value` has the shape of an email address.
///
/// Local part: dot-separated atoms without `<>()[]\.,;:@"` or whitespace,
/// or a quoted string. Domain: a bracketed IPv4 literal, or one or more
/// `[A-Za-z0-9-]+.` labels followed by a TLD of 2+ letters.
pub fn is_valid_email(value: &str) -> bool {
    static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(
            r#"^(([^<>()\[\]\\.,;:\s@"]+(\.[^<>()\[\]\\.,;:\s@"]+)*)|(".+"))@((\[[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}\])|(([a-zA-Z\-0-9]+\.)+[a-zA-Z]{2,}))$"#,
        )
        .expect("valid regex")
    });

    EMAIL_RE.is_match(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_values() {
        assert!(is_blank(None));
        assert!(is_blank(Some("")));
        assert!(is_blank(Some(" \t\n")));
        assert!(is_blank(Some("\u{3000}")));
        assert!(!is_blank(Some(" a ")));
    }

    #[test]
    fn accepts_common_addresses() {
        for ok in [
            "taro@example.com",
            "first.last@sub.example.co.jp",
            "user+tag@example-mail.org",
            "\"quoted name\"@example.com",
            "ops@[192.168.0.1]",
        ] {
            assert!(is_valid_email(ok), "expected valid: {ok}");
        }
    }

    #[test]
    fn rejects_malformed_addresses() {
        for bad in [
            "bad",
            "no-at-sign.example.com",
            "taro@",
            "@example.com",
            "taro@localhost",
            "taro@example.c",
            "taro@example.123",
            "two@@example.com",
            "dot..dot@example.com",
            ".lead@example.com",
            "spa ce@example.com",
            " taro@example.com",
            "taro@[999.1.1]",
        ] {
            assert!(!is_valid_email(bad), "expected invalid: {bad}");
        }
    }
}

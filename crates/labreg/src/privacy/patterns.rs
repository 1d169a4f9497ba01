//! Regex redaction of personal data inside free text.
//!
//! Audit reasons and values are free text written by the application, and
//! they routinely contain register numbers or addresses. These patterns
//! catch the common shapes so the audit trail can be shipped without them.

use std::sync::OnceLock;

use regex::Regex;

/// A compiled redaction pattern.
#[derive(Debug)]
pub struct RedactionPattern {
    /// Name of the pattern for identification.
    pub name: &'static str,
    regex: Regex,
}

impl RedactionPattern {
    /// Create a new pattern.
    ///
    /// # Panics
    ///
    /// Panics if the regex pattern is invalid.
    #[must_use]
    pub fn new(name: &'static str, pattern: &str) -> Self {
        Self {
            name,
            regex: Regex::new(pattern).expect("Invalid regex pattern"),
        }
    }

    /// Check if the text matches this pattern.
    #[must_use]
    pub fn matches(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }

    /// Replace every match using `mask`.
    #[must_use]
    pub fn redact_with(&self, text: &str, mask: impl Fn(&str) -> String) -> String {
        self.regex
            .replace_all(text, |caps: &regex::Captures| mask(&caps[0]))
            .into_owned()
    }
}

/// Built-in patterns, most specific first.
#[must_use]
pub fn builtin_patterns() -> &'static [RedactionPattern] {
    static PATTERNS: OnceLock<Vec<RedactionPattern>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        vec![
            RedactionPattern::new("email", r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}"),
            // Greek landline and mobile numbers, optional +30 prefix.
            RedactionPattern::new("phone", r"(?:\+30\s?)?\b[26]\d{9}\b"),
            // Register numbers are four to six digits.
            RedactionPattern::new("register_number", r"\b\d{4,6}\b"),
        ]
    })
}

/// Redact personal data in free text using the built-in patterns.
///
/// Matches are masked the same way as record fields, so a redacted line
/// still shows the first and last characters for correlation.
#[must_use]
pub fn redact_text(text: &str) -> String {
    let mut result = text.to_string();
    for pattern in builtin_patterns() {
        if !pattern.matches(&result) {
            continue;
        }
        result = if pattern.name == "email" {
            pattern.redact_with(&result, |m| {
                super::mask_email(m).unwrap_or_else(|| "***".to_string())
            })
        } else {
            pattern.redact_with(&result, super::mask_identifier)
        };
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pattern(name: &str) -> &'static RedactionPattern {
        builtin_patterns().iter().find(|p| p.name == name).unwrap()
    }

    #[test]
    fn test_builtin_patterns_have_names() {
        let patterns = builtin_patterns();
        assert_eq!(patterns.len(), 3);
        for p in patterns {
            assert!(!p.name.is_empty());
        }
    }

    #[test]
    fn test_email_pattern() {
        assert!(pattern("email").matches("write to prof@uoi.gr today"));
        assert!(!pattern("email").matches("no address here"));
    }

    #[test]
    fn test_phone_pattern() {
        assert!(pattern("phone").matches("call 2681050448"));
        assert!(pattern("phone").matches("+30 6912345678"));
        assert!(!pattern("phone").matches("1681050448"));
    }

    #[test]
    fn test_redact_register_number() {
        assert_eq!(
            redact_text("Student 13628 registered to lab 1"),
            "Student 13***28 registered to lab 1"
        );
    }

    #[test]
    fn test_redact_email_and_phone() {
        let redacted = redact_text("contact prof@uoi.gr or 2681050448");
        assert_eq!(redacted, "contact pr***@uoi.gr or 26***48");
    }

    #[test]
    fn test_redact_leaves_plain_text() {
        assert_eq!(redact_text("Group 3"), "Group 3");
    }
}

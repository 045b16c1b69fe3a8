//! Consistency checks for the canary rule form.
//!
//! These rules mirror the checks the settings endpoint performs so users get
//! feedback before a request is sent. They never replace the server-side
//! checks. All three rules always run and every violation is reported, in
//! rule order: header exclusivity, header pattern syntax, weight range.

use fancy_regex::Regex;
use thiserror::Error;

use super::fields::{CanaryField, CanaryFields};

pub const MIN_WEIGHT: i64 = 0;
pub const MAX_WEIGHT: i64 = 100;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("canary-by-header-value and canary-by-header-pattern cannot both be set")]
    HeaderConflict,
    #[error("canary-by-header-pattern is not a valid regular expression: {reason}")]
    InvalidPattern { reason: String },
    #[error("canary-weight must be an integer between 0 and 100")]
    WeightOutOfRange,
}

impl ValidationError {
    /// The field the violation is attached to.
    pub fn field(&self) -> CanaryField {
        match self {
            Self::HeaderConflict => CanaryField::HeaderValue,
            Self::InvalidPattern { .. } => CanaryField::HeaderPattern,
            Self::WeightOutOfRange => CanaryField::Weight,
        }
    }

    pub fn message(&self) -> String {
        self.to_string()
    }
}

/// Run every rule against `fields` and collect the violations.
pub fn validate(fields: &CanaryFields) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    let header_value = fields.header_value.trim();
    let header_pattern = fields.header_pattern.trim();

    if !header_value.is_empty() && !header_pattern.is_empty() {
        errors.push(ValidationError::HeaderConflict);
    }

    if !header_pattern.is_empty()
        && let Err(err) = Regex::new(header_pattern)
    {
        errors.push(ValidationError::InvalidPattern {
            reason: single_line(&err.to_string()),
        });
    }

    match parse_weight(&fields.weight) {
        Some(weight) if (MIN_WEIGHT..=MAX_WEIGHT).contains(&weight) => {}
        _ => errors.push(ValidationError::WeightOutOfRange),
    }

    errors
}

/// Compiler diagnostics may span several lines with a caret diagram; keep the
/// final non-empty line, which carries the description.
fn single_line(message: &str) -> String {
    message
        .lines()
        .map(str::trim)
        .rfind(|line| !line.is_empty())
        .unwrap_or(message)
        .to_string()
}

/// Lenient base-10 integer parse: leading whitespace and an optional sign are
/// accepted, digits are read up to the first non-digit, and anything after is
/// ignored. Returns `None` when no digit is found. Values too large for `i64`
/// saturate so they still fail the range check.
pub fn parse_weight(raw: &str) -> Option<i64> {
    let rest = raw.trim_start();
    let (negative, rest) = match rest.as_bytes().first() {
        Some(b'-') => (true, &rest[1..]),
        Some(b'+') => (false, &rest[1..]),
        _ => (false, rest),
    };

    let digits_len = rest.bytes().take_while(u8::is_ascii_digit).count();
    if digits_len == 0 {
        return None;
    }

    let magnitude = rest[..digits_len].parse::<i64>().unwrap_or(i64::MAX);
    Some(if negative { -magnitude } else { magnitude })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(value: &str, pattern: &str, weight: &str) -> CanaryFields {
        CanaryFields::new(value, pattern, weight)
    }

    #[test]
    fn both_header_fields_conflict() {
        let errors = validate(&fields("always", "^v2$", "10"));
        assert_eq!(errors, vec![ValidationError::HeaderConflict]);
        assert_eq!(errors[0].field(), CanaryField::HeaderValue);
    }

    #[test]
    fn whitespace_only_header_value_does_not_conflict() {
        let errors = validate(&fields("   ", "^v2$", "10"));
        assert!(errors.is_empty());
    }

    #[test]
    fn invalid_pattern_carries_compiler_message() {
        let errors = validate(&fields("", "(", "0"));
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field(), CanaryField::HeaderPattern);
        match &errors[0] {
            ValidationError::InvalidPattern { reason } => {
                assert!(!reason.is_empty());
                assert!(!reason.contains('\n'), "{reason:?}");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn valid_or_empty_patterns_pass() {
        for pattern in [
            ".*",
            "",
            "^canary-(a|b)$",
            "  ",
            "^(?!internal).*$",
            "(?<=v)2$",
            "(a)\\1",
        ] {
            let errors = validate(&fields("", pattern, "50"));
            assert!(errors.is_empty(), "pattern {pattern:?} produced {errors:?}");
        }
    }

    #[test]
    fn multi_line_diagnostics_keep_last_line() {
        let message = "regex parse error:\n    (\n    ^\nerror: unclosed group";
        assert_eq!(single_line(message), "error: unclosed group");
        assert_eq!(single_line("plain message"), "plain message");
    }

    #[test]
    fn weight_range_is_inclusive() {
        for weight in ["0", "100", "42", " 7", "+5", "-0"] {
            assert!(validate(&fields("", "", weight)).is_empty(), "{weight}");
        }
        for weight in ["101", "-1", "abc", "", "  ", "99999999999999999999999"] {
            let errors = validate(&fields("", "", weight));
            assert_eq!(errors, vec![ValidationError::WeightOutOfRange], "{weight}");
        }
    }

    #[test]
    fn weight_parse_stops_at_first_non_digit() {
        assert_eq!(parse_weight("50abc"), Some(50));
        assert_eq!(parse_weight("12.9"), Some(12));
        assert_eq!(parse_weight("x12"), None);
        assert_eq!(parse_weight("-"), None);
    }

    #[test]
    fn every_violation_is_reported_in_rule_order() {
        let errors = validate(&fields("always", "(", "101"));
        let order: Vec<_> = errors.iter().map(ValidationError::field).collect();
        assert_eq!(
            order,
            vec![
                CanaryField::HeaderValue,
                CanaryField::HeaderPattern,
                CanaryField::Weight
            ]
        );
    }
}

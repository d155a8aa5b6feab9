use std::sync::{Arc, LazyLock};

use moka::sync::Cache;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{error::Error, filter::Operator};

/// A single filter or record value.
///
/// Integer and floating-point tokens both map to `Number`; everything else
/// is a `Literal`. After compilation, the literal of a `:` term is either
/// the bare existence sentinel `*` or an anchored regex.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    #[serde(rename = "literal")]
    Literal(String),
    #[serde(rename = "number")]
    Number(f64),
}

impl Value {
    /// Equality: ASCII case-insensitive for literals, exact for numbers.
    /// Values of different kinds never compare equal.
    pub(crate) fn equal(&self, filter_value: &Value) -> bool {
        match (self, filter_value) {
            (Value::Literal(a), Value::Literal(b)) => a.eq_ignore_ascii_case(b),
            (Value::Number(a), Value::Number(b)) => a == b,
            _ => false,
        }
    }

    /// Ordering: lexicographic for literals, IEEE-754 for numbers.
    pub(crate) fn less_than(&self, filter_value: &Value) -> bool {
        match (self, filter_value) {
            (Value::Literal(a), Value::Literal(b)) => a < b,
            (Value::Number(a), Value::Number(b)) => a < b,
            _ => false,
        }
    }

    pub(crate) fn greater_than(&self, filter_value: &Value) -> bool {
        match (self, filter_value) {
            (Value::Literal(a), Value::Literal(b)) => a > b,
            (Value::Number(a), Value::Number(b)) => a > b,
            _ => false,
        }
    }

    /// Match `filter_value` as a regex against this value. Numbers are
    /// matched textually, with the pattern side quote-meta escaped.
    fn matches_regexp(&self, filter_value: &Value, simple_pattern: bool) -> Result<bool, Error> {
        // Simple patterns (the `:` operator) match case insensitively.
        let prefix = if simple_pattern { "(?i)" } else { "" };
        match (self, filter_value) {
            (Value::Literal(text), Value::Literal(pattern)) => {
                let regex = cached_regex(&format!("{prefix}{pattern}"))?;
                Ok(regex.is_match(text))
            }
            (Value::Number(number), Value::Number(pattern)) => {
                let pattern = regex::escape(&pattern.to_string());
                let regex = cached_regex(&format!("{prefix}{pattern}"))?;
                Ok(regex.is_match(&number.to_string()))
            }
            _ => Ok(false),
        }
    }

    /// Compare this (record-side) value against a filter value.
    pub(crate) fn compare(&self, operator: Operator, filter_value: &Value) -> Result<bool, Error> {
        match operator {
            Operator::Colon => self.matches_regexp(filter_value, true),
            Operator::Eq => Ok(self.equal(filter_value)),
            Operator::Ne => Ok(!self.equal(filter_value)),
            Operator::Lt => Ok(self.less_than(filter_value)),
            Operator::Le => Ok(self.equal(filter_value) || self.less_than(filter_value)),
            Operator::Ge => Ok(self.equal(filter_value) || self.greater_than(filter_value)),
            Operator::Gt => Ok(self.greater_than(filter_value)),
            Operator::Regex => self.matches_regexp(filter_value, false),
            Operator::NotRegex => match self.matches_regexp(filter_value, false) {
                Ok(matched) => Ok(!matched),
                // A pattern that fails to compile under `!~` is a non-match,
                // not an error.
                Err(error) => {
                    tracing::debug!(%error, "uncompilable !~ pattern treated as a non-match");
                    Ok(false)
                }
            },
        }
    }
}

/// Expand a shell-style glob into an anchored regex: `*` matches any run of
/// characters, everything else is literal. The bare existence sentinel `*`
/// is handled by the caller and never reaches this function.
pub(crate) fn wildcard_to_regexp(pattern: &str) -> String {
    let mut result = String::with_capacity(pattern.len() + 8);
    result.push('^');
    for (i, component) in pattern.split('*').enumerate() {
        if i > 0 {
            result.push_str(".*");
        }
        result.push_str(&regex::escape(component));
    }
    result.push('$');
    result
}

/// Strip a matching pair of single or double quotes, or `None` if the
/// literal is not fully quoted.
pub(crate) fn unquote(literal: &str) -> Option<String> {
    let mut chars = literal.chars();
    let (first, last) = (chars.next()?, chars.next_back()?);
    if (first == '"' || first == '\'') && first == last {
        Some(literal[1..literal.len() - 1].to_string())
    } else {
        None
    }
}

/// The compiled regexes, cached process-wide.
///
/// It is useful to avoid compiling the same pattern once per record.
static REGEX_CACHE: LazyLock<Cache<String, Arc<Regex>>> = LazyLock::new(|| Cache::new(128));

/// Get a regex (if cached, return the cached one; otherwise, compile and
/// cache it).
pub(crate) fn cached_regex(pattern: &str) -> Result<Arc<Regex>, Error> {
    if let Some(cached) = REGEX_CACHE.get(pattern) {
        return Ok(cached);
    }
    let regex = Regex::new(pattern).map_err(|source| Error::RegexCompile {
        pattern: pattern.to_string(),
        source,
    })?;
    let regex = Arc::new(regex);
    REGEX_CACHE.insert(pattern.to_string(), regex.clone());
    Ok(regex)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wildcard_to_regexp() {
        let cases = [
            ("appgate*", "^appgate.*$"),
            ("*big", "^.*big$"),
            ("sm*all", "^sm.*all$"),
            ("b*ol*", "^b.*ol.*$"),
            ("Intel Skylake", "^Intel Skylake$"),
            // Regex metacharacters in the glob are literal.
            ("a.b", r"^a\.b$"),
            ("w3-a.*", r"^w3\-a\..*$"),
            ("", "^$"),
        ];
        for (pattern, want) in cases {
            assert_eq!(wildcard_to_regexp(pattern), want, "pattern {pattern:?}");
        }
    }

    #[test]
    fn test_wildcard_matches_like_a_glob() {
        // The expanded regex accepts exactly the strings the glob accepts,
        // anchored end to end.
        let cases = [
            ("appgate*", "appgate-dev", true),
            ("appgate*", "dev-appgate", false),
            ("*big", "big", true),
            ("*big", "biggest", false),
            ("sm*all", "small", true),
            ("sm*all", "smallest", false),
            ("a.b", "a.b", true),
            ("a.b", "axb", false),
        ];
        for (pattern, input, want) in cases {
            let regex = cached_regex(&wildcard_to_regexp(pattern)).unwrap();
            assert_eq!(regex.is_match(input), want, "{pattern:?} vs {input:?}");
        }
    }

    #[test]
    fn test_unquote() {
        assert_eq!(unquote(r#""red""#), Some("red".to_string()));
        assert_eq!(unquote("'med*'"), Some("med*".to_string()));
        assert_eq!(unquote("red"), None);
        assert_eq!(unquote(r#""red'"#), None);
        assert_eq!(unquote(r#"""#), None);
        assert_eq!(unquote(""), None);
        assert_eq!(unquote(r#""""#), Some(String::new()));
    }

    #[test]
    fn test_equal_is_case_insensitive_for_literals() {
        let active = Value::Literal("ACTIVE".to_string());
        assert!(Value::Literal("active".to_string()).equal(&active));
        assert!(!Value::Literal("deleted".to_string()).equal(&active));
        assert!(Value::Number(1.0).equal(&Value::Number(1.0)));
        assert!(!Value::Number(1.0).equal(&Value::Number(2.0)));
        // Different kinds never compare equal.
        assert!(!Value::Literal("1".to_string()).equal(&Value::Number(1.0)));
    }

    #[test]
    fn test_compare_orderings() {
        let record = Value::Literal("b".to_string());
        let filter_value = Value::Literal("b".to_string());
        assert!(record.compare(Operator::Le, &filter_value).unwrap());
        assert!(record.compare(Operator::Ge, &filter_value).unwrap());
        assert!(!record.compare(Operator::Lt, &filter_value).unwrap());
        assert!(!record.compare(Operator::Gt, &filter_value).unwrap());

        let record = Value::Number(-2.5e10);
        let filter_value = Value::Number(-2.4e10);
        assert!(record.compare(Operator::Lt, &filter_value).unwrap());
        assert!(!record.compare(Operator::Ge, &filter_value).unwrap());
        assert!(record.compare(Operator::Ne, &filter_value).unwrap());
    }

    #[test]
    fn test_compare_simple_pattern_is_case_insensitive() {
        let pattern = Value::Literal("^howl.*$".to_string());
        let record = Value::Literal("HOWL-project".to_string());
        assert!(record.compare(Operator::Colon, &pattern).unwrap());
        // `~` keeps case sensitivity.
        assert!(!record.compare(Operator::Regex, &pattern).unwrap());
    }

    #[test]
    fn test_compare_numbers_match_textually() {
        let record = Value::Number(-56.0);
        assert!(record
            .compare(Operator::Colon, &Value::Number(-56.0))
            .unwrap());
        // The textual match is a substring match, like any unanchored regex.
        assert!(record
            .compare(Operator::Colon, &Value::Number(56.0))
            .unwrap());
        assert!(!record
            .compare(Operator::Colon, &Value::Number(57.0))
            .unwrap());
        assert!(Value::Number(25000000000.0)
            .compare(Operator::Colon, &Value::Number(2.5e10))
            .unwrap());
    }

    #[test]
    fn test_compare_swallows_regex_errors_under_not_regex_only() {
        let broken = Value::Literal("b(ol".to_string());
        let record = Value::Literal("bol".to_string());
        assert!(matches!(
            record.compare(Operator::Regex, &broken),
            Err(Error::RegexCompile { .. })
        ));
        assert!(!record.compare(Operator::NotRegex, &broken).unwrap());
    }
}

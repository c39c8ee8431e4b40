//! Coercion of raw parameter strings into typed values.
//!
//! Every filter owns a [`Coercer`] that runs before its predicate. Coercion is
//! the only place where a raw string is interpreted; a failure here is always
//! an [`InvalidArgument`].

use regex::Regex;

use crate::error::{ConfigError, InvalidArgument};
use crate::value::{Groups, Value};

/// Separator for list values.
pub const LIST_DELIMITER: char = ',';

/// The shape of value a coercer hands to a handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// A single [`Value`], passed positionally.
    Value,
    /// Named capture groups, passed by name.
    Groups,
}

impl Shape {
    /// Describes what a handler of this shape accepts.
    pub fn describe(self) -> &'static str {
        match self {
            Shape::Value => "(query, value)",
            Shape::Groups => "(query, named groups)",
        }
    }
}

/// A compiled pattern that must match the whole raw value.
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    regex: Regex,
    named: bool,
}

impl Pattern {
    /// Compiles a pattern.
    ///
    /// The pattern is anchored at both ends, so `\d+` accepts `"42"` but not
    /// `"42a"`.
    pub fn new(source: &str) -> Result<Self, ConfigError> {
        let invalid = |e: regex::Error| ConfigError::InvalidPattern {
            pattern: source.to_string(),
            source: e,
        };
        Regex::new(source).map_err(invalid)?;

        // In verbose mode a trailing `# comment` swallows the closing group
        // unless a newline ends it first.
        let regex = Regex::new(&format!(r"\A(?:{source})\z"))
            .or_else(|_| Regex::new(&format!("\\A(?:{source}\n)\\z")))
            .map_err(invalid)?;
        let named = regex.capture_names().flatten().next().is_some();
        Ok(Pattern {
            source: source.to_string(),
            regex,
            named,
        })
    }

    /// Returns the pattern as written.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Returns `true` if the pattern declares named capture groups.
    pub fn has_named_groups(&self) -> bool {
        self.named
    }

    /// Matches a raw value.
    ///
    /// With named groups the result is [`Value::Groups`]; otherwise it is the
    /// whole match as [`Value::String`].
    pub fn prepare(&self, raw: &str) -> Result<Value, InvalidArgument> {
        let caps = self
            .regex
            .captures(raw)
            .ok_or_else(|| InvalidArgument::PatternMismatch {
                value: raw.to_string(),
                pattern: self.source.clone(),
            })?;

        if !self.named {
            return Ok(Value::String(caps[0].to_string()));
        }

        let mut groups = Groups::new();
        for name in self.regex.capture_names().flatten() {
            groups.insert(name, caps.name(name).map(|m| m.as_str().to_string()));
        }
        Ok(Value::Groups(groups))
    }
}

/// Converts a raw string into a [`Value`].
#[derive(Debug, Clone)]
pub enum Coercer {
    /// Passes the string through unchanged. Never fails.
    String,
    /// Parses a signed integer.
    Integer,
    /// Parses a floating point number.
    Float,
    /// Requires a full pattern match.
    Pattern(Pattern),
    /// Splits on [`LIST_DELIMITER`] and coerces every part.
    List(Box<Coercer>),
}

impl Coercer {
    /// Coerces a raw value.
    pub fn prepare(&self, raw: &str) -> Result<Value, InvalidArgument> {
        match self {
            Coercer::String => Ok(Value::String(raw.to_string())),
            Coercer::Integer => raw
                .trim()
                .parse::<i64>()
                .map(Value::Integer)
                .map_err(|e| InvalidArgument::NotCoercible {
                    value: raw.to_string(),
                    target: self.target_name(),
                    source: Box::new(e),
                }),
            Coercer::Float => raw
                .trim()
                .parse::<f64>()
                .map(Value::Float)
                .map_err(|e| InvalidArgument::NotCoercible {
                    value: raw.to_string(),
                    target: self.target_name(),
                    source: Box::new(e),
                }),
            Coercer::Pattern(pattern) => pattern.prepare(raw),
            Coercer::List(inner) => raw
                .split(LIST_DELIMITER)
                .map(|part| inner.prepare(part))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::List)
                .map_err(|e| InvalidArgument::InvalidList {
                    value: raw.to_string(),
                    source: Box::new(e),
                }),
        }
    }

    /// Returns the shape a handler receives after this coercion.
    pub fn shape(&self) -> Shape {
        match self {
            Coercer::Pattern(p) if p.has_named_groups() => Shape::Groups,
            _ => Shape::Value,
        }
    }

    /// Returns the target type name used in diagnostics.
    pub fn target_name(&self) -> &'static str {
        match self {
            Coercer::String => "string",
            Coercer::Integer => "integer",
            Coercer::Float => "float",
            Coercer::Pattern(_) => "pattern",
            Coercer::List(_) => "list",
        }
    }
}

impl From<Pattern> for Coercer {
    fn from(pattern: Pattern) -> Self {
        Coercer::Pattern(pattern)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn integer_coercion() {
        assert_eq!(Coercer::Integer.prepare("42").unwrap(), Value::Integer(42));
        assert_eq!(Coercer::Integer.prepare(" -7 ").unwrap(), Value::Integer(-7));

        let err = Coercer::Integer.prepare("abc").unwrap_err();
        assert!(matches!(
            err,
            InvalidArgument::NotCoercible { ref value, target: "integer", .. } if value == "abc"
        ));
        assert!(err.source().is_some());
    }

    #[test]
    fn float_coercion() {
        assert_eq!(Coercer::Float.prepare("1.5").unwrap(), Value::Float(1.5));
        assert_eq!(Coercer::Float.prepare("3").unwrap(), Value::Float(3.0));
        assert!(matches!(
            Coercer::Float.prepare("1.5.2"),
            Err(InvalidArgument::NotCoercible { target: "float", .. })
        ));
    }

    #[test]
    fn string_coercion_is_identity() {
        assert_eq!(
            Coercer::String.prepare(" any thing ").unwrap(),
            Value::String(" any thing ".into())
        );
        assert_eq!(Coercer::String.prepare("").unwrap(), Value::String("".into()));
    }

    #[test]
    fn pattern_whole_match() {
        let pattern = Pattern::new(r"[a-z]+").unwrap();
        assert!(!pattern.has_named_groups());
        assert_eq!(pattern.prepare("abc").unwrap(), Value::String("abc".into()));
    }

    #[test]
    fn pattern_is_anchored() {
        let pattern = Pattern::new(r"\d+").unwrap();
        assert!(pattern.prepare("42").is_ok());
        assert!(pattern.prepare("42a").is_err());
        assert!(pattern.prepare("a42").is_err());
    }

    #[test]
    fn pattern_alternation_is_anchored_as_a_whole() {
        let pattern = Pattern::new(r"low|high").unwrap();
        assert!(pattern.prepare("low").is_ok());
        assert!(pattern.prepare("lowx").is_err());
        assert!(pattern.prepare("xhigh").is_err());
    }

    #[test]
    fn verbose_pattern_with_trailing_comment() {
        let pattern = Pattern::new("(?x) \\d+  # digits").unwrap();
        assert!(pattern.prepare("42").is_ok());
        assert!(pattern.prepare("42a").is_err());

        let named = Pattern::new("(?x) (?P<n> \\d+ )  # number").unwrap();
        assert!(named.has_named_groups());
        assert!(named.prepare("7").is_ok());
    }

    #[test]
    fn plain_pattern_does_not_accept_trailing_newline() {
        let pattern = Pattern::new(r"[a-z]+").unwrap();
        assert!(pattern.prepare("abc\n").is_err());
    }

    #[test]
    fn pattern_named_groups() {
        let pattern = Pattern::new(r"(?P<year>\d{4})-(?P<month>\d{2})").unwrap();
        assert!(pattern.has_named_groups());

        let value = pattern.prepare("2024-05").unwrap();
        let groups = value.as_groups().unwrap();
        assert_eq!(groups.get("year"), Some("2024"));
        assert_eq!(groups.get("month"), Some("05"));
    }

    #[test]
    fn pattern_optional_group_missing() {
        let pattern = Pattern::new(r"(?P<year>\d{4})(-(?P<month>\d{2}))?").unwrap();
        let value = pattern.prepare("2024").unwrap();
        let groups = value.as_groups().unwrap();
        assert!(groups.contains("month"));
        assert_eq!(groups.get("month"), None);
    }

    #[test]
    fn pattern_mismatch_names_value_and_pattern() {
        let pattern = Pattern::new(r"\d{4}").unwrap();
        let msg = pattern.prepare("20x4").unwrap_err().to_string();
        assert!(msg.contains("20x4"));
        assert!(msg.contains(r"\d{4}"));
    }

    #[test]
    fn invalid_pattern_is_config_error() {
        let err = Pattern::new(r"(unclosed").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPattern { ref pattern, .. } if pattern == "(unclosed"));
    }

    #[test]
    fn list_coercion() {
        let list = Coercer::List(Box::new(Coercer::Integer));
        assert_eq!(
            list.prepare("1,2,3").unwrap(),
            Value::List(vec![Value::Integer(1), Value::Integer(2), Value::Integer(3)])
        );

        let strings = Coercer::List(Box::new(Coercer::String));
        assert_eq!(
            strings.prepare("a").unwrap(),
            Value::List(vec![Value::String("a".into())])
        );
    }

    #[test]
    fn list_fails_on_any_bad_part() {
        let list = Coercer::List(Box::new(Coercer::Integer));
        let err = list.prepare("1,x,3").unwrap_err();
        match err {
            InvalidArgument::InvalidList { value, source } => {
                assert_eq!(value, "1,x,3");
                assert!(matches!(*source, InvalidArgument::NotCoercible { ref value, .. } if value == "x"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(list.prepare("1,,3").is_err());
    }

    #[test]
    fn shapes() {
        assert_eq!(Coercer::Integer.shape(), Shape::Value);
        let named = Pattern::new(r"(?P<a>x)").unwrap();
        assert_eq!(Coercer::from(named.clone()).shape(), Shape::Groups);
        assert_eq!(Coercer::List(Box::new(named.into())).shape(), Shape::Value);
    }
}

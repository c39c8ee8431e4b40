//! Coerced values handed to filter handlers.
//!
//! A raw parameter is always a string. After coercion it becomes a [`Value`]:
//! a typed scalar, a list of values (for comma-separated input), or the named
//! capture groups of a pattern match.

use std::collections::BTreeMap;
use std::fmt;

/// A raw parameter value after coercion.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Signed 64-bit integer.
    Integer(i64),
    /// 64-bit floating point.
    Float(f64),
    /// String, either passed through or the whole match of a pattern.
    String(String),
    /// Comma-separated input, each part coerced on its own.
    List(Vec<Value>),
    /// Named capture groups of a pattern match.
    Groups(Groups),
}

impl Value {
    /// Returns the type name used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::List(_) => "list",
            Value::Groups(_) => "groups",
        }
    }

    /// Extracts the integer, if present.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(n) => Some(*n),
            _ => None,
        }
    }

    /// Extracts a float. Integers widen to `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(n) => Some(*n),
            Value::Integer(n) => Some(*n as f64),
            _ => None,
        }
    }

    /// Extracts the string, if present.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Extracts the list items, if present.
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Extracts the capture groups, if present.
    pub fn as_groups(&self) -> Option<&Groups> {
        match self {
            Value::Groups(groups) => Some(groups),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(n) => write!(f, "{n}"),
            Value::Float(n) => write!(f, "{n}"),
            Value::String(s) => f.write_str(s),
            Value::List(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{item}")?;
                }
                Ok(())
            }
            Value::Groups(groups) => write!(f, "{groups}"),
        }
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Float(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

/// Named capture groups from a pattern match.
///
/// Every named group of the pattern has an entry; a group that did not
/// participate in the match maps to `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Groups {
    groups: BTreeMap<String, Option<String>>,
}

impl Groups {
    /// Creates an empty group mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a group's captured text.
    pub fn insert(&mut self, name: impl Into<String>, value: Option<String>) {
        self.groups.insert(name.into(), value);
    }

    /// Returns the text captured by a group.
    ///
    /// `None` both for unknown names and for groups that did not participate.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.groups.get(name).and_then(|v| v.as_deref())
    }

    /// Returns `true` if the pattern declares this group.
    pub fn contains(&self, name: &str) -> bool {
        self.groups.contains_key(name)
    }

    /// Iterates over groups in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.groups
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_deref()))
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

impl fmt::Display for Groups {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (name, value)) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            match value {
                Some(v) => write!(f, "{name}={v}")?,
                None => write!(f, "{name}=None")?,
            }
        }
        f.write_str("}")
    }
}

impl<K, V> FromIterator<(K, V)> for Groups
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut groups = Groups::new();
        for (name, value) in iter {
            groups.insert(name, Some(value.into()));
        }
        groups
    }
}

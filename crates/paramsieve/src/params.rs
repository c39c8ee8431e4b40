//! Raw request parameters.
//!
//! [`Params`] is the normalized form every filter set works on: each name maps
//! to a list of raw strings, never to a bare scalar. Repeated names keep their
//! values in arrival order.

use std::collections::{BTreeMap, BTreeSet};

use serde_json::Value as Json;

use crate::error::InvalidArgument;

/// A mapping from parameter name to one or more raw values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    entries: BTreeMap<String, Vec<String>>,
    malformed: BTreeSet<String>,
}

impl Params {
    /// Creates an empty parameter mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a value under a name.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries
            .entry(name.into())
            .or_default()
            .push(value.into());
    }

    /// Appends a value under a name, builder style.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    /// Returns the values under a name; empty if the name is absent.
    pub fn get(&self, name: &str) -> &[String] {
        self.entries.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Returns `true` if at least one value exists under the name.
    pub fn contains(&self, name: &str) -> bool {
        !self.get(name).is_empty()
    }

    /// Iterates over names and their values in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(name, values)| (name.as_str(), values.as_slice()))
    }

    /// Number of distinct names.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns `true` if the name arrived with a value that has no string form.
    ///
    /// Such a name carries no values; only a filter that reads it fails.
    pub fn is_malformed(&self, name: &str) -> bool {
        self.malformed.contains(name)
    }

    /// Marks a name as malformed, dropping any values under it.
    pub fn mark_malformed(&mut self, name: impl Into<String>) {
        let name = name.into();
        self.entries.remove(&name);
        self.malformed.insert(name);
    }

    /// Decodes a URL query string such as `status=open&tag=a&tag=b`.
    ///
    /// Percent escapes and `+` are decoded. A leading `?` is ignored.
    pub fn from_query_string(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        url::form_urlencoded::parse(query.as_bytes())
            .map(|(name, value)| (name.into_owned(), value.into_owned()))
            .collect()
    }

    /// Normalizes an untyped JSON mapping.
    ///
    /// Only a non-object is rejected. Each entry may be a scalar, which is
    /// wrapped into a one-element list, or an array of scalars. Numbers and
    /// booleans are rendered to strings; `null` contributes no values. An
    /// entry holding a nested object or array is marked malformed (see
    /// [`Params::is_malformed`]).
    pub fn from_json(value: &Json) -> Result<Self, InvalidArgument> {
        let object = value.as_object().ok_or_else(|| InvalidArgument::NotAMapping {
            found: value.to_string(),
        })?;

        let mut params = Params::new();
        for (name, entry) in object {
            let items = match entry {
                Json::Array(items) => items.as_slice(),
                other => std::slice::from_ref(other),
            };
            match items.iter().map(scalar).collect::<Option<Vec<_>>>() {
                Some(values) => {
                    params.extend(values.into_iter().flatten().map(|v| (name.as_str(), v)))
                }
                None => params.mark_malformed(name.as_str()),
            }
        }
        Ok(params)
    }
}

// `None` for values with no string form; `Some(None)` for null.
fn scalar(value: &Json) -> Option<Option<String>> {
    match value {
        Json::Null => Some(None),
        Json::String(s) => Some(Some(s.clone())),
        Json::Number(n) => Some(Some(n.to_string())),
        Json::Bool(b) => Some(Some(b.to_string())),
        Json::Array(_) | Json::Object(_) => None,
    }
}

impl<K, V> FromIterator<(K, V)> for Params
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Params::new();
        for (name, value) in iter {
            params.insert(name, value);
        }
        params
    }
}

impl<K, V> Extend<(K, V)> for Params
where
    K: Into<String>,
    V: Into<String>,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (name, value) in iter {
            self.insert(name, value);
        }
    }
}

impl TryFrom<&Json> for Params {
    type Error = InvalidArgument;

    fn try_from(value: &Json) -> Result<Self, Self::Error> {
        Params::from_json(value)
    }
}

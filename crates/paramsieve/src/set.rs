//! Filter sets: named filters applied over a whole parameter mapping.
//!
//! A [`FilterSet`] is declared once with [`FilterSet::builder`], which takes an
//! explicit, ordered list of members and the handlers those members call.
//! `build()` validates the whole tree, so a set that builds never fails with a
//! configuration error at request time.
//!
//! # Composition
//!
//! Members are [`FilterNode`]s:
//!
//! - A **leaf** receives only the values under its own name, one call per value.
//! - A **nested set** receives the entire parameter mapping and resolves its
//!   own members against its own handlers.
//!
//! The query is threaded through every member in declaration order, and
//! through every value of a member in arrival order.
//!
//! # Failure policy
//!
//! When a member rejects its argument, a strict set fails with
//! [`InvalidArgument::Member`], naming the member and keeping the cause. A set
//! that ignores failures drops that member's step and carries on with the
//! query it had before the step.
//!
//! # Example
//!
//! ```
//! use paramsieve::{Filter, FilterSet, Params, Queryable, Value};
//!
//! #[derive(Clone, Debug, Default)]
//! struct Sql(Vec<String>);
//!
//! impl Queryable for Sql {
//!     type Condition = String;
//!     fn apply_condition(mut self, c: &String) -> Self {
//!         self.0.push(c.clone());
//!         self
//!     }
//! }
//!
//! let set = FilterSet::builder()
//!     .handler("by_status", |mut q: Sql, v: Value| {
//!         q.0.push(format!("status = '{v}'"));
//!         Ok(q)
//!     })
//!     .handler("by_id", |mut q: Sql, v: Value| {
//!         q.0.push(format!("id = {v}"));
//!         Ok(q)
//!     })
//!     .filter("status", Filter::string().handler("by_status"))
//!     .filter("id", Filter::integer().handler("by_id"))
//!     .build()
//!     .unwrap();
//!
//! let params = Params::from_query_string("status=active&id=3");
//! let q = set.filter(Sql::default(), &params).unwrap();
//! assert_eq!(q.0, ["status = 'active'", "id = 3"]);
//!
//! let params = Params::from_query_string("id=abc");
//! let err = set.filter(Sql::default(), &params).unwrap_err();
//! let invalid = err.as_invalid_argument().unwrap();
//! assert_eq!(invalid.member_name(), Some("id"));
//! ```

use std::fmt;

use serde_json::Value as Json;

use crate::error::{ConfigError, FilterError, InvalidArgument, Result};
use crate::filter::Filter;
use crate::handler::{Handler, HandlerResult, Handlers};
use crate::params::Params;
use crate::queryable::Queryable;
use crate::value::{Groups, Value};

/// A member of a filter set.
pub enum FilterNode<Q: Queryable> {
    /// Filters the values under the member's own name.
    Leaf(Filter<Q>),
    /// Filters the whole parameter mapping.
    Set(FilterSet<Q>),
}

impl<Q: Queryable> FilterNode<Q> {
    /// Returns the leaf filter, if this is one.
    pub fn as_leaf(&self) -> Option<&Filter<Q>> {
        match self {
            FilterNode::Leaf(filter) => Some(filter),
            FilterNode::Set(_) => None,
        }
    }

    /// Returns the nested set, if this is one.
    pub fn as_set(&self) -> Option<&FilterSet<Q>> {
        match self {
            FilterNode::Set(set) => Some(set),
            FilterNode::Leaf(_) => None,
        }
    }
}

impl<Q: Queryable> From<Filter<Q>> for FilterNode<Q> {
    fn from(filter: Filter<Q>) -> Self {
        FilterNode::Leaf(filter)
    }
}

impl<Q: Queryable> From<FilterSet<Q>> for FilterNode<Q> {
    fn from(set: FilterSet<Q>) -> Self {
        FilterNode::Set(set)
    }
}

impl<Q: Queryable> fmt::Debug for FilterNode<Q> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterNode::Leaf(filter) => f.debug_tuple("Leaf").field(filter).finish(),
            FilterNode::Set(set) => f.debug_tuple("Set").field(set).finish(),
        }
    }
}

/// An ordered, named collection of filters and the handlers they call.
pub struct FilterSet<Q: Queryable> {
    members: Vec<(String, FilterNode<Q>)>,
    handlers: Handlers<Q>,
    ignore_failure: bool,
}

impl<Q: Queryable> FilterSet<Q> {
    /// Starts declaring a filter set.
    pub fn builder() -> FilterSetBuilder<Q> {
        FilterSetBuilder::new()
    }

    /// Runs every member over the parameters.
    pub fn filter(&self, query: Q, params: &Params) -> Result<Q> {
        let mut query = query;

        for (name, member) in &self.members {
            query = match member {
                FilterNode::Set(set) => self.run_member(name, query, |q| set.filter(q, params))?,
                FilterNode::Leaf(filter) if params.is_malformed(name) => {
                    self.run_member(name, query, |q| {
                        filter.reject(q, InvalidArgument::MalformedParameter { name: name.clone() })
                    })?
                }
                FilterNode::Leaf(filter) => {
                    let mut query = query;
                    for raw in params.get(name) {
                        query = self.run_member(name, query, |q| {
                            filter.filter(q, raw, Some(&self.handlers))
                        })?;
                    }
                    query
                }
            };
        }

        Ok(query)
    }

    /// Normalizes untyped JSON parameters, then filters.
    ///
    /// Parameters that are not a mapping are an invalid argument, swallowed
    /// like any other when this set ignores failures. A nested value under a
    /// name fails only the member that reads that name.
    pub fn filter_json(&self, query: Q, params: &Json) -> Result<Q> {
        match Params::from_json(params) {
            Ok(params) => self.filter(query, &params),
            Err(error) if self.ignore_failure => {
                tracing::debug!(error = %error, "ignoring malformed parameters");
                Ok(query)
            }
            Err(error) => Err(error.into()),
        }
    }

    fn run_member<F>(&self, name: &str, query: Q, step: F) -> Result<Q>
    where
        F: FnOnce(Q) -> Result<Q>,
    {
        let original = self.ignore_failure.then(|| query.clone());

        match step(query) {
            Ok(query) => Ok(query),
            Err(FilterError::Invalid(error)) => {
                tracing::debug!(filter = name, error = %error, "filter rejected parameter");
                match original {
                    Some(original) => Ok(original),
                    None => Err(InvalidArgument::Member {
                        name: name.to_string(),
                        source: Box::new(error),
                    }
                    .into()),
                }
            }
            Err(config) => Err(config),
        }
    }

    /// Looks up a member by name.
    pub fn get(&self, name: &str) -> Option<&FilterNode<Q>> {
        self.members
            .iter()
            .find(|(member, _)| member == name)
            .map(|(_, node)| node)
    }

    /// Returns member names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.members.iter().map(|(name, _)| name.as_str())
    }

    /// Iterates over members in declaration order.
    pub fn members(&self) -> impl Iterator<Item = (&str, &FilterNode<Q>)> {
        self.members.iter().map(|(name, node)| (name.as_str(), node))
    }

    /// Returns the handlers members are resolved against.
    pub fn handlers(&self) -> &Handlers<Q> {
        &self.handlers
    }

    /// Returns `true` if this set swallows its members' failures.
    pub fn ignores_failure(&self) -> bool {
        self.ignore_failure
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

impl<Q: Queryable> fmt::Debug for FilterSet<Q> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterSet")
            .field("members", &self.members)
            .field("handlers", &self.handlers)
            .field("ignore_failure", &self.ignore_failure)
            .finish()
    }
}

/// Builder for [`FilterSet`].
///
/// Registration errors such as duplicate names are held until
/// [`build`](FilterSetBuilder::build), which reports the first one.
pub struct FilterSetBuilder<Q: Queryable> {
    members: Vec<(String, FilterNode<Q>)>,
    handlers: Handlers<Q>,
    ignore_failure: bool,
    error: Option<ConfigError>,
}

impl<Q: Queryable> FilterSetBuilder<Q> {
    fn new() -> Self {
        FilterSetBuilder {
            members: Vec::new(),
            handlers: Handlers::new(),
            ignore_failure: false,
            error: None,
        }
    }

    /// Registers a positional handler.
    pub fn handler<F>(self, name: &str, f: F) -> Self
    where
        F: Fn(Q, Value) -> HandlerResult<Q> + Send + Sync + 'static,
    {
        self.register(name, Handler::value(f))
    }

    /// Registers a named-groups handler, for patterns with named groups.
    pub fn groups_handler<F>(self, name: &str, f: F) -> Self
    where
        F: Fn(Q, Groups) -> HandlerResult<Q> + Send + Sync + 'static,
    {
        self.register(name, Handler::groups(f))
    }

    /// Registers an already wrapped handler.
    pub fn register(mut self, name: &str, handler: Handler<Q>) -> Self {
        if let Err(e) = self.handlers.register(name, handler) {
            self.error.get_or_insert(e);
        }
        self
    }

    /// Adds a leaf filter for the parameter `name`.
    pub fn filter(self, name: &str, filter: Filter<Q>) -> Self {
        self.member(name, FilterNode::Leaf(filter))
    }

    /// Adds a nested filter set. It sees the whole parameter mapping.
    pub fn nest(self, name: &str, set: FilterSet<Q>) -> Self {
        self.member(name, FilterNode::Set(set))
    }

    /// Adds a member of either kind.
    pub fn member(mut self, name: &str, node: impl Into<FilterNode<Q>>) -> Self {
        if self.members.iter().any(|(member, _)| member == name) {
            self.error.get_or_insert(ConfigError::DuplicateFilter {
                name: name.to_string(),
            });
        } else {
            self.members.push((name.to_string(), node.into()));
        }
        self
    }

    /// Swallow members' failures instead of failing the whole set.
    pub fn ignore_failure(mut self, ignore: bool) -> Self {
        self.ignore_failure = ignore;
        self
    }

    /// Validates and freezes the set.
    ///
    /// Every handler a leaf member names (including choice alternatives) must
    /// be registered on this set with a matching shape. Nested sets were
    /// validated against their own handlers when they were built.
    pub fn build(self) -> std::result::Result<FilterSet<Q>, ConfigError> {
        if let Some(error) = self.error {
            return Err(error);
        }

        for (_, member) in &self.members {
            if let FilterNode::Leaf(filter) = member {
                filter.validate(&self.handlers)?;
            }
        }

        tracing::trace!(
            filters = self.members.len(),
            handlers = self.handlers.len(),
            "filter set built"
        );

        Ok(FilterSet {
            members: self.members,
            handlers: self.handlers,
            ignore_failure: self.ignore_failure,
        })
    }
}

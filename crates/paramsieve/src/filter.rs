//! Leaf filters: coerce one raw value, then narrow the query with it.
//!
//! A [`Filter`] is built once and reused for every request. Filtering runs in
//! three steps:
//!
//! 1. **Prepare**: coerce the raw string ([`Coercer`]).
//! 2. **Apply**: narrow the query, either with a fixed condition or with a
//!    named handler resolved against the context.
//! 3. **Contain**: an [`InvalidArgument`] from either step is swallowed when
//!    the filter ignores failures, and the query it started from is returned.
//!
//! Choice filters replace step 2 with "try each alternative in order".
//!
//! # Example
//!
//! ```
//! use paramsieve::{Filter, Handler, Handlers, Queryable, Value};
//!
//! #[derive(Clone, Debug, Default, PartialEq)]
//! struct Ids(Vec<i64>);
//!
//! impl Queryable for Ids {
//!     type Condition = i64;
//!     fn apply_condition(mut self, c: &i64) -> Self {
//!         self.0.push(*c);
//!         self
//!     }
//! }
//!
//! let mut context = Handlers::new();
//! context
//!     .register("by_id", Handler::value(|mut q: Ids, v: Value| {
//!         q.0.extend(v.as_i64());
//!         Ok(q)
//!     }))
//!     .unwrap();
//!
//! let filter = Filter::integer().handler("by_id");
//! let q = filter.filter(Ids::default(), "42", Some(&context)).unwrap();
//! assert_eq!(q, Ids(vec![42]));
//!
//! // Uncoercible input is rejected...
//! assert!(filter.filter(Ids::default(), "abc", Some(&context)).is_err());
//!
//! // ...unless the filter ignores failures.
//! let lenient = Filter::integer().handler("by_id").ignore_failure(true);
//! let q = lenient.filter(Ids(vec![1]), "abc", Some(&context)).unwrap();
//! assert_eq!(q, Ids(vec![1]));
//! ```

use std::fmt;

use crate::coerce::{Coercer, Pattern};
use crate::error::{ConfigError, FilterError, InvalidArgument, Result};
use crate::handler::Handlers;
use crate::queryable::Queryable;
use crate::value::Value;

enum Kind<Q: Queryable> {
    Predicate {
        coercer: Coercer,
        condition: Option<Q::Condition>,
        handler: Option<String>,
    },
    Choice(Vec<Filter<Q>>),
}

/// A single filter bound to one parameter name by its filter set.
pub struct Filter<Q: Queryable> {
    kind: Kind<Q>,
    ignore_failure: bool,
}

impl<Q: Queryable> Filter<Q> {
    /// Creates a predicate filter with the given coercion.
    pub fn new(coercer: Coercer) -> Self {
        Filter {
            kind: Kind::Predicate {
                coercer,
                condition: None,
                handler: None,
            },
            ignore_failure: false,
        }
    }

    /// Accepts any string as is.
    pub fn string() -> Self {
        Self::new(Coercer::String)
    }

    /// Accepts signed integers.
    pub fn integer() -> Self {
        Self::new(Coercer::Integer)
    }

    /// Accepts floating point numbers.
    pub fn float() -> Self {
        Self::new(Coercer::Float)
    }

    /// Accepts values that fully match a pattern.
    ///
    /// If the pattern has named groups, the handler must be a groups handler
    /// and receives them by name; otherwise it receives the whole match.
    pub fn pattern(source: &str) -> std::result::Result<Self, ConfigError> {
        Ok(Self::new(Coercer::Pattern(Pattern::new(source)?)))
    }

    /// Accepts comma-separated values, each coerced by `inner`.
    pub fn list(inner: Coercer) -> Self {
        Self::new(Coercer::List(Box::new(inner)))
    }

    /// Accepts comma-separated strings.
    pub fn csv() -> Self {
        Self::list(Coercer::String)
    }

    /// Tries each alternative in order; the first to accept the value wins.
    pub fn choice(alternatives: impl IntoIterator<Item = Filter<Q>>) -> Self {
        Filter {
            kind: Kind::Choice(alternatives.into_iter().collect()),
            ignore_failure: false,
        }
    }

    /// Names the handler to resolve in the context.
    ///
    /// Has no effect on a choice filter.
    pub fn handler(mut self, name: impl Into<String>) -> Self {
        if let Kind::Predicate { handler, .. } = &mut self.kind {
            *handler = Some(name.into());
        }
        self
    }

    /// Sets a fixed condition. It takes precedence over a handler.
    ///
    /// Has no effect on a choice filter.
    pub fn condition(mut self, condition: Q::Condition) -> Self {
        if let Kind::Predicate { condition: slot, .. } = &mut self.kind {
            *slot = Some(condition);
        }
        self
    }

    /// Swallow invalid arguments and leave the query unchanged.
    pub fn ignore_failure(mut self, ignore: bool) -> Self {
        self.ignore_failure = ignore;
        self
    }

    /// Returns `true` if this filter swallows invalid arguments.
    pub fn ignores_failure(&self) -> bool {
        self.ignore_failure
    }

    /// Returns the handler name, if any.
    pub fn handler_name(&self) -> Option<&str> {
        match &self.kind {
            Kind::Predicate { handler, .. } => handler.as_deref(),
            Kind::Choice(_) => None,
        }
    }

    /// Returns the coercion, or `None` for a choice filter.
    pub fn coercer(&self) -> Option<&Coercer> {
        match &self.kind {
            Kind::Predicate { coercer, .. } => Some(coercer),
            Kind::Choice(_) => None,
        }
    }

    /// Returns the alternatives of a choice filter.
    pub fn alternatives(&self) -> &[Filter<Q>] {
        match &self.kind {
            Kind::Choice(alternatives) => alternatives,
            Kind::Predicate { .. } => &[],
        }
    }

    /// Coerces a raw value. Choice filters pass it through.
    pub fn prepare(&self, raw: &str) -> std::result::Result<Value, InvalidArgument> {
        match &self.kind {
            Kind::Predicate { coercer, .. } => coercer.prepare(raw),
            Kind::Choice(_) => Ok(Value::String(raw.to_string())),
        }
    }

    /// Narrows the query with an already coerced value.
    pub fn apply(&self, query: Q, value: Value, context: Option<&Handlers<Q>>) -> Result<Q> {
        match &self.kind {
            Kind::Predicate {
                coercer,
                condition,
                handler,
            } => {
                let resolved = match handler {
                    Some(name) => {
                        let handlers = context.ok_or_else(|| ConfigError::UnknownHandler {
                            name: name.clone(),
                        })?;
                        Some((name.as_str(), handlers.check(name, coercer.shape())?))
                    }
                    None => None,
                };

                if let Some(condition) = condition {
                    return Ok(query.apply_condition(condition));
                }
                match resolved {
                    Some((name, handler)) => handler.call(name, query, value),
                    None => Err(InvalidArgument::NoPredicate.into()),
                }
            }
            Kind::Choice(alternatives) => {
                let raw = match value {
                    Value::String(s) => s,
                    other => other.to_string(),
                };
                choose(alternatives, query, &raw, context)
            }
        }
    }

    /// Prepares and applies a raw value.
    ///
    /// Configuration errors always propagate. Invalid arguments propagate
    /// unless this filter ignores failures, in which case the query is
    /// returned exactly as it came in.
    pub fn filter(&self, query: Q, raw: &str, context: Option<&Handlers<Q>>) -> Result<Q> {
        let original = self.ignore_failure.then(|| query.clone());

        let result = self
            .prepare(raw)
            .map_err(FilterError::from)
            .and_then(|value| self.apply(query, value, context));

        match (result, original) {
            (Err(FilterError::Invalid(error)), Some(original)) => self.reject(original, error),
            (result, _) => result,
        }
    }

    /// Fails with an argument error raised before this filter could run,
    /// unless it ignores failures.
    pub(crate) fn reject(&self, query: Q, error: InvalidArgument) -> Result<Q> {
        if self.ignore_failure {
            tracing::debug!(error = %error, "ignoring filter failure");
            Ok(query)
        } else {
            Err(error.into())
        }
    }

    /// Checks every handler reference against a context.
    pub(crate) fn validate(&self, handlers: &Handlers<Q>) -> std::result::Result<(), ConfigError> {
        match &self.kind {
            Kind::Predicate {
                coercer,
                handler: Some(name),
                ..
            } => handlers.check(name, coercer.shape()).map(|_| ()),
            Kind::Predicate { handler: None, .. } => Ok(()),
            Kind::Choice(alternatives) => alternatives
                .iter()
                .try_for_each(|alternative| alternative.validate(handlers)),
        }
    }
}

fn choose<Q: Queryable>(
    alternatives: &[Filter<Q>],
    query: Q,
    raw: &str,
    context: Option<&Handlers<Q>>,
) -> Result<Q> {
    let mut rejections = Vec::with_capacity(alternatives.len());

    for (index, alternative) in alternatives.iter().enumerate() {
        match alternative.filter(query.clone(), raw, context) {
            Ok(query) => return Ok(query),
            Err(FilterError::Invalid(error)) => {
                tracing::trace!(alternative = index, error = %error, "choice alternative rejected value");
                rejections.push(error);
            }
            Err(config) => return Err(config),
        }
    }

    Err(InvalidArgument::NoAlternative {
        value: raw.to_string(),
        rejections,
    }
    .into())
}

impl<Q> Clone for Filter<Q>
where
    Q: Queryable,
    Q::Condition: Clone,
{
    fn clone(&self) -> Self {
        let kind = match &self.kind {
            Kind::Predicate {
                coercer,
                condition,
                handler,
            } => Kind::Predicate {
                coercer: coercer.clone(),
                condition: condition.clone(),
                handler: handler.clone(),
            },
            Kind::Choice(alternatives) => Kind::Choice(alternatives.clone()),
        };
        Filter {
            kind,
            ignore_failure: self.ignore_failure,
        }
    }
}

impl<Q: Queryable> fmt::Debug for Filter<Q> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            Kind::Predicate {
                coercer,
                condition,
                handler,
            } => f
                .debug_struct("Filter")
                .field("coercer", coercer)
                .field("condition", &condition.is_some())
                .field("handler", handler)
                .field("ignore_failure", &self.ignore_failure)
                .finish(),
            Kind::Choice(alternatives) => f
                .debug_struct("Filter")
                .field("choice", alternatives)
                .field("ignore_failure", &self.ignore_failure)
                .finish(),
        }
    }
}

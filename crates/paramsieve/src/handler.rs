//! Named handlers that filters resolve against a context.
//!
//! A filter refers to its handler by name only. The name is resolved against
//! a [`Handlers`] registry, which is the context the filter runs in (for
//! members of a [`FilterSet`](crate::FilterSet), the set's own registry).
//! Filter sets check every name when they are built, so a resolution failure
//! at filtering time only happens for filters run by hand against the wrong
//! context.
//!
//! Handlers come in two shapes, matching what coercion produces:
//!
//! - [`Handler::Value`] takes `(query, value)`.
//! - [`Handler::Groups`] takes `(query, groups)` for patterns with named
//!   capture groups, the groups standing in for keyword arguments.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::coerce::Shape;
use crate::error::{ConfigError, InvalidArgument, Result};
use crate::value::{Groups, Value};

/// What a handler returns: the next query, or a rejection of the value.
pub type HandlerResult<Q> = std::result::Result<Q, InvalidArgument>;

/// Signature of a positional handler.
pub type ValueFn<Q> = dyn Fn(Q, Value) -> HandlerResult<Q> + Send + Sync;

/// Signature of a named-groups handler.
pub type GroupsFn<Q> = dyn Fn(Q, Groups) -> HandlerResult<Q> + Send + Sync;

/// A registered handler.
pub enum Handler<Q> {
    Value(Arc<ValueFn<Q>>),
    Groups(Arc<GroupsFn<Q>>),
}

impl<Q> Handler<Q> {
    /// Wraps a positional handler.
    pub fn value<F>(f: F) -> Self
    where
        F: Fn(Q, Value) -> HandlerResult<Q> + Send + Sync + 'static,
    {
        Handler::Value(Arc::new(f))
    }

    /// Wraps a named-groups handler.
    pub fn groups<F>(f: F) -> Self
    where
        F: Fn(Q, Groups) -> HandlerResult<Q> + Send + Sync + 'static,
    {
        Handler::Groups(Arc::new(f))
    }

    /// Returns the shape of value this handler accepts.
    pub fn shape(&self) -> Shape {
        match self {
            Handler::Value(_) => Shape::Value,
            Handler::Groups(_) => Shape::Groups,
        }
    }

    /// Invokes the handler.
    ///
    /// `name` is only used to report a shape mismatch.
    pub fn call(&self, name: &str, query: Q, value: Value) -> Result<Q> {
        match (self, value) {
            (Handler::Groups(f), Value::Groups(groups)) => Ok(f(query, groups)?),
            (Handler::Value(f), value @ (Value::Integer(_)
            | Value::Float(_)
            | Value::String(_)
            | Value::List(_))) => Ok(f(query, value)?),
            (Handler::Value(_), Value::Groups(_)) => Err(ConfigError::HandlerMismatch {
                name: name.to_string(),
                expected: Shape::Groups.describe(),
            }
            .into()),
            (Handler::Groups(_), _) => Err(ConfigError::HandlerMismatch {
                name: name.to_string(),
                expected: Shape::Value.describe(),
            }
            .into()),
        }
    }
}

impl<Q> Clone for Handler<Q> {
    fn clone(&self) -> Self {
        match self {
            Handler::Value(f) => Handler::Value(Arc::clone(f)),
            Handler::Groups(f) => Handler::Groups(Arc::clone(f)),
        }
    }
}

impl<Q> fmt::Debug for Handler<Q> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Handler::Value(_) => f.write_str("Handler::Value(..)"),
            Handler::Groups(_) => f.write_str("Handler::Groups(..)"),
        }
    }
}

/// A registry of named handlers: the context filters run in.
pub struct Handlers<Q> {
    map: HashMap<String, Handler<Q>>,
}

impl<Q> Handlers<Q> {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Handlers {
            map: HashMap::new(),
        }
    }

    /// Registers a handler under a name.
    ///
    /// Returns an error if the name is already taken.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        handler: Handler<Q>,
    ) -> std::result::Result<(), ConfigError> {
        let name = name.into();
        if self.map.contains_key(&name) {
            return Err(ConfigError::DuplicateHandler { name });
        }
        self.map.insert(name, handler);
        Ok(())
    }

    /// Looks up a handler by name.
    pub fn get(&self, name: &str) -> Option<&Handler<Q>> {
        self.map.get(name)
    }

    /// Looks up a handler and checks that it accepts the given shape.
    pub fn check(&self, name: &str, shape: Shape) -> std::result::Result<&Handler<Q>, ConfigError> {
        let handler = self.get(name).ok_or_else(|| ConfigError::UnknownHandler {
            name: name.to_string(),
        })?;
        if handler.shape() != shape {
            return Err(ConfigError::HandlerMismatch {
                name: name.to_string(),
                expected: shape.describe(),
            });
        }
        Ok(handler)
    }

    /// Returns `true` if a handler with this name is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.map.contains_key(name)
    }

    /// Returns the registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.map.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl<Q> Default for Handlers<Q> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Q> Clone for Handlers<Q> {
    fn clone(&self) -> Self {
        Handlers {
            map: self.map.clone(),
        }
    }
}

impl<Q> fmt::Debug for Handlers<Q> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handlers")
            .field("names", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FilterError;

    fn push(mut q: Vec<String>, v: Value) -> HandlerResult<Vec<String>> {
        q.push(v.to_string());
        Ok(q)
    }

    #[test]
    fn register_and_call_value_handler() {
        let mut handlers = Handlers::new();
        handlers.register("push", Handler::value(push)).unwrap();

        let handler = handlers.check("push", Shape::Value).unwrap();
        let q = handler.call("push", Vec::new(), Value::Integer(3)).unwrap();
        assert_eq!(q, vec!["3".to_string()]);
    }

    #[test]
    fn groups_handler_receives_groups() {
        let mut handlers: Handlers<Vec<String>> = Handlers::new();
        handlers
            .register(
                "ym",
                Handler::groups(|mut q: Vec<String>, g: Groups| {
                    q.push(format!("{}/{}", g.get("y").unwrap_or(""), g.get("m").unwrap_or("")));
                    Ok(q)
                }),
            )
            .unwrap();

        let groups: Groups = [("y", "2024"), ("m", "05")].into_iter().collect();
        let q = handlers
            .get("ym")
            .unwrap()
            .call("ym", Vec::new(), Value::Groups(groups))
            .unwrap();
        assert_eq!(q, vec!["2024/05".to_string()]);
    }

    #[test]
    fn duplicate_handler_rejected() {
        let mut handlers = Handlers::new();
        handlers.register("push", Handler::value(push)).unwrap();
        let err = handlers.register("push", Handler::value(push)).unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateHandler { ref name } if name == "push"));
    }

    #[test]
    fn check_reports_unknown_and_mismatch() {
        let mut handlers = Handlers::new();
        handlers.register("push", Handler::value(push)).unwrap();

        assert!(matches!(
            handlers.check("missing", Shape::Value),
            Err(ConfigError::UnknownHandler { .. })
        ));
        assert!(matches!(
            handlers.check("push", Shape::Groups),
            Err(ConfigError::HandlerMismatch { .. })
        ));
    }

    #[test]
    fn call_with_wrong_shape_is_config_error() {
        let handler: Handler<Vec<String>> = Handler::value(push);
        let err = handler
            .call("push", Vec::new(), Value::Groups(Groups::new()))
            .unwrap_err();
        assert!(matches!(err, FilterError::Config(_)));
    }

    #[test]
    fn rejection_is_invalid_argument() {
        let handler: Handler<Vec<String>> =
            Handler::value(|_q, v| Err(InvalidArgument::rejected(format!("unknown '{v}'"))));
        let err = handler
            .call("strict", Vec::new(), Value::from("x"))
            .unwrap_err();
        assert!(err.is_invalid_argument());
        assert_eq!(err.to_string(), "unknown 'x'");
    }

    #[test]
    fn names_sorted() {
        let mut handlers = Handlers::new();
        handlers.register("b", Handler::value(push)).unwrap();
        handlers.register("a", Handler::value(push)).unwrap();
        assert_eq!(handlers.names(), vec!["a", "b"]);
        assert_eq!(handlers.len(), 2);
    }
}

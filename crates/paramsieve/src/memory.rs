//! An in-memory queryable.
//!
//! [`Query`] accumulates [`Clause`]s (ANDed together) and can then be run
//! over a slice with an accessor function that exposes each item's fields.
//! It stands in for a real data-access layer in tests and small tools.
//!
//! ```
//! use paramsieve::memory::{Clause, Field, Op, Query};
//! use paramsieve::Queryable;
//!
//! struct Task {
//!     title: &'static str,
//!     priority: i64,
//! }
//!
//! fn accessor<'a>(task: &'a Task, field: &str) -> Field<'a> {
//!     match field {
//!         "title" => Field::Str(task.title),
//!         "priority" => Field::Int(task.priority),
//!         _ => Field::Missing,
//!     }
//! }
//!
//! let tasks = [
//!     Task { title: "Write docs", priority: 2 },
//!     Task { title: "Fix bug", priority: 5 },
//! ];
//!
//! let query = Query::new().apply_condition(&Clause::new("priority", Op::Gte, 3i64));
//! let found = query.filter(&tasks, accessor);
//! assert_eq!(found.len(), 1);
//! assert_eq!(found[0].title, "Fix bug");
//! ```

use std::cmp::Ordering;
use std::fmt;

use crate::queryable::Queryable;
use crate::value::Value;

/// Comparison operator of a clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    /// Substring match on strings.
    Contains,
    /// Prefix match on strings.
    StartsWith,
    /// Equal to any member of a set operand.
    In,
}

impl Op {
    /// Returns the display name of this operator.
    pub fn as_str(self) -> &'static str {
        match self {
            Op::Eq => "eq",
            Op::Ne => "ne",
            Op::Gt => "gt",
            Op::Gte => "gte",
            Op::Lt => "lt",
            Op::Lte => "lte",
            Op::Contains => "contains",
            Op::StartsWith => "startswith",
            Op::In => "in",
        }
    }

    fn eval_ordering(self, ordering: Ordering) -> bool {
        match self {
            Op::Eq => ordering == Ordering::Equal,
            Op::Ne => ordering != Ordering::Equal,
            Op::Gt => ordering == Ordering::Greater,
            Op::Gte => ordering != Ordering::Less,
            Op::Lt => ordering == Ordering::Less,
            Op::Lte => ordering != Ordering::Greater,
            Op::Contains | Op::StartsWith | Op::In => false,
        }
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A field value borrowed from an item.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Field<'a> {
    Str(&'a str),
    Int(i64),
    Float(f64),
    Bool(bool),
    /// Unknown field or null value. Matches no clause.
    Missing,
}

/// The value a clause compares against.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    /// Members for [`Op::In`].
    Set(Vec<Operand>),
}

impl Operand {
    /// Converts a coerced filter value.
    ///
    /// Lists become sets. Capture groups have no operand form.
    pub fn from_value(value: &Value) -> Option<Operand> {
        match value {
            Value::Integer(n) => Some(Operand::Int(*n)),
            Value::Float(n) => Some(Operand::Float(*n)),
            Value::String(s) => Some(Operand::Str(s.clone())),
            Value::List(items) => items
                .iter()
                .map(Operand::from_value)
                .collect::<Option<Vec<_>>>()
                .map(Operand::Set),
            Value::Groups(_) => None,
        }
    }

    fn compare(&self, field: &Field<'_>) -> Option<Ordering> {
        match (field, self) {
            (Field::Str(f), Operand::Str(o)) => Some((*f).cmp(o.as_str())),
            (Field::Int(f), Operand::Int(o)) => Some(f.cmp(o)),
            (Field::Int(f), Operand::Float(o)) => (*f as f64).partial_cmp(o),
            (Field::Float(f), Operand::Int(o)) => f.partial_cmp(&(*o as f64)),
            (Field::Float(f), Operand::Float(o)) => f.partial_cmp(o),
            (Field::Bool(f), Operand::Bool(o)) => Some(f.cmp(o)),
            _ => None,
        }
    }
}

impl From<i64> for Operand {
    fn from(n: i64) -> Self {
        Operand::Int(n)
    }
}

impl From<f64> for Operand {
    fn from(n: f64) -> Self {
        Operand::Float(n)
    }
}

impl From<bool> for Operand {
    fn from(b: bool) -> Self {
        Operand::Bool(b)
    }
}

impl From<&str> for Operand {
    fn from(s: &str) -> Self {
        Operand::Str(s.to_string())
    }
}

impl From<String> for Operand {
    fn from(s: String) -> Self {
        Operand::Str(s)
    }
}

impl<T: Into<Operand>> From<Vec<T>> for Operand {
    fn from(items: Vec<T>) -> Self {
        Operand::Set(items.into_iter().map(Into::into).collect())
    }
}

/// A single predicate: field, operator, operand.
#[derive(Debug, Clone, PartialEq)]
pub struct Clause {
    pub field: String,
    pub op: Op,
    pub operand: Operand,
}

impl Clause {
    pub fn new(field: impl Into<String>, op: Op, operand: impl Into<Operand>) -> Self {
        Clause {
            field: field.into(),
            op,
            operand: operand.into(),
        }
    }

    /// Evaluates this clause against a field value.
    ///
    /// Type mismatches and missing fields never match.
    pub fn matches(&self, field: &Field<'_>) -> bool {
        if matches!(field, Field::Missing) {
            return false;
        }
        match (self.op, &self.operand) {
            (Op::In, Operand::Set(members)) => members
                .iter()
                .any(|member| member.compare(field) == Some(Ordering::Equal)),
            (Op::In, _) | (_, Operand::Set(_)) => false,
            (Op::Contains, Operand::Str(o)) => {
                matches!(field, Field::Str(f) if f.contains(o.as_str()))
            }
            (Op::StartsWith, Operand::Str(o)) => {
                matches!(field, Field::Str(f) if f.starts_with(o.as_str()))
            }
            (Op::Contains | Op::StartsWith, _) => false,
            (op, operand) => operand
                .compare(field)
                .is_some_and(|ordering| op.eval_ordering(ordering)),
        }
    }
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {:?}", self.field, self.op, self.operand)
    }
}

/// A conjunction of clauses.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    clauses: Vec<Clause>,
}

impl Query {
    /// Creates a query that matches everything.
    pub fn new() -> Self {
        Query::default()
    }

    /// Adds a clause.
    pub fn and(mut self, field: &str, op: Op, operand: impl Into<Operand>) -> Self {
        self.clauses.push(Clause::new(field, op, operand));
        self
    }

    /// Returns the clauses in the order they were added.
    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    /// Returns `true` if this query has no clauses.
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Tests if a single item matches every clause.
    pub fn matches<T, F>(&self, item: &T, accessor: F) -> bool
    where
        for<'a> F: Fn(&'a T, &str) -> Field<'a>,
    {
        self.clauses
            .iter()
            .all(|clause| clause.matches(&accessor(item, &clause.field)))
    }

    /// Returns references to the matching items, in input order.
    pub fn filter<'a, T, F>(&self, items: &'a [T], accessor: F) -> Vec<&'a T>
    where
        for<'b> F: Fn(&'b T, &str) -> Field<'b>,
    {
        items
            .iter()
            .filter(|item| self.matches(*item, &accessor))
            .collect()
    }

    /// Counts the matching items.
    pub fn count<T, F>(&self, items: &[T], accessor: F) -> usize
    where
        for<'a> F: Fn(&'a T, &str) -> Field<'a>,
    {
        items
            .iter()
            .filter(|item| self.matches(*item, &accessor))
            .count()
    }
}

impl Queryable for Query {
    type Condition = Clause;

    fn apply_condition(mut self, condition: &Clause) -> Self {
        self.clauses.push(condition.clone());
        self
    }
}

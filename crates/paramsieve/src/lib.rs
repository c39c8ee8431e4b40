//! Paramsieve - compile untyped request parameters into query filters.
//!
//! A web layer hands over a bag of raw strings (`?status=open&id=3&id=4`).
//! Paramsieve turns that bag into a validated sequence of steps over a query
//! object of your choosing:
//!
//! - **Coercion**: integers, floats, strings, full-match patterns (with named
//!   groups passed by name), and comma-separated lists.
//! - **Predicates**: a fixed condition, or a named handler resolved against
//!   the filter set that owns the filter.
//! - **Choice**: try alternatives in order, first acceptance wins.
//! - **Filter sets**: ordered, named members; nested sets see every parameter.
//! - **Failure policy**: fail fast with the offending member's name, or ignore
//!   failures per filter or per set and leave the query untouched.
//!
//! # Quick Start
//!
//! ```rust
//! use paramsieve::memory::{Field, Op, Operand, Query};
//! use paramsieve::{Filter, FilterSet, Groups, InvalidArgument, Params, Value};
//!
//! struct Task {
//!     title: String,
//!     priority: i64,
//!     due: String,
//! }
//!
//! fn accessor<'a>(task: &'a Task, field: &str) -> Field<'a> {
//!     match field {
//!         "title" => Field::Str(&task.title),
//!         "priority" => Field::Int(task.priority),
//!         "due" => Field::Str(&task.due),
//!         _ => Field::Missing,
//!     }
//! }
//!
//! let filters = FilterSet::builder()
//!     .handler("min_priority", |q: Query, v: Value| {
//!         let n = v.as_i64().ok_or_else(|| InvalidArgument::rejected("number expected"))?;
//!         Ok(q.and("priority", Op::Gte, n))
//!     })
//!     .groups_handler("due_in", |q: Query, g: Groups| {
//!         let prefix = format!("{}-{}", g.get("year").unwrap_or(""), g.get("month").unwrap_or(""));
//!         Ok(q.and("due", Op::StartsWith, prefix))
//!     })
//!     .handler("titles", |q: Query, v: Value| {
//!         let set = Operand::from_value(&v).ok_or_else(|| InvalidArgument::rejected("list expected"))?;
//!         Ok(q.and("title", Op::In, set))
//!     })
//!     .filter("priority", Filter::integer().handler("min_priority"))
//!     .filter("due", Filter::pattern(r"(?P<year>\d{4})-(?P<month>\d{2})").unwrap().handler("due_in"))
//!     .filter("title", Filter::csv().handler("titles"))
//!     .build()
//!     .unwrap();
//!
//! let tasks = vec![
//!     Task { title: "Write docs".into(), priority: 3, due: "2024-05-02".into() },
//!     Task { title: "Fix bug".into(), priority: 5, due: "2024-06-10".into() },
//!     Task { title: "Ship".into(), priority: 4, due: "2024-05-30".into() },
//! ];
//!
//! let params = Params::from_query_string("priority=4&due=2024-05");
//! let query = filters.filter(Query::new(), &params).unwrap();
//! let found = query.filter(&tasks, accessor);
//! assert_eq!(found.len(), 1);
//! assert_eq!(found[0].title, "Ship");
//!
//! // Bad input names the filter that rejected it.
//! let err = filters
//!     .filter(Query::new(), &Params::from_query_string("due=May"))
//!     .unwrap_err();
//! assert!(err.to_string().contains("'due'"));
//! ```
//!
//! # Error Classes
//!
//! | Error | Cause | Swallowed by `ignore_failure` |
//! |-------|-------|-------------------------------|
//! | [`InvalidArgument`] | bad request input | yes |
//! | [`ConfigError`] | filters wired up wrong | never |

mod coerce;
mod error;
mod filter;
mod handler;
pub mod memory;
mod params;
mod queryable;
mod resource;
mod set;
mod value;

// Re-export public API
pub use coerce::{Coercer, Pattern, Shape, LIST_DELIMITER};
pub use error::{BoxError, ConfigError, FilterError, InvalidArgument, Result};
pub use filter::Filter;
pub use handler::{GroupsFn, Handler, HandlerResult, Handlers, ValueFn};
pub use params::Params;
pub use queryable::Queryable;
pub use resource::FilteredResource;
pub use set::{FilterNode, FilterSet, FilterSetBuilder};
pub use value::{Groups, Value};

//! Resources whose listings are narrowed by request parameters.

use crate::error::Result;
use crate::params::Params;
use crate::queryable::Queryable;
use crate::set::FilterSet;

/// A resource that owns a filter set and a base query.
///
/// Implement the two required methods; [`filtered_query`] runs the filter set
/// over a request's parameters, starting from the base query. The web layer
/// maps an invalid argument to a 400-class response and a configuration
/// error to an internal error (see [`FilterError::is_invalid_argument`]).
///
/// [`filtered_query`]: FilteredResource::filtered_query
/// [`FilterError::is_invalid_argument`]: crate::FilterError::is_invalid_argument
///
/// # Example
///
/// ```
/// use paramsieve::memory::{Op, Operand, Query};
/// use paramsieve::{Filter, FilterSet, FilteredResource, InvalidArgument, Params};
///
/// struct Tasks {
///     filters: FilterSet<Query>,
/// }
///
/// impl FilteredResource<Query> for Tasks {
///     fn base_query(&self) -> Query {
///         Query::new().and("archived", Op::Eq, false)
///     }
///
///     fn filter_set(&self) -> &FilterSet<Query> {
///         &self.filters
///     }
/// }
///
/// let tasks = Tasks {
///     filters: FilterSet::builder()
///         .handler("by_owner", |q: Query, v| {
///             let owner = Operand::from_value(&v)
///                 .ok_or_else(|| InvalidArgument::rejected("owner must be a string"))?;
///             Ok(q.and("owner", Op::Eq, owner))
///         })
///         .filter("owner", Filter::string().handler("by_owner"))
///         .build()
///         .unwrap(),
/// };
///
/// let query = tasks
///     .filtered_query(&Params::from_query_string("owner=ana"))
///     .unwrap();
/// assert_eq!(query.clauses().len(), 2);
/// ```
pub trait FilteredResource<Q: Queryable> {
    /// The unfiltered query for this resource.
    fn base_query(&self) -> Q;

    /// The filters request parameters are run through.
    fn filter_set(&self) -> &FilterSet<Q>;

    /// The base query narrowed by the request's parameters.
    fn filtered_query(&self, params: &Params) -> Result<Q> {
        self.filter_set().filter(self.base_query(), params)
    }
}

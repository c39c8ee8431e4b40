//! The query abstraction filters transform.

/// A query in progress.
///
/// Filters never inspect a queryable; they only thread it through handlers
/// and fixed conditions, each step producing the next query. The data-access
/// layer that eventually runs the query owns its meaning.
///
/// `Clone` lets a filter that ignores failures restore the query it started
/// from, and lets a choice filter hand the same query to every alternative.
///
/// # Example
///
/// ```
/// use paramsieve::Queryable;
///
/// #[derive(Clone, Debug, Default)]
/// struct Sql {
///     wheres: Vec<String>,
/// }
///
/// impl Queryable for Sql {
///     type Condition = String;
///
///     fn apply_condition(mut self, condition: &String) -> Self {
///         self.wheres.push(condition.clone());
///         self
///     }
/// }
///
/// let q = Sql::default().apply_condition(&"deleted_at IS NULL".to_string());
/// assert_eq!(q.wheres.len(), 1);
/// ```
pub trait Queryable: Clone {
    /// A boolean expression the backing query understands.
    type Condition;

    /// Narrows the query by a fixed condition.
    fn apply_condition(self, condition: &Self::Condition) -> Self;
}

//! Property-based tests for paramsieve using proptest.

use proptest::prelude::*;
use paramsieve::memory::{Field, Op, Operand, Query};
use paramsieve::{Coercer, Filter, FilterSet, InvalidArgument, Params, Queryable, Value};

// ============================================================================
// Test helpers
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq)]
struct Log(Vec<String>);

impl Queryable for Log {
    type Condition = String;

    fn apply_condition(mut self, condition: &String) -> Self {
        self.0.push(condition.clone());
        self
    }
}

fn record(mut q: Log, v: Value) -> Result<Log, InvalidArgument> {
    q.0.push(v.to_string());
    Ok(q)
}

fn context() -> FilterSet<Log> {
    FilterSet::builder().handler("record", record).build().unwrap()
}

fn number_accessor<'a>(n: &'a i64, _field: &str) -> Field<'a> {
    Field::Int(*n)
}

// Tokens that never parse as an integer.
fn word_strategy() -> impl Strategy<Value = String> {
    "[a-z]{1,8}"
}

// ============================================================================
// Property tests
// ============================================================================

proptest! {
    /// Every rendered i64 coerces back to itself, surrounding blanks included.
    #[test]
    fn integers_coerce_exactly(n in any::<i64>(), pad in " {0,3}") {
        let raw = format!("{pad}{n}{pad}");
        let value = Filter::<Log>::integer().prepare(&raw).unwrap();
        prop_assert_eq!(value, Value::Integer(n));
    }

    /// A list with one bad token fails as a whole and never reaches the handler.
    #[test]
    fn list_rejection_is_atomic(
        head in prop::collection::vec(any::<i32>(), 0..5),
        bad in word_strategy(),
        tail in prop::collection::vec(any::<i32>(), 0..5),
    ) {
        let tokens: Vec<String> = head
            .iter()
            .map(ToString::to_string)
            .chain(std::iter::once(bad))
            .chain(tail.iter().map(ToString::to_string))
            .collect();
        let raw = tokens.join(",");

        let ctx = context();
        let filter = Filter::list(Coercer::Integer).handler("record");
        let result = filter.filter(Log::default(), &raw, Some(ctx.handlers()));

        let is_invalid_list = matches!(
            result.as_ref().err().and_then(|e| e.as_invalid_argument()),
            Some(InvalidArgument::InvalidList { .. })
        );
        prop_assert!(is_invalid_list);
    }

    /// A lenient filter returns either the narrowed query or the input unchanged.
    #[test]
    fn lenient_filter_never_fails(
        start in prop::collection::vec("[a-z]{1,4}", 0..4),
        raw in ".{0,12}",
    ) {
        let ctx = context();
        let filter = Filter::integer().handler("record").ignore_failure(true);
        let start = Log(start);

        let out = filter.filter(start.clone(), &raw, Some(ctx.handlers())).unwrap();
        match raw.trim().parse::<i64>() {
            Ok(n) => {
                let mut expected = start.clone();
                expected.0.push(n.to_string());
                prop_assert_eq!(out, expected);
            }
            Err(_) => prop_assert_eq!(out, start),
        }
    }

    /// A choice behaves exactly like the first alternative that accepts.
    #[test]
    fn choice_matches_first_acceptor(raw in "[0-9a-z.]{1,6}") {
        let ctx = context();
        let alternatives = [
            Filter::integer().handler("record"),
            Filter::float().handler("record"),
            Filter::string().handler("record"),
        ];
        let choice = Filter::choice(alternatives.clone());

        let expected = alternatives
            .iter()
            .find_map(|alt| alt.filter(Log::default(), &raw, Some(ctx.handlers())).ok())
            .unwrap();
        let actual = choice.filter(Log::default(), &raw, Some(ctx.handlers())).unwrap();
        prop_assert_eq!(actual, expected);
    }

    /// Filtering the same parameters twice gives the same query.
    #[test]
    fn filter_set_is_deterministic(
        values in prop::collection::vec(".{0,6}", 0..6),
    ) {
        let set = FilterSet::builder()
            .handler("record", record)
            .filter("a", Filter::integer().handler("record").ignore_failure(true))
            .filter("b", Filter::string().handler("record"))
            .build()
            .unwrap();

        let mut params = Params::new();
        for (i, value) in values.iter().enumerate() {
            params.insert(if i % 2 == 0 { "a" } else { "b" }, value.as_str());
        }

        let first = set.filter(Log::default(), &params).unwrap();
        let second = set.filter(Log::default(), &params).unwrap();
        prop_assert_eq!(first, second);
    }

    /// A query built from filters never returns more items than it was given.
    #[test]
    fn filtered_query_never_grows_collection(
        items in prop::collection::vec(any::<i64>(), 0..50),
        threshold in any::<i64>(),
    ) {
        let set = FilterSet::builder()
            .handler("min", |q: Query, v: Value| {
                let operand = Operand::from_value(&v)
                    .ok_or_else(|| InvalidArgument::rejected("number expected"))?;
                Ok(q.and("value", Op::Gte, operand))
            })
            .filter("min", Filter::integer().handler("min"))
            .build()
            .unwrap();

        let params = Params::new().with("min", threshold.to_string());
        let query = set.filter(Query::new(), &params).unwrap();
        let results = query.filter(&items, number_accessor);

        prop_assert!(results.len() <= items.len());
        prop_assert!(results.iter().all(|n| **n >= threshold));
    }
}

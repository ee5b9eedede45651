//! Stats columns and the stats reduction stack
//!
//! A `Stats` line contributes one element to the statistics plan: either an
//! aggregation over a column (`Stats: avg latency`) or a count of rows
//! matching a predicate (`Stats: state = 2`). `StatsAnd`/`StatsOr`/
//! `StatsNegate` reduce counting entries by stealing their filters and
//! wrapping them, mirroring the row-filter stack machine.

use std::sync::Arc;

use crate::query::aggregation::AggregationKind;
use crate::query::error::{QueryError, QueryResult};
use crate::query::filter::{Connective, Filter, FilterKind};
use crate::table::Column;

/// One element of the statistics plan
#[derive(Debug, Clone, PartialEq)]
pub enum StatsColumn {
    /// Count rows matching a stats-kind filter
    Count(Filter),
    /// Aggregate a column's numeric values
    Op {
        aggregation: AggregationKind,
        column: Arc<Column>,
    },
}

impl StatsColumn {
    /// Whether this entry holds a stealable filter.
    pub fn is_count(&self) -> bool {
        matches!(self, Self::Count(_))
    }

    /// Extract the wrapped filter, discarding the column.
    ///
    /// Only the `Count` variant has one; reducers check
    /// [`StatsColumn::is_count`] on every operand before stealing.
    fn steal_filter(self) -> Option<Filter> {
        match self {
            Self::Count(filter) => Some(filter),
            Self::Op { .. } => None,
        }
    }
}

/// LIFO stack of stats columns accumulated from request lines
pub type StatsColumnStack = Vec<StatsColumn>;

/// Pop `count` stats columns, combine their filters, push one `Count`.
///
/// Validation happens before any mutation: underflow or a non-counting
/// operand leaves the stack untouched.
pub fn reduce_stats_connective(
    stack: &mut StatsColumnStack,
    connective: Connective,
    count: usize,
) -> QueryResult<()> {
    if stack.len() < count {
        return Err(QueryError::StackUnderflow {
            expected: count,
            actual: stack.len(),
        });
    }
    let at = stack.len() - count;
    if !stack[at..].iter().all(StatsColumn::is_count) {
        return Err(QueryError::StatsCombineAggregation);
    }
    let subfilters: Vec<Filter> = stack
        .split_off(at)
        .into_iter()
        .filter_map(StatsColumn::steal_filter)
        .collect();
    stack.push(StatsColumn::Count(
        connective.combine(FilterKind::Stats, subfilters),
    ));
    Ok(())
}

/// Replace the top stats column with the negation of its filter.
pub fn negate_stats_top(stack: &mut StatsColumnStack) -> QueryResult<()> {
    match stack.last() {
        None => Err(QueryError::StackUnderflow {
            expected: 1,
            actual: 0,
        }),
        Some(top) if !top.is_count() => Err(QueryError::StatsCombineAggregation),
        Some(_) => {
            if let Some(filter) = stack.pop().and_then(StatsColumn::steal_filter) {
                stack.push(StatsColumn::Count(filter.negate()));
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{ColumnType, RelOp};

    fn count(name: &str, value: &str) -> StatsColumn {
        let column = Arc::new(Column::new(name, "test column", ColumnType::Int));
        StatsColumn::Count(
            column
                .create_filter(FilterKind::Stats, RelOp::Equal, value)
                .unwrap(),
        )
    }

    fn op(name: &str, aggregation: AggregationKind) -> StatsColumn {
        StatsColumn::Op {
            aggregation,
            column: Arc::new(Column::new(name, "test column", ColumnType::Int)),
        }
    }

    #[test]
    fn test_reduce_combines_count_filters() {
        let mut stack = vec![count("state", "0"), count("state", "1")];
        reduce_stats_connective(&mut stack, Connective::Or, 2).unwrap();

        assert_eq!(stack.len(), 1);
        match &stack[0] {
            StatsColumn::Count(Filter::Or { kind, subfilters }) => {
                assert_eq!(*kind, FilterKind::Stats);
                assert_eq!(subfilters.len(), 2);
            }
            other => panic!("expected or-count, got {other:?}"),
        }
    }

    #[test]
    fn test_reduce_single_operand_is_identity() {
        let mut stack = vec![count("state", "2")];
        let before = stack.clone();
        reduce_stats_connective(&mut stack, Connective::And, 1).unwrap();
        assert_eq!(stack, before);
    }

    #[test]
    fn test_reduce_underflow() {
        let mut stack = vec![count("state", "0")];
        let err = reduce_stats_connective(&mut stack, Connective::And, 2).unwrap_err();
        assert_eq!(
            err,
            QueryError::StackUnderflow {
                expected: 2,
                actual: 1
            }
        );
        assert_eq!(stack.len(), 1);
    }

    #[test]
    fn test_reduce_rejects_aggregation_operand() {
        let mut stack = vec![count("state", "0"), op("latency", AggregationKind::Avg)];
        let err = reduce_stats_connective(&mut stack, Connective::And, 2).unwrap_err();
        assert_eq!(err, QueryError::StatsCombineAggregation);
        // the aggregation entry must survive the failed reduction
        assert_eq!(stack.len(), 2);
        assert!(!stack[1].is_count());
    }

    #[test]
    fn test_negate_top() {
        let mut stack = vec![count("state", "0")];
        negate_stats_top(&mut stack).unwrap();
        match &stack[0] {
            StatsColumn::Count(Filter::Leaf { op, .. }) => assert_eq!(*op, RelOp::NotEqual),
            other => panic!("expected negated leaf count, got {other:?}"),
        }
    }

    #[test]
    fn test_negate_empty_underflows() {
        let mut stack = StatsColumnStack::new();
        assert_eq!(
            negate_stats_top(&mut stack).unwrap_err(),
            QueryError::StackUnderflow {
                expected: 1,
                actual: 0
            }
        );
    }

    #[test]
    fn test_negate_aggregation_rejected() {
        let mut stack = vec![op("latency", AggregationKind::Max)];
        assert_eq!(
            negate_stats_top(&mut stack).unwrap_err(),
            QueryError::StatsCombineAggregation
        );
        assert_eq!(stack.len(), 1);
    }
}

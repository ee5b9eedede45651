//! Filter trees and the shift/reduce filter stack
//!
//! `Filter` lines push leaves onto a LIFO stack; `And`/`Or` lines pop N
//! entries and push one connective node; `Negate` rewrites the top. The same
//! machine runs twice per request, once for row filters and once for
//! wait-condition filters, and the assembler folds whatever remains into a
//! single top-level conjunction.
//!
//! Negation is eager: leaves flip their operator, connectives distribute via
//! De Morgan. Negating twice therefore reproduces the original tree.

use std::sync::Arc;

use crate::query::error::{QueryError, QueryResult};
use crate::table::{Column, RelOp};

/// The context a filter is evaluated in
///
/// Distinct kinds may carry different column-evaluation rules (e.g. the
/// timezone offset applies to row filters but not to stats recounts).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKind {
    Row,
    Stats,
    WaitCondition,
}

/// An immutable predicate tree over table rows
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// `column op value` comparison
    Leaf {
        kind: FilterKind,
        column: Arc<Column>,
        op: RelOp,
        value: String,
    },
    /// Conjunction; empty subfilters accept every row
    And {
        kind: FilterKind,
        subfilters: Vec<Filter>,
    },
    /// Disjunction; empty subfilters reject every row
    Or {
        kind: FilterKind,
        subfilters: Vec<Filter>,
    },
}

impl Filter {
    /// The trivially-true filter: a conjunction of nothing.
    pub fn tautology(kind: FilterKind) -> Self {
        Self::And {
            kind,
            subfilters: Vec::new(),
        }
    }

    pub fn kind(&self) -> FilterKind {
        match self {
            Self::Leaf { kind, .. } | Self::And { kind, .. } | Self::Or { kind, .. } => *kind,
        }
    }

    pub fn is_tautology(&self) -> bool {
        matches!(self, Self::And { subfilters, .. } if subfilters.is_empty())
    }

    /// Produce the complementary filter.
    pub fn negate(self) -> Self {
        match self {
            Self::Leaf {
                kind,
                column,
                op,
                value,
            } => Self::Leaf {
                kind,
                column,
                op: op.negated(),
                value,
            },
            Self::And { kind, subfilters } => Self::Or {
                kind,
                subfilters: subfilters.into_iter().map(Filter::negate).collect(),
            },
            Self::Or { kind, subfilters } => Self::And {
                kind,
                subfilters: subfilters.into_iter().map(Filter::negate).collect(),
            },
        }
    }

    /// Column names this tree references, in no particular order.
    pub fn column_names(&self, out: &mut Vec<String>) {
        match self {
            Self::Leaf { column, .. } => out.push(column.name().to_string()),
            Self::And { subfilters, .. } | Self::Or { subfilters, .. } => {
                for sub in subfilters {
                    sub.column_names(out);
                }
            }
        }
    }
}

impl std::fmt::Display for Filter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Leaf {
                column, op, value, ..
            } => write!(f, "{} {} {}", column.name(), op, value),
            Self::And { subfilters, .. } => {
                if subfilters.is_empty() {
                    return f.write_str("(all)");
                }
                f.write_str("(and")?;
                for sub in subfilters {
                    write!(f, " [{sub}]")?;
                }
                f.write_str(")")
            }
            Self::Or { subfilters, .. } => {
                if subfilters.is_empty() {
                    return f.write_str("(none)");
                }
                f.write_str("(or")?;
                for sub in subfilters {
                    write!(f, " [{sub}]")?;
                }
                f.write_str(")")
            }
        }
    }
}

/// Which connective an `And`/`Or` reduction builds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connective {
    And,
    Or,
}

impl Connective {
    /// Combine operand filters under this connective.
    ///
    /// A single operand is returned unchanged, so `And: 1` is the identity.
    pub fn combine(self, kind: FilterKind, mut subfilters: Vec<Filter>) -> Filter {
        if subfilters.len() == 1 {
            return subfilters.remove(0);
        }
        match self {
            Self::And => Filter::And { kind, subfilters },
            Self::Or => Filter::Or { kind, subfilters },
        }
    }
}

/// LIFO stack of filters accumulated from request lines
pub type FilterStack = Vec<Filter>;

/// Pop `count` filters, wrap them under `connective`, push the result.
///
/// The stack height is validated before anything is popped, so a failed
/// reduction leaves the stack exactly as it was.
pub fn reduce_connective(
    stack: &mut FilterStack,
    kind: FilterKind,
    connective: Connective,
    count: usize,
) -> QueryResult<()> {
    if stack.len() < count {
        return Err(QueryError::StackUnderflow {
            expected: count,
            actual: stack.len(),
        });
    }
    // split_off keeps the operands in their original push order
    let subfilters = stack.split_off(stack.len() - count);
    stack.push(connective.combine(kind, subfilters));
    Ok(())
}

/// Replace the top of the stack with its negation.
pub fn negate_top(stack: &mut FilterStack) -> QueryResult<()> {
    let top = stack.pop().ok_or(QueryError::StackUnderflow {
        expected: 1,
        actual: 0,
    })?;
    stack.push(top.negate());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::ColumnType;

    fn leaf(name: &str, op: &str, value: &str) -> Filter {
        let column = Arc::new(Column::new(name, "test column", ColumnType::Text));
        column
            .create_filter(FilterKind::Row, RelOp::from_name(op).unwrap(), value)
            .unwrap()
    }

    #[test]
    fn test_reduce_preserves_push_order() {
        let mut stack = vec![leaf("a", "=", "1"), leaf("b", "=", "2"), leaf("c", "=", "3")];
        reduce_connective(&mut stack, FilterKind::Row, Connective::And, 2).unwrap();

        assert_eq!(stack.len(), 2);
        match &stack[1] {
            Filter::And { subfilters, .. } => {
                assert_eq!(subfilters[0], leaf("b", "=", "2"));
                assert_eq!(subfilters[1], leaf("c", "=", "3"));
            }
            other => panic!("expected conjunction, got {other:?}"),
        }
    }

    #[test]
    fn test_reduce_single_operand_is_identity() {
        let mut stack = vec![leaf("a", "=", "1")];
        reduce_connective(&mut stack, FilterKind::Row, Connective::Or, 1).unwrap();
        assert_eq!(stack, vec![leaf("a", "=", "1")]);
    }

    #[test]
    fn test_reduce_underflow_keeps_stack_intact() {
        let mut stack = vec![leaf("a", "=", "1")];
        let err = reduce_connective(&mut stack, FilterKind::Row, Connective::And, 3).unwrap_err();
        assert_eq!(
            err,
            QueryError::StackUnderflow {
                expected: 3,
                actual: 1
            }
        );
        assert_eq!(stack, vec![leaf("a", "=", "1")]);
    }

    #[test]
    fn test_reduce_zero_pushes_tautology() {
        let mut stack = FilterStack::new();
        reduce_connective(&mut stack, FilterKind::Row, Connective::And, 0).unwrap();
        assert_eq!(stack.len(), 1);
        assert!(stack[0].is_tautology());
    }

    #[test]
    fn test_negate_leaf_flips_operator() {
        let negated = leaf("state", "=", "0").negate();
        match negated {
            Filter::Leaf { op, .. } => assert_eq!(op, RelOp::NotEqual),
            other => panic!("expected leaf, got {other:?}"),
        }
    }

    #[test]
    fn test_double_negation_is_identity() {
        let original = Connective::And.combine(
            FilterKind::Row,
            vec![
                leaf("name", "~", "web"),
                Connective::Or.combine(
                    FilterKind::Row,
                    vec![leaf("state", "=", "0"), leaf("state", "=", "1")],
                ),
            ],
        );
        assert_eq!(original.clone().negate().negate(), original);
    }

    #[test]
    fn test_negate_empty_stack_underflows() {
        let mut stack = FilterStack::new();
        assert_eq!(
            negate_top(&mut stack).unwrap_err(),
            QueryError::StackUnderflow {
                expected: 1,
                actual: 0
            }
        );
    }

    #[test]
    fn test_column_names() {
        let filter = Connective::Or.combine(
            FilterKind::Row,
            vec![leaf("name", "=", "x"), leaf("alias", "=", "y")],
        );
        let mut names = Vec::new();
        filter.column_names(&mut names);
        assert_eq!(names, vec!["name", "alias"]);
    }
}

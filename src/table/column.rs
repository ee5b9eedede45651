//! Column descriptors and relational operators
//!
//! A column is what a request line can reference: filters compare against
//! it, stats aggregate over it, output emits it. The set of column shapes is
//! closed; rows store plain [`Value`](crate::table::Value)s keyed by column
//! name, so a column here is a descriptor, not an accessor.

use std::sync::Arc;

use crate::query::{Filter, FilterKind, QueryError, QueryResult};

/// The value shape a column exposes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    /// Signed integer (counts, states)
    Int,
    /// Floating point (rates, durations)
    Double,
    /// UTF-8 text
    Text,
    /// List of strings
    TextList,
    /// Unix timestamp, subject to the client timezone offset
    Time,
    /// Placeholder for a column this site does not know
    Null,
}

/// A named column of a table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    name: String,
    description: String,
    column_type: ColumnType,
}

impl Column {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        column_type: ColumnType,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            column_type,
        }
    }

    /// Placeholder for a column name this site does not know.
    ///
    /// Only the `Columns` header falls back to this; filters and stats on an
    /// unknown name stay hard errors.
    pub fn null(name: impl Into<String>) -> Self {
        Self::new(name, "non-existing column", ColumnType::Null)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn column_type(&self) -> ColumnType {
        self.column_type
    }

    /// Build a leaf filter comparing this column against `value`.
    pub fn create_filter(
        self: &Arc<Self>,
        kind: FilterKind,
        op: RelOp,
        value: impl Into<String>,
    ) -> QueryResult<Filter> {
        if self.column_type == ColumnType::Null {
            return Err(QueryError::UnfilterableColumn(self.name.clone()));
        }
        Ok(Filter::Leaf {
            kind,
            column: Arc::clone(self),
            op,
            value: value.into(),
        })
    }
}

/// The relational operators a leaf filter can carry
///
/// Regex variants apply to text as patterns; on integer columns the match
/// operators degrade to bit-superset tests, which is why no column type
/// rejects them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelOp {
    Equal,
    NotEqual,
    Matches,
    DoesntMatch,
    EqualIcase,
    NotEqualIcase,
    MatchesIcase,
    DoesntMatchIcase,
    Less,
    GreaterOrEqual,
    Greater,
    LessOrEqual,
}

impl RelOp {
    /// Translate a textual operator into its enum value.
    pub fn from_name(name: &str) -> QueryResult<Self> {
        match name {
            "=" => Ok(Self::Equal),
            "!=" => Ok(Self::NotEqual),
            "~" => Ok(Self::Matches),
            "!~" => Ok(Self::DoesntMatch),
            "=~" => Ok(Self::EqualIcase),
            "!=~" => Ok(Self::NotEqualIcase),
            "~~" => Ok(Self::MatchesIcase),
            "!~~" => Ok(Self::DoesntMatchIcase),
            "<" => Ok(Self::Less),
            ">=" => Ok(Self::GreaterOrEqual),
            ">" => Ok(Self::Greater),
            "<=" => Ok(Self::LessOrEqual),
            _ => Err(QueryError::UnknownRelationalOperator(name.into())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Equal => "=",
            Self::NotEqual => "!=",
            Self::Matches => "~",
            Self::DoesntMatch => "!~",
            Self::EqualIcase => "=~",
            Self::NotEqualIcase => "!=~",
            Self::MatchesIcase => "~~",
            Self::DoesntMatchIcase => "!~~",
            Self::Less => "<",
            Self::GreaterOrEqual => ">=",
            Self::Greater => ">",
            Self::LessOrEqual => "<=",
        }
    }

    /// The operator testing the complementary relation.
    pub fn negated(&self) -> Self {
        match self {
            Self::Equal => Self::NotEqual,
            Self::NotEqual => Self::Equal,
            Self::Matches => Self::DoesntMatch,
            Self::DoesntMatch => Self::Matches,
            Self::EqualIcase => Self::NotEqualIcase,
            Self::NotEqualIcase => Self::EqualIcase,
            Self::MatchesIcase => Self::DoesntMatchIcase,
            Self::DoesntMatchIcase => Self::MatchesIcase,
            Self::Less => Self::GreaterOrEqual,
            Self::GreaterOrEqual => Self::Less,
            Self::Greater => Self::LessOrEqual,
            Self::LessOrEqual => Self::Greater,
        }
    }
}

impl std::fmt::Display for RelOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rel_op_round_trip() {
        for name in [
            "=", "!=", "~", "!~", "=~", "!=~", "~~", "!~~", "<", ">=", ">", "<=",
        ] {
            assert_eq!(RelOp::from_name(name).unwrap().name(), name);
        }
    }

    #[test]
    fn test_rel_op_unknown() {
        assert_eq!(
            RelOp::from_name("=="),
            Err(QueryError::UnknownRelationalOperator("==".into()))
        );
    }

    #[test]
    fn test_rel_op_negation_is_involution() {
        for name in ["=", "~", "=~", "~~", "<", ">"] {
            let op = RelOp::from_name(name).unwrap();
            assert_eq!(op.negated().negated(), op);
        }
    }

    #[test]
    fn test_null_column_rejects_filters() {
        let column = Arc::new(Column::null("ghost"));
        let err = column
            .create_filter(FilterKind::Row, RelOp::Equal, "x")
            .unwrap_err();
        assert_eq!(err, QueryError::UnfilterableColumn("ghost".into()));
    }

    #[test]
    fn test_create_filter_keeps_value_verbatim() {
        let column = Arc::new(Column::new("name", "group name", ColumnType::Text));
        let filter = column
            .create_filter(FilterKind::Row, RelOp::Equal, "web  servers")
            .unwrap();
        match filter {
            Filter::Leaf { op, value, .. } => {
                assert_eq!(op, RelOp::Equal);
                assert_eq!(value, "web  servers");
            }
            other => panic!("expected leaf, got {other:?}"),
        }
    }
}

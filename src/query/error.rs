//! Query parse error types
//!
//! Every error here surfaces as a bad-request diagnostic on the output
//! buffer; parsing itself never aborts a request.

use thiserror::Error;

/// Errors raised while parsing a single request header
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// A header required an argument that was not given
    #[error("missing argument")]
    MissingArgument,

    /// A header received more arguments than it accepts
    #[error("superfluous argument(s)")]
    SuperfluousArguments,

    /// An argument did not parse as a non-negative integer
    #[error("expected non-negative integer")]
    ExpectedNonNegativeInteger,

    /// The header keyword is not part of the protocol
    #[error("undefined request header")]
    UndefinedHeader,

    /// An And/Or/Negate line asked for more operands than are on the stack
    #[error("{}", stack_underflow_message(.expected, .actual))]
    StackUnderflow { expected: usize, actual: usize },

    /// Referenced column does not exist in the queried table
    #[error("table '{table}' has no column '{column}'")]
    UnknownColumn { table: String, column: String },

    /// A filter was requested on a placeholder column
    #[error("cannot filter on non-existing column '{0}'")]
    UnfilterableColumn(String),

    /// The relational operator name is not recognized
    #[error("invalid relational operator '{0}'")]
    UnknownRelationalOperator(String),

    /// The output format name is not recognized
    #[error("missing/invalid output format, use one of 'CSV', 'csv', 'json', 'python', 'python3'")]
    InvalidOutputFormat,

    /// A boolean header got something other than on/off
    #[error("expected 'on' or 'off'")]
    ExpectedOnOff,

    /// A ResponseHeader line got something other than off/fixed16
    #[error("expected 'off' or 'fixed16'")]
    ExpectedResponseHeaderMode,

    /// A separator value does not fit into a single byte
    #[error("separator byte out of range (0..=255)")]
    SeparatorOutOfRange,

    /// A StatsAnd/StatsOr/StatsNegate operand carried an aggregation
    /// instead of a counting filter
    #[error("can only combine counting stats columns")]
    StatsCombineAggregation,

    /// The wait trigger name is not part of the fixed registry
    #[error("invalid trigger '{0}', allowed are all, check, state, log, downtime, comment, command, program")]
    InvalidTrigger(String),

    /// A WaitObject primary key did not select a row
    #[error("primary key '{0}' not found or not supported by this table")]
    PrimaryKeyNotFound(String),

    /// Client and server clocks differ by a day or more
    #[error("timezone difference greater than or equal to 24 hours")]
    TimezoneOffsetTooLarge,
}

fn stack_underflow_message(expected: &usize, actual: &usize) -> String {
    format!(
        "cannot combine filters: expecting {} {}, but only {} {} on stack",
        expected,
        if *expected == 1 { "filter" } else { "filters" },
        actual,
        if *actual == 1 { "is" } else { "are" },
    )
}

/// Result type for header parsing
pub type QueryResult<T> = Result<T, QueryError>;

//! # Lookout
//!
//! Server-side parser and query-plan builder for a line-oriented, text-based
//! monitoring query protocol. A client sends a table name and a sequence of
//! `Header: value` lines; Lookout parses them into an immutable
//! [`ParsedQuery`] plan describing which rows to scan, which predicates to
//! apply, which columns to emit, which statistics to compute, and optionally
//! a wait condition with timeout and trigger.
//!
//! ## Modules
//!
//! - [`query`]: header parsing, filter stacks, aggregations, the plan itself
//! - [`table`]: the table/column/row surface the parser resolves against
//! - [`output`]: response buffer, formats, framing, diagnostics
//! - [`auth`]: the user identity a plan runs as
//! - [`triggers`]: the fixed wait-trigger registry
//!
//! ## Quick Start
//!
//! ```rust
//! use lookout::output::OutputBuffer;
//! use lookout::query::ParsedQuery;
//! use lookout::table::service_groups::{ServiceGroup, ServiceGroupsTable};
//!
//! let table = ServiceGroupsTable::new(vec![
//!     ServiceGroup::new("web", "Web Servers").service_states(10, 1, 1, 0, 0),
//! ]);
//!
//! let lines = vec![
//!     "Columns: name num_services_crit".to_string(),
//!     "Filter: num_services_crit > 0".to_string(),
//! ];
//!
//! let mut output = OutputBuffer::new(100 * 1024 * 1024);
//! let plan = ParsedQuery::parse(&lines, &table, &mut output);
//!
//! assert!(!output.has_errors());
//! assert_eq!(plan.columns.len(), 2);
//! ```
//!
//! Parsing is per-line fault tolerant: a malformed line is reported as a
//! bad-request diagnostic on the output buffer and everything built by the
//! other lines is kept.

pub mod auth;
pub mod config;
pub mod output;
pub mod query;
pub mod table;
pub mod triggers;

// Re-export top-level types for convenience
pub use auth::AuthUser;
pub use config::{Config, ConfigError, EngineConfig, LoggingConfig};
pub use output::{
    CsvSeparators, OutputBuffer, OutputFormat, ResponseCode, ResponseHeader,
};
pub use query::{
    Accumulator, AggregationKind, Connective, Filter, FilterKind, ParsedQuery, QueryError,
    QueryResult, StatsColumn,
};
pub use table::{Column, ColumnType, Core, RelOp, Row, Table, TableRegistry, Value};
pub use triggers::Trigger;

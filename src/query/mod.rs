//! Query parsing engine
//!
//! Turns the header lines of a request into an executable plan:
//!
//! - **Lexer**: whitespace-token helpers over header values
//! - **Filter**: predicate trees and the shift/reduce filter stack
//! - **Stats**: statistics columns and their reduction stack
//! - **Aggregation**: the numeric accumulators behind `Stats` operators
//! - **Parser**: header dispatch and [`ParsedQuery`] assembly
//!
//! # Request shape
//!
//! ```text
//! Columns: name alias num_services
//! Filter: num_services_crit > 0
//! Filter: name ~ ^web
//! And: 2
//! OutputFormat: json
//! ResponseHeader: fixed16
//! ```
//!
//! Parsing never fails as a whole. A bad line leaves a diagnostic on the
//! output buffer and the plan keeps everything the preceding lines built.

mod aggregation;
mod error;
mod filter;
mod lexer;
mod parser;
mod stats;

pub use aggregation::{Accumulator, AggregationKind};
pub use error::{QueryError, QueryResult};
pub use filter::{Connective, Filter, FilterKind, FilterStack};
pub use parser::ParsedQuery;
pub use stats::{StatsColumn, StatsColumnStack};

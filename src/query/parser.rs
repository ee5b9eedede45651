//! Request parsing and plan assembly
//!
//! A request is an ordered list of `Header: value` lines against one table.
//! Each line is dispatched on its header keyword and folded into the plan;
//! a line that fails to parse produces a bad-request diagnostic on the
//! output buffer and parsing continues, keeping everything accumulated so
//! far. The finished [`ParsedQuery`] is immutable and drives the row scan.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use tracing::debug;

use crate::auth::AuthUser;
use crate::output::{CsvSeparators, OutputBuffer, OutputFormat, ResponseCode, ResponseHeader};
use crate::query::aggregation::AggregationKind;
use crate::query::error::{QueryError, QueryResult};
use crate::query::filter::{
    negate_top, reduce_connective, Connective, Filter, FilterKind, FilterStack,
};
use crate::query::lexer::{expect_no_arguments, next_non_negative_int, next_string};
use crate::query::stats::{negate_stats_top, reduce_stats_connective, StatsColumn};
use crate::table::{Column, RelOp, Row, Table};
use crate::triggers::Trigger;

/// An executable query plan assembled from request lines
#[derive(Debug, Clone)]
pub struct ParsedQuery {
    /// Columns to emit, in request order
    pub columns: Vec<Arc<Column>>,
    /// Statistics plan, in request order
    pub stats_columns: Vec<StatsColumn>,
    /// Every column name referenced anywhere in the request
    pub all_column_names: BTreeSet<String>,
    /// Row predicate; the trivially-true conjunction when no filters apply
    pub filter: Filter,
    /// Predicate a waiting query re-evaluates until it holds
    pub wait_condition: Filter,
    /// Identity the query runs as
    pub user: AuthUser,
    /// Whether to emit a header row of column names
    pub show_column_headers: bool,
    /// Body encoding
    pub output_format: OutputFormat,
    /// Response framing
    pub response_header: ResponseHeader,
    /// Whether the connection stays open after the response
    pub keepalive: bool,
    /// Separator bytes for the CSV-style encodings
    pub separators: CsvSeparators,
    /// Maximum number of rows to emit; `None` means unlimited
    pub limit: Option<usize>,
    /// Soft deadline for the scan: requested duration and absolute instant
    pub time_limit: Option<(Duration, Instant)>,
    /// How long a waiting query may park
    pub wait_timeout: Duration,
    /// Event source that wakes a waiting query
    pub wait_trigger: Option<Trigger>,
    /// Single object a wait condition is evaluated against
    pub wait_object: Option<Row>,
    /// Client clock offset, added to emitted timestamps and subtracted
    /// from timestamps in filter values
    pub timezone_offset: chrono::Duration,
}

impl ParsedQuery {
    /// Parse a request against `table`.
    ///
    /// Never fails as a whole: offending lines are reported on `output` as
    /// bad-request diagnostics and skipped. The caller decides what to do
    /// with a plan whose buffer carries errors.
    pub fn parse(lines: &[String], table: &dyn Table, output: &mut OutputBuffer) -> Self {
        let mut query = Self::with_defaults();
        let mut filters = FilterStack::new();
        let mut wait_conditions = FilterStack::new();

        for line in lines {
            let (header, value) = split_header_line(line);
            if let Err(err) =
                query.dispatch(header, value, table, &mut filters, &mut wait_conditions)
            {
                output.set_error(
                    ResponseCode::BadRequest,
                    format!(
                        "while processing header '{}' for table '{}': {}",
                        header,
                        table.name(),
                        err
                    ),
                );
            }
        }

        if query.columns.is_empty() && query.stats_columns.is_empty() {
            table.any_column(&mut |column| {
                query.all_column_names.insert(column.name().to_string());
                query.columns.push(Arc::clone(column));
                false
            });
            // Overwrites an explicit ColumnHeaders: off. Suspect, but
            // clients have depended on it for a long time.
            query.show_column_headers = true;
        }

        query.filter = Connective::And.combine(FilterKind::Row, filters);
        query.wait_condition =
            Connective::And.combine(FilterKind::WaitCondition, wait_conditions);
        output.set_response_header(query.response_header);
        query
    }

    fn with_defaults() -> Self {
        Self {
            columns: Vec::new(),
            stats_columns: Vec::new(),
            all_column_names: BTreeSet::new(),
            filter: Filter::tautology(FilterKind::Row),
            wait_condition: Filter::tautology(FilterKind::WaitCondition),
            user: AuthUser::NoAuth,
            show_column_headers: true,
            output_format: OutputFormat::default(),
            response_header: ResponseHeader::default(),
            keepalive: false,
            separators: CsvSeparators::default(),
            limit: None,
            time_limit: None,
            wait_timeout: Duration::ZERO,
            wait_trigger: None,
            wait_object: None,
            timezone_offset: chrono::Duration::zero(),
        }
    }

    fn dispatch(
        &mut self,
        header: &str,
        value: &str,
        table: &dyn Table,
        filters: &mut FilterStack,
        wait_conditions: &mut FilterStack,
    ) -> QueryResult<()> {
        match header {
            "Filter" => self.parse_filter_line(value, FilterKind::Row, filters, table),
            "And" => Self::parse_and_or_line(value, FilterKind::Row, Connective::And, filters),
            "Or" => Self::parse_and_or_line(value, FilterKind::Row, Connective::Or, filters),
            "Negate" => Self::parse_negate_line(value, filters),
            "Stats" => self.parse_stats_line(value, table),
            "StatsAnd" => self.parse_stats_and_or_line(value, Connective::And),
            "StatsOr" => self.parse_stats_and_or_line(value, Connective::Or),
            "StatsNegate" => self.parse_stats_negate_line(value),
            "Columns" => self.parse_columns_line(value, table),
            "ColumnHeaders" => self.parse_column_headers_line(value),
            "Limit" => self.parse_limit_line(value),
            "Timelimit" => self.parse_time_limit_line(value),
            "AuthUser" => {
                self.user = table.core().find_user(value);
                Ok(())
            }
            "Separators" => self.parse_separators_line(value),
            "OutputFormat" => self.parse_output_format_line(value),
            "ResponseHeader" => self.parse_response_header_line(value),
            "KeepAlive" => self.parse_keep_alive_line(value),
            "WaitCondition" => {
                self.parse_filter_line(value, FilterKind::WaitCondition, wait_conditions, table)
            }
            "WaitConditionAnd" => Self::parse_and_or_line(
                value,
                FilterKind::WaitCondition,
                Connective::And,
                wait_conditions,
            ),
            "WaitConditionOr" => Self::parse_and_or_line(
                value,
                FilterKind::WaitCondition,
                Connective::Or,
                wait_conditions,
            ),
            "WaitConditionNegate" => Self::parse_negate_line(value, wait_conditions),
            "WaitTrigger" => self.parse_wait_trigger_line(value),
            "WaitObject" => self.parse_wait_object_line(value, table),
            "WaitTimeout" => self.parse_wait_timeout_line(value),
            "Localtime" => self.parse_localtime_line(value),
            _ => Err(QueryError::UndefinedHeader),
        }
    }

    fn parse_filter_line(
        &mut self,
        mut line: &str,
        kind: FilterKind,
        stack: &mut FilterStack,
        table: &dyn Table,
    ) -> QueryResult<()> {
        let column_name = next_string(&mut line)?.to_string();
        let op = RelOp::from_name(next_string(&mut line)?)?;
        let value = line.trim_start();
        let filter = table.column(&column_name)?.create_filter(kind, op, value)?;
        stack.push(filter);
        self.all_column_names.insert(column_name);
        Ok(())
    }

    fn parse_and_or_line(
        mut line: &str,
        kind: FilterKind,
        connective: Connective,
        stack: &mut FilterStack,
    ) -> QueryResult<()> {
        let count = next_non_negative_int(&mut line)? as usize;
        reduce_connective(stack, kind, connective, count)
    }

    fn parse_negate_line(line: &str, stack: &mut FilterStack) -> QueryResult<()> {
        expect_no_arguments(line)?;
        negate_top(stack)
    }

    /// A `Stats` line is either `<op> <column>` or `<column> <relop> <value>`;
    /// the first token decides which.
    fn parse_stats_line(&mut self, mut line: &str, table: &dyn Table) -> QueryResult<()> {
        let column_or_op = next_string(&mut line)?;
        let (column_name, stats_column) = match AggregationKind::from_name(column_or_op) {
            Some(aggregation) => {
                let column_name = next_string(&mut line)?.to_string();
                let column = table.column(&column_name)?;
                (column_name, StatsColumn::Op { aggregation, column })
            }
            None => {
                let column_name = column_or_op.to_string();
                let op = RelOp::from_name(next_string(&mut line)?)?;
                let value = line.trim_start();
                let filter = table
                    .column(&column_name)?
                    .create_filter(FilterKind::Stats, op, value)?;
                (column_name, StatsColumn::Count(filter))
            }
        };
        self.stats_columns.push(stats_column);
        self.all_column_names.insert(column_name);
        // stats queries historically ship without column headers
        self.show_column_headers = false;
        Ok(())
    }

    fn parse_stats_and_or_line(
        &mut self,
        mut line: &str,
        connective: Connective,
    ) -> QueryResult<()> {
        let count = next_non_negative_int(&mut line)? as usize;
        reduce_stats_connective(&mut self.stats_columns, connective, count)
    }

    fn parse_stats_negate_line(&mut self, line: &str) -> QueryResult<()> {
        expect_no_arguments(line)?;
        negate_stats_top(&mut self.stats_columns)
    }

    fn parse_columns_line(&mut self, line: &str, table: &dyn Table) -> QueryResult<()> {
        let mut line = line;
        while !line.is_empty() {
            let split = line.find(char::is_whitespace).unwrap_or(line.len());
            let column_name = &line[..split];
            line = line[split..].trim_start();
            let column = match table.column(column_name) {
                Ok(column) => column,
                Err(_) => {
                    // Version-skew fallback: a site that does not know the
                    // column yet still answers, emitting empty values.
                    debug!(
                        column = column_name,
                        table = table.name(),
                        "substituting placeholder for unknown column"
                    );
                    Arc::new(Column::null(column_name))
                }
            };
            self.columns.push(column);
            self.all_column_names.insert(column_name.to_string());
        }
        self.show_column_headers = false;
        Ok(())
    }

    fn parse_column_headers_line(&mut self, mut line: &str) -> QueryResult<()> {
        self.show_column_headers = parse_on_off(next_string(&mut line)?)?;
        Ok(())
    }

    fn parse_limit_line(&mut self, mut line: &str) -> QueryResult<()> {
        self.limit = Some(next_non_negative_int(&mut line)? as usize);
        Ok(())
    }

    fn parse_time_limit_line(&mut self, mut line: &str) -> QueryResult<()> {
        let duration = Duration::from_secs(next_non_negative_int(&mut line)? as u64);
        self.time_limit = Some((duration, Instant::now() + duration));
        Ok(())
    }

    fn parse_separators_line(&mut self, mut line: &str) -> QueryResult<()> {
        let dataset = next_separator(&mut line)?;
        let field = next_separator(&mut line)?;
        let list = next_separator(&mut line)?;
        let host_service = next_separator(&mut line)?;
        self.separators = CsvSeparators {
            dataset,
            field,
            list,
            host_service,
        };
        Ok(())
    }

    fn parse_output_format_line(&mut self, mut line: &str) -> QueryResult<()> {
        self.output_format = match next_string(&mut line)? {
            "CSV" => OutputFormat::Csv,
            "csv" => OutputFormat::BrokenCsv,
            "json" => OutputFormat::Json,
            // "python" is an alias kept for old clients
            "python" | "python3" => OutputFormat::Python3,
            _ => return Err(QueryError::InvalidOutputFormat),
        };
        Ok(())
    }

    fn parse_response_header_line(&mut self, mut line: &str) -> QueryResult<()> {
        self.response_header = match next_string(&mut line)? {
            "off" => ResponseHeader::Off,
            "fixed16" => ResponseHeader::Fixed16,
            _ => return Err(QueryError::ExpectedResponseHeaderMode),
        };
        Ok(())
    }

    fn parse_keep_alive_line(&mut self, mut line: &str) -> QueryResult<()> {
        self.keepalive = parse_on_off(next_string(&mut line)?)?;
        Ok(())
    }

    fn parse_wait_trigger_line(&mut self, mut line: &str) -> QueryResult<()> {
        self.wait_trigger = Some(Trigger::from_name(next_string(&mut line)?)?);
        Ok(())
    }

    fn parse_wait_object_line(&mut self, line: &str, table: &dyn Table) -> QueryResult<()> {
        match table.get(line) {
            Some(row) => {
                self.wait_object = Some(row);
                Ok(())
            }
            None => Err(QueryError::PrimaryKeyNotFound(line.to_string())),
        }
    }

    fn parse_wait_timeout_line(&mut self, mut line: &str) -> QueryResult<()> {
        self.wait_timeout = Duration::from_millis(next_non_negative_int(&mut line)? as u64);
        Ok(())
    }

    fn parse_localtime_line(&mut self, mut line: &str) -> QueryResult<()> {
        let client_time = i64::from(next_non_negative_int(&mut line)?);
        // Round to half-hour steps: the clocks are assumed to be roughly
        // synchronized, so what remains is the client's time zone.
        let diff_secs = client_time - Utc::now().timestamp();
        let offset_secs = (diff_secs as f64 / 1800.0).round() as i64 * 1800;
        if offset_secs.abs() >= 24 * 3600 {
            return Err(QueryError::TimezoneOffsetTooLarge);
        }
        self.timezone_offset = chrono::Duration::seconds(offset_secs);
        Ok(())
    }
}

/// Split a request line into its header keyword and value.
///
/// The header is everything before the first `:`, verbatim; the value is
/// the rest with leading whitespace stripped. A line without a colon is all
/// header.
fn split_header_line(line: &str) -> (&str, &str) {
    match line.split_once(':') {
        Some((header, value)) => (header, value.trim_start()),
        None => (line, ""),
    }
}

fn parse_on_off(token: &str) -> QueryResult<bool> {
    match token {
        "on" => Ok(true),
        "off" => Ok(false),
        _ => Err(QueryError::ExpectedOnOff),
    }
}

fn next_separator(line: &mut &str) -> QueryResult<char> {
    let value = next_non_negative_int(line)?;
    u8::try_from(value)
        .map(char::from)
        .map_err(|_| QueryError::SeparatorOutOfRange)
}

//! Lookout plan-check CLI
//!
//! Reads one request from stdin (`GET <table>` followed by header lines,
//! terminated by an empty line or EOF), parses it against the built-in
//! tables, and prints the resulting plan together with any diagnostics.

use std::io::BufRead;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lookout::output::OutputBuffer;
use lookout::query::ParsedQuery;
use lookout::table::service_groups::{ServiceGroup, ServiceGroupsTable};
use lookout::table::TableRegistry;
use lookout::Config;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_default();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("lookout={}", config.logging.level)),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Lookout plan checker v{}", env!("CARGO_PKG_VERSION"));

    let registry = demo_registry();

    let stdin = std::io::stdin();
    let mut lines = Vec::new();
    let mut table_name = String::new();
    for line in stdin.lock().lines() {
        let line = line?;
        let line = line.trim_end_matches('\r');
        if line.is_empty() {
            break;
        }
        if table_name.is_empty() {
            match line.strip_prefix("GET ") {
                Some(name) => table_name = name.trim().to_string(),
                None => {
                    eprintln!("expected 'GET <table>' as the first line");
                    std::process::exit(2);
                }
            }
            continue;
        }
        lines.push(line.to_string());
    }

    let Some(table) = registry.table(&table_name) else {
        eprintln!(
            "unknown table '{}', available: {}",
            table_name,
            registry.table_names().join(", ")
        );
        std::process::exit(2);
    };

    let mut output = OutputBuffer::new(config.engine.max_response_size);
    let plan = ParsedQuery::parse(&lines, table.as_ref(), &mut output);
    print_plan(&plan, &config);

    if output.has_errors() {
        println!("\ndiagnostics:");
        for diagnostic in output.diagnostics() {
            println!("  {diagnostic}");
        }
        std::process::exit(1);
    }
    Ok(())
}

fn demo_registry() -> TableRegistry {
    let mut registry = TableRegistry::new();
    registry.register(Arc::new(ServiceGroupsTable::new(vec![
        ServiceGroup::new("web", "Web Servers")
            .members(&["alpha|http", "beta|http", "beta|https"])
            .service_states(10, 1, 1, 0, 0),
        ServiceGroup::new("db", "Databases")
            .members(&["gamma|postgres"])
            .service_states(4, 0, 0, 0, 1),
    ])));
    registry
}

fn print_plan(plan: &ParsedQuery, config: &Config) {
    println!("columns:");
    for column in &plan.columns {
        println!("  {} ({:?})", column.name(), column.column_type());
    }
    if !plan.stats_columns.is_empty() {
        println!("stats columns: {}", plan.stats_columns.len());
    }
    println!("filter: {}", plan.filter);
    if !plan.wait_condition.is_tautology() {
        println!("wait condition: {}", plan.wait_condition);
    }
    println!("user: {}", plan.user);
    println!("output format: {}", plan.output_format);
    println!("column headers: {}", plan.show_column_headers);
    match plan.limit {
        Some(limit) => println!("limit: {limit}"),
        None => println!("limit: unlimited"),
    }
    if let Some((duration, _)) = plan.time_limit {
        println!("time limit: {}s", duration.as_secs());
    }
    if let Some(trigger) = plan.wait_trigger {
        let timeout = plan
            .wait_timeout
            .min(std::time::Duration::from_millis(config.engine.max_wait_timeout_ms));
        println!("wait trigger: {trigger} (timeout {}ms)", timeout.as_millis());
    }
    if plan.timezone_offset != chrono::Duration::zero() {
        println!("timezone offset: {}s", plan.timezone_offset.num_seconds());
    }
}

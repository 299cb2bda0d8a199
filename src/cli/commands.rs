//! CLI command implementations
//!
//! Every command boots the same way: load config, load table definitions,
//! load rows into one in-memory executor shared by all three strategies,
//! then run a single operation and print the result.

use std::path::Path;
use std::sync::Arc;

use serde_json::{json, Value};

use crate::backend::{Dispatcher, MemoryExecutor, StaticFeatureFlags};
use crate::config::SearchConfig;
use crate::core::RequestContext;
use crate::observability::init_tracing;
use crate::query::{Calculation, ExportRowsOptions, SearchRequest, ViewParams};
use crate::schema::MemoryTableStore;
use crate::search::RowSearch;

use super::args::{Command, SourceArgs};
use super::errors::{CliError, CliResult};
use super::io::{read_request, write_error, write_response};

/// Main CLI entry point
///
/// Parses arguments and dispatches to the appropriate command.
/// This is the only function that main.rs should call.
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    let source = source_of(&cmd).clone();
    let config = load_config(source.config.as_deref())?;
    init_tracing(&config.log_level);

    let input = if needs_input(&cmd) {
        Some(read_request()?)
    } else {
        None
    };

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| CliError::io_error(format!("Failed to create tokio runtime: {}", e)))?;

    let result = rt.block_on(async {
        let search = boot(&source, config)?;
        execute(&search, &source, cmd, input).await
    });

    match result {
        Ok(data) => write_response(data),
        Err(e) => {
            write_error(e.code_str(), e.message())?;
            Err(e)
        }
    }
}

/// Load configuration, or defaults when no file is given
pub fn load_config(path: Option<&Path>) -> CliResult<SearchConfig> {
    match path {
        Some(path) => Ok(SearchConfig::load(path)?),
        None => Ok(SearchConfig::default()),
    }
}

/// Build the search service over the table and row directories
pub fn boot(source: &SourceArgs, config: SearchConfig) -> CliResult<RowSearch> {
    let store = MemoryTableStore::load_dir(&source.tables)?;
    let tables = store.tables()?;

    let executor = Arc::new(MemoryExecutor::new("memory"));
    executor.load_dir(&source.rows, tables.iter())?;

    let flags = StaticFeatureFlags::new(config.structured_query.clone());
    let dispatcher = Dispatcher::new(
        executor.clone(),
        executor.clone(),
        executor,
        Arc::new(flags),
    );

    tracing::debug!(tables = tables.len(), tenant = %source.tenant, "Booted row search.");
    Ok(RowSearch::new(config, Arc::new(store), dispatcher))
}

/// Run one command against a booted service
pub async fn execute(
    search: &RowSearch,
    source: &SourceArgs,
    cmd: Command,
    input: Option<Value>,
) -> CliResult<Value> {
    let ctx = RequestContext::new(source.tenant.clone());

    match cmd {
        Command::Search { .. } => {
            let request: SearchRequest = serde_json::from_value(required(input)?)?;
            let response = search.search(&ctx, request).await?;
            Ok(serde_json::to_value(response)?)
        }
        Command::Export { .. } => {
            let options: ExportRowsOptions = serde_json::from_value(required(input)?)?;
            let result = search.export_rows(&ctx, options).await?;
            Ok(serde_json::to_value(result)?)
        }
        Command::Fetch {
            table,
            raw,
            view,
            calculation,
            group,
            field,
            ..
        } => {
            let rows = match view {
                Some(view) => {
                    let params = ViewParams {
                        calculation: calculation.as_deref().map(parse_calculation).transpose()?,
                        group,
                        field,
                    };
                    search.fetch_view(&ctx, &table, &view, &params).await?
                }
                None if raw => search.fetch_raw(&ctx, &table).await?,
                None => search.fetch(&ctx, &table).await?,
            };
            Ok(json!({ "rows": rows }))
        }
        Command::Fields { table, fields, .. } => {
            let set = search.queriable_fields(&table, fields.as_deref()).await?;
            Ok(json!({ "fields": set.to_strings() }))
        }
    }
}

fn source_of(cmd: &Command) -> &SourceArgs {
    match cmd {
        Command::Search { source }
        | Command::Export { source }
        | Command::Fetch { source, .. }
        | Command::Fields { source, .. } => source,
    }
}

fn needs_input(cmd: &Command) -> bool {
    matches!(cmd, Command::Search { .. } | Command::Export { .. })
}

fn required(input: Option<Value>) -> CliResult<Value> {
    input.ok_or_else(|| CliError::bad_input("Expected a JSON request on stdin"))
}

fn parse_calculation(raw: &str) -> CliResult<Calculation> {
    serde_json::from_value(Value::String(raw.to_lowercase()))
        .map_err(|_| CliError::bad_input(format!("Unknown calculation '{}'", raw)))
}

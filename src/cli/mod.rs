//! CLI module for rowsearch
//!
//! Provides command-line interface for:
//! - search: run a search request
//! - export: export rows as CSV or JSON
//! - fetch: fetch rows, raw rows or a view
//! - fields: list queriable paths of a table

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command, SourceArgs};
pub use commands::{boot, execute, load_config, run, run_command};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{parse_request, read_request, write_error, write_response};

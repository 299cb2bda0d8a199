//! CLI argument definitions using clap
//!
//! Commands:
//! - rowsearch search --tables <dir> --rows <dir>
//! - rowsearch export --tables <dir> --rows <dir>
//! - rowsearch fetch --tables <dir> --rows <dir> --table <id> [--raw | --view <name>]
//! - rowsearch fields --tables <dir> --rows <dir> --table <id> [--fields a,b]

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::core::DEFAULT_TENANT;

/// rowsearch - run row searches against table definitions on disk
#[derive(Parser, Debug)]
#[command(name = "rowsearch")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// Where tables and rows come from, and who is asking
#[derive(Args, Debug, Clone)]
pub struct SourceArgs {
    /// Directory of table definitions (one JSON file per table)
    #[arg(long)]
    pub tables: PathBuf,

    /// Directory of row files named `<table id>.json`
    #[arg(long)]
    pub rows: PathBuf,

    /// Path to configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Tenant the request runs for
    #[arg(long, default_value = DEFAULT_TENANT)]
    pub tenant: String,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a search request read from stdin
    Search {
        #[command(flatten)]
        source: SourceArgs,
    },

    /// Run an export request read from stdin
    Export {
        #[command(flatten)]
        source: SourceArgs,
    },

    /// Fetch every row of a table, or run one of its views
    Fetch {
        #[command(flatten)]
        source: SourceArgs,

        /// Table id
        #[arg(long)]
        table: String,

        /// Return rows exactly as stored
        #[arg(long, conflicts_with = "view")]
        raw: bool,

        /// Saved view to run
        #[arg(long)]
        view: Option<String>,

        /// View calculation: count, sum or stats
        #[arg(long, requires = "view")]
        calculation: Option<String>,

        /// Group view calculation by this column
        #[arg(long, requires = "view")]
        group: Option<String>,

        /// Numeric column for sum / stats
        #[arg(long, requires = "view")]
        field: Option<String>,
    },

    /// List the paths a search on a table may filter and sort on
    Fields {
        #[command(flatten)]
        source: SourceArgs,

        /// Table id
        #[arg(long)]
        table: String,

        /// Requested output columns (comma separated); all visible if omitted
        #[arg(long, value_delimiter = ',')]
        fields: Option<Vec<String>>,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

//! rowsearch CLI entry point
//!
//! Parses arguments, runs one command and exits non-zero on failure. All
//! logic lives in the CLI module.

use rowsearch::cli;

fn main() {
    if let Err(e) = cli::run() {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

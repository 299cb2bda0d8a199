//! CLI-specific error types

use std::fmt;
use std::io;

use crate::core::SearchError;

/// CLI error codes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliErrorCode {
    /// Configuration, table or row files unusable
    ConfigError,
    /// I/O error (stdin/stdout)
    IoError,
    /// Request could not be parsed
    BadInput,
    /// The operation itself failed; carries the search error code
    Search(&'static str),
}

impl CliErrorCode {
    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigError => "CLI_CONFIG_ERROR",
            Self::IoError => "CLI_IO_ERROR",
            Self::BadInput => "CLI_BAD_INPUT",
            Self::Search(code) => code,
        }
    }
}

/// CLI error
#[derive(Debug)]
pub struct CliError {
    code: CliErrorCode,
    message: String,
}

impl CliError {
    /// Create a new CLI error
    pub fn new(code: CliErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Config error
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::ConfigError, msg)
    }

    /// I/O error
    pub fn io_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::IoError, msg)
    }

    /// Unparseable request
    pub fn bad_input(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::BadInput, msg)
    }

    /// Get the error code
    pub fn code(&self) -> &CliErrorCode {
        &self.code
    }

    /// Get the error code string
    pub fn code_str(&self) -> &'static str {
        self.code.code()
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for CliError {}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        Self::io_error(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::bad_input(format!("JSON error: {}", e))
    }
}

impl From<SearchError> for CliError {
    fn from(e: SearchError) -> Self {
        match e {
            SearchError::Config(msg) => Self::config_error(msg),
            other => Self::new(CliErrorCode::Search(other.code()), other.to_string()),
        }
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;

//! Error types for ycprov
//!
//! Defines structured error types using thiserror, with cargo-style diagnostics
//! and suggestions for the most common failures.

use colored::Colorize;
use thiserror::Error;
use ycprov_core::{ConfigError, CoreError};

/// Cargo-style diagnostic formatter for CLI errors.
///
/// Produces structured output like:
/// ```text
/// error: No IAM token configured
///
///   tip: export a token: export IAM_TOKEN=$(yc iam create-token)
/// ```
pub struct CliDiagnostic {
    message: String,
    detail: Option<String>,
    tips: Vec<String>,
}

impl CliDiagnostic {
    /// Start a new error diagnostic with the given message.
    pub fn error(message: &str) -> Self {
        Self {
            message: message.to_string(),
            detail: None,
            tips: Vec::new(),
        }
    }

    /// Add a detail line below the error message.
    pub fn detail(mut self, text: &str) -> Self {
        self.detail = Some(text.to_string());
        self
    }

    pub fn tip(mut self, description: &str) -> Self {
        self.tips.push(description.to_string());
        self
    }

    /// Print the diagnostic to stderr with colored formatting.
    pub fn print(&self) {
        eprint!("{}{}", "error".red().bold(), ": ".bold());
        eprintln!("{}", self.message);

        if let Some(detail) = &self.detail {
            eprintln!("  {}", detail);
        }

        for description in &self.tips {
            eprintln!();
            eprint!("  {}{}", "tip".yellow().bold(), ": ".bold());
            eprintln!("{}", description);
        }
    }
}

/// Main error type for the ycprov application
#[derive(Error, Debug)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("No IAM token configured")]
    MissingToken,

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("API error: {message}")]
    ApiError { message: String },

    #[error("Connection error: {message}")]
    ConnectionError { message: String },

    #[error("Operation failed: {message}")]
    OperationFailed { message: String, detail: Option<String> },

    #[error("Timeout: {message}")]
    Timeout { message: String },

    #[error("File error for '{path}': {message}")]
    FileError { path: String, message: String },
}

/// Result type for ycprov commands
pub type CliResult<T> = std::result::Result<T, CliError>;

impl CliError {
    pub fn invalid(message: impl Into<String>) -> Self {
        CliError::InvalidInput {
            message: message.into(),
        }
    }

    pub fn file(path: &std::path::Path, err: impl std::fmt::Display) -> Self {
        CliError::FileError {
            path: path.display().to_string(),
            message: err.to_string(),
        }
    }

    /// Get helpful suggestions for resolving this error
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            CliError::MissingToken => vec![
                "Export a token: export IAM_TOKEN=$(yc iam create-token)".to_string(),
                "Or set 'iam_token' in the config file".to_string(),
            ],
            CliError::ApiError { message } if message.contains("401") => vec![
                "IAM tokens expire after 12 hours; request a new one".to_string(),
            ],
            CliError::ApiError { message } if message.contains("403") => vec![
                "Check that the token's account has the required roles".to_string(),
            ],
            CliError::ApiError { message } if message.contains("404") => vec![
                "Verify the resource ID is correct".to_string(),
            ],
            CliError::ConnectionError { .. } => vec![
                "Check network connectivity".to_string(),
                "Verify the endpoint URLs in the [endpoints] config section".to_string(),
            ],
            CliError::Timeout { .. } => vec![
                "The operation may still finish; check it with: ycprov operation get <id>"
                    .to_string(),
                "Raise the deadline with --timeout".to_string(),
            ],
            CliError::InvalidInput { .. } => vec![
                "Check the command syntax: ycprov <command> --help".to_string(),
            ],
            CliError::FileError { path, .. } => vec![
                format!("Check that the path is writable: {}", path),
            ],
            _ => vec![],
        }
    }

    /// Print a cargo-style diagnostic to stderr using colored formatting.
    pub fn print_diagnostic(&self) {
        let mut diag = CliDiagnostic::error(&self.to_string());

        if let CliError::OperationFailed {
            detail: Some(detail),
            ..
        } = self
        {
            diag = diag.detail(detail);
        }

        for suggestion in self.suggestions() {
            diag = diag.tip(&suggestion);
        }

        diag.print();
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::MissingToken { .. } => CliError::MissingToken,
            other => CliError::Configuration(other.to_string()),
        }
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::TimedOut { .. } => CliError::Timeout {
                message: err.to_string(),
            },
            CoreError::OperationFailed { ref details, .. } => {
                let detail = (!details.is_empty())
                    .then(|| serde_json::Value::Array(details.clone()).to_string());
                CliError::OperationFailed {
                    message: err.to_string(),
                    detail,
                }
            }
            CoreError::Transport { .. } => CliError::ConnectionError {
                message: err.to_string(),
            },
            CoreError::Request { ref source, .. } if source.status.is_none() => {
                CliError::ConnectionError {
                    message: err.to_string(),
                }
            }
            CoreError::Validation(message) => CliError::InvalidInput { message },
            CoreError::Config(message) => CliError::Configuration(message),
            other => CliError::ApiError {
                message: other.to_string(),
            },
        }
    }
}

impl From<csv::Error> for CliError {
    fn from(err: csv::Error) -> Self {
        CliError::FileError {
            path: "<csv output>".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        CliError::ApiError {
            message: format!("JSON error: {}", err),
        }
    }
}

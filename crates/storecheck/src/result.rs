//! Result and error types for Storecheck.

use thiserror::Error;

/// Result type for Storecheck operations
pub type CheckResult<T> = Result<T, CheckError>;

/// Errors that can occur while driving or asserting against the storefront
#[derive(Debug, Error)]
pub enum CheckError {
    /// A locate step matched nothing within its wait budget
    #[error("Element not found: {selector} (waited {timeout_ms}ms)")]
    ElementNotFound {
        /// Canonical selector text
        selector: String,
        /// Wait budget that elapsed
        timeout_ms: u64,
    },

    /// Expected and actual values disagree
    #[error("Assertion failed: {message}")]
    AssertionFailed {
        /// Description of the mismatch
        message: String,
    },

    /// Navigation was asked for a section it does not know
    #[error("Unknown section: {section}")]
    UnknownSection {
        /// Section name as given by the caller
        section: String,
    },

    /// No command with this name is registered
    #[error("Unknown command: {name}")]
    UnknownCommand {
        /// Command name
        name: String,
    },

    /// Network failure or a body that could not be decoded
    #[error("Transport error: {message}")]
    Transport {
        /// Error message
        message: String,
        /// HTTP status, when a response arrived
        status: Option<u16>,
    },

    /// A suspension point ran out of time
    #[error("Timed out after {ms}ms waiting for {what}")]
    TimeoutExceeded {
        /// What was being waited for
        what: String,
        /// Budget in milliseconds
        ms: u64,
    },

    /// Browser backend failure
    #[error("Driver error: {message}")]
    Driver {
        /// Error message
        message: String,
    },

    /// Invalid configuration
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// Missing or invalid fixture or task
    #[error("Fixture error: {message}")]
    Fixture {
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CheckError {
    /// Build an [`CheckError::AssertionFailed`] from anything printable
    pub fn assertion(message: impl Into<String>) -> Self {
        Self::AssertionFailed {
            message: message.into(),
        }
    }

    /// Build a [`CheckError::Transport`] without a status
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            status: None,
        }
    }

    /// Build a [`CheckError::Driver`]
    pub fn driver(message: impl Into<String>) -> Self {
        Self::Driver {
            message: message.into(),
        }
    }

    /// Programmer errors are never worth retrying
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        !matches!(
            self,
            Self::UnknownSection { .. } | Self::UnknownCommand { .. } | Self::Config { .. }
        )
    }
}

/*!
 * Error types for the postrelay application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 *
 * None of the chunking engine's own failure modes are fatal: a `SplitRejection`
 * only ever selects the heuristic fallback, it is never returned to callers of
 * the assembler.
 */

use thiserror::Error;

/// Errors that can occur when working with provider APIs
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Error with authentication
    #[error("Authentication error: {0}")]
    AuthenticationError(String),
}

impl ProviderError {
    /// Map a reqwest transport error onto the provider taxonomy
    pub fn from_transport(error: reqwest::Error) -> Self {
        if error.is_timeout() || error.is_connect() {
            Self::ConnectionError(error.to_string())
        } else {
            Self::RequestFailed(error.to_string())
        }
    }

    /// Map a non-success HTTP status onto the provider taxonomy
    pub fn from_status(status_code: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status_code {
            401 | 403 => Self::AuthenticationError(message),
            _ => Self::ApiError { status_code, message },
        }
    }
}

/// Reasons a boundary selector declined to produce segments.
///
/// Every variant leads to the heuristic splitter being used instead.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SplitRejection {
    /// No assistant credential or service configured
    #[error("boundary selector unavailable: {0}")]
    Unavailable(String),

    /// The assistant call itself failed
    #[error("assistant call failed: {0}")]
    CallFailed(String),

    /// The reply was not a JSON array of strings
    #[error("response is not a JSON array of strings: {0}")]
    NotStringArray(String),

    /// Joining the segments did not reproduce the input
    #[error("concatenated segments differ from input ({actual} chars vs {expected} chars)")]
    ReconstructionMismatch {
        /// Length of the input text
        expected: usize,
        /// Length of the joined segments
        actual: usize,
    },

    /// A segment is longer than the requested limit
    #[error("segment {index} has {len} chars, limit is {limit}")]
    SegmentTooLong {
        /// Position of the offending segment
        index: usize,
        /// Its length in chars
        len: usize,
        /// The limit it had to respect
        limit: usize,
    },
}

/// Errors raised by the relay collaborators around the chunking engine
#[derive(Error, Debug)]
pub enum RelayError {
    /// Invalid or incomplete configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Error from a provider
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Fetching or parsing source posts failed
    #[error("Source error: {0}")]
    Source(String),

    /// Reading or writing the sent-history file failed
    #[error("History error: {0}")]
    History(String),

    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),
}

impl From<std::io::Error> for RelayError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}

impl From<serde_json::Error> for RelayError {
    fn from(error: serde_json::Error) -> Self {
        Self::History(error.to_string())
    }
}

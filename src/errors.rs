/*!
 * Error types for the aisylum library.
 *
 * The error types follow the two tiers an AI operation goes through:
 * - `LocalError`: anything that goes wrong on-device. Never returned to callers
 *   of the dispatcher, it only decides whether the remote path is taken.
 * - `ProviderError`: failures of the remote proxy. Terminal for an operation.
 *
 * `AiError` is the single type every dispatcher operation returns.
 */

use thiserror::Error;

use crate::capability::{AvailabilityState, Capability};

/// Errors that can occur when talking to the remote proxy or the local model daemon
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
}

impl From<reqwest::Error> for ProviderError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_connect() || error.is_timeout() {
            Self::ConnectionError(error.to_string())
        } else if error.is_decode() {
            Self::ParseError(error.to_string())
        } else {
            Self::RequestFailed(error.to_string())
        }
    }
}

/// Errors raised by on-device capabilities
#[derive(Error, Debug)]
pub enum LocalError {
    /// The capability is missing or not ready
    #[error("{capability} is not available on this device ({state})")]
    Unavailable {
        /// Capability that was requested
        capability: Capability,
        /// State reported by the probe
        state: AvailabilityState,
    },

    /// The device refused to create a session (quota, permission, model missing)
    #[error("Failed to create {capability} session: {reason}")]
    SessionCreation {
        /// Capability whose factory failed
        capability: Capability,
        /// Reason reported by the device
        reason: String,
    },

    /// A live session failed to run an operation
    #[error("{capability} operation failed: {reason}")]
    Operation {
        /// Capability whose session failed
        capability: Capability,
        /// Reason reported by the session
        reason: String,
    },

    /// The session was already destroyed
    #[error("{0} session has been destroyed")]
    Destroyed(Capability),
}

impl LocalError {
    pub fn session_creation(capability: Capability, reason: impl ToString) -> Self {
        Self::SessionCreation {
            capability,
            reason: reason.to_string(),
        }
    }

    pub fn operation(capability: Capability, reason: impl ToString) -> Self {
        Self::Operation {
            capability,
            reason: reason.to_string(),
        }
    }
}

/// Errors raised when a model response does not contain the expected JSON
#[derive(Error, Debug)]
pub enum StructuredOutputError {
    /// No balanced JSON object or array was found in the text
    #[error("No JSON object or array found in model output")]
    NotFound,

    /// JSON was found but does not match the expected shape
    #[error("Model output is not valid JSON for the expected shape: {0}")]
    Invalid(#[from] serde_json::Error),
}

/// Error returned by every dispatcher operation
///
/// Whether the on-device or remote path served the request is invisible here:
/// local failures are absorbed by the fallback, only the remote tier and
/// structured-output parsing can fail an operation.
#[derive(Error, Debug)]
pub enum AiError {
    /// The remote proxy failed and there is no further tier
    #[error("Remote request failed: {0}")]
    Remote(#[from] ProviderError),

    /// The model response could not be parsed into the expected structure
    #[error("Malformed structured output: {0}")]
    MalformedOutput(#[from] StructuredOutputError),

    /// A streaming response broke off after it had started
    #[error("Response stream interrupted: {0}")]
    StreamInterrupted(String),
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Configuration is invalid
    #[error("Configuration error: {0}")]
    Config(String),

    /// Error from an AI operation
    #[error("AI error: {0}")]
    Ai(#[from] AiError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}

impl From<ProviderError> for AppError {
    fn from(error: ProviderError) -> Self {
        Self::Ai(AiError::Remote(error))
    }
}

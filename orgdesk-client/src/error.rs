//! Entity client error types.

use orgdesk_types::{MutationFailure, MutationResult};
use thiserror::Error;

/// Result type for entity client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Fallback message when neither the server nor the transport said anything.
pub const GENERIC_ERROR_MESSAGE: &str = "Something went wrong";

/// Errors that can occur between a screen and the REST backend.
///
/// These never escape the public client operations: each is converted into
/// a failed [`MutationResult`] carrying [`ClientError::status`].
#[derive(Debug, Error)]
pub enum ClientError {
    /// No response was received (connection refused, DNS, timeout, ...).
    #[error("network error: {0}")]
    Transport(String),

    /// The server answered with a non-2xx status.
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// The response body did not have the expected shape.
    #[error("unexpected response shape: {0}")]
    Shape(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A tenant-scoped entity was called without an organization.
    #[error("{entity} requests must be scoped to an organization")]
    MissingScope { entity: String },

    /// A payload or call lacked the row id the route needs.
    #[error("{entity} request is missing its `{field}` id")]
    MissingId { entity: String, field: String },

    #[error("invalid query: {0}")]
    InvalidQuery(#[from] orgdesk_types::Error),

    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl ClientError {
    /// HTTP status reported for this error.
    pub fn status(&self) -> u16 {
        match self {
            ClientError::Http { status, .. } => *status,
            ClientError::MissingScope { .. }
            | ClientError::MissingId { .. }
            | ClientError::InvalidQuery(_) => 400,
            ClientError::Transport(_)
            | ClientError::Shape(_)
            | ClientError::Serialization(_)
            | ClientError::Client(_)
            | ClientError::Config(_) => 500,
        }
    }

    /// Message shown to the user: the server's message for HTTP errors, the
    /// transport's message for network errors.
    pub fn user_message(&self) -> String {
        let message = match self {
            ClientError::Http { message, .. } => message.clone(),
            ClientError::Transport(message) => message.clone(),
            other => other.to_string(),
        };
        if message.trim().is_empty() {
            GENERIC_ERROR_MESSAGE.to_string()
        } else {
            message
        }
    }

    /// Returns true if the request never reached the server.
    pub fn is_transport(&self) -> bool {
        matches!(self, ClientError::Transport(_))
    }

    /// Converts the error into a failed mutation result without data.
    pub fn into_mutation<T>(self) -> MutationResult<T> {
        MutationResult::failure(self.status(), self.user_message())
    }
}

impl From<ClientError> for MutationFailure {
    fn from(err: ClientError) -> Self {
        MutationFailure {
            status: err.status(),
            message: err.user_message(),
        }
    }
}

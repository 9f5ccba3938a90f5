//! Error types for the wiki client

use fe_slots_core::document::DocumentError;
use thiserror::Error;

/// Errors that can occur when talking to the wiki
#[derive(Debug, Error)]
pub enum WikiError {
    /// A configured endpoint is not a usable URL
    #[error("Invalid URL {url}: {reason}")]
    InvalidUrl {
        /// The offending URL text
        url: String,
        /// Why it was rejected
        reason: String,
    },

    /// HTTP request failed
    #[error("Request failed: {0}")]
    RequestFailed(String),

    /// Response parsing failed
    #[error("Response parsing failed: {0}")]
    ResponseParseFailed(String),

    /// Wiki returned a non-success status on a read
    #[error("API error (status {status}) from {url}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// The requested URL
        url: String,
    },

    /// The edit page has no page-edit form
    #[error("Edit form not found on {0}")]
    EditFormMissing(String),

    /// The page-edit form has no usable action
    #[error("Edit form action missing or unresolvable: {0}")]
    FormActionMissing(String),
}

impl From<WikiError> for DocumentError {
    fn from(error: WikiError) -> Self {
        match error {
            WikiError::RequestFailed(message) => Self::Transport(message),
            WikiError::ApiError { status, url } => Self::Status { status, url },
            WikiError::ResponseParseFailed(message) => Self::Malformed(message),
            error @ (WikiError::InvalidUrl { .. }
            | WikiError::EditFormMissing(_)
            | WikiError::FormActionMissing(_)) => Self::EditForm(error.to_string()),
        }
    }
}

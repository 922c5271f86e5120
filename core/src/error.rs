//! Error types for the users directory.
//!
//! # Design
//! Every remote failure is normalized into `ApiError`. `Status` and
//! `Connection` are both transport failures and are surfaced identically;
//! the error body is kept only for logs. `ValidationError` never reaches the
//! network. `DirectoryError` is what the session driver hands back.

use std::fmt;

use thiserror::Error;

use crate::types::UserId;

/// Failure of a single remote call.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// The server answered with a status outside `2xx`.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The request never produced a response.
    #[error("connection failed: {0}")]
    Connection(String),

    /// The response body was not the expected JSON shape.
    #[error("malformed response: {0}")]
    Decode(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Encode(String),
}

impl ApiError {
    /// `true` for failures of the round-trip itself rather than of its payload.
    pub fn is_transport(&self) -> bool {
        matches!(self, ApiError::Status { .. } | ApiError::Connection(_))
    }
}

/// Form field checked by the validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Name,
    Email,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Name => f.write_str("name"),
            Field::Email => f.write_str("email"),
        }
    }
}

/// Rejected form input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {field}: {reason}")]
pub struct ValidationError {
    pub field: Field,
    pub reason: &'static str,
}

/// Errors returned by `Directory` operations.
#[derive(Debug, Clone, Error)]
pub enum DirectoryError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Remote(#[from] ApiError),

    /// An edit was requested for an id the collection does not hold.
    #[error("no user with id {0}")]
    UnknownUser(UserId),

    /// `submit_edit` was called while no edit was open.
    #[error("no edit in progress")]
    NotEditing,
}

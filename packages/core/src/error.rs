//! Error taxonomy for the 7gogo client.
//!
//! Every fallible operation in this crate returns [`Result`]. The variants
//! separate failures by who misbehaved:
//!
//! | Variant | Meaning |
//! |---------|---------|
//! | [`Error::Http`] | the request never produced a status (DNS, TLS, socket) |
//! | [`Error::Transport`] | non-2xx status with no recognisable error body |
//! | [`Error::Api`] | non-2xx status with a structured error (see [`ApiError`]) |
//! | [`Error::MalformedResponse`] | 2xx status but the body is unusable |
//! | [`Error::Resolution`] | a public page did not carry a `talkId` |
//! | [`Error::Validation`] | a caller-supplied record lacks a required field |
//!
//! No variant is ever retried automatically.

use thiserror::Error;

pub use crate::api_error::ApiError;

/// Errors returned by the client.
#[derive(Debug, Error)]
pub enum Error {
    /// The HTTP request or response failed at the network level.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server returned a non-2xx status whose body could not be read as
    /// a structured error.
    #[error("server returned status {status}")]
    Transport { status: u16, body: String },

    /// The server returned a structured error.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The server claimed success but the body was not a usable `data`
    /// envelope.
    #[error("malformed response (status {status}): {reason}")]
    MalformedResponse { status: u16, reason: String },

    /// A public page could not be resolved to a `talkId`.
    #[error("could not resolve talkId: {0}")]
    Resolution(String),

    /// A caller-supplied record is missing a required field.
    #[error("invalid record: {0}")]
    Validation(String),
}

impl Error {
    /// The HTTP status carried by this error, when one was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Http(e) => e.status().map(|s| s.as_u16()),
            Error::Transport { status, .. } | Error::MalformedResponse { status, .. } => {
                Some(*status)
            }
            Error::Api(e) => Some(e.status),
            Error::Resolution(_) | Error::Validation(_) => None,
        }
    }

    pub(crate) fn malformed(status: u16, reason: impl Into<String>) -> Self {
        Error::MalformedResponse {
            status,
            reason: reason.into(),
        }
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

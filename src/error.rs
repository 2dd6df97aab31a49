//! Error types for the Machine Box client.
//!
//! Every remote box speaks the same `{success, error}` response convention, so
//! every failure a client can observe falls into a small taxonomy: the call
//! never completed, the server answered with an HTTP failure and no usable
//! body, the body could not be decoded, or the box itself reported
//! `success: false`. `BoxError` names each of these cases.
//!
//! Errors that relate to a particular box are displayed with the box name as a
//! prefix (`facebox: something went wrong`) so that callers talking to several
//! boxes at once can attribute a failure without extra context.

use std::time::Duration;
use thiserror::Error;

/// Represents all possible errors that can occur while talking to a box.
#[derive(Error, Debug)]
pub enum BoxError {
    /// The configured box address cannot be used to build request URLs.
    ///
    /// This error occurs when the address:
    /// - is relative (`localhost:8080` without a scheme)
    /// - is not hierarchical (`mailto:` style addresses)
    /// - is not a valid URL at all
    #[error("{box_name}: box address must be absolute: {address}")]
    InvalidAddress { box_name: String, address: String },

    /// A required argument was empty or otherwise unusable.
    ///
    /// Raised locally before any request is made.
    #[error("{box_name}: {message}")]
    InvalidArgument { box_name: String, message: String },

    /// The HTTP call could not complete.
    ///
    /// This covers DNS failures, refused connections, timeouts, TLS errors and
    /// failures while reading the response body. Never retried.
    #[error("{box_name}: {source}")]
    Transport {
        box_name: String,
        #[source]
        source: reqwest::Error,
    },

    /// The request could not be assembled locally (bad header value, bad
    /// multipart MIME type, unusable client options). Nothing was sent.
    #[error("{box_name}: build request: {source}")]
    Request {
        box_name: String,
        #[source]
        source: reqwest::Error,
    },

    /// The box answered with a non-success HTTP status and an empty body.
    #[error("{box_name}: {status}")]
    Status {
        box_name: String,
        status: reqwest::StatusCode,
    },

    /// The box answered with a non-success HTTP status and a body that is not
    /// the JSON envelope (plain text or HTML error pages).
    #[error("{box_name}: {status}: {body}")]
    Http {
        box_name: String,
        status: u16,
        body: String,
    },

    /// The response body could not be decoded.
    ///
    /// `context` tells which pass failed: the envelope pass
    /// (`decode common response data`) or the payload pass
    /// (`decode response data`).
    #[error("{box_name}: {context}: {source}")]
    Decode {
        box_name: String,
        context: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// A JSON request body could not be encoded.
    #[error("{box_name}: encode request body: {source}")]
    Encode {
        box_name: String,
        #[source]
        source: serde_json::Error,
    },

    /// The box returned a well-formed envelope with `success: false`.
    #[error("{box_name}: {message}")]
    Service { box_name: String, message: String },

    /// A downloaded body could not be written to the caller's writer.
    #[error("{box_name}: write download: {source}")]
    Write {
        box_name: String,
        #[source]
        source: std::io::Error,
    },

    /// A local file used as request input could not be read.
    #[error("read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Waiting for a box was cancelled before it reported ready.
    #[error("wait for ready: cancelled")]
    Cancelled,

    /// Waiting for a box hit its deadline before it reported ready.
    #[error("wait for ready: deadline exceeded after {0:?}")]
    DeadlineExceeded(Duration),
}

impl BoxError {
    /// Name of the box the error relates to, if any.
    pub fn box_name(&self) -> Option<&str> {
        match self {
            BoxError::InvalidAddress { box_name, .. }
            | BoxError::InvalidArgument { box_name, .. }
            | BoxError::Transport { box_name, .. }
            | BoxError::Request { box_name, .. }
            | BoxError::Status { box_name, .. }
            | BoxError::Http { box_name, .. }
            | BoxError::Decode { box_name, .. }
            | BoxError::Encode { box_name, .. }
            | BoxError::Service { box_name, .. }
            | BoxError::Write { box_name, .. } => Some(box_name),
            BoxError::Io { .. } | BoxError::Cancelled | BoxError::DeadlineExceeded(_) => None,
        }
    }

    /// HTTP status code carried by the error, if the server answered at all.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            BoxError::Status { status, .. } => Some(status.as_u16()),
            BoxError::Http { status, .. } => Some(*status),
            BoxError::Transport { source, .. } => source.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Whether the box itself reported the failure through the envelope.
    pub fn is_service(&self) -> bool {
        matches!(self, BoxError::Service { .. })
    }

    /// Whether the failure happened before a response was received.
    pub fn is_transport(&self) -> bool {
        matches!(self, BoxError::Transport { .. })
    }

    pub(crate) fn invalid_argument(box_name: &str, message: impl Into<String>) -> Self {
        BoxError::InvalidArgument {
            box_name: box_name.to_string(),
            message: message.into(),
        }
    }

    pub(crate) fn request(box_name: &str, source: reqwest::Error) -> Self {
        BoxError::Request {
            box_name: box_name.to_string(),
            source,
        }
    }

    pub(crate) fn transport(box_name: &str, source: reqwest::Error) -> Self {
        BoxError::Transport {
            box_name: box_name.to_string(),
            source,
        }
    }
}

// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use crate::types::{ETag, Href};

/// DAV client errors.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum DavError {
    /// The server could not be reached, or the connection broke mid-request.
    #[error("Connection error: {0}")]
    Connection(String),

    /// The server answered with an unexpected HTTP status.
    #[error("HTTP error: {0}")]
    Http(String),

    /// Authentication or authorization was refused.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Resource not found.
    #[error("Resource not found: {0}")]
    NotFound(Href),

    /// Precondition failed (`ETag` mismatch, or resource already exists on create).
    #[error("Precondition failed for {href}")]
    PreconditionFailed {
        /// The resource the conditional request targeted.
        href: Href,
        /// The current tag, when the server reported one.
        current: Option<ETag>,
    },

    /// Invalid response from server.
    #[error("Invalid server response: {0}")]
    InvalidResponse(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<reqwest::Error> for DavError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_connect() || e.is_timeout() {
            Self::Connection(e.to_string())
        } else {
            Self::Http(e.to_string())
        }
    }
}

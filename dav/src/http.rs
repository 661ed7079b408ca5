// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Authenticated request building and status mapping.

use std::time::Duration;

use reqwest::header::{ETAG, IF_MATCH, IF_NONE_MATCH};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};

use crate::config::{AuthMethod, DavConfig};
use crate::error::DavError;
use crate::types::{ETag, Href};

/// Pooled HTTP client that signs every request with the configured
/// credentials.
#[derive(Debug)]
pub struct HttpClient {
    client: Client,
    auth: AuthMethod,
}

impl HttpClient {
    /// Creates a new HTTP client.
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS backend cannot be initialized.
    pub fn new(config: &DavConfig) -> Result<Self, DavError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| DavError::Config(e.to_string()))?;

        Ok(Self {
            client,
            auth: config.auth.clone(),
        })
    }

    /// Starts a request carrying the credentials.
    pub fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let req = self.client.request(method, url);
        match &self.auth {
            AuthMethod::Basic { username, password } => req.basic_auth(username, Some(password)),
            AuthMethod::Bearer { token } => req.bearer_auth(token),
            AuthMethod::None => req,
        }
    }

    /// Sends a request and turns non-success statuses into errors.
    ///
    /// `404`/`410` become [`DavError::NotFound`] and `412` becomes
    /// [`DavError::PreconditionFailed`], so callers can treat them as
    /// protocol outcomes.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the status is not a success.
    pub async fn send(&self, href: &Href, req: RequestBuilder) -> Result<Response, DavError> {
        let resp = req.send().await?;
        let status = resp.status();
        tracing::debug!(%href, %status, "DAV response");

        if status.is_success() {
            return Ok(resp);
        }

        Err(match status {
            StatusCode::NOT_FOUND | StatusCode::GONE => DavError::NotFound(href.clone()),
            StatusCode::PRECONDITION_FAILED => DavError::PreconditionFailed {
                href: href.clone(),
                current: etag_of(&resp),
            },
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                DavError::Auth(format!("{status} for {href}"))
            }
            _ => {
                let text = resp.text().await.unwrap_or_default();
                DavError::Http(format!("{status} for {href}: {}", text.trim()))
            }
        })
    }
}

/// Guards a write or delete on the resource still being at `etag`.
pub fn if_match(req: RequestBuilder, etag: &ETag) -> RequestBuilder {
    req.header(IF_MATCH, etag.to_header_value())
}

/// Guards a write on nothing being stored yet.
pub fn if_none_match_any(req: RequestBuilder) -> RequestBuilder {
    req.header(IF_NONE_MATCH, "*")
}

/// The `ETag` header of a response, if any.
pub fn etag_of(resp: &Response) -> Option<ETag> {
    resp.headers()
        .get(ETAG)
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.trim().is_empty())
        .map(ETag::from)
}

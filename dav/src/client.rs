// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! DAV client for single-resource operations.

use std::sync::Arc;

use reqwest::Method;
use reqwest::header::CONTENT_TYPE;

use crate::config::DavConfig;
use crate::error::DavError;
use crate::http::{self, HttpClient};
use crate::types::{CollectionKind, DavResource, ETag, Href};

/// Precondition attached to a write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Precondition {
    /// Unconditional write.
    None,
    /// Only write if the current representation carries this tag.
    IfMatch(ETag),
    /// Only write if no representation exists yet.
    IfNoneMatch,
}

/// DAV client for reading and conditionally writing contacts and events.
///
/// One instance is built when the gateway starts and shared (it is cheap to
/// clone) by every request; the underlying connection pool is released when
/// the last clone is dropped.
///
/// # Example
///
/// ```ignore
/// use davgate_dav::{AuthMethod, CollectionKind, DavClient, DavConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = DavConfig {
///     base_url: "https://cloud.example.com".to_string(),
///     calendar_home: "/remote.php/dav/calendars/alice/".to_string(),
///     auth: AuthMethod::Basic {
///         username: "alice".to_string(),
///         password: "secret".to_string(),
///     },
///     ..Default::default()
/// };
///
/// let client = DavClient::new(config)?;
/// let href = client.resource_href(CollectionKind::Calendar, None, "event-1");
/// let resource = client.get(&href).await?;
/// println!("{} is at version {}", resource.href, resource.etag);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct DavClient {
    http: Arc<HttpClient>,
    config: DavConfig,
}

impl DavClient {
    /// Creates a new DAV client.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is missing or HTTP client initialization fails.
    pub fn new(config: DavConfig) -> Result<Self, DavError> {
        if config.base_url.trim().is_empty() {
            return Err(DavError::Config("base_url must not be empty".to_string()));
        }

        let http = HttpClient::new(&config)?;
        Ok(Self {
            http: Arc::new(http),
            config,
        })
    }

    /// Returns the configuration this client was built with.
    #[must_use]
    pub fn config(&self) -> &DavConfig {
        &self.config
    }

    /// Builds the href of a resource from its UID.
    ///
    /// Resources are stored as `<home>/<collection>/<uid>.<ext>`; when
    /// `collection` is `None` the configured default collection is used.
    /// The uid is inserted as is, so callers must keep it free of `/`, `?`,
    /// `#`, `%` and whitespace.
    #[must_use]
    pub fn resource_href(&self, kind: CollectionKind, collection: Option<&str>, uid: &str) -> Href {
        let (home, default_collection) = self.config.collection(kind);
        let collection = collection.unwrap_or(default_collection);
        let home = home.trim_end_matches('/');
        let collection = collection.trim_matches('/');
        Href::new(format!("{home}/{collection}/{uid}.{}", kind.extension()))
    }

    /// Gets a single resource by href.
    ///
    /// # Errors
    ///
    /// Returns [`DavError::NotFound`] if the resource doesn't exist, or an
    /// error if the request fails or the server omits the `ETag`.
    pub async fn get(&self, href: &Href) -> Result<DavResource, DavError> {
        let url = self.full_url(href.as_str());
        let req = self.http.request(Method::GET, &url);
        let resp = self.http.send(href, req).await?;

        let etag = http::etag_of(&resp)
            .ok_or_else(|| DavError::InvalidResponse(format!("Missing ETag header for {href}")))?;
        let data = resp.text().await?;

        Ok(DavResource::new(href.clone(), etag, data))
    }

    /// Writes a resource body with the given precondition.
    ///
    /// Returns the new `ETag` when the server reports one; servers are
    /// allowed to omit it when they transformed the body on write.
    ///
    /// # Errors
    ///
    /// Returns [`DavError::PreconditionFailed`] when the precondition no longer
    /// holds, [`DavError::NotFound`] when the collection is missing, or an
    /// error if the request fails.
    pub async fn put(
        &self,
        href: &Href,
        kind: CollectionKind,
        body: String,
        precondition: &Precondition,
    ) -> Result<Option<ETag>, DavError> {
        let url = self.full_url(href.as_str());
        let req = self
            .http
            .request(Method::PUT, &url)
            .header(CONTENT_TYPE, kind.content_type())
            .body(body);

        let req = match precondition {
            Precondition::None => req,
            Precondition::IfMatch(etag) => http::if_match(req, etag),
            Precondition::IfNoneMatch => http::if_none_match_any(req),
        };

        let resp = self.http.send(href, req).await?;
        Ok(http::etag_of(&resp))
    }

    /// Deletes a resource, optionally guarded by its current tag.
    ///
    /// # Errors
    ///
    /// Returns [`DavError::NotFound`] if nothing is stored at `href`,
    /// [`DavError::PreconditionFailed`] if the tag no longer matches, or an
    /// error if the request fails.
    pub async fn delete(&self, href: &Href, if_match: Option<&ETag>) -> Result<(), DavError> {
        let url = self.full_url(href.as_str());
        let req = self.http.request(Method::DELETE, &url);
        let req = match if_match {
            Some(etag) => http::if_match(req, etag),
            None => req,
        };

        self.http.send(href, req).await?;
        Ok(())
    }

    /// Builds full URL from href.
    fn full_url(&self, href: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), href)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> DavClient {
        DavClient::new(DavConfig {
            base_url: "https://cloud.example.com/".to_string(),
            addressbook_home: "/remote.php/dav/addressbooks/users/alice/".to_string(),
            calendar_home: "/remote.php/dav/calendars/alice".to_string(),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn builds_resource_href_with_default_collection() {
        let client = client();
        let href = client.resource_href(CollectionKind::AddressBook, None, "c-1");
        assert_eq!(
            href.as_str(),
            "/remote.php/dav/addressbooks/users/alice/contacts/c-1.vcf"
        );

        let href = client.resource_href(CollectionKind::Calendar, Some("work/"), "e-1");
        assert_eq!(href.as_str(), "/remote.php/dav/calendars/alice/work/e-1.ics");
    }

    #[test]
    fn builds_full_url_without_double_slash() {
        let client = client();
        assert_eq!(
            client.full_url("/remote.php/dav/x.ics"),
            "https://cloud.example.com/remote.php/dav/x.ics"
        );
    }

    #[test]
    fn rejects_empty_base_url() {
        let err = DavClient::new(DavConfig::default()).unwrap_err();
        assert!(matches!(err, DavError::Config(_)));
    }
}

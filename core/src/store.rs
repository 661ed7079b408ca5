// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! The seam between the coordinator and the DAV server.

use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;
use davgate_dav::{CollectionKind, DavClient, DavError, DavResource, ETag, Href, Precondition};
use serde::Serialize;

use crate::error::CodecError;

/// A payload stored as one DAV resource, such as a contact or an event.
pub trait Resource: Clone + Debug + Serialize + Send + Sync + 'static {
    /// Collection type the resource lives in.
    const KIND: CollectionKind;

    /// Resource type name used in logs and audit entries.
    const NAME: &'static str;

    /// Stable identifier, also the last path segment of the href.
    fn uid(&self) -> &str;

    /// Replaces the identifier.
    fn set_uid(&mut self, uid: String);

    /// Version tag the payload was read at.
    fn etag(&self) -> Option<&ETag>;

    /// Records the version tag of the payload.
    fn set_etag(&mut self, etag: Option<ETag>);

    /// Records where the resource is stored.
    fn set_href(&mut self, href: &Href);

    /// Serializes to the body sent to the server.
    ///
    /// # Errors
    ///
    /// Returns an error if a field cannot be represented.
    fn to_dav(&self) -> Result<String, CodecError>;

    /// Parses a body read from the server.
    ///
    /// # Errors
    ///
    /// Returns an error if the body is malformed.
    fn from_dav(data: &str) -> Result<Self, CodecError>;
}

/// Result of a conditional write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    /// Stored; carries the new tag when the server reported one.
    Written(Option<ETag>),
    /// The precondition no longer holds.
    PreconditionFailed,
    /// The target collection does not exist.
    NotFound,
}

/// Result of a conditional delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// Removed.
    Deleted,
    /// Nothing was stored at the href.
    NotFound,
    /// The tag no longer matches.
    PreconditionFailed,
}

/// Single-resource access to a DAV server.
///
/// Transport failures are returned as errors; expected protocol outcomes
/// (absent resources, failed preconditions) are values.
#[async_trait]
pub trait ResourceStore: Send + Sync {
    /// Builds the href of a resource.
    fn href(&self, kind: CollectionKind, collection: Option<&str>, uid: &str) -> Href;

    /// Reads a resource and its current tag; `None` when absent.
    async fn fetch(&self, href: &Href) -> Result<Option<DavResource>, DavError>;

    /// Writes a body under a precondition.
    async fn write(
        &self,
        href: &Href,
        kind: CollectionKind,
        body: String,
        precondition: &Precondition,
    ) -> Result<WriteOutcome, DavError>;

    /// Removes a resource, guarded by its tag when given.
    async fn delete(&self, href: &Href, if_match: Option<&ETag>) -> Result<DeleteOutcome, DavError>;
}

#[async_trait]
impl ResourceStore for DavClient {
    fn href(&self, kind: CollectionKind, collection: Option<&str>, uid: &str) -> Href {
        self.resource_href(kind, collection, uid)
    }

    async fn fetch(&self, href: &Href) -> Result<Option<DavResource>, DavError> {
        match self.get(href).await {
            Ok(resource) => Ok(Some(resource)),
            Err(DavError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn write(
        &self,
        href: &Href,
        kind: CollectionKind,
        body: String,
        precondition: &Precondition,
    ) -> Result<WriteOutcome, DavError> {
        match self.put(href, kind, body, precondition).await {
            Ok(etag) => Ok(WriteOutcome::Written(etag)),
            Err(DavError::PreconditionFailed { .. }) => Ok(WriteOutcome::PreconditionFailed),
            Err(DavError::NotFound(_)) => Ok(WriteOutcome::NotFound),
            Err(e) => Err(e),
        }
    }

    async fn delete(&self, href: &Href, if_match: Option<&ETag>) -> Result<DeleteOutcome, DavError> {
        match DavClient::delete(self, href, if_match).await {
            Ok(()) => Ok(DeleteOutcome::Deleted),
            Err(DavError::NotFound(_)) => Ok(DeleteOutcome::NotFound),
            Err(DavError::PreconditionFailed { .. }) => Ok(DeleteOutcome::PreconditionFailed),
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl<S: ResourceStore + ?Sized> ResourceStore for Arc<S> {
    fn href(&self, kind: CollectionKind, collection: Option<&str>, uid: &str) -> Href {
        (**self).href(kind, collection, uid)
    }

    async fn fetch(&self, href: &Href) -> Result<Option<DavResource>, DavError> {
        (**self).fetch(href).await
    }

    async fn write(
        &self,
        href: &Href,
        kind: CollectionKind,
        body: String,
        precondition: &Precondition,
    ) -> Result<WriteOutcome, DavError> {
        (**self).write(href, kind, body, precondition).await
    }

    async fn delete(&self, href: &Href, if_match: Option<&ETag>) -> Result<DeleteOutcome, DavError> {
        (**self).delete(href, if_match).await
    }
}

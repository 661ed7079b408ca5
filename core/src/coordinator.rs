// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! `ETag`-based optimistic concurrency for single-resource writes.
//!
//! Every update and delete reads the authoritative state first, compares the
//! client's version tag against it, and writes with `If-Match` so that a
//! concurrent change on the server is detected even when it lands between
//! the read and the write. Stale writes surface as
//! [`CoordinatorError::Conflict`] carrying the server's current state.

use std::fmt::Debug;

use davgate_dav::{DavError, ETag, Href, Precondition};
use serde::Serialize;
use uuid::Uuid;

use crate::audit::{AuditAction, AuditRecorder};
use crate::error::CodecError;
use crate::store::{DeleteOutcome, Resource, ResourceStore, WriteOutcome};

/// Errors from coordinated reads and writes.
#[derive(Debug, thiserror::Error)]
pub enum CoordinatorError<R: Debug> {
    /// No resource with this uid exists.
    #[error("{kind} {uid} not found")]
    NotFound {
        /// Resource type.
        kind: &'static str,
        /// Requested uid.
        uid: String,
    },

    /// Create was refused because the uid is taken.
    #[error("{kind} {uid} already exists")]
    AlreadyExists {
        /// Resource type.
        kind: &'static str,
        /// Requested uid.
        uid: String,
    },

    /// The client's version is stale.
    #[error("Precondition failed: {kind} {uid} was modified by another client")]
    Conflict {
        /// Resource type.
        kind: &'static str,
        /// Requested uid.
        uid: String,
        /// The authoritative server state, with its current tag.
        current: Box<R>,
    },

    /// The uid cannot name a resource.
    #[error("Invalid {kind} uid: {uid:?}")]
    InvalidUid {
        /// Resource type.
        kind: &'static str,
        /// Rejected uid.
        uid: String,
    },

    /// The target collection does not exist.
    #[error("Collection not found for {0}")]
    CollectionNotFound(Href),

    /// A payload could not be converted.
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// The server could not be reached or answered unexpectedly.
    #[error(transparent)]
    Dav(#[from] DavError),
}

impl<R: Debug + Serialize> CoordinatorError<R> {
    /// The HTTP status a front end should answer with.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::NotFound { .. } | Self::CollectionNotFound(_) => 404,
            Self::AlreadyExists { .. } => 409,
            Self::Conflict { .. } => 412,
            Self::InvalidUid { .. } | Self::Codec(_) => 400,
            Self::Dav(DavError::Auth(_)) => 401,
            Self::Dav(_) => 502,
        }
    }

    /// JSON error body: `{"detail": ...}`, plus `"current"` for conflicts.
    #[must_use]
    pub fn detail(&self) -> serde_json::Value {
        match self {
            Self::Conflict { current, .. } => serde_json::json!({
                "detail": self.to_string(),
                "current": current,
            }),
            _ => serde_json::json!({ "detail": self.to_string() }),
        }
    }
}

/// What a delete call found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeleteResult {
    /// The resource existed and was removed.
    Deleted,
    /// Nothing was stored under the uid.
    NotPresent,
}

/// Reads and writes resources with optimistic locking and audits every
/// mutation attempt.
#[derive(Debug, Clone)]
pub struct Coordinator<S> {
    store: S,
    audit: AuditRecorder,
}

impl<S: ResourceStore> Coordinator<S> {
    /// Creates a coordinator over a store.
    pub fn new(store: S, audit: AuditRecorder) -> Self {
        Self { store, audit }
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The audit recorder.
    pub fn audit(&self) -> &AuditRecorder {
        &self.audit
    }

    /// Reads a resource with its current tag.
    ///
    /// # Errors
    ///
    /// Returns [`CoordinatorError::NotFound`] if absent, or an error if the
    /// server fails or the body is malformed.
    #[tracing::instrument(skip(self), fields(kind = R::NAME))]
    pub async fn get<R: Resource>(
        &self,
        collection: Option<&str>,
        uid: &str,
    ) -> Result<R, CoordinatorError<R>> {
        let href = self.href::<R>(collection, uid)?;
        match self.load::<R>(&href).await? {
            Some((resource, _)) => Ok(resource),
            None => Err(CoordinatorError::NotFound {
                kind: R::NAME,
                uid: uid.to_string(),
            }),
        }
    }

    /// Stores a new resource, refusing to overwrite an existing one.
    ///
    /// A uid is generated when the payload has none.
    ///
    /// # Errors
    ///
    /// Returns [`CoordinatorError::AlreadyExists`] if the uid is taken,
    /// [`CoordinatorError::CollectionNotFound`] if the collection is missing,
    /// or an error if the server fails or the payload cannot be encoded.
    #[tracing::instrument(skip(self, payload), fields(kind = R::NAME))]
    pub async fn create<R: Resource>(
        &self,
        collection: Option<&str>,
        mut payload: R,
    ) -> Result<R, CoordinatorError<R>> {
        if payload.uid().trim().is_empty() {
            payload.set_uid(Uuid::new_v4().to_string());
        }
        let uid = payload.uid().to_string();
        let href = self.href::<R>(collection, &uid)?;

        tracing::debug!(%uid, "writing with If-None-Match");
        let body = payload.to_dav()?;
        match self
            .store
            .write(&href, R::KIND, body, &Precondition::IfNoneMatch)
            .await?
        {
            WriteOutcome::Written(etag) => {
                let etag = self.resolve_new_etag(&href, etag).await;
                payload.set_etag(etag);
                payload.set_href(&href);
                self.audit
                    .record(R::NAME, &uid, AuditAction::Create, None, Some(&payload))
                    .await;
                Ok(payload)
            }
            WriteOutcome::PreconditionFailed => {
                tracing::info!(%uid, "create refused, uid already exists");
                self.audit
                    .record(R::NAME, &uid, AuditAction::Conflict, None, Some(&payload))
                    .await;
                Err(CoordinatorError::AlreadyExists { kind: R::NAME, uid })
            }
            WriteOutcome::NotFound => Err(CoordinatorError::CollectionNotFound(href)),
        }
    }

    /// Replaces a resource if the client's version is still current.
    ///
    /// When the payload carries no tag, the version read at the start of
    /// the call is used as the precondition.
    ///
    /// # Errors
    ///
    /// Returns [`CoordinatorError::Conflict`] with the server state when the
    /// client's tag is stale or the resource changed concurrently,
    /// [`CoordinatorError::NotFound`] if the resource does not exist, or an
    /// error if the server fails or a body cannot be converted.
    #[tracing::instrument(skip(self, payload), fields(kind = R::NAME, uid = payload.uid()))]
    pub async fn update<R: Resource>(
        &self,
        collection: Option<&str>,
        mut payload: R,
    ) -> Result<R, CoordinatorError<R>> {
        let uid = payload.uid().to_string();
        let href = self.href::<R>(collection, &uid)?;

        tracing::debug!("fetching current state");
        let Some((current, server_etag)) = self.load::<R>(&href).await? else {
            return Err(self.missing(&uid, &payload).await);
        };

        if let Some(client_etag) = payload.etag()
            && !client_etag.matches(&server_etag)
        {
            return Err(self.conflict(&uid, current, Some(&payload)).await);
        }

        tracing::debug!(etag = %server_etag, "writing with If-Match");
        let body = payload.to_dav()?;
        let precondition = Precondition::IfMatch(server_etag);
        match self.store.write(&href, R::KIND, body, &precondition).await? {
            WriteOutcome::Written(etag) => {
                let etag = self.resolve_new_etag(&href, etag).await;
                payload.set_etag(etag);
                payload.set_href(&href);
                self.audit
                    .record(R::NAME, &uid, AuditAction::Update, Some(&current), Some(&payload))
                    .await;
                Ok(payload)
            }
            WriteOutcome::PreconditionFailed => {
                tracing::debug!("resource changed during write, re-fetching");
                match self.load::<R>(&href).await? {
                    Some((latest, _)) => Err(self.conflict(&uid, latest, Some(&payload)).await),
                    None => Err(self.missing(&uid, &payload).await),
                }
            }
            WriteOutcome::NotFound => Err(self.missing(&uid, &payload).await),
        }
    }

    /// Removes a resource if the client's version is still current.
    ///
    /// Deleting an absent resource succeeds with
    /// [`DeleteResult::NotPresent`].
    ///
    /// # Errors
    ///
    /// Returns [`CoordinatorError::Conflict`] with the server state when the
    /// client's tag is stale or the resource changed concurrently, or an
    /// error if the server fails or the stored body is malformed.
    #[tracing::instrument(skip(self, client_etag), fields(kind = R::NAME))]
    pub async fn delete<R: Resource>(
        &self,
        collection: Option<&str>,
        uid: &str,
        client_etag: Option<&ETag>,
    ) -> Result<DeleteResult, CoordinatorError<R>> {
        let href = self.href::<R>(collection, uid)?;

        tracing::debug!("fetching current state");
        let Some((current, server_etag)) = self.load::<R>(&href).await? else {
            tracing::debug!("already absent");
            self.audit
                .record::<R>(R::NAME, uid, AuditAction::Delete, None, None)
                .await;
            return Ok(DeleteResult::NotPresent);
        };

        if let Some(client_etag) = client_etag
            && !client_etag.matches(&server_etag)
        {
            return Err(self.conflict(uid, current, None).await);
        }

        tracing::debug!(etag = %server_etag, "deleting with If-Match");
        match self.store.delete(&href, Some(&server_etag)).await? {
            DeleteOutcome::Deleted => {
                self.audit
                    .record(R::NAME, uid, AuditAction::Delete, Some(&current), None)
                    .await;
                Ok(DeleteResult::Deleted)
            }
            DeleteOutcome::NotFound => {
                tracing::debug!("removed concurrently");
                self.audit
                    .record::<R>(R::NAME, uid, AuditAction::Delete, None, None)
                    .await;
                Ok(DeleteResult::NotPresent)
            }
            DeleteOutcome::PreconditionFailed => {
                tracing::debug!("resource changed during delete, re-fetching");
                match self.load::<R>(&href).await? {
                    Some((latest, _)) => Err(self.conflict(uid, latest, None).await),
                    None => {
                        self.audit
                            .record::<R>(R::NAME, uid, AuditAction::Delete, None, None)
                            .await;
                        Ok(DeleteResult::NotPresent)
                    }
                }
            }
        }
    }

    fn href<R: Resource>(
        &self,
        collection: Option<&str>,
        uid: &str,
    ) -> Result<Href, CoordinatorError<R>> {
        if !is_path_safe(uid) {
            return Err(CoordinatorError::InvalidUid {
                kind: R::NAME,
                uid: uid.to_string(),
            });
        }
        Ok(self.store.href(R::KIND, collection, uid))
    }

    /// Reads and decodes a resource; the returned payload carries its tag.
    async fn load<R: Resource>(
        &self,
        href: &Href,
    ) -> Result<Option<(R, ETag)>, CoordinatorError<R>> {
        let Some(resource) = self.store.fetch(href).await? else {
            return Ok(None);
        };

        let mut payload = R::from_dav(&resource.data)?;
        payload.set_etag(Some(resource.etag.clone()));
        payload.set_href(&resource.href);
        Ok(Some((payload, resource.etag)))
    }

    async fn resolve_new_etag(&self, href: &Href, reported: Option<ETag>) -> Option<ETag> {
        if reported.is_some() {
            return reported;
        }

        tracing::debug!(%href, "no ETag in write response, re-fetching");
        match self.store.fetch(href).await {
            Ok(Some(resource)) => Some(resource.etag),
            Ok(None) => {
                tracing::warn!(%href, "resource missing right after write");
                None
            }
            Err(err) => {
                tracing::warn!(%href, %err, "failed to learn new ETag");
                None
            }
        }
    }

    async fn conflict<R: Resource>(
        &self,
        uid: &str,
        current: R,
        attempted: Option<&R>,
    ) -> CoordinatorError<R> {
        tracing::info!(
            server = ?current.etag(),
            client = ?attempted.and_then(Resource::etag),
            "rejecting stale write"
        );
        self.audit
            .record(R::NAME, uid, AuditAction::Conflict, Some(&current), attempted)
            .await;
        CoordinatorError::Conflict {
            kind: R::NAME,
            uid: uid.to_string(),
            current: Box::new(current),
        }
    }

    /// The resource to update does not exist, or disappeared before the
    /// conditional write.
    async fn missing<R: Resource>(&self, uid: &str, attempted: &R) -> CoordinatorError<R> {
        tracing::info!("no resource to update");
        self.audit
            .record(R::NAME, uid, AuditAction::Conflict, None, Some(attempted))
            .await;
        CoordinatorError::NotFound {
            kind: R::NAME,
            uid: uid.to_string(),
        }
    }
}

/// A uid must form a single path segment that needs no percent-encoding.
fn is_path_safe(uid: &str) -> bool {
    !uid.trim().is_empty()
        && uid != "."
        && uid != ".."
        && !uid
            .chars()
            .any(|c| c.is_whitespace() || c.is_control() || matches!(c, '/' | '\\' | '?' | '#' | '%'))
}

// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;

use davgate_dav::{DavClient, DavError, ETag};

use crate::audit::{AuditRecorder, JsonlAuditLog};
use crate::config::Config;
use crate::contact::Contact;
use crate::coordinator::{Coordinator, CoordinatorError, DeleteResult};
use crate::error::ConfigError;
use crate::event::Event;

/// Errors from starting the gateway.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// The configuration is incomplete.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The DAV client could not be built.
    #[error(transparent)]
    Dav(#[from] DavError),
}

/// Contacts and events over one DAV account, with optimistic locking and
/// an audit trail.
///
/// Build one per process and share it; it owns the DAV connection pool and
/// the audit log handle.
#[derive(Debug, Clone)]
pub struct Gateway {
    coordinator: Coordinator<DavClient>,
}

impl Gateway {
    /// Creates a gateway from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the DAV client
    /// cannot be built.
    pub fn new(mut config: Config) -> Result<Self, GatewayError> {
        config.normalize()?;

        let audit_log = config.audit_log_path();
        tracing::debug!(base_url = %config.dav.base_url, audit_log = %audit_log.display(), "starting gateway");

        let client = DavClient::new(config.dav)?;
        let audit = AuditRecorder::new(Arc::new(JsonlAuditLog::new(audit_log)));
        Ok(Self::with_coordinator(Coordinator::new(client, audit)))
    }

    /// Creates a gateway around an existing coordinator.
    #[must_use]
    pub const fn with_coordinator(coordinator: Coordinator<DavClient>) -> Self {
        Self { coordinator }
    }

    /// Reads a contact.
    ///
    /// # Errors
    ///
    /// See [`Coordinator::get`].
    pub async fn get_contact(
        &self,
        addressbook: Option<&str>,
        uid: &str,
    ) -> Result<Contact, CoordinatorError<Contact>> {
        self.coordinator.get(addressbook, uid).await
    }

    /// Creates a contact.
    ///
    /// # Errors
    ///
    /// See [`Coordinator::create`].
    pub async fn create_contact(
        &self,
        addressbook: Option<&str>,
        contact: Contact,
    ) -> Result<Contact, CoordinatorError<Contact>> {
        self.coordinator.create(addressbook, contact).await
    }

    /// Updates a contact if its `etag` is still current.
    ///
    /// # Errors
    ///
    /// See [`Coordinator::update`].
    pub async fn update_contact(
        &self,
        addressbook: Option<&str>,
        contact: Contact,
    ) -> Result<Contact, CoordinatorError<Contact>> {
        self.coordinator.update(addressbook, contact).await
    }

    /// Deletes a contact, guarded by `etag` when given.
    ///
    /// # Errors
    ///
    /// See [`Coordinator::delete`].
    pub async fn delete_contact(
        &self,
        addressbook: Option<&str>,
        uid: &str,
        etag: Option<&ETag>,
    ) -> Result<DeleteResult, CoordinatorError<Contact>> {
        self.coordinator.delete(addressbook, uid, etag).await
    }

    /// Reads an event.
    ///
    /// # Errors
    ///
    /// See [`Coordinator::get`].
    pub async fn get_event(
        &self,
        calendar: Option<&str>,
        uid: &str,
    ) -> Result<Event, CoordinatorError<Event>> {
        self.coordinator.get(calendar, uid).await
    }

    /// Creates an event.
    ///
    /// # Errors
    ///
    /// See [`Coordinator::create`].
    pub async fn create_event(
        &self,
        calendar: Option<&str>,
        event: Event,
    ) -> Result<Event, CoordinatorError<Event>> {
        self.coordinator.create(calendar, event).await
    }

    /// Updates an event if its `etag` is still current.
    ///
    /// # Errors
    ///
    /// See [`Coordinator::update`].
    pub async fn update_event(
        &self,
        calendar: Option<&str>,
        event: Event,
    ) -> Result<Event, CoordinatorError<Event>> {
        self.coordinator.update(calendar, event).await
    }

    /// Deletes an event, guarded by `etag` when given.
    ///
    /// # Errors
    ///
    /// See [`Coordinator::delete`].
    pub async fn delete_event(
        &self,
        calendar: Option<&str>,
        uid: &str,
        etag: Option<&ETag>,
    ) -> Result<DeleteResult, CoordinatorError<Event>> {
        self.coordinator.delete(calendar, uid, etag).await
    }

    /// Flushes the audit log. The DAV client is released when the last
    /// clone of the gateway is dropped.
    pub async fn shutdown(self) {
        tracing::debug!("shutting down gateway");
        self.coordinator.audit().flush().await;
    }
}

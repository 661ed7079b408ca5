// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use davgate_core::dav::{CollectionKind, DavError, DavResource, ETag, Href, Precondition};
use davgate_core::{
    AuditRecorder, Coordinator, DeleteOutcome, MemoryAuditLog, ResourceStore, WriteOutcome,
};

/// DAV server stand-in holding resources in memory.
///
/// Tags are sequential integers in quotes. A write can be staged with
/// [`MemoryStore::interleave`] to land right before the next write or
/// delete, simulating another client racing the coordinator.
#[derive(Debug, Default)]
pub struct MemoryStore {
    resources: Mutex<HashMap<Href, (ETag, String)>>,
    next_tag: AtomicU64,
    omit_etag: AtomicBool,
    interleaved: Mutex<Option<(Href, Option<String>)>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a body unconditionally and returns its new tag.
    pub fn insert(&self, href: &Href, body: String) -> ETag {
        let tag = self.next_tag.fetch_add(1, Ordering::SeqCst) + 1;
        let etag = ETag::new(format!("\"{tag}\""));
        self.resources
            .lock()
            .unwrap()
            .insert(href.clone(), (etag.clone(), body));
        etag
    }

    pub fn remove(&self, href: &Href) {
        self.resources.lock().unwrap().remove(href);
    }

    pub fn body(&self, href: &Href) -> Option<String> {
        self.resources
            .lock()
            .unwrap()
            .get(href)
            .map(|(_, body)| body.clone())
    }

    pub fn etag(&self, href: &Href) -> Option<ETag> {
        self.resources
            .lock()
            .unwrap()
            .get(href)
            .map(|(etag, _)| etag.clone())
    }

    /// Drops the tag from write responses, like servers that rewrite bodies.
    pub fn omit_etag_on_write(&self) {
        self.omit_etag.store(true, Ordering::SeqCst);
    }

    /// Applies a concurrent write (`Some`) or delete (`None`) before the
    /// next mutation reaches the store.
    pub fn interleave(&self, href: &Href, body: Option<String>) {
        *self.interleaved.lock().unwrap() = Some((href.clone(), body));
    }

    fn apply_interleaved(&self) {
        let staged = self.interleaved.lock().unwrap().take();
        match staged {
            Some((href, Some(body))) => {
                self.insert(&href, body);
            }
            Some((href, None)) => self.remove(&href),
            None => {}
        }
    }
}

#[async_trait]
impl ResourceStore for MemoryStore {
    fn href(&self, kind: CollectionKind, collection: Option<&str>, uid: &str) -> Href {
        let home = match kind {
            CollectionKind::AddressBook => "/dav/addressbooks/alice",
            CollectionKind::Calendar => "/dav/calendars/alice",
        };
        let collection = collection.unwrap_or("default");
        Href::new(format!("{home}/{collection}/{uid}.{}", kind.extension()))
    }

    async fn fetch(&self, href: &Href) -> Result<Option<DavResource>, DavError> {
        let resources = self.resources.lock().unwrap();
        Ok(resources
            .get(href)
            .map(|(etag, body)| DavResource::new(href.clone(), etag.clone(), body.clone())))
    }

    async fn write(
        &self,
        href: &Href,
        _kind: CollectionKind,
        body: String,
        precondition: &Precondition,
    ) -> Result<WriteOutcome, DavError> {
        self.apply_interleaved();

        let current = self.etag(href);
        let allowed = match (precondition, &current) {
            (Precondition::None, _) => true,
            (Precondition::IfNoneMatch, current) => current.is_none(),
            (Precondition::IfMatch(expected), Some(current)) => expected.matches(current),
            (Precondition::IfMatch(_), None) => return Ok(WriteOutcome::NotFound),
        };
        if !allowed {
            return Ok(WriteOutcome::PreconditionFailed);
        }

        let etag = self.insert(href, body);
        if self.omit_etag.load(Ordering::SeqCst) {
            Ok(WriteOutcome::Written(None))
        } else {
            Ok(WriteOutcome::Written(Some(etag)))
        }
    }

    async fn delete(&self, href: &Href, if_match: Option<&ETag>) -> Result<DeleteOutcome, DavError> {
        self.apply_interleaved();

        let mut resources = self.resources.lock().unwrap();
        let Some((current, _)) = resources.get(href) else {
            return Ok(DeleteOutcome::NotFound);
        };
        if let Some(expected) = if_match
            && !expected.matches(current)
        {
            return Ok(DeleteOutcome::PreconditionFailed);
        }
        resources.remove(href);
        Ok(DeleteOutcome::Deleted)
    }
}

/// A coordinator over a fresh store, with its audit log.
pub fn setup() -> (Coordinator<Arc<MemoryStore>>, Arc<MemoryStore>, Arc<MemoryAuditLog>) {
    let store = Arc::new(MemoryStore::new());
    let audit = Arc::new(MemoryAuditLog::new());
    let coordinator = Coordinator::new(store.clone(), AuditRecorder::new(audit.clone()));
    (coordinator, store, audit)
}

// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Append-only record of every mutation attempt.

use std::fmt::{self, Debug};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use tokio::fs::{self, File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::error::AuditError;

/// What happened to a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditAction {
    /// A resource was created.
    Create,
    /// A resource was replaced.
    Update,
    /// A resource was removed, or was already absent.
    Delete,
    /// A write was rejected because the client's version was stale.
    Conflict,
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Conflict => "conflict",
        })
    }
}

/// One line of the audit log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    /// When the entry was produced (UTC).
    pub timestamp: Timestamp,
    /// Resource type, such as `contact` or `event`.
    pub resource: String,
    /// What happened.
    pub action: AuditAction,
    /// Resource identifier.
    pub uid: String,
    /// Server state before the attempt.
    pub before: Option<serde_json::Value>,
    /// State written, or the rejected client payload for conflicts.
    pub after: Option<serde_json::Value>,
}

impl AuditEntry {
    /// Creates an entry stamped with the current time.
    #[must_use]
    pub fn new(
        resource: &str,
        uid: &str,
        action: AuditAction,
        before: Option<serde_json::Value>,
        after: Option<serde_json::Value>,
    ) -> Self {
        Self {
            timestamp: Timestamp::now(),
            resource: resource.to_string(),
            action,
            uid: uid.to_string(),
            before,
            after,
        }
    }
}

/// Durable destination for audit entries.
#[async_trait]
pub trait AuditSink: Debug + Send + Sync {
    /// Appends one entry.
    async fn append(&self, entry: &AuditEntry) -> Result<(), AuditError>;

    /// Flushes buffered entries.
    async fn flush(&self) -> Result<(), AuditError> {
        Ok(())
    }
}

/// Audit log stored as JSON Lines in a single file.
///
/// The file and its parent directories are created on the first append.
/// Appends from concurrent tasks are serialized so lines never interleave.
#[derive(Debug)]
pub struct JsonlAuditLog {
    path: PathBuf,
    file: Mutex<Option<File>>,
}

impl JsonlAuditLog {
    /// Creates a log writing to `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            file: Mutex::new(None),
        }
    }

    /// Location of the log file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn open(&self) -> Result<File, AuditError> {
        let io_err = |source| AuditError::Io {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await.map_err(io_err)?;
        }
        tracing::debug!(path = %self.path.display(), "opening audit log");
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(io_err)
    }
}

#[async_trait]
impl AuditSink for JsonlAuditLog {
    async fn append(&self, entry: &AuditEntry) -> Result<(), AuditError> {
        let mut line = serde_json::to_string(entry)?;
        line.push('\n');

        let mut guard = self.file.lock().await;
        let mut file = match guard.take() {
            Some(file) => file,
            None => self.open().await?,
        };

        let result = async {
            file.write_all(line.as_bytes()).await?;
            file.flush().await
        }
        .await;
        match result {
            Ok(()) => {
                *guard = Some(file);
                Ok(())
            }
            // The handle is dropped and reopened on the next append.
            Err(source) => Err(AuditError::Io {
                path: self.path.clone(),
                source,
            }),
        }
    }

    async fn flush(&self) -> Result<(), AuditError> {
        let mut guard = self.file.lock().await;
        if let Some(file) = guard.as_mut() {
            file.sync_all().await.map_err(|source| AuditError::Io {
                path: self.path.clone(),
                source,
            })?;
        }
        Ok(())
    }
}

/// Audit log kept in memory.
#[derive(Debug, Default)]
pub struct MemoryAuditLog {
    entries: Mutex<Vec<AuditEntry>>,
}

impl MemoryAuditLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the entries recorded so far.
    pub async fn entries(&self) -> Vec<AuditEntry> {
        self.entries.lock().await.clone()
    }
}

#[async_trait]
impl AuditSink for MemoryAuditLog {
    async fn append(&self, entry: &AuditEntry) -> Result<(), AuditError> {
        self.entries.lock().await.push(entry.clone());
        Ok(())
    }
}

/// Builds audit entries from typed snapshots and hands them to a sink.
///
/// Recording never fails the caller: serialization and write errors are
/// logged and dropped.
#[derive(Debug, Clone)]
pub struct AuditRecorder {
    sink: Arc<dyn AuditSink>,
}

impl AuditRecorder {
    /// Creates a recorder writing to `sink`.
    pub fn new(sink: Arc<dyn AuditSink>) -> Self {
        Self { sink }
    }

    /// Records one mutation attempt.
    pub async fn record<T: Serialize>(
        &self,
        resource: &str,
        uid: &str,
        action: AuditAction,
        before: Option<&T>,
        after: Option<&T>,
    ) {
        let snapshot = |value: Option<&T>| {
            value.and_then(|v| match serde_json::to_value(v) {
                Ok(v) => Some(v),
                Err(err) => {
                    tracing::warn!(resource, uid, %err, "failed to snapshot payload for audit");
                    None
                }
            })
        };

        let entry = AuditEntry::new(resource, uid, action, snapshot(before), snapshot(after));
        tracing::debug!(resource, uid, %action, "recording audit entry");
        if let Err(err) = self.sink.append(&entry).await {
            tracing::error!(resource, uid, %action, %err, "failed to write audit entry");
        }
    }

    /// Flushes the sink.
    pub async fn flush(&self) {
        if let Err(err) = self.sink.flush().await {
            tracing::warn!(%err, "failed to flush audit log");
        }
    }
}

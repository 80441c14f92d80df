//! Pluggable backup storage.
//!
//! A backend implements [`BackupStorage`] and registers under a name in a
//! [`BackupStorageRegistry`](registry::BackupStorageRegistry). Callers
//! resolve the active backend from config and drive backup sessions through
//! [`BackupHandle`]: `start_backup` opens a read-write session, `add_file`
//! streams files into it, and `end_backup`/`abort_backup` commit or roll it
//! back atomically. Handles returned by `list_backups` are read-only.
//!
//! Cancellation is scoped per call: dropping the future of any storage or
//! handle method (or dropping a file stream mid-transfer) cancels that
//! operation only. Cancellation never deletes bytes already written for the
//! session; only `abort_backup` does that.

pub mod recorder;
pub mod registry;

use async_trait::async_trait;
use crate::error::{OpsError, ResourceType};
use self::recorder::ErrorRecorder;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};

/// Write stream for one file inside a backup session. Shutting the stream
/// down finalizes the file; dropping it mid-write aborts the transfer
/// without touching sibling files.
pub type FileWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// Read stream for one file of a committed backup.
pub type FileReader = Box<dyn AsyncRead + Send + Unpin>;

/// Size hint passed to [`BackupHandle::add_file`]. Backends may use it to
/// preallocate but must never rely on it being exact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileSizeHint {
    Unknown,
    Bytes(u64),
}

impl FileSizeHint {
    pub fn bytes(self) -> Option<u64> {
        match self {
            FileSizeHint::Unknown => None,
            FileSizeHint::Bytes(n) => Some(n),
        }
    }
}

/// A handle is exclusively read-write or read-only for its entire life.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleMode {
    ReadWrite,
    ReadOnly,
}

impl std::fmt::Display for HandleMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HandleMode::ReadWrite => write!(f, "read-write"),
            HandleMode::ReadOnly => write!(f, "read-only"),
        }
    }
}

/// Cross-cutting annotations for a derived storage view: a component label
/// plus free-form tags, surfaced in tracing spans by backends. Carrying
/// these on a derived view keeps the shared registry entry unmutated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StorageParams {
    component: String,
    tags: BTreeMap<String, String>,
}

impl StorageParams {
    pub fn new(component: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            tags: BTreeMap::new(),
        }
    }

    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    pub fn component(&self) -> &str {
        &self.component
    }

    pub fn tags(&self) -> impl Iterator<Item = (&str, &str)> {
        self.tags.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Factory for backup sessions against one storage backend.
///
/// Implementations must be safe to share across tasks. Each method call is
/// its own cancellation scope; none of them retains the scope of the call
/// that produced the object it operates on.
#[async_trait]
pub trait BackupStorage: Send + Sync {
    /// Enumerates fully-committed backups under `directory`, as read-only
    /// handles sorted ascending by name. Backups that were started but
    /// never ended must not appear.
    async fn list_backups(
        &self,
        directory: &str,
    ) -> Result<Vec<Arc<dyn BackupHandle>>, OpsError>;

    /// Opens a new read-write backup session for `(directory, name)`.
    /// Fails with [`OpsError::AlreadyExists`] if the key already exists;
    /// there is no silent overwrite.
    async fn start_backup(
        &self,
        directory: &str,
        name: &str,
    ) -> Result<Arc<dyn BackupHandle>, OpsError>;

    /// Deletes all backend state for `(directory, name)`. Removing a
    /// nonexistent backup is an error ([`OpsError::NotFound`]); the caller
    /// asked to delete something that was never there.
    async fn remove_backup(&self, directory: &str, name: &str) -> Result<(), OpsError>;

    /// Releases pooled resources. Advisory: the storage object stays
    /// usable afterwards.
    async fn release(&self) -> Result<(), OpsError>;

    /// Derives a logically independent view of this storage annotated with
    /// `params`. The view shares no mutable state with `self` beyond the
    /// backend data itself.
    fn with_params(self: Arc<Self>, params: StorageParams) -> Arc<dyn BackupStorage>;
}

/// One backup session (read-write) or one committed backup (read-only).
#[async_trait]
pub trait BackupHandle: Send + Sync {
    /// Caller-supplied directory, stable for the handle's life.
    fn directory(&self) -> &str;

    /// Caller-supplied backup name, stable for the handle's life.
    fn name(&self) -> &str;

    fn mode(&self) -> HandleMode;

    /// The session's error recorder. Concurrent writers record failures
    /// here instead of failing their write call synchronously;
    /// `end_backup` consults it before committing.
    fn recorder(&self) -> &ErrorRecorder;

    /// Opens a write stream for a new file in the session. Valid only on a
    /// read-write handle. `filename` is restricted to `[A-Za-z0-9-]` and
    /// rejected before any byte is written. Callable concurrently for
    /// distinct filenames; each returned stream is independent of its
    /// siblings.
    async fn add_file(
        &self,
        filename: &str,
        size_hint: FileSizeHint,
    ) -> Result<FileWriter, OpsError>;

    /// Commits the session so that `list_backups` sees it atomically.
    /// Valid only on a read-write handle, and only after every returned
    /// write stream has been shut down by its caller (the handle does not
    /// enforce that synchronization). Any failure in the recorder makes
    /// the commit fail instead of silently succeeding.
    async fn end_backup(&self) -> Result<(), OpsError>;

    /// Rolls the session back, deleting all bytes written so far. Valid
    /// only on a read-write handle; safe to call with zero files added.
    async fn abort_backup(&self) -> Result<(), OpsError>;

    /// Opens a read stream for `filename`. Valid only on a read-only
    /// handle.
    async fn read_file(&self, filename: &str) -> Result<FileReader, OpsError>;
}

/// Checks a session filename against the allowed character class
/// `[A-Za-z0-9-]`. Backends call this first in `add_file`/`read_file` so
/// the rejection happens before any byte moves.
pub fn validate_backup_filename(filename: &str) -> Result<(), OpsError> {
    if filename.is_empty() {
        return Err(OpsError::Usage("backup filename must not be empty".into()));
    }
    if !filename
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'-')
    {
        return Err(OpsError::Usage(format!(
            "backup filename may only contain [A-Za-z0-9-]: {filename:?}"
        )));
    }
    Ok(())
}

/// Rejects an operation invoked against the wrong handle mode. Wrong-mode
/// calls are caller bugs and fail fast without touching the backend.
pub fn ensure_mode(
    actual: HandleMode,
    required: HandleMode,
    operation: &str,
) -> Result<(), OpsError> {
    if actual == required {
        Ok(())
    } else {
        Err(OpsError::Usage(format!(
            "{operation} requires a {required} handle, got {actual}"
        )))
    }
}

/// Convenience for backends reporting a missing file on a read-only handle.
pub fn file_not_found(filename: &str) -> OpsError {
    OpsError::NotFound {
        resource_type: ResourceType::BackupFile,
        resource_id: filename.to_string(),
    }
}

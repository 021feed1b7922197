//! Pluggable backup storage backends.
//!
//! This module provides a trait-based abstraction over the places backup
//! archives live:
//!
//! - **Filesystem**: dumps on the local filesystem (always active)
//! - **S3**: dumps in S3-compatible object storage (optional)
//!
//! Rotation only needs two primitives from a backend: enumerate the backups
//! it holds and delete one of them. Upload/download for shipping dumps are
//! inherent methods on the S3 store, not part of the trait, since the local
//! backend never needs them.

mod filesystem;
mod s3;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
pub use filesystem::FilesystemStore;
pub use s3::S3Store;
use thiserror::Error;

/// One discovered backup artifact in a backend.
///
/// Entries are constructed fresh from a live listing on every call and are
/// never persisted; the identifier is only meaningful within the backend
/// that produced it (an absolute path locally, an object key remotely).
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct BackupEntry {
    /// Backend-specific locator, unique within one listing.
    pub identifier: String,

    /// Last-modified timestamp used for age comparison.
    pub last_modified: DateTime<Utc>,

    /// Human-readable name (basename), used only for logging.
    pub display_name: String,
}

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// The backend returned a partial listing. Rotation must not act on an
    /// incomplete view, so this is fatal for the pass.
    #[error("Listing truncated: {0}")]
    TruncatedListing(String),

    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for backup storage backends participating in listing and rotation.
///
/// Implementations must be `Send + Sync` to support async contexts.
#[async_trait]
pub trait BackupStore: Send + Sync {
    /// Enumerate the backup entries directly under the backend's root
    /// (non-recursive).
    ///
    /// A root that does not exist yet is "no backups yet", not a fault:
    /// implementations return an empty vec in that case.
    async fn list(&self) -> StorageResult<Vec<BackupEntry>>;

    /// Delete one entry by identifier.
    ///
    /// With `dry_run` set, the deletion is logged and reported as a success
    /// without any side effect.
    async fn delete(&self, identifier: &str, dry_run: bool) -> StorageResult<()>;

    /// Backend type name, for logging and error attribution.
    fn backend_name(&self) -> &'static str;
}

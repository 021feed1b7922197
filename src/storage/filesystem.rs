//! Local filesystem backup store.

use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use super::{BackupEntry, BackupStore, StorageError, StorageResult};

/// Backup store over a local directory of dump archives.
///
/// Listing is non-recursive: only regular files directly under the root are
/// considered backups.
pub struct FilesystemStore {
    root: PathBuf,
}

impl FilesystemStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl BackupStore for FilesystemStore {
    async fn list(&self) -> StorageResult<Vec<BackupEntry>> {
        let mut dir = match tokio::fs::read_dir(&self.root).await {
            Ok(dir) => dir,
            // An absent backup directory means "no backups yet", not a fault.
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(root = %self.root.display(), "Backup directory does not exist, listing empty");
                return Ok(Vec::new());
            }
            Err(e) if e.kind() == ErrorKind::PermissionDenied => {
                return Err(StorageError::PermissionDenied(
                    self.root.display().to_string(),
                ));
            }
            Err(e) => return Err(StorageError::Io(e)),
        };

        let mut entries = Vec::new();
        while let Some(dir_entry) = dir.next_entry().await? {
            let metadata = dir_entry.metadata().await?;
            if !metadata.is_file() {
                continue;
            }
            let path = dir_entry.path();
            let Some(last_modified) = change_time(&metadata) else {
                warn!(path = %path.display(), "Could not read file timestamp, skipping entry");
                continue;
            };
            entries.push(BackupEntry {
                identifier: path.to_string_lossy().to_string(),
                last_modified,
                display_name: dir_entry.file_name().to_string_lossy().to_string(),
            });
        }

        debug!(root = %self.root.display(), count = entries.len(), "Listed filesystem backups");
        Ok(entries)
    }

    async fn delete(&self, identifier: &str, dry_run: bool) -> StorageResult<()> {
        if dry_run {
            info!(path = identifier, "*dry run* DELETE");
            return Ok(());
        }

        match tokio::fs::remove_file(identifier).await {
            Ok(()) => {
                info!(path = identifier, "Deleted backup file");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(StorageError::NotFound(identifier.to_string()))
            }
            Err(e) if e.kind() == ErrorKind::PermissionDenied => {
                Err(StorageError::PermissionDenied(identifier.to_string()))
            }
            Err(e) => Err(StorageError::Io(e)),
        }
    }

    fn backend_name(&self) -> &'static str {
        "filesystem"
    }
}

/// File change time (ctime) on Unix, falling back to the modification time
/// on other platforms.
fn change_time(metadata: &std::fs::Metadata) -> Option<DateTime<Utc>> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::MetadataExt;
        DateTime::from_timestamp(metadata.ctime(), metadata.ctime_nsec() as u32)
    }
    #[cfg(not(unix))]
    {
        metadata.modified().ok().map(DateTime::<Utc>::from)
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[tokio::test]
    async fn test_list_nonexistent_root_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let store = FilesystemStore::new(temp_dir.path().join("does-not-exist"));

        let entries = store.list().await.unwrap();
        assert!(entries.is_empty());
    }

    #[tokio::test]
    async fn test_list_returns_files_only() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("a.gz"), b"dump-a").unwrap();
        std::fs::write(temp_dir.path().join("b.gz"), b"dump-b").unwrap();
        std::fs::create_dir(temp_dir.path().join("subdir")).unwrap();

        let store = FilesystemStore::new(temp_dir.path());
        let mut entries = store.list().await.unwrap();
        entries.sort_by(|a, b| a.display_name.cmp(&b.display_name));

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].display_name, "a.gz");
        assert_eq!(entries[1].display_name, "b.gz");
        assert!(entries[0].identifier.ends_with("a.gz"));
    }

    #[tokio::test]
    async fn test_delete_removes_file() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("old.gz");
        std::fs::write(&file, b"dump").unwrap();

        let store = FilesystemStore::new(temp_dir.path());
        store
            .delete(&file.to_string_lossy(), false)
            .await
            .unwrap();
        assert!(!file.exists());
    }

    #[tokio::test]
    async fn test_delete_dry_run_keeps_file() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("old.gz");
        std::fs::write(&file, b"dump").unwrap();

        let store = FilesystemStore::new(temp_dir.path());
        store.delete(&file.to_string_lossy(), true).await.unwrap();
        assert!(file.exists());
    }

    #[tokio::test]
    async fn test_delete_missing_file_is_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let store = FilesystemStore::new(temp_dir.path());

        let missing = temp_dir.path().join("gone.gz");
        let result = store.delete(&missing.to_string_lossy(), false).await;
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }
}

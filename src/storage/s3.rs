//! S3-compatible object storage backup store.
//!
//! Works with AWS S3, MinIO, Cloudflare R2, DigitalOcean Spaces, and any
//! other S3-compatible service. Beyond the `BackupStore` primitives used by
//! rotation, this store can ship a finished dump to the bucket and fetch a
//! remote dump back for restore.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{debug, error, info};

use super::{BackupEntry, BackupStore, StorageError, StorageResult};
use crate::config::RemoteStorageConfig;

/// Safety limit on one listing call. A bucket prefix holding more backups
/// than this produces a truncated view, and rotation refuses to act on it.
const MAX_LISTING_KEYS: i32 = 2000;

/// Backup store over an S3 bucket (optionally under a key prefix).
pub struct S3Store {
    config: RemoteStorageConfig,
    client: aws_sdk_s3::Client,
}

impl S3Store {
    pub async fn new(config: RemoteStorageConfig) -> StorageResult<Self> {
        info!(bucket = %config.bucket, "Initializing S3 backup store");

        let mut sdk_config_builder = aws_config::defaults(aws_config::BehaviorVersion::latest());

        if let Some(region) = &config.region {
            sdk_config_builder = sdk_config_builder.region(aws_config::Region::new(region.clone()));
        }

        if let (Some(access_key), Some(secret_key)) =
            (&config.access_key_id, &config.secret_access_key)
        {
            let credentials = aws_credential_types::Credentials::new(
                access_key.clone(),
                secret_key.clone(),
                None, // session token
                None, // expiry
                "mongovault-config",
            );
            sdk_config_builder = sdk_config_builder.credentials_provider(credentials);
        }

        let sdk_config = sdk_config_builder.load().await;

        let mut s3_config_builder = aws_sdk_s3::config::Builder::from(&sdk_config);

        if let Some(endpoint) = &config.endpoint {
            s3_config_builder = s3_config_builder.endpoint_url(endpoint);
        }

        if config.force_path_style {
            s3_config_builder = s3_config_builder.force_path_style(true);
        }

        let client = aws_sdk_s3::Client::from_conf(s3_config_builder.build());

        Ok(Self { config, client })
    }

    fn object_key(&self, file_name: &str) -> String {
        self.config.object_key(file_name)
    }

    /// Upload a finished dump archive to the bucket.
    ///
    /// Returns the object key the archive was stored under.
    pub async fn upload(&self, local_path: &Path, file_name: &str) -> StorageResult<String> {
        let key = self.object_key(file_name);
        debug!(path = %local_path.display(), key, "Uploading dump to S3");

        let body = aws_sdk_s3::primitives::ByteStream::from_path(local_path)
            .await
            .map_err(|e| StorageError::Unavailable(format!("Failed to read {}: {}", local_path.display(), e)))?;

        self.client
            .put_object()
            .bucket(&self.config.bucket)
            .key(&key)
            .body(body)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to upload to S3");
                StorageError::Unavailable(e.to_string())
            })?;

        info!(key, bucket = %self.config.bucket, "Dump uploaded to S3");
        Ok(key)
    }

    /// Download a remote dump into `local_dir`, creating the directory if
    /// needed. Returns the path of the downloaded file.
    pub async fn download(&self, key: &str, local_dir: &Path) -> StorageResult<PathBuf> {
        debug!(key, dir = %local_dir.display(), "Downloading dump from S3");

        tokio::fs::create_dir_all(local_dir).await?;

        let result = self
            .client
            .get_object()
            .bucket(&self.config.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                if e.to_string().contains("NoSuchKey") || e.to_string().contains("NotFound") {
                    StorageError::NotFound(key.to_string())
                } else {
                    error!(error = %e, "Failed to download from S3");
                    StorageError::Unavailable(e.to_string())
                }
            })?;

        let content = result.body.collect().await.map_err(|e| {
            StorageError::Unavailable(format!("Failed to read S3 response body: {}", e))
        })?;

        let file_name = key.rsplit('/').next().unwrap_or(key);
        let local_path = local_dir.join(file_name);
        tokio::fs::write(&local_path, content.into_bytes()).await?;

        info!(key, path = %local_path.display(), "Dump downloaded from S3");
        Ok(local_path)
    }
}

#[async_trait]
impl BackupStore for S3Store {
    async fn list(&self) -> StorageResult<Vec<BackupEntry>> {
        // The delimiter keeps the listing non-recursive: keys nested under
        // further "directories" land in common_prefixes, which we ignore.
        let mut request = self
            .client
            .list_objects_v2()
            .bucket(&self.config.bucket)
            .delimiter("/")
            .max_keys(MAX_LISTING_KEYS);

        if let Some(prefix) = &self.config.key_prefix {
            request = request.prefix(prefix.trim_end_matches('/').to_string() + "/");
        }

        let response = request.send().await.map_err(|e| {
            error!(error = %e, bucket = %self.config.bucket, "Failed to list S3 objects");
            StorageError::Unavailable(e.to_string())
        })?;

        if response.is_truncated().unwrap_or(false) {
            return Err(StorageError::TruncatedListing(format!(
                "bucket {} holds more than {} backups, rotation skipped",
                self.config.bucket, MAX_LISTING_KEYS
            )));
        }

        let mut entries = Vec::new();
        for object in response.contents() {
            let Some(key) = object.key() else { continue };
            let Some(name) = direct_child_name(key, self.config.key_prefix.as_deref()) else {
                continue;
            };
            let Some(last_modified) = object.last_modified().and_then(to_chrono) else {
                continue;
            };
            entries.push(BackupEntry {
                identifier: key.to_string(),
                last_modified,
                display_name: name.to_string(),
            });
        }

        debug!(bucket = %self.config.bucket, count = entries.len(), "Listed S3 backups");
        Ok(entries)
    }

    async fn delete(&self, identifier: &str, dry_run: bool) -> StorageResult<()> {
        if dry_run {
            info!(key = identifier, "*dry run* DELETE");
            return Ok(());
        }

        self.client
            .delete_object()
            .bucket(&self.config.bucket)
            .key(identifier)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, key = identifier, "Failed to delete from S3");
                StorageError::Unavailable(e.to_string())
            })?;

        info!(key = identifier, bucket = %self.config.bucket, "Deleted backup object");
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "s3"
    }
}

fn to_chrono(dt: &aws_sdk_s3::primitives::DateTime) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(dt.secs(), dt.subsec_nanos())
}

/// File name of a key sitting directly under `prefix`.
///
/// Returns `None` for keys nested deeper than the prefix, for directory
/// placeholder objects, and for keys outside the prefix entirely.
fn direct_child_name<'a>(key: &'a str, prefix: Option<&str>) -> Option<&'a str> {
    let name = match prefix {
        Some(prefix) => {
            let normalized = format!("{}/", prefix.trim_end_matches('/'));
            key.strip_prefix(&normalized)?
        }
        None => key,
    };
    if name.is_empty() || name.contains('/') {
        return None;
    }
    Some(name)
}

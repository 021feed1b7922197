//! Dump configuration.

use serde::{Deserialize, Serialize};

/// Settings for `mongodump` invocations and the local dump location.
#[derive(Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DumpConfig {
    /// `mongodump` binary to invoke.
    #[serde(default = "default_dump_cmd")]
    pub dump_cmd: String,

    /// Local directory receiving dump archives. Created if missing.
    #[serde(default = "default_path")]
    pub path: String,

    /// Explicit archive file name. Default: `{db}__{timestamp}.gz`.
    #[serde(default)]
    pub file_name: Option<String>,

    /// Dump a single collection.
    #[serde(default)]
    pub collection: Option<String>,

    /// Collections to exclude. Mutually exclusive with `collection`.
    #[serde(default)]
    pub exclude_collections: Option<Vec<String>>,

    /// 32-byte secret; when set, dumps are encrypted after creation.
    #[serde(default)]
    pub secret: Option<String>,

    /// Suffix appended to encrypted archives.
    #[serde(default = "default_encrypt_suffix")]
    pub encrypt_suffix: String,

    /// Log the full command line before running it. The line includes
    /// credentials, so this is off by default.
    #[serde(default)]
    pub show_command: bool,
}

impl Default for DumpConfig {
    fn default() -> Self {
        Self {
            dump_cmd: default_dump_cmd(),
            path: default_path(),
            file_name: None,
            collection: None,
            exclude_collections: None,
            secret: None,
            encrypt_suffix: default_encrypt_suffix(),
            show_command: false,
        }
    }
}

impl std::fmt::Debug for DumpConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DumpConfig")
            .field("dump_cmd", &self.dump_cmd)
            .field("path", &self.path)
            .field("file_name", &self.file_name)
            .field("collection", &self.collection)
            .field("exclude_collections", &self.exclude_collections)
            .field("secret", &self.secret.as_ref().map(|_| "****"))
            .field("encrypt_suffix", &self.encrypt_suffix)
            .field("show_command", &self.show_command)
            .finish()
    }
}

impl DumpConfig {
    /// Validate dump settings.
    pub fn validate(&self) -> Result<(), String> {
        if self.collection.is_some() && self.exclude_collections.is_some() {
            return Err(
                "'exclude_collections' is not allowed when 'collection' is specified".to_string(),
            );
        }
        if let Some(secret) = &self.secret
            && secret.len() != 32
        {
            return Err(format!(
                "dump secret must be exactly 32 bytes, got {}",
                secret.len()
            ));
        }
        Ok(())
    }

    /// Whether dumps should be encrypted after creation.
    pub fn encrypt_enabled(&self) -> bool {
        self.secret.is_some()
    }
}

fn default_dump_cmd() -> String {
    "mongodump".to_string()
}

fn default_path() -> String {
    "backup".to_string()
}

fn default_encrypt_suffix() -> String {
    crate::crypto::ENCRYPT_SUFFIX.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config: DumpConfig = toml::from_str("").unwrap();
        assert_eq!(config.dump_cmd, "mongodump");
        assert_eq!(config.path, "backup");
        assert_eq!(config.encrypt_suffix, ".enc");
        assert!(!config.encrypt_enabled());
    }

    #[test]
    fn test_collection_exclusion_conflict() {
        let config: DumpConfig = toml::from_str(
            r#"
            collection = "events"
            exclude_collections = ["sessions"]
            "#,
        )
        .unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_secret_length_validated() {
        let config: DumpConfig = toml::from_str(
            r#"
            secret = "too-short"
            "#,
        )
        .unwrap();
        assert!(config.validate().is_err());

        let config: DumpConfig = toml::from_str(
            r#"
            secret = "0123456789abcdef0123456789abcdef"
            "#,
        )
        .unwrap();
        assert!(config.validate().is_ok());
        assert!(config.encrypt_enabled());
    }
}

//! Restore configuration.

use serde::{Deserialize, Serialize};

/// Settings for `mongorestore` invocations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RestoreConfig {
    /// `mongorestore` binary to invoke.
    #[serde(default = "default_restore_cmd")]
    pub restore_cmd: String,

    /// Drop target collections before restoring (`--drop`).
    #[serde(default)]
    pub drop_before_restore: bool,

    /// Delete the local archive after a successful restore.
    #[serde(default)]
    pub delete_dump_after_restore: bool,

    /// Log the full command line before running it.
    #[serde(default)]
    pub show_command: bool,
}

impl Default for RestoreConfig {
    fn default() -> Self {
        Self {
            restore_cmd: default_restore_cmd(),
            drop_before_restore: false,
            delete_dump_after_restore: false,
            show_command: false,
        }
    }
}

fn default_restore_cmd() -> String {
    "mongorestore".to_string()
}

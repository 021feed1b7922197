//! Backup rotation configuration.
//!
//! Backups inside the safe time window `[now - window_days, now]` are never
//! removed. Backups older than that are "deprecated" and become rotation
//! candidates, subject to the retention floor and the per-run ceiling.
//!
//! # Example
//!
//! ```toml
//! [rotation]
//! window_days = 15
//! min_keep_count = 2
//! max_clean_count = 10
//! dry_run = false
//! ```

use serde::{Deserialize, Serialize};

use crate::rotation::RetentionPolicy;

/// Rotation settings, applied identically to every backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RotationConfig {
    /// Safe time window in days. Backups younger than this are never
    /// rotation candidates.
    /// Default: 15
    #[serde(default = "default_window_days")]
    pub window_days: u32,

    /// Minimum number of deprecated backups to keep, newest first.
    /// Default: 2
    #[serde(default = "default_min_keep_count")]
    pub min_keep_count: u32,

    /// Maximum number of deprecated backups to delete per run.
    /// Default: 10
    #[serde(default = "default_max_clean_count")]
    pub max_clean_count: u32,

    /// Log what would be deleted without deleting anything.
    /// Default: false
    #[serde(default)]
    pub dry_run: bool,
}

impl Default for RotationConfig {
    fn default() -> Self {
        Self {
            window_days: default_window_days(),
            min_keep_count: default_min_keep_count(),
            max_clean_count: default_max_clean_count(),
            dry_run: false,
        }
    }
}

impl RotationConfig {
    /// Retention policy for one rotation invocation.
    pub fn policy(&self, dry_run_override: bool) -> RetentionPolicy {
        RetentionPolicy {
            window_days: self.window_days,
            min_keep_count: self.min_keep_count,
            max_clean_count: self.max_clean_count,
            dry_run: self.dry_run || dry_run_override,
        }
    }
}

fn default_window_days() -> u32 {
    15
}

fn default_min_keep_count() -> u32 {
    2
}

fn default_max_clean_count() -> u32 {
    10
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config: RotationConfig = toml::from_str("").unwrap();
        assert_eq!(config.window_days, 15);
        assert_eq!(config.min_keep_count, 2);
        assert_eq!(config.max_clean_count, 10);
        assert!(!config.dry_run);
    }

    #[test]
    fn test_negative_count_rejected_at_parse() {
        let result: Result<RotationConfig, _> = toml::from_str("min_keep_count = -1");
        assert!(result.is_err());
    }

    #[test]
    fn test_policy_dry_run_override() {
        let config = RotationConfig::default();
        assert!(!config.policy(false).dry_run);
        assert!(config.policy(true).dry_run);

        let config = RotationConfig {
            dry_run: true,
            ..RotationConfig::default()
        };
        assert!(config.policy(false).dry_run);
    }
}

//! Backup rotation: retention evaluation and deletion across backends.
//!
//! Rotation decides which aged backup files are eligible for deletion while
//! guaranteeing a minimum retained count. The decision logic lives in one
//! pure evaluator shared by every backend, so the filesystem and S3 rotation
//! paths can never drift apart; the orchestrator drives the
//! list → filter → evaluate → delete pipeline per backend and merges the
//! per-backend reports.
//!
//! Nothing here persists between calls: every rotation pass recomputes its
//! view from a fresh backend listing.

mod evaluator;
mod orchestrator;

use chrono::{DateTime, Utc};
pub use evaluator::select_for_deletion;
pub use orchestrator::{RotationError, Rotator};
use serde::Serialize;

/// Retention policy for one rotation invocation. Immutable per call.
#[derive(Debug, Clone, Copy)]
pub struct RetentionPolicy {
    /// Backups younger than `now - window_days` are never touched.
    pub window_days: u32,

    /// Minimum number of deprecated backups that must remain untouched
    /// regardless of age.
    pub min_keep_count: u32,

    /// Upper bound on deletions in one invocation.
    pub max_clean_count: u32,

    /// Simulate deletions: log them and report counts as if executed.
    pub dry_run: bool,
}

/// Outcome of one backend's rotation pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RotationReport {
    /// Total entries seen in the backend before filtering.
    pub initial_count: usize,

    /// Entries older than the cutoff.
    pub deprecated_count: usize,

    /// Entries actually (or, in dry-run, notionally) deleted.
    pub cleaned_count: usize,

    /// Identifiers of deleted entries, oldest first.
    pub cleaned_identifiers: Vec<String>,

    /// Per-entry deletion failures. Rotation continues best-effort past
    /// individual failures and records them here instead of aborting.
    pub failed: Vec<DeleteFailure>,
}

/// One failed deletion within a rotation pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeleteFailure {
    pub identifier: String,
    pub reason: String,
}

/// Combined result of one `rotate` call.
///
/// The remote report is absent (not zero-valued) when no remote backend is
/// configured, so callers can tell "no remote" from "remote had nothing to
/// delete".
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RotationResult {
    pub filesystem: RotationReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote: Option<RotationReport>,
}

/// Injected clock so the cutoff computation is deterministic in tests.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock implementation used in production.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

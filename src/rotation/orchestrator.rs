//! Rotation orchestrator: drives the per-backend pipelines and merges
//! their reports.

use std::{collections::HashSet, sync::Arc};

use chrono::{DateTime, Duration, Utc};
use futures::StreamExt;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::{Clock, DeleteFailure, RetentionPolicy, RotationReport, RotationResult};
use crate::storage::{BackupStore, StorageError};

/// Bound on concurrently issued deletions within one backend's pass.
const DELETE_CONCURRENCY: usize = 4;

/// Errors that can occur during a rotation pass.
#[derive(Debug, Error)]
pub enum RotationError {
    /// The policy is malformed. Raised before any I/O, never retried.
    #[error("Invalid rotation policy: {0}")]
    Validation(String),

    /// Listing or a structural backend failure. Attributed to the backend
    /// that produced it.
    #[error("{backend} backend error: {source}")]
    Backend {
        backend: &'static str,
        source: StorageError,
    },

    /// The caller cancelled the pass. Deletions that already completed stay
    /// deleted and are reported in `completed`; nothing further was issued.
    #[error("Rotation cancelled")]
    Cancelled { completed: RotationResult },
}

/// One backend's pass outcome: the report, plus whether the pass was cut
/// short by cancellation.
enum BackendOutcome {
    Complete(RotationReport),
    Cancelled(RotationReport),
}

impl BackendOutcome {
    fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled(_))
    }

    fn into_report(self) -> RotationReport {
        match self {
            Self::Complete(report) | Self::Cancelled(report) => report,
        }
    }
}

/// Drives one rotation invocation over the configured backends.
///
/// Holds no state between calls: every `rotate` is a fresh pipeline over
/// current backend contents.
pub struct Rotator {
    filesystem: Arc<dyn BackupStore>,
    remote: Option<Arc<dyn BackupStore>>,
    clock: Arc<dyn Clock>,
}

impl Rotator {
    pub fn new(
        filesystem: Arc<dyn BackupStore>,
        remote: Option<Arc<dyn BackupStore>>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            filesystem,
            remote,
            clock,
        }
    }

    /// Run one rotation pass under `policy`.
    ///
    /// The cutoff is computed once and shared by both backends so a single
    /// invocation is internally consistent. The filesystem and remote
    /// pipelines are independent and run concurrently.
    pub async fn rotate(
        &self,
        policy: &RetentionPolicy,
        cancel: &CancellationToken,
    ) -> Result<RotationResult, RotationError> {
        let cutoff = compute_cutoff(self.clock.now(), policy.window_days)?;
        info!(
            cutoff = %cutoff,
            min_keep_count = policy.min_keep_count,
            max_clean_count = policy.max_clean_count,
            dry_run = policy.dry_run,
            "Starting rotation pass"
        );

        let (filesystem, remote) = match &self.remote {
            Some(remote) => {
                let (filesystem, remote) = tokio::join!(
                    rotate_backend(self.filesystem.as_ref(), policy, cutoff, cancel),
                    rotate_backend(remote.as_ref(), policy, cutoff, cancel),
                );
                (filesystem?, Some(remote?))
            }
            None => (
                rotate_backend(self.filesystem.as_ref(), policy, cutoff, cancel).await?,
                None,
            ),
        };

        let cancelled = filesystem.is_cancelled()
            || remote.as_ref().is_some_and(BackendOutcome::is_cancelled);
        let result = RotationResult {
            filesystem: filesystem.into_report(),
            remote: remote.map(BackendOutcome::into_report),
        };

        if cancelled {
            Err(RotationError::Cancelled { completed: result })
        } else {
            Ok(result)
        }
    }
}

/// Cutoff timestamp for deprecation: `now - window_days`.
///
/// This is the fail-fast validation step; it runs before any backend I/O.
fn compute_cutoff(now: DateTime<Utc>, window_days: u32) -> Result<DateTime<Utc>, RotationError> {
    now.checked_sub_signed(Duration::days(i64::from(window_days)))
        .ok_or_else(|| {
            RotationError::Validation(format!(
                "window_days {} puts the cutoff outside the representable time range",
                window_days
            ))
        })
}

/// One backend's list → filter → evaluate → delete pipeline.
async fn rotate_backend(
    store: &dyn BackupStore,
    policy: &RetentionPolicy,
    cutoff: DateTime<Utc>,
    cancel: &CancellationToken,
) -> Result<BackendOutcome, RotationError> {
    let backend = store.backend_name();

    let entries = tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            warn!(backend, "Rotation cancelled before listing");
            return Ok(BackendOutcome::Cancelled(RotationReport::default()));
        }
        listed = store.list() => listed.map_err(|source| RotationError::Backend { backend, source })?,
    };

    let initial_count = entries.len();
    let deprecated: Vec<_> = entries
        .into_iter()
        .filter(|e| e.last_modified < cutoff)
        .collect();
    let deprecated_count = deprecated.len();

    let to_delete = super::select_for_deletion(
        &deprecated,
        policy.min_keep_count as usize,
        policy.max_clean_count as usize,
    );
    debug!(
        backend,
        initial_count,
        deprecated_count,
        selected = to_delete.len(),
        "Evaluated retention policy"
    );

    // Deletions target distinct identifiers with no ordering dependency, so
    // they are issued concurrently. Every delete is awaited: a failure is
    // recorded per entry instead of aborting the batch. Cancellation stops
    // new deletions from being issued; in-flight ones run to completion so
    // the report covers exactly what happened.
    let dry_run = policy.dry_run;
    let outcomes = futures::stream::iter(to_delete.iter().map(|entry| async move {
        let outcome = store.delete(&entry.identifier, dry_run).await;
        (entry.identifier.clone(), outcome)
    }))
    .take_until(cancel.cancelled())
    .buffer_unordered(DELETE_CONCURRENCY)
    .collect::<Vec<_>>()
    .await;

    let mut succeeded: HashSet<String> = HashSet::new();
    let mut failed = Vec::new();
    for (identifier, outcome) in outcomes {
        match outcome {
            Ok(()) => {
                succeeded.insert(identifier);
            }
            Err(e) => {
                error!(backend, identifier = %identifier, error = %e, "Failed to delete backup");
                failed.push(DeleteFailure {
                    identifier,
                    reason: e.to_string(),
                });
            }
        }
    }

    // Completion order of concurrent deletes is arbitrary; report the
    // cleaned identifiers in the evaluator's deterministic oldest-first order.
    let cleaned_identifiers: Vec<String> = to_delete
        .iter()
        .filter(|e| succeeded.contains(&e.identifier))
        .map(|e| e.identifier.clone())
        .collect();

    let report = RotationReport {
        initial_count,
        deprecated_count,
        cleaned_count: cleaned_identifiers.len(),
        cleaned_identifiers,
        failed,
    };

    if cancel.is_cancelled() {
        warn!(
            backend,
            cleaned = report.cleaned_count,
            "Rotation cancelled mid-batch, completed deletions remain deleted"
        );
        Ok(BackendOutcome::Cancelled(report))
    } else {
        info!(
            backend,
            initial_count,
            deprecated_count,
            cleaned = report.cleaned_count,
            failed = report.failed.len(),
            dry_run,
            "Rotation pass complete"
        );
        Ok(BackendOutcome::Complete(report))
    }
}

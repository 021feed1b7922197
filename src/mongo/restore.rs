//! `mongorestore` invocation.

use std::path::{Path, PathBuf};

use tokio::process::Command;
use tracing::{debug, info};

use super::{MongoError, MongoResult, ToolKind, connection_args, dump::format_command};
use crate::config::{DatabaseConfig, RestoreConfig};

/// Result of a successful restore.
#[derive(Debug)]
pub struct RestoreOutcome {
    pub dump_file: PathBuf,
    pub stdout: String,
    pub stderr: String,
}

/// Run `mongorestore` from a gzipped archive.
///
/// Optionally drops target collections first (`--drop`) and deletes the
/// archive after a successful restore.
pub async fn run_restore(
    db: &DatabaseConfig,
    restore: &RestoreConfig,
    dump_file: &Path,
) -> MongoResult<RestoreOutcome> {
    let mut args = connection_args(db, ToolKind::Restore);

    if restore.drop_before_restore {
        args.push("--drop".to_string());
    }
    args.push(format!("--archive={}", dump_file.display()));
    args.push("--gzip".to_string());

    if restore.show_command {
        info!(command = %format_command(&restore.restore_cmd, &args), "Running restore");
    } else {
        debug!(binary = %restore.restore_cmd, file = %dump_file.display(), "Running restore");
    }

    let output = match Command::new(&restore.restore_cmd).args(&args).output().await {
        Ok(output) => output,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(MongoError::CommandNotFound(restore.restore_cmd.clone()));
        }
        Err(e) => return Err(MongoError::Io(e)),
    };

    if !output.status.success() {
        return Err(MongoError::CommandFailed {
            status: output.status.code().unwrap_or(-1),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        });
    }

    if restore.delete_dump_after_restore {
        tokio::fs::remove_file(dump_file).await?;
        debug!(file = %dump_file.display(), "Deleted dump after restore");
    }

    info!(file = %dump_file.display(), "Restore complete");
    Ok(RestoreOutcome {
        dump_file: dump_file.to_path_buf(),
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
    })
}

//! `mongodump` invocation.

use std::path::{Path, PathBuf};

use chrono::Local;
use tokio::process::Command;
use tracing::{debug, info};

use super::{MongoError, MongoResult, ToolKind, collection_args, connection_args, database_name};
use crate::config::{DatabaseConfig, DumpConfig};

/// Result of a successful dump.
#[derive(Debug)]
pub struct DumpOutcome {
    /// Archive file name (basename), reused for remote shipping.
    pub file_name: String,

    /// Full path of the archive on the local filesystem.
    pub full_path: PathBuf,

    pub stdout: String,
    pub stderr: String,
}

/// Run `mongodump` into a gzipped archive under the configured dump path.
///
/// The target directory is created if missing. The archive is named
/// `{database}__{yyyy-mm-dd_HHMMSS}.gz` unless an explicit file name is
/// configured.
pub async fn run_dump(db: &DatabaseConfig, dump: &DumpConfig) -> MongoResult<DumpOutcome> {
    if db.uri.is_none() && db.db.is_none() {
        return Err(MongoError::InvalidOptions(
            "db: database name for dump is required".to_string(),
        ));
    }

    let database = database_name(db)?;

    tokio::fs::create_dir_all(&dump.path).await.map_err(|e| {
        MongoError::InvalidOptions(format!("path: cannot create {}: {}", dump.path, e))
    })?;

    let file_name = dump
        .file_name
        .clone()
        .unwrap_or_else(|| archive_name(&database));
    let full_path = Path::new(&dump.path).join(&file_name);

    let mut args = connection_args(db, ToolKind::Dump);
    args.extend(collection_args(dump));
    args.push(format!("--archive={}", full_path.display()));
    args.push("--gzip".to_string());

    if dump.show_command {
        info!(command = %format_command(&dump.dump_cmd, &args), "Running dump");
    } else {
        debug!(binary = %dump.dump_cmd, database = %database, "Running dump");
    }

    let output = match Command::new(&dump.dump_cmd).args(&args).output().await {
        Ok(output) => output,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(MongoError::CommandNotFound(dump.dump_cmd.clone()));
        }
        Err(e) => return Err(MongoError::Io(e)),
    };

    if !output.status.success() {
        return Err(MongoError::CommandFailed {
            status: output.status.code().unwrap_or(-1),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        });
    }

    info!(database = %database, path = %full_path.display(), "Dump created");
    Ok(DumpOutcome {
        file_name,
        full_path,
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
    })
}

fn archive_name(database: &str) -> String {
    let simplified: String = database
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!(
        "{}__{}.gz",
        simplified,
        Local::now().format("%Y-%m-%d_%H%M%S")
    )
}

pub(super) fn format_command(binary: &str, args: &[String]) -> String {
    format!("{} {}", binary, args.join(" "))
}

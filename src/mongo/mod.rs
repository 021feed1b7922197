//! Wrappers around the `mongodump` and `mongorestore` binaries.
//!
//! These are thin subprocess invocations: the value here is argument
//! formatting from configuration, archive naming, and mapping process
//! outcomes onto a typed error. The archive format itself is opaque
//! (`--archive --gzip` output).

mod args;
mod dump;
mod restore;

pub use args::{ToolKind, collection_args, connection_args, database_name};
pub use dump::{DumpOutcome, run_dump};
pub use restore::{RestoreOutcome, run_restore};
use thiserror::Error;

/// Errors from dump/restore invocations.
#[derive(Debug, Error)]
pub enum MongoError {
    #[error("Invalid options: {0}")]
    InvalidOptions(String),

    #[error("Binary {0} not found")]
    CommandNotFound(String),

    #[error("Command exited with status {status}: {stderr}")]
    CommandFailed { status: i32, stderr: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type MongoResult<T> = Result<T, MongoError>;

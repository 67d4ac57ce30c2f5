//! Error type for store operations.

use std::path::PathBuf;

use carton_model::ContainerKind;
use carton_tables::TableError;
use thiserror::Error;

/// Errors from container store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("container file already exists: {}", .0.display())]
    AlreadyExists(PathBuf),

    #[error("not a container state file: {}", .0.display())]
    NotAContainer(PathBuf),

    #[error("container kind mismatch: expected {expected}, found {found}")]
    KindMismatch {
        expected: ContainerKind,
        found: ContainerKind,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("table error: {0}")]
    Table(#[from] TableError),

    #[error("corrupt state file: {0}")]
    Corrupt(String),

    #[error("path is not valid UTF-8: {}", .0.display())]
    NonUtf8Path(PathBuf),
}

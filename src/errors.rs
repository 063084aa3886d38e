use std::path::PathBuf;
use std::process::ExitCode;
use thiserror::Error;

/// Why a selection string was rejected. The operator is re-prompted on any of these.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SelectionError {
    #[error("Invalid range: {0}")]
    InvalidRange(String),

    #[error("Number out of range: {0}")]
    OutOfRange(i64),

    #[error("Not a number: '{0}'")]
    NotANumber(String),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("Cannot connect to MySQL server {target}: {source}")]
    Connection {
        target: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("Invalid selection: {0}")]
    Selection(#[from] SelectionError),

    #[error("Invalid database name '{name}': {reason}")]
    InvalidDatabaseName { name: String, reason: &'static str },

    #[error("{tool} not found in PATH. {hint}")]
    ToolMissing { tool: &'static str, hint: &'static str },

    #[error("Failed to create archive {}: {source}", archive.display())]
    Packaging {
        archive: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Backup file {} not found", .0.display())]
    ArchiveNotFound(PathBuf),

    #[error("Failed to extract archive {}: {source}", archive.display())]
    Extraction {
        archive: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No SQL files found in backup {}", .0.display())]
    NoDumpFilesFound(PathBuf),

    #[error("Backup operation failed: {0}")]
    Backup(String),

    #[error("Restore operation failed: {0}")]
    Restore(String),

    #[error("Operation cancelled: {0}")]
    Cancelled(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl AppError {
    /// Cancellation has its own exit status so scripts can tell it apart from failure.
    pub fn exit_code(&self) -> ExitCode {
        match self {
            AppError::Cancelled(_) => ExitCode::from(2),
            _ => ExitCode::FAILURE,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, AppError::Cancelled(_))
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

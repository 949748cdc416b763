use thiserror::Error;

/// Typed error hierarchy for ConstellationFS.
///
/// Used at every public boundary (backend construction, workspace operations,
/// command execution, adapter handlers). Internal/leaf functions can use
/// `anyhow::Result`; `FsError::other` converts at the boundary.
#[derive(Debug, Error)]
pub enum FsError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Missing required utilities: {0}")]
    MissingUtilities(String),

    #[error("Command cannot be empty")]
    EmptyCommand,

    #[error("Path cannot be empty")]
    EmptyPath,

    #[error("Absolute paths are not allowed: {0}")]
    AbsolutePathRejected(String),

    #[error("Path escapes workspace: {0}")]
    PathEscape(String),

    #[error("Symlink resolves outside workspace: {0}")]
    SymlinkEscape(String),

    #[error("{reason}")]
    DangerousOperation {
        reason: String,
        command: Option<String>,
    },

    #[error("Command failed with exit code {exit_code}: {message}")]
    ExecutionFailed {
        exit_code: i32,
        message: String,
        command: Option<String>,
    },

    #[error("Failed to execute command: {0}")]
    ExecutionError(String),

    #[error("Read failed: {0}")]
    ReadFailed(String),

    #[error("Write failed: {0}")]
    WriteFailed(String),

    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    #[error("Backend not implemented: {0}")]
    BackendNotImplemented(String),
}

/// Convenience alias for results using `FsError`.
pub type FsResult<T> = std::result::Result<T, FsError>;

impl FsError {
    /// Stable machine-readable code for this error, surfaced to SDK adapters.
    pub fn code(&self) -> &'static str {
        match self {
            FsError::InvalidConfiguration(_) => "INVALID_CONFIGURATION",
            FsError::MissingUtilities(_) => "MISSING_UTILITIES",
            FsError::EmptyCommand => "EMPTY_COMMAND",
            FsError::EmptyPath => "EMPTY_PATH",
            FsError::AbsolutePathRejected(_) => "ABSOLUTE_PATH_REJECTED",
            // Symlink escapes share the path-escape code; the kind stays
            // distinct so callers can tell the two apart.
            FsError::PathEscape(_) | FsError::SymlinkEscape(_) => "PATH_ESCAPE_ATTEMPT",
            FsError::DangerousOperation { .. } => "DANGEROUS_OPERATION",
            FsError::ExecutionFailed { .. } => "EXEC_FAILED",
            FsError::ExecutionError(_) => "EXEC_ERROR",
            FsError::ReadFailed(_) => "READ_FAILED",
            FsError::WriteFailed(_) => "WRITE_FAILED",
            FsError::UnsupportedOperation(_) => "UNSUPPORTED_OPERATION",
            FsError::BackendNotImplemented(_) => "BACKEND_NOT_IMPLEMENTED",
        }
    }

    /// The command that triggered this error, if any.
    pub fn command(&self) -> Option<&str> {
        match self {
            FsError::DangerousOperation { command, .. }
            | FsError::ExecutionFailed { command, .. } => command.as_deref(),
            _ => None,
        }
    }

    /// Wrap an already-typed error untouched; anything else becomes
    /// `ExecutionError`. Prevents double-wrapping at the executor boundary.
    pub fn from_exec(err: anyhow::Error) -> FsError {
        match err.downcast::<FsError>() {
            Ok(fs) => fs,
            Err(other) => FsError::ExecutionError(other.to_string()),
        }
    }
}

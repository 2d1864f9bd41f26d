use std::path::PathBuf;
use std::process::ExitStatus;

/// Reasons a `git status --porcelain` record could not be turned into a change entry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StatusParseError {
    #[error("record is not of the form `XY PATH`")]
    Malformed,

    #[error("rename record must contain exactly one ` -> ` marker")]
    AmbiguousRename,

    #[error("quoted path contains escape sequences, which are not supported")]
    EscapedPath,
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Git command failed: {0}")]
    GitCommandError(String),

    #[error("Not a git repository: {}", .0.display())]
    NotARepository(PathBuf),

    #[error("TOC tool `{tool}` was not found on PATH")]
    ToolNotFound { tool: String },

    #[error("Failed to start TOC tool `{tool}`: {source}")]
    ToolSpawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("TOC tool `{tool}` failed on {path} ({status})")]
    ToolFailed {
        tool: String,
        path: String,
        status: ExitStatus,
    },

    #[error("Cannot parse status line {line:?}: {reason}")]
    StatusParse {
        line: String,
        reason: StatusParseError,
    },

    #[error("A pre-commit hook already exists at {} (use --force to replace it)", .0.display())]
    HookExists(PathBuf),

    #[error("Interrupted")]
    Interrupted,
}

impl Error {
    /// Process exit code for this error.
    ///
    /// A failing TOC tool propagates its own exit code (or `128 + signal` when
    /// it was killed); an interrupt maps to 130; everything else is 1.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ToolFailed { status, .. } => exit_code_of(*status),
            Self::Interrupted => 130,
            _ => 1,
        }
    }
}

fn exit_code_of(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return if code == 0 { 1 } else { code };
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    1
}

pub type Result<T> = std::result::Result<T, Error>;

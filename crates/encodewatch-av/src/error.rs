//! Error types for encodewatch-av.

use std::path::PathBuf;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while preparing, running, or tailing a job.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The job was given an empty input path.
    #[error("input path missing")]
    InputMissing,

    /// The input path does not exist.
    #[error("input file not found: {}", path.display())]
    InputNotFound { path: PathBuf },

    /// The metadata prober failed or produced unparsable output.
    #[error("probe failed ({}): {message}, output: {output}", .command.join(" "))]
    ProbeFailed {
        command: Vec<String>,
        message: String,
        output: String,
    },

    /// The engine could not be spawned.
    #[error("failed to start: {}, {message}, {output}", .args.join(" "))]
    ProcessStartFailed {
        args: Vec<String>,
        message: String,
        output: String,
    },

    /// The engine exited unsuccessfully or could not be waited on.
    #[error("failed to finish: {}, {message}, {output}", .args.join(" "))]
    ProcessRunFailed {
        args: Vec<String>,
        message: String,
        output: String,
    },

    /// The engine's stderr could not be attached; progress is unavailable.
    #[error("progress not available: {message}")]
    StreamAttachFailed { message: String },

    /// A required external tool is not available.
    #[error("tool not found: {tool}")]
    ToolNotFound { tool: String },

    /// The diagnostic stream produced more than `max` bytes without a token boundary.
    #[error("diagnostic token exceeds {max} bytes")]
    TokenTooLong { max: usize },

    /// The supervising task went away without reporting a result.
    #[error("job supervisor exited without reporting a result")]
    CompletionLost,

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a tool not found error.
    pub fn tool_not_found(tool: impl Into<String>) -> Self {
        Self::ToolNotFound { tool: tool.into() }
    }

    /// Create an input not found error.
    pub fn input_not_found(path: impl Into<PathBuf>) -> Self {
        Self::InputNotFound { path: path.into() }
    }

    /// Create a probe failure.
    pub fn probe_failed(
        command: Vec<String>,
        message: impl Into<String>,
        output: impl Into<String>,
    ) -> Self {
        Self::ProbeFailed {
            command,
            message: message.into(),
            output: output.into(),
        }
    }

    /// Arguments of the engine or probe invocation that failed.
    pub fn command_args(&self) -> Option<&[String]> {
        match self {
            Self::ProbeFailed { command, .. } => Some(command),
            Self::ProcessStartFailed { args, .. } | Self::ProcessRunFailed { args, .. } => {
                Some(args)
            }
            _ => None,
        }
    }

    /// Output buffered from the failed invocation.
    pub fn captured_output(&self) -> Option<&str> {
        match self {
            Self::ProbeFailed { output, .. }
            | Self::ProcessStartFailed { output, .. }
            | Self::ProcessRunFailed { output, .. } => Some(output),
            _ => None,
        }
    }
}

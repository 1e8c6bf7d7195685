use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum NcmError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Format error: {0}")]
    Format(String),

    #[error("Padding error: {0}")]
    Padding(String),

    #[error("Metadata error: {0}")]
    Metadata(String),

    #[error("{program} exited with {status}: {stderr}")]
    ExternalTool {
        program: String,
        status: String,
        stderr: String,
    },
}

/// Coarse classification reported per failed job.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Io,
    Format,
    Padding,
    Metadata,
    ExternalTool,
}

impl NcmError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            NcmError::Io(_) => ErrorKind::Io,
            NcmError::Format(_) => ErrorKind::Format,
            NcmError::Padding(_) => ErrorKind::Padding,
            NcmError::Metadata(_) => ErrorKind::Metadata,
            NcmError::ExternalTool { .. } => ErrorKind::ExternalTool,
        }
    }

    pub(crate) fn format(msg: impl Into<String>) -> Self {
        NcmError::Format(msg.into())
    }

    pub(crate) fn metadata(msg: impl Into<String>) -> Self {
        NcmError::Metadata(msg.into())
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ErrorKind::Io => "io",
            ErrorKind::Format => "format",
            ErrorKind::Padding => "padding",
            ErrorKind::Metadata => "metadata",
            ErrorKind::ExternalTool => "external_tool",
        };
        f.write_str(s)
    }
}

// Convenient crate-wide result type
pub type Result<T> = std::result::Result<T, NcmError>;

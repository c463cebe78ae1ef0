use std::path::PathBuf;
use thiserror::Error;

/// Unified error type for long-translate-core
///
/// This enum covers every way a translation invocation can fail short of
/// timing out or being cancelled:
/// - File selection and payload encoding
/// - Job submission and result polling against the translation service
/// - Configuration loading and validation
/// - Exporting a finished translation
#[derive(Error, Debug)]
pub enum Error {
    // ==========================================================================
    // Selection Errors
    // ==========================================================================
    /// Translation was requested before any file was picked
    #[error("no file selected")]
    NoFileSelected,

    // ==========================================================================
    // Encoding Errors
    // ==========================================================================
    /// File extension is not one of txt, pdf, docx
    #[error("unsupported file type: {}", if extension.is_empty() { "<none>" } else { extension.as_str() })]
    UnsupportedFileType { extension: String },

    /// Reading the source file failed
    #[error("failed to read {}: {cause}", path.display())]
    ReadError {
        path: PathBuf,
        #[source]
        cause: std::io::Error,
    },

    // ==========================================================================
    // Service Errors
    // ==========================================================================
    /// Submit endpoint answered with a non-200 status
    #[error("translation service rejected the request: HTTP {status}: {body}")]
    ServiceRejected { status: u16, body: String },

    /// No response was received from the service
    #[error("transport error: {0}")]
    Transport(String),

    /// A 200 response whose body could not be read
    #[error("invalid translation service response: {0}")]
    InvalidResponse(String),

    /// Result endpoint answered with a status the strict poll policy treats as fatal
    #[error("polling failed: HTTP {status}: {body}")]
    PollError { status: u16, body: String },

    /// The HTTP client could not be constructed
    #[error("failed to create HTTP client: {0}")]
    HttpClient(String),

    // ==========================================================================
    // Configuration Errors
    // ==========================================================================
    /// Failed to load configuration file
    #[error("failed to load config: {0}")]
    ConfigLoad(String),

    /// Invalid configuration value
    #[error("invalid config value for '{field}': {reason}")]
    ConfigInvalid { field: String, reason: String },

    // ==========================================================================
    // Export Errors
    // ==========================================================================
    /// Writing a finished translation to disk failed
    #[error("failed to export translation to {}: {cause}", path.display())]
    Export {
        path: PathBuf,
        #[source]
        cause: std::io::Error,
    },
}

impl Error {
    /// Map a reqwest failure that produced no usable response.
    pub(crate) fn transport(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Transport(format!("request timed out: {err}"))
        } else {
            Self::Transport(err.to_string())
        }
    }

    /// HTTP status carried by this error, if any.
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::ServiceRejected { status, .. } | Self::PollError { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

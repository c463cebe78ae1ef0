use crate::error::Error;
use crate::service::JobHandle;

/// Terminal result of one translation invocation.
#[derive(Debug)]
pub enum TranslationOutcome {
    /// The service returned the translated text
    Completed { text: String },
    /// Encoding, submission or (under strict policy) polling failed
    Failed { reason: Error },
    /// The retry budget ran out while the job was still pending
    TimedOut { attempts: u32 },
    /// The caller cancelled the poll sequence
    Cancelled { attempts: u32 },
}

impl TranslationOutcome {
    pub const fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }

    /// Translated text, if completed.
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Completed { text } => Some(text),
            _ => None,
        }
    }

    /// Convert into a `Result`, folding timeouts and cancellation into a message.
    pub fn into_text(self) -> Result<String, String> {
        match self {
            Self::Completed { text } => Ok(text),
            other => Err(other.to_string()),
        }
    }
}

impl std::fmt::Display for TranslationOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Completed { text } => write!(f, "translation completed ({} chars)", text.chars().count()),
            Self::Failed { reason } => write!(f, "translation failed: {reason}"),
            Self::TimedOut { attempts } => write!(f, "translation timed out after {attempts} attempts"),
            Self::Cancelled { attempts } => write!(f, "translation cancelled after {attempts} attempts"),
        }
    }
}

/// Progress notifications for a busy indicator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Progress {
    Encoding,
    Submitting,
    Submitted { handle: JobHandle },
    /// The job was not ready; `attempt` queries have been made so far
    Waiting { attempt: u32, max_retries: u32 },
    Finished,
}

/// Progress callback
pub type ProgressFn = dyn Fn(Progress) + Send + Sync;

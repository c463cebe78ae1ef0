use async_trait::async_trait;

use crate::error::Result;
use crate::payload::EncodedPayload;

/// Opaque identifier of a submitted translation job.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JobHandle(String);

impl JobHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for JobHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Final translated text of a completed job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslatedText(String);

impl TranslatedText {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

/// One submission: encoded content plus the target language as sent on the wire.
#[derive(Debug, Clone)]
pub struct TranslationRequest {
    pub payload: EncodedPayload,
    pub language: String,
}

/// Answer of one result query that reached the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultStatus {
    /// HTTP 200
    Ready(TranslatedText),
    /// HTTP 404, job still running
    NotReady,
    /// Any other status
    Unexpected { status: u16, body: String },
}

/// Trait for translation job backends
#[async_trait]
pub trait JobService: Send + Sync {
    /// Backend name for logs
    fn name(&self) -> &'static str;

    /// Submit a job. Exactly one request, no retry.
    async fn submit(&self, request: &TranslationRequest) -> Result<JobHandle>;

    /// Query a job once.
    ///
    /// `Err` means no readable answer: a transport failure, or a 200 whose
    /// body is not a result.
    async fn fetch_result(&self, handle: &JobHandle) -> Result<ResultStatus>;
}

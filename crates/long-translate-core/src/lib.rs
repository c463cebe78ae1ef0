//! Long Translate Core Library
//!
//! Client for a long-running document translation service:
//! - Payload encoding (plain text, base64 data URLs for PDF/DOCX)
//! - Job submission over HTTP + JSON
//! - Bounded, fixed-delay result polling with cancellation
//! - Saving finished translations to disk

pub mod config;
pub mod error;
pub mod export;
pub mod outcome;
pub mod payload;
pub mod poller;
pub mod service;
pub mod util;

pub use config::{
    AppConfig, ExportConfig, Lang, LanguageFormat, LanguageOption, PollConfig, PollPolicy,
    ServiceConfig, target_languages, DEFAULT_API_BASE, DEFAULT_TARGET_LANG, DEFAULT_USER_TOKEN,
};
pub use error::{Error, Result};
pub use export::save_to_file;
pub use outcome::{Progress, ProgressFn, TranslationOutcome};
pub use payload::{EncodedPayload, FileKind, PayloadKind, SourceFile, encode};
pub use poller::Poller;
pub use service::{
    HttpJobService, JobHandle, JobService, ResultStatus, TranslatedText, TranslationRequest,
    create_service,
};
pub use tokio_util::sync::CancellationToken;

use std::sync::Arc;
use tracing::{Instrument, error, info, info_span, warn};
use uuid::Uuid;

/// Single entry point: encode, submit, poll.
///
/// Holds no per-invocation state, so one client can serve overlapping
/// `translate` calls; each call gets its own job handle and retry counter.
pub struct TranslationClient {
    service: Arc<dyn JobService>,
    poller: Poller,
    language_format: LanguageFormat,
}

impl TranslationClient {
    /// Create a client talking HTTP to the configured service
    pub fn new(config: &AppConfig) -> Result<Self> {
        let service = create_service(&config.service)?;
        Ok(Self::with_service(service, config))
    }

    /// Create with a custom job service
    pub fn with_service(service: Arc<dyn JobService>, config: &AppConfig) -> Self {
        let poller = Poller::new(Arc::clone(&service), config.poll.clone());
        Self {
            service,
            poller,
            language_format: config.service.language_format,
        }
    }

    /// Translate a selected file into `target`.
    ///
    /// `None` means the user has not picked a file yet.
    pub async fn translate(&self, file: Option<&SourceFile>, target: &Lang) -> TranslationOutcome {
        self.translate_with(file, target, &CancellationToken::new(), None)
            .await
    }

    /// Translate with cancellation and progress reporting.
    ///
    /// `Progress::Finished` is reported exactly once, whatever the outcome.
    pub async fn translate_with(
        &self,
        file: Option<&SourceFile>,
        target: &Lang,
        cancel: &CancellationToken,
        progress: Option<&ProgressFn>,
    ) -> TranslationOutcome {
        let span = info_span!("translate", invocation = %Uuid::new_v4());
        let outcome = self
            .run(file, target, cancel, progress)
            .instrument(span)
            .await;

        if let Some(report) = progress {
            report(Progress::Finished);
        }
        outcome
    }

    async fn run(
        &self,
        file: Option<&SourceFile>,
        target: &Lang,
        cancel: &CancellationToken,
        progress: Option<&ProgressFn>,
    ) -> TranslationOutcome {
        let report = |p: Progress| {
            if let Some(report) = progress {
                report(p);
            }
        };

        let Some(file) = file else {
            warn!("Translation requested without a selected file");
            return TranslationOutcome::Failed {
                reason: Error::NoFileSelected,
            };
        };

        report(Progress::Encoding);
        let payload = match payload::encode(file).await {
            Ok(payload) => payload,
            Err(reason) => {
                error!("Failed to encode {}: {}", file.name(), reason);
                return TranslationOutcome::Failed { reason };
            }
        };

        let request = TranslationRequest {
            language: target.wire_value(self.language_format),
            payload,
        };

        report(Progress::Submitting);
        info!(
            "Submitting {} ({} chars) to {} for '{}'",
            file.name(),
            request.payload.content.len(),
            self.service.name(),
            request.language
        );
        let submitted = tokio::select! {
            biased;
            () = cancel.cancelled() => {
                info!("Translation cancelled before the job was accepted");
                return TranslationOutcome::Cancelled { attempts: 0 };
            }
            submitted = self.service.submit(&request) => submitted,
        };
        let handle = match submitted {
            Ok(handle) => handle,
            Err(reason) => {
                error!("Translation request failed: {}", reason);
                return TranslationOutcome::Failed { reason };
            }
        };

        info!("Submitted job {}", handle);
        report(Progress::Submitted {
            handle: handle.clone(),
        });

        self.poller.poll_with(handle, cancel, progress).await
    }

    pub const fn poll_config(&self) -> &PollConfig {
        self.poller.config()
    }

    pub fn service_name(&self) -> &'static str {
        self.service.name()
    }
}

//! Result polling for submitted translation jobs.
//!
//! One poll sequence is a small state machine driven by an explicit
//! `PollAttempt` value:
//!
//! ```text
//! Querying --200--> Completed
//!    |  \--404 / transient--> WaitingToRetry --budget left--> (delay) Querying
//!    |                             \--budget spent--> TimedOut
//!    \--fatal (strict policy, unreadable 200)--> Failed
//! ```
//!
//! Requests are strictly serialized and separated by a fixed delay. A
//! [`CancellationToken`] is raced against every query and every delay.

use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::{PollConfig, PollPolicy};
use crate::error::Error;
use crate::outcome::{Progress, ProgressFn, TranslationOutcome};
use crate::service::{JobHandle, JobService, ResultStatus, TranslatedText};

/// Retry counter of a single poll sequence.
#[derive(Debug, Clone)]
struct PollAttempt {
    handle: JobHandle,
    /// Queries that came back without a result so far
    attempt: u32,
    max_retries: u32,
    delay: Duration,
}

impl PollAttempt {
    fn new(handle: JobHandle, config: &PollConfig) -> Self {
        Self {
            handle,
            attempt: 0,
            max_retries: config.max_retries,
            delay: config.delay(),
        }
    }

    const fn advance(&mut self) {
        self.attempt = self.attempt.saturating_add(1);
    }

    const fn exhausted(&self) -> bool {
        self.attempt >= self.max_retries
    }
}

#[derive(Debug)]
enum PollState {
    Querying,
    WaitingToRetry,
    Completed(TranslatedText),
    Failed(Error),
    TimedOut,
    Cancelled,
}

/// Polls the result endpoint of a [`JobService`].
pub struct Poller {
    service: Arc<dyn JobService>,
    config: PollConfig,
}

impl Poller {
    pub fn new(service: Arc<dyn JobService>, config: PollConfig) -> Self {
        Self { service, config }
    }

    pub const fn config(&self) -> &PollConfig {
        &self.config
    }

    /// Poll until the job completes, fails or the retry budget runs out.
    pub async fn poll(&self, handle: JobHandle) -> TranslationOutcome {
        self.poll_with(handle, &CancellationToken::new(), None).await
    }

    /// Poll with cancellation and progress reporting.
    pub async fn poll_with(
        &self,
        handle: JobHandle,
        cancel: &CancellationToken,
        progress: Option<&ProgressFn>,
    ) -> TranslationOutcome {
        let mut attempt = PollAttempt::new(handle, &self.config);
        let mut state = PollState::Querying;

        loop {
            state = match state {
                PollState::Querying => self.query(&attempt, cancel).await,
                PollState::WaitingToRetry => Self::wait(&mut attempt, cancel, progress).await,
                PollState::Completed(text) => {
                    info!("Job {} completed after {} pending attempts", attempt.handle, attempt.attempt);
                    return TranslationOutcome::Completed {
                        text: text.into_string(),
                    };
                }
                PollState::Failed(reason) => {
                    error!("Polling job {} failed: {}", attempt.handle, reason);
                    return TranslationOutcome::Failed { reason };
                }
                PollState::TimedOut => {
                    error!(
                        "Job {} timed out: exceeded maximum retries {}",
                        attempt.handle, attempt.max_retries
                    );
                    return TranslationOutcome::TimedOut {
                        attempts: attempt.attempt,
                    };
                }
                PollState::Cancelled => {
                    info!("Polling job {} cancelled after {} attempts", attempt.handle, attempt.attempt);
                    return TranslationOutcome::Cancelled {
                        attempts: attempt.attempt,
                    };
                }
            };
        }
    }

    async fn query(&self, attempt: &PollAttempt, cancel: &CancellationToken) -> PollState {
        debug!(
            "Polling job {} (attempt {}/{})",
            attempt.handle,
            attempt.attempt + 1,
            attempt.max_retries
        );

        // An in-flight request is dropped on cancellation
        let answer = tokio::select! {
            biased;
            () = cancel.cancelled() => return PollState::Cancelled,
            answer = self.service.fetch_result(&attempt.handle) => answer,
        };

        match answer {
            Ok(ResultStatus::Ready(text)) => PollState::Completed(text),
            Ok(ResultStatus::NotReady) => {
                debug!(
                    "Translation in progress, retries: {}/{}",
                    attempt.attempt + 1,
                    attempt.max_retries
                );
                PollState::WaitingToRetry
            }
            Ok(ResultStatus::Unexpected { status, body }) => match self.config.policy {
                PollPolicy::Lenient => {
                    warn!("Result request failed with HTTP {}: {}", status, body);
                    PollState::WaitingToRetry
                }
                PollPolicy::Strict => PollState::Failed(Error::PollError { status, body }),
            },
            Err(e @ Error::InvalidResponse(_)) => PollState::Failed(e),
            Err(e) => {
                warn!("Result request failed: {}", e);
                PollState::WaitingToRetry
            }
        }
    }

    async fn wait(
        attempt: &mut PollAttempt,
        cancel: &CancellationToken,
        progress: Option<&ProgressFn>,
    ) -> PollState {
        attempt.advance();
        if attempt.exhausted() {
            return PollState::TimedOut;
        }

        if let Some(report) = progress {
            report(Progress::Waiting {
                attempt: attempt.attempt,
                max_retries: attempt.max_retries,
            });
        }

        tokio::select! {
            biased;
            () = cancel.cancelled() => PollState::Cancelled,
            () = tokio::time::sleep(attempt.delay) => PollState::Querying,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::service::TranslationRequest;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Replays scripted result answers, then reports "not ready" forever.
    struct ScriptedService {
        answers: Mutex<VecDeque<Result<ResultStatus>>>,
        calls: AtomicU32,
    }

    impl ScriptedService {
        fn new(answers: Vec<Result<ResultStatus>>) -> Arc<Self> {
            Arc::new(Self {
                answers: Mutex::new(answers.into()),
                calls: AtomicU32::new(0),
            })
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl JobService for ScriptedService {
        fn name(&self) -> &'static str {
            "scripted"
        }

        async fn submit(&self, _request: &TranslationRequest) -> Result<JobHandle> {
            Ok(JobHandle::new("unused"))
        }

        async fn fetch_result(&self, _handle: &JobHandle) -> Result<ResultStatus> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.answers
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Ok(ResultStatus::NotReady))
        }
    }

    fn ready(text: &str) -> Result<ResultStatus> {
        Ok(ResultStatus::Ready(TranslatedText::new(text)))
    }

    fn unexpected(status: u16) -> Result<ResultStatus> {
        Ok(ResultStatus::Unexpected {
            status,
            body: "error".to_string(),
        })
    }

    fn poller(service: &Arc<ScriptedService>, max_retries: u32, policy: PollPolicy) -> Poller {
        let config = PollConfig {
            max_retries,
            delay_ms: 1,
            policy,
        };
        Poller::new(Arc::clone(service) as Arc<dyn JobService>, config)
    }

    #[tokio::test]
    async fn test_completes_after_pending() {
        let service = ScriptedService::new(vec![
            Ok(ResultStatus::NotReady),
            Ok(ResultStatus::NotReady),
            ready("bonjour"),
        ]);

        let outcome = poller(&service, 60, PollPolicy::Lenient)
            .poll(JobHandle::new("abc123"))
            .await;

        assert_eq!(outcome.text(), Some("bonjour"));
        assert_eq!(service.calls(), 3);
    }

    #[tokio::test]
    async fn test_first_answer_ready_makes_one_request() {
        let service = ScriptedService::new(vec![ready("done")]);
        let outcome = poller(&service, 60, PollPolicy::Lenient).poll(JobHandle::new("h")).await;
        assert!(outcome.is_completed());
        assert_eq!(service.calls(), 1);
    }

    #[tokio::test]
    async fn test_ready_on_last_allowed_attempt() {
        let service = ScriptedService::new(vec![
            Ok(ResultStatus::NotReady),
            Ok(ResultStatus::NotReady),
            ready("late"),
        ]);
        let outcome = poller(&service, 3, PollPolicy::Lenient).poll(JobHandle::new("h")).await;
        assert_eq!(outcome.text(), Some("late"));
        assert_eq!(service.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_permanent_404_times_out_with_fixed_delay() {
        let service = ScriptedService::new(Vec::new());
        let config = PollConfig::new(60, 5_000);
        let poller = Poller::new(Arc::clone(&service) as Arc<dyn JobService>, config);

        let started = tokio::time::Instant::now();
        let outcome = poller.poll(JobHandle::new("h")).await;
        let elapsed = started.elapsed();

        assert!(matches!(outcome, TranslationOutcome::TimedOut { attempts: 60 }));
        assert_eq!(service.calls(), 60);
        // 59 delays between 60 requests, none after the last one
        assert!(elapsed >= Duration::from_secs(59 * 5), "elapsed {elapsed:?}");
        assert!(elapsed < Duration::from_secs(60 * 5), "elapsed {elapsed:?}");
    }

    #[tokio::test]
    async fn test_zero_budget_still_queries_once() {
        let service = ScriptedService::new(Vec::new());
        let outcome = poller(&service, 0, PollPolicy::Lenient).poll(JobHandle::new("h")).await;
        assert!(matches!(outcome, TranslationOutcome::TimedOut { attempts: 1 }));
        assert_eq!(service.calls(), 1);
    }

    #[tokio::test]
    async fn test_lenient_retries_errors_and_transport_failures() {
        let service = ScriptedService::new(vec![
            unexpected(500),
            Err(Error::Transport("connection reset".to_string())),
            ready("ok"),
        ]);
        let outcome = poller(&service, 10, PollPolicy::Lenient).poll(JobHandle::new("h")).await;
        assert_eq!(outcome.text(), Some("ok"));
        assert_eq!(service.calls(), 3);
    }

    #[tokio::test]
    async fn test_lenient_errors_still_bounded() {
        let service = ScriptedService::new((0..10).map(|_| unexpected(502)).collect());
        let outcome = poller(&service, 4, PollPolicy::Lenient).poll(JobHandle::new("h")).await;
        assert!(matches!(outcome, TranslationOutcome::TimedOut { attempts: 4 }));
        assert_eq!(service.calls(), 4);
    }

    #[tokio::test]
    async fn test_strict_policy_fails_on_unexpected_status() {
        let service = ScriptedService::new(vec![unexpected(500), ready("never")]);
        let outcome = poller(&service, 10, PollPolicy::Strict).poll(JobHandle::new("h")).await;

        match outcome {
            TranslationOutcome::Failed {
                reason: Error::PollError { status, .. },
            } => assert_eq!(status, 500),
            other => panic!("expected PollError, got {other:?}"),
        }
        assert_eq!(service.calls(), 1);
    }

    #[tokio::test]
    async fn test_strict_policy_keeps_404_and_transport_transient() {
        let service = ScriptedService::new(vec![
            Ok(ResultStatus::NotReady),
            Err(Error::Transport("timeout".to_string())),
            ready("ok"),
        ]);
        let outcome = poller(&service, 10, PollPolicy::Strict).poll(JobHandle::new("h")).await;
        assert_eq!(outcome.text(), Some("ok"));
    }

    #[tokio::test]
    async fn test_unreadable_result_is_terminal() {
        let service = ScriptedService::new(vec![Err(Error::InvalidResponse("bad json".to_string()))]);
        let outcome = poller(&service, 10, PollPolicy::Lenient).poll(JobHandle::new("h")).await;
        assert!(matches!(
            outcome,
            TranslationOutcome::Failed { reason: Error::InvalidResponse(_) }
        ));
        assert_eq!(service.calls(), 1);
    }

    #[tokio::test]
    async fn test_pre_cancelled_token_makes_no_request() {
        let service = ScriptedService::new(vec![ready("never")]);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let outcome = poller(&service, 10, PollPolicy::Lenient)
            .poll_with(JobHandle::new("h"), &cancel, None)
            .await;
        assert!(matches!(outcome, TranslationOutcome::Cancelled { attempts: 0 }));
        assert_eq!(service.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_during_delay_stops_promptly() {
        let service = ScriptedService::new(Vec::new());
        let poller = Poller::new(
            Arc::clone(&service) as Arc<dyn JobService>,
            PollConfig::new(60, 10_000),
        );
        let cancel = CancellationToken::new();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            trigger.cancel();
        });

        let started = tokio::time::Instant::now();
        let outcome = poller.poll_with(JobHandle::new("h"), &cancel, None).await;

        assert!(matches!(outcome, TranslationOutcome::Cancelled { attempts: 1 }));
        assert_eq!(service.calls(), 1);
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    /// Result queries hang for a minute, like a request waiting on its timeout.
    struct StalledService {
        calls: AtomicU32,
    }

    #[async_trait]
    impl JobService for StalledService {
        fn name(&self) -> &'static str {
            "stalled"
        }

        async fn submit(&self, _request: &TranslationRequest) -> Result<JobHandle> {
            Ok(JobHandle::new("unused"))
        }

        async fn fetch_result(&self, _handle: &JobHandle) -> Result<ResultStatus> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(ResultStatus::Ready(TranslatedText::new("too late")))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_during_query_stops_promptly() {
        let service = Arc::new(StalledService {
            calls: AtomicU32::new(0),
        });
        let poller = Poller::new(
            Arc::clone(&service) as Arc<dyn JobService>,
            PollConfig::new(60, 10_000),
        );
        let cancel = CancellationToken::new();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            trigger.cancel();
        });

        let started = tokio::time::Instant::now();
        let outcome = poller.poll_with(JobHandle::new("h"), &cancel, None).await;

        assert!(matches!(outcome, TranslationOutcome::Cancelled { attempts: 0 }));
        assert_eq!(service.calls.load(Ordering::SeqCst), 1);
        assert!(started.elapsed() < Duration::from_secs(2), "elapsed {:?}", started.elapsed());
    }

    #[tokio::test]
    async fn test_progress_reports_each_wait() {
        let service = ScriptedService::new(vec![
            Ok(ResultStatus::NotReady),
            unexpected(500),
            ready("ok"),
        ]);
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        let report = move |p: Progress| sink.lock().unwrap().push(p);

        let outcome = poller(&service, 5, PollPolicy::Lenient)
            .poll_with(JobHandle::new("h"), &CancellationToken::new(), Some(&report))
            .await;

        assert!(outcome.is_completed());
        assert_eq!(
            *events.lock().unwrap(),
            vec![
                Progress::Waiting { attempt: 1, max_retries: 5 },
                Progress::Waiting { attempt: 2, max_retries: 5 },
            ]
        );
    }
}

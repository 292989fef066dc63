use std::time::Duration;
use thiserror::Error;

use crate::error::AppError;
use crate::metrics::GENERATION_ATTEMPTS_TOTAL;
use crate::models::{ErrorClass, GenerationAttempt, Language, Task};
use crate::services::generative::{extract_text, GenerativeBackend, UpstreamError};
use crate::utils::backoff::BackoffSchedule;

/// Ordered model candidates plus the per-candidate retry schedule.
#[derive(Debug, Clone)]
pub struct DispatchPolicy {
    pub candidates: Vec<String>,
    pub backoff: BackoffSchedule,
}

impl DispatchPolicy {
    pub fn new(candidates: Vec<String>, backoff: BackoffSchedule) -> Self {
        Self {
            candidates,
            backoff,
        }
    }

    /// Worst-case time spent sleeping across every candidate.
    pub fn max_total_wait(&self) -> Duration {
        self.backoff.total_wait() * self.candidates.len() as u32
    }
}

#[derive(Debug, Clone)]
pub struct Dispatched {
    pub text: String,
    pub model_used: String,
    pub attempts: Vec<GenerationAttempt>,
}

#[derive(Debug, Clone, Error)]
#[error("All model candidates exhausted: {last}")]
pub struct DispatchError {
    pub last: UpstreamError,
    pub attempts: Vec<GenerationAttempt>,
}

impl DispatchError {
    pub fn is_overloaded(&self) -> bool {
        self.last.class() == ErrorClass::Overloaded
    }

    pub fn into_app_error(self, task: Task, language: Language) -> AppError {
        let overloaded = self.is_overloaded();
        let details = self.last.message;
        if overloaded {
            AppError::ServiceUnavailable {
                task,
                language,
                details,
            }
        } else {
            AppError::UpstreamFailure {
                task,
                language,
                details,
            }
        }
    }
}

/// Sequential model fallback with bounded retries on overload.
pub struct Dispatcher<B> {
    backend: B,
    policy: DispatchPolicy,
}

impl<B: GenerativeBackend> Dispatcher<B> {
    pub fn new(backend: B, policy: DispatchPolicy) -> Self {
        Self { backend, policy }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub async fn dispatch(&self, prompt: &str) -> Result<Dispatched, DispatchError> {
        let schedule = &self.policy.backoff;
        let mut attempts = Vec::new();
        let mut last_err: Option<UpstreamError> = None;

        for model_id in &self.policy.candidates {
            let handle = match self.backend.model_handle(model_id) {
                Ok(handle) => handle,
                Err(e) => {
                    tracing::warn!(model = %model_id, "Candidate init failed: {}", e);
                    GENERATION_ATTEMPTS_TOTAL
                        .with_label_values(&[model_id.as_str(), "init_failed"])
                        .inc();
                    last_err = Some(e);
                    continue;
                }
            };

            for attempt in 0..schedule.max_attempts() {
                let wait = schedule.delay_before(attempt).unwrap_or_default();
                if attempt > 0 && !wait.is_zero() {
                    tokio::time::sleep(wait).await;
                }

                match self.backend.generate(&handle, prompt).await {
                    Ok(value) => {
                        GENERATION_ATTEMPTS_TOTAL
                            .with_label_values(&[model_id.as_str(), "success"])
                            .inc();
                        attempts.push(GenerationAttempt {
                            model_id: model_id.clone(),
                            attempt: attempt + 1,
                            succeeded: true,
                            error_class: None,
                            status: None,
                            waited_ms: wait.as_millis() as u64,
                        });
                        tracing::debug!(model = %model_id, attempt = attempt + 1, "Generation succeeded");

                        return Ok(Dispatched {
                            text: extract_text(&value),
                            model_used: model_id.clone(),
                            attempts,
                        });
                    }
                    Err(e) => {
                        let class = e.class();
                        tracing::warn!(
                            model = %model_id,
                            attempt = attempt + 1,
                            status = ?e.status,
                            class = class.as_str(),
                            "Generation attempt failed: {}",
                            e.message
                        );
                        GENERATION_ATTEMPTS_TOTAL
                            .with_label_values(&[model_id.as_str(), class.as_str()])
                            .inc();
                        attempts.push(GenerationAttempt {
                            model_id: model_id.clone(),
                            attempt: attempt + 1,
                            succeeded: false,
                            error_class: Some(class),
                            status: e.status,
                            waited_ms: wait.as_millis() as u64,
                        });
                        last_err = Some(e);

                        // Only overloads earn another try on the same candidate
                        if class != ErrorClass::Overloaded {
                            break;
                        }
                    }
                }
            }
        }

        Err(DispatchError {
            last: last_err
                .unwrap_or_else(|| UpstreamError::new(None, "No model candidates configured")),
            attempts,
        })
    }
}

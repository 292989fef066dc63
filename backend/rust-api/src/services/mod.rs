use crate::config::Config;
use crate::services::dispatcher::DispatchPolicy;
use crate::utils::backoff::BackoffSchedule;

pub struct AppState {
    pub config: Config,
    pub http: reqwest::Client,
}

impl AppState {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        for var in config.credentials.missing() {
            tracing::warn!("{} is not set; requests that need it will fail with 500", var);
        }

        let http = reqwest::Client::builder()
            .timeout(config.generative_timeout)
            .build()?;

        tracing::info!(
            candidates = ?config.model_candidates,
            backoff = ?config.backoff_schedule,
            "Generation policy loaded"
        );

        Ok(Self { config, http })
    }

    pub fn dispatch_policy(&self) -> DispatchPolicy {
        DispatchPolicy::new(
            self.config.model_candidates.clone(),
            BackoffSchedule::new(self.config.backoff_schedule.clone()),
        )
    }
}

pub mod dispatcher;
pub mod exercise_extractor;
pub mod generative;
pub mod ocr_service;
pub mod prompt_builder;
pub mod task_service;

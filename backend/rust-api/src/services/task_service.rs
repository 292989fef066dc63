use crate::error::AppError;
use crate::metrics::EXERCISES_EXTRACTED;
use crate::models::{Language, Task, TaskPayload, TaskResponse};
use crate::services::{
    dispatcher::Dispatcher, exercise_extractor::ExerciseExtractor, generative::GenerativeBackend,
    prompt_builder::PromptBuilder,
};

/// Runs one study task end to end: prompt, dispatch, and post-processing.
pub struct TaskService<B> {
    dispatcher: Dispatcher<B>,
    prompts: PromptBuilder,
    extractor: ExerciseExtractor,
}

impl<B: GenerativeBackend> TaskService<B> {
    pub fn new(dispatcher: Dispatcher<B>, prompts: PromptBuilder, extractor: ExerciseExtractor) -> Self {
        Self {
            dispatcher,
            prompts,
            extractor,
        }
    }

    pub async fn run(&self, task: Task, payload: &TaskPayload) -> Result<TaskResponse, AppError> {
        let language = Language::from_code(payload.language.as_deref());
        tracing::info!(task = %task, language = language.as_str(), "Processing task");

        let prompt = self.prompts.build(task, payload);
        let dispatched = self
            .dispatcher
            .dispatch(&prompt)
            .await
            .map_err(|e| {
                tracing::error!(
                    task = %task,
                    attempts = e.attempts.len(),
                    status = ?e.last.status,
                    "{}",
                    e
                );
                e.into_app_error(task, language)
            })?;

        tracing::info!(
            task = %task,
            model = %dispatched.model_used,
            attempts = dispatched.attempts.len(),
            "Task completed"
        );

        let mut response = TaskResponse {
            result: dispatched.text,
            model_used: Some(dispatched.model_used),
            exercises: None,
            notice: None,
        };

        if task == Task::Exercises {
            let items = self.extractor.extract(&response.result);
            EXERCISES_EXTRACTED
                .with_label_values(&[language.as_str()])
                .observe(items.len() as f64);
            if items.is_empty() {
                // Soft failure: the call worked but nothing usable came back
                tracing::warn!(task = %task, "No exercises could be extracted");
                response.notice = Some(no_exercises_notice(language).to_string());
            }
            response.exercises = Some(items);
        }

        Ok(response)
    }
}

pub fn no_exercises_notice(language: Language) -> &'static str {
    language.pick(
        "No valid exercises were generated.",
        "Aucun exercice valide n'a été généré.",
        "لم يتم إنشاء تمارين صالحة.",
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::dispatcher::DispatchPolicy;
    use crate::services::generative::{ModelHandle, UpstreamError};
    use crate::utils::backoff::BackoffSchedule;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::sync::Mutex;
    use url::Url;

    /// Always answers with the same text and remembers the last prompt.
    struct EchoBackend {
        reply: String,
        last_prompt: Mutex<Option<String>>,
    }

    #[async_trait]
    impl GenerativeBackend for EchoBackend {
        fn model_handle(&self, model_id: &str) -> Result<ModelHandle, UpstreamError> {
            Ok(ModelHandle {
                id: model_id.to_string(),
                endpoint: Url::parse("http://echo.local/").unwrap(),
            })
        }

        async fn generate(&self, _model: &ModelHandle, prompt: &str) -> Result<Value, UpstreamError> {
            *self.last_prompt.lock().unwrap() = Some(prompt.to_string());
            Ok(json!({ "text": self.reply }))
        }
    }

    fn service(reply: &str) -> TaskService<EchoBackend> {
        let backend = EchoBackend {
            reply: reply.to_string(),
            last_prompt: Mutex::new(None),
        };
        let policy = DispatchPolicy::new(vec!["echo-1".to_string()], BackoffSchedule::default());
        TaskService::new(
            Dispatcher::new(backend, policy),
            PromptBuilder::new(8000),
            ExerciseExtractor::default(),
        )
    }

    #[tokio::test]
    async fn summary_returns_text_and_model() {
        let svc = service("A short summary.");
        let payload = TaskPayload {
            text: Some("Long lesson".to_string()),
            ..Default::default()
        };

        let out = svc.run(Task::Summary, &payload).await.unwrap();

        assert_eq!(out.result, "A short summary.");
        assert_eq!(out.model_used.as_deref(), Some("echo-1"));
        assert!(out.exercises.is_none());
    }

    #[tokio::test]
    async fn exercises_are_extracted_from_the_reply() {
        let svc = service("Here you go:\n1. What is 2+2?\n2. Name the capital of France.");
        let out = svc
            .run(Task::Exercises, &TaskPayload::default())
            .await
            .unwrap();

        assert_eq!(
            out.exercises.unwrap(),
            vec!["What is 2+2?", "Name the capital of France."]
        );
        assert!(out.notice.is_none());
    }

    #[tokio::test]
    async fn unparseable_exercises_carry_a_localized_notice() {
        let svc = service("I cannot create exercises for this text.");
        let payload = TaskPayload {
            language: Some("fr".to_string()),
            ..Default::default()
        };

        let out = svc.run(Task::Exercises, &payload).await.unwrap();

        assert_eq!(out.exercises, Some(vec![]));
        assert_eq!(
            out.notice.as_deref(),
            Some("Aucun exercice valide n'a été généré.")
        );
    }

    #[tokio::test]
    async fn prompt_reaches_the_backend() {
        let svc = service("ok");
        let payload = TaskPayload {
            question: Some("What is osmosis?".to_string()),
            subject: Some("Biology".to_string()),
            ..Default::default()
        };

        svc.run(Task::StudyChat, &payload).await.unwrap();

        let prompt = svc
            .dispatcher
            .backend()
            .last_prompt
            .lock()
            .unwrap()
            .clone()
            .unwrap();
        assert!(prompt.contains("Subject: Biology."));
        assert!(prompt.ends_with("What is osmosis?"));
    }
}

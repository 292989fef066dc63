use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use std::sync::Arc;

use crate::{
    error::AppError,
    extractors::AppJson,
    metrics,
    models::{Language, Task, TaskRequest},
    services::{
        dispatcher::Dispatcher, exercise_extractor::ExerciseExtractor,
        generative::GeminiBackend, prompt_builder::PromptBuilder, task_service::TaskService,
        AppState,
    },
};

pub async fn run_task(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<TaskRequest>,
) -> Result<impl IntoResponse, AppError> {
    let task_name = req.task.as_deref().unwrap_or_default();
    tracing::info!("Task request: task={}", task_name);

    let task: Task = match task_name.parse() {
        Ok(task) => task,
        Err(_) => {
            metrics::record_task("invalid", StatusCode::BAD_REQUEST.as_u16());
            return Err(AppError::InvalidTask {
                language: Language::from_code(req.payload.language.as_deref()),
            });
        }
    };

    let api_key = state.config.credentials.generative()?;

    let backend = GeminiBackend::new(
        state.http.clone(),
        state.config.generative_base_url.clone(),
        api_key,
    );
    let service = TaskService::new(
        Dispatcher::new(backend, state.dispatch_policy()),
        PromptBuilder::new(state.config.max_input_chars),
        ExerciseExtractor::new(
            state.config.exercises_min_chars,
            state.config.exercises_max_items,
        ),
    );

    match service.run(task, &req.payload).await {
        Ok(response) => {
            metrics::record_task(task.as_str(), StatusCode::OK.as_u16());
            Ok((StatusCode::OK, Json(response)))
        }
        Err(e) => {
            metrics::record_task(task.as_str(), e.status_code().as_u16());
            Err(e)
        }
    }
}

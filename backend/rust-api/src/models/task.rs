use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use crate::error::AppError;
use crate::models::Language;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum Task {
    Summary,
    Chat,
    Hint,
    Exercises,
    CheckAnswer,
    StudyChat,
}

impl Task {
    pub const ALL: [Task; 6] = [
        Task::Summary,
        Task::Chat,
        Task::Hint,
        Task::Exercises,
        Task::CheckAnswer,
        Task::StudyChat,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Task::Summary => "summary",
            Task::Chat => "chat",
            Task::Hint => "hint",
            Task::Exercises => "exercises",
            Task::CheckAnswer => "checkAnswer",
            Task::StudyChat => "studyChat",
        }
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Task {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Task::ALL
            .into_iter()
            .find(|task| task.as_str() == s)
            .ok_or(AppError::InvalidTask {
                language: Language::En,
            })
    }
}

/// Body of `POST /api/gemini`. The task stays a raw string so an unknown
/// name maps to a 400 instead of a deserialization rejection.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskRequest {
    #[serde(default)]
    pub task: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub payload: TaskPayload,
}

/// `"payload": null` reads the same as a missing payload.
fn null_as_empty<'de, D>(deserializer: D) -> Result<TaskPayload, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Option::<TaskPayload>::deserialize(deserializer).map(Option::unwrap_or_default)
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPayload {
    pub text: Option<String>,
    pub question: Option<String>,
    pub context: Option<String>,
    pub student_answer: Option<String>,
    pub subject: Option<String>,
    pub language: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskResponse {
    pub result: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_used: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exercises: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ErrorClass {
    Overloaded,
    NotFound,
    Other,
}

impl ErrorClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorClass::Overloaded => "overloaded",
            ErrorClass::NotFound => "not_found",
            ErrorClass::Other => "other",
        }
    }
}

/// Outcome of a single generation attempt; only lives for one request.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GenerationAttempt {
    pub model_id: String,
    pub attempt: usize,
    pub succeeded: bool,
    pub error_class: Option<ErrorClass>,
    pub status: Option<u16>,
    pub waited_ms: u64,
}

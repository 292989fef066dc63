pub mod language;
pub mod ocr;
pub mod task;

pub use language::Language;
pub use ocr::{OcrRequest, OcrResponse, OcrSource};
pub use task::{ErrorClass, GenerationAttempt, Task, TaskPayload, TaskRequest, TaskResponse};

use std::env;
use std::time::Duration;

use crate::error::AppError;

pub const GENERATIVE_KEY_VAR: &str = "GEMINI_API_KEY";
pub const OCR_KEY_VAR: &str = "VISION_API_KEY";

const DEFAULT_MODELS: &str =
    "gemini-2.0-flash,gemini-1.5-flash,models/text-bison-001,models/chat-bison-001";
const DEFAULT_BACKOFF_MS: &str = "0,600,1500";

/// Secrets needed by the upstream collaborators. Both are optional at load
/// time so the server can still answer with a diagnostic 500.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub generative_api_key: Option<String>,
    pub ocr_api_key: Option<String>,
}

impl Credentials {
    pub fn generative(&self) -> Result<&str, AppError> {
        present(self.generative_api_key.as_deref(), GENERATIVE_KEY_VAR)
    }

    pub fn ocr(&self) -> Result<&str, AppError> {
        present(self.ocr_api_key.as_deref(), OCR_KEY_VAR)
    }

    /// Names of the variables that are absent, in a stable order.
    pub fn missing(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.generative().is_err() {
            missing.push(GENERATIVE_KEY_VAR);
        }
        if self.ocr().is_err() {
            missing.push(OCR_KEY_VAR);
        }
        missing
    }
}

fn present<'a>(value: Option<&'a str>, var: &'static str) -> Result<&'a str, AppError> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(AppError::Configuration(var)),
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    pub credentials: Credentials,
    pub generative_base_url: String,
    pub model_candidates: Vec<String>,
    pub backoff_schedule: Vec<Duration>,
    pub generative_timeout: Duration,
    pub max_input_chars: usize,
    pub ocr_base_url: String,
    pub ocr_min_chars: usize,
    pub ocr_min_confidence: f32,
    pub exercises_max_items: usize,
    pub exercises_min_chars: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8081".to_string(),
            credentials: Credentials::default(),
            generative_base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            model_candidates: parse_list(DEFAULT_MODELS),
            backoff_schedule: parse_backoff(DEFAULT_BACKOFF_MS),
            generative_timeout: Duration::from_secs(30),
            max_input_chars: 8000,
            ocr_base_url: "https://vision.googleapis.com".to_string(),
            ocr_min_chars: 120,
            ocr_min_confidence: 60.0,
            exercises_max_items: 6,
            exercises_min_chars: 8,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        // Root .env first, then the local one
        let skip_root_env = env::var("SKIP_ROOT_ENV").is_ok();
        if skip_root_env {
            dotenvy::dotenv().ok();
        } else if dotenvy::from_path("../../.env").is_err() {
            dotenvy::dotenv().ok();
        }

        let env = env::var("APP_ENV").unwrap_or_else(|_| "dev".to_string());

        // config/{env}.toml + APP__* overrides
        let settings = config::Config::builder()
            .add_source(config::File::with_name(&format!("config/{}", env)).required(false))
            .add_source(config::Environment::with_prefix("APP").separator("__"))
            .build()?;

        let defaults = Config::default();
        let lookup = |key: &str, var: &str| -> Option<String> {
            settings.get_string(key).or_else(|_| env::var(var)).ok()
        };

        let credentials = Credentials {
            generative_api_key: lookup("credentials.generative_api_key", GENERATIVE_KEY_VAR),
            ocr_api_key: lookup("credentials.ocr_api_key", OCR_KEY_VAR),
        };

        let model_candidates = lookup("generative.models", "GEMINI_MODELS")
            .map(|raw| parse_list(&raw))
            .filter(|list| !list.is_empty())
            .unwrap_or(defaults.model_candidates);

        let backoff_schedule = lookup("generative.backoff_ms", "GEMINI_BACKOFF_MS")
            .map(|raw| parse_backoff(&raw))
            .filter(|list| !list.is_empty())
            .unwrap_or(defaults.backoff_schedule);

        Ok(Config {
            bind_addr: lookup("server.bind_addr", "BIND_ADDR").unwrap_or(defaults.bind_addr),
            credentials,
            generative_base_url: lookup("generative.base_url", "GEMINI_BASE_URL")
                .unwrap_or(defaults.generative_base_url),
            model_candidates,
            backoff_schedule,
            generative_timeout: settings
                .get_int("generative.timeout_secs")
                .ok()
                .and_then(|secs| u64::try_from(secs).ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.generative_timeout),
            max_input_chars: usize_setting(&settings, "prompt.max_input_chars")
                .unwrap_or(defaults.max_input_chars),
            ocr_base_url: lookup("ocr.base_url", "VISION_BASE_URL")
                .unwrap_or(defaults.ocr_base_url),
            ocr_min_chars: usize_setting(&settings, "ocr.min_chars")
                .unwrap_or(defaults.ocr_min_chars),
            ocr_min_confidence: settings
                .get_float("ocr.min_confidence")
                .map(|v| v as f32)
                .unwrap_or(defaults.ocr_min_confidence),
            exercises_max_items: usize_setting(&settings, "exercises.max_items")
                .unwrap_or(defaults.exercises_max_items),
            exercises_min_chars: usize_setting(&settings, "exercises.min_chars")
                .unwrap_or(defaults.exercises_min_chars),
        })
    }
}

fn usize_setting(settings: &config::Config, key: &str) -> Option<usize> {
    settings
        .get_int(key)
        .ok()
        .and_then(|v| usize::try_from(v).ok())
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parses "0,600,1500" into millisecond durations, skipping junk entries.
fn parse_backoff(raw: &str) -> Vec<Duration> {
    raw.split(',')
        .filter_map(|s| s.trim().parse::<u64>().ok())
        .map(Duration::from_millis)
        .collect()
}

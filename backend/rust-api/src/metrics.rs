use lazy_static::lazy_static;
use prometheus::{
    register_histogram_vec, register_int_counter_vec, Encoder, HistogramVec, IntCounterVec,
    TextEncoder,
};

lazy_static! {
    // HTTP Metrics
    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "http_requests_total",
        "Total number of HTTP requests",
        &["method", "path", "status"]
    )
    .unwrap();

    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "http_request_duration_seconds",
        "HTTP request duration in seconds",
        &["method", "path"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]
    )
    .unwrap();

    // Upstream Metrics
    pub static ref GENERATION_ATTEMPTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "generation_attempts_total",
        "Generation attempts per model candidate and outcome",
        &["model", "outcome"]
    )
    .unwrap();

    pub static ref OCR_REQUESTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "ocr_requests_total",
        "Cloud OCR calls by outcome",
        &["status"]
    )
    .unwrap();

    // Business Metrics
    pub static ref TASKS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "tasks_total",
        "Study tasks handled, by task and result status",
        &["task", "status"]
    )
    .unwrap();

    pub static ref EXERCISES_EXTRACTED: HistogramVec = register_histogram_vec!(
        "exercises_extracted",
        "Number of exercises extracted per generation",
        &["language"],
        vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0]
    )
    .unwrap();
}

/// Renders all metrics in Prometheus text format
pub fn render_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    String::from_utf8(buffer)
        .map_err(|e| prometheus::Error::Msg(format!("Failed to convert metrics to UTF-8: {}", e)))
}

/// Record the final status of a task request
pub fn record_task(task: &str, status: u16) {
    let status = status.to_string();
    TASKS_TOTAL
        .with_label_values(&[task, status.as_str()])
        .inc();
}

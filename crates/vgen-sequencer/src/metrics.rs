//! Generation and export metrics.

use std::time::Duration;

pub const GENERATIONS_TOTAL: &str = "vgen_generations_total";
pub const GENERATION_DURATION: &str = "vgen_generation_duration_seconds";
pub const EXPORTS_TOTAL: &str = "vgen_exports_total";
pub const EXPORT_DURATION: &str = "vgen_export_duration_seconds";

/// `kind` is "scene" or "video".
pub fn record_generation(kind: &'static str, success: bool, elapsed: Duration) {
    let outcome = if success { "completed" } else { "failed" };
    metrics::counter!(GENERATIONS_TOTAL, "kind" => kind, "outcome" => outcome).increment(1);
    metrics::histogram!(GENERATION_DURATION, "kind" => kind).record(elapsed.as_secs_f64());
}

pub fn record_generation_started(kind: &'static str) {
    metrics::counter!(GENERATIONS_TOTAL, "kind" => kind, "outcome" => "started").increment(1);
}

pub fn record_export(success: bool, elapsed: Duration) {
    let outcome = if success { "success" } else { "error" };
    metrics::counter!(EXPORTS_TOTAL, "outcome" => outcome).increment(1);
    metrics::histogram!(EXPORT_DURATION, "outcome" => outcome).record(elapsed.as_secs_f64());
}

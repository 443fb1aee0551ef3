//! Liveness and readiness probes.

use std::future::Future;
use std::time::Instant;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub timestamp: String,
}

/// Liveness: the process is up and serving.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        timestamp: Utc::now().to_rfc3339(),
    })
}

/// One dependency probed by `/ready`.
#[derive(Serialize)]
pub struct DependencyCheck {
    pub name: &'static str,
    /// Failing a required check makes the instance unready
    pub required: bool,
    pub ok: bool,
    pub latency_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Serialize)]
pub struct ReadinessResponse {
    /// `ready`, `degraded` (an optional dependency is down) or `unavailable`
    pub status: &'static str,
    pub checks: Vec<DependencyCheck>,
}

async fn probe<F, E>(name: &'static str, required: bool, check: F) -> DependencyCheck
where
    F: Future<Output = Result<(), E>>,
    E: std::fmt::Display,
{
    let start = Instant::now();
    let outcome = check.await;
    DependencyCheck {
        name,
        required,
        ok: outcome.is_ok(),
        latency_ms: start.elapsed().as_millis() as u64,
        error: outcome.err().map(|e| e.to_string()),
    }
}

/// Readiness: document store and object storage must answer. FFmpeg is
/// reported but only degrades the instance, since it is needed for exports
/// and frame extraction, not for reads.
pub async fn ready(State(state): State<AppState>) -> (StatusCode, Json<ReadinessResponse>) {
    let (store, storage) = tokio::join!(
        probe("document_store", true, state.sequencer.ready()),
        probe("object_storage", true, state.sequencer.storage_ready()),
    );
    let ffmpeg = probe("ffmpeg", false, async {
        vgen_media::check_ffmpeg().map(|_| ())
    })
    .await;
    let checks = vec![store, storage, ffmpeg];

    let (code, status) = if checks.iter().any(|c| c.required && !c.ok) {
        (StatusCode::SERVICE_UNAVAILABLE, "unavailable")
    } else if checks.iter().any(|c| !c.ok) {
        (StatusCode::OK, "degraded")
    } else {
        (StatusCode::OK, "ready")
    };

    (code, Json(ReadinessResponse { status, checks }))
}

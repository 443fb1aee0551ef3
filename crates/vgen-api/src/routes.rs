//! API routes.

use std::sync::Arc;

use axum::middleware;
use axum::routing::{get, patch, post};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::limit::RequestBodyLimitLayer;

use crate::handlers::{
    add_scene, create_sequence, delete_sequence, delete_video, estimate_cost, export_sequence,
    generate_scene, generate_sequence, generate_video, get_sequence, get_stats, get_video, health,
    list_models, list_sequences, list_templates, list_videos, ready, remove_scene, reorder_scenes,
    scene_status, sequence_status, update_scene, update_sequence,
};
use crate::metrics::metrics_middleware;
use crate::middleware::{
    cors_layer, rate_limit_middleware, request_id, request_logging, security_headers, RateLimiterCache,
};
use crate::state::AppState;

/// Create the API router.
pub fn create_router(state: AppState, metrics_handle: Option<PrometheusHandle>) -> Router {
    let catalog_routes = Router::new()
        .route("/stats", get(get_stats))
        .route("/models", get(list_models))
        .route("/templates", get(list_templates))
        .route("/videos/estimate-cost", post(estimate_cost));

    let video_routes = Router::new()
        .route("/videos/generate", post(generate_video))
        .route("/videos", get(list_videos))
        .route("/videos/:video_id", get(get_video).delete(delete_video));

    let sequence_routes = Router::new()
        .route("/sequences", get(list_sequences).post(create_sequence))
        .route(
            "/sequences/:sequence_id",
            get(get_sequence).patch(update_sequence).delete(delete_sequence),
        )
        // Whole-sequence operations
        .route("/sequences/:sequence_id/generate", post(generate_sequence))
        .route("/sequences/:sequence_id/export", post(export_sequence))
        .route("/sequences/:sequence_id/status", get(sequence_status))
        .route("/sequences/:sequence_id/reorder", post(reorder_scenes))
        // Scenes
        .route("/sequences/:sequence_id/scenes", post(add_scene))
        .route(
            "/sequences/:sequence_id/scenes/:scene_number",
            patch(update_scene).delete(remove_scene),
        )
        .route(
            "/sequences/:sequence_id/scenes/:scene_number/generate",
            post(generate_scene),
        )
        .route(
            "/sequences/:sequence_id/scenes/:scene_number/status",
            get(scene_status),
        );

    let rate_limiter = Arc::new(RateLimiterCache::new(state.config.rate_limit_rps));

    let api_routes = Router::new()
        .merge(catalog_routes)
        .merge(video_routes)
        .merge(sequence_routes)
        .route("/health", get(health))
        .layer(middleware::from_fn_with_state(rate_limiter, rate_limit_middleware));

    let health_routes = Router::new()
        .route("/health", get(health))
        .route("/healthz", get(health))
        .route("/ready", get(ready));

    let metrics_routes = if let Some(handle) = metrics_handle {
        Router::new().route("/metrics", get(move || async move { handle.render() }))
    } else {
        Router::new()
    };

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .merge(metrics_routes)
        .layer(RequestBodyLimitLayer::new(state.config.max_body_size))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(security_headers))
        .layer(middleware::from_fn(request_id))
        .layer(middleware::from_fn(request_logging))
        .layer(cors_layer(&state.config.cors_origins))
        .with_state(state)
}

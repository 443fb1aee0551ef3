//! Model catalog, prompt templates, cost estimates and usage stats.

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use vgen_models::validation::validate_duration;
use vgen_models::{
    model_catalog, template_categories, templates, CostEstimate, ModelInfo, ModelVariant, PromptTemplate,
    UsageStats, DEFAULT_DURATION_SECS,
};

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Upper bound on `count` in a cost estimate.
const MAX_ESTIMATE_COUNT: u32 = 100;

#[derive(Serialize)]
pub struct ModelsResponse {
    pub models: Vec<ModelInfo>,
}

/// GET /api/models
pub async fn list_models() -> Json<ModelsResponse> {
    Json(ModelsResponse {
        models: model_catalog(),
    })
}

#[derive(Debug, Deserialize)]
pub struct TemplatesQuery {
    #[serde(default)]
    pub category: Option<String>,
}

#[derive(Serialize)]
pub struct TemplatesResponse {
    pub templates: Vec<PromptTemplate>,
    pub categories: Vec<&'static str>,
}

/// GET /api/templates
pub async fn list_templates(Query(query): Query<TemplatesQuery>) -> Json<TemplatesResponse> {
    let category = query.category.as_deref().filter(|c| !c.is_empty());
    Json(TemplatesResponse {
        templates: templates(category),
        categories: template_categories(),
    })
}

#[derive(Debug, Deserialize)]
pub struct EstimateCostRequest {
    #[serde(default)]
    pub model: ModelVariant,
    #[serde(default = "default_duration")]
    pub duration_secs: u32,
    #[serde(default = "default_count")]
    pub count: u32,
}

fn default_duration() -> u32 {
    DEFAULT_DURATION_SECS
}

fn default_count() -> u32 {
    1
}

/// POST /api/videos/estimate-cost
pub async fn estimate_cost(Json(request): Json<EstimateCostRequest>) -> ApiResult<Json<CostEstimate>> {
    validate_duration(request.duration_secs).map_err(|e| ApiError::Validation(e.to_string()))?;
    if !(1..=MAX_ESTIMATE_COUNT).contains(&request.count) {
        return Err(ApiError::Validation(format!(
            "count must be between 1 and {}",
            MAX_ESTIMATE_COUNT
        )));
    }
    Ok(Json(CostEstimate::new(
        request.model,
        request.duration_secs,
        request.count,
    )))
}

/// GET /api/stats
pub async fn get_stats(State(state): State<AppState>, user: AuthUser) -> ApiResult<Json<UsageStats>> {
    Ok(Json(state.sequencer.stats(&user.uid).await?))
}

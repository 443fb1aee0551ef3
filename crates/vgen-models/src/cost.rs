//! Cost estimation and tracking.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::model::ModelVariant;

/// Estimated vs actual spend in USD.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema, Default)]
pub struct CostSummary {
    pub estimated: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual: Option<f64>,
}

impl CostSummary {
    pub fn estimate(model: ModelVariant, duration_secs: u32) -> Self {
        Self {
            estimated: estimate_cost(model, duration_secs as f64),
            actual: None,
        }
    }

    /// Record actual spend for a clip of `actual_duration_secs`.
    pub fn settle(&mut self, model: ModelVariant, actual_duration_secs: f64) {
        self.actual = Some(estimate_cost(model, actual_duration_secs));
    }
}

/// Price of `duration_secs` of output, rounded to cents.
pub fn estimate_cost(model: ModelVariant, duration_secs: f64) -> f64 {
    round_cents(model.price_per_second() * duration_secs.max(0.0))
}

pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Response body for cost estimation.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CostEstimate {
    pub model: ModelVariant,
    pub duration_secs: u32,
    pub count: u32,
    pub price_per_second: f64,
    pub cost_per_clip: f64,
    pub total_cost: f64,
}

impl CostEstimate {
    pub fn new(model: ModelVariant, duration_secs: u32, count: u32) -> Self {
        let cost_per_clip = estimate_cost(model, duration_secs as f64);
        Self {
            model,
            duration_secs,
            count,
            price_per_second: model.price_per_second(),
            cost_per_clip,
            total_cost: round_cents(cost_per_clip * count as f64),
        }
    }
}

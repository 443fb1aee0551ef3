//! Standalone single-clip generations shown in the gallery.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::cost::CostSummary;
use crate::generation::{GenerationConfig, GenerationResult, GenerationStatus};
use crate::model::ModelVariant;
use crate::validation::{validate_generation, ValidationError};

/// Unique identifier for a single-clip generation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct VideoId(pub String);

impl VideoId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for VideoId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for VideoId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for VideoId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Request body for a single-clip generation.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct GenerateVideoRequest {
    pub prompt: String,
    #[serde(default)]
    pub model: ModelVariant,
    #[serde(default)]
    pub config: GenerationConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_id: Option<String>,
}

impl GenerateVideoRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_generation(&self.prompt, self.model, &self.config)
    }
}

/// A single generated clip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct VideoGeneration {
    pub id: VideoId,
    pub user_id: String,
    pub prompt: String,
    pub model: ModelVariant,
    pub config: GenerationConfig,
    #[serde(default)]
    pub status: GenerationStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<GenerationResult>,
    #[serde(default)]
    pub cost: CostSummary,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl VideoGeneration {
    pub fn new(user_id: impl Into<String>, request: GenerateVideoRequest) -> Self {
        let now = Utc::now();
        Self {
            id: VideoId::new(),
            user_id: user_id.into(),
            cost: CostSummary::estimate(request.model, request.config.duration_secs),
            prompt: request.prompt,
            model: request.model,
            config: request.config,
            status: GenerationStatus::Pending,
            result: None,
            error_message: None,
            template_id: request.template_id,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn mark_generating(&mut self) {
        self.status = GenerationStatus::Generating;
        self.error_message = None;
        self.updated_at = Utc::now();
    }

    pub fn complete(&mut self, result: GenerationResult) {
        self.cost.settle(self.model, result.actual_duration_secs);
        self.status = GenerationStatus::Completed;
        self.result = Some(result);
        self.updated_at = Utc::now();
    }

    pub fn fail(&mut self, message: impl Into<String>) {
        self.status = GenerationStatus::Failed;
        self.error_message = Some(message.into());
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_video_is_pending_with_estimate() {
        let video = VideoGeneration::new(
            "user-1",
            GenerateVideoRequest {
                prompt: "A coffee cup steaming on a wooden table".into(),
                model: ModelVariant::Veo2,
                config: GenerationConfig::default(),
                template_id: Some("product-hero".into()),
            },
        );
        assert_eq!(video.status, GenerationStatus::Pending);
        assert_eq!(video.cost.estimated, 2.8);
        assert_eq!(video.template_id.as_deref(), Some("product-hero"));
    }

    #[test]
    fn test_request_validation() {
        let request = GenerateVideoRequest {
            prompt: "too short".into(),
            model: ModelVariant::Veo3,
            config: GenerationConfig::default(),
            template_id: None,
        };
        assert!(request.validate().is_err());
    }
}

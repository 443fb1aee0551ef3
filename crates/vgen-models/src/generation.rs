//! Per-clip generation config, status and result, shared by scenes and single videos.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::model::{AspectRatio, Resolution};

/// Default clip duration when the client does not specify one.
pub const DEFAULT_DURATION_SECS: u32 = 8;

/// Per-clip generation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct GenerationConfig {
    #[serde(default = "default_duration")]
    pub duration_secs: u32,
    #[serde(default)]
    pub aspect_ratio: AspectRatio,
    #[serde(default)]
    pub resolution: Resolution,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub negative_prompt: Option<String>,
}

fn default_duration() -> u32 {
    DEFAULT_DURATION_SECS
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            duration_secs: DEFAULT_DURATION_SECS,
            aspect_ratio: AspectRatio::default(),
            resolution: Resolution::default(),
            negative_prompt: None,
        }
    }
}

/// Status of a single clip generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum GenerationStatus {
    #[default]
    Pending,
    Generating,
    Completed,
    Failed,
}

impl GenerationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GenerationStatus::Pending => "pending",
            GenerationStatus::Generating => "generating",
            GenerationStatus::Completed => "completed",
            GenerationStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, GenerationStatus::Completed | GenerationStatus::Failed)
    }
}

impl fmt::Display for GenerationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Artifacts of a completed generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct GenerationResult {
    pub video_url: String,
    pub video_key: String,
    /// Final frame of the clip, used to seed the next scene
    pub last_frame_url: String,
    pub last_frame_key: String,
    pub thumbnail_url: String,
    pub thumbnail_key: String,
    /// Probed clip duration in seconds
    pub actual_duration_secs: f64,
    /// URI the provider returned for the generated sample
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_uri: Option<String>,
    pub completed_at: DateTime<Utc>,
}

impl GenerationResult {
    /// All storage keys owned by this result.
    pub fn object_keys(&self) -> Vec<String> {
        vec![
            self.video_key.clone(),
            self.last_frame_key.clone(),
            self.thumbnail_key.clone(),
        ]
    }
}

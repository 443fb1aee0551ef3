//! Scene model: one generated clip within a sequence.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::cost::CostSummary;
use crate::generation::{GenerationConfig, GenerationResult, GenerationStatus};
use crate::model::ModelVariant;

/// Scene status shares the generation lifecycle.
pub type SceneStatus = GenerationStatus;

/// Whether a scene is seeded with an earlier scene's last frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Default)]
pub struct Continuity {
    pub enabled: bool,
    /// Scene number whose last frame seeds this scene
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_scene: Option<u32>,
}

impl Continuity {
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn from_scene(source_scene: u32) -> Self {
        Self {
            enabled: true,
            source_scene: Some(source_scene),
        }
    }

    /// Source scene number, if continuity is active.
    pub fn active_source(&self) -> Option<u32> {
        if self.enabled {
            self.source_scene
        } else {
            None
        }
    }
}

/// A scene within a sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Scene {
    /// Stable identity within the sequence
    pub scene_number: u32,
    /// Ordering key; only relative order matters
    pub position: u32,
    pub prompt: String,
    #[serde(default)]
    pub model: ModelVariant,
    #[serde(default)]
    pub config: GenerationConfig,
    #[serde(default)]
    pub status: SceneStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<GenerationResult>,
    #[serde(default)]
    pub continuity: Continuity,
    #[serde(default)]
    pub cost: CostSummary,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generation_started_at: Option<DateTime<Utc>>,
}

/// Partial scene edit. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct SceneUpdate {
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub model: Option<ModelVariant>,
    #[serde(default)]
    pub config: Option<GenerationConfig>,
    #[serde(default)]
    pub continuity: Option<Continuity>,
}

impl SceneUpdate {
    /// True if the edit changes what would be generated.
    pub fn affects_output(&self) -> bool {
        self.prompt.is_some()
            || self.model.is_some()
            || self.config.is_some()
            || self.continuity.is_some()
    }
}

impl Scene {
    pub fn new(
        scene_number: u32,
        position: u32,
        prompt: impl Into<String>,
        model: ModelVariant,
        config: GenerationConfig,
        continuity: Continuity,
    ) -> Self {
        let now = Utc::now();
        let cost = CostSummary::estimate(model, config.duration_secs);
        Self {
            scene_number,
            position,
            prompt: prompt.into(),
            model,
            config,
            status: SceneStatus::Pending,
            result: None,
            continuity,
            cost,
            error_message: None,
            created_at: now,
            updated_at: now,
            generation_started_at: None,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == SceneStatus::Completed
    }

    /// Last-frame storage key, present once the scene completed.
    pub fn last_frame_key(&self) -> Option<&str> {
        match (&self.status, &self.result) {
            (SceneStatus::Completed, Some(result)) => Some(result.last_frame_key.as_str()),
            _ => None,
        }
    }

    /// Apply an edit. Output-affecting edits reset the scene to pending.
    pub fn apply_update(&mut self, update: SceneUpdate) {
        let reset = update.affects_output();
        if let Some(prompt) = update.prompt {
            self.prompt = prompt;
        }
        if let Some(model) = update.model {
            self.model = model;
        }
        if let Some(config) = update.config {
            self.config = config;
        }
        if let Some(continuity) = update.continuity {
            self.continuity = continuity;
        }
        if reset {
            self.reset();
        }
        self.updated_at = Utc::now();
    }

    /// Drop any previous outcome and return to pending.
    pub fn reset(&mut self) {
        self.status = SceneStatus::Pending;
        self.result = None;
        self.error_message = None;
        self.generation_started_at = None;
        self.cost = CostSummary::estimate(self.model, self.config.duration_secs);
        self.updated_at = Utc::now();
    }

    pub fn mark_generating(&mut self) {
        self.status = SceneStatus::Generating;
        self.result = None;
        self.error_message = None;
        self.generation_started_at = Some(Utc::now());
        self.cost = CostSummary::estimate(self.model, self.config.duration_secs);
        self.updated_at = Utc::now();
    }

    pub fn complete(&mut self, result: GenerationResult) {
        self.cost.settle(self.model, result.actual_duration_secs);
        self.status = SceneStatus::Completed;
        self.result = Some(result);
        self.error_message = None;
        self.updated_at = Utc::now();
    }

    pub fn fail(&mut self, message: impl Into<String>) {
        self.status = SceneStatus::Failed;
        self.result = None;
        self.error_message = Some(message.into());
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    pub fn completed_result(scene_number: u32, duration: f64) -> GenerationResult {
        GenerationResult {
            video_url: format!("https://cdn.example.com/scene-{}.mp4", scene_number),
            video_key: format!("scenes/{}/clip.mp4", scene_number),
            last_frame_url: format!("https://cdn.example.com/scene-{}.png", scene_number),
            last_frame_key: format!("scenes/{}/last_frame.png", scene_number),
            thumbnail_url: format!("https://cdn.example.com/scene-{}.jpg", scene_number),
            thumbnail_key: format!("scenes/{}/thumb.jpg", scene_number),
            actual_duration_secs: duration,
            provider_uri: None,
            completed_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::completed_result;
    use super::*;

    fn scene() -> Scene {
        Scene::new(
            1,
            1,
            "A drone shot over a coastal city at dawn",
            ModelVariant::Veo3Fast,
            GenerationConfig::default(),
            Continuity::disabled(),
        )
    }

    #[test]
    fn test_new_scene_is_pending_with_estimate() {
        let s = scene();
        assert_eq!(s.status, SceneStatus::Pending);
        assert_eq!(s.cost.estimated, 3.2);
        assert!(s.last_frame_key().is_none());
    }

    #[test]
    fn test_complete_settles_cost() {
        let mut s = scene();
        s.mark_generating();
        s.complete(completed_result(1, 8.0));
        assert!(s.is_completed());
        assert_eq!(s.cost.actual, Some(3.2));
        assert_eq!(s.last_frame_key(), Some("scenes/1/last_frame.png"));
    }

    #[test]
    fn test_fail_keeps_message_verbatim() {
        let mut s = scene();
        s.mark_generating();
        s.fail("RESOURCE_EXHAUSTED: quota exceeded");
        assert_eq!(s.status, SceneStatus::Failed);
        assert_eq!(s.error_message.as_deref(), Some("RESOURCE_EXHAUSTED: quota exceeded"));
    }

    #[test]
    fn test_prompt_edit_resets_completed_scene() {
        let mut s = scene();
        s.complete(completed_result(1, 8.0));
        s.apply_update(SceneUpdate {
            prompt: Some("A new prompt for this scene".into()),
            ..Default::default()
        });
        assert_eq!(s.status, SceneStatus::Pending);
        assert!(s.result.is_none());
    }

    #[test]
    fn test_continuity_active_source() {
        assert_eq!(Continuity::from_scene(2).active_source(), Some(2));
        let off = Continuity {
            enabled: false,
            source_scene: Some(2),
        };
        assert_eq!(off.active_source(), None);
    }
}

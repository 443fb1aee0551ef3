//! Sequence aggregate: an ordered list of scenes exported as one video.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;
use validator::Validate;

use crate::cost::{round_cents, CostSummary};
use crate::generation::GenerationConfig;
use crate::model::ModelVariant;
use crate::scene::{Continuity, Scene, SceneStatus, SceneUpdate};
use crate::validation::{validate_generation, ValidationError};

/// Unique identifier for a sequence.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct SequenceId(pub String);

impl SequenceId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SequenceId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SequenceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for SequenceId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for SequenceId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Aggregate sequence status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum SequenceStatus {
    #[default]
    Draft,
    Generating,
    Completed,
    Failed,
    Exporting,
    Exported,
}

impl SequenceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SequenceStatus::Draft => "draft",
            SequenceStatus::Generating => "generating",
            SequenceStatus::Completed => "completed",
            SequenceStatus::Failed => "failed",
            SequenceStatus::Exporting => "exporting",
            SequenceStatus::Exported => "exported",
        }
    }

    /// Generation or export is running.
    pub fn is_busy(&self) -> bool {
        matches!(self, SequenceStatus::Generating | SequenceStatus::Exporting)
    }
}

impl fmt::Display for SequenceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Output of a successful export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ExportResult {
    pub key: String,
    pub url: String,
    pub duration_secs: f64,
    pub file_size_bytes: u64,
    pub scene_count: usize,
    pub exported_at: DateTime<Utc>,
}

/// Why a scene's continuity source cannot be used.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContinuityError {
    #[error("Scene {scene} continues from scene {source_scene}, which does not exist")]
    MissingSource { scene: u32, source_scene: u32 },

    #[error("Scene {scene} continues from scene {source_scene}, which is not earlier in the sequence")]
    SourceNotEarlier { scene: u32, source_scene: u32 },

    #[error("Scene {scene} continues from scene {source_scene}, which has not completed")]
    SourceNotReady { scene: u32, source_scene: u32 },
}

/// A user's scene sequence. Stored as a single document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Sequence {
    pub id: SequenceId,
    pub user_id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub scenes: Vec<Scene>,
    /// Highest scene number ever assigned. Numbers of removed scenes are not reused.
    #[serde(default)]
    pub last_scene_number: u32,
    #[serde(default)]
    pub status: SequenceStatus,
    /// Sum of completed scenes' actual durations
    #[serde(default)]
    pub total_duration_secs: f64,
    /// Sum of configured scene durations
    #[serde(default)]
    pub estimated_duration_secs: u32,
    #[serde(default)]
    pub cost: CostSummary,
    /// Completed scenes as a percentage of all scenes
    #[serde(default)]
    pub progress: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub export: Option<ExportResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub export_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request body for creating a sequence.
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema, Validate)]
pub struct NewSequence {
    #[validate(length(min = 1, max = 200, message = "title must be 1-200 characters"))]
    pub title: String,
    #[serde(default)]
    #[validate(length(max = 2000, message = "description must be at most 2000 characters"))]
    pub description: Option<String>,
}

/// Request body for updating sequence metadata.
#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema, Validate)]
pub struct SequenceUpdate {
    #[serde(default)]
    #[validate(length(min = 1, max = 200, message = "title must be 1-200 characters"))]
    pub title: Option<String>,
    #[serde(default)]
    #[validate(length(max = 2000, message = "description must be at most 2000 characters"))]
    pub description: Option<String>,
}

/// Request body for appending a scene.
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct NewScene {
    pub prompt: String,
    #[serde(default)]
    pub model: ModelVariant,
    #[serde(default)]
    pub config: GenerationConfig,
    /// With `enabled` and no source, the previous scene is used
    #[serde(default)]
    pub continuity: Continuity,
}

impl Sequence {
    pub fn new(user_id: impl Into<String>, title: impl Into<String>, description: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: SequenceId::new(),
            user_id: user_id.into(),
            title: title.into(),
            description,
            scenes: Vec::new(),
            last_scene_number: 0,
            status: SequenceStatus::Draft,
            total_duration_secs: 0.0,
            estimated_duration_secs: 0,
            cost: CostSummary::default(),
            progress: 0.0,
            export: None,
            export_error: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Scenes in position order. Ties fall back to scene number.
    pub fn ordered_scenes(&self) -> Vec<&Scene> {
        let mut scenes: Vec<&Scene> = self.scenes.iter().collect();
        scenes.sort_by_key(|s| (s.position, s.scene_number));
        scenes
    }

    /// Scene numbers in position order.
    pub fn scene_order(&self) -> Vec<u32> {
        self.ordered_scenes().iter().map(|s| s.scene_number).collect()
    }

    pub fn scene(&self, scene_number: u32) -> Option<&Scene> {
        self.scenes.iter().find(|s| s.scene_number == scene_number)
    }

    pub fn scene_mut(&mut self, scene_number: u32) -> Option<&mut Scene> {
        self.scenes.iter_mut().find(|s| s.scene_number == scene_number)
    }

    fn next_scene_number(&self) -> Result<u32, ValidationError> {
        self.scenes
            .iter()
            .map(|s| s.scene_number)
            .fold(self.last_scene_number, u32::max)
            .checked_add(1)
            .ok_or_else(|| ValidationError::field("Sequence has run out of scene numbers"))
    }

    fn next_position(&self) -> Result<u32, ValidationError> {
        let last = self.scenes.iter().map(|s| s.position).max().unwrap_or(0);
        last.checked_add(1).ok_or_else(|| {
            ValidationError::field(format!(
                "No position is left after {}; reorder the scenes to lower positions first",
                last
            ))
        })
    }

    /// True while any scene is generating or an export is running.
    pub fn is_busy(&self) -> bool {
        self.status.is_busy() || self.scenes.iter().any(|s| s.status == SceneStatus::Generating)
    }

    /// Every scene completed and there is at least one.
    pub fn can_export(&self) -> bool {
        !self.scenes.is_empty() && self.scenes.iter().all(Scene::is_completed)
    }

    /// Append a scene at the end of the order. Returns its scene number.
    pub fn add_scene(&mut self, new_scene: NewScene) -> Result<u32, ValidationError> {
        validate_generation(&new_scene.prompt, new_scene.model, &new_scene.config)?;

        let scene_number = self.next_scene_number()?;
        let position = self.next_position()?;
        let continuity = self.resolve_new_continuity(new_scene.continuity, position)?;

        self.scenes.push(Scene::new(
            scene_number,
            position,
            new_scene.prompt,
            new_scene.model,
            new_scene.config,
            continuity,
        ));
        self.last_scene_number = scene_number;
        self.invalidate_export();
        self.refresh_aggregates();
        Ok(scene_number)
    }

    /// Edit a scene. Returns false if the scene does not exist.
    pub fn update_scene(&mut self, scene_number: u32, update: SceneUpdate) -> Result<bool, ValidationError> {
        let Some(current) = self.scene(scene_number) else {
            return Ok(false);
        };

        let prompt = update.prompt.as_deref().unwrap_or(&current.prompt);
        let model = update.model.unwrap_or(current.model);
        let config = update.config.as_ref().unwrap_or(&current.config);
        validate_generation(prompt, model, config)?;

        let position = current.position;
        let mut update = update;
        if let Some(continuity) = update.continuity.take() {
            update.continuity = Some(self.resolve_new_continuity(continuity, position)?);
        }

        if let Some(scene) = self.scene_mut(scene_number) {
            scene.apply_update(update);
        }
        self.invalidate_export();
        self.refresh_aggregates();
        Ok(true)
    }

    /// Remove a scene. Returns the removed scene.
    pub fn remove_scene(&mut self, scene_number: u32) -> Option<Scene> {
        let idx = self.scenes.iter().position(|s| s.scene_number == scene_number)?;
        let removed = self.scenes.remove(idx);
        self.invalidate_export();
        self.refresh_aggregates();
        Some(removed)
    }

    /// Fill in a default continuity source and check it precedes `position`.
    fn resolve_new_continuity(
        &self,
        continuity: Continuity,
        position: u32,
    ) -> Result<Continuity, ValidationError> {
        if !continuity.enabled {
            return Ok(Continuity {
                enabled: false,
                source_scene: continuity.source_scene,
            });
        }

        let earlier = |s: &&Scene| s.position < position;
        match continuity.source_scene {
            None => {
                let previous = self
                    .ordered_scenes()
                    .into_iter()
                    .filter(earlier)
                    .last()
                    .ok_or_else(|| {
                        ValidationError::InvalidContinuity(
                            "the first scene has no previous scene to continue from".to_string(),
                        )
                    })?;
                Ok(Continuity::from_scene(previous.scene_number))
            }
            Some(source) => match self.scene(source) {
                None => Err(ValidationError::InvalidContinuity(format!(
                    "scene {} does not exist",
                    source
                ))),
                Some(s) if !earlier(&s) => Err(ValidationError::InvalidContinuity(format!(
                    "scene {} is not earlier in the sequence",
                    source
                ))),
                Some(_) => Ok(Continuity::from_scene(source)),
            },
        }
    }

    /// Scene numbers whose continuity source is missing or no longer earlier.
    pub fn stale_continuity(&self) -> Vec<u32> {
        self.ordered_scenes()
            .into_iter()
            .filter(|scene| match scene.continuity.active_source() {
                None => false,
                Some(source) => match self.scene(source) {
                    None => true,
                    Some(src) => src.position >= scene.position,
                },
            })
            .map(|s| s.scene_number)
            .collect()
    }

    /// Last-frame key to seed `scene_number` with, if continuity is active.
    pub fn continuity_frame_key(&self, scene_number: u32) -> Result<Option<String>, ContinuityError> {
        let Some(scene) = self.scene(scene_number) else {
            return Ok(None);
        };
        let Some(source) = scene.continuity.active_source() else {
            return Ok(None);
        };

        let src = self.scene(source).ok_or(ContinuityError::MissingSource {
            scene: scene_number,
            source_scene: source,
        })?;
        if src.position >= scene.position {
            return Err(ContinuityError::SourceNotEarlier {
                scene: scene_number,
                source_scene: source,
            });
        }
        src.last_frame_key()
            .map(|key| Some(key.to_string()))
            .ok_or(ContinuityError::SourceNotReady {
                scene: scene_number,
                source_scene: source,
            })
    }

    /// Drop the export after a structural change.
    pub fn invalidate_export(&mut self) {
        self.export = None;
        self.export_error = None;
    }

    pub fn begin_export(&mut self) {
        self.status = SequenceStatus::Exporting;
        self.updated_at = Utc::now();
    }

    /// Record a successful export, replacing any previous one.
    pub fn record_export(&mut self, export: ExportResult) {
        self.export = Some(export);
        self.export_error = None;
        self.status = SequenceStatus::Draft;
        self.refresh_aggregates();
    }

    /// Record a failed export. The previous export result is kept.
    pub fn record_export_failure(&mut self, message: impl Into<String>) {
        let message: String = message.into();
        let first_line = message.lines().next().unwrap_or_default().trim().to_string();
        self.export_error = Some(first_line);
        self.status = SequenceStatus::Draft;
        self.refresh_aggregates();
    }

    /// Recompute durations, cost, progress and status from the scenes.
    pub fn refresh_aggregates(&mut self) {
        let completed: Vec<&Scene> = self.scenes.iter().filter(|s| s.is_completed()).collect();

        self.total_duration_secs = completed
            .iter()
            .filter_map(|s| s.result.as_ref())
            .map(|r| r.actual_duration_secs)
            .sum();
        self.estimated_duration_secs = self.scenes.iter().map(|s| s.config.duration_secs).sum();

        let estimated: f64 = self.scenes.iter().map(|s| s.cost.estimated).sum();
        let actuals: Vec<f64> = self.scenes.iter().filter_map(|s| s.cost.actual).collect();
        self.cost = CostSummary {
            estimated: round_cents(estimated),
            actual: if actuals.is_empty() {
                None
            } else {
                Some(round_cents(actuals.iter().sum()))
            },
        };

        self.progress = if self.scenes.is_empty() {
            0.0
        } else {
            let pct = completed.len() as f64 / self.scenes.len() as f64 * 100.0;
            (pct * 10.0).round() / 10.0
        };

        self.status = self.derive_status();
        self.updated_at = Utc::now();
    }

    fn derive_status(&self) -> SequenceStatus {
        if self.status == SequenceStatus::Exporting {
            return SequenceStatus::Exporting;
        }
        if self.scenes.is_empty() {
            return SequenceStatus::Draft;
        }
        if self.scenes.iter().any(|s| s.status == SceneStatus::Generating) {
            return SequenceStatus::Generating;
        }
        if self.scenes.iter().all(Scene::is_completed) {
            return if self.export.is_some() {
                SequenceStatus::Exported
            } else {
                SequenceStatus::Completed
            };
        }
        if self.scenes.iter().any(|s| s.status == SceneStatus::Failed) {
            return SequenceStatus::Failed;
        }
        SequenceStatus::Draft
    }

    pub fn completed_count(&self) -> usize {
        self.scenes.iter().filter(|s| s.is_completed()).count()
    }

    /// Scenes a whole-sequence run should generate, in position order.
    pub fn scenes_to_generate(&self) -> Vec<u32> {
        self.ordered_scenes()
            .into_iter()
            .filter(|s| matches!(s.status, SceneStatus::Pending | SceneStatus::Failed))
            .map(|s| s.scene_number)
            .collect()
    }

    /// All storage keys owned by the sequence.
    pub fn object_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .scenes
            .iter()
            .filter_map(|s| s.result.as_ref())
            .flat_map(|r| r.object_keys())
            .collect();
        if let Some(ref export) = self.export {
            keys.push(export.key.clone());
        }
        keys
    }
}

/// Polling view of a sequence.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SequenceStatusView {
    pub sequence_id: SequenceId,
    pub status: SequenceStatus,
    pub progress: f64,
    pub total_scenes: usize,
    pub completed_scenes: usize,
    pub total_duration_secs: f64,
    pub scenes: Vec<SceneStatusView>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub export_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub export_error: Option<String>,
}

/// Polling view of a scene.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SceneStatusView {
    pub scene_number: u32,
    pub position: u32,
    pub status: SceneStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl From<&Scene> for SceneStatusView {
    fn from(scene: &Scene) -> Self {
        Self {
            scene_number: scene.scene_number,
            position: scene.position,
            status: scene.status,
            video_url: scene.result.as_ref().map(|r| r.video_url.clone()),
            thumbnail_url: scene.result.as_ref().map(|r| r.thumbnail_url.clone()),
            error_message: scene.error_message.clone(),
        }
    }
}

impl From<&Sequence> for SequenceStatusView {
    fn from(seq: &Sequence) -> Self {
        Self {
            sequence_id: seq.id.clone(),
            status: seq.status,
            progress: seq.progress,
            total_scenes: seq.scenes.len(),
            completed_scenes: seq.completed_count(),
            total_duration_secs: seq.total_duration_secs,
            scenes: seq.ordered_scenes().into_iter().map(SceneStatusView::from).collect(),
            export_url: seq.export.as_ref().map(|e| e.url.clone()),
            export_error: seq.export_error.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::test_support::completed_result;

    fn new_scene(prompt: &str, duration: u32) -> NewScene {
        NewScene {
            prompt: prompt.to_string(),
            model: ModelVariant::Veo3,
            config: GenerationConfig {
                duration_secs: duration,
                ..Default::default()
            },
            continuity: Continuity::disabled(),
        }
    }

    fn sequence_with(durations: &[u32]) -> Sequence {
        let mut seq = Sequence::new("user-1", "Launch teaser", None);
        for (i, d) in durations.iter().enumerate() {
            seq.add_scene(new_scene(&format!("Scene {} of the product launch", i + 1), *d))
                .unwrap();
        }
        seq
    }

    fn complete(seq: &mut Sequence, scene_number: u32, duration: f64) {
        let scene = seq.scene_mut(scene_number).unwrap();
        scene.mark_generating();
        scene.complete(completed_result(scene_number, duration));
        seq.refresh_aggregates();
    }

    fn export_result() -> ExportResult {
        ExportResult {
            key: "exports/final.mp4".into(),
            url: "https://cdn.example.com/final.mp4".into(),
            duration_secs: 15.0,
            file_size_bytes: 1_024,
            scene_count: 3,
            exported_at: Utc::now(),
        }
    }

    #[test]
    fn test_scene_numbers_are_max_plus_one() {
        let mut seq = sequence_with(&[8, 8, 8]);
        seq.remove_scene(2);
        let n = seq.add_scene(new_scene("Another scene of the launch", 8)).unwrap();
        assert_eq!(n, 4);
        assert_eq!(seq.scene_order(), vec![1, 3, 4]);
    }

    #[test]
    fn test_removed_last_scene_number_is_not_reused() {
        let mut seq = sequence_with(&[8, 8, 8]);
        seq.remove_scene(3);
        let n = seq.add_scene(new_scene("A replacement closing scene", 8)).unwrap();
        assert_eq!(n, 4);
        assert!(seq.scene(3).is_none());
        assert_eq!(seq.last_scene_number, 4);
    }

    #[test]
    fn test_append_after_highest_position_is_rejected() {
        let mut seq = sequence_with(&[8]);
        seq.reorder(&[crate::reorder::ReorderEntry {
            scene_number: 1,
            position: u32::MAX,
        }])
        .unwrap();

        let err = seq
            .add_scene(new_scene("A second scene after the reorder", 8))
            .unwrap_err();
        assert!(matches!(err, ValidationError::Field(_)));
        assert!(err.to_string().contains("reorder"));
        assert_eq!(seq.scenes.len(), 1);
        assert_eq!(seq.last_scene_number, 1);
    }

    #[test]
    fn test_empty_sequence_is_draft() {
        let seq = Sequence::new("user-1", "Empty", None);
        assert_eq!(seq.status, SequenceStatus::Draft);
        assert!(!seq.can_export());
        assert_eq!(seq.progress, 0.0);
    }

    #[test]
    fn test_total_duration_counts_only_completed_scenes() {
        let mut seq = sequence_with(&[4, 5, 6]);
        assert_eq!(seq.estimated_duration_secs, 15);
        complete(&mut seq, 1, 4.0);
        complete(&mut seq, 2, 5.0);
        assert_eq!(seq.total_duration_secs, 9.0);
        assert_ne!(seq.total_duration_secs, 15.0);
        complete(&mut seq, 3, 6.0);
        assert_eq!(seq.total_duration_secs, 15.0);
        assert_eq!(seq.status, SequenceStatus::Completed);
        assert_eq!(seq.progress, 100.0);
    }

    #[test]
    fn test_exported_requires_all_scenes_completed() {
        let mut seq = sequence_with(&[4, 5, 6]);
        for n in 1..=3 {
            complete(&mut seq, n, 5.0);
        }
        seq.begin_export();
        assert_eq!(seq.status, SequenceStatus::Exporting);
        seq.record_export(export_result());
        assert_eq!(seq.status, SequenceStatus::Exported);
        assert!(seq.scenes.iter().all(|s| s.is_completed()));

        // Editing a scene drops the export and leaves the exported state.
        seq.update_scene(
            2,
            SceneUpdate {
                prompt: Some("A rewritten second scene".into()),
                ..Default::default()
            },
        )
        .unwrap();
        assert!(seq.export.is_none());
        assert_ne!(seq.status, SequenceStatus::Exported);
    }

    #[test]
    fn test_export_failure_keeps_previous_export() {
        let mut seq = sequence_with(&[4]);
        complete(&mut seq, 1, 4.0);
        seq.record_export(export_result());
        seq.begin_export();
        seq.record_export_failure("ffmpeg exited with status 1\nstderr follows");
        assert_eq!(seq.export_error.as_deref(), Some("ffmpeg exited with status 1"));
        assert!(seq.export.is_some());
        assert_eq!(seq.status, SequenceStatus::Exported);
    }

    #[test]
    fn test_failed_scene_marks_sequence_failed() {
        let mut seq = sequence_with(&[4, 5]);
        complete(&mut seq, 1, 4.0);
        seq.scene_mut(2).unwrap().fail("provider error");
        seq.refresh_aggregates();
        assert_eq!(seq.status, SequenceStatus::Failed);
        assert_eq!(seq.progress, 50.0);
        assert_eq!(seq.scenes_to_generate(), vec![2]);
    }

    #[test]
    fn test_continuity_defaults_to_previous_scene() {
        let mut seq = sequence_with(&[8, 8]);
        let n = seq
            .add_scene(NewScene {
                continuity: Continuity {
                    enabled: true,
                    source_scene: None,
                },
                ..new_scene("A continuation of the second scene", 8)
            })
            .unwrap();
        assert_eq!(seq.scene(n).unwrap().continuity.source_scene, Some(2));
    }

    #[test]
    fn test_first_scene_cannot_continue() {
        let mut seq = Sequence::new("user-1", "Teaser", None);
        let err = seq
            .add_scene(NewScene {
                continuity: Continuity {
                    enabled: true,
                    source_scene: None,
                },
                ..new_scene("The opening scene of the teaser", 8)
            })
            .unwrap_err();
        assert!(matches!(err, ValidationError::InvalidContinuity(_)));
    }

    #[test]
    fn test_continuity_frame_requires_completed_source() {
        let mut seq = sequence_with(&[8]);
        seq.add_scene(NewScene {
            continuity: Continuity::from_scene(1),
            ..new_scene("A continuation of the first scene", 8)
        })
        .unwrap();

        assert_eq!(
            seq.continuity_frame_key(2),
            Err(ContinuityError::SourceNotReady { scene: 2, source_scene: 1 })
        );
        complete(&mut seq, 1, 8.0);
        assert_eq!(
            seq.continuity_frame_key(2),
            Ok(Some("scenes/1/last_frame.png".to_string()))
        );
        assert_eq!(seq.continuity_frame_key(1), Ok(None));
    }

    #[test]
    fn test_new_sequence_validation() {
        let ok = NewSequence {
            title: "Summer campaign".into(),
            description: None,
        };
        assert!(ok.validate().is_ok());
        let empty = NewSequence {
            title: String::new(),
            description: None,
        };
        let err: ValidationError = empty.validate().unwrap_err().into();
        assert!(err.to_string().contains("title"));
    }

    #[test]
    fn test_status_view_is_ordered_by_position() {
        let mut seq = sequence_with(&[8, 8]);
        seq.scene_mut(1).unwrap().position = 10;
        let view = SequenceStatusView::from(&seq);
        let order: Vec<u32> = view.scenes.iter().map(|s| s.scene_number).collect();
        assert_eq!(order, vec![2, 1]);
    }
}

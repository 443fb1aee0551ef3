//! Per-user usage statistics.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::generation::GenerationStatus;
use crate::sequence::{Sequence, SequenceStatus};
use crate::video::VideoGeneration;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct StatusCounts {
    pub pending: u32,
    pub generating: u32,
    pub completed: u32,
    pub failed: u32,
}

impl StatusCounts {
    fn record(&mut self, status: GenerationStatus) {
        match status {
            GenerationStatus::Pending => self.pending += 1,
            GenerationStatus::Generating => self.generating += 1,
            GenerationStatus::Completed => self.completed += 1,
            GenerationStatus::Failed => self.failed += 1,
        }
    }
}

/// Gallery and sequencer totals for one user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct UsageStats {
    pub total_videos: u32,
    pub videos: StatusCounts,
    pub total_sequences: u32,
    pub sequences_exported: u32,
    pub total_scenes: u32,
    pub scenes: StatusCounts,
    /// Seconds of completed clips across videos and scenes
    pub total_generated_secs: f64,
    /// Actual spend in USD across videos and scenes
    pub total_spent: f64,
}

impl UsageStats {
    pub fn compute(videos: &[VideoGeneration], sequences: &[Sequence]) -> Self {
        let mut stats = Self {
            total_videos: videos.len() as u32,
            total_sequences: sequences.len() as u32,
            ..Default::default()
        };

        for video in videos {
            stats.videos.record(video.status);
            if let Some(ref result) = video.result {
                stats.total_generated_secs += result.actual_duration_secs;
            }
            stats.total_spent += video.cost.actual.unwrap_or(0.0);
        }

        for sequence in sequences {
            if sequence.status == SequenceStatus::Exported {
                stats.sequences_exported += 1;
            }
            for scene in &sequence.scenes {
                stats.total_scenes += 1;
                stats.scenes.record(scene.status);
                if let Some(ref result) = scene.result {
                    stats.total_generated_secs += result.actual_duration_secs;
                }
                stats.total_spent += scene.cost.actual.unwrap_or(0.0);
            }
        }

        stats.total_spent = crate::cost::round_cents(stats.total_spent);
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::GenerationConfig;
    use crate::model::ModelVariant;
    use crate::scene::test_support::completed_result;
    use crate::video::GenerateVideoRequest;

    #[test]
    fn test_compute_totals() {
        let mut done = VideoGeneration::new(
            "user-1",
            GenerateVideoRequest {
                prompt: "A red sports car on a mountain road".into(),
                model: ModelVariant::Veo3,
                config: GenerationConfig::default(),
                template_id: None,
            },
        );
        done.complete(completed_result(0, 8.0));
        let mut failed = done.clone();
        failed.result = None;
        failed.cost.actual = None;
        failed.fail("quota exceeded");

        let stats = UsageStats::compute(&[done, failed], &[]);
        assert_eq!(stats.total_videos, 2);
        assert_eq!(stats.videos.completed, 1);
        assert_eq!(stats.videos.failed, 1);
        assert_eq!(stats.total_generated_secs, 8.0);
        assert_eq!(stats.total_spent, 6.0);
    }

    #[test]
    fn test_empty() {
        assert_eq!(UsageStats::compute(&[], &[]), UsageStats::default());
    }
}

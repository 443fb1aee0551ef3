//! Clip pipeline shared by scenes and single videos.
//!
//! generate → probe → last frame → thumbnail → upload → URLs

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};

use vgen_models::{GenerationConfig, GenerationResult, ModelVariant};
use vgen_storage::keys::AssetKind;
use vgen_veo::{ReferenceImage, VideoRequest};

use crate::backends::{MediaProcessor, ObjectStorage, VideoGenerator};
use crate::error::SequencerResult;

/// Everything needed to produce one clip.
#[derive(Debug, Clone)]
pub struct ClipJob {
    /// Used in logs, e.g. "sequence abc scene 2"
    pub label: String,
    pub prompt: String,
    pub model: ModelVariant,
    pub config: GenerationConfig,
    /// Storage key of an image to use as the first frame
    pub reference_frame_key: Option<String>,
    pub keys: ClipKeys,
}

/// Destination keys for a clip's assets.
#[derive(Debug, Clone)]
pub struct ClipKeys {
    pub video: String,
    pub last_frame: String,
    pub thumbnail: String,
}

impl ClipKeys {
    /// Keys from a function mapping each asset kind to its key.
    pub fn from_fn(key: impl Fn(AssetKind) -> String) -> Self {
        Self {
            video: key(AssetKind::Clip),
            last_frame: key(AssetKind::LastFrame),
            thumbnail: key(AssetKind::Thumbnail),
        }
    }
}

#[derive(Clone)]
pub struct ClipPipeline {
    generator: Arc<dyn VideoGenerator>,
    media: Arc<dyn MediaProcessor>,
    storage: Arc<dyn ObjectStorage>,
    work_dir: PathBuf,
}

impl ClipPipeline {
    pub fn new(
        generator: Arc<dyn VideoGenerator>,
        media: Arc<dyn MediaProcessor>,
        storage: Arc<dyn ObjectStorage>,
        work_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            generator,
            media,
            storage,
            work_dir: work_dir.into(),
        }
    }

    pub async fn run(&self, job: &ClipJob) -> SequencerResult<GenerationResult> {
        tokio::fs::create_dir_all(&self.work_dir).await?;
        let scratch = tempfile::Builder::new()
            .prefix("clip-")
            .tempdir_in(&self.work_dir)?;
        let dir = scratch.path();

        let reference_image = match &job.reference_frame_key {
            Some(key) => Some(self.load_reference(key, dir).await?),
            None => None,
        };

        let request = VideoRequest {
            model: job.model,
            prompt: job.prompt.trim().to_string(),
            negative_prompt: job.config.negative_prompt.clone(),
            aspect_ratio: job.config.aspect_ratio,
            resolution: job.config.resolution,
            duration_secs: job.config.duration_secs,
            reference_image,
        };

        let clip = dir.join(AssetKind::Clip.file_name());
        let generated = self.generator.generate(&request, &clip).await?;

        let duration = self.media.probe_duration(&clip).await?;
        let last_frame = dir.join(AssetKind::LastFrame.file_name());
        self.media.extract_last_frame(&clip, &last_frame).await?;
        let thumbnail = dir.join(AssetKind::Thumbnail.file_name());
        self.media.thumbnail(&clip, &thumbnail, duration).await?;

        self.storage.upload_file(&clip, &job.keys.video).await?;
        self.storage.upload_file(&last_frame, &job.keys.last_frame).await?;
        self.storage.upload_file(&thumbnail, &job.keys.thumbnail).await?;

        let result = GenerationResult {
            video_url: self.storage.object_url(&job.keys.video).await?,
            video_key: job.keys.video.clone(),
            last_frame_url: self.storage.object_url(&job.keys.last_frame).await?,
            last_frame_key: job.keys.last_frame.clone(),
            thumbnail_url: self.storage.object_url(&job.keys.thumbnail).await?,
            thumbnail_key: job.keys.thumbnail.clone(),
            actual_duration_secs: duration,
            provider_uri: Some(generated.uri),
            completed_at: Utc::now(),
        };

        info!(
            clip = %job.label,
            duration_secs = duration,
            continued = job.reference_frame_key.is_some(),
            "Clip ready"
        );
        Ok(result)
    }

    async fn load_reference(&self, key: &str, dir: &Path) -> SequencerResult<ReferenceImage> {
        let path = dir.join("reference.png");
        self.storage.download_file(key, &path).await?;
        let bytes = tokio::fs::read(&path).await?;
        debug!(key, bytes = bytes.len(), "Loaded continuity frame");
        Ok(ReferenceImage::png(bytes))
    }
}

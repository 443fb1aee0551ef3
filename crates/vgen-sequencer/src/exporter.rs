//! Sequence export: download every scene clip in position order, join them
//! with FFmpeg and upload the result.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::info;

use vgen_models::{ExportResult, Sequence};
use vgen_storage::keys::export_key;

use crate::backends::{MediaProcessor, ObjectStorage};
use crate::error::{SequencerError, SequencerResult};

#[derive(Clone)]
pub struct Exporter {
    media: Arc<dyn MediaProcessor>,
    storage: Arc<dyn ObjectStorage>,
    work_dir: PathBuf,
    timeout: Duration,
}

impl Exporter {
    pub fn new(
        media: Arc<dyn MediaProcessor>,
        storage: Arc<dyn ObjectStorage>,
        work_dir: impl Into<PathBuf>,
        timeout: Duration,
    ) -> Self {
        Self {
            media,
            storage,
            work_dir: work_dir.into(),
            timeout,
        }
    }

    pub async fn export(&self, sequence: &Sequence) -> SequencerResult<ExportResult> {
        let scenes = sequence.ordered_scenes();
        let mut clip_keys = Vec::with_capacity(scenes.len());
        for scene in &scenes {
            let result = scene.result.as_ref().filter(|_| scene.is_completed()).ok_or_else(|| {
                SequencerError::conflict(format!("Scene {} has not completed", scene.scene_number))
            })?;
            clip_keys.push(result.video_key.as_str());
        }
        if clip_keys.is_empty() {
            return Err(SequencerError::conflict("Sequence has no scenes to export"));
        }

        tokio::fs::create_dir_all(&self.work_dir).await?;
        let scratch = tempfile::Builder::new()
            .prefix("export-")
            .tempdir_in(&self.work_dir)?;
        let dir = scratch.path();

        let mut inputs = Vec::with_capacity(clip_keys.len());
        for (index, key) in clip_keys.iter().enumerate() {
            let path = dir.join(format!("part_{:03}.mp4", index + 1));
            self.storage.download_file(key, &path).await?;
            inputs.push(path);
        }

        let output = dir.join("export.mp4");
        let mode = self.media.concat(&inputs, &output, dir, self.timeout).await?;
        let duration_secs = self.media.probe_duration(&output).await?;
        let file_size_bytes = tokio::fs::metadata(&output).await?.len();

        let exported_at = Utc::now();
        let key = export_key(&sequence.user_id, sequence.id.as_str(), exported_at);
        self.storage.upload_file(&output, &key).await?;
        let url = self.storage.object_url(&key).await?;

        info!(
            sequence_id = %sequence.id,
            scenes = inputs.len(),
            duration_secs,
            file_size_bytes,
            ?mode,
            "Sequence exported"
        );

        Ok(ExportResult {
            key,
            url,
            duration_secs,
            file_size_bytes,
            scene_count: inputs.len(),
            exported_at,
        })
    }
}

//! External capabilities the sequencer drives: clip generation, FFmpeg
//! processing and object storage.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;

use vgen_media::ConcatMode;
use vgen_storage::R2Client;
use vgen_veo::{GeneratedVideo, VeoClient, VideoRequest};

use crate::error::SequencerResult;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VideoGenerator: Send + Sync {
    /// Generate one clip and write it to `dest`.
    async fn generate(&self, request: &VideoRequest, dest: &Path) -> SequencerResult<GeneratedVideo>;
}

#[async_trait]
impl VideoGenerator for VeoClient {
    async fn generate(&self, request: &VideoRequest, dest: &Path) -> SequencerResult<GeneratedVideo> {
        Ok(VeoClient::generate(self, request, dest).await?)
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MediaProcessor: Send + Sync {
    async fn probe_duration(&self, video: &Path) -> SequencerResult<f64>;

    async fn extract_last_frame(&self, video: &Path, output: &Path) -> SequencerResult<()>;

    async fn thumbnail(&self, video: &Path, output: &Path, duration_secs: f64) -> SequencerResult<()>;

    async fn concat(
        &self,
        inputs: &[PathBuf],
        output: &Path,
        work_dir: &Path,
        timeout: Duration,
    ) -> SequencerResult<ConcatMode>;
}

/// [`MediaProcessor`] backed by the `ffmpeg`/`ffprobe` binaries.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ffmpeg;

#[async_trait]
impl MediaProcessor for Ffmpeg {
    async fn probe_duration(&self, video: &Path) -> SequencerResult<f64> {
        Ok(vgen_media::get_duration(video).await?)
    }

    async fn extract_last_frame(&self, video: &Path, output: &Path) -> SequencerResult<()> {
        Ok(vgen_media::extract_last_frame(video, output).await?)
    }

    async fn thumbnail(&self, video: &Path, output: &Path, duration_secs: f64) -> SequencerResult<()> {
        Ok(vgen_media::generate_thumbnail(video, output, duration_secs).await?)
    }

    async fn concat(
        &self,
        inputs: &[PathBuf],
        output: &Path,
        work_dir: &Path,
        timeout: Duration,
    ) -> SequencerResult<ConcatMode> {
        Ok(vgen_media::concat_videos(inputs, output, work_dir, timeout).await?)
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Upload a local file. Returns its size in bytes.
    async fn upload_file(&self, path: &Path, key: &str) -> SequencerResult<u64>;

    async fn download_file(&self, key: &str, path: &Path) -> SequencerResult<u64>;

    /// URL clients can fetch the object from.
    async fn object_url(&self, key: &str) -> SequencerResult<String>;

    async fn delete_objects(&self, keys: &[String]) -> SequencerResult<usize>;

    /// Readiness probe against the bucket.
    async fn check(&self) -> SequencerResult<()> {
        Ok(())
    }
}

#[async_trait]
impl ObjectStorage for R2Client {
    async fn upload_file(&self, path: &Path, key: &str) -> SequencerResult<u64> {
        Ok(R2Client::upload_file(self, path, key).await?)
    }

    async fn download_file(&self, key: &str, path: &Path) -> SequencerResult<u64> {
        Ok(R2Client::download_file(self, key, path).await?)
    }

    async fn object_url(&self, key: &str) -> SequencerResult<String> {
        Ok(R2Client::object_url(self, key).await?)
    }

    async fn delete_objects(&self, keys: &[String]) -> SequencerResult<usize> {
        Ok(R2Client::delete_objects(self, keys).await?)
    }

    async fn check(&self) -> SequencerResult<()> {
        Ok(self.check_connectivity().await?)
    }
}

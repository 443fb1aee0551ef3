//! Still images taken from generated clips.
//!
//! The last frame of a scene becomes the reference image of the next scene
//! when continuity is enabled; the thumbnail is what galleries show.

use std::path::Path;

use tracing::debug;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};

/// Thumbnail width in pixels; height keeps the aspect ratio.
pub const THUMBNAIL_WIDTH: u32 = 480;

/// Write the final frame of `video` as a PNG.
///
/// Decodes the last second and keeps overwriting the single output image,
/// so the file left behind is the final decodable frame.
pub async fn extract_last_frame(video: impl AsRef<Path>, output: impl AsRef<Path>) -> MediaResult<()> {
    let video = video.as_ref();
    let output = output.as_ref();
    if !video.exists() {
        return Err(MediaError::FileNotFound(video.to_path_buf()));
    }

    let cmd = FfmpegCommand::new(video, output)
        .label("last_frame")
        .seek_from_end(1.0)
        .output_args(["-an", "-update", "1"]);
    FfmpegRunner::new().run(&cmd).await?;

    ensure_written(output).await?;
    debug!(video = %video.display(), frame = %output.display(), "Extracted last frame");
    Ok(())
}

/// Where in the clip to grab the thumbnail.
pub fn thumbnail_timestamp(duration_secs: f64) -> f64 {
    (duration_secs / 2.0).clamp(0.0, 1.0)
}

/// Write a JPEG thumbnail of `video` scaled to [`THUMBNAIL_WIDTH`].
pub async fn generate_thumbnail(
    video: impl AsRef<Path>,
    output: impl AsRef<Path>,
    duration_secs: f64,
) -> MediaResult<()> {
    let video = video.as_ref();
    let output = output.as_ref();
    if !video.exists() {
        return Err(MediaError::FileNotFound(video.to_path_buf()));
    }

    let cmd = FfmpegCommand::new(video, output)
        .label("thumbnail")
        .seek(thumbnail_timestamp(duration_secs))
        .single_frame()
        .video_filter(format!("scale={}:-2", THUMBNAIL_WIDTH))
        .output_args(["-q:v", "3"]);
    FfmpegRunner::new().run(&cmd).await?;

    ensure_written(output).await
}

async fn ensure_written(path: &Path) -> MediaResult<()> {
    match tokio::fs::metadata(path).await {
        Ok(meta) if meta.len() > 0 => Ok(()),
        _ => Err(MediaError::InvalidVideo(format!(
            "FFmpeg produced no image at {}",
            path.display()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thumbnail_timestamp() {
        assert_eq!(thumbnail_timestamp(8.0), 1.0);
        assert_eq!(thumbnail_timestamp(1.0), 0.5);
        assert_eq!(thumbnail_timestamp(0.0), 0.0);
    }

    #[tokio::test]
    async fn test_missing_video_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let err = extract_last_frame(dir.path().join("nope.mp4"), dir.path().join("last.png"))
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::FileNotFound(_)));
    }
}

//! Concatenation of scene clips with FFmpeg's concat demuxer.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};

/// How the final file was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConcatMode {
    /// Streams copied as-is
    StreamCopy,
    /// Stream copy failed; re-encoded with libx264/aac
    Reencode,
}

/// Join `inputs` in order into `output`.
///
/// Tries a stream copy first, which works when every clip shares codec
/// parameters. Falls back to a full re-encode otherwise. Timeouts are not
/// retried.
pub async fn concat_videos(
    inputs: &[PathBuf],
    output: impl AsRef<Path>,
    work_dir: impl AsRef<Path>,
    timeout: Duration,
) -> MediaResult<ConcatMode> {
    let output = output.as_ref();
    if inputs.is_empty() {
        return Err(MediaError::NoInputs);
    }

    let mut absolute = Vec::with_capacity(inputs.len());
    for input in inputs {
        let path = tokio::fs::canonicalize(input)
            .await
            .map_err(|_| MediaError::FileNotFound(input.clone()))?;
        absolute.push(path);
    }

    let list_path = work_dir.as_ref().join("concat_list.txt");
    tokio::fs::write(&list_path, concat_list(&absolute)).await?;

    let runner = FfmpegRunner::new().with_timeout(timeout);
    let base = FfmpegCommand::new(&list_path, output).input_args(["-f", "concat", "-safe", "0"]);

    let copy = base.clone().label("concat_copy").stream_copy().faststart();
    let mode = match runner.run(&copy).await {
        Ok(()) => ConcatMode::StreamCopy,
        Err(e @ MediaError::FfmpegFailed { .. }) => {
            warn!(error = %e.summary(), "Stream copy concat failed, re-encoding");
            let reencode = base
                .label("concat_reencode")
                .video_codec("libx264")
                .preset("veryfast")
                .crf(20)
                .output_args(["-pix_fmt", "yuv420p"])
                .audio_codec("aac")
                .audio_bitrate("128k")
                .faststart();
            runner
                .run_with_progress(&reencode, |p| {
                    debug!(frame = p.frame, out_time_ms = p.out_time_ms, "Concat re-encode progress");
                })
                .await?;
            ConcatMode::Reencode
        }
        Err(e) => return Err(e),
    };

    info!(clips = inputs.len(), output = %output.display(), ?mode, "Concatenated clips");
    Ok(mode)
}

/// Concat demuxer list file body.
fn concat_list(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| format!("file '{}'\n", p.to_string_lossy().replace('\'', r"'\''")))
        .collect()
}

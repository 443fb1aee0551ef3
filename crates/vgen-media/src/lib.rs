//! FFmpeg CLI wrapper for video post-processing.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building
//! - Progress parsing from `-progress pipe:2`
//! - Probing, last-frame extraction and thumbnails for generated clips
//! - Concatenation of scene clips into a single export

pub mod command;
pub mod concat;
pub mod error;
pub mod frames;
pub mod probe;
pub mod progress;

pub use command::{check_ffmpeg, check_ffprobe, FfmpegCommand, FfmpegRunner};
pub use concat::{concat_videos, ConcatMode};
pub use error::{MediaError, MediaResult};
pub use frames::{extract_last_frame, generate_thumbnail, thumbnail_timestamp, THUMBNAIL_WIDTH};
pub use probe::{get_duration, probe_video, VideoInfo};
pub use progress::FfmpegProgress;

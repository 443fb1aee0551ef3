//! Sequencer configuration.

use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct SequencerConfig {
    /// Scratch space for downloads, frames and exports
    pub work_dir: PathBuf,
    /// Upper bound on a single FFmpeg concat
    pub export_timeout: Duration,
    /// Attempts at a sequence read-modify-write before giving up
    pub max_write_attempts: u32,
}

impl Default for SequencerConfig {
    fn default() -> Self {
        Self {
            work_dir: std::env::temp_dir().join("vgen"),
            export_timeout: Duration::from_secs(600),
            max_write_attempts: 5,
        }
    }
}

impl SequencerConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            work_dir: std::env::var("VGEN_WORK_DIR")
                .ok()
                .filter(|d| !d.is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.work_dir),
            export_timeout: std::env::var("EXPORT_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.export_timeout),
            max_write_attempts: std::env::var("SEQUENCE_WRITE_ATTEMPTS")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|n| *n > 0)
                .unwrap_or(defaults.max_write_attempts),
        }
    }
}

//! FFmpeg `-progress` output parsing.

use serde::Serialize;

/// Snapshot of an FFmpeg run, emitted once per `progress=` block.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FfmpegProgress {
    pub frame: u64,
    /// Output position in milliseconds
    pub out_time_ms: i64,
    /// Encoding speed relative to realtime
    pub speed: f64,
    pub is_complete: bool,
}

impl FfmpegProgress {
    /// Percent of `total_secs` written so far, capped at 100.
    pub fn percentage(&self, total_secs: f64) -> f64 {
        if total_secs <= 0.0 {
            return 0.0;
        }
        ((self.out_time_ms as f64 / 1000.0 / total_secs) * 100.0).clamp(0.0, 100.0)
    }

    /// Fold one `key=value` line into the snapshot.
    ///
    /// Returns a copy when the line closes a block.
    pub(crate) fn apply_line(&mut self, line: &str) -> Option<FfmpegProgress> {
        let (key, value) = line.trim().split_once('=')?;
        match key {
            // FFmpeg reports microseconds under both names
            "out_time_us" | "out_time_ms" => {
                if let Ok(us) = value.parse::<i64>() {
                    self.out_time_ms = us / 1000;
                }
            }
            "frame" => {
                if let Ok(frame) = value.parse() {
                    self.frame = frame;
                }
            }
            "speed" => {
                if let Some(speed) = value.strip_suffix('x').and_then(|s| s.trim().parse().ok()) {
                    self.speed = speed;
                }
            }
            "progress" => {
                self.is_complete = value == "end";
                return Some(self.clone());
            }
            _ => {}
        }
        None
    }

    /// Whether a stderr line belongs to the progress stream.
    pub(crate) fn is_progress_line(line: &str) -> bool {
        matches!(
            line.split_once('=').map(|(k, _)| k),
            Some(
                "frame" | "fps" | "stream_0_0_q" | "bitrate" | "total_size" | "out_time_us"
                    | "out_time_ms" | "out_time" | "dup_frames" | "drop_frames" | "speed"
                    | "progress"
            )
        ) || line.starts_with("stream_")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_parsing() {
        let mut progress = FfmpegProgress::default();
        assert!(progress.apply_line("frame=48").is_none());
        assert!(progress.apply_line("out_time_us=2000000").is_none());
        assert!(progress.apply_line("speed=3.1x").is_none());
        let snapshot = progress.apply_line("progress=continue").unwrap();
        assert_eq!(snapshot.frame, 48);
        assert_eq!(snapshot.out_time_ms, 2000);
        assert!((snapshot.speed - 3.1).abs() < 1e-9);
        assert!(!snapshot.is_complete);

        assert!(progress.apply_line("progress=end").unwrap().is_complete);
    }

    #[test]
    fn test_speed_not_available() {
        let mut progress = FfmpegProgress::default();
        progress.apply_line("speed=N/A");
        assert_eq!(progress.speed, 0.0);
    }

    #[test]
    fn test_percentage() {
        let progress = FfmpegProgress {
            out_time_ms: 7500,
            ..Default::default()
        };
        assert!((progress.percentage(15.0) - 50.0).abs() < 1e-9);
        assert_eq!(progress.percentage(5.0), 100.0);
        assert_eq!(progress.percentage(0.0), 0.0);
    }

    #[test]
    fn test_progress_line_detection() {
        assert!(FfmpegProgress::is_progress_line("bitrate=1024.0kbits/s"));
        assert!(!FfmpegProgress::is_progress_line("[mov,mp4] moov atom not found"));
    }
}

//! Object key layout.
//!
//! ```text
//! users/{uid}/sequences/{sequence_id}/scenes/{scene_number}/clip.mp4
//! users/{uid}/sequences/{sequence_id}/scenes/{scene_number}/last_frame.png
//! users/{uid}/sequences/{sequence_id}/scenes/{scene_number}/thumbnail.jpg
//! users/{uid}/sequences/{sequence_id}/exports/{timestamp}.mp4
//! users/{uid}/videos/{video_id}/clip.mp4
//! ```

use chrono::{DateTime, Utc};

/// One of the files produced per generated clip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    Clip,
    LastFrame,
    Thumbnail,
}

impl AssetKind {
    pub const ALL: [AssetKind; 3] = [AssetKind::Clip, AssetKind::LastFrame, AssetKind::Thumbnail];

    pub fn file_name(&self) -> &'static str {
        match self {
            AssetKind::Clip => "clip.mp4",
            AssetKind::LastFrame => "last_frame.png",
            AssetKind::Thumbnail => "thumbnail.jpg",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            AssetKind::Clip => "video/mp4",
            AssetKind::LastFrame => "image/png",
            AssetKind::Thumbnail => "image/jpeg",
        }
    }
}

pub fn sequence_prefix(user_id: &str, sequence_id: &str) -> String {
    format!("users/{}/sequences/{}/", user_id, sequence_id)
}

pub fn scene_asset(user_id: &str, sequence_id: &str, scene_number: u32, kind: AssetKind) -> String {
    format!(
        "{}scenes/{}/{}",
        sequence_prefix(user_id, sequence_id),
        scene_number,
        kind.file_name()
    )
}

/// Exports get a fresh key each time so cached URLs never serve a stale file.
pub fn export_key(user_id: &str, sequence_id: &str, at: DateTime<Utc>) -> String {
    format!(
        "{}exports/{}.mp4",
        sequence_prefix(user_id, sequence_id),
        at.format("%Y%m%dT%H%M%S%3fZ")
    )
}

pub fn video_asset(user_id: &str, video_id: &str, kind: AssetKind) -> String {
    format!("users/{}/videos/{}/{}", user_id, video_id, kind.file_name())
}

/// Content type from a key's extension.
pub fn content_type_for(key: &str) -> &'static str {
    match key.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase()) {
        Some(ext) if ext == "mp4" => "video/mp4",
        Some(ext) if ext == "png" => "image/png",
        Some(ext) if ext == "jpg" || ext == "jpeg" => "image/jpeg",
        Some(ext) if ext == "json" => "application/json",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_scene_keys() {
        assert_eq!(
            scene_asset("u1", "s1", 3, AssetKind::LastFrame),
            "users/u1/sequences/s1/scenes/3/last_frame.png"
        );
        assert!(scene_asset("u1", "s1", 3, AssetKind::Clip).starts_with(&sequence_prefix("u1", "s1")));
    }

    #[test]
    fn test_export_key_is_timestamped() {
        let at = Utc.with_ymd_and_hms(2026, 3, 1, 12, 30, 5).unwrap();
        assert_eq!(
            export_key("u1", "s1", at),
            "users/u1/sequences/s1/exports/20260301T123005000Z.mp4"
        );
    }

    #[test]
    fn test_content_types() {
        assert_eq!(content_type_for(&video_asset("u", "v", AssetKind::Clip)), "video/mp4");
        assert_eq!(content_type_for("a/b/thumbnail.JPG"), "image/jpeg");
        assert_eq!(content_type_for("noext"), "application/octet-stream");
        for kind in AssetKind::ALL {
            assert_eq!(content_type_for(kind.file_name()), kind.content_type());
        }
    }
}

//! Request handlers.

pub mod catalog;
pub mod health;
pub mod scenes;
pub mod sequences;
pub mod videos;

pub use catalog::*;
pub use health::*;
pub use scenes::*;
pub use sequences::*;
pub use videos::*;

use vgen_models::{SequenceId, VideoId};

use crate::error::{ApiError, ApiResult};

/// Document ids and user ids: ASCII alphanumerics, `-` and `_`.
pub fn is_valid_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= 128
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

pub(crate) fn sequence_id(raw: String) -> ApiResult<SequenceId> {
    if is_valid_id(&raw) {
        Ok(SequenceId::from(raw))
    } else {
        Err(ApiError::bad_request("Invalid sequence ID format"))
    }
}

pub(crate) fn video_id(raw: String) -> ApiResult<VideoId> {
    if is_valid_id(&raw) {
        Ok(VideoId::from(raw))
    } else {
        Err(ApiError::bad_request("Invalid video ID format"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_validation() {
        assert!(is_valid_id("550e8400-e29b-41d4-a716-446655440000"));
        assert!(is_valid_id("user_42"));
        assert!(!is_valid_id(""));
        assert!(!is_valid_id("a/b"));
        assert!(!is_valid_id("../secret"));
        assert!(!is_valid_id(&"a".repeat(129)));
    }
}

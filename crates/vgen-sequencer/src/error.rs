//! Sequencer error types.

use thiserror::Error;

use vgen_models::{ContinuityError, ValidationError};

pub type SequencerResult<T> = Result<T, SequencerError>;

#[derive(Debug, Error)]
pub enum SequencerError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{0} not found")]
    NotFound(String),

    /// The request cannot run in the sequence's current state
    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Continuity(#[from] ContinuityError),

    /// The stored document changed between read and write
    #[error("Concurrent update: {0}")]
    WriteConflict(String),

    #[error("Export failed: {0}")]
    Export(String),

    #[error("Configuration error: {0}")]
    Config(String),

    /// Provider errors keep the provider's text as their display
    #[error(transparent)]
    Veo(#[from] vgen_veo::VeoError),

    #[error("Firestore error: {0}")]
    Firestore(#[from] vgen_firestore::FirestoreError),

    #[error("Storage error: {0}")]
    Storage(#[from] vgen_storage::StorageError),

    #[error("Media error: {0}")]
    Media(#[from] vgen_media::MediaError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SequencerError {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn is_write_conflict(&self) -> bool {
        matches!(self, Self::WriteConflict(_))
    }

    /// Single-line message stored on a failed scene or video.
    ///
    /// Provider errors pass through untouched; everything else is reduced to
    /// its first line.
    pub fn failure_message(&self) -> String {
        match self {
            Self::Veo(vgen_veo::VeoError::Provider { message, .. }) => message.clone(),
            Self::Media(e) => e.summary(),
            other => other
                .to_string()
                .lines()
                .next()
                .unwrap_or_default()
                .trim()
                .to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_message_is_verbatim() {
        let err = SequencerError::from(vgen_veo::VeoError::provider(
            Some(3),
            "Video generation failed due to safety filters.\nTry rephrasing.",
        ));
        assert_eq!(
            err.failure_message(),
            "Video generation failed due to safety filters.\nTry rephrasing."
        );
    }

    #[test]
    fn test_other_messages_are_one_line() {
        let err = SequencerError::Export("concat failed\nstderr tail".into());
        assert_eq!(err.failure_message(), "Export failed: concat failed");
    }
}

//! Input validation for generation requests.
//!
//! Everything here runs before any network call is made.

use thiserror::Error;

use crate::generation::GenerationConfig;
use crate::model::ModelVariant;

pub const MIN_PROMPT_CHARS: usize = 10;
pub const MAX_PROMPT_CHARS: usize = 2000;
pub const MAX_NEGATIVE_PROMPT_CHARS: usize = 1000;
pub const MIN_DURATION_SECS: u32 = 1;
pub const MAX_DURATION_SECS: u32 = 8;

/// Validation failures surfaced to the user verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Prompt is too short: {actual} characters (minimum {min})")]
    PromptTooShort { min: usize, actual: usize },

    #[error("Prompt is too long: {actual} characters (maximum {max})")]
    PromptTooLong { max: usize, actual: usize },

    #[error("Negative prompt is too long: {actual} characters (maximum {max})")]
    NegativePromptTooLong { max: usize, actual: usize },

    #[error("Duration must be between {min} and {max} seconds, got {actual}")]
    DurationOutOfRange { min: u32, max: u32, actual: u32 },

    #[error("{model} does not support {resolution} at {aspect_ratio}")]
    UnsupportedFormat {
        model: String,
        aspect_ratio: String,
        resolution: String,
    },

    #[error("Invalid reorder: {0}")]
    InvalidReorder(String),

    #[error("Invalid continuity: {0}")]
    InvalidContinuity(String),

    #[error("{0}")]
    Field(String),
}

impl ValidationError {
    pub fn field(msg: impl Into<String>) -> Self {
        Self::Field(msg.into())
    }
}

/// Convert `validator` derive failures into a single user-facing message.
impl From<validator::ValidationErrors> for ValidationError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut messages: Vec<String> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| match &e.message {
                    Some(msg) => format!("{}: {}", field, msg),
                    None => format!("{}: invalid value ({})", field, e.code),
                })
            })
            .collect();
        messages.sort();
        Self::Field(messages.join("; "))
    }
}

/// Validate prompt length, counted in characters after trimming.
pub fn validate_prompt(prompt: &str) -> Result<(), ValidationError> {
    let len = prompt.trim().chars().count();
    if len < MIN_PROMPT_CHARS {
        return Err(ValidationError::PromptTooShort {
            min: MIN_PROMPT_CHARS,
            actual: len,
        });
    }
    if len > MAX_PROMPT_CHARS {
        return Err(ValidationError::PromptTooLong {
            max: MAX_PROMPT_CHARS,
            actual: len,
        });
    }
    Ok(())
}

pub fn validate_duration(duration_secs: u32) -> Result<(), ValidationError> {
    if !(MIN_DURATION_SECS..=MAX_DURATION_SECS).contains(&duration_secs) {
        return Err(ValidationError::DurationOutOfRange {
            min: MIN_DURATION_SECS,
            max: MAX_DURATION_SECS,
            actual: duration_secs,
        });
    }
    Ok(())
}

/// Validate a full generation request: prompt, duration and model format support.
pub fn validate_generation(
    prompt: &str,
    model: ModelVariant,
    config: &GenerationConfig,
) -> Result<(), ValidationError> {
    validate_prompt(prompt)?;
    validate_duration(config.duration_secs)?;

    if let Some(ref negative) = config.negative_prompt {
        let len = negative.chars().count();
        if len > MAX_NEGATIVE_PROMPT_CHARS {
            return Err(ValidationError::NegativePromptTooLong {
                max: MAX_NEGATIVE_PROMPT_CHARS,
                actual: len,
            });
        }
    }

    if !model.supports(config.aspect_ratio, config.resolution) {
        return Err(ValidationError::UnsupportedFormat {
            model: model.display_name().to_string(),
            aspect_ratio: config.aspect_ratio.to_string(),
            resolution: config.resolution.to_string(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AspectRatio, Resolution};

    #[test]
    fn test_prompt_of_exactly_ten_chars_is_accepted() {
        assert!(validate_prompt("0123456789").is_ok());
    }

    #[test]
    fn test_prompt_of_nine_chars_is_too_short() {
        let err = validate_prompt("012345678").unwrap_err();
        assert_eq!(err, ValidationError::PromptTooShort { min: 10, actual: 9 });
        assert!(err.to_string().contains("too short"));
    }

    #[test]
    fn test_prompt_upper_bound() {
        assert!(validate_prompt(&"a".repeat(2000)).is_ok());
        let err = validate_prompt(&"a".repeat(2001)).unwrap_err();
        assert!(err.to_string().contains("too long"));
    }

    #[test]
    fn test_prompt_counts_characters_not_bytes() {
        // 10 multi-byte characters
        assert!(validate_prompt("éééééééééé").is_ok());
        // whitespace padding does not count
        assert!(validate_prompt("   short   ").is_err());
    }

    #[test]
    fn test_duration_bounds() {
        assert!(validate_duration(1).is_ok());
        assert!(validate_duration(8).is_ok());
        assert!(validate_duration(0).is_err());
        assert!(validate_duration(9).is_err());
    }

    #[test]
    fn test_unsupported_format_rejected() {
        let config = GenerationConfig {
            duration_secs: 8,
            aspect_ratio: AspectRatio::Portrait,
            resolution: Resolution::P1080,
            negative_prompt: None,
        };
        let err = validate_generation("A product shot of a sneaker", ModelVariant::Veo3, &config)
            .unwrap_err();
        assert!(matches!(err, ValidationError::UnsupportedFormat { .. }));
    }
}

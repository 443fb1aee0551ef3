//! Video model catalog: variants, aspect ratios, resolutions and pricing.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Video-generation model variants exposed to users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum ModelVariant {
    /// Veo 3: highest quality, native audio
    #[default]
    Veo3,
    /// Veo 3 Fast: lower latency and price, native audio
    Veo3Fast,
    /// Veo 2: silent clips, 720p only
    Veo2,
}

impl ModelVariant {
    pub const ALL: &'static [ModelVariant] =
        &[ModelVariant::Veo3, ModelVariant::Veo3Fast, ModelVariant::Veo2];

    pub fn as_str(&self) -> &'static str {
        match self {
            ModelVariant::Veo3 => "veo3",
            ModelVariant::Veo3Fast => "veo3_fast",
            ModelVariant::Veo2 => "veo2",
        }
    }

    /// Model identifier used by the generation API.
    pub fn api_model_id(&self) -> &'static str {
        match self {
            ModelVariant::Veo3 => "veo-3.0-generate-001",
            ModelVariant::Veo3Fast => "veo-3.0-fast-generate-001",
            ModelVariant::Veo2 => "veo-2.0-generate-001",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ModelVariant::Veo3 => "Veo 3",
            ModelVariant::Veo3Fast => "Veo 3 Fast",
            ModelVariant::Veo2 => "Veo 2",
        }
    }

    /// Price in USD per generated second.
    pub fn price_per_second(&self) -> f64 {
        match self {
            ModelVariant::Veo3 => 0.75,
            ModelVariant::Veo3Fast => 0.40,
            ModelVariant::Veo2 => 0.35,
        }
    }

    pub fn supports_audio(&self) -> bool {
        !matches!(self, ModelVariant::Veo2)
    }

    pub fn supported_resolutions(&self) -> &'static [Resolution] {
        match self {
            ModelVariant::Veo3 | ModelVariant::Veo3Fast => &[Resolution::P720, Resolution::P1080],
            ModelVariant::Veo2 => &[Resolution::P720],
        }
    }

    pub fn supported_aspect_ratios(&self) -> &'static [AspectRatio] {
        &[AspectRatio::Landscape, AspectRatio::Portrait]
    }

    /// Whether the model accepts `resolution` at `aspect_ratio`.
    ///
    /// 1080p output is only produced for landscape clips.
    pub fn supports(&self, aspect_ratio: AspectRatio, resolution: Resolution) -> bool {
        if !self.supported_aspect_ratios().contains(&aspect_ratio)
            || !self.supported_resolutions().contains(&resolution)
        {
            return false;
        }
        !(resolution == Resolution::P1080 && aspect_ratio != AspectRatio::Landscape)
    }

    pub fn info(&self) -> ModelInfo {
        ModelInfo {
            id: *self,
            api_model_id: self.api_model_id().to_string(),
            name: self.display_name().to_string(),
            price_per_second: self.price_per_second(),
            supports_audio: self.supports_audio(),
            resolutions: self.supported_resolutions().to_vec(),
            aspect_ratios: self.supported_aspect_ratios().to_vec(),
            min_duration_secs: crate::validation::MIN_DURATION_SECS,
            max_duration_secs: crate::validation::MAX_DURATION_SECS,
        }
    }
}

impl fmt::Display for ModelVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ModelVariant {
    type Err = ModelParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "veo3" | "veo-3" | "veo-3.0-generate-001" => Ok(ModelVariant::Veo3),
            "veo3_fast" | "veo-3-fast" | "veo-3.0-fast-generate-001" => Ok(ModelVariant::Veo3Fast),
            "veo2" | "veo-2" | "veo-2.0-generate-001" => Ok(ModelVariant::Veo2),
            _ => Err(ModelParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Error)]
#[error("Unknown model: {0}")]
pub struct ModelParseError(String);

/// Output aspect ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
pub enum AspectRatio {
    #[default]
    #[serde(rename = "16:9")]
    Landscape,
    #[serde(rename = "9:16")]
    Portrait,
}

impl AspectRatio {
    pub fn as_str(&self) -> &'static str {
        match self {
            AspectRatio::Landscape => "16:9",
            AspectRatio::Portrait => "9:16",
        }
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Output resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
pub enum Resolution {
    #[default]
    #[serde(rename = "720p")]
    P720,
    #[serde(rename = "1080p")]
    P1080,
}

impl Resolution {
    pub fn as_str(&self) -> &'static str {
        match self {
            Resolution::P720 => "720p",
            Resolution::P1080 => "1080p",
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Catalog entry returned by the models endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ModelInfo {
    pub id: ModelVariant,
    pub api_model_id: String,
    pub name: String,
    pub price_per_second: f64,
    pub supports_audio: bool,
    pub resolutions: Vec<Resolution>,
    pub aspect_ratios: Vec<AspectRatio>,
    pub min_duration_secs: u32,
    pub max_duration_secs: u32,
}

/// Full model catalog.
pub fn model_catalog() -> Vec<ModelInfo> {
    ModelVariant::ALL.iter().map(|m| m.info()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_parse_aliases() {
        assert_eq!("veo3".parse::<ModelVariant>().unwrap(), ModelVariant::Veo3);
        assert_eq!(
            "veo-3.0-fast-generate-001".parse::<ModelVariant>().unwrap(),
            ModelVariant::Veo3Fast
        );
        assert!("sora".parse::<ModelVariant>().is_err());
    }

    #[test]
    fn test_serde_names() {
        assert_eq!(serde_json::to_string(&ModelVariant::Veo3Fast).unwrap(), "\"veo3_fast\"");
        assert_eq!(serde_json::to_string(&AspectRatio::Portrait).unwrap(), "\"9:16\"");
        let res: Resolution = serde_json::from_str("\"1080p\"").unwrap();
        assert_eq!(res, Resolution::P1080);
    }

    #[test]
    fn test_supports_matrix() {
        assert!(ModelVariant::Veo3.supports(AspectRatio::Landscape, Resolution::P1080));
        assert!(!ModelVariant::Veo3.supports(AspectRatio::Portrait, Resolution::P1080));
        assert!(!ModelVariant::Veo2.supports(AspectRatio::Landscape, Resolution::P1080));
        assert!(ModelVariant::Veo2.supports(AspectRatio::Portrait, Resolution::P720));
    }

    #[test]
    fn test_catalog_covers_all_models() {
        let catalog = model_catalog();
        assert_eq!(catalog.len(), ModelVariant::ALL.len());
        assert!(catalog.iter().all(|m| m.price_per_second > 0.0));
    }
}

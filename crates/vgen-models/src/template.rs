//! Built-in prompt templates for marketing clips.

use schemars::JsonSchema;
use serde::Serialize;

use crate::model::{AspectRatio, ModelVariant};

#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct PromptTemplate {
    pub id: &'static str,
    pub name: &'static str,
    pub category: &'static str,
    pub prompt: &'static str,
    pub recommended_model: ModelVariant,
    pub aspect_ratio: AspectRatio,
    pub duration_secs: u32,
}

const TEMPLATES: &[PromptTemplate] = &[
    PromptTemplate {
        id: "product-hero",
        name: "Product Hero Shot",
        category: "product",
        prompt: "A slow cinematic orbit around [PRODUCT] on a clean pedestal, soft studio lighting, shallow depth of field, premium commercial look",
        recommended_model: ModelVariant::Veo3,
        aspect_ratio: AspectRatio::Landscape,
        duration_secs: 8,
    },
    PromptTemplate {
        id: "product-unboxing",
        name: "Unboxing Reveal",
        category: "product",
        prompt: "Top-down shot of hands opening a minimalist box to reveal [PRODUCT], natural window light, satisfying reveal moment",
        recommended_model: ModelVariant::Veo3Fast,
        aspect_ratio: AspectRatio::Portrait,
        duration_secs: 6,
    },
    PromptTemplate {
        id: "social-hook",
        name: "Scroll-Stopping Hook",
        category: "social",
        prompt: "Fast push-in on a person reacting with surprise to [SUBJECT], vibrant colors, handheld energy, vertical framing for social feeds",
        recommended_model: ModelVariant::Veo3Fast,
        aspect_ratio: AspectRatio::Portrait,
        duration_secs: 4,
    },
    PromptTemplate {
        id: "social-lifestyle",
        name: "Lifestyle Moment",
        category: "social",
        prompt: "Golden hour lifestyle scene of friends enjoying [PRODUCT] outdoors, warm tones, candid laughter, gentle camera drift",
        recommended_model: ModelVariant::Veo3,
        aspect_ratio: AspectRatio::Portrait,
        duration_secs: 8,
    },
    PromptTemplate {
        id: "brand-story",
        name: "Brand Story Opener",
        category: "brand",
        prompt: "Aerial establishing shot of a city waking up at dawn, mist over rooftops, camera glides toward a storefront with the sign [BRAND]",
        recommended_model: ModelVariant::Veo3,
        aspect_ratio: AspectRatio::Landscape,
        duration_secs: 8,
    },
    PromptTemplate {
        id: "brand-logo",
        name: "Logo Sting",
        category: "brand",
        prompt: "Abstract liquid metal shapes swirl and resolve into a clean emblem on a dark background, dramatic rim light",
        recommended_model: ModelVariant::Veo2,
        aspect_ratio: AspectRatio::Landscape,
        duration_secs: 5,
    },
    PromptTemplate {
        id: "real-estate-walkthrough",
        name: "Property Walkthrough",
        category: "real_estate",
        prompt: "Smooth gimbal walkthrough of a bright modern living room with floor-to-ceiling windows, late afternoon sun, inviting atmosphere",
        recommended_model: ModelVariant::Veo3Fast,
        aspect_ratio: AspectRatio::Landscape,
        duration_secs: 8,
    },
    PromptTemplate {
        id: "food-closeup",
        name: "Food Close-Up",
        category: "food",
        prompt: "Macro slow-motion shot of [DISH] being plated, steam rising, glistening sauce, warm restaurant lighting",
        recommended_model: ModelVariant::Veo3,
        aspect_ratio: AspectRatio::Portrait,
        duration_secs: 6,
    },
];

/// Templates, optionally limited to one category (case-insensitive).
pub fn templates(category: Option<&str>) -> Vec<PromptTemplate> {
    TEMPLATES
        .iter()
        .filter(|t| category.map_or(true, |c| t.category.eq_ignore_ascii_case(c)))
        .cloned()
        .collect()
}

pub fn find_template(id: &str) -> Option<&'static PromptTemplate> {
    TEMPLATES.iter().find(|t| t.id == id)
}

/// Distinct categories in catalog order.
pub fn template_categories() -> Vec<&'static str> {
    let mut categories: Vec<&'static str> = Vec::new();
    for t in TEMPLATES {
        if !categories.contains(&t.category) {
            categories.push(t.category);
        }
    }
    categories
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::GenerationConfig;
    use crate::validation::validate_generation;

    #[test]
    fn test_category_filter() {
        let social = templates(Some("SOCIAL"));
        assert_eq!(social.len(), 2);
        assert!(social.iter().all(|t| t.category == "social"));
        assert_eq!(templates(None).len(), TEMPLATES.len());
        assert!(templates(Some("unknown")).is_empty());
    }

    #[test]
    fn test_templates_are_valid_requests() {
        for t in TEMPLATES {
            let config = GenerationConfig {
                duration_secs: t.duration_secs,
                aspect_ratio: t.aspect_ratio,
                ..Default::default()
            };
            assert!(
                validate_generation(t.prompt, t.recommended_model, &config).is_ok(),
                "template {} is invalid",
                t.id
            );
        }
    }

    #[test]
    fn test_find_template() {
        assert!(find_template("brand-logo").is_some());
        assert!(find_template("nope").is_none());
        assert_eq!(template_categories()[0], "product");
    }
}

//! Shared data models for the VGen backend.
//!
//! This crate provides Serde-serializable types for:
//! - Sequences, scenes and reordering
//! - Single-clip generations
//! - The model catalog, pricing and cost tracking
//! - Prompt templates and usage stats
//! - Input validation

pub mod cost;
pub mod generation;
pub mod model;
pub mod reorder;
pub mod scene;
pub mod sequence;
pub mod stats;
pub mod template;
pub mod validation;
pub mod video;

// Re-export common types
pub use cost::{estimate_cost, CostEstimate, CostSummary};
pub use generation::{GenerationConfig, GenerationResult, GenerationStatus, DEFAULT_DURATION_SECS};
pub use model::{model_catalog, AspectRatio, ModelInfo, ModelVariant, Resolution};
pub use reorder::{ReorderEntry, ReorderOutcome, ReorderRequest};
pub use scene::{Continuity, Scene, SceneStatus, SceneUpdate};
pub use sequence::{
    ContinuityError, ExportResult, NewScene, NewSequence, SceneStatusView, Sequence, SequenceId,
    SequenceStatus, SequenceStatusView, SequenceUpdate,
};
pub use stats::{StatusCounts, UsageStats};
pub use template::{find_template, template_categories, templates, PromptTemplate};
pub use validation::{validate_generation, ValidationError};
pub use video::{GenerateVideoRequest, VideoGeneration, VideoId};

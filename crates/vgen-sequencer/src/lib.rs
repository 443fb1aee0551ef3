//! Sequence orchestration for the VGen backend.
//!
//! This crate provides:
//! - Sequence and scene CRUD on top of a versioned document store
//! - The clip pipeline: generate, probe, extract frames, upload
//! - Whole-sequence generation with last-frame continuity
//! - Export of a finished sequence into a single video
//! - Single-clip generations outside of sequences

pub mod backends;
pub mod config;
pub mod error;
pub mod exporter;
pub mod in_flight;
pub mod metrics;
pub mod pipeline;
pub mod service;
pub mod store;

#[cfg(test)]
mod service_tests;

pub use backends::{Ffmpeg, MediaProcessor, ObjectStorage, VideoGenerator};
pub use config::SequencerConfig;
pub use error::{SequencerError, SequencerResult};
pub use exporter::Exporter;
pub use in_flight::{Activity, InFlight, InFlightGuard};
pub use pipeline::{ClipJob, ClipKeys, ClipPipeline};
pub use service::SequencerService;
pub use store::{mutate_sequence, DocumentStore, FirestoreStore, MemoryStore};

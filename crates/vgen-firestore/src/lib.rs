//! Firestore REST API client.
//!
//! This crate provides:
//! - Typed, user-scoped repositories for sequences and single videos
//! - Service account authentication via gcp_auth (or a local emulator)
//! - Conditional writes on `updateTime` and retry with backoff

pub mod client;
pub mod error;
pub mod metrics;
pub mod retry;
pub mod sequence_repo;
pub mod token_cache;
pub mod types;
pub mod video_repo;


pub use client::{FirestoreClient, FirestoreConfig};
pub use error::{FirestoreError, FirestoreResult};
pub use retry::RetryConfig;
pub use sequence_repo::{SequenceRepository, Versioned};
pub use types::{Document, Value};
pub use video_repo::VideoRepository;

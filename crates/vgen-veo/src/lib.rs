//! Client for the Veo video generation API.
//!
//! This crate provides:
//! - Long-running operation submit/poll/download
//! - Optional reference image (the previous scene's last frame)
//! - Fixed-count retry on network errors and 5xx

pub mod client;
pub mod error;
pub mod retry;
pub mod types;


pub use client::{VeoClient, VeoConfig, DEFAULT_BASE_URL};
pub use error::{VeoError, VeoResult};
pub use retry::RetryPolicy;
pub use types::{GeneratedVideo, Operation, ReferenceImage, VideoRequest};

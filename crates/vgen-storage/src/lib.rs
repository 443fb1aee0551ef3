//! Cloudflare R2 storage client.
//!
//! This crate provides:
//! - File and byte upload/download
//! - Public or presigned object URLs
//! - Batch deletion for sequence and video cleanup
//! - The object key layout shared by generated assets

pub mod client;
pub mod error;
pub mod keys;

pub use client::{R2Client, R2Config};
pub use error::{StorageError, StorageResult, Transfer};
pub use keys::{content_type_for, AssetKind};

//! Vision model integration.
//!
//! - `client`: HTTP client for the remote vision model
//! - `response`: known reply shapes and the audit snapshot
//! - `normalize`: text extraction and strict analysis parsing

pub mod client;
pub mod normalize;
pub mod response;

use async_trait::async_trait;
use serde_json::Value;

use crate::Result;

pub use client::VisionClient;
pub use normalize::{normalize, Normalized, NormalizeError};

/// Anything that can score a base64 JPEG and return the model's raw reply
#[async_trait]
pub trait VisionBackend: Send + Sync {
    async fn analyze(&self, image_base64: &str) -> Result<Value>;
}

//! posture-guardian: writing-posture checks backed by a remote vision model.
//!
//! A webcam frame is scored by a vision-language model, the result is stored
//! next to the frame on disk, and an unqualified posture gets a short spoken
//! reminder from a remote TTS service.

pub mod analysis;
pub mod api;
pub mod config;
pub mod detector;
pub mod error;
pub mod records;
pub mod tts;
pub mod vision;

pub use error::{Error, Result};

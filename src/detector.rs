//! Detection pipeline: validate → vision → normalize → persist → speak.
//!
//! Persistence always happens before speech synthesis, so a record is never
//! lost because TTS was slow or failed. Only the vision step can fail a
//! request; storage and speech problems are logged and skipped.

use std::sync::Arc;
use std::time::Instant;

use base64::Engine;
use chrono::Local;
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::analysis::{AnalysisResult, PostureStatus};
use crate::records::{ApiResponse, RecordStore};
use crate::tts::SpeechBackend;
use crate::vision::{normalize, VisionBackend};
use crate::{Error, Result};

/// Shaped result returned to the caller of `/check`.
#[derive(Debug, Clone, Serialize)]
pub struct DetectionResponse {
    pub status: PostureStatus,
    pub score: u8,
    pub is_qualified: bool,
    pub issues: Vec<String>,
    pub suggestion: String,
    pub audio: Option<String>,
    pub raw_result: Value,
}

pub struct Detector {
    vision: Arc<dyn VisionBackend>,
    speech: Arc<dyn SpeechBackend>,
    store: Arc<RecordStore>,
}

impl Detector {
    pub fn new(
        vision: Arc<dyn VisionBackend>,
        speech: Arc<dyn SpeechBackend>,
        store: Arc<RecordStore>,
    ) -> Self {
        Self {
            vision,
            speech,
            store,
        }
    }

    /// Run one full detection for a base64 (or data-URI) image.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidInput`] for a missing or undecodable image,
    /// [`Error::AnalysisUnavailable`] when no usable analysis was obtained
    pub async fn check(&self, image: &str) -> Result<DetectionResponse> {
        let t_total = Instant::now();
        let timestamp = Local::now();

        let image_base64 = strip_data_uri(image);
        if image_base64.is_empty() {
            return Err(Error::InvalidInput("No image provided".into()));
        }
        let image_bytes = base64::engine::general_purpose::STANDARD
            .decode(image_base64)
            .map_err(|e| Error::InvalidInput(format!("image is not valid base64: {e}")))?;

        let raw = self.vision.analyze(image_base64).await.map_err(|e| {
            warn!("Vision call failed: {e}");
            Error::AnalysisUnavailable(e.to_string())
        })?;
        let normalized = normalize(&raw);

        let api_response = ApiResponse {
            parsed_result: normalized.analysis.clone(),
            full_api_response: Some(normalized.snapshot),
        };
        // Store errors are already logged by the store
        let saved = tokio::task::spawn_blocking({
            let store = self.store.clone();
            move || store.save(&image_bytes, &api_response, timestamp)
        })
        .await;
        if let Err(e) = saved {
            warn!("Record save task failed: {e}");
        }

        let Some(analysis) = normalized.analysis else {
            return Err(Error::AnalysisUnavailable(
                "vision response could not be parsed".into(),
            ));
        };

        let audio = if analysis.wants_reminder() {
            self.speech.synthesize(&analysis.suggestion).await
        } else {
            None
        };

        info!(
            "Detection complete: status={}, score={}, qualified={}, audio={} ({:.0}ms)",
            analysis.status,
            analysis.score,
            analysis.is_qualified,
            audio.is_some(),
            t_total.elapsed().as_secs_f64() * 1000.0,
        );

        Ok(shape_response(analysis, audio))
    }
}

fn shape_response(analysis: AnalysisResult, audio: Option<String>) -> DetectionResponse {
    let raw_result = serde_json::to_value(&analysis).unwrap_or(Value::Null);
    DetectionResponse {
        status: analysis.status,
        score: analysis.score,
        is_qualified: analysis.is_qualified,
        issues: analysis.issues,
        suggestion: analysis.suggestion,
        audio,
        raw_result,
    }
}

/// Drop a `data:image/...;base64,` prefix if present.
pub fn strip_data_uri(image: &str) -> &str {
    let image = image.trim();
    match image.split_once(',') {
        Some((_, payload)) => payload.trim(),
        None => image,
    }
}

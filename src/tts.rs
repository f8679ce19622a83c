//! Remote text-to-speech for spoken posture reminders.
//!
//! Posts the reminder to a ByteDance-style v3 unidirectional TTS endpoint and
//! returns the MP3 payload base64-encoded. Never fails the caller: any problem
//! is logged and reported as `None`.

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::{error, info, warn};

use crate::config::TtsConfig;
use crate::{Error, Result};

const AUDIO_FORMAT: &str = "mp3";
const SAMPLE_RATE: u32 = 24_000;

/// Anything that can turn reminder text into base64 audio
#[async_trait]
pub trait SpeechBackend: Send + Sync {
    async fn synthesize(&self, text: &str) -> Option<String>;
}

pub struct TtsClient {
    config: TtsConfig,
    client: Client,
}

impl TtsClient {
    /// # Errors
    ///
    /// Returns error if the API URL is empty or the HTTP client cannot be built
    pub fn new(config: TtsConfig) -> Result<Self> {
        if config.api_url.trim().is_empty() {
            return Err(Error::Config("tts api_url is empty".into()));
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        if config.api_key.is_empty() {
            warn!("TTS API key not configured, spoken reminders disabled");
        } else {
            info!("TTS client ready, speaker: {}", config.speaker);
        }

        Ok(Self { config, client })
    }

    fn request_body(&self, text: &str) -> Value {
        let additions = json!({
            "disable_markdown_filter": true,
            "enable_language_detector": true,
            "enable_latex_tn": true,
            "disable_default_bit_rate": true,
            "max_length_to_filter_parenthesis": 0,
            "cache_config": {
                "text_type": 1,
                "use_cache": true
            }
        });

        json!({
            "req_params": {
                "text": text,
                "speaker": self.config.speaker,
                // The API expects additions as an embedded JSON string
                "additions": additions.to_string(),
                "audio_params": {
                    "format": AUDIO_FORMAT,
                    "sample_rate": SAMPLE_RATE
                }
            }
        })
    }

    async fn request_audio(&self, text: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .post(&self.config.api_url)
            .header("x-api-key", &self.config.api_key)
            .header("X-Api-Resource-Id", &self.config.resource_id)
            .json(&self.request_body(text))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Tts(format!("API error {status}: {body}")));
        }

        let audio = response.bytes().await?;
        if audio.is_empty() {
            return Err(Error::Tts("empty audio payload".into()));
        }
        Ok(audio.to_vec())
    }
}

#[async_trait]
impl SpeechBackend for TtsClient {
    async fn synthesize(&self, text: &str) -> Option<String> {
        if self.config.api_key.is_empty() {
            warn!("TTS API key not configured, skipping synthesis");
            return None;
        }
        if text.trim().is_empty() {
            return None;
        }

        info!("Synthesizing reminder: {text}");

        match self.request_audio(text).await {
            Ok(audio) => {
                info!("TTS synthesis complete, {} bytes", audio.len());
                Some(base64::engine::general_purpose::STANDARD.encode(audio))
            }
            Err(Error::Http(e)) if e.is_timeout() => {
                error!("TTS request timed out");
                None
            }
            Err(e) => {
                error!("TTS request failed: {e}");
                None
            }
        }
    }
}

//! Vision model client.
//!
//! Sends the webcam frame plus the posture rubric to an OpenAI-compatible
//! `/responses` endpoint and hands back the reply untouched.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use super::VisionBackend;
use crate::analysis::POSTURE_PROMPT;
use crate::config::VisionConfig;
use crate::{Error, Result};

pub struct VisionClient {
    config: VisionConfig,
    client: Client,
}

impl VisionClient {
    /// # Errors
    ///
    /// Returns error if the base URL is empty or the HTTP client cannot be built
    pub fn new(config: VisionConfig) -> Result<Self> {
        if config.base_url.trim().is_empty() {
            return Err(Error::Config("vision base_url is empty".into()));
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        if config.api_key.is_empty() {
            warn!("Vision API key not configured, posture analysis will be unavailable");
        } else {
            info!("Vision client ready, model: {}", config.model);
        }

        Ok(Self { config, client })
    }

    fn endpoint(&self) -> String {
        format!("{}/responses", self.config.base_url.trim_end_matches('/'))
    }

    fn request_body(&self, image_base64: &str) -> Value {
        json!({
            "model": self.config.model,
            "input": [
                {
                    "role": "user",
                    "content": [
                        {
                            "type": "input_image",
                            "image_url": format!("data:image/jpeg;base64,{image_base64}")
                        },
                        {
                            "type": "input_text",
                            "text": POSTURE_PROMPT
                        }
                    ]
                }
            ]
        })
    }
}

#[async_trait]
impl VisionBackend for VisionClient {
    async fn analyze(&self, image_base64: &str) -> Result<Value> {
        if self.config.api_key.is_empty() {
            return Err(Error::Vision("API key not configured".into()));
        }

        debug!("Sending frame to vision model '{}'", self.config.model);

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.config.api_key)
            .json(&self.request_body(image_base64))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::Vision("request timed out".into())
                } else {
                    Error::Vision(format!("request failed: {e}"))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Vision(format!("API error {status}: {body}")));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| Error::Vision(format!("invalid response body: {e}")))
    }
}

//! Configuration management for posture-guardian.
//!
//! Loads config from a YAML file in standard locations, then lets
//! environment variables (and `.env`) override the API credentials.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub static_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 8000,
            static_dir: PathBuf::from("static"),
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct VisionConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://ark.cn-beijing.volces.com/api/v3".into(),
            model: "doubao-seed-1-6-vision-250815".into(),
            timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TtsConfig {
    pub api_key: String,
    pub api_url: String,
    pub resource_id: String,
    pub speaker: String,
    pub timeout_secs: u64,
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_url: "https://openspeech.bytedance.com/api/v3/tts/unidirectional".into(),
            resource_id: "volc.service_type.10029".into(),
            speaker: "zh_male_beijingxiaoye_emo_v2_mars_bigtts".into(),
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub dir: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("logs"),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub vision: VisionConfig,
    pub tts: TtsConfig,
    pub store: StoreConfig,
}

impl Config {
    /// Load configuration from YAML file, then apply environment overrides.
    ///
    /// Searches standard locations if no path is provided:
    /// 1. ./config.yaml
    /// 2. ~/.config/posture-guardian/config.yaml
    /// 3. /etc/posture-guardian/config.yaml
    pub fn load(path: Option<&Path>) -> Self {
        // Best-effort .env load; ignore if missing
        let _ = dotenvy::dotenv();

        let mut config = Self::load_file(path);
        config.apply_env(|key| std::env::var(key).ok());
        config
    }

    fn load_file(path: Option<&Path>) -> Self {
        let resolved = path.map(PathBuf::from).or_else(|| {
            let candidates = [
                std::env::current_dir().ok().map(|d| d.join("config.yaml")),
                dirs::home_dir().map(|h| h.join(".config/posture-guardian/config.yaml")),
                Some(PathBuf::from("/etc/posture-guardian/config.yaml")),
            ];
            candidates.into_iter().flatten().find(|p| p.exists())
        });

        let Some(config_path) = resolved else {
            info!("No config file found, using defaults");
            return Self::default();
        };

        match std::fs::read_to_string(&config_path) {
            Ok(contents) => match Self::from_yaml(&contents) {
                Ok(config) => {
                    info!("Loaded config from {}", config_path.display());
                    config
                }
                Err(e) => {
                    tracing::warn!("Failed to parse {}: {e}, using defaults", config_path.display());
                    Self::default()
                }
            },
            Err(e) => {
                tracing::warn!("Failed to read {}: {e}, using defaults", config_path.display());
                Self::default()
            }
        }
    }

    pub fn from_yaml(contents: &str) -> Result<Self, serde_yml::Error> {
        serde_yml::from_str(contents)
    }

    /// Override credentials and paths from the environment.
    ///
    /// Takes a lookup function so tests don't have to mutate process env.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = non_empty("ARK_API_KEY") {
            self.vision.api_key = v;
        }
        if let Some(v) = non_empty("ARK_MODEL_NAME") {
            self.vision.model = v;
        }
        if let Some(v) = non_empty("ARK_BASE_URL") {
            self.vision.base_url = v;
        }
        if let Some(v) = non_empty("TTS_API_KEY") {
            self.tts.api_key = v;
        }
        if let Some(v) = non_empty("TTS_SPEAKER") {
            self.tts.speaker = v;
        }
        if let Some(v) = non_empty("POSTURE_STORE_DIR") {
            self.store.dir = PathBuf::from(v);
        }
    }
}

//! Detection record store.
//!
//! Each detection is written as a pair of sibling files sharing a
//! millisecond-precision id:
//!
//! - `<dir>/images/<id>.jpg` — the decoded webcam frame
//! - `<dir>/results/<id>.json` — the analysis plus the full vision reply
//!
//! Ids look like `YYYYMMDD_HHMMSS_mmm`, so filename order is chronological.
//! Two saves in the same millisecond share an id and the later one wins.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::analysis::AnalysisResult;
use crate::{Error, Result};

const ID_FORMAT: &str = "%Y%m%d_%H%M%S_%3f";

/// What the vision step produced for one detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse {
    pub parsed_result: Option<AnalysisResult>,
    pub full_api_response: Option<Value>,
}

/// One persisted detection, as stored in `results/<id>.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionRecord {
    pub timestamp: String,
    pub id: String,
    pub date: String,
    pub image_filename: String,
    pub api_response: ApiResponse,
}

/// Where a saved record landed on disk.
#[derive(Debug, Clone)]
pub struct SavedRecord {
    pub id: String,
    pub image_path: PathBuf,
    pub result_path: PathBuf,
    pub timestamp: String,
}

pub fn record_id(timestamp: &DateTime<Local>) -> String {
    timestamp.format(ID_FORMAT).to_string()
}

pub struct RecordStore {
    images_dir: PathBuf,
    results_dir: PathBuf,
}

impl RecordStore {
    /// Open a store rooted at `dir`, creating the subdirectories if needed.
    ///
    /// # Errors
    ///
    /// Returns error if the directories cannot be created
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let store = Self {
            images_dir: dir.join("images"),
            results_dir: dir.join("results"),
        };
        fs::create_dir_all(&store.images_dir)?;
        fs::create_dir_all(&store.results_dir)?;

        info!("Record store ready at {}", dir.display());
        Ok(store)
    }

    /// Write the image and result files for one detection.
    ///
    /// Failures are logged here and returned as [`Error::Persistence`];
    /// callers are expected to carry on regardless.
    pub fn save(
        &self,
        image: &[u8],
        api_response: &ApiResponse,
        timestamp: DateTime<Local>,
    ) -> Result<SavedRecord> {
        let id = record_id(&timestamp);

        match self.write_pair(&id, image, api_response, &timestamp) {
            Ok(saved) => {
                info!(
                    "Saved detection record {id}: {}, {}",
                    saved.image_path.display(),
                    saved.result_path.display()
                );
                Ok(saved)
            }
            Err(e) => {
                error!("Failed to save detection record {id}: {e}");
                Err(Error::Persistence(e.to_string()))
            }
        }
    }

    fn write_pair(
        &self,
        id: &str,
        image: &[u8],
        api_response: &ApiResponse,
        timestamp: &DateTime<Local>,
    ) -> Result<SavedRecord> {
        let image_filename = format!("{id}.jpg");
        let image_path = self.images_dir.join(&image_filename);
        fs::write(&image_path, image)?;

        let record = DetectionRecord {
            timestamp: timestamp.format("%Y-%m-%dT%H:%M:%S%.6f").to_string(),
            id: id.to_string(),
            date: timestamp.format("%Y-%m-%d").to_string(),
            image_filename,
            api_response: api_response.clone(),
        };

        let result_path = self.results_dir.join(format!("{id}.json"));
        fs::write(&result_path, serde_json::to_string_pretty(&record)?)?;

        Ok(SavedRecord {
            id: record.id,
            image_path,
            result_path,
            timestamp: record.timestamp,
        })
    }

    /// Load records newest first, optionally limited to one day.
    ///
    /// Unreadable or corrupt result files are skipped with a warning.
    pub fn list(&self, date: Option<NaiveDate>, limit: usize) -> Vec<DetectionRecord> {
        let prefix = date.map(|d| d.format("%Y%m%d_").to_string());

        let entries = match fs::read_dir(&self.results_dir) {
            Ok(e) => e,
            Err(e) => {
                debug!("No results directory to list: {e}");
                return Vec::new();
            }
        };

        let mut names: Vec<String> = entries
            .filter_map(|e| e.ok())
            .filter_map(|e| {
                let name = e.file_name().to_string_lossy().to_string();
                let matches_date = prefix.as_deref().map_or(true, |p| name.starts_with(p));
                (name.ends_with(".json") && matches_date).then_some(name)
            })
            .collect();

        names.sort_by(|a, b| b.cmp(a)); // newest first
        names.truncate(limit);

        names
            .iter()
            .filter_map(|name| {
                let path = self.results_dir.join(name);
                match load_record(&path) {
                    Ok(record) => Some(record),
                    Err(e) => {
                        warn!("Skipping unreadable record {}: {e}", path.display());
                        None
                    }
                }
            })
            .collect()
    }
}

fn load_record(path: &Path) -> Result<DetectionRecord> {
    let contents = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&contents)?)
}

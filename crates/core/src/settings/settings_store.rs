use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::detection::domain::detection_params::DetectionParameters;
use crate::shared::constants::SETTINGS_FILE_NAME;

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("failed to write settings to {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Serialize)]
struct SettingsRecord {
    scale_factor: f64,
    min_neighbors: u32,
    min_size: u32,
}

/// Fields are read loosely so that one bad value only resets itself.
#[derive(Deserialize)]
struct RawRecord {
    scale_factor: Option<Value>,
    min_neighbors: Option<Value>,
    min_size: Option<Value>,
}

/// Persists [`DetectionParameters`] as a flat JSON record.
///
/// Loading never fails: anything missing or malformed falls back to the
/// defaults field by field.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store backed by `face_detection_settings.json` in the current directory.
    pub fn in_working_dir() -> Self {
        Self::new(SETTINGS_FILE_NAME)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> DetectionParameters {
        let json = match fs::read_to_string(&self.path) {
            Ok(json) => json,
            Err(e) => {
                if e.kind() == std::io::ErrorKind::NotFound {
                    log::debug!("No settings at {}, using defaults", self.path.display());
                } else {
                    log::warn!("Could not read {}: {e}, using defaults", self.path.display());
                }
                return DetectionParameters::default();
            }
        };

        let raw: RawRecord = match serde_json::from_str(&json) {
            Ok(raw) => raw,
            Err(e) => {
                log::warn!("Malformed settings in {}: {e}, using defaults", self.path.display());
                return DetectionParameters::default();
            }
        };

        let defaults = DetectionParameters::default();
        DetectionParameters {
            scale_factor: field(raw.scale_factor, "scale_factor", defaults.scale_factor, |v| {
                v.as_f64().filter(|&f| DetectionParameters::is_valid_scale_factor(f))
            }),
            min_neighbors: field(raw.min_neighbors, "min_neighbors", defaults.min_neighbors, as_u32),
            min_size: field(raw.min_size, "min_size", defaults.min_size, as_u32),
        }
    }

    pub fn save(&self, params: &DetectionParameters) -> Result<(), SettingsError> {
        let record = SettingsRecord {
            scale_factor: params.scale_factor,
            min_neighbors: params.min_neighbors,
            min_size: params.min_size,
        };
        let write_err = |source: std::io::Error| SettingsError::Write {
            path: self.path.display().to_string(),
            source,
        };
        let json = serde_json::to_string_pretty(&record).map_err(|e| write_err(e.into()))?;
        fs::write(&self.path, json).map_err(write_err)?;
        log::info!("Saved detection settings to {}", self.path.display());
        Ok(())
    }
}

fn field<T: std::fmt::Debug>(
    value: Option<Value>,
    name: &str,
    default: T,
    parse: impl Fn(&Value) -> Option<T>,
) -> T {
    match value {
        None => default,
        Some(v) => parse(&v).unwrap_or_else(|| {
            log::warn!("Ignoring invalid {name} {v} in settings, using {default:?}");
            default
        }),
    }
}

fn as_u32(value: &Value) -> Option<u32> {
    value.as_u64().and_then(|n| u32::try_from(n).ok())
}

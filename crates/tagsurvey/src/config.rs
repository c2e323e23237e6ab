//! Survey configuration.
//!
//! Built once during process startup and passed by reference into the
//! pipeline; nothing here mutates after load. Wait durations and attempt
//! bounds are fixed constants of the deployment, not adaptive values.

use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use tagsurvey_aruco::{Dictionary, DictionaryError};
use tagsurvey_core::{AreaSpec, AreaTable};

/// Errors loading a survey configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("malformed survey configuration: {0}")]
    Parse(#[from] serde_json::Error),
    #[error(transparent)]
    Dictionary(#[from] DictionaryError),
}

/// Motion-executor constants.
#[derive(Clone, Debug, Deserialize)]
pub struct MotionConfig {
    /// Maximum move commands issued per target pose.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Wait after a rejected move command before retrying.
    #[serde(default = "default_retry_wait_ms")]
    pub retry_wait_ms: u64,
    /// Wait after a successful move, letting residual motion die down.
    #[serde(default = "default_settle_wait_ms")]
    pub settle_wait_ms: u64,
}

impl MotionConfig {
    pub fn retry_wait(&self) -> Duration {
        Duration::from_millis(self.retry_wait_ms)
    }

    pub fn settle_wait(&self) -> Duration {
        Duration::from_millis(self.settle_wait_ms)
    }
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            retry_wait_ms: default_retry_wait_ms(),
            settle_wait_ms: default_settle_wait_ms(),
        }
    }
}

/// Frame-acquisition constants.
#[derive(Clone, Debug, Deserialize)]
pub struct CaptureConfig {
    /// Maximum capture attempts per frame.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Wait before every capture attempt, letting the camera settle.
    #[serde(default = "default_stabilization_wait_ms")]
    pub stabilization_wait_ms: u64,
    /// Wait after a rejected capture before retrying.
    #[serde(default = "default_retry_wait_ms")]
    pub retry_wait_ms: u64,
}

impl CaptureConfig {
    pub fn stabilization_wait(&self) -> Duration {
        Duration::from_millis(self.stabilization_wait_ms)
    }

    pub fn retry_wait(&self) -> Duration {
        Duration::from_millis(self.retry_wait_ms)
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            stabilization_wait_ms: default_stabilization_wait_ms(),
            retry_wait_ms: default_retry_wait_ms(),
        }
    }
}

/// Detection constants. The dictionary is deployment data (the reference
/// mission ships a 5×5-bit, 250-symbol set); it has no meaningful default.
#[derive(Clone, Debug, Deserialize)]
pub struct DetectionConfig {
    pub dictionary: Dictionary,
    /// Hamming budget when matching observed codes.
    #[serde(default = "default_max_hamming")]
    pub max_hamming: u8,
    /// Candidate cell pitch in pixels for the grid scan backend.
    #[serde(default = "default_cell_px")]
    pub cell_px: f32,
    /// Required fraction of black border cells.
    #[serde(default = "default_min_border_score")]
    pub min_border_score: f32,
}

/// Complete survey configuration.
#[derive(Clone, Debug, Deserialize)]
pub struct SurveyConfig {
    #[serde(default)]
    pub motion: MotionConfig,
    #[serde(default)]
    pub capture: CaptureConfig,
    pub detection: DetectionConfig,
    /// Area bounding boxes; search planes derive from these once, at load.
    #[serde(default)]
    pub areas: Vec<AreaSpec>,
    /// Gates debug-image persistence and verbose diagnostics.
    #[serde(default)]
    pub debug_mode: bool,
}

impl SurveyConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: SurveyConfig = serde_json::from_str(json)?;
        config.detection.dictionary.validate()?;
        Ok(config)
    }

    /// Derive the immutable per-area search-plane table.
    pub fn area_table(&self) -> AreaTable {
        AreaTable::from_specs(&self.areas)
    }
}

fn default_max_attempts() -> u32 {
    3
}

fn default_retry_wait_ms() -> u64 {
    500
}

fn default_settle_wait_ms() -> u64 {
    1500
}

fn default_stabilization_wait_ms() -> u64 {
    2000
}

fn default_max_hamming() -> u8 {
    3
}

fn default_cell_px() -> f32 {
    64.0
}

fn default_min_border_score() -> f32 {
    0.85
}

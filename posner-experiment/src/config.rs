use std::path::{Path, PathBuf};

use posner_core::{ExperimentError, Result};
use serde::{Deserialize, Serialize};

use crate::ctoa::{CtoaRange, validate_refresh};

/// Session parameters. Any subset can be overridden from JSON; missing
/// fields keep their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    /// Trial start to cue onset.
    pub fix_cue_soa_ms: f64,
    pub cue_duration_ms: f64,
    pub ctoa_range_ms: CtoaRange,
    /// How long the response collector waits before recording no response.
    pub response_window_ms: f64,
    /// Duration of one display refresh.
    pub refresh_ms: f64,
    /// Blank frames flipped back to back at setup to measure the refresh
    /// interval, which then replaces `refresh_ms`. Zero skips calibration.
    /// Only meaningful with a display that blocks on vertical sync.
    pub calibration_frames: usize,
    pub trials_per_block: usize,
    /// Include catch trials, on which no target appears.
    pub catch_trials: bool,
    /// Fixed seed for a reproducible session; drawn from the OS when unset.
    pub seed: Option<u64>,
    pub screen_size_px: (u32, u32),
    pub px_per_degree: f32,
    /// Shuffle which discrimination target each key stands for.
    pub counterbalance_discrimination: bool,
    pub results_path: PathBuf,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            fix_cue_soa_ms: 1000.0,
            cue_duration_ms: 100.0,
            ctoa_range_ms: CtoaRange {
                low_ms: 100.0,
                high_ms: 1000.0,
            },
            response_window_ms: 2000.0,
            refresh_ms: 1000.0 / 60.0,
            calibration_frames: 0,
            trials_per_block: 40,
            catch_trials: true,
            seed: None,
            screen_size_px: (1920, 1080),
            px_per_degree: 40.0,
            counterbalance_discrimination: true,
            results_path: PathBuf::from("posner_results.json"),
        }
    }
}

impl ExperimentConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ExperimentError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<()> {
        non_negative("fix_cue_soa_ms", self.fix_cue_soa_ms)?;
        non_negative("cue_duration_ms", self.cue_duration_ms)?;
        self.ctoa_range_ms.validate()?;
        validate_refresh(self.refresh_ms)?;
        if !(self.response_window_ms.is_finite() && self.response_window_ms > 0.0) {
            return Err(ExperimentError::invalid(format!(
                "response_window_ms must be positive, got {}",
                self.response_window_ms
            )));
        }
        if self.calibration_frames == 1 {
            return Err(ExperimentError::invalid(
                "calibration_frames must be 0 or at least 2 to measure a flip interval",
            ));
        }
        if self.trials_per_block == 0 {
            return Err(ExperimentError::invalid("trials_per_block must be at least 1"));
        }
        if !(self.px_per_degree.is_finite() && self.px_per_degree > 0.0) {
            return Err(ExperimentError::invalid("px_per_degree must be positive"));
        }
        Ok(())
    }
}

fn non_negative(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ExperimentError::invalid(format!(
            "{} must be a non-negative duration, got {}",
            name, value
        )))
    }
}

use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;

use posner_core::{ExperimentError, Result, TrialRecord};
use serde::Serialize;
use tracing::info;

pub fn write_results<W: Write>(records: &[TrialRecord], writer: W) -> Result<()> {
    serde_json::to_writer_pretty(writer, records).map_err(|e| ExperimentError::Io(e.to_string()))
}

pub fn read_results<R: Read>(reader: R) -> Result<Vec<TrialRecord>> {
    serde_json::from_reader(reader).map_err(|e| ExperimentError::Parse(e.to_string()))
}

pub fn save_results(records: &[TrialRecord], path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let mut writer = BufWriter::new(File::create(path)?);
    write_results(records, &mut writer)?;
    writer.flush()?;
    info!(path = %path.display(), trials = records.len(), "results saved");
    Ok(())
}

/// Response rate and reaction times over a session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultsSummary {
    pub trials: usize,
    pub responses: usize,
    pub response_rate: f64,
    pub catch_trials: usize,
    pub false_alarms: usize,
    pub mean_rt_ms: Option<f64>,
    pub min_rt_ms: Option<f64>,
    pub max_rt_ms: Option<f64>,
    /// Mean RT where the target appeared at the cued location.
    pub valid_mean_rt_ms: Option<f64>,
    pub invalid_mean_rt_ms: Option<f64>,
}

fn mean(xs: &[f64]) -> Option<f64> {
    (!xs.is_empty()).then(|| xs.iter().sum::<f64>() / xs.len() as f64)
}

impl ResultsSummary {
    pub fn from_records(records: &[TrialRecord]) -> Self {
        let responded: Vec<&TrialRecord> = records.iter().filter(|r| r.responded()).collect();
        let target_rts: Vec<f64> = responded
            .iter()
            .filter(|r| !r.catch_trial)
            .map(|r| r.rt)
            .collect();
        let valid: Vec<f64> = responded
            .iter()
            .filter(|r| r.validly_cued())
            .map(|r| r.rt)
            .collect();
        let invalid: Vec<f64> = responded
            .iter()
            .filter(|r| r.invalidly_cued())
            .map(|r| r.rt)
            .collect();

        Self {
            trials: records.len(),
            responses: responded.len(),
            response_rate: if records.is_empty() {
                0.0
            } else {
                responded.len() as f64 / records.len() as f64
            },
            catch_trials: records.iter().filter(|r| r.catch_trial).count(),
            false_alarms: responded.iter().filter(|r| r.catch_trial).count(),
            mean_rt_ms: mean(&target_rts),
            min_rt_ms: target_rts.iter().cloned().reduce(f64::min),
            max_rt_ms: target_rts.iter().cloned().reduce(f64::max),
            valid_mean_rt_ms: mean(&valid),
            invalid_mean_rt_ms: mean(&invalid),
        }
    }

    /// Invalid minus valid mean RT; positive means the cue helped.
    pub fn cueing_effect_ms(&self) -> Option<f64> {
        Some(self.invalid_mean_rt_ms? - self.valid_mean_rt_ms?)
    }

    pub fn log(&self) {
        info!(
            trials = self.trials,
            response_pct = self.response_rate * 100.0,
            false_alarms = self.false_alarms,
            catch_trials = self.catch_trials,
            mean_rt_ms = ?self.mean_rt_ms,
            cueing_effect_ms = ?self.cueing_effect_ms(),
            "session summary"
        );
    }
}

use posner_core::{Result, TrialRecord};
use tracing::info;

use crate::task::Experiment;

/// Drives an [`Experiment`] through setup, every block and trial, and
/// clean-up. Errors, including quit requests, stop the run at once; records
/// of finished trials stay available through [`results`](Self::results).
pub struct ExperimentRunner<E: Experiment> {
    pub experiment: E,
    results: Vec<TrialRecord>,
}

impl<E: Experiment> ExperimentRunner<E> {
    pub fn new(experiment: E) -> Self {
        Self {
            experiment,
            results: Vec::new(),
        }
    }

    pub fn run(&mut self) -> Result<&[TrialRecord]> {
        let mut session = self.experiment.setup()?;

        for _ in 0..session.block_count {
            self.experiment.block(&mut session)?;
            let trials = self.experiment.block_trials(&session)?;
            for factors in trials {
                session.begin_trial();
                let mut trial = self.experiment.prepare_trial(&session, factors)?;
                let record = self.experiment.run_trial(&session, &mut trial)?;
                self.results.push(record);
                self.experiment.clean_up_trial(&mut session)?;
            }
        }

        self.experiment.clean_up(&mut session)?;
        info!(trials = self.results.len(), "session complete");
        Ok(&self.results)
    }

    pub fn results(&self) -> &[TrialRecord] {
        &self.results
    }

    pub fn into_results(self) -> Vec<TrialRecord> {
        self.results
    }
}

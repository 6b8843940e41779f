use posner_core::{ExperimentError, Result};
use tracing::{debug, warn};

use crate::timer::Timer;

/// A named moment of a trial, `onset_ms` after the trial clock started.
#[derive(Debug, Clone, PartialEq)]
pub struct TrialEventTicket {
    pub label: String,
    pub onset_ms: f64,
}

impl TrialEventTicket {
    pub fn new(label: impl Into<String>, onset_ms: f64) -> Self {
        Self {
            label: label.into(),
            onset_ms,
        }
    }
}

/// Trial stopwatch: holds the registered tickets and answers whether each
/// has come due since `start_trial`.
#[derive(Debug, Clone)]
pub struct EventManager<T: Timer> {
    timer: T,
    trial_start: Option<u64>,
    tickets: Vec<TrialEventTicket>,
}

impl<T: Timer> EventManager<T> {
    pub fn new(timer: T) -> Self {
        Self {
            timer,
            trial_start: None,
            tickets: Vec::new(),
        }
    }

    /// Registers a ticket. A label registered twice keeps the later onset.
    pub fn register(&mut self, label: impl Into<String>, onset_ms: f64) {
        self.register_ticket(TrialEventTicket::new(label, onset_ms));
    }

    pub fn register_ticket(&mut self, ticket: TrialEventTicket) {
        if let Some(existing) = self.tickets.iter_mut().find(|t| t.label == ticket.label) {
            warn!(label = %ticket.label, "trial event registered twice, replacing onset");
            *existing = ticket;
        } else {
            debug!(label = %ticket.label, onset_ms = ticket.onset_ms, "trial event registered");
            self.tickets.push(ticket);
        }
    }

    /// Starts the trial clock; onsets are measured from here.
    pub fn start_trial(&mut self) {
        self.trial_start = Some(self.timer.now());
    }

    pub fn is_running(&self) -> bool {
        self.trial_start.is_some()
    }

    /// Milliseconds since `start_trial`, zero if the clock is not running.
    pub fn trial_time_ms(&self) -> f64 {
        match self.trial_start {
            Some(start) => self.timer.elapsed(start).as_nanos() as f64 / 1_000_000.0,
            None => 0.0,
        }
    }

    pub fn onset(&self, label: &str) -> Result<f64> {
        self.tickets
            .iter()
            .find(|t| t.label == label)
            .map(|t| t.onset_ms)
            .ok_or_else(|| ExperimentError::UnknownEvent(label.to_string()))
    }

    /// True once the ticket's onset has passed. Always false before
    /// `start_trial`.
    pub fn elapsed(&self, label: &str) -> Result<bool> {
        let onset = self.onset(label)?;
        if !self.is_running() {
            return Ok(false);
        }
        Ok(self.trial_time_ms() >= onset)
    }

    pub fn before(&self, label: &str) -> Result<bool> {
        self.elapsed(label).map(|e| !e)
    }

    pub fn tickets(&self) -> &[TrialEventTicket] {
        &self.tickets
    }

    /// Drops all tickets and stops the clock at trial end.
    pub fn clear(&mut self) {
        self.tickets.clear();
        self.trial_start = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::SimulatedTimer;
    use std::time::Duration;

    fn manager() -> (SimulatedTimer, EventManager<SimulatedTimer>) {
        let timer = SimulatedTimer::new(Duration::ZERO);
        (timer.clone(), EventManager::new(timer))
    }

    #[test]
    fn ticket_comes_due_at_onset() {
        let (clock, mut evm) = manager();
        evm.register("cue_onset", 100.0);
        evm.start_trial();
        assert!(evm.before("cue_onset").unwrap());
        clock.advance(Duration::from_millis(99));
        assert!(!evm.elapsed("cue_onset").unwrap());
        clock.advance(Duration::from_millis(1));
        assert!(evm.elapsed("cue_onset").unwrap());
    }

    #[test]
    fn nothing_elapses_before_the_clock_starts() {
        let (clock, mut evm) = manager();
        evm.register("cue_onset", 0.0);
        clock.advance(Duration::from_secs(5));
        assert!(!evm.elapsed("cue_onset").unwrap());
        evm.start_trial();
        assert!(evm.elapsed("cue_onset").unwrap());
    }

    #[test]
    fn unknown_labels_are_errors() {
        let (_, mut evm) = manager();
        evm.start_trial();
        assert_eq!(
            evm.elapsed("target_onset"),
            Err(ExperimentError::UnknownEvent("target_onset".into()))
        );
    }

    #[test]
    fn re_registering_replaces_onset() {
        let (_, mut evm) = manager();
        evm.register("cue_offset", 150.0);
        evm.register("cue_offset", 200.0);
        assert_eq!(evm.tickets().len(), 1);
        assert_eq!(evm.onset("cue_offset").unwrap(), 200.0);
    }

    #[test]
    fn clear_resets_trial() {
        let (_, mut evm) = manager();
        evm.register("response_period", 400.0);
        evm.start_trial();
        evm.clear();
        assert!(!evm.is_running());
        assert!(evm.tickets().is_empty());
        assert_eq!(evm.trial_time_ms(), 0.0);
    }
}

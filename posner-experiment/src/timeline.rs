//! Trial event timeline: when the cue appears, when it goes, and when the
//! response window opens, all as offsets from trial start.

use std::collections::BTreeMap;

use posner_timing::{EventManager, Timer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TrialEvent {
    CueOnset,
    CueOffset,
    ResponsePeriod,
}

impl TrialEvent {
    pub fn label(&self) -> &'static str {
        match self {
            TrialEvent::CueOnset => "cue_onset",
            TrialEvent::CueOffset => "cue_offset",
            TrialEvent::ResponsePeriod => "response_period",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimedEvent {
    pub event: TrialEvent,
    pub offset_ms: f64,
}

/// The three timed events of one trial. Built once during trial preparation.
#[derive(Debug, Clone, PartialEq)]
pub struct EventTimeline {
    events: [TimedEvent; 3],
}

impl EventTimeline {
    pub fn offset(&self, event: TrialEvent) -> f64 {
        self.events
            .iter()
            .find(|e| e.event == event)
            .map(|e| e.offset_ms)
            .unwrap_or_default()
    }

    pub fn cue_onset(&self) -> f64 {
        self.offset(TrialEvent::CueOnset)
    }

    pub fn cue_offset(&self) -> f64 {
        self.offset(TrialEvent::CueOffset)
    }

    pub fn response_period(&self) -> f64 {
        self.offset(TrialEvent::ResponsePeriod)
    }

    /// Events in phase order, which is not necessarily offset order.
    pub fn iter(&self) -> impl Iterator<Item = &TimedEvent> {
        self.events.iter()
    }

    pub fn to_map(&self) -> BTreeMap<&'static str, f64> {
        self.events
            .iter()
            .map(|e| (e.event.label(), e.offset_ms))
            .collect()
    }

    /// Hands every event to the event manager as a ticket.
    pub fn register<T: Timer>(&self, evm: &mut EventManager<T>) {
        for e in &self.events {
            evm.register(e.event.label(), e.offset_ms);
        }
    }
}

/// Offsets from trial start. The response window opens `ctoa_ms` after cue
/// onset, not after cue offset, so it may open while the cue is still shown.
/// Inputs are non-negative durations; `ExperimentConfig::validate` and the
/// CTOA sampler guarantee that for the task.
pub fn build_timeline(soa_ms: f64, cue_duration_ms: f64, ctoa_ms: f64) -> EventTimeline {
    let cue_onset = soa_ms;
    let cue_offset = cue_onset + cue_duration_ms;
    let response_period = cue_onset + ctoa_ms;

    EventTimeline {
        events: [
            TimedEvent {
                event: TrialEvent::CueOnset,
                offset_ms: cue_onset,
            },
            TimedEvent {
                event: TrialEvent::CueOffset,
                offset_ms: cue_offset,
            },
            TimedEvent {
                event: TrialEvent::ResponsePeriod,
                offset_ms: response_period,
            },
        ],
    }
}

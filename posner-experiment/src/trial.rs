use posner_core::{TrialFactors, TrialPhase};

use crate::timeline::EventTimeline;

/// Everything fixed for a trial once preparation is done.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedTrial {
    pub factors: TrialFactors,
    pub ctoa_ticks: u64,
    pub ctoa_ms: f64,
    pub timeline: EventTimeline,
    pub phase: TrialPhase,
}

impl PreparedTrial {
    pub fn new(factors: TrialFactors, ctoa_ticks: u64, ctoa_ms: f64, timeline: EventTimeline) -> Self {
        Self {
            factors,
            ctoa_ticks,
            ctoa_ms,
            timeline,
            phase: TrialPhase::Fixation,
        }
    }

    /// Moves to the next phase; stays on `Complete`.
    pub fn advance(&mut self) -> TrialPhase {
        if let Some(next) = self.phase.next() {
            self.phase = next;
        }
        self.phase
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timeline::build_timeline;
    use posner_core::{Side, TargetType};

    #[test]
    fn advance_saturates_at_complete() {
        let factors = TrialFactors {
            cue_loc: Side::Left,
            target_loc: Side::Left,
            target_type: TargetType::Plus,
            catch_trial: false,
        };
        let mut t = PreparedTrial::new(factors, 6, 100.02, build_timeline(1000.0, 100.0, 100.02));
        for _ in 0..10 {
            t.advance();
        }
        assert_eq!(t.phase, TrialPhase::Complete);
    }
}

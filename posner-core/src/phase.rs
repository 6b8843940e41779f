/// Execution phases of a single trial, in the order the trial loop walks them.
#[derive(Copy, Debug, Clone, PartialEq, Eq, Default)]
pub enum TrialPhase {
    /// Fixation shown, waiting for any key to start the trial clock.
    #[default]
    Fixation,
    /// Placeholders shown, waiting for `cue_onset`.
    AwaitingCue,
    /// Cued placeholder thickened, waiting for `cue_offset`.
    Cue,
    /// Cue removed, waiting for `response_period`.
    AwaitingTarget,
    /// Response collector running.
    Response,
    Complete,
}

impl TrialPhase {
    pub fn next(&self) -> Option<Self> {
        use TrialPhase::*;
        Some(match self {
            Fixation => AwaitingCue,
            AwaitingCue => Cue,
            Cue => AwaitingTarget,
            AwaitingTarget => Response,
            Response => Complete,
            Complete => return None,
        })
    }

    /// The timeline event that ends this phase, if the phase is clock driven.
    pub fn awaited_event(&self) -> Option<&'static str> {
        match self {
            TrialPhase::AwaitingCue => Some("cue_onset"),
            TrialPhase::Cue => Some("cue_offset"),
            TrialPhase::AwaitingTarget => Some("response_period"),
            _ => None,
        }
    }

    pub fn shows_cue(&self) -> bool {
        matches!(self, TrialPhase::Cue)
    }
}

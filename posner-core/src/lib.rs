pub mod error;
pub mod phase;
pub mod stimulus;
pub mod trial;

pub use error::{ExperimentError, Result};
pub use phase::TrialPhase;
pub use stimulus::{Frame, Location, Placement, Side, StimulusLayout, StimulusType, Stroke, TargetType};
pub use trial::{NO_RESPONSE, CATCH, Response, ResponseCondition, TrialFactors, TrialRecord};

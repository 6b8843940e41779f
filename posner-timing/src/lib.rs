pub mod events;
pub mod timer;

pub use events::{EventManager, TrialEventTicket};
pub use timer::{CalibrationStats, HighPrecisionTimer, SimulatedTimer, Timer};

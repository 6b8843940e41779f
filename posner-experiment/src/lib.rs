pub mod config;
pub mod ctoa;
pub mod display;
pub mod input;
pub mod keymap;
pub mod response;
pub mod results;
pub mod runner;
pub mod session;
pub mod task;
pub mod timeline;
pub mod trial;
pub mod variables;

pub use config::ExperimentConfig;
pub use ctoa::{CtoaRange, sample_ctoa};
pub use display::{Display, HeadlessDisplay};
pub use input::{InputEvent, InputSource, SimulatedParticipant};
pub use keymap::KeyMap;
pub use response::{DisplayArgs, KeyPressResponse};
pub use results::{ResultsSummary, read_results, save_results, write_results};
pub use runner::ExperimentRunner;
pub use session::SessionState;
pub use task::{Experiment, PosnerCueingTask};
pub use timeline::{EventTimeline, TimedEvent, TrialEvent, build_timeline};
pub use trial::PreparedTrial;
pub use variables::{IndependentVariable, PosnerVariables};

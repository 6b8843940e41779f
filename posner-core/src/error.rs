/// Error type shared by every crate of the task.
#[derive(Debug, Clone, PartialEq)]
pub enum ExperimentError {
    /// Bad timing bounds, refresh interval, key map or other setup value.
    InvalidConfiguration(String),
    /// The participant or operator asked to quit while a wait loop was polling.
    QuitRequested,
    /// An event name was queried before being registered for the trial.
    UnknownEvent(String),
    /// Reading configuration or writing results failed.
    Io(String),
    /// Configuration or results could not be (de)serialised.
    Parse(String),
}

impl std::fmt::Display for ExperimentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExperimentError::InvalidConfiguration(s) => write!(f, "invalid configuration: {}", s),
            ExperimentError::QuitRequested => write!(f, "quit requested"),
            ExperimentError::UnknownEvent(s) => write!(f, "no trial event registered as '{}'", s),
            ExperimentError::Io(s) => write!(f, "I/O error: {}", s),
            ExperimentError::Parse(s) => write!(f, "parse error: {}", s),
        }
    }
}

impl std::error::Error for ExperimentError {}

impl From<std::io::Error> for ExperimentError {
    fn from(e: std::io::Error) -> Self {
        ExperimentError::Io(e.to_string())
    }
}

impl ExperimentError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        ExperimentError::InvalidConfiguration(msg.into())
    }

    /// Quit requests end the run; everything else is a setup or I/O failure.
    pub fn is_quit(&self) -> bool {
        matches!(self, ExperimentError::QuitRequested)
    }
}

pub type Result<T> = std::result::Result<T, ExperimentError>;

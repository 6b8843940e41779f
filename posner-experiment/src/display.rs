use posner_core::{Frame, Result};
use tracing::trace;

/// Where frames and instruction pages go. A windowed renderer implements
/// this; the task never draws pixels itself.
pub trait Display {
    /// Replaces the screen contents with `frame` on the next flip.
    fn present(&mut self, frame: &Frame) -> Result<()>;

    /// Shows a centred text page.
    fn message(&mut self, text: &str) -> Result<()>;

    fn clear(&mut self) -> Result<()> {
        self.present(&Frame::blank())
    }
}

/// Display without a screen: keeps the last frame and, optionally, the full
/// history.
#[derive(Debug, Clone, Default)]
pub struct HeadlessDisplay {
    pub current: Frame,
    pub frames_presented: usize,
    pub history: Option<Vec<Frame>>,
    pub messages: Vec<String>,
}

impl HeadlessDisplay {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Display for HeadlessDisplay {
    fn present(&mut self, frame: &Frame) -> Result<()> {
        trace!(stimuli = frame.placements.len(), "flip");
        self.current = frame.clone();
        self.frames_presented += 1;
        if let Some(history) = &mut self.history {
            history.push(frame.clone());
        }
        Ok(())
    }

    fn message(&mut self, text: &str) -> Result<()> {
        trace!(text, "message");
        self.messages.push(text.to_string());
        self.present(&Frame::blank())
    }
}

use posner_core::{ExperimentError, Response, Result};
use posner_timing::Timer;
use tracing::debug;

use crate::input::{InputEvent, InputSource};
use crate::keymap::KeyMap;

/// Arguments handed to the display callback when collection starts.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DisplayArgs {
    pub present_target: bool,
}

/// Keypress response collector.
///
/// Listens for keys of `key_map` until one arrives (when `interrupts` is set)
/// or `terminate_after_ms` has passed. Unmapped keys are ignored. Without a
/// response the outcome is `NO_RESPONSE` with an RT of -1.
#[derive(Debug, Clone)]
pub struct KeyPressResponse {
    pub key_map: Option<KeyMap>,
    pub terminate_after_ms: f64,
    pub interrupts: bool,
    pub display_args: DisplayArgs,
    response: Option<Response>,
}

impl KeyPressResponse {
    pub fn new(terminate_after_ms: f64) -> Self {
        Self {
            key_map: None,
            terminate_after_ms,
            interrupts: true,
            display_args: DisplayArgs::default(),
            response: None,
        }
    }

    /// Runs one collection period. `display_callback` draws the response
    /// display once, before the first poll; RTs are measured from its return.
    pub fn collect<T, I, F>(
        &mut self,
        timer: &T,
        input: &mut I,
        mut display_callback: F,
    ) -> Result<Response>
    where
        T: Timer,
        I: InputSource + ?Sized,
        F: FnMut(&DisplayArgs) -> Result<()>,
    {
        let key_map = self
            .key_map
            .as_ref()
            .ok_or_else(|| ExperimentError::invalid("response collector has no key map"))?;

        display_callback(&self.display_args)?;

        let start = timer.now();
        let mut first: Option<Response> = None;
        loop {
            let rt = timer.elapsed(start).as_nanos() as f64 / 1_000_000.0;
            if rt >= self.terminate_after_ms {
                break;
            }
            match input.poll(timer.now_ms()) {
                Some(InputEvent::Quit) => return Err(ExperimentError::QuitRequested),
                Some(InputEvent::Key(key)) => match key_map.label_for(&key) {
                    Some(label) if first.is_none() => {
                        debug!(key_map = key_map.name(), key = %key, label, rt, "response");
                        first = Some(Response::new(label, rt));
                        if self.interrupts {
                            break;
                        }
                    }
                    Some(_) => {}
                    None => debug!(key = %key, "ignoring unmapped key"),
                },
                None => {}
            }
        }

        let response = first.unwrap_or_else(Response::none);
        self.response = Some(response.clone());
        Ok(response)
    }

    /// Outcome of the last collection; `NO_RESPONSE` if nothing was collected.
    pub fn response(&self) -> Response {
        self.response.clone().unwrap_or_default()
    }

    pub fn reset(&mut self) {
        self.response = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::ScriptedInput;
    use posner_core::NO_RESPONSE;
    use posner_timing::SimulatedTimer;
    use std::time::Duration;

    fn collector(timeout_ms: f64) -> KeyPressResponse {
        let mut rc = KeyPressResponse::new(timeout_ms);
        rc.key_map = Some(KeyMap::new("localize", &["z", "/"], &["left", "right"]).unwrap());
        rc
    }

    #[test]
    fn timeout_shorter_than_keypress_yields_no_response() {
        let timer = SimulatedTimer::new(Duration::from_micros(500));
        let mut input = ScriptedInput::new(vec![(500.0, InputEvent::Key("z".into()))]);
        let mut rc = collector(100.0);
        let r = rc.collect(&timer, &mut input, |_| Ok(())).unwrap();
        assert_eq!(r.value, NO_RESPONSE);
        assert_eq!(r.rt, -1.0);
        assert_eq!(rc.response(), Response::none());
    }

    #[test]
    fn mapped_key_ends_collection_with_rt() {
        let timer = SimulatedTimer::new(Duration::from_micros(100));
        let mut input = ScriptedInput::new(vec![
            (100.0, InputEvent::Key("q".into())),
            (300.0, InputEvent::Key("/".into())),
        ]);
        let mut rc = collector(2000.0);
        let mut drawn = Vec::new();
        rc.display_args.present_target = true;
        let r = rc
            .collect(&timer, &mut input, |args| {
                drawn.push(*args);
                Ok(())
            })
            .unwrap();
        assert_eq!(r.value, "right");
        assert!(r.rt >= 299.0 && r.rt < 301.0, "rt {}", r.rt);
        assert_eq!(drawn, [DisplayArgs { present_target: true }]);
        assert!(timer.peek() < 400_000_000);
    }

    #[test]
    fn non_interrupting_collector_waits_out_the_window() {
        let timer = SimulatedTimer::new(Duration::from_micros(100));
        let mut input = ScriptedInput::new(vec![
            (50.0, InputEvent::Key("z".into())),
            (60.0, InputEvent::Key("/".into())),
        ]);
        let mut rc = collector(500.0);
        rc.interrupts = false;
        let r = rc.collect(&timer, &mut input, |_| Ok(())).unwrap();
        assert_eq!(r.value, "left");
        assert!(timer.peek() >= 500_000_000);
    }

    #[test]
    fn quit_aborts_collection() {
        let timer = SimulatedTimer::new(Duration::from_micros(100));
        let mut input = ScriptedInput::new(vec![(10.0, InputEvent::Quit)]);
        let mut rc = collector(1000.0);
        assert_eq!(
            rc.collect(&timer, &mut input, |_| Ok(())),
            Err(ExperimentError::QuitRequested)
        );
    }

    #[test]
    fn missing_key_map_is_a_configuration_error() {
        let timer = SimulatedTimer::default();
        let mut rc = KeyPressResponse::new(100.0);
        let err = rc
            .collect(&timer, &mut ScriptedInput::default(), |_| Ok(()))
            .unwrap_err();
        assert!(matches!(err, ExperimentError::InvalidConfiguration(_)));
    }

    #[test]
    fn reset_forgets_last_response() {
        let timer = SimulatedTimer::new(Duration::from_micros(100));
        let mut input = ScriptedInput::new(vec![(1.0, InputEvent::Key("z".into()))]);
        let mut rc = collector(100.0);
        rc.collect(&timer, &mut input, |_| Ok(())).unwrap();
        assert_eq!(rc.response().value, "left");
        rc.reset();
        assert_eq!(rc.response(), Response::none());
    }
}

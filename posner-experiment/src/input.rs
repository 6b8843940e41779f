use posner_core::{ExperimentError, ResponseCondition, Result, TrialFactors};
use posner_timing::Timer;
use rand::Rng;
use rand::seq::IndexedRandom;
use tracing::{debug, info};

use crate::keymap::{KEY_SPACE, KeyMap};

#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// A key went down, by key name (`"z"`, `"/"`, `"spacebar"`).
    Key(String),
    /// Window closed or the quit chord was pressed.
    Quit,
}

/// Keyboard and application events, polled by the trial loop.
pub trait InputSource {
    fn poll(&mut self, now_ms: f64) -> Option<InputEvent>;

    /// Called right before the response collector starts listening.
    fn response_window_opened(
        &mut self,
        _condition: ResponseCondition,
        _key_map: &KeyMap,
        _factors: &TrialFactors,
        _now_ms: f64,
    ) {
    }

    /// Called once the response collector has returned.
    fn response_window_closed(&mut self) {}
}

/// One poll of the input source between timeline checks. Keys are dropped;
/// a quit request ends the run.
pub fn ui_request<I: InputSource + ?Sized>(input: &mut I, now_ms: f64) -> Result<()> {
    match input.poll(now_ms) {
        Some(InputEvent::Quit) => {
            info!("quit requested");
            Err(ExperimentError::QuitRequested)
        }
        _ => Ok(()),
    }
}

/// Blocks until any key is pressed and returns its name.
pub fn any_key<I: InputSource + ?Sized, T: Timer>(input: &mut I, timer: &T) -> Result<String> {
    loop {
        match input.poll(timer.now_ms()) {
            Some(InputEvent::Key(k)) => return Ok(k),
            Some(InputEvent::Quit) => {
                info!("quit requested");
                return Err(ExperimentError::QuitRequested);
            }
            None => {}
        }
    }
}

/// Replays events at fixed clock times. Once the script is exhausted it
/// answers every poll with `fallback`, if one is set.
#[cfg(test)]
#[derive(Debug, Clone, Default)]
pub struct ScriptedInput {
    events: std::collections::VecDeque<(f64, InputEvent)>,
    pub fallback: Option<InputEvent>,
}

#[cfg(test)]
impl ScriptedInput {
    pub fn new(mut events: Vec<(f64, InputEvent)>) -> Self {
        events.sort_by(|a, b| a.0.total_cmp(&b.0));
        Self {
            events: events.into(),
            fallback: None,
        }
    }

    pub fn with_fallback(mut self, event: InputEvent) -> Self {
        self.fallback = Some(event);
        self
    }

    pub fn remaining(&self) -> usize {
        self.events.len()
    }
}

#[cfg(test)]
impl InputSource for ScriptedInput {
    fn poll(&mut self, now_ms: f64) -> Option<InputEvent> {
        match self.events.front() {
            Some((at, _)) if *at <= now_ms => self.events.pop_front().map(|(_, e)| e),
            Some(_) => None,
            None => self.fallback.clone(),
        }
    }
}

/// Stand-in participant for headless sessions.
///
/// Outside a response window every poll is a spacebar press, which clears
/// "any key" prompts and is ignored elsewhere. Inside a window it answers
/// once after a uniform random RT, correctly with probability `accuracy`,
/// and on catch trials false-alarms with probability `false_alarm_rate`.
#[derive(Debug, Clone)]
pub struct SimulatedParticipant<R: Rng> {
    rng: R,
    pub rt_range_ms: (f64, f64),
    pub accuracy: f64,
    pub false_alarm_rate: f64,
    listening: bool,
    pending: Option<(f64, String)>,
}

impl<R: Rng> SimulatedParticipant<R> {
    pub fn new(rng: R) -> Self {
        Self {
            rng,
            rt_range_ms: (250.0, 650.0),
            accuracy: 0.9,
            false_alarm_rate: 0.1,
            listening: false,
            pending: None,
        }
    }

    fn correct_key<'a>(
        condition: ResponseCondition,
        key_map: &'a KeyMap,
        factors: &TrialFactors,
    ) -> Option<&'a str> {
        match condition {
            ResponseCondition::Detect => key_map.key_for("detect"),
            ResponseCondition::Localize => key_map.key_for(factors.target_loc.as_str()),
            ResponseCondition::Discriminate => key_map.key_for(factors.target_type.as_str()),
        }
    }
}

impl<R: Rng> InputSource for SimulatedParticipant<R> {
    fn poll(&mut self, now_ms: f64) -> Option<InputEvent> {
        if !self.listening {
            return Some(InputEvent::Key(KEY_SPACE.to_string()));
        }
        match &self.pending {
            Some((due, _)) if *due <= now_ms => {
                self.listening = false;
                self.pending.take().map(|(_, k)| InputEvent::Key(k))
            }
            _ => None,
        }
    }

    fn response_window_opened(
        &mut self,
        condition: ResponseCondition,
        key_map: &KeyMap,
        factors: &TrialFactors,
        now_ms: f64,
    ) {
        self.listening = true;
        let keys: Vec<&str> = key_map.keys().collect();
        let key = if factors.catch_trial {
            if self.rng.random_bool(self.false_alarm_rate.clamp(0.0, 1.0)) {
                keys.choose(&mut self.rng).copied()
            } else {
                None
            }
        } else {
            let correct = Self::correct_key(condition, key_map, factors);
            if self.rng.random_bool(self.accuracy.clamp(0.0, 1.0)) {
                correct
            } else {
                let wrong: Vec<&str> = keys.iter().copied().filter(|k| Some(*k) != correct).collect();
                wrong.choose(&mut self.rng).copied().or(correct)
            }
        };
        let (lo, hi) = self.rt_range_ms;
        let rt = if hi > lo { self.rng.random_range(lo..hi) } else { lo };
        debug!(?key, rt, "simulated participant planned response");
        self.pending = key.map(|k| (now_ms + rt, k.to_string()));
    }

    fn response_window_closed(&mut self) {
        self.listening = false;
        self.pending = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use posner_core::{Side, TargetType};
    use posner_timing::SimulatedTimer;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::time::Duration;

    fn factors(catch_trial: bool) -> TrialFactors {
        TrialFactors {
            cue_loc: Side::Left,
            target_loc: Side::Right,
            target_type: TargetType::X,
            catch_trial,
        }
    }

    #[test]
    fn scripted_events_wait_for_their_time() {
        let mut input = ScriptedInput::new(vec![
            (20.0, InputEvent::Key("/".into())),
            (10.0, InputEvent::Key("z".into())),
        ]);
        assert_eq!(input.poll(5.0), None);
        assert_eq!(input.poll(15.0), Some(InputEvent::Key("z".into())));
        assert_eq!(input.poll(15.0), None);
        assert_eq!(input.poll(25.0), Some(InputEvent::Key("/".into())));
        assert_eq!(input.remaining(), 0);
    }

    #[test]
    fn ui_request_surfaces_quit() {
        let mut input = ScriptedInput::new(vec![(0.0, InputEvent::Key("z".into()))])
            .with_fallback(InputEvent::Quit);
        assert!(ui_request(&mut input, 1.0).is_ok());
        assert_eq!(ui_request(&mut input, 2.0), Err(ExperimentError::QuitRequested));
    }

    #[test]
    fn any_key_polls_until_a_key() {
        let timer = SimulatedTimer::new(Duration::from_millis(1));
        let mut input = ScriptedInput::new(vec![(50.0, InputEvent::Key("z".into()))]);
        assert_eq!(any_key(&mut input, &timer).unwrap(), "z");
        assert!(timer.peek() >= 50_000_000);
    }

    #[test]
    fn accurate_participant_localizes_target() {
        let key_map = KeyMap::new("localize", &["z", "/"], &["left", "right"]).unwrap();
        let mut p = SimulatedParticipant::new(StdRng::seed_from_u64(1));
        p.accuracy = 1.0;
        p.rt_range_ms = (300.0, 300.0);
        p.response_window_opened(ResponseCondition::Localize, &key_map, &factors(false), 1000.0);
        assert_eq!(p.poll(1200.0), None);
        assert_eq!(p.poll(1300.0), Some(InputEvent::Key("/".into())));
        assert_eq!(p.poll(1400.0), Some(InputEvent::Key("spacebar".into())));
    }

    #[test]
    fn answers_follow_the_block_condition() {
        let maps = crate::keymap::condition_keymaps([TargetType::Plus, TargetType::X]).unwrap();
        let f = factors(false);
        for (condition, key) in [
            (ResponseCondition::Detect, "spacebar"),
            (ResponseCondition::Localize, "/"),
            (ResponseCondition::Discriminate, "/"),
        ] {
            let mut p = SimulatedParticipant::new(StdRng::seed_from_u64(4));
            p.accuracy = 1.0;
            p.rt_range_ms = (100.0, 100.0);
            p.response_window_opened(condition, &maps[&condition], &f, 0.0);
            assert_eq!(p.poll(100.0), Some(InputEvent::Key(key.into())), "{:?}", condition);
        }
    }

    #[test]
    fn catch_trial_without_false_alarm_stays_silent() {
        let key_map = KeyMap::new("detect", &["spacebar"], &["detect"]).unwrap();
        let mut p = SimulatedParticipant::new(StdRng::seed_from_u64(1));
        p.false_alarm_rate = 0.0;
        p.response_window_opened(ResponseCondition::Detect, &key_map, &factors(true), 0.0);
        assert_eq!(p.poll(10_000.0), None);
        p.response_window_closed();
        assert_eq!(p.poll(10_001.0), Some(InputEvent::Key("spacebar".into())));
    }
}

//! The cueing task as a pipeline of lifecycle calls driven from outside.

use std::time::Duration;

use posner_core::{ExperimentError, Frame, Result, TrialFactors, TrialRecord};
use posner_timing::{CalibrationStats, EventManager, Timer};
use rand::Rng;
use tracing::{debug, info};

use crate::config::ExperimentConfig;
use crate::ctoa::validate_refresh;
use crate::display::Display;
use crate::input::{InputSource, any_key, ui_request};
use crate::response::{DisplayArgs, KeyPressResponse};
use crate::session::SessionState;
use crate::timeline::build_timeline;
use crate::trial::PreparedTrial;
use crate::variables::PosnerVariables;

/// Lifecycle hooks an experiment exposes to [`ExperimentRunner`](crate::ExperimentRunner).
pub trait Experiment {
    type Trial;

    /// Validates configuration and builds the session state.
    fn setup(&mut self) -> Result<SessionState>;

    /// Enters the next block and presents its instructions.
    fn block(&mut self, session: &mut SessionState) -> Result<()>;

    /// Trial factors for the current block, in presentation order.
    fn block_trials(&mut self, session: &SessionState) -> Result<Vec<TrialFactors>>;

    fn prepare_trial(&mut self, session: &SessionState, factors: TrialFactors) -> Result<Self::Trial>;

    fn run_trial(&mut self, session: &SessionState, trial: &mut Self::Trial) -> Result<TrialRecord>;

    fn clean_up_trial(&mut self, session: &mut SessionState) -> Result<()>;

    fn clean_up(&mut self, _session: &mut SessionState) -> Result<()> {
        Ok(())
    }
}

/// Flips `frames` blank frames back to back and records the time between
/// successive flips. On a display that blocks until vertical sync this is
/// the refresh period.
fn calibrate<D: Display + ?Sized, T: Timer>(
    display: &mut D,
    timer: &mut T,
    frames: usize,
) -> Result<CalibrationStats> {
    let blank = Frame::blank();
    let mut last_flip: Option<u64> = None;
    for _ in 0..frames {
        display.present(&blank)?;
        let now = timer.now();
        if let Some(prev) = last_flip.replace(now) {
            timer.record_frame(Duration::from_nanos(now.saturating_sub(prev)));
        }
    }
    Ok(timer.calibration_stats())
}

fn log_frame_stats(stage: &str, frames: usize, stats: &CalibrationStats) {
    info!(
        stage,
        frames,
        mean_frame_ms = stats.average_frame_time_ns / 1_000_000.0,
        jitter_ms = stats.jitter_ns / 1_000_000.0,
        min_frame_ms = stats.min_frame_time_ns / 1_000_000.0,
        max_frame_ms = stats.max_frame_time_ns / 1_000_000.0,
        fps = stats.effective_fps,
        refresh_interval_ms = ?stats.refresh_interval_ms(),
        "display timing"
    );
}

pub struct PosnerCueingTask<T, I, D, R>
where
    T: Timer,
    I: InputSource,
    D: Display,
    R: Rng,
{
    pub config: ExperimentConfig,
    pub variables: PosnerVariables,
    timer: T,
    evm: EventManager<T>,
    input: I,
    display: D,
    rng: R,
    rc: KeyPressResponse,
}

impl<T, I, D, R> PosnerCueingTask<T, I, D, R>
where
    T: Timer,
    I: InputSource,
    D: Display,
    R: Rng,
{
    pub fn new(config: ExperimentConfig, timer: T, input: I, display: D, rng: R) -> Self {
        let rc = KeyPressResponse::new(config.response_window_ms);
        Self {
            config,
            variables: PosnerVariables::default(),
            evm: EventManager::new(timer.clone()),
            timer,
            input,
            display,
            rng,
            rc,
        }
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    /// Measures the flip interval and makes it the session's refresh
    /// interval, so CTOAs land on the refresh ticks the display really has.
    pub fn apply_calibration(&mut self, session: &mut SessionState) -> Result<()> {
        let stats = calibrate(&mut self.display, &mut self.timer, self.config.calibration_frames)?;
        log_frame_stats("calibration", self.timer.frame_count(), &stats);
        let refresh_ms = stats
            .refresh_interval_ms()
            .ok_or_else(|| ExperimentError::invalid("calibration recorded no flip intervals"))?;
        validate_refresh(refresh_ms)?;
        info!(
            configured_ms = session.refresh_ms,
            measured_ms = refresh_ms,
            "refresh interval calibrated"
        );
        session.refresh_ms = refresh_ms;
        Ok(())
    }

    /// Busy-polls until `label` has elapsed, letting the input source
    /// interrupt for quit on every pass.
    fn wait_until(&mut self, label: &str) -> Result<()> {
        while self.evm.before(label)? {
            ui_request(&mut self.input, self.timer.now_ms())?;
        }
        Ok(())
    }
}

impl<T, I, D, R> Experiment for PosnerCueingTask<T, I, D, R>
where
    T: Timer,
    I: InputSource,
    D: Display,
    R: Rng,
{
    type Trial = PreparedTrial;

    fn setup(&mut self) -> Result<SessionState> {
        self.config.validate()?;
        self.rc = KeyPressResponse::new(self.config.response_window_ms);
        // end the response period on the first valid key, right or wrong
        self.rc.interrupts = true;
        self.variables
            .catch_trial
            .set_value_enabled(&true, self.config.catch_trials);
        let mut session = SessionState::new(&self.config, &mut self.rng)?;
        if self.config.calibration_frames > 0 {
            self.apply_calibration(&mut session)?;
        }
        Ok(session)
    }

    fn block(&mut self, session: &mut SessionState) -> Result<()> {
        let condition = session.begin_block()?;
        info!(
            block = session.block_number,
            condition = condition.as_str(),
            "block started"
        );
        for page in session.instructions_for(condition) {
            self.display.message(page)?;
            any_key(&mut self.input, &self.timer)?;
        }
        Ok(())
    }

    fn block_trials(&mut self, session: &SessionState) -> Result<Vec<TrialFactors>> {
        self.variables
            .block_trials(session.trials_per_block, &mut self.rng)
    }

    fn prepare_trial(&mut self, session: &SessionState, factors: TrialFactors) -> Result<PreparedTrial> {
        self.rc.key_map = Some(session.keymap()?.clone());
        self.rc.display_args = DisplayArgs {
            present_target: factors.presents_target(),
        };

        let refresh_ms = session.refresh_ms;
        let ctoa_ticks = self
            .config
            .ctoa_range_ms
            .sample_ticks(refresh_ms, &mut self.rng)?;
        let ctoa_ms = ctoa_ticks as f64 * refresh_ms;

        let timeline = build_timeline(self.config.fix_cue_soa_ms, self.config.cue_duration_ms, ctoa_ms);

        // fixation alone until the participant starts the trial, then the
        // placeholders appear so the trial start is visible
        self.display.present(&Frame::fixation_only(&session.layout))?;
        any_key(&mut self.input, &self.timer)?;
        self.display
            .present(&Frame::trial_display(&session.layout, None, None))?;

        debug!(
            trial = session.trial_number,
            ctoa_ticks,
            ctoa_ms,
            timeline = ?timeline.to_map(),
            "trial prepared"
        );
        Ok(PreparedTrial::new(factors, ctoa_ticks, ctoa_ms, timeline))
    }

    fn run_trial(&mut self, session: &SessionState, trial: &mut PreparedTrial) -> Result<TrialRecord> {
        let condition = session.condition()?;
        trial.timeline.register(&mut self.evm);
        self.evm.start_trial();
        info!(
            block = session.block_number,
            trial = session.trial_number,
            ctoa_ms = trial.ctoa_ms,
            catch_trial = trial.factors.catch_trial,
            "trial started"
        );

        trial.advance();
        while let Some(label) = trial.phase.awaited_event() {
            self.wait_until(label)?;
            let phase = trial.advance();
            debug!(event = label, at_ms = self.evm.trial_time_ms(), "trial event");
            // the response display is drawn by the collector
            if phase.awaited_event().is_some() {
                let cue = phase.shows_cue().then_some(trial.factors.cue_loc);
                self.display
                    .present(&Frame::trial_display(&session.layout, cue, None))?;
            }
        }

        if let Some(key_map) = &self.rc.key_map {
            self.input.response_window_opened(
                condition,
                key_map,
                &trial.factors,
                self.timer.now_ms(),
            );
        }
        let factors = trial.factors;
        let layout = &session.layout;
        let display = &mut self.display;
        let collected = self.rc.collect(&self.timer, &mut self.input, |args| {
            let target = args
                .present_target
                .then_some((factors.target_type, factors.target_loc));
            display.present(&Frame::trial_display(layout, None, target))
        });
        self.input.response_window_closed();
        let response = collected?;
        trial.advance();

        info!(
            trial = session.trial_number,
            response = %response.value,
            rt = response.rt,
            "trial complete"
        );
        Ok(TrialRecord::new(
            session.block_number,
            session.trial_number,
            condition,
            &trial.factors,
            trial.ctoa_ms,
            response,
        ))
    }

    fn clean_up_trial(&mut self, session: &mut SessionState) -> Result<()> {
        self.display.clear()?;
        self.rc.reset();
        debug!(events = self.evm.tickets().len(), "trial events cleared");
        self.evm.clear();
        if session.is_last_trial_of_block() {
            session.current_condition = None;
        }
        Ok(())
    }

    fn clean_up(&mut self, session: &mut SessionState) -> Result<()> {
        log_frame_stats(
            "session",
            self.timer.frame_count(),
            &self.timer.calibration_stats(),
        );
        info!(refresh_ms = session.refresh_ms, "CTOAs quantised to refresh interval");
        Ok(())
    }
}

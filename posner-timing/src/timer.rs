use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Monotonic clock the trial loop reads, sleeps on, and feeds frame timings to.
///
/// Timestamps are nanoseconds since the timer was created.
pub trait Timer: Clone + Send + Sync {
    fn now(&self) -> u64;
    fn sleep(&self, d: Duration);
    fn record_frame(&mut self, d: Duration);
    fn frame_times(&self) -> &VecDeque<Duration>;

    fn elapsed(&self, ts: u64) -> Duration {
        Duration::from_nanos(self.now().saturating_sub(ts))
    }

    fn now_ms(&self) -> f64 {
        self.now() as f64 / 1_000_000.0
    }

    fn frame_count(&self) -> usize {
        self.frame_times().len()
    }

    fn calibration_stats(&self) -> CalibrationStats {
        CalibrationStats::from_frame_times(self.frame_times())
    }
}

/// Summary of recorded flip intervals.
#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationStats {
    pub average_frame_time_ns: f64,
    pub jitter_ns: f64,
    pub min_frame_time_ns: f64,
    pub max_frame_time_ns: f64,
    pub effective_fps: f64,
}

impl CalibrationStats {
    pub fn from_frame_times<'a>(frames: impl IntoIterator<Item = &'a Duration>) -> Self {
        let times: Vec<f64> = frames.into_iter().map(|d| d.as_nanos() as f64).collect();
        if times.is_empty() {
            return CalibrationStats {
                average_frame_time_ns: 0.0,
                jitter_ns: 0.0,
                min_frame_time_ns: 0.0,
                max_frame_time_ns: 0.0,
                effective_fps: 0.0,
            };
        }
        let avg = times.iter().sum::<f64>() / times.len() as f64;
        let var = times.iter().map(|x| (x - avg).powi(2)).sum::<f64>() / times.len() as f64;
        let min = times.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = times.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        CalibrationStats {
            average_frame_time_ns: avg,
            jitter_ns: var.sqrt(),
            min_frame_time_ns: min,
            max_frame_time_ns: max,
            effective_fps: if avg > 0.0 { 1e9 / avg } else { 0.0 },
        }
    }

    /// Mean recorded interval between flips in ms, `None` until at least one
    /// interval was recorded.
    pub fn refresh_interval_ms(&self) -> Option<f64> {
        (self.average_frame_time_ns > 0.0).then(|| self.average_frame_time_ns / 1_000_000.0)
    }
}

fn push_frame(frames: &mut VecDeque<Duration>, max_samples: usize, d: Duration) {
    if frames.len() >= max_samples {
        frames.pop_front();
    }
    frames.push_back(d);
}

/// Wall clock timer with platform specific sleeps.
#[derive(Debug, Clone)]
pub struct HighPrecisionTimer {
    pub start: Instant,
    pub frame_times: VecDeque<Duration>,
    pub max_samples: usize,
}

impl Timer for HighPrecisionTimer {
    fn now(&self) -> u64 {
        self.start.elapsed().as_nanos() as u64
    }
    fn sleep(&self, d: Duration) {
        self.high_precision_sleep(d)
    }
    fn record_frame(&mut self, d: Duration) {
        push_frame(&mut self.frame_times, self.max_samples, d);
    }
    fn frame_times(&self) -> &VecDeque<Duration> {
        &self.frame_times
    }
}

impl HighPrecisionTimer {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            frame_times: VecDeque::with_capacity(1000),
            max_samples: 1000,
        }
    }

    pub fn high_precision_sleep(&self, duration: Duration) {
        #[cfg(target_os = "windows")]
        self.windows_sleep(duration);
        #[cfg(target_os = "linux")]
        self.linux_sleep(duration);
        #[cfg(target_os = "macos")]
        self.macos_sleep(duration);
        #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
        std::thread::sleep(duration);
    }

    #[cfg(target_os = "windows")]
    fn windows_sleep(&self, duration: Duration) {
        use windows::Win32::Foundation::CloseHandle;
        use windows::Win32::System::Threading::{
            CreateWaitableTimerW, SetWaitableTimer, WaitForSingleObject, INFINITE,
        };

        unsafe {
            let Ok(timer) = CreateWaitableTimerW(None, true, None) else {
                std::thread::sleep(duration);
                return;
            };

            // Negative due time is relative, in 100 ns intervals.
            let due_time = -((duration.as_nanos() / 100) as i64);

            if SetWaitableTimer(timer, &due_time, 0, None, None, false).is_ok() {
                WaitForSingleObject(timer, INFINITE);
            }

            let _ = CloseHandle(timer);
        }
    }

    #[cfg(target_os = "linux")]
    fn linux_sleep(&self, duration: Duration) {
        use libc::{clock_nanosleep, timespec, CLOCK_MONOTONIC};

        let req = timespec {
            tv_sec: duration.as_secs() as libc::time_t,
            tv_nsec: duration.subsec_nanos() as libc::c_long,
        };

        unsafe {
            clock_nanosleep(CLOCK_MONOTONIC, 0, &req, std::ptr::null_mut());
        }
    }

    #[cfg(target_os = "macos")]
    fn macos_sleep(&self, duration: Duration) {
        use mach2::mach_time::{mach_absolute_time, mach_timebase_info, mach_timebase_info_data_t};

        if duration.as_nanos() < 100_000 {
            unsafe {
                let start = mach_absolute_time();
                let mut timebase = mach_timebase_info_data_t { numer: 0, denom: 0 };
                mach_timebase_info(&mut timebase);

                let target_ticks =
                    duration.as_nanos() as u64 * timebase.denom as u64 / timebase.numer as u64;

                while mach_absolute_time() - start < target_ticks {
                    std::hint::spin_loop();
                }
            }
        } else {
            std::thread::sleep(duration);
        }
    }
}

impl Default for HighPrecisionTimer {
    fn default() -> Self {
        Self::new()
    }
}

/// Virtual clock for headless sessions and tests.
///
/// Every `now()` advances the shared clock by `step`, so busy-poll loops make
/// progress without sleeping; `sleep()` jumps ahead by the requested amount.
/// Clones share the same clock.
#[derive(Debug, Clone)]
pub struct SimulatedTimer {
    clock_ns: Arc<AtomicU64>,
    step_ns: u64,
    frame_times: VecDeque<Duration>,
    max_samples: usize,
}

impl SimulatedTimer {
    pub fn new(step: Duration) -> Self {
        Self {
            clock_ns: Arc::new(AtomicU64::new(0)),
            step_ns: step.as_nanos() as u64,
            frame_times: VecDeque::with_capacity(1000),
            max_samples: 1000,
        }
    }

    /// Moves the clock forward without counting as a read.
    pub fn advance(&self, d: Duration) {
        self.clock_ns
            .fetch_add(d.as_nanos() as u64, Ordering::SeqCst);
    }

    /// Current clock value without advancing it.
    pub fn peek(&self) -> u64 {
        self.clock_ns.load(Ordering::SeqCst)
    }
}

impl Default for SimulatedTimer {
    fn default() -> Self {
        Self::new(Duration::from_micros(100))
    }
}

impl Timer for SimulatedTimer {
    fn now(&self) -> u64 {
        self.clock_ns.fetch_add(self.step_ns, Ordering::SeqCst) + self.step_ns
    }
    fn sleep(&self, d: Duration) {
        self.advance(d);
    }
    fn record_frame(&mut self, d: Duration) {
        push_frame(&mut self.frame_times, self.max_samples, d);
    }
    fn frame_times(&self) -> &VecDeque<Duration> {
        &self.frame_times
    }
}

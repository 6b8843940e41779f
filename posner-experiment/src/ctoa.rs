//! Cue-target onset asynchrony sampling.
//!
//! A display can only change state on a refresh boundary, so CTOAs are drawn
//! as whole refresh ticks. The requested range is rounded to ticks first, which
//! may shift either boundary by up to half a tick.

use posner_core::{ExperimentError, Result};
use rand::Rng;

#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CtoaRange {
    pub low_ms: f64,
    pub high_ms: f64,
}

impl CtoaRange {
    pub fn new(low_ms: f64, high_ms: f64) -> Result<Self> {
        let range = Self { low_ms, high_ms };
        range.validate()?;
        Ok(range)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.low_ms.is_finite() || !self.high_ms.is_finite() {
            return Err(ExperimentError::invalid("CTOA bounds must be finite"));
        }
        if self.low_ms <= 0.0 || self.high_ms <= 0.0 {
            return Err(ExperimentError::invalid(format!(
                "CTOA bounds must be positive, got {}..{} ms",
                self.low_ms, self.high_ms
            )));
        }
        if self.low_ms >= self.high_ms {
            return Err(ExperimentError::invalid(format!(
                "CTOA lower bound {} ms is not below upper bound {} ms",
                self.low_ms, self.high_ms
            )));
        }
        Ok(())
    }

    /// Inclusive tick range, each bound rounded half to even.
    pub fn tick_bounds(&self, refresh_ms: f64) -> Result<(u64, u64)> {
        self.validate()?;
        validate_refresh(refresh_ms)?;
        let min_ticks = (self.low_ms / refresh_ms).round_ties_even() as u64;
        let max_ticks = (self.high_ms / refresh_ms).round_ties_even() as u64;
        Ok((min_ticks, max_ticks))
    }

    /// Uniform tick count from [`tick_bounds`](Self::tick_bounds).
    pub fn sample_ticks<R: Rng + ?Sized>(&self, refresh_ms: f64, rng: &mut R) -> Result<u64> {
        let (min_ticks, max_ticks) = self.tick_bounds(refresh_ms)?;
        Ok(rng.random_range(min_ticks..=max_ticks))
    }

    pub fn sample<R: Rng + ?Sized>(&self, refresh_ms: f64, rng: &mut R) -> Result<f64> {
        Ok(self.sample_ticks(refresh_ms, rng)? as f64 * refresh_ms)
    }
}

pub fn validate_refresh(refresh_ms: f64) -> Result<()> {
    if !refresh_ms.is_finite() || refresh_ms <= 0.0 {
        return Err(ExperimentError::invalid(format!(
            "refresh interval must be positive, got {} ms",
            refresh_ms
        )));
    }
    Ok(())
}

/// Draws a CTOA in ms between `low_ms` and `high_ms`, quantised to whole
/// multiples of `refresh_ms`.
pub fn sample_ctoa<R: Rng + ?Sized>(
    low_ms: f64,
    high_ms: f64,
    refresh_ms: f64,
    rng: &mut R,
) -> Result<f64> {
    CtoaRange { low_ms, high_ms }.sample(refresh_ms, rng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    const REFRESH_60HZ: f64 = 16.67;

    #[test]
    fn sixty_hz_range_rounds_to_ticks_six_through_sixty() {
        let range = CtoaRange::new(100.0, 1000.0).unwrap();
        assert_eq!(range.tick_bounds(REFRESH_60HZ).unwrap(), (6, 60));

        let allowed: Vec<f64> = (6..=60).map(|t| t as f64 * REFRESH_60HZ).collect();
        assert!((allowed[0] - 100.02).abs() < 1e-9);
        assert!((allowed[54] - 1000.2).abs() < 1e-9);

        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..2_000 {
            let ctoa = sample_ctoa(100.0, 1000.0, REFRESH_60HZ, &mut rng).unwrap();
            assert!(allowed.contains(&ctoa), "{} is not a tick multiple", ctoa);
        }
    }

    #[test]
    fn rounding_is_half_to_even() {
        // 25 / 10 = 2.5 rounds down to 2, 35 / 10 = 3.5 rounds up to 4
        let range = CtoaRange::new(25.0, 35.0).unwrap();
        assert_eq!(range.tick_bounds(10.0).unwrap(), (2, 4));
    }

    #[test]
    fn tick_counts_are_uniform() {
        let range = CtoaRange::new(100.0, 1000.0).unwrap();
        let mut rng = StdRng::seed_from_u64(42);
        let mut counts = [0u32; 61];
        let draws = 55_000;
        for _ in 0..draws {
            counts[range.sample_ticks(REFRESH_60HZ, &mut rng).unwrap() as usize] += 1;
        }
        assert!(counts[..6].iter().all(|&c| c == 0));
        let expected = draws as f64 / 55.0;
        for (ticks, &c) in counts.iter().enumerate().skip(6) {
            let dev = (c as f64 - expected).abs() / expected;
            assert!(dev < 0.2, "tick {} drawn {} times, expected ~{}", ticks, c, expected);
        }
    }

    #[test]
    fn invalid_bounds_are_configuration_errors() {
        let mut rng = StdRng::seed_from_u64(0);
        for (low, high, refresh) in [
            (1000.0, 100.0, 16.67),
            (100.0, 100.0, 16.67),
            (0.0, 100.0, 16.67),
            (-5.0, 100.0, 16.67),
            (100.0, 1000.0, 0.0),
            (100.0, 1000.0, -16.67),
            (100.0, f64::NAN, 16.67),
        ] {
            let err = sample_ctoa(low, high, refresh, &mut rng).unwrap_err();
            assert!(matches!(err, ExperimentError::InvalidConfiguration(_)), "{:?}", err);
        }
    }

    proptest! {
        #[test]
        fn ctoa_is_exact_refresh_multiple(
            low in 1u32..2_000,
            span in 1u32..2_000,
            refresh in 1u32..50,
            seed in any::<u64>(),
        ) {
            let mut rng = StdRng::seed_from_u64(seed);
            let refresh = refresh as f64;
            let ctoa = sample_ctoa(low as f64, (low + span) as f64, refresh, &mut rng).unwrap();
            prop_assert_eq!(ctoa % refresh, 0.0);
        }

        #[test]
        fn ctoa_stays_within_half_tick_of_range(
            low in 1.0f64..2_000.0,
            span in 1.0f64..2_000.0,
            refresh in 1.0f64..50.0,
            seed in any::<u64>(),
        ) {
            let mut rng = StdRng::seed_from_u64(seed);
            let high = low + span;
            let ticks = CtoaRange::new(low, high).unwrap().sample_ticks(refresh, &mut rng).unwrap();
            let ctoa = ticks as f64 * refresh;
            prop_assert!(ctoa >= low - refresh / 2.0 - 1e-9);
            prop_assert!(ctoa <= high + refresh / 2.0 + 1e-9);
            prop_assert_eq!((ctoa / refresh).round() as u64, ticks);
        }
    }
}

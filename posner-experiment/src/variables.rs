//! Independent variables and the trial lists drawn from them.

use posner_core::{ExperimentError, Result, Side, TargetType, TrialFactors};
use rand::Rng;
use rand::seq::{IndexedRandom, SliceRandom};

#[derive(Debug, Clone, PartialEq)]
pub struct WeightedValue<T> {
    pub value: T,
    /// Relative frequency; a value of weight 4 appears four times as often as
    /// one of weight 1.
    pub weight: u32,
    pub enabled: bool,
}

/// One randomised factor with optionally weighted levels.
#[derive(Debug, Clone, PartialEq)]
pub struct IndependentVariable<T> {
    pub name: &'static str,
    pub values: Vec<WeightedValue<T>>,
    /// A disabled variable stops varying: it contributes only its first
    /// enabled value.
    pub enabled: bool,
}

impl<T: Clone + PartialEq> IndependentVariable<T> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            values: Vec::new(),
            enabled: true,
        }
    }

    pub fn add_value(&mut self, value: T) -> &mut Self {
        self.add_weighted(value, 1)
    }

    pub fn add_weighted(&mut self, value: T, weight: u32) -> &mut Self {
        self.values.push(WeightedValue {
            value,
            weight,
            enabled: true,
        });
        self
    }

    pub fn add_values(&mut self, values: impl IntoIterator<Item = T>) -> &mut Self {
        for v in values {
            self.add_value(v);
        }
        self
    }

    pub fn set_value_enabled(&mut self, value: &T, enabled: bool) {
        for v in self.values.iter_mut().filter(|v| &v.value == value) {
            v.enabled = enabled;
        }
    }

    /// Enabled values, each repeated `weight` times.
    pub fn levels(&self) -> Result<Vec<T>> {
        let mut enabled = self.values.iter().filter(|v| v.enabled && v.weight > 0);
        if !self.enabled {
            return enabled
                .next()
                .map(|v| vec![v.value.clone()])
                .ok_or_else(|| self.no_values());
        }
        let levels: Vec<T> = enabled
            .flat_map(|v| std::iter::repeat_n(v.value.clone(), v.weight as usize))
            .collect();
        if levels.is_empty() {
            return Err(self.no_values());
        }
        Ok(levels)
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<T> {
        let levels = self.levels()?;
        levels.choose(rng).cloned().ok_or_else(|| self.no_values())
    }

    fn no_values(&self) -> ExperimentError {
        ExperimentError::invalid(format!("independent variable '{}' has no enabled values", self.name))
    }
}

/// The four factors of a cueing trial.
#[derive(Debug, Clone, PartialEq)]
pub struct PosnerVariables {
    pub cue_loc: IndependentVariable<Side>,
    pub target_loc: IndependentVariable<Side>,
    pub target_type: IndependentVariable<TargetType>,
    pub catch_trial: IndependentVariable<bool>,
}

impl Default for PosnerVariables {
    /// Equiprobable locations and targets; one catch trial in five.
    fn default() -> Self {
        let mut cue_loc = IndependentVariable::new("cue_loc");
        cue_loc.add_values([Side::Left, Side::Right]);
        let mut target_loc = IndependentVariable::new("target_loc");
        target_loc.add_values([Side::Left, Side::Right]);
        let mut target_type = IndependentVariable::new("target_type");
        target_type.add_values([TargetType::X, TargetType::Plus]);
        let mut catch_trial = IndependentVariable::new("catch_trial");
        catch_trial.add_value(true).add_weighted(false, 4);
        Self {
            cue_loc,
            target_loc,
            target_type,
            catch_trial,
        }
    }
}

impl PosnerVariables {
    /// Every combination of levels, weights expanded.
    pub fn full_factorial(&self) -> Result<Vec<TrialFactors>> {
        let cue_locs = self.cue_loc.levels()?;
        let target_locs = self.target_loc.levels()?;
        let target_types = self.target_type.levels()?;
        let catches = self.catch_trial.levels()?;

        let mut out =
            Vec::with_capacity(cue_locs.len() * target_locs.len() * target_types.len() * catches.len());
        for &cue_loc in &cue_locs {
            for &target_loc in &target_locs {
                for &target_type in &target_types {
                    for &catch_trial in &catches {
                        out.push(TrialFactors {
                            cue_loc,
                            target_loc,
                            target_type,
                            catch_trial,
                        });
                    }
                }
            }
        }
        Ok(out)
    }

    /// `n` trials: the factorial crossing repeated as often as needed,
    /// shuffled, then cut to length.
    pub fn block_trials<R: Rng + ?Sized>(&self, n: usize, rng: &mut R) -> Result<Vec<TrialFactors>> {
        let crossing = self.full_factorial()?;
        let repeats = n.div_ceil(crossing.len());
        let mut trials: Vec<TrialFactors> = crossing
            .iter()
            .cycle()
            .take(repeats * crossing.len())
            .copied()
            .collect();
        trials.shuffle(rng);
        trials.truncate(n);
        Ok(trials)
    }

    /// One independent draw per factor.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<TrialFactors> {
        Ok(TrialFactors {
            cue_loc: self.cue_loc.sample(rng)?,
            target_loc: self.target_loc.sample(rng)?,
            target_type: self.target_type.sample(rng)?,
            catch_trial: self.catch_trial.sample(rng)?,
        })
    }
}

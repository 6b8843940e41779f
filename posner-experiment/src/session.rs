//! Session-wide state, threaded explicitly through every trial call.

use std::collections::HashMap;

use posner_core::{ExperimentError, ResponseCondition, Result, StimulusLayout, TargetType};
use rand::Rng;
use rand::seq::SliceRandom;
use tracing::info;

use crate::config::ExperimentConfig;
use crate::keymap::{KeyMap, condition_keymaps};

#[derive(Debug, Clone)]
pub struct SessionState {
    /// Conditions not yet run; blocks pop from the back.
    pub remaining_conditions: Vec<ResponseCondition>,
    pub current_condition: Option<ResponseCondition>,
    pub keymaps: HashMap<ResponseCondition, KeyMap>,
    pub instructions: HashMap<ResponseCondition, Vec<String>>,
    /// Discrimination targets for the left and right key.
    pub target_mapping: [TargetType; 2],
    pub layout: StimulusLayout,
    /// Refresh interval CTOAs are quantised to. Starts at the configured
    /// value; calibration may replace it with the measured one.
    pub refresh_ms: f64,
    pub block_count: usize,
    pub trials_per_block: usize,
    pub block_number: usize,
    pub trial_number: usize,
}

impl SessionState {
    /// Shuffles the condition order and, when counterbalancing, the
    /// discrimination key assignment.
    pub fn new<R: Rng + ?Sized>(config: &ExperimentConfig, rng: &mut R) -> Result<Self> {
        let mut conditions = ResponseCondition::ALL.to_vec();
        conditions.shuffle(rng);

        let mut target_mapping = [TargetType::X, TargetType::Plus];
        if config.counterbalance_discrimination {
            target_mapping.shuffle(rng);
        }

        let keymaps = condition_keymaps(target_mapping)?;
        let instructions = instruction_pages(target_mapping);
        let layout = StimulusLayout::new(config.screen_size_px, config.px_per_degree);

        let order: Vec<&str> = conditions.iter().rev().map(|c| c.as_str()).collect();
        info!(
            ?order,
            z = target_mapping[0].as_str(),
            slash = target_mapping[1].as_str(),
            "session set up"
        );

        Ok(Self {
            block_count: conditions.len(),
            remaining_conditions: conditions,
            current_condition: None,
            keymaps,
            instructions,
            target_mapping,
            layout,
            refresh_ms: config.refresh_ms,
            trials_per_block: config.trials_per_block,
            block_number: 0,
            trial_number: 0,
        })
    }

    /// Enters the next block, taking a new condition unless one is still
    /// current.
    pub fn begin_block(&mut self) -> Result<ResponseCondition> {
        let condition = match self.current_condition {
            Some(c) => c,
            None => self.remaining_conditions.pop().ok_or_else(|| {
                ExperimentError::invalid("no response conditions left for another block")
            })?,
        };
        self.current_condition = Some(condition);
        self.block_number += 1;
        self.trial_number = 0;
        Ok(condition)
    }

    pub fn begin_trial(&mut self) -> usize {
        self.trial_number += 1;
        self.trial_number
    }

    pub fn condition(&self) -> Result<ResponseCondition> {
        self.current_condition
            .ok_or_else(|| ExperimentError::invalid("no response condition is active"))
    }

    pub fn keymap(&self) -> Result<&KeyMap> {
        let condition = self.condition()?;
        self.keymaps.get(&condition).ok_or_else(|| {
            ExperimentError::invalid(format!("no key map for {}", condition.as_str()))
        })
    }

    pub fn instructions_for(&self, condition: ResponseCondition) -> &[String] {
        self.instructions
            .get(&condition)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn is_last_trial_of_block(&self) -> bool {
        self.trial_number >= self.trials_per_block
    }
}

const CUE_PAGE: &str =
    "Keep your eyes on the central cross. The outline of one box will briefly thicken.";

fn instruction_pages(target_mapping: [TargetType; 2]) -> HashMap<ResponseCondition, Vec<String>> {
    let mut pages = HashMap::new();
    pages.insert(
        ResponseCondition::Detect,
        vec![
            CUE_PAGE.to_string(),
            "Press the spacebar as soon as any target appears. Sometimes none will.".to_string(),
            "Press any key to begin.".to_string(),
        ],
    );
    pages.insert(
        ResponseCondition::Localize,
        vec![
            CUE_PAGE.to_string(),
            "Press z if the target appears on the left, / if it appears on the right.".to_string(),
            "Press any key to begin.".to_string(),
        ],
    );
    pages.insert(
        ResponseCondition::Discriminate,
        vec![
            CUE_PAGE.to_string(),
            format!(
                "Press z for {}, and / for {}.",
                target_mapping[0].as_str(),
                target_mapping[1].as_str()
            ),
            "Press any key to begin.".to_string(),
        ],
    );
    pages
}

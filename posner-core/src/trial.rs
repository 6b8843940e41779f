use serde::{Deserialize, Serialize};

use crate::stimulus::{Side, TargetType};

/// Response value recorded when the collector times out.
pub const NO_RESPONSE: &str = "NO_RESPONSE";
/// Written over target fields of catch trials.
pub const CATCH: &str = "CATCH";

/// Task demand of a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseCondition {
    Detect,
    Localize,
    Discriminate,
}

impl ResponseCondition {
    pub const ALL: [ResponseCondition; 3] = [
        ResponseCondition::Detect,
        ResponseCondition::Localize,
        ResponseCondition::Discriminate,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseCondition::Detect => "detect",
            ResponseCondition::Localize => "localize",
            ResponseCondition::Discriminate => "discriminate",
        }
    }
}

/// Per-trial independent variable assignment. Read-only once drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TrialFactors {
    pub cue_loc: Side,
    pub target_loc: Side,
    pub target_type: TargetType,
    pub catch_trial: bool,
}

impl TrialFactors {
    pub fn presents_target(&self) -> bool {
        !self.catch_trial
    }
}

/// Collector outcome: the mapped label and reaction time in ms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub value: String,
    pub rt: f64,
}

impl Response {
    pub fn new(value: impl Into<String>, rt: f64) -> Self {
        Self {
            value: value.into(),
            rt,
        }
    }

    pub fn none() -> Self {
        Self {
            value: NO_RESPONSE.to_string(),
            rt: -1.0,
        }
    }
}

impl Default for Response {
    fn default() -> Self {
        Self::none()
    }
}

/// Flat per-trial output row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialRecord {
    pub block_num: usize,
    pub trial_num: usize,
    pub response_condition: ResponseCondition,
    pub catch_trial: bool,
    pub ctoa: f64,
    pub cue_loc: Side,
    pub target_loc: String,
    pub target_type: String,
    pub response: String,
    pub rt: f64,
}

impl TrialRecord {
    pub fn new(
        block_num: usize,
        trial_num: usize,
        response_condition: ResponseCondition,
        factors: &TrialFactors,
        ctoa: f64,
        response: Response,
    ) -> Self {
        let (target_loc, target_type) = if factors.catch_trial {
            (CATCH.to_string(), CATCH.to_string())
        } else {
            (
                factors.target_loc.as_str().to_string(),
                factors.target_type.as_str().to_string(),
            )
        };
        Self {
            block_num,
            trial_num,
            response_condition,
            catch_trial: factors.catch_trial,
            ctoa,
            cue_loc: factors.cue_loc,
            target_loc,
            target_type,
            response: response.value,
            rt: response.rt,
        }
    }

    pub fn responded(&self) -> bool {
        self.response != NO_RESPONSE
    }

    /// Target shown at the cued location. Catch trials are neither valid
    /// nor invalid.
    pub fn validly_cued(&self) -> bool {
        !self.catch_trial && self.target_loc == self.cue_loc.as_str()
    }

    pub fn invalidly_cued(&self) -> bool {
        !self.catch_trial && !self.validly_cued()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn factors(catch_trial: bool) -> TrialFactors {
        TrialFactors {
            cue_loc: Side::Left,
            target_loc: Side::Right,
            target_type: TargetType::Plus,
            catch_trial,
        }
    }

    #[test]
    fn catch_trials_overwrite_target_fields() {
        let rec = TrialRecord::new(
            2,
            7,
            ResponseCondition::Localize,
            &factors(true),
            300.0,
            Response::none(),
        );
        assert_eq!(rec.target_loc, CATCH);
        assert_eq!(rec.target_type, CATCH);
        assert_eq!(rec.cue_loc, Side::Left);
        assert_eq!(rec.response, NO_RESPONSE);
        assert_eq!(rec.rt, -1.0);
        assert!(!rec.responded());
    }

    #[test]
    fn regular_trials_keep_sampled_target() {
        let rec = TrialRecord::new(
            1,
            1,
            ResponseCondition::Discriminate,
            &factors(false),
            116.69,
            Response::new("+", 412.5),
        );
        assert_eq!(rec.target_loc, "right");
        assert_eq!(rec.target_type, "+");
        assert_eq!(rec.response, "+");
        assert!(rec.responded());
    }

    #[test]
    fn record_serialises_flat() {
        let rec = TrialRecord::new(
            1,
            3,
            ResponseCondition::Detect,
            &factors(false),
            100.0,
            Response::new("detect", 250.0),
        );
        let json = serde_json::to_value(&rec).unwrap();
        assert_eq!(json["response_condition"], "detect");
        assert_eq!(json["cue_loc"], "left");
        assert_eq!(json["target_type"], "+");
        assert_eq!(json["rt"], 250.0);
    }

    #[test]
    fn validity_ignores_catch_trials() {
        let record = |f: &TrialFactors| {
            TrialRecord::new(1, 1, ResponseCondition::Detect, f, 100.0, Response::none())
        };
        let mut f = factors(false);
        assert!(record(&f).invalidly_cued());
        f.target_loc = Side::Left;
        assert!(record(&f).validly_cued());
        f.catch_trial = true;
        let catch = record(&f);
        assert!(!catch.validly_cued());
        assert!(!catch.invalidly_cued());
        assert!(!f.presents_target());
    }
}

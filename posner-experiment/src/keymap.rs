use std::collections::HashMap;

use posner_core::{ExperimentError, ResponseCondition, Result, TargetType};

pub const KEY_LEFT: &str = "z";
pub const KEY_RIGHT: &str = "/";
pub const KEY_SPACE: &str = "spacebar";

/// Accepted keys and the label each writes to the trial record.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyMap {
    name: String,
    keys: Vec<String>,
    labels: Vec<String>,
}

impl KeyMap {
    pub fn new(name: impl Into<String>, keys: &[&str], labels: &[&str]) -> Result<Self> {
        let name = name.into();
        if keys.is_empty() {
            return Err(ExperimentError::invalid(format!("key map '{}' has no keys", name)));
        }
        if keys.len() != labels.len() {
            return Err(ExperimentError::invalid(format!(
                "key map '{}' has {} keys but {} labels",
                name,
                keys.len(),
                labels.len()
            )));
        }
        for (i, k) in keys.iter().enumerate() {
            if keys[..i].contains(k) {
                return Err(ExperimentError::invalid(format!(
                    "key map '{}' lists '{}' twice",
                    name, k
                )));
            }
        }
        Ok(Self {
            name,
            keys: keys.iter().map(|k| k.to_string()).collect(),
            labels: labels.iter().map(|l| l.to_string()).collect(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn label_for(&self, key: &str) -> Option<&str> {
        self.keys
            .iter()
            .position(|k| k == key)
            .map(|i| self.labels[i].as_str())
    }

    pub fn key_for(&self, label: &str) -> Option<&str> {
        self.labels
            .iter()
            .position(|l| l == label)
            .map(|i| self.keys[i].as_str())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.keys.iter().map(String::as_str)
    }
}

/// Key maps for each task demand. `target_mapping[0]` is answered with the
/// left key, `target_mapping[1]` with the right.
pub fn condition_keymaps(
    target_mapping: [TargetType; 2],
) -> Result<HashMap<ResponseCondition, KeyMap>> {
    let mut maps = HashMap::new();
    maps.insert(
        ResponseCondition::Detect,
        KeyMap::new("detect", &[KEY_SPACE], &["detect"])?,
    );
    maps.insert(
        ResponseCondition::Localize,
        KeyMap::new("localize", &[KEY_LEFT, KEY_RIGHT], &["left", "right"])?,
    );
    maps.insert(
        ResponseCondition::Discriminate,
        KeyMap::new(
            "discriminate",
            &[KEY_LEFT, KEY_RIGHT],
            &[target_mapping[0].as_str(), target_mapping[1].as_str()],
        )?,
    );
    Ok(maps)
}

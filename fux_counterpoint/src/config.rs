// Tunable engine parameters.
//
// Every numeric threshold the rule validator and generator consult lives in
// `EngineConfig`, loadable from JSON. Rule code reads its range and
// spacing limits from here. Fields missing from a JSON file fall
// back to their defaults, so a config file only needs the values it changes.
//
// The defaults encode the classical style: voices at most an eleventh-ish
// (18 semitones) apart, no mid-line unisons, a counterpoint line confined
// to a singable E2..A5 span.

use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Inclusive MIDI bounds of a practicable counterpoint voice.
    pub vocal_range: (i32, i32),
    /// Maximum vertical distance between the voices, in semitones.
    pub max_spacing: i32,
    /// Minimum vertical distance away from the first and last notes. With the
    /// default of 1, a mid-line unison counts as excessive closeness.
    pub min_spacing: i32,
    /// How far past the cantus's outer note, on the counterpoint's side, the
    /// generator looks for candidate pitches (semitones).
    pub candidate_span: i32,
    /// Stop the search after this many index-steps (advance or backtrack).
    /// `None` searches until a solution is found or the space is exhausted.
    pub max_steps: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            vocal_range: (40, 81),
            max_spacing: 18,
            min_spacing: 1,
            candidate_span: 16,
            max_steps: None,
        }
    }
}

impl EngineConfig {
    /// Load a config from a JSON file.
    pub fn load(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let data = std::fs::read_to_string(path)?;
        let config: EngineConfig = serde_json::from_str(&data)?;
        Ok(config)
    }

    pub fn in_vocal_range(&self, midi: i32) -> bool {
        (self.vocal_range.0..=self.vocal_range.1).contains(&midi)
    }
}

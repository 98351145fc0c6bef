//! Tunables for candidate generation, marker naming and flash timing
//!
//! The viewer passes this in as JSON; every field has a default so a partial
//! object (or `{}`) is valid.

use crate::error::AnchorError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnchorConfig {
    /// Candidates shorter than this (in characters) are discarded
    pub min_candidate_len: usize,
    /// Prefix and suffix lengths, longest first
    pub edge_lengths: Vec<usize>,
    /// Leading/trailing word counts, largest first
    pub word_counts: Vec<usize>,
    /// Characters trimmed from each end for the middle candidate
    pub middle_trim: usize,
    /// Literal prefix length used by the last-resort navigation scan
    pub fallback_prefix_len: usize,
    /// Delay before scrolling, lets layout settle after the class change
    pub scroll_delay_ms: u64,
    /// How long the flash class stays on a navigated-to marker
    pub flash_duration_ms: u64,
    pub marker_class: String,
    pub flash_class: String,
    pub stylesheet_id: String,
}

impl Default for AnchorConfig {
    fn default() -> Self {
        Self {
            min_candidate_len: 3,
            edge_lengths: vec![50, 30, 20, 15],
            word_counts: vec![5, 3],
            middle_trim: 10,
            fallback_prefix_len: 20,
            scroll_delay_ms: 100,
            flash_duration_ms: 3000,
            marker_class: "validation-highlight".to_string(),
            flash_class: "flash-animation".to_string(),
            stylesheet_id: "validation-styles".to_string(),
        }
    }
}

impl AnchorConfig {
    /// Parse and validate a JSON config object
    pub fn from_json(json: &str) -> Result<Self, AnchorError> {
        let config: AnchorConfig = serde_json::from_str(json)
            .map_err(|e| AnchorError::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), AnchorError> {
        if self.min_candidate_len == 0 {
            return Err(AnchorError::Config(
                "min_candidate_len must be at least 1".to_string(),
            ));
        }
        if self.edge_lengths.contains(&0) || self.word_counts.contains(&0) {
            return Err(AnchorError::Config(
                "edge_lengths and word_counts must be non-zero".to_string(),
            ));
        }
        if self.fallback_prefix_len == 0 {
            return Err(AnchorError::Config(
                "fallback_prefix_len must be at least 1".to_string(),
            ));
        }
        if self.flash_duration_ms <= self.scroll_delay_ms {
            return Err(AnchorError::Config(format!(
                "flash_duration_ms ({}) must exceed scroll_delay_ms ({})",
                self.flash_duration_ms, self.scroll_delay_ms
            )));
        }
        for (field, value) in [
            ("marker_class", &self.marker_class),
            ("flash_class", &self.flash_class),
            ("stylesheet_id", &self.stylesheet_id),
        ] {
            let is_token = !value.is_empty()
                && value
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
                && !value.starts_with(|c: char| c.is_ascii_digit());
            if !is_token {
                return Err(AnchorError::Config(format!(
                    "{} must be a single token of letters, digits, '-' or '_'",
                    field
                )));
            }
        }
        Ok(())
    }

    pub fn scroll_delay(&self) -> Duration {
        Duration::from_millis(self.scroll_delay_ms)
    }

    pub fn flash_duration(&self) -> Duration {
        Duration::from_millis(self.flash_duration_ms)
    }
}

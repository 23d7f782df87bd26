//! Engine configuration
//!
//! Every threshold and scoring weight is tunable. Defaults were picked
//! against hand-labelled blog content; `min_quality_score` is the knob that
//! matters most.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to parse configuration: {0}")]
    Parse(String),

    #[error("Failed to read configuration: {0}")]
    Io(String),
}

/// Where in a block an anchor should preferably sit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreferredPosition {
    Start,
    #[default]
    Middle,
    End,
    Any,
}

/// Weights of the anchor scoring function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    /// Bonus for a word count inside `[min_anchor_words, max_anchor_words]`
    pub word_count_fit: f64,
    /// Extra bonus for 4–5 word anchors
    pub sweet_spot_bonus: f64,
    /// Penalty per word outside the allowed range
    pub out_of_range_penalty: f64,
    pub leading_stopword_penalty: f64,
    pub trailing_stopword_penalty: f64,
    pub forbidden_penalty: f64,
    /// Bonus per distinct power word
    pub power_word_bonus: f64,
    pub power_word_cap: f64,
    /// Multiplier for candidate/page term similarity
    pub title_relevance: f64,
    /// Multiplier for candidate/surrounding-text term similarity
    pub context_relevance: f64,
    pub position_bonus: f64,
    /// Penalty for anchors in the first 10% of a block (middle preference only)
    pub early_position_penalty: f64,
    pub heading_duplication_penalty: f64,
    /// Share of candidate terms found in the heading that triggers the penalty
    pub heading_overlap_ratio: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            word_count_fit: 15.0,
            sweet_spot_bonus: 5.0,
            out_of_range_penalty: 10.0,
            leading_stopword_penalty: 8.0,
            trailing_stopword_penalty: 5.0,
            forbidden_penalty: 25.0,
            power_word_bonus: 5.0,
            power_word_cap: 15.0,
            title_relevance: 30.0,
            context_relevance: 20.0,
            position_bonus: 8.0,
            early_position_penalty: 3.0,
            heading_duplication_penalty: 15.0,
            heading_overlap_ratio: 0.6,
        }
    }
}

/// Options recognized by the link engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub min_anchor_words: usize,
    pub max_anchor_words: usize,
    /// Minimum anchor length in characters
    pub min_anchor_chars: usize,
    /// Acceptance threshold for the best candidate of a block
    pub min_quality_score: f64,
    /// Threshold for candidates sharing no term with the target page
    pub direct_accept_score: f64,
    pub max_links_per_document: usize,
    /// Blocks with shorter plain text are never linked
    pub min_block_chars: usize,
    /// Blocks with this many existing links are skipped
    pub max_existing_links: usize,
    /// Candidates scored per (block, page) pair
    pub max_candidates_per_page: usize,
    pub preferred_position: PreferredPosition,
    /// Headings whose sections are never linked
    pub excluded_sections: Vec<String>,
    /// `class` attribute for injected links
    pub link_class: Option<String>,
    pub weights: ScoringWeights,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_anchor_words: 3,
            max_anchor_words: 7,
            min_anchor_chars: 10,
            min_quality_score: 40.0,
            direct_accept_score: 70.0,
            max_links_per_document: 12,
            min_block_chars: 60,
            max_existing_links: 2,
            max_candidates_per_page: 10,
            preferred_position: PreferredPosition::Middle,
            excluded_sections: vec![
                "faq".to_string(),
                "frequently asked questions".to_string(),
                "references".to_string(),
                "sources".to_string(),
            ],
            link_class: None,
            weights: ScoringWeights::default(),
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_links(mut self, max: usize) -> Self {
        self.max_links_per_document = max;
        self
    }

    pub fn with_min_quality_score(mut self, score: f64) -> Self {
        self.min_quality_score = score;
        self
    }

    pub fn with_anchor_words(mut self, min: usize, max: usize) -> Self {
        self.min_anchor_words = min;
        self.max_anchor_words = max;
        self
    }

    pub fn with_preferred_position(mut self, position: PreferredPosition) -> Self {
        self.preferred_position = position;
        self
    }

    pub fn with_link_class(mut self, class: impl Into<String>) -> Self {
        self.link_class = Some(class.into());
        self
    }

    /// Check option ranges. Called by the engine before any document is processed.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_anchor_words == 0 {
            return Err(ConfigError::Invalid(
                "min_anchor_words must be at least 1".into(),
            ));
        }
        if self.min_anchor_words > self.max_anchor_words {
            return Err(ConfigError::Invalid(format!(
                "min_anchor_words ({}) exceeds max_anchor_words ({})",
                self.min_anchor_words, self.max_anchor_words
            )));
        }
        if self.max_candidates_per_page == 0 {
            return Err(ConfigError::Invalid(
                "max_candidates_per_page must be at least 1".into(),
            ));
        }
        if !self.min_quality_score.is_finite() || !self.direct_accept_score.is_finite() {
            return Err(ConfigError::Invalid("score thresholds must be finite".into()));
        }
        let ratio = self.weights.heading_overlap_ratio;
        if !(0.0..=1.0).contains(&ratio) {
            return Err(ConfigError::Invalid(format!(
                "heading_overlap_ratio must be within [0, 1], got {}",
                ratio
            )));
        }
        Ok(())
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_yaml::from_str(yaml).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a `.json` file, or YAML for any other extension.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {}", path.display(), e)))?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json(&content),
            _ => Self::from_yaml(&content),
        }
    }
}

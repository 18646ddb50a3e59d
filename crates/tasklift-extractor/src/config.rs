//! Configuration for the Extractor

use serde::{Deserialize, Serialize};
use tasklift_llm::RetryPolicy;

/// How near-duplicate tasks are combined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DedupPolicy {
    /// Keep the highest-confidence task of each group unchanged
    #[default]
    RepresentativeWins,
    /// Fill gaps in the highest-confidence task from the others
    FieldMerge,
}

/// Configuration for the Extractor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Maximum cleaned text length (bytes)
    pub max_text_length: usize,

    /// Maximum chunk size (bytes)
    pub max_chunk_size: usize,

    /// Overlap between consecutive chunks (bytes)
    pub chunk_overlap: usize,

    /// Candidate-extraction calls allowed in flight at once
    pub chunk_concurrency: usize,

    /// Sampling temperature for extraction, summary and minutes calls
    pub temperature: f32,

    /// Multiplier applied to `temperature` for the validation call
    pub validation_temperature_factor: f32,

    /// Send deduplicated task titles along with the summary request
    pub include_tasks_in_summary: bool,

    /// Run the meeting-minutes call
    pub extract_meeting_minutes: bool,

    /// Deduplication policy
    pub dedup_policy: DedupPolicy,

    /// Reconstruct whole threads from EML input
    pub parse_email_threads: bool,

    /// Ceiling on nested message depth
    pub max_email_depth: usize,

    /// Retry policy for every model call
    pub retry: RetryPolicy,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            max_text_length: 500_000,
            max_chunk_size: 4000,
            chunk_overlap: 200,
            chunk_concurrency: 4,
            temperature: 0.1,
            validation_temperature_factor: 0.8,
            include_tasks_in_summary: true,
            extract_meeting_minutes: true,
            dedup_policy: DedupPolicy::RepresentativeWins,
            parse_email_threads: true,
            max_email_depth: 16,
            retry: RetryPolicy::default(),
        }
    }
}

impl ExtractorConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_text_length == 0 {
            return Err("max_text_length must be greater than 0".to_string());
        }
        if self.max_chunk_size == 0 {
            return Err("max_chunk_size must be greater than 0".to_string());
        }
        // A break point is searched from 70% of the window, so smaller
        // overlaps always move the next chunk forward
        if self.chunk_overlap * 10 >= self.max_chunk_size * 7 {
            return Err("chunk_overlap must be less than 70% of max_chunk_size".to_string());
        }
        if self.chunk_concurrency == 0 {
            return Err("chunk_concurrency must be greater than 0".to_string());
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err("temperature must be between 0.0 and 2.0".to_string());
        }
        if !(self.validation_temperature_factor > 0.0 && self.validation_temperature_factor <= 1.0)
        {
            return Err("validation_temperature_factor must be in (0.0, 1.0]".to_string());
        }
        if self.max_email_depth == 0 {
            return Err("max_email_depth must be greater than 0".to_string());
        }
        self.retry.validate()
    }

    /// Temperature for the validation call
    pub fn validation_temperature(&self) -> f32 {
        self.temperature * self.validation_temperature_factor
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}

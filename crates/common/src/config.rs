use serde::{Deserialize, Serialize};

use crate::types::AiLevel;

/// Top-level system configuration, deserialized from system.toml.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SystemConfig {
    pub gate: GateConfig,
    pub scorer: ScorerConfig,
    pub llm: LlmConfig,
    pub provider_calls: CallPolicyConfig,
    pub boundary: BoundaryLimits,
    pub opening_questions: PerLevel<u32>,
    #[serde(default)]
    pub analytics: AnalyticsConfig,
}

impl SystemConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}

/// Input limits applied before scoring. Band thresholds are fixed in the gate.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GateConfig {
    /// Longest reflection accepted, in characters.
    pub max_reflection_chars: usize,
}

/// Which external evaluator backs the quality scorer.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScorerConfig {
    /// "llm", "http", or "heuristic".
    pub evaluator: String,
    /// Evaluation service URL, required when evaluator = "http".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
}

/// LLM provider and model configuration per role.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LlmConfig {
    pub scorer: LlmRoleConfig,
    pub socratic: LlmRoleConfig,
}

/// Configuration for a single LLM role.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LlmRoleConfig {
    /// Provider name ("anthropic" or "openai").
    pub provider: String,
    /// Model identifier (e.g. "claude-sonnet-4-20250514", "gpt-4o").
    pub model: String,
    /// Max tokens in the response.
    pub max_tokens: u32,
    /// Temperature (0.0–1.0).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
}

/// Timeout and retry applied to every provider call.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CallPolicyConfig {
    /// Per-attempt timeout.
    pub timeout_ms: u64,
    /// Total attempts including the first. At most 2.
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
    pub backoff_multiplier: f64,
    pub jitter: bool,
}

/// Response word ceilings per tier.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BoundaryLimits {
    pub max_words: PerLevel<u32>,
}

/// A value configured separately for each AI tier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerLevel<T> {
    pub basic: T,
    pub standard: T,
    pub advanced: T,
}

impl<T: Copy> PerLevel<T> {
    pub fn get(&self, level: AiLevel) -> T {
        match level {
            AiLevel::Basic => self.basic,
            AiLevel::Standard => self.standard,
            AiLevel::Advanced => self.advanced,
        }
    }
}

/// Analytics event channel sizing.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    /// Buffered events before new ones are dropped.
    pub channel_capacity: usize,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 1024,
        }
    }
}

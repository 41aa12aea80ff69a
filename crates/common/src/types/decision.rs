use serde::{Deserialize, Serialize};

use crate::types::AiLevel;

/// Outcome of the gate, with the tier carried only by the granted variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Access {
    Granted { level: AiLevel },
    Denied { reason: DenialReason },
}

/// Why a reflection did not unlock assistance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenialReason {
    /// Empty, oversized, or otherwise unusable text.
    InvalidInput,
    /// Fewer words than the gate minimum.
    TooShort,
    /// Long enough, but scored below the lowest band.
    LowQuality,
}

impl DenialReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidInput => "invalid_input",
            Self::TooShort => "too_short",
            Self::LowQuality => "low_quality",
        }
    }
}

/// The gate's verdict on one reflection. Derived, never persisted on its own.
#[derive(Clone, Debug, PartialEq)]
pub struct AccessDecision {
    pub access: Access,
    pub word_count: usize,
    pub quality_score: f64,
    pub feedback: String,
    /// Reflective prompts for a denied student. Empty when granted.
    pub suggestions: Vec<String>,
}

impl AccessDecision {
    pub fn granted(&self) -> bool {
        matches!(self.access, Access::Granted { .. })
    }

    pub fn ai_level(&self) -> Option<AiLevel> {
        match self.access {
            Access::Granted { level } => Some(level),
            Access::Denied { .. } => None,
        }
    }

    pub fn denial_reason(&self) -> Option<DenialReason> {
        match self.access {
            Access::Granted { .. } => None,
            Access::Denied { reason } => Some(reason),
        }
    }

    /// Tier label for logs and analytics; "none" when denied.
    pub fn ai_level_label(&self) -> &'static str {
        self.ai_level().map(|l| l.as_str()).unwrap_or("none")
    }
}

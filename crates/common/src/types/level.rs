use std::fmt;

use serde::{Deserialize, Serialize};

/// Capability tier unlocked by a reflection.
///
/// Ordered: `Basic < Standard < Advanced`. Denied reflections have no tier at
/// all, so "none" is modelled as `Option<AiLevel>::None` rather than a variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AiLevel {
    Basic,
    Standard,
    Advanced,
}

impl AiLevel {
    pub const ALL: [AiLevel; 3] = [AiLevel::Basic, AiLevel::Standard, AiLevel::Advanced];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::Standard => "standard",
            Self::Advanced => "advanced",
        }
    }

    /// Kind of question this tier asks.
    pub fn question_type(&self) -> QuestionType {
        match self {
            Self::Basic => QuestionType::Clarifying,
            Self::Standard => QuestionType::Analytical,
            Self::Advanced => QuestionType::Critical,
        }
    }
}

impl fmt::Display for AiLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Question style reported alongside each Socratic response.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionType {
    Clarifying,
    Analytical,
    Critical,
}

impl QuestionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Clarifying => "clarifying",
            Self::Analytical => "analytical",
            Self::Critical => "critical",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levels_are_ordered() {
        assert!(AiLevel::Basic < AiLevel::Standard);
        assert!(AiLevel::Standard < AiLevel::Advanced);
    }

    #[test]
    fn test_level_wire_format() {
        assert_eq!(
            serde_json::to_string(&AiLevel::Standard).unwrap(),
            r#""standard""#
        );
        let parsed: AiLevel = serde_json::from_str(r#""advanced""#).unwrap();
        assert_eq!(parsed, AiLevel::Advanced);
    }
}

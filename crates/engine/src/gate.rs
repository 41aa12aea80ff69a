//! Access gate: maps (word count, quality score) to an access decision.
//!
//! Pure and total. Every band is inclusive on its lower bound, so a score
//! sitting exactly on a threshold lands in the higher band.

use reflectgate_common::types::{Access, AccessDecision, AiLevel, DenialReason};
use reflectgate_common::InputError;

/// Minimum reflection length, in words, before quality is considered at all.
pub const MIN_WORDS: usize = 50;

pub const BASIC_THRESHOLD: f64 = 3.0;
pub const STANDARD_THRESHOLD: f64 = 5.0;
pub const ADVANCED_THRESHOLD: f64 = 8.0;

/// Clamp to [0, 10]; non-finite scores count as 0.
pub fn normalize_score(score: f64) -> f64 {
    if score.is_nan() {
        0.0
    } else {
        score.clamp(0.0, 10.0)
    }
}

/// The banding rule on its own.
pub fn band(word_count: usize, quality_score: f64) -> Access {
    if word_count < MIN_WORDS {
        return Access::Denied {
            reason: DenialReason::TooShort,
        };
    }

    let score = normalize_score(quality_score);
    if score >= ADVANCED_THRESHOLD {
        Access::Granted {
            level: AiLevel::Advanced,
        }
    } else if score >= STANDARD_THRESHOLD {
        Access::Granted {
            level: AiLevel::Standard,
        }
    } else if score >= BASIC_THRESHOLD {
        Access::Granted {
            level: AiLevel::Basic,
        }
    } else {
        Access::Denied {
            reason: DenialReason::LowQuality,
        }
    }
}

/// Full decision, with feedback and suggestions for the student.
pub fn decide(word_count: usize, quality_score: f64) -> AccessDecision {
    let access = band(word_count, quality_score);
    let quality_score = normalize_score(quality_score);

    let (feedback, suggestions) = match access {
        Access::Denied {
            reason: DenialReason::TooShort,
        } => (
            format!(
                "Your reflection needs more depth. Aim for at least {} words to show your thinking process.",
                MIN_WORDS
            ),
            to_strings(TOO_SHORT_SUGGESTIONS),
        ),
        Access::Denied { .. } => (
            "Take a moment to think deeper about your approach. What are you really trying to accomplish?"
                .to_string(),
            to_strings(LOW_QUALITY_SUGGESTIONS),
        ),
        Access::Granted { level } => (granted_feedback(level).to_string(), Vec::new()),
    };

    AccessDecision {
        access,
        word_count,
        quality_score,
        feedback,
        suggestions,
    }
}

/// Decision for a reflection the validator refused to score.
pub fn deny_invalid(error: &InputError, word_count: usize) -> AccessDecision {
    let feedback = match error {
        InputError::Empty => format!(
            "Before working with your AI partner, write a reflection of at least {} words about where you are in your writing.",
            MIN_WORDS
        ),
        InputError::TooLong { limit, .. } => format!(
            "Your reflection is longer than {} characters. Focus on the few things that matter most right now.",
            limit
        ),
        InputError::UnsafeMarkup(_) => {
            "Your reflection contains markup that can't be accepted. Please write it as plain text."
                .to_string()
        }
    };

    AccessDecision {
        access: Access::Denied {
            reason: DenialReason::InvalidInput,
        },
        word_count,
        quality_score: 0.0,
        feedback,
        suggestions: to_strings(TOO_SHORT_SUGGESTIONS),
    }
}

fn granted_feedback(level: AiLevel) -> &'static str {
    match level {
        AiLevel::Basic => {
            "Good start! I'm here to help you clarify your ideas. Keep reflecting as you go."
        }
        AiLevel::Standard => {
            "Great reflection! I'm here to help you think through your ideas."
        }
        AiLevel::Advanced => {
            "Excellent, thoughtful reflection! You're ready to dig into assumptions and implications together."
        }
    }
}

const TOO_SHORT_SUGGESTIONS: &[&str] = &[
    "What is the main point you're trying to make?",
    "What challenges are you facing with this topic?",
    "What questions do you have about your approach?",
];

const LOW_QUALITY_SUGGESTIONS: &[&str] = &[
    "Explain your main argument or thesis in your own words.",
    "Describe what evidence you plan to use.",
    "Identify specific areas where you need help.",
];

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

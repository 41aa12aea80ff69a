use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::ExchangeId;
use crate::types::{AiLevel, QuestionType};

/// How the response text of an exchange was produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseOrigin {
    /// Provider output passed the boundary filter untouched.
    Model,
    /// Provider output was cut down to its compliant questions.
    Salvaged,
    /// Local question bank.
    Fallback,
}

impl ResponseOrigin {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Model => "model",
            Self::Salvaged => "salvaged",
            Self::Fallback => "fallback",
        }
    }
}

/// One AI turn. Read-only after creation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SocraticExchange {
    pub id: ExchangeId,
    pub question: String,
    pub ai_level: AiLevel,
    pub question_type: QuestionType,
    pub document_context: String,
    pub response: String,
    pub follow_up_prompts: Vec<String>,
    pub origin: ResponseOrigin,
    pub created_at: DateTime<Utc>,
}

/// A previous turn in the same document conversation, supplied by the caller.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PriorTurn {
    pub user_message: String,
    #[serde(default)]
    pub ai_response: String,
}

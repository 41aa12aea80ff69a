use serde::{Deserialize, Serialize};

use crate::ids::{DocumentRef, UserRef};
use crate::types::{AccessDecision, AiLevel, PriorTurn, QuestionType, SocraticExchange};

/// POST /reflect request: a reflection submitted before asking for help.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReflectionSubmit {
    pub reflection: String,
    pub document_id: DocumentRef,
    pub user_id: UserRef,
    /// Recent document content, used by the external evaluator only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

/// POST /reflect response: the gate decision wire contract.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReflectionResponse {
    pub access_granted: bool,
    pub feedback: String,
    pub quality_score: f64,
    pub ai_level: Option<AiLevel>,
    pub suggestions: Option<Vec<String>>,
    pub initial_questions: Option<Vec<String>>,
}

impl ReflectionResponse {
    pub fn from_decision(decision: &AccessDecision, initial_questions: Vec<String>) -> Self {
        Self {
            access_granted: decision.granted(),
            feedback: decision.feedback.clone(),
            quality_score: decision.quality_score,
            ai_level: decision.ai_level(),
            suggestions: non_empty(decision.suggestions.clone()),
            initial_questions: non_empty(initial_questions),
        }
    }
}

/// POST /ask request: a student question at an already-granted tier.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AskRequest {
    pub question: String,
    #[serde(default)]
    pub context: String,
    pub ai_level: AiLevel,
    pub document_id: DocumentRef,
    pub user_id: UserRef,
    /// Earlier turns, oldest first.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub history: Vec<PriorTurn>,
}

/// POST /ask response.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AskResponse {
    pub response: String,
    pub follow_up_prompts: Vec<String>,
    pub question_type: QuestionType,
}

impl From<&SocraticExchange> for AskResponse {
    fn from(exchange: &SocraticExchange) -> Self {
        Self {
            response: exchange.response.clone(),
            follow_up_prompts: exchange.follow_up_prompts.clone(),
            question_type: exchange.question_type,
        }
    }
}

fn non_empty(items: Vec<String>) -> Option<Vec<String>> {
    if items.is_empty() {
        None
    } else {
        Some(items)
    }
}

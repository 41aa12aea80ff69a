use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{DocumentRef, ReflectionId, UserRef};

/// Where a quality score came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreSource {
    /// External evaluation provider answered in time with a valid score.
    Evaluator,
    /// Local deterministic heuristic.
    Heuristic,
}

/// A student's reflection, as submitted.
///
/// One record per submission. `scored` consumes the unscored record and
/// returns the final one; nothing updates a record in place.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Reflection {
    pub id: ReflectionId,
    pub user_ref: UserRef,
    pub document_ref: DocumentRef,
    /// Normalized text (control characters stripped, trimmed).
    pub text: String,
    pub word_count: usize,
    /// 0.0–10.0, None until scored.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score_source: Option<ScoreSource>,
    pub submitted_at: DateTime<Utc>,
}

impl Reflection {
    pub fn new(user_ref: UserRef, document_ref: DocumentRef, text: String, word_count: usize) -> Self {
        Self {
            id: ReflectionId::new(),
            user_ref,
            document_ref,
            text,
            word_count,
            quality_score: None,
            score_source: None,
            submitted_at: Utc::now(),
        }
    }

    pub fn scored(self, score: f64, source: ScoreSource) -> Self {
        Self {
            quality_score: Some(score),
            score_source: Some(source),
            ..self
        }
    }
}

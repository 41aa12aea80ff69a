mod evaluator;
pub mod heuristic;

use std::sync::Arc;

use reflectgate_common::types::ScoreSource;

use crate::gate::MIN_WORDS;
use crate::provider::{call_with_policy, CallPolicy, ProviderError};
use crate::validator::ValidatedReflection;

pub use evaluator::{EvaluationRequest, HttpEvaluator, LlmEvaluator, QualityEvaluator};
pub use heuristic::{dimensions, heuristic_score, ReflectionDimensions};

/// Result of scoring one reflection.
#[derive(Debug)]
pub enum ScoreOutcome {
    /// The external evaluator returned a valid score in time.
    Evaluated { score: f64 },
    /// The heuristic score was used instead.
    Fallback { score: f64, reason: FallbackReason },
}

impl ScoreOutcome {
    pub fn score(&self) -> f64 {
        match self {
            Self::Evaluated { score } | Self::Fallback { score, .. } => *score,
        }
    }

    pub fn source(&self) -> ScoreSource {
        match self {
            Self::Evaluated { .. } => ScoreSource::Evaluator,
            Self::Fallback { .. } => ScoreSource::Heuristic,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback { .. })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FallbackReason {
    #[error("no evaluator configured")]
    NoEvaluator,

    #[error("reflection below the word minimum")]
    BelowWordMinimum,

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

impl FallbackReason {
    pub fn label(&self) -> &'static str {
        match self {
            Self::NoEvaluator => "no_evaluator",
            Self::BelowWordMinimum => "below_minimum",
            Self::Provider(e) if e.is_timeout() => "timeout",
            Self::Provider(_) => "provider_error",
        }
    }
}

/// Score a validated reflection.
///
/// Reflections under the word minimum are denied whatever their score, so
/// the evaluator is only consulted at or above it.
pub async fn score_reflection(
    evaluator: Option<&Arc<dyn QualityEvaluator>>,
    policy: &CallPolicy,
    reflection: &ValidatedReflection,
    context: Option<&str>,
) -> ScoreOutcome {
    let reason = match evaluator {
        None => FallbackReason::NoEvaluator,
        Some(_) if reflection.word_count < MIN_WORDS => FallbackReason::BelowWordMinimum,
        Some(evaluator) => {
            let request = EvaluationRequest {
                text: reflection.text.clone(),
                context: context.map(str::to_string),
            };
            match evaluate(evaluator, policy, request).await {
                Ok(score) => return ScoreOutcome::Evaluated { score },
                Err(e) => FallbackReason::Provider(e),
            }
        }
    };

    let score = heuristic_score(&reflection.text);
    metrics::counter!("scorer.fallbacks", "reason" => reason.label()).increment(1);

    if matches!(reason, FallbackReason::Provider(_)) {
        tracing::warn!(
            reason = %reason,
            word_count = reflection.word_count,
            score,
            "Evaluator unavailable, using heuristic score"
        );
    } else {
        tracing::debug!(reason = %reason, score, "Heuristic score");
    }

    ScoreOutcome::Fallback { score, reason }
}

async fn evaluate(
    evaluator: &Arc<dyn QualityEvaluator>,
    policy: &CallPolicy,
    request: EvaluationRequest,
) -> Result<f64, ProviderError> {
    let name = evaluator.name();
    call_with_policy(name, policy, || {
        let evaluator = Arc::clone(evaluator);
        let request = request.clone();
        async move {
            let score = evaluator.evaluate(&request).await?;
            if score.is_finite() && (0.0..=10.0).contains(&score) {
                Ok(score)
            } else {
                Err(ProviderError::Malformed(format!(
                    "score {} outside 0-10",
                    score
                )))
            }
        }
    })
    .await
}

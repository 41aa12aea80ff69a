//! Request-level orchestration: validator, scorer, gate, and Socratic engine
//! wired together per call. Holds no per-user state between calls.

use std::sync::Arc;

use reflectgate_common::api::gate::{AskRequest, ReflectionResponse, ReflectionSubmit};
use reflectgate_common::types::{AccessDecision, Reflection, SocraticExchange};
use reflectgate_common::GateError;

use crate::analytics::{AnalyticsEvent, AnalyticsSink};
use crate::config::{EngineConfig, REFLECTION_ASSESSMENT_PROMPT, SOCRATIC_SYSTEM_PROMPT};
use crate::gate;
use crate::llm::{LanguageModel, LlmClient};
use crate::provider::CallPolicy;
use crate::scorer::{self, HttpEvaluator, LlmEvaluator, QualityEvaluator};
use crate::socratic::{SocraticEngine, TurnRequest};
use crate::validator;

/// Fixed settings derived from configuration.
pub struct GateSettings {
    pub max_reflection_chars: usize,
    pub policy: CallPolicy,
    pub socratic: SocraticEngine,
}

impl GateSettings {
    pub fn from_config(config: &EngineConfig) -> Result<Self, GateError> {
        let system_prompt = config.prompt(SOCRATIC_SYSTEM_PROMPT).ok_or_else(|| {
            GateError::Config(format!("missing prompt template {}", SOCRATIC_SYSTEM_PROMPT))
        })?;
        let policy = CallPolicy::from_config(&config.system.provider_calls);

        Ok(Self {
            max_reflection_chars: config.system.gate.max_reflection_chars,
            socratic: SocraticEngine::new(
                system_prompt.to_string(),
                policy.clone(),
                config.system.boundary.max_words,
                config.system.opening_questions,
            ),
            policy,
        })
    }
}

/// External providers. Either may be absent; every path has a local fallback.
#[derive(Clone, Default)]
pub struct Providers {
    pub evaluator: Option<Arc<dyn QualityEvaluator>>,
    pub language_model: Option<Arc<dyn LanguageModel>>,
}

impl Providers {
    /// Build providers from configuration. A missing API key disables the
    /// provider that needs it rather than failing.
    pub fn from_config(config: &EngineConfig) -> Result<Self, GateError> {
        let scorer = &config.system.scorer;

        let evaluator: Option<Arc<dyn QualityEvaluator>> = match scorer.evaluator.as_str() {
            "llm" => {
                let prompt = config.prompt(REFLECTION_ASSESSMENT_PROMPT).ok_or_else(|| {
                    GateError::Config(format!(
                        "missing prompt template {}",
                        REFLECTION_ASSESSMENT_PROMPT
                    ))
                })?;
                LlmClient::new(config.system.llm.scorer.clone()).map(|client| {
                    tracing::info!(provider = client.provider(), "Reflection evaluator enabled");
                    Arc::new(LlmEvaluator::new(Arc::new(client), prompt.to_string()))
                        as Arc<dyn QualityEvaluator>
                })
            }
            "http" => {
                let endpoint = scorer.endpoint.clone().ok_or_else(|| {
                    GateError::Config("scorer.endpoint is required for the http evaluator".into())
                })?;
                Some(Arc::new(HttpEvaluator::new(endpoint)) as Arc<dyn QualityEvaluator>)
            }
            "heuristic" => None,
            other => return Err(GateError::Config(format!("unknown evaluator: {}", other))),
        };

        let language_model = LlmClient::new(config.system.llm.socratic.clone()).map(|client| {
            tracing::info!(provider = client.provider(), "Socratic language model enabled");
            Arc::new(client) as Arc<dyn LanguageModel>
        });

        Ok(Self {
            evaluator,
            language_model,
        })
    }
}

/// Which providers are live, for the health endpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProviderStatus {
    pub evaluator: Option<&'static str>,
    pub language_model: bool,
}

/// Everything produced by one reflection submission.
#[derive(Clone, Debug)]
pub struct ReflectionOutcome {
    pub reflection: Reflection,
    pub decision: AccessDecision,
    pub initial_questions: Vec<String>,
}

impl ReflectionOutcome {
    pub fn to_response(&self) -> ReflectionResponse {
        ReflectionResponse::from_decision(&self.decision, self.initial_questions.clone())
    }
}

pub struct ReflectionGate {
    settings: GateSettings,
    providers: Providers,
    analytics: Arc<dyn AnalyticsSink>,
}

impl ReflectionGate {
    pub fn new(
        settings: GateSettings,
        providers: Providers,
        analytics: Arc<dyn AnalyticsSink>,
    ) -> Self {
        Self {
            settings,
            providers,
            analytics,
        }
    }

    pub fn provider_status(&self) -> ProviderStatus {
        ProviderStatus {
            evaluator: self.providers.evaluator.as_ref().map(|e| e.name()),
            language_model: self.providers.language_model.is_some(),
        }
    }

    /// Validate, score, and band a reflection. Always produces a decision.
    pub async fn submit_reflection(&self, request: &ReflectionSubmit) -> ReflectionOutcome {
        let validated = validator::validate(&request.reflection, self.settings.max_reflection_chars);

        let (reflection, decision, initial_questions) = match validated {
            Err(rejected) => {
                let error = GateError::from(rejected.error.clone());
                tracing::info!(
                    user_ref = %request.user_id,
                    document_ref = %request.document_id,
                    word_count = rejected.word_count,
                    error_kind = error.kind(),
                    error = %error,
                    "Reflection rejected before scoring"
                );
                let decision = gate::deny_invalid(&rejected.error, rejected.word_count);
                let reflection = Reflection::new(
                    request.user_id.clone(),
                    request.document_id.clone(),
                    rejected.text,
                    rejected.word_count,
                );
                (reflection, decision, Vec::new())
            }
            Ok(valid) => {
                let outcome = scorer::score_reflection(
                    self.providers.evaluator.as_ref(),
                    &self.settings.policy,
                    &valid,
                    request.context.as_deref(),
                )
                .await;

                let decision = gate::decide(valid.word_count, outcome.score());

                let initial_questions = match decision.ai_level() {
                    Some(level) => {
                        self.settings
                            .socratic
                            .opening_questions(
                                self.providers.language_model.as_ref(),
                                level,
                                &valid.text,
                                request.context.as_deref().unwrap_or_default(),
                            )
                            .await
                    }
                    None => Vec::new(),
                };

                let reflection = Reflection::new(
                    request.user_id.clone(),
                    request.document_id.clone(),
                    valid.text,
                    valid.word_count,
                )
                .scored(decision.quality_score, outcome.source());

                (reflection, decision, initial_questions)
            }
        };

        metrics::counter!("gate.decisions", "ai_level" => decision.ai_level_label()).increment(1);
        tracing::info!(
            reflection_id = %reflection.id,
            user_ref = %reflection.user_ref,
            word_count = decision.word_count,
            quality_score = decision.quality_score,
            ai_level = decision.ai_level_label(),
            denial_reason = decision.denial_reason().map(|r| r.as_str()).unwrap_or("none"),
            "Access decided"
        );

        self.analytics.emit(AnalyticsEvent::ReflectionSubmitted {
            reflection_id: reflection.id,
            user_ref: reflection.user_ref.clone(),
            document_ref: reflection.document_ref.clone(),
            word_count: reflection.word_count,
        });
        self.analytics.emit(AnalyticsEvent::AccessDecided {
            reflection_id: reflection.id,
            user_ref: reflection.user_ref.clone(),
            granted: decision.granted(),
            ai_level: decision.ai_level(),
            quality_score: decision.quality_score,
            denial_reason: decision.denial_reason(),
            score_source: reflection.score_source,
        });

        ReflectionOutcome {
            reflection,
            decision,
            initial_questions,
        }
    }

    /// One Socratic turn at a tier the caller has already been granted.
    pub async fn ask(&self, request: &AskRequest) -> SocraticExchange {
        let start = std::time::Instant::now();
        let turn = TurnRequest {
            question: &request.question,
            ai_level: request.ai_level,
            document_context: &request.context,
            history: &request.history,
        };

        let exchange = self
            .settings
            .socratic
            .respond(self.providers.language_model.as_ref(), &turn)
            .await;

        tracing::info!(
            exchange_id = %exchange.id,
            user_ref = %request.user_id,
            ai_level = %exchange.ai_level,
            origin = exchange.origin.as_str(),
            "Socratic response"
        );

        self.analytics.emit(AnalyticsEvent::SocraticTurn {
            exchange_id: exchange.id,
            user_ref: request.user_id.clone(),
            document_ref: request.document_id.clone(),
            ai_level: exchange.ai_level,
            question_type: exchange.question_type,
            origin: exchange.origin,
            latency_ms: start.elapsed().as_millis() as u64,
        });

        exchange
    }
}

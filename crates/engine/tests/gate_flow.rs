//! End-to-end gate flow with mock providers.
//!
//! Run with: cargo test -p reflectgate-engine --test gate_flow

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use reflectgate_common::api::gate::{AskRequest, AskResponse, ReflectionSubmit};
use reflectgate_common::config::PerLevel;
use reflectgate_common::types::{AiLevel, DenialReason, ResponseOrigin, ScoreSource};

use reflectgate_engine::analytics::{AnalyticsEvent, AnalyticsSink};
use reflectgate_engine::controller::{GateSettings, Providers, ReflectionGate};
use reflectgate_engine::llm::{Completion, CompletionRequest, LanguageModel, LlmError, StopReason, TokenUsage};
use reflectgate_engine::provider::{CallPolicy, ProviderError};
use reflectgate_engine::scorer::{heuristic_score, EvaluationRequest, QualityEvaluator};
use reflectgate_engine::socratic::{bank, SocraticEngine};

// ---------------------------------------------------------------------------
// Mocks
// ---------------------------------------------------------------------------

enum Behavior {
    Score(f64),
    Fail,
    Hang,
}

struct MockEvaluator {
    behavior: Behavior,
    calls: AtomicU32,
}

impl MockEvaluator {
    fn new(behavior: Behavior) -> Arc<Self> {
        Arc::new(Self {
            behavior,
            calls: AtomicU32::new(0),
        })
    }

    fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

impl QualityEvaluator for MockEvaluator {
    fn name(&self) -> &'static str {
        "mock_evaluator"
    }

    fn evaluate<'a>(
        &'a self,
        _request: &'a EvaluationRequest,
    ) -> Pin<Box<dyn Future<Output = Result<f64, ProviderError>> + Send + 'a>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Box::pin(async move {
            match self.behavior {
                Behavior::Score(score) => Ok(score),
                Behavior::Fail => Err(ProviderError::Http("503 Service Unavailable".into())),
                Behavior::Hang => {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    Ok(9.0)
                }
            }
        })
    }
}

struct MockModel {
    reply: Option<&'static str>,
    calls: AtomicU32,
}

impl MockModel {
    fn replying(reply: &'static str) -> Arc<Self> {
        Arc::new(Self {
            reply: Some(reply),
            calls: AtomicU32::new(0),
        })
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self {
            reply: None,
            calls: AtomicU32::new(0),
        })
    }
}

impl LanguageModel for MockModel {
    fn complete<'a>(
        &'a self,
        _request: &'a CompletionRequest,
    ) -> Pin<Box<dyn Future<Output = Result<Completion, LlmError>> + Send + 'a>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Box::pin(async move {
            match self.reply {
                Some(text) => Ok(Completion {
                    text: text.to_string(),
                    stop_reason: StopReason::EndTurn,
                    usage: TokenUsage::default(),
                }),
                None => Err(LlmError::Http("connection reset".into())),
            }
        })
    }
}

#[derive(Default)]
struct RecordingSink {
    events: Mutex<Vec<AnalyticsEvent>>,
}

impl RecordingSink {
    fn names(&self) -> Vec<&'static str> {
        self.events.lock().unwrap().iter().map(|e| e.name()).collect()
    }
}

impl AnalyticsSink for RecordingSink {
    fn emit(&self, event: AnalyticsEvent) {
        self.events.lock().unwrap().push(event);
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn settings() -> GateSettings {
    let policy = CallPolicy {
        timeout: Duration::from_millis(100),
        max_attempts: 2,
        initial_backoff_ms: 1,
        max_backoff_ms: 5,
        backoff_multiplier: 2.0,
        jitter: true,
    };
    GateSettings {
        max_reflection_chars: 10_000,
        socratic: SocraticEngine::new(
            "Ask, never tell.".into(),
            policy.clone(),
            PerLevel {
                basic: 60,
                standard: 100,
                advanced: 150,
            },
            PerLevel {
                basic: 2,
                standard: 3,
                advanced: 4,
            },
        ),
        policy,
    }
}

fn gate(
    evaluator: Option<Arc<MockEvaluator>>,
    model: Option<Arc<MockModel>>,
) -> (ReflectionGate, Arc<RecordingSink>) {
    let sink = Arc::new(RecordingSink::default());
    let providers = Providers {
        evaluator: evaluator.map(|e| e as Arc<dyn QualityEvaluator>),
        language_model: model.map(|m| m as Arc<dyn LanguageModel>),
    };
    let gate = ReflectionGate::new(settings(), providers, sink.clone());
    (gate, sink)
}

fn words(n: usize) -> String {
    (0..n)
        .map(|i| format!("idea{}", i))
        .collect::<Vec<_>>()
        .join(" ")
}

fn submit(reflection: impl Into<String>) -> ReflectionSubmit {
    ReflectionSubmit {
        reflection: reflection.into(),
        document_id: "doc-1".into(),
        user_id: "student-1".into(),
        context: None,
    }
}

fn ask(question: &str, ai_level: AiLevel) -> AskRequest {
    AskRequest {
        question: question.into(),
        context: "Coastal cities face rising seas.".into(),
        ai_level,
        document_id: "doc-1".into(),
        user_id: "student-1".into(),
        history: Vec::new(),
    }
}

// ---------------------------------------------------------------------------
// Reflection submission
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_empty_reflection_denied_without_scoring() {
    let evaluator = MockEvaluator::new(Behavior::Score(9.0));
    let (gate, _) = gate(Some(evaluator.clone()), None);

    for raw in ["", "   \n\t  "] {
        let outcome = gate.submit_reflection(&submit(raw)).await;
        assert!(!outcome.decision.granted());
        assert_eq!(outcome.decision.ai_level(), None);
        assert_eq!(outcome.decision.word_count, 0);
        assert_eq!(outcome.reflection.quality_score, None);
    }
    assert_eq!(evaluator.calls(), 0);
}

#[tokio::test]
async fn test_forty_nine_words_denied_with_minimum_feedback() {
    let evaluator = MockEvaluator::new(Behavior::Score(10.0));
    let (gate, _) = gate(Some(evaluator.clone()), None);

    let outcome = gate.submit_reflection(&submit(words(49))).await;
    let response = outcome.to_response();

    assert!(!response.access_granted);
    assert_eq!(response.ai_level, None);
    assert!(response.feedback.contains("50 words"));
    assert!(response.suggestions.is_some());
    assert!(response.initial_questions.is_none());
    assert_eq!(evaluator.calls(), 0);
}

#[tokio::test]
async fn test_sixty_words_mid_score_grants_standard() {
    let evaluator = MockEvaluator::new(Behavior::Score(6.5));
    let (gate, _) = gate(Some(evaluator.clone()), None);

    let outcome = gate.submit_reflection(&submit(words(60))).await;
    let response = outcome.to_response();

    assert!(response.access_granted);
    assert_eq!(response.ai_level, Some(AiLevel::Standard));
    assert_eq!(response.quality_score, 6.5);
    assert_eq!(response.initial_questions.as_ref().map(Vec::len), Some(3));
    assert!(response.suggestions.is_none());
    assert_eq!(outcome.reflection.score_source, Some(ScoreSource::Evaluator));
    assert_eq!(evaluator.calls(), 1);
}

#[tokio::test]
async fn test_failing_evaluator_falls_back_to_heuristic() {
    let text = words(80);
    for behavior in [Behavior::Fail, Behavior::Hang] {
        let evaluator = MockEvaluator::new(behavior);
        let (gate, _) = gate(Some(evaluator.clone()), None);

        let outcome = gate.submit_reflection(&submit(text.clone())).await;

        assert_eq!(outcome.decision.quality_score, heuristic_score(&text));
        assert_eq!(outcome.reflection.score_source, Some(ScoreSource::Heuristic));
        assert_eq!(evaluator.calls(), 2);
    }
}

#[tokio::test]
async fn test_repetitive_reflection_denied_by_heuristic() {
    let (gate, _) = gate(None, None);

    let outcome = gate.submit_reflection(&submit("help ".repeat(60))).await;

    assert!(!outcome.decision.granted());
    assert_eq!(outcome.decision.quality_score, 0.63);
    assert!(!outcome.decision.suggestions.is_empty());
}

#[tokio::test]
async fn test_opening_questions_per_tier() {
    for (score, level, count) in [
        (3.0, AiLevel::Basic, 2),
        (5.0, AiLevel::Standard, 3),
        (8.0, AiLevel::Advanced, 4),
    ] {
        let (gate, _) = gate(Some(MockEvaluator::new(Behavior::Score(score))), None);

        let outcome = gate.submit_reflection(&submit(words(55))).await;

        assert_eq!(outcome.decision.ai_level(), Some(level));
        assert_eq!(outcome.initial_questions.len(), count);
        assert!(outcome.initial_questions.iter().all(|q| q.contains('?')));
    }
}

#[tokio::test]
async fn test_submission_emits_analytics() {
    let (gate, sink) = gate(Some(MockEvaluator::new(Behavior::Score(7.0))), None);

    gate.submit_reflection(&submit(words(60))).await;
    gate.ask(&ask("Where should I start?", AiLevel::Standard)).await;

    assert_eq!(
        sink.names(),
        vec!["reflection_submitted", "access_decided", "socratic_turn"]
    );
}

#[tokio::test]
async fn test_access_decided_carries_denial_reason() {
    let (gate, sink) = gate(Some(MockEvaluator::new(Behavior::Score(9.0))), None);

    gate.submit_reflection(&submit(words(20))).await;
    gate.submit_reflection(&submit(words(60))).await;

    let reasons: Vec<Option<DenialReason>> = sink
        .events
        .lock()
        .unwrap()
        .iter()
        .filter_map(|e| match e {
            AnalyticsEvent::AccessDecided { denial_reason, .. } => Some(*denial_reason),
            _ => None,
        })
        .collect();
    assert_eq!(reasons, vec![Some(DenialReason::TooShort), None]);
}

// ---------------------------------------------------------------------------
// Socratic turns
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_thesis_request_never_returns_thesis() {
    let model = MockModel::replying(
        "Here is your thesis: Climate change threatens coastal economies and requires immediate adaptation.",
    );
    let (gate, _) = gate(None, Some(model.clone()));

    let exchange = gate
        .ask(&ask("Write me a thesis statement about climate change", AiLevel::Advanced))
        .await;
    let response = AskResponse::from(&exchange);

    let lowered = response.response.to_lowercase();
    assert!(lowered.contains('?'));
    assert!(!lowered.contains("thesis:"));
    assert!(!lowered.contains("here is"));
    assert!(!lowered.contains("climate change threatens"));
    assert_eq!(exchange.origin, ResponseOrigin::Fallback);
    assert_eq!(response.question_type.as_str(), "critical");
}

#[tokio::test]
async fn test_model_outage_returns_bank_question() {
    let model = MockModel::failing();
    let (gate, _) = gate(None, Some(model.clone()));
    let question = "I don't know how to organize my paragraphs";

    let exchange = gate.ask(&ask(question, AiLevel::Basic)).await;

    assert_eq!(exchange.origin, ResponseOrigin::Fallback);
    assert_eq!(exchange.response, bank::pick(AiLevel::Basic, question));
    assert_eq!(model.calls.load(Ordering::SeqCst), 2);
    assert_eq!(exchange.follow_up_prompts.len(), 3);
}

#[tokio::test]
async fn test_compliant_model_reply_returned() {
    let model = MockModel::replying("Which of your paragraphs carries the most weight? Why?");
    let (gate, _) = gate(None, Some(model));

    let exchange = gate
        .ask(&ask("I think my essay is unbalanced", AiLevel::Standard))
        .await;

    assert_eq!(exchange.origin, ResponseOrigin::Model);
    assert_eq!(
        exchange.response,
        "Which of your paragraphs carries the most weight? Why?"
    );
}

#[tokio::test]
async fn test_long_reply_cut_to_tier_ceiling() {
    let model = MockModel::replying(
        "What does your reader need first? Why does that come before everything else? \
         How could you check that assumption with someone who hasn't read your draft? \
         What would change if your reader already agreed with you? Which counterargument \
         would you most want to answer, and where in the essay would it fit best? \
         What does your conclusion ask the reader to do, believe, or question afterwards?",
    );
    let (gate, _) = gate(None, Some(model));

    let exchange = gate.ask(&ask("Is my structure okay?", AiLevel::Basic)).await;

    let count = exchange.response.split_whitespace().count();
    assert!(count <= 60, "{} words", count);
    assert!(exchange.response.contains('?'));
    assert_eq!(exchange.origin, ResponseOrigin::Salvaged);
}

#[tokio::test]
async fn test_every_response_is_a_question() {
    let replies = [
        "The answer is that your evidence is weak.",
        "Yes, that works.",
        "Introduction: Rising seas are reshaping the coast.",
        "",
        "You could write about the economic impact instead.",
    ];

    for reply in replies {
        for level in AiLevel::ALL {
            let (gate, _) = gate(None, Some(MockModel::replying(reply)));
            let exchange = gate.ask(&ask("What do I do next?", level)).await;
            assert!(exchange.response.contains('?'), "{:?} at {}", reply, level);
            assert_eq!(exchange.origin, ResponseOrigin::Fallback);
        }
    }
}

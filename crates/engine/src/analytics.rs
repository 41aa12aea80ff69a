//! Fire-and-forget analytics events. Emitting never blocks a request and
//! never fails it; a full channel drops the event.

use serde::Serialize;
use tokio::sync::mpsc;

use reflectgate_common::types::{AiLevel, QuestionType, ResponseOrigin, ScoreSource};
use reflectgate_common::types::DenialReason;
use reflectgate_common::{DocumentRef, ExchangeId, GateError, ReflectionId, UserRef};

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AnalyticsEvent {
    ReflectionSubmitted {
        reflection_id: ReflectionId,
        user_ref: UserRef,
        document_ref: DocumentRef,
        word_count: usize,
    },
    AccessDecided {
        reflection_id: ReflectionId,
        user_ref: UserRef,
        granted: bool,
        ai_level: Option<AiLevel>,
        quality_score: f64,
        /// Present exactly when access was denied.
        denial_reason: Option<DenialReason>,
        /// None when the reflection was rejected before scoring.
        score_source: Option<ScoreSource>,
    },
    SocraticTurn {
        exchange_id: ExchangeId,
        user_ref: UserRef,
        document_ref: DocumentRef,
        ai_level: AiLevel,
        question_type: QuestionType,
        origin: ResponseOrigin,
        latency_ms: u64,
    },
}

impl AnalyticsEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::ReflectionSubmitted { .. } => "reflection_submitted",
            Self::AccessDecided { .. } => "access_decided",
            Self::SocraticTurn { .. } => "socratic_turn",
        }
    }
}

/// Object-safe sink for analytics events. Tests provide recording sinks.
pub trait AnalyticsSink: Send + Sync {
    fn emit(&self, event: AnalyticsEvent);
}

/// Bounded channel into a background drain task.
pub struct ChannelSink {
    tx: mpsc::Sender<AnalyticsEvent>,
}

impl ChannelSink {
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<AnalyticsEvent>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }
}

impl AnalyticsSink for ChannelSink {
    fn emit(&self, event: AnalyticsEvent) {
        if let Err(e) = self.tx.try_send(event) {
            let reason = match e {
                mpsc::error::TrySendError::Full(_) => "full",
                mpsc::error::TrySendError::Closed(_) => "closed",
            };
            metrics::counter!("analytics.dropped", "reason" => reason).increment(1);
        }
    }
}

/// Drain events into the structured log until every sender is gone.
pub fn spawn_drain(mut rx: mpsc::Receiver<AnalyticsEvent>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            metrics::counter!("analytics.events", "event" => event.name()).increment(1);
            match serde_json::to_string(&event) {
                Ok(json) => tracing::info!(event = event.name(), payload = %json, "Analytics event"),
                Err(e) => {
                    let error = GateError::from(e);
                    tracing::warn!(
                        error_kind = error.kind(),
                        error = %error,
                        "Failed to serialize analytics event"
                    );
                }
            }
        }
        tracing::debug!("Analytics drain stopped");
    })
}

pub mod bank;
pub mod prompts;

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use reflectgate_common::config::PerLevel;
use reflectgate_common::types::{AiLevel, PriorTurn, ResponseOrigin, SocraticExchange};
use reflectgate_common::{ExchangeId, GateError};

use crate::boundary::{Screen, Verdict, LAST_RESORT};
use crate::llm::{CompletionRequest, LanguageModel};
use crate::provider::{call_with_policy, CallPolicy, ProviderError};

use prompts::RequestIntent;

/// One student turn to answer.
#[derive(Clone, Copy, Debug)]
pub struct TurnRequest<'a> {
    pub question: &'a str,
    pub ai_level: AiLevel,
    pub document_context: &'a str,
    pub history: &'a [PriorTurn],
}

/// Produces question-only replies scaled to the student's tier.
///
/// Never fails: provider errors and filter rejections end in a bank question.
pub struct SocraticEngine {
    system_prompt: String,
    policy: CallPolicy,
    max_words: PerLevel<u32>,
    opening_questions: PerLevel<u32>,
}

impl SocraticEngine {
    pub fn new(
        system_prompt: String,
        policy: CallPolicy,
        max_words: PerLevel<u32>,
        opening_questions: PerLevel<u32>,
    ) -> Self {
        Self {
            system_prompt,
            policy,
            max_words,
            opening_questions,
        }
    }

    pub fn max_words(&self, level: AiLevel) -> u32 {
        self.max_words.get(level)
    }

    pub fn opening_count(&self, level: AiLevel) -> usize {
        self.opening_questions.get(level) as usize
    }

    pub async fn respond(
        &self,
        llm: Option<&Arc<dyn LanguageModel>>,
        turn: &TurnRequest<'_>,
    ) -> SocraticExchange {
        let level = turn.ai_level;
        let max_words = self.max_words(level);
        let intent = prompts::classify_request(turn.question);

        let mut screen = Screen::new(max_words);
        for prior in turn.history {
            screen = screen.forbid_echo(&prior.user_message);
        }
        if intent == RequestIntent::ContentRequest {
            screen = screen.forbid_echo(turn.question);
        }

        let fallback = bank::pick(level, turn.question);

        let candidate = match llm {
            Some(model) => {
                let prompt = prompts::build_turn_prompt(
                    turn.question,
                    level,
                    turn.document_context,
                    turn.history,
                    intent,
                    max_words,
                );
                match self.complete(model, prompt).await {
                    Ok(text) => Some(text),
                    Err(e) => {
                        let error = GateError::from(e);
                        tracing::warn!(
                            error_kind = error.kind(),
                            error = %error,
                            ai_level = %level,
                            "Language model unavailable, using fallback question"
                        );
                        None
                    }
                }
            }
            None => None,
        };

        let (text, origin) = match candidate {
            Some(text) => {
                let filtered = screen.enforce(&text, fallback);
                let origin = match filtered.verdict {
                    Verdict::Passed => ResponseOrigin::Model,
                    Verdict::Salvaged => ResponseOrigin::Salvaged,
                    Verdict::Replaced => ResponseOrigin::Fallback,
                };
                (filtered.text, origin)
            }
            None => (screen.enforce(fallback, LAST_RESORT).text, ResponseOrigin::Fallback),
        };

        metrics::counter!(
            "socratic.responses",
            "ai_level" => level.as_str(),
            "origin" => origin.as_str()
        )
        .increment(1);

        SocraticExchange {
            id: ExchangeId::new(),
            question: turn.question.to_string(),
            ai_level: level,
            question_type: level.question_type(),
            document_context: prompts::truncate_context(turn.document_context, prompts::CONTEXT_CHARS)
                .to_string(),
            response: text.into_string(),
            follow_up_prompts: prompts::follow_up_prompts(level),
            origin,
            created_at: Utc::now(),
        }
    }

    /// Opening questions for a newly granted tier, grounded in the reflection
    /// and the draft excerpt. Every question, bank top-ups included, passes
    /// the filter.
    pub async fn opening_questions(
        &self,
        llm: Option<&Arc<dyn LanguageModel>>,
        level: AiLevel,
        reflection: &str,
        document_context: &str,
    ) -> Vec<String> {
        let count = self.opening_count(level);
        let max_words = self.max_words(level);
        let screen = Screen::new(max_words);

        let mut questions: Vec<String> = Vec::with_capacity(count);
        let mut seen: HashSet<String> = HashSet::new();

        if let Some(model) = llm {
            let prompt = prompts::build_opening_prompt(
                level,
                reflection,
                document_context,
                count,
                max_words,
            );
            match self.complete(model, prompt).await {
                Ok(text) => {
                    for line in text.lines() {
                        if questions.len() >= count {
                            break;
                        }
                        let line = prompts::strip_list_marker(line);
                        if line.is_empty() {
                            continue;
                        }
                        if let Some(question) = screen.screen(line) {
                            if seen.insert(question.as_str().to_lowercase()) {
                                questions.push(question.into_string());
                            }
                        }
                    }
                }
                Err(e) => {
                    let error = GateError::from(e);
                    tracing::warn!(
                        error_kind = error.kind(),
                        error = %error,
                        ai_level = %level,
                        "Language model unavailable, using bank opening questions"
                    );
                }
            }
        }

        let bank = bank::questions(level);
        let start = bank::index(level, reflection);
        for offset in 0..bank.len() {
            if questions.len() >= count {
                break;
            }
            let Some(question) = screen.screen(bank[(start + offset) % bank.len()]) else {
                continue;
            };
            if seen.insert(question.as_str().to_lowercase()) {
                questions.push(question.into_string());
            }
        }

        questions
    }

    async fn complete(
        &self,
        model: &Arc<dyn LanguageModel>,
        prompt: String,
    ) -> Result<String, ProviderError> {
        let request = CompletionRequest::new(self.system_prompt.as_str(), prompt);
        call_with_policy("socratic_llm", &self.policy, || {
            let model = Arc::clone(model);
            let request = request.clone();
            async move {
                let completion = model.complete(&request).await?;
                Ok(completion.text)
            }
        })
        .await
    }
}

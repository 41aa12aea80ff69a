use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::llm::{CompletionRequest, LanguageModel};
use crate::provider::ProviderError;

/// What an evaluator is asked to score.
#[derive(Clone, Debug, Serialize)]
pub struct EvaluationRequest {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

/// Object-safe trait for the external quality evaluator (dyn dispatch).
/// One attempt per call; the scorer applies timeout and retry.
pub trait QualityEvaluator: Send + Sync {
    fn name(&self) -> &'static str;

    fn evaluate<'a>(
        &'a self,
        request: &'a EvaluationRequest,
    ) -> Pin<Box<dyn Future<Output = Result<f64, ProviderError>> + Send + 'a>>;
}

// ---------------------------------------------------------------------------
// Language-model evaluator
// ---------------------------------------------------------------------------

/// Asks a language model for a 0–10 rating and reads the first number in the reply.
pub struct LlmEvaluator {
    model: Arc<dyn LanguageModel>,
    system_prompt: String,
}

impl LlmEvaluator {
    pub fn new(model: Arc<dyn LanguageModel>, system_prompt: String) -> Self {
        Self {
            model,
            system_prompt,
        }
    }
}

impl QualityEvaluator for LlmEvaluator {
    fn name(&self) -> &'static str {
        "llm_evaluator"
    }

    fn evaluate<'a>(
        &'a self,
        request: &'a EvaluationRequest,
    ) -> Pin<Box<dyn Future<Output = Result<f64, ProviderError>> + Send + 'a>> {
        Box::pin(async move {
            let mut prompt = format!("Student reflection:\n\n{}", request.text);
            if let Some(context) = &request.context {
                prompt.push_str("\n\nDocument context:\n\n");
                prompt.push_str(context);
            }
            prompt.push_str("\n\nRespond with a single number from 0 to 10.");

            let completion = self
                .model
                .complete(&CompletionRequest::new(self.system_prompt.as_str(), prompt))
                .await?;

            parse_score(&completion.text).ok_or_else(|| {
                ProviderError::Malformed(format!("no score in reply: {:?}", completion.text))
            })
        })
    }
}

/// The single score in a model reply, e.g. "Score: 7.5/10" gives 7.5.
///
/// Denominators written as "/10" are ignored. A reply naming any other
/// second number ("On a 0-10 scale, 7") is ambiguous and yields `None`.
fn parse_score(text: &str) -> Option<f64> {
    let mut found: Option<f64> = None;
    let mut rest = text;

    while let Some(start) = rest.find(|c: char| c.is_ascii_digit()) {
        let denominator = rest[..start].trim_end().ends_with('/');
        let tail = &rest[start..];

        let mut seen_dot = false;
        let end = tail
            .char_indices()
            .find(|&(i, c)| {
                if c == '.' && !seen_dot && tail[i + 1..].starts_with(|d: char| d.is_ascii_digit()) {
                    seen_dot = true;
                    false
                } else {
                    !c.is_ascii_digit()
                }
            })
            .map(|(i, _)| i)
            .unwrap_or(tail.len());

        if !denominator {
            let value: f64 = tail[..end].parse().ok()?;
            match found {
                Some(existing) if existing != value => return None,
                _ => found = Some(value),
            }
        }

        rest = &tail[end..];
    }

    found
}

// ---------------------------------------------------------------------------
// HTTP evaluation service
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct EvaluationResponse {
    score: f64,
}

/// Posts `{text, context}` to an evaluation service that answers `{score}`.
pub struct HttpEvaluator {
    http: reqwest::Client,
    endpoint: String,
}

impl HttpEvaluator {
    pub fn new(endpoint: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint,
        }
    }

    async fn post(&self, request: &EvaluationRequest) -> Result<f64, ProviderError> {
        let response = self
            .http
            .post(&self.endpoint)
            .json(request)
            .send()
            .await
            .map_err(|e| ProviderError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Http(format!("{}: {}", status, body)));
        }

        let body: EvaluationResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Malformed(format!("Failed to parse response: {}", e)))?;

        Ok(body.score)
    }
}

impl QualityEvaluator for HttpEvaluator {
    fn name(&self) -> &'static str {
        "http_evaluator"
    }

    fn evaluate<'a>(
        &'a self,
        request: &'a EvaluationRequest,
    ) -> Pin<Box<dyn Future<Output = Result<f64, ProviderError>> + Send + 'a>> {
        Box::pin(self.post(request))
    }
}

use reflectgate_common::config::{LlmRoleConfig, PerLevel};

use super::loader::{ConfigError, EngineConfig, REFLECTION_ASSESSMENT_PROMPT, SOCRATIC_SYSTEM_PROMPT};
use crate::boundary::MIN_WORD_CEILING;
use crate::provider::MAX_ATTEMPTS;

pub const EVALUATORS: &[&str] = &["llm", "http", "heuristic"];
const PROVIDERS: &[&str] = &["anthropic", "openai"];

/// Validate the complete engine configuration.
///
/// Checks sane ranges on numeric parameters and that every prompt the
/// configured providers need is present.
pub fn validate(config: &EngineConfig) -> Result<(), ConfigError> {
    let mut errors: Vec<String> = Vec::new();

    validate_gate(config, &mut errors);
    validate_scorer(config, &mut errors);
    validate_llm(config, &mut errors);
    validate_provider_calls(config, &mut errors);
    validate_tiers(config, &mut errors);
    validate_prompts(config, &mut errors);

    if config.system.analytics.channel_capacity == 0 {
        errors.push("analytics.channel_capacity must be > 0".into());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::Validation(errors.join("; ")))
    }
}

fn validate_gate(config: &EngineConfig, errors: &mut Vec<String>) {
    if config.system.gate.max_reflection_chars == 0 {
        errors.push("gate.max_reflection_chars must be > 0".into());
    }
}

fn validate_scorer(config: &EngineConfig, errors: &mut Vec<String>) {
    let s = &config.system.scorer;

    if !EVALUATORS.contains(&s.evaluator.as_str()) {
        errors.push(format!(
            "scorer.evaluator must be one of {}, got {:?}",
            EVALUATORS.join(", "),
            s.evaluator
        ));
    }
    if s.evaluator == "http" {
        match s.endpoint.as_deref() {
            Some(url) if url.starts_with("http://") || url.starts_with("https://") => {}
            Some(url) => errors.push(format!("scorer.endpoint is not an http(s) URL: {}", url)),
            None => errors.push("scorer.endpoint is required when evaluator = \"http\"".into()),
        }
    }
}

fn validate_llm(config: &EngineConfig, errors: &mut Vec<String>) {
    let validate_role = |role: &LlmRoleConfig, name: &str, errors: &mut Vec<String>| {
        if !PROVIDERS.contains(&role.provider.as_str()) {
            errors.push(format!(
                "llm.{}.provider must be one of {}",
                name,
                PROVIDERS.join(", ")
            ));
        }
        if role.model.is_empty() {
            errors.push(format!("llm.{}.model must not be empty", name));
        }
        if role.max_tokens == 0 {
            errors.push(format!("llm.{}.max_tokens must be > 0", name));
        }
        if let Some(temp) = role.temperature {
            if !(0.0..=2.0).contains(&temp) {
                errors.push(format!(
                    "llm.{}.temperature must be between 0.0 and 2.0",
                    name
                ));
            }
        }
    };

    validate_role(&config.system.llm.scorer, "scorer", errors);
    validate_role(&config.system.llm.socratic, "socratic", errors);
}

fn validate_provider_calls(config: &EngineConfig, errors: &mut Vec<String>) {
    let p = &config.system.provider_calls;

    if !(100..=10_000).contains(&p.timeout_ms) {
        errors.push("provider_calls.timeout_ms must be between 100 and 10000".into());
    }
    if p.max_attempts == 0 || p.max_attempts > MAX_ATTEMPTS {
        errors.push(format!(
            "provider_calls.max_attempts must be between 1 and {}",
            MAX_ATTEMPTS
        ));
    }
    if p.initial_backoff_ms == 0 {
        errors.push("provider_calls.initial_backoff_ms must be > 0".into());
    }
    if p.max_backoff_ms < p.initial_backoff_ms {
        errors.push("provider_calls.max_backoff_ms must be >= initial_backoff_ms".into());
    }
    if p.backoff_multiplier < 1.0 {
        errors.push("provider_calls.backoff_multiplier must be >= 1.0".into());
    }
}

fn validate_tiers(config: &EngineConfig, errors: &mut Vec<String>) {
    let check = |values: &PerLevel<u32>, name: &str, range: (u32, u32), errors: &mut Vec<String>| {
        for (tier, value) in [
            ("basic", values.basic),
            ("standard", values.standard),
            ("advanced", values.advanced),
        ] {
            if value < range.0 || value > range.1 {
                errors.push(format!(
                    "{}.{} must be between {} and {}",
                    name, tier, range.0, range.1
                ));
            }
        }
        if values.basic > values.standard || values.standard > values.advanced {
            errors.push(format!("{} must not decrease from basic to advanced", name));
        }
    };

    check(
        &config.system.boundary.max_words,
        "boundary.max_words",
        (MIN_WORD_CEILING, 1000),
        errors,
    );
    check(&config.system.opening_questions, "opening_questions", (1, 5), errors);
}

fn validate_prompts(config: &EngineConfig, errors: &mut Vec<String>) {
    let mut require = |name: &str| {
        if config.prompt(name).map_or(true, |p| p.trim().is_empty()) {
            errors.push(format!("prompts/{}.md is missing or empty", name));
        }
    };

    require(SOCRATIC_SYSTEM_PROMPT);
    if config.system.scorer.evaluator == "llm" {
        require(REFLECTION_ASSESSMENT_PROMPT);
    }
}

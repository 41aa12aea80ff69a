use reflectgate_common::types::{AiLevel, PriorTurn};

/// Prior turns carried into the prompt, most recent last.
pub const HISTORY_TURNS: usize = 5;

/// Document context kept in the prompt, in characters, from the end.
pub const CONTEXT_CHARS: usize = 2000;

const CONTENT_REQUEST_MARKERS: &[&str] = &[
    "write me",
    "write my",
    "write the",
    "write a ",
    "can you write",
    "complete this sentence",
    "complete my",
    "finish this",
    "finish my",
    "give me a thesis",
    "give me an intro",
    "give me a conclusion",
    "rewrite",
    "reword",
    "paraphrase",
    "summarize",
    "draft ",
    "fix my",
    "what should i write",
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RequestIntent {
    Exploratory,
    /// The student is asking for finished content.
    ContentRequest,
}

pub fn classify_request(question: &str) -> RequestIntent {
    let lowered = question
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    if CONTENT_REQUEST_MARKERS.iter().any(|m| lowered.contains(m)) {
        RequestIntent::ContentRequest
    } else {
        RequestIntent::Exploratory
    }
}

fn tier_instructions(level: AiLevel) -> &'static str {
    match level {
        AiLevel::Basic => {
            "Ask one or two short clarifying questions in plain language. Help the student \
             say what they mean, name their main point, and find a concrete instance of it."
        }
        AiLevel::Standard => {
            "Ask two or three analytical questions about evidence, structure, and how the \
             parts of the argument connect. Point the student at gaps they can examine themselves."
        }
        AiLevel::Advanced => {
            "Ask two to four probing questions about the assumptions underneath the argument, \
             the implications of its claims, the strength of its evidence, and how other \
             perspectives would challenge it."
        }
    }
}

const CONTENT_REDIRECT: &str = "The student is asking you to produce finished writing. Do not \
    produce it, in whole or in part. Redirect them to their own thinking with questions that \
    help them work it out themselves.";

/// Fixed follow-up prompts shown alongside every response at a tier.
pub fn follow_up_prompts(level: AiLevel) -> Vec<String> {
    let prompts: &[&str] = match level {
        AiLevel::Basic => &[
            "What do you mean by that?",
            "Can you give an instance from your draft?",
            "What's your main point?",
        ],
        AiLevel::Standard => &[
            "What evidence supports this?",
            "How does this connect to your argument?",
            "What might someone who disagrees say?",
        ],
        AiLevel::Advanced => &[
            "What assumptions are you making?",
            "What are the implications of this?",
            "How might this look from another perspective?",
        ],
    };
    prompts.iter().map(|p| p.to_string()).collect()
}

/// Tail of the document context, cut on a char boundary.
pub fn truncate_context(context: &str, max_chars: usize) -> &str {
    let total = context.chars().count();
    if total <= max_chars {
        return context;
    }
    match context.char_indices().nth(total - max_chars) {
        Some((start, _)) => &context[start..],
        None => context,
    }
}

pub fn build_turn_prompt(
    question: &str,
    level: AiLevel,
    document_context: &str,
    history: &[PriorTurn],
    intent: RequestIntent,
    max_words: u32,
) -> String {
    let mut prompt = String::new();

    prompt.push_str(&format!(
        "## Tier: {} ({} questions)\n\n{}\n\n",
        level,
        level.question_type().as_str(),
        tier_instructions(level)
    ));

    if intent == RequestIntent::ContentRequest {
        prompt.push_str(CONTENT_REDIRECT);
        prompt.push_str("\n\n");
    }

    let context = truncate_context(document_context.trim(), CONTEXT_CHARS);
    if !context.is_empty() {
        prompt.push_str("## Student's draft (excerpt)\n\n");
        prompt.push_str(context);
        prompt.push_str("\n\n");
    }

    let recent = &history[history.len().saturating_sub(HISTORY_TURNS)..];
    if !recent.is_empty() {
        prompt.push_str("## Earlier in this conversation\n\n");
        for turn in recent {
            prompt.push_str(&format!("Student: {}\n", turn.user_message.trim()));
            if !turn.ai_response.trim().is_empty() {
                prompt.push_str(&format!("You: {}\n", turn.ai_response.trim()));
            }
        }
        prompt.push('\n');
    }

    prompt.push_str("## Student's message\n\n");
    prompt.push_str(question.trim());
    prompt.push_str(&format!(
        "\n\nReply only with questions, in at most {} words.",
        max_words
    ));

    prompt
}

pub fn build_opening_prompt(
    level: AiLevel,
    reflection: &str,
    document_context: &str,
    count: usize,
    max_words: u32,
) -> String {
    let mut prompt = format!(
        "## Tier: {} ({} questions)\n\n{}\n\n## Student's reflection\n\n{}\n\n",
        level,
        level.question_type().as_str(),
        tier_instructions(level),
        reflection.trim(),
    );

    let context = truncate_context(document_context.trim(), CONTEXT_CHARS);
    if !context.is_empty() {
        prompt.push_str("## Student's draft (excerpt)\n\n");
        prompt.push_str(context);
        prompt.push_str("\n\n");
    }

    prompt.push_str(&format!(
        "Write exactly {} opening questions that help the student start from this reflection \
         and their draft. One question per line, no numbering, each at most {} words.",
        count, max_words
    ));

    prompt
}

/// Strip list markers such as "1.", "2)", "-", "*" from a model line.
pub fn strip_list_marker(line: &str) -> &str {
    let line = line.trim();
    let rest = line.trim_start_matches(|c: char| c.is_ascii_digit());
    let rest = if rest.len() < line.len() {
        rest.strip_prefix(['.', ')']).unwrap_or(line)
    } else {
        rest.strip_prefix(['-', '*', '\u{2022}']).unwrap_or(rest)
    };
    rest.trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_request() {
        for text in [
            "Write me a thesis statement about climate change",
            "Can you   WRITE my conclusion?",
            "Please rewrite this paragraph",
            "Summarize my argument for me",
        ] {
            assert_eq!(classify_request(text), RequestIntent::ContentRequest, "{}", text);
        }
        for text in [
            "I'm not sure my evidence supports my claim",
            "How do I know if my argument is strong?",
        ] {
            assert_eq!(classify_request(text), RequestIntent::Exploratory, "{}", text);
        }
    }

    #[test]
    fn test_truncate_context_keeps_tail() {
        assert_eq!(truncate_context("abcdef", 10), "abcdef");
        assert_eq!(truncate_context("abcdef", 3), "def");
        assert_eq!(truncate_context("héllo wörld", 5), "wörld");
    }

    #[test]
    fn test_turn_prompt_limits_history() {
        let history: Vec<PriorTurn> = (0..8)
            .map(|i| PriorTurn {
                user_message: format!("message {}", i),
                ai_response: format!("reply {}?", i),
            })
            .collect();

        let prompt = build_turn_prompt(
            "Write me a conclusion",
            AiLevel::Advanced,
            "",
            &history,
            RequestIntent::ContentRequest,
            150,
        );

        assert!(!prompt.contains("message 2"));
        assert!(prompt.contains("message 3"));
        assert!(prompt.contains("message 7"));
        assert!(prompt.contains("Do not produce it"));
        assert!(prompt.contains("critical questions"));
        assert!(prompt.contains("at most 150 words"));
        assert!(!prompt.contains("Student's draft"));
    }

    #[test]
    fn test_opening_prompt_includes_draft_excerpt() {
        let draft = format!("{}The seawall vote is the turning point.", "x".repeat(CONTEXT_CHARS));
        let prompt = build_opening_prompt(AiLevel::Standard, "I rushed my ending.", &draft, 3, 100);

        assert!(prompt.contains("## Student's draft (excerpt)"));
        assert!(prompt.contains("The seawall vote is the turning point."));
        assert!(prompt.contains("I rushed my ending."));
        assert!(prompt.contains("exactly 3 opening questions"));
        assert!(!prompt.contains(&"x".repeat(CONTEXT_CHARS)));

        let bare = build_opening_prompt(AiLevel::Standard, "I rushed my ending.", "  ", 3, 100);
        assert!(!bare.contains("## Student's draft"));
    }

    #[test]
    fn test_strip_list_marker() {
        assert_eq!(strip_list_marker("1. What is it?"), "What is it?");
        assert_eq!(strip_list_marker("  2) Why?"), "Why?");
        assert_eq!(strip_list_marker("- How so?"), "How so?");
        assert_eq!(strip_list_marker("\u{2022} Who?"), "Who?");
        assert_eq!(strip_list_marker("2020 was hard, why?"), "2020 was hard, why?");
    }
}

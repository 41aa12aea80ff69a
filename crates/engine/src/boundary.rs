//! Boundary filter: the last check between a language model and a student.
//!
//! A response may only ask. Anything that answers, drafts, labels finished
//! content, or runs past the tier's word ceiling is cut down to its
//! compliant questions or replaced outright. `SocraticText` can only be
//! built here, so holding one means the text passed.

use std::fmt;

use reflectgate_common::GateError;

/// Substituted when even the caller's fallback fails the filter.
pub const LAST_RESORT: &str = "What would you like to explore next?";

/// Smallest tier ceiling configuration accepts. Every bank question,
/// follow-up prompt, and `LAST_RESORT` fits under it.
pub const MIN_WORD_CEILING: u32 = 15;

/// Minimum words in a prior request before echo checks apply.
const ECHO_MIN_WORDS: usize = 4;
const ECHO_SIMILARITY: f64 = 0.9;

/// Colon-introduced clauses this long that aren't questions read as content.
const COLON_CLAUSE_WORDS: usize = 6;
/// Quoted passages this long that aren't questions read as content.
const QUOTE_WORDS: usize = 8;

const CONTENT_PATTERNS: &[&str] = &[
    "thesis:",
    "here is",
    "here's",
    "here are",
    "you could write",
    "you should write",
    "you should say",
    "you should argue",
    "try this:",
    "your thesis should be",
    "the answer is",
    "answer:",
    "in conclusion,",
    "let me write",
    "let me draft",
    "let me create",
    "i'll write",
    "the paragraph:",
    "introduction:",
    "conclusion:",
    "your sentence:",
    "example:",
    "template:",
    "outline:",
    "the solution is",
    "the fix is",
    "rewritten version",
    "revised version",
];

const DIRECT_OPENINGS: &[&str] = &[
    "yes,",
    "yes.",
    "yes!",
    "no,",
    "no.",
    "no!",
    "correct.",
    "exactly.",
    "that's correct",
    "that is correct",
    "that's right",
    "that's wrong",
    "that is incorrect",
];

/// Text that passed the boundary filter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SocraticText(String);

impl SocraticText {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for SocraticText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Violation {
    NoQuestion,
    ContentPattern(&'static str),
    ColonContent,
    QuotedPassage,
    DirectAnswer,
    TooLong { words: usize, limit: usize },
    Echo,
}

impl Violation {
    pub fn label(&self) -> &'static str {
        match self {
            Self::NoQuestion => "no_question",
            Self::ContentPattern(_) => "content_pattern",
            Self::ColonContent => "colon_content",
            Self::QuotedPassage => "quoted_passage",
            Self::DirectAnswer => "direct_answer",
            Self::TooLong { .. } => "too_long",
            Self::Echo => "echo",
        }
    }
}

/// How the returned text relates to the candidate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
    Passed,
    Salvaged,
    Replaced,
}

#[derive(Debug)]
pub struct Filtered {
    pub text: SocraticText,
    pub verdict: Verdict,
    /// Violations found in the original candidate.
    pub violations: Vec<Violation>,
}

/// Filter settings for one response: the tier's word ceiling and the prior
/// content requests the response must not echo back.
#[derive(Clone, Debug)]
pub struct Screen {
    max_words: usize,
    needles: Vec<String>,
}

impl Screen {
    pub fn new(max_words: u32) -> Self {
        Self {
            max_words: max_words as usize,
            needles: Vec::new(),
        }
    }

    /// Register a content request whose wording must not come back verbatim.
    pub fn forbid_echo(mut self, request: &str) -> Self {
        let needle = prepare(request)
            .trim_end_matches(|c: char| c == '.' || c == '?' || c == '!' || c.is_whitespace())
            .to_string();
        if word_count(&needle) >= ECHO_MIN_WORDS && !self.needles.contains(&needle) {
            self.needles.push(needle);
        }
        self
    }

    pub fn inspect(&self, candidate: &str) -> Vec<Violation> {
        let lowered = prepare(candidate);
        let mut violations = Vec::new();

        if !candidate.contains('?') {
            violations.push(Violation::NoQuestion);
        }

        if let Some(pattern) = CONTENT_PATTERNS.iter().find(|p| lowered.contains(**p)) {
            violations.push(Violation::ContentPattern(*pattern));
        }

        if has_colon_content(&lowered) {
            violations.push(Violation::ColonContent);
        }

        if has_quoted_passage(&lowered) {
            violations.push(Violation::QuotedPassage);
        }

        if DIRECT_OPENINGS.iter().any(|o| lowered.starts_with(*o)) {
            violations.push(Violation::DirectAnswer);
        }

        let words = word_count(&lowered);
        if words > self.max_words {
            violations.push(Violation::TooLong {
                words,
                limit: self.max_words,
            });
        }

        if self.echoes(&lowered) {
            violations.push(Violation::Echo);
        }

        violations
    }

    /// The candidate as-is if it passes, else nothing.
    pub fn screen(&self, candidate: &str) -> Option<SocraticText> {
        let trimmed = candidate.trim();
        if self.inspect(trimmed).is_empty() {
            Some(SocraticText(trimmed.to_string()))
        } else {
            None
        }
    }

    /// Always yields compliant text: the candidate, its compliant questions,
    /// the fallback, or `LAST_RESORT`, in that order of preference.
    pub fn enforce(&self, candidate: &str, fallback: &str) -> Filtered {
        let candidate = candidate.trim();
        let violations = self.inspect(candidate);
        if violations.is_empty() {
            return Filtered {
                text: SocraticText(candidate.to_string()),
                verdict: Verdict::Passed,
                violations,
            };
        }

        for violation in &violations {
            metrics::counter!("boundary.violations", "kind" => violation.label()).increment(1);
        }

        if let Some(salvaged) = self.salvage(candidate) {
            tracing::debug!(
                violations = ?violations,
                "Response cut down to its compliant questions"
            );
            return Filtered {
                text: salvaged,
                verdict: Verdict::Salvaged,
                violations,
            };
        }

        tracing::warn!(
            violations = ?violations,
            "Response failed the boundary filter, substituting fallback question"
        );

        let text = self
            .screen(fallback)
            .or_else(|| self.screen(LAST_RESORT))
            .unwrap_or_else(|| {
                let error = GateError::Boundary(format!(
                    "no canned question fits a {}-word ceiling",
                    self.max_words
                ));
                tracing::error!(error_kind = error.kind(), error = %error, "Returning last resort question");
                SocraticText(LAST_RESORT.to_string())
            });
        Filtered {
            text,
            verdict: Verdict::Replaced,
            violations,
        }
    }

    fn salvage(&self, candidate: &str) -> Option<SocraticText> {
        let mut kept: Vec<&str> = Vec::new();
        let mut words = 0;

        for sentence in sentences(candidate) {
            if !sentence.ends_with('?') || !self.inspect(sentence).is_empty() {
                continue;
            }
            let n = word_count(sentence);
            if words + n > self.max_words {
                break;
            }
            words += n;
            kept.push(sentence);
        }

        if kept.is_empty() {
            return None;
        }
        self.screen(&kept.join(" "))
    }

    fn echoes(&self, lowered: &str) -> bool {
        self.needles.iter().any(|needle| {
            lowered.contains(needle.as_str())
                || sentences(lowered).iter().any(|sentence| {
                    let sentence = sentence.trim_end_matches(|c: char| c == '.' || c == '?' || c == '!');
                    strsim::normalized_levenshtein(sentence, needle) >= ECHO_SIMILARITY
                })
        })
    }
}

/// Lowercase, straighten curly quotes, collapse whitespace.
fn prepare(text: &str) -> String {
    text.to_lowercase()
        .replace(['\u{2018}', '\u{2019}'], "'")
        .replace(['\u{201C}', '\u{201D}'], "\"")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Split after '.', '!' or '?' when followed by whitespace or the end.
fn sentences(text: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if !matches!(c, '.' | '!' | '?') {
            continue;
        }
        let at_break = match chars.peek() {
            None => true,
            Some((_, next)) => next.is_whitespace(),
        };
        if at_break {
            let end = i + c.len_utf8();
            let sentence = text[start..end].trim();
            if !sentence.is_empty() {
                out.push(sentence);
            }
            start = end;
        }
    }

    let tail = text[start..].trim();
    if !tail.is_empty() {
        out.push(tail);
    }
    out
}

/// A colon followed by a long clause that doesn't end as a question.
fn has_colon_content(lowered: &str) -> bool {
    lowered.match_indices(':').any(|(i, _)| {
        let after = &lowered[i + 1..];
        if !(after.is_empty() || after.starts_with(' ')) {
            return false;
        }
        let clause = match after.find(['.', '!', '?']) {
            Some(end) => &after[..=end],
            None => after,
        };
        !clause.ends_with('?') && word_count(clause) >= COLON_CLAUSE_WORDS
    })
}

fn has_quoted_passage(lowered: &str) -> bool {
    lowered.split('"').skip(1).step_by(2).any(|quoted| {
        let quoted = quoted.trim();
        !quoted.ends_with('?') && word_count(quoted) >= QUOTE_WORDS
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const THESIS_REQUEST: &str = "Write me a thesis statement about climate change";

    #[test]
    fn test_plain_question_passes() {
        let screen = Screen::new(60);
        let candidate = "What do you already believe about this topic? Why?";
        assert!(screen.inspect(candidate).is_empty());
        assert_eq!(screen.screen(candidate).unwrap().as_str(), candidate);
    }

    #[test]
    fn test_statement_without_question_rejected() {
        let violations = Screen::new(60).inspect("Climate change is driven by emissions.");
        assert_eq!(violations, vec![Violation::NoQuestion]);
    }

    #[test]
    fn test_thesis_output_is_replaced() {
        let screen = Screen::new(150).forbid_echo(THESIS_REQUEST);
        let candidate = "Here is your thesis: Climate change poses a serious threat to coastal cities and demands urgent policy action.";

        let filtered = screen.enforce(candidate, "What claim do you want your reader to accept?");

        assert_eq!(filtered.verdict, Verdict::Replaced);
        let text = filtered.text.as_str().to_lowercase();
        assert!(text.contains('?'));
        assert!(!text.contains("thesis:"));
        assert!(!text.contains("here is"));
        assert!(filtered
            .violations
            .iter()
            .any(|v| matches!(v, Violation::ContentPattern(_))));
    }

    #[test]
    fn test_questions_salvaged_from_mixed_output() {
        let screen = Screen::new(100);
        let candidate = "Thesis: Renewable energy adoption must accelerate to meet climate targets. \
            What evidence convinced you this matters? Which audience are you writing for?";

        let filtered = screen.enforce(candidate, "unused?");

        assert_eq!(filtered.verdict, Verdict::Salvaged);
        assert_eq!(
            filtered.text.as_str(),
            "What evidence convinced you this matters? Which audience are you writing for?"
        );
    }

    #[test]
    fn test_colon_declarative_clause_rejected() {
        let screen = Screen::new(100);
        let candidate = "Consider this framing: coastal cities will lose billions in property value. Does that fit?";
        assert!(screen.inspect(candidate).contains(&Violation::ColonContent));

        // A colon that introduces a question is fine.
        assert!(screen
            .inspect("Think about your reader: what do they already know?")
            .is_empty());
    }

    #[test]
    fn test_long_quoted_passage_rejected() {
        let screen = Screen::new(100);
        let candidate = "What if you opened with \u{201C}Rising seas will redraw every coastline on earth within a century\u{201D}?";
        assert!(screen.inspect(candidate).contains(&Violation::QuotedPassage));
    }

    #[test]
    fn test_direct_answer_rejected() {
        let violations = Screen::new(60).inspect("Yes, that is the right approach. What next?");
        assert!(violations.contains(&Violation::DirectAnswer));
    }

    #[test]
    fn test_word_ceiling() {
        let long = format!("{}?", "why ".repeat(61).trim_end());
        let violations = Screen::new(60).inspect(&long);
        assert_eq!(violations, vec![Violation::TooLong { words: 61, limit: 60 }]);
        assert!(Screen::new(100).inspect(&long).is_empty());
    }

    #[test]
    fn test_echo_of_prior_request() {
        let screen = Screen::new(100).forbid_echo(THESIS_REQUEST);

        let verbatim = "Write me a thesis statement about climate change? What do you think?";
        assert!(screen.inspect(verbatim).contains(&Violation::Echo));

        let near = "Write me a thesis statment about climate change?";
        assert!(screen.inspect(near).contains(&Violation::Echo));

        assert!(screen
            .inspect("What do you find most urgent about climate change?")
            .is_empty());
    }

    #[test]
    fn test_short_requests_are_not_echo_needles() {
        let screen = Screen::new(100).forbid_echo("Fix this");
        assert!(screen.inspect("What would you fix this with?").is_empty());
    }

    #[test]
    fn test_bad_fallback_uses_last_resort() {
        let filtered = Screen::new(60).enforce("Here is the answer.", "The answer is 42.");
        assert_eq!(filtered.verdict, Verdict::Replaced);
        assert_eq!(filtered.text.as_str(), LAST_RESORT);
        assert!(Screen::new(60).inspect(LAST_RESORT).is_empty());
    }

    #[test]
    fn test_oversized_fallback_never_exceeds_ceiling() {
        let fallback = "What is the best way to test whether your evidence really supports your point?";
        let screen = Screen::new(10);
        let filtered = screen.enforce("Plain statement.", fallback);

        assert_eq!(filtered.verdict, Verdict::Replaced);
        assert_eq!(filtered.text.as_str(), LAST_RESORT);
        assert!(screen.inspect(filtered.text.as_str()).is_empty());
    }

    #[test]
    fn test_last_resort_fits_minimum_ceiling() {
        assert!(Screen::new(MIN_WORD_CEILING).inspect(LAST_RESORT).is_empty());
    }

    #[test]
    fn test_sentences() {
        assert_eq!(
            sentences("One. Two? Three!  four"),
            vec!["One.", "Two?", "Three!", "four"]
        );
        assert_eq!(sentences("What about 3.5 percent?"), vec!["What about 3.5 percent?"]);
    }
}

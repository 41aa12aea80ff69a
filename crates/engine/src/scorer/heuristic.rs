//! Deterministic local quality score. Used whenever the external evaluator
//! has nothing usable to say.

use std::collections::HashSet;

/// Upper word count that still earns length credit.
const LENGTH_CAP: usize = 200;

const DEPTH_SOPHISTICATED: &[&str] = &[
    "upon reflection",
    "i've analyzed",
    "i'm grappling with",
    "my hypothesis is",
    "i've come to realize",
];
const DEPTH_THOUGHTFUL: &[&str] = &[
    "i'm considering",
    "the challenge is",
    "i've noticed",
    "i'm wondering",
    "on the other hand",
];
const DEPTH_DEVELOPING: &[&str] = &["i think", "maybe", "i feel", "i believe", "probably"];

const SELF_AWARE_HIGH: &[&str] = &[
    "i recognize that i",
    "i realize that i",
    "my assumption",
    "i tend to",
];
const SELF_AWARE_MID: &[&str] = &[
    "i'm struggling with",
    "i'm unsure",
    "i'm confused",
    "i don't understand",
];

const QUESTIONING: &[&str] = &[
    "what if",
    "how might",
    "why does",
    "why do",
    "what would happen",
];
const ANALYZING: &[&str] = &["this suggests", "this implies", "because of this", "the reason"];
const EVALUATING: &[&str] = &[
    "the evidence shows",
    "this assumes",
    "the strength of",
    "the weakness of",
    "is convincing",
];
const SYNTHESIZING: &[&str] = &[
    "bringing together",
    "the pattern here",
    "connects to",
    "combining",
];

const GROWTH_HIGH: &[&str] = &[
    "i'm learning to",
    "next time i'll",
    "i want to improve",
    "i'll try",
];
const GROWTH_MID: &[&str] = &["i need more practice", "i'm working on", "i need to", "i could"];

/// Reflection dimensions read off phrase markers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReflectionDimensions {
    /// 1–4
    pub depth: u8,
    /// 1–3
    pub self_awareness: u8,
    /// 0–4, one point per marker family present
    pub critical_thinking: u8,
    /// 1–3
    pub growth_mindset: u8,
}

impl ReflectionDimensions {
    /// Dimension contribution to the score, 0.0–6.0.
    fn contribution(&self) -> f64 {
        // Weights 0.3/0.2/0.3/0.2 scaled by ten; the sum spans 7..=36.
        let weighted = 3 * self.depth as u32
            + 2 * self.self_awareness as u32
            + 3 * self.critical_thinking as u32
            + 2 * self.growth_mindset as u32;
        (weighted.saturating_sub(7)) as f64 / 29.0 * 6.0
    }
}

pub fn dimensions(text: &str) -> ReflectionDimensions {
    let text = prepare(text);
    let any = |markers: &[&str]| markers.iter().any(|m| text.contains(m));

    let depth = if any(DEPTH_SOPHISTICATED) {
        4
    } else if any(DEPTH_THOUGHTFUL) {
        3
    } else if any(DEPTH_DEVELOPING) {
        2
    } else {
        1
    };

    let self_awareness = if any(SELF_AWARE_HIGH) {
        3
    } else if any(SELF_AWARE_MID) {
        2
    } else {
        1
    };

    let critical_thinking = [QUESTIONING, ANALYZING, EVALUATING, SYNTHESIZING]
        .into_iter()
        .filter(|family| any(family))
        .count() as u8;

    let growth_mindset = if any(GROWTH_HIGH) {
        3
    } else if any(GROWTH_MID) {
        2
    } else {
        1
    };

    ReflectionDimensions {
        depth,
        self_awareness,
        critical_thinking,
        growth_mindset,
    }
}

/// Score in [0, 10], rounded to two decimals. Same text, same score.
pub fn heuristic_score(text: &str) -> f64 {
    let prepared = prepare(text);
    let tokens: Vec<&str> = prepared.split(' ').filter(|t| !t.is_empty()).collect();
    if tokens.is_empty() {
        return 0.0;
    }

    let words = tokens.len();
    let unique = tokens
        .iter()
        .map(|t| t.trim_matches(|c: char| !c.is_alphanumeric()))
        .collect::<HashSet<_>>()
        .len();

    let dimension = dimensions(text).contribution();
    let length = words.min(LENGTH_CAP) as f64 / LENGTH_CAP as f64 * 2.0;
    let diversity = unique as f64 / words as f64 * 2.0;

    let score = (dimension + length + diversity).clamp(0.0, 10.0);
    (score * 100.0).round() / 100.0
}

/// Lowercase, straighten curly apostrophes, collapse whitespace.
fn prepare(text: &str) -> String {
    text.to_lowercase()
        .replace(['\u{2018}', '\u{2019}'], "'")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

//! Local fallback questions, used when the language model is unavailable or
//! its output can't be salvaged.

use reflectgate_common::types::AiLevel;

const BASIC: &[&str] = &[
    "What is the main point you want your reader to take away?",
    "Can you say your idea in one sentence of your own?",
    "What part of this feels most unclear to you right now?",
    "Who are you writing this for?",
    "What do you already know about this topic?",
    "Which word or idea in your draft would you most like to explain better?",
    "What made you choose this topic?",
    "Where did you get stuck, and what were you trying to say there?",
];

const STANDARD: &[&str] = &[
    "What evidence do you have for your main claim, and how strong is it?",
    "How does each paragraph connect back to your central argument?",
    "What would someone who disagrees with you point to first?",
    "Which piece of evidence is doing the most work in your argument, and why?",
    "How could you order your points so each one builds on the last?",
    "Where might a reader lose the thread of your reasoning?",
    "What is the best way to test whether your evidence really supports your point?",
    "Which of your claims still needs support?",
];

const ADVANCED: &[&str] = &[
    "What assumptions does your argument rest on, and which one is weakest?",
    "If your central claim is true, what else must follow from it?",
    "How would someone from a very different background read your argument?",
    "What evidence would change your mind?",
    "Which counterargument worries you most, and how does it reshape your position?",
    "What are the implications of your conclusion beyond the case you discuss?",
    "Where does your reasoning move from what the evidence shows to what you believe?",
    "What would your argument lose if you removed its strongest source?",
];

pub fn questions(level: AiLevel) -> &'static [&'static str] {
    match level {
        AiLevel::Basic => BASIC,
        AiLevel::Standard => STANDARD,
        AiLevel::Advanced => ADVANCED,
    }
}

/// Stable index for `seed`: the same text always picks the same question.
pub fn index(level: AiLevel, seed: &str) -> usize {
    let hash = seed
        .bytes()
        .fold(0u64, |h, b| h.wrapping_mul(31).wrapping_add(b as u64));
    (hash % questions(level).len() as u64) as usize
}

pub fn pick(level: AiLevel, seed: &str) -> &'static str {
    questions(level)[index(level, seed)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boundary::{Screen, MIN_WORD_CEILING};
    use crate::socratic::prompts::follow_up_prompts;

    #[test]
    fn test_every_tier_has_enough_questions() {
        for level in AiLevel::ALL {
            assert!(questions(level).len() >= 8);
        }
    }

    #[test]
    fn test_bank_and_follow_ups_pass_the_filter() {
        // Held to the tightest ceiling configuration accepts.
        let screen = Screen::new(MIN_WORD_CEILING);
        for level in AiLevel::ALL {
            for q in questions(level) {
                assert!(screen.inspect(q).is_empty(), "{:?}: {:?}", q, screen.inspect(q));
            }
            for q in follow_up_prompts(level) {
                assert!(screen.inspect(&q).is_empty(), "{:?}", q);
            }
        }
    }

    #[test]
    fn test_pick_is_deterministic() {
        let seed = "How do I start my conclusion?";
        assert_eq!(pick(AiLevel::Standard, seed), pick(AiLevel::Standard, seed));
        assert!(questions(AiLevel::Advanced).contains(&pick(AiLevel::Advanced, "")));
    }
}

use reflectgate_common::InputError;

/// Markup that never belongs in a reflection.
const UNSAFE_MARKUP: &[&str] = &["<script", "<iframe", "javascript:", "onerror="];

/// A reflection that may be scored.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidatedReflection {
    pub text: String,
    pub word_count: usize,
}

/// A reflection rejected before scoring. Still measured, so the record and
/// the decision carry the real word count.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RejectedReflection {
    pub text: String,
    pub word_count: usize,
    pub error: InputError,
}

/// Normalize and measure raw reflection text.
pub fn validate(raw: &str, max_chars: usize) -> Result<ValidatedReflection, RejectedReflection> {
    let text = normalize(raw);
    let word_count = count_words(&text);

    let reject = |error: InputError| RejectedReflection {
        text: text.clone(),
        word_count,
        error,
    };

    if word_count == 0 {
        return Err(reject(InputError::Empty));
    }

    let chars = text.chars().count();
    if chars > max_chars {
        return Err(reject(InputError::TooLong {
            chars,
            limit: max_chars,
        }));
    }

    let lowered = text.to_lowercase();
    if let Some(marker) = UNSAFE_MARKUP.iter().find(|m| lowered.contains(**m)) {
        return Err(reject(InputError::UnsafeMarkup((*marker).to_string())));
    }

    Ok(ValidatedReflection { text, word_count })
}

/// Strip control and zero-width characters (keeping ordinary whitespace) and trim.
pub fn normalize(raw: &str) -> String {
    raw.chars()
        .filter(|c| !(c.is_control() && !c.is_whitespace()))
        .filter(|c| !matches!(*c, '\u{200B}'..='\u{200D}' | '\u{FEFF}'))
        .collect::<String>()
        .trim()
        .to_string()
}

/// Whitespace-separated, non-empty tokens.
pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

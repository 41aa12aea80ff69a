use thiserror::Error;

/// Top-level error type for reflection gate operations.
///
/// None of these reach a student as a failure: input errors become denials,
/// provider errors become fallbacks, boundary violations become substituted
/// questions. They exist so each path is logged and counted by kind.
#[derive(Debug, Error)]
pub enum GateError {
    // --- Caller input ---
    #[error("Input error: {0}")]
    Input(#[from] InputError),

    // --- Provider errors (gate degrades to local heuristics) ---
    #[error("Provider timed out: {0}")]
    ProviderTimeout(String),

    #[error("Provider error: {0}")]
    Provider(String),

    // --- Output integrity ---
    #[error("Boundary violation: {0}")]
    Boundary(String),

    // --- Operational errors ---
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl GateError {
    /// Short stable label used as a metrics/log field.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Input(_) => "input",
            Self::ProviderTimeout(_) => "provider_timeout",
            Self::Provider(_) => "provider",
            Self::Boundary(_) => "boundary",
            Self::Config(_) => "config",
            Self::Serialization(_) => "serialization",
        }
    }
}

/// Reasons a submitted reflection is rejected before scoring.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("reflection is empty")]
    Empty,

    #[error("reflection is {chars} characters, limit is {limit}")]
    TooLong { chars: usize, limit: usize },

    #[error("reflection contains disallowed markup: {0}")]
    UnsafeMarkup(String),
}

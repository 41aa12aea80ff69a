mod loader;
mod validation;

pub use loader::{
    load_config, ConfigError, EngineConfig, REFLECTION_ASSESSMENT_PROMPT, SOCRATIC_SYSTEM_PROMPT,
};
pub use validation::validate;

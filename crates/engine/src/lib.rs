pub mod analytics;
pub mod boundary;
pub mod config;
pub mod controller;
pub mod gate;
pub mod llm;
pub mod provider;
pub mod scorer;
pub mod socratic;
pub mod validator;

pub mod api;
pub mod config;
pub mod error;
pub mod ids;
pub mod types;

pub use error::{GateError, InputError};
pub use ids::*;

//! External API integrations

pub mod gemini;
pub mod oracle;

pub use gemini::{GeminiClient, GeminiOracle};
pub use oracle::{resolve_model, ModelProbe, OracleError, TextOracle};

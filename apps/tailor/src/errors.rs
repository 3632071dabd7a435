use thiserror::Error;

use crate::ingest::IngestError;
use crate::llm_client::LlmError;
use crate::rules::RuleError;

/// Application-level error type. The CLI maps every variant to a non-zero
/// exit code with the message printed through the error chain.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Ingest error: {0}")]
    Ingest(#[from] IngestError),

    #[error("Rule table error: {0}")]
    Rules(#[from] RuleError),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Document rejected by validation: {0}")]
    Rejected(String),

    #[error("Refusing to overwrite existing file: {0}")]
    WouldOverwrite(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

//! bom-ai: text-generation plumbing for document extraction and
//! natural-language optimization.
//!
//! Contains:
//! - token (bearer-token cache and issuers)
//! - client (the [`TextGenerator`] seam and its HTTP implementation)
//! - extract (chunking, extraction prompt, response parsing)
//! - intent (optimization intent parsing with keyword fallback)

pub mod client;
pub mod extract;
pub mod intent;
pub mod token;

pub use client::{CompletionSettings, HttpCompletionClient, TextGenerator};
pub use extract::{
    ExtractedRequirement, build_extraction_prompt, chunk_text, extraction_text,
    parse_requirements,
};
pub use intent::{keyword_intent, parse_intent};
pub use token::{
    FileTokenIssuer, IssuedToken, StaticTokenIssuer, TokenCache, TokenIssuer, TokenState,
};

pub type AiResult<T> = Result<T, AiError>;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum AiError {
    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Transport error ({kind}): {detail}")]
    Transport { kind: &'static str, detail: String },

    #[error("HTTP status {status}")]
    Http { status: u16 },

    #[error("Unparseable response: {0}")]
    Parse(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

//! Streaming OpenAI chat-completion client with token accounting and
//! context-tier selection

pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod tokens;

pub use client::{ChatMessage, OpenAiClient, Role, StreamEvent};
pub use config::OpenAiConfig;
pub use error::{OpenAiError, Result};
pub use models::{ModelTier, TierTable};
pub use tokens::estimate_chat_tokens;

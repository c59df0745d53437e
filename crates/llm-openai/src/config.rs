use relay_std::env::ReadEnv;

use crate::models::TierTable;

/// Default chat-completions endpoint.
pub const DEFAULT_API_URL: &str = "https://api.openai.com/v1/chat/completions";

#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    /// OpenAI API key (`OPENAI_API_KEY`).
    pub api_key: String,
    /// Chat-completions endpoint. Env: `OPENAI_API_URL`.
    /// Default: [`DEFAULT_API_URL`].
    pub api_url: String,
    /// Model family served by [`OpenAiConfig::tier_table`], either
    /// `"gpt-4"` or `"gpt-3.5-turbo"`.
    /// Env: `OPENAI_MODEL_FAMILY`. Default: `"gpt-4"`.
    pub model_family: String,
    /// Whether the family's extended-context tier may be selected.
    /// Env: `OPENAI_USE_EXTENDED_MODEL`. Default: `false`.
    pub use_extended_model: bool,
}

impl OpenAiConfig {
    pub fn from_env<E: ReadEnv>(env: &E) -> Self {
        let api_key = env
            .var("OPENAI_API_KEY")
            .expect("OPENAI_API_KEY is required");

        let api_url = env
            .var("OPENAI_API_URL")
            .unwrap_or_else(|_| DEFAULT_API_URL.to_string());

        let model_family = env
            .var("OPENAI_MODEL_FAMILY")
            .unwrap_or_else(|_| "gpt-4".to_string());

        let use_extended_model = env
            .var("OPENAI_USE_EXTENDED_MODEL")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(false);

        Self {
            api_key,
            api_url,
            model_family,
            use_extended_model,
        }
    }

    /// Tier table for the configured model family. Unknown family names
    /// fall back to the GPT-4 table.
    pub fn tier_table(&self) -> TierTable {
        match self.model_family.as_str() {
            "gpt-3.5-turbo" => TierTable::gpt_35(self.use_extended_model),
            _ => TierTable::gpt_4(self.use_extended_model),
        }
    }
}

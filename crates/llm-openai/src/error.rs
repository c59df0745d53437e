//! Error types for the OpenAI integration.

use thiserror::Error;

/// Convenience alias used throughout this crate.
pub type Result<T> = std::result::Result<T, OpenAiError>;

/// Errors surfaced by the client, the token estimator, and the tier tables.
#[derive(Debug, Error)]
pub enum OpenAiError {
    /// Token accounting has no published overhead constants for this model.
    #[error("Token accounting is not implemented for model: {0}")]
    UnsupportedModel(String),

    /// Transport-level failure talking to the API.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("OpenAI API error {status}: {body}")]
    Api { status: u16, body: String },

    /// The response stream ended abnormally.
    #[error("Stream read error: {0}")]
    Stream(String),

    /// Request serialization failed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_model_display_names_the_model() {
        let err = OpenAiError::UnsupportedModel("text-davinci-003".to_string());
        assert_eq!(
            err.to_string(),
            "Token accounting is not implemented for model: text-davinci-003"
        );
    }

    #[test]
    fn api_error_display_includes_status_and_body() {
        let err = OpenAiError::Api {
            status: 429,
            body: "rate limited".to_string(),
        };
        assert_eq!(err.to_string(), "OpenAI API error 429: rate limited");
    }

    #[test]
    fn stream_error_display() {
        let err = OpenAiError::Stream("connection reset".to_string());
        assert_eq!(err.to_string(), "Stream read error: connection reset");
    }
}

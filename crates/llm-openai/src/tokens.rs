//! Token accounting for chat-completion requests.
//!
//! Mirrors the API's documented billing rules: a fixed per-message
//! overhead, the encoded lengths of role and content, a per-name
//! adjustment, and a fixed priming cost for the reply. Counting happens
//! before a request is sent so the context budget can be sized.

use std::sync::OnceLock;

use tiktoken_rs::CoreBPE;
use tiktoken_rs::cl100k_base;
use tiktoken_rs::tokenizer::get_tokenizer;

use crate::client::ChatMessage;
use crate::error::{OpenAiError, Result};

/// Every reply is primed with `<|start|>assistant<|message|>`.
const REPLY_PRIMING_TOKENS: i64 = 3;

fn cl100k() -> &'static CoreBPE {
    static BPE: OnceLock<CoreBPE> = OnceLock::new();
    BPE.get_or_init(|| cl100k_base().expect("Failed to load cl100k_base tokenizer"))
}

/// All supported chat families use the `cl100k_base` vocabulary; ids
/// missing from the tokenizer registry fall back to it with a warning.
fn encoder_for(model: &str) -> &'static CoreBPE {
    if get_tokenizer(model).is_none() {
        tracing::warn!(
            model,
            "model not found in tokenizer registry, using cl100k_base encoding"
        );
    }
    cl100k()
}

fn encoded_len(bpe: &CoreBPE, text: &str) -> i64 {
    bpe.encode_with_special_tokens(text).len() as i64
}

/// Estimate the tokens the completion API will bill for `messages`.
///
/// Moving aliases are pinned to the snapshots their overhead constants
/// were published for: `gpt-3.5-turbo` and `gpt-3.5-turbo-16k` count as
/// `gpt-3.5-turbo-0301`, `gpt-4` counts as `gpt-4-0314`. Models without
/// published constants are an error rather than a guess.
pub fn estimate_chat_tokens(messages: &[ChatMessage], model: &str) -> Result<i64> {
    let model = match model {
        "gpt-3.5-turbo" | "gpt-3.5-turbo-16k" => "gpt-3.5-turbo-0301",
        "gpt-4" => "gpt-4-0314",
        other => other,
    };

    // Every message follows <|start|>{role/name}\n{content}<|end|>\n.
    // A name replaces the role, hence the negative adjustment on 0301.
    let (tokens_per_message, tokens_per_name): (i64, i64) = match model {
        "gpt-3.5-turbo-0301" => (4, -1),
        "gpt-4-0314" => (3, 1),
        other => return Err(OpenAiError::UnsupportedModel(other.to_string())),
    };

    let bpe = encoder_for(model);
    let mut num_tokens: i64 = 0;
    for message in messages {
        num_tokens += tokens_per_message;
        num_tokens += encoded_len(bpe, message.role.as_str());
        num_tokens += encoded_len(bpe, &message.content);
        if let Some(name) = &message.name {
            num_tokens += encoded_len(bpe, name);
            num_tokens += tokens_per_name;
        }
    }
    num_tokens += REPLY_PRIMING_TOKENS;

    Ok(num_tokens.max(0))
}

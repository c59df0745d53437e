use llm_openai::{ChatMessage, Role};

use crate::augment::augment_user_message;
use crate::urls::extract_url_list;

/// Fixed instruction prepended to every conversation sent to the model.
pub const SYSTEM_PROMPT: &str = "\nYou are an AI assistant. \nYou will answer the question as truthfully as possible.\nIf you're unsure of the answer, say Sorry, I don't know.\n";

/// One message of a Slack thread, oldest first.
#[derive(Debug, Clone)]
pub struct ThreadReply {
    /// Author user id; absent for messages posted by apps without a user.
    pub user: Option<String>,
    pub text: String,
}

/// Flatten a thread's replies into the role-tagged conversation the
/// completion API expects.
///
/// The final reply is dropped: the caller posts its acknowledgement
/// before fetching the thread, so the last entry belongs to the exchange
/// being answered, not to history. Replies from the bot come back as
/// assistant turns. Replies from anyone else are user turns, have any
/// linked page content inlined, and are kept only when they addressed the
/// bot; side conversation in the thread stays out of the model's context.
pub async fn build_chat_history(
    replies: &[ThreadReply],
    bot_user_id: &str,
    http_client: &reqwest::Client,
) -> Vec<ChatMessage> {
    let mut messages = vec![ChatMessage::new(Role::System, SYSTEM_PROMPT)];

    let history = &replies[..replies.len().saturating_sub(1)];
    for reply in history {
        let role = if reply.user.as_deref() == Some(bot_user_id) {
            Role::Assistant
        } else {
            Role::User
        };
        let mut text = reply.text.clone();
        if role == Role::User {
            if let Some(urls) = extract_url_list(&text) {
                text = augment_user_message(http_client, &text, &urls).await;
            }
        }
        if let Some(cleaned) = clean_reply_text(&text, role, bot_user_id) {
            messages.push(ChatMessage::new(role, cleaned));
        }
    }
    messages
}

/// Strip the bot-mention token and decide whether the message belongs in
/// the model's context. Assistant turns always stay; user turns stay only
/// when the text addressed the bot. Turns that clean down to nothing are
/// omitted rather than sent as empty content.
fn clean_reply_text(text: &str, role: Role, bot_user_id: &str) -> Option<String> {
    let mention = format!("<@{bot_user_id}>");
    if role == Role::Assistant || text.contains(&mention) {
        let cleaned = text.replace(&mention, "").trim().to_string();
        if cleaned.is_empty() { None } else { Some(cleaned) }
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const BOT: &str = "U0BOT";

    fn from_user(text: &str) -> ThreadReply {
        ThreadReply {
            user: Some("U0HUMAN".to_string()),
            text: text.to_string(),
        }
    }

    fn from_bot(text: &str) -> ThreadReply {
        ThreadReply {
            user: Some(BOT.to_string()),
            text: text.to_string(),
        }
    }

    fn trigger() -> ThreadReply {
        from_user("<@U0BOT> and one more thing")
    }

    #[tokio::test]
    async fn conversation_starts_with_the_system_prompt() {
        let client = reqwest::Client::new();
        let messages = build_chat_history(&[trigger()], BOT, &client).await;
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, Role::System);
        assert_eq!(messages[0].content, SYSTEM_PROMPT);
    }

    #[tokio::test]
    async fn empty_thread_yields_only_the_system_prompt() {
        let client = reqwest::Client::new();
        let messages = build_chat_history(&[], BOT, &client).await;
        assert_eq!(messages.len(), 1);
    }

    #[tokio::test]
    async fn final_reply_is_excluded() {
        let client = reqwest::Client::new();
        let replies = [from_user("<@U0BOT> first question"), trigger()];
        let messages = build_chat_history(&replies, BOT, &client).await;
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1].content, "first question");
    }

    #[tokio::test]
    async fn bot_replies_become_assistant_turns() {
        let client = reqwest::Client::new();
        let replies = [
            from_user("<@U0BOT> what is rust?"),
            from_bot("A systems programming language."),
            trigger(),
        ];
        let messages = build_chat_history(&replies, BOT, &client).await;
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[1].role, Role::User);
        assert_eq!(messages[2].role, Role::Assistant);
        assert_eq!(messages[2].content, "A systems programming language.");
    }

    #[tokio::test]
    async fn user_turns_not_addressed_to_the_bot_are_dropped() {
        let client = reqwest::Client::new();
        let replies = [
            from_user("side chatter between humans"),
            from_user("<@U0BOT> actual question"),
            trigger(),
        ];
        let messages = build_chat_history(&replies, BOT, &client).await;
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1].content, "actual question");
    }

    #[tokio::test]
    async fn mention_token_is_stripped_and_text_trimmed() {
        let client = reqwest::Client::new();
        let replies = [from_user("  <@U0BOT>   hello there  "), trigger()];
        let messages = build_chat_history(&replies, BOT, &client).await;
        assert_eq!(messages[1].content, "hello there");
    }

    #[tokio::test]
    async fn turns_that_clean_to_nothing_are_omitted() {
        let client = reqwest::Client::new();
        let replies = [from_user("<@U0BOT>   "), trigger()];
        let messages = build_chat_history(&replies, BOT, &client).await;
        assert_eq!(messages.len(), 1);
    }

    #[tokio::test]
    async fn authorless_replies_are_user_turns() {
        let client = reqwest::Client::new();
        let replies = [
            ThreadReply {
                user: None,
                text: "<@U0BOT> posted by an app".to_string(),
            },
            trigger(),
        ];
        let messages = build_chat_history(&replies, BOT, &client).await;
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1].role, Role::User);
    }

    #[tokio::test]
    async fn linked_pages_are_inlined_for_user_turns() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/doc"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string("<p>Quarterly numbers.</p>"),
            )
            .mount(&server)
            .await;

        let url = format!("{}/doc", server.uri());
        let client = reqwest::Client::new();
        let replies = [
            from_user(&format!("<@U0BOT> summarize <{url}>")),
            trigger(),
        ];
        let messages = build_chat_history(&replies, BOT, &client).await;

        assert_eq!(messages.len(), 2);
        assert!(messages[1].content.starts_with("summarize"));
        assert!(!messages[1].content.contains(&format!("<{url}>")));
        assert!(
            messages[1]
                .content
                .contains(&format!("Contents of {url} : \n \"\"\" Quarterly numbers. \"\"\""))
        );
    }

    #[tokio::test]
    async fn bot_turns_are_not_augmented() {
        // An assistant reply that quotes a link must not trigger a fetch;
        // pointing at a dead address proves no request is attempted.
        let client = reqwest::Client::new();
        let replies = [
            from_bot("see <http://127.0.0.1:1/never-fetched>"),
            trigger(),
        ];
        let messages = build_chat_history(&replies, BOT, &client).await;
        assert_eq!(messages[1].content, "see <http://127.0.0.1:1/never-fetched>");
    }
}

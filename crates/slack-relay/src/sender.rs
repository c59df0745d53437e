use std::sync::Arc;

use slack_morphism::prelude::*;

use crate::history::ThreadReply;

/// Read-only snapshot of the requesting user. Absent profile fields
/// degrade to empty strings; each absence is logged, not fatal.
#[derive(Debug, Clone, Default)]
pub struct UserSnapshot {
    pub id: String,
    pub username: String,
    pub display_name: String,
    pub real_name: String,
    pub email: String,
}

/// Thin wrapper over the Slack Web API calls the relay makes.
#[derive(Clone)]
pub struct RelaySender {
    client: Arc<SlackHyperClient>,
    token: SlackApiToken,
}

impl RelaySender {
    pub fn new(client: Arc<SlackHyperClient>, bot_token: String) -> Self {
        Self {
            client,
            token: SlackApiToken::new(bot_token.into()),
        }
    }

    /// Identity of the bot user this token belongs to, as seen in mention
    /// tokens and reply author ids.
    pub async fn resolve_bot_user_id(
        &self,
    ) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
        let session = self.client.open_session(&self.token);
        let resp = session.auth_test().await?;
        Ok(resp.user_id.0)
    }

    /// Snapshot the requesting user's profile.
    pub async fn fetch_user(
        &self,
        user_id: &str,
    ) -> Result<UserSnapshot, Box<dyn std::error::Error + Send + Sync>> {
        let session = self.client.open_session(&self.token);
        let resp = session
            .users_info(&SlackApiUsersInfoRequest::new(user_id.to_string().into()))
            .await?;

        let user = resp.user;
        let profile = user.profile;
        Ok(UserSnapshot {
            id: user_id.to_string(),
            username: field_or_warn(user.name, user_id, "name"),
            display_name: field_or_warn(
                profile.as_ref().and_then(|p| p.display_name.clone()),
                user_id,
                "display_name",
            ),
            real_name: field_or_warn(
                profile.as_ref().and_then(|p| p.real_name.clone()),
                user_id,
                "real_name",
            ),
            email: field_or_warn(
                profile
                    .as_ref()
                    .and_then(|p| p.email.as_ref().map(|e| e.0.clone())),
                user_id,
                "email",
            ),
        })
    }

    /// Post `text` as a reply in the given thread; returns the new
    /// message's timestamp, the handle for later in-place updates.
    pub async fn post_in_thread(
        &self,
        channel: &str,
        thread_ts: &str,
        text: &str,
    ) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
        let session = self.client.open_session(&self.token);
        let req = SlackApiChatPostMessageRequest::new(
            channel.to_string().into(),
            SlackMessageContent::new().with_text(text.to_string()),
        )
        .with_thread_ts(thread_ts.to_string().into());
        let resp = session.chat_post_message(&req).await?;
        Ok(resp.ts.0)
    }

    /// Replace the displayed text of an existing message.
    pub async fn update_message(
        &self,
        channel: &str,
        ts: &str,
        text: &str,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let session = self.client.open_session(&self.token);
        let req = SlackApiChatUpdateRequest::new(
            channel.to_string().into(),
            SlackMessageContent::new().with_text(text.to_string()),
            ts.to_string().into(),
        );
        session.chat_update(&req).await?;
        Ok(())
    }

    /// Fetch a thread's messages oldest first, the thread-starting message
    /// included.
    pub async fn fetch_thread_replies(
        &self,
        channel: &str,
        thread_ts: &str,
    ) -> Result<Vec<ThreadReply>, Box<dyn std::error::Error + Send + Sync>> {
        let session = self.client.open_session(&self.token);
        let req = SlackApiConversationsRepliesRequest::new(
            channel.to_string().into(),
            thread_ts.to_string().into(),
        );
        let resp = session.conversations_replies(&req).await?;
        Ok(resp
            .messages
            .into_iter()
            .map(|m| ThreadReply {
                user: m.sender.user.map(|u| u.0),
                text: m.content.text.unwrap_or_default(),
            })
            .collect())
    }
}

fn field_or_warn(value: Option<String>, user_id: &str, field: &'static str) -> String {
    match value {
        Some(v) => v,
        None => {
            tracing::warn!(user_id, missing_field = field, "Slack_Warning");
            String::new()
        }
    }
}

use std::sync::Arc;

use slack_morphism::prelude::*;

use crate::handler::{MentionEvent, RelayContext, handle_mention};

/// State every Socket Mode callback receives through `with_user_state`.
#[derive(Clone)]
pub struct BotState {
    pub ctx: Arc<RelayContext>,
}

pub async fn handle_push_event(
    event: SlackPushEventCallback,
    _client: Arc<SlackHyperClient>,
    states: SlackClientEventsUserState,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let state = {
        let states = states.read().await;
        states
            .get_user_state::<BotState>()
            .expect("BotState must be in user state")
            .clone()
    };

    match event.event {
        SlackEventCallbackBody::AppMention(mention) => {
            let mention_event = MentionEvent {
                channel: mention.channel.0.clone(),
                user: mention.user.0.clone(),
                ts: mention.origin.ts.0.clone(),
                thread_ts: mention.origin.thread_ts.as_ref().map(|t| t.0.clone()),
            };
            // Answer the mention on its own task so a slow request does not
            // hold up acknowledgement of later events.
            tokio::spawn(handle_mention(mention_event, state.ctx.clone()));
        }
        _ => {
            tracing::debug!("Ignoring unhandled push event type");
        }
    }

    Ok(())
}

pub fn error_handler(
    err: Box<dyn std::error::Error + Send + Sync>,
    _client: Arc<SlackHyperClient>,
    _states: SlackClientEventsUserState,
) -> HttpStatusCode {
    tracing::error!(error = %err, "Slack socket mode error");
    HttpStatusCode::OK
}

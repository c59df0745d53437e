use std::sync::Arc;

use llm_openai::{OpenAiClient, TierTable, estimate_chat_tokens};

use crate::history::build_chat_history;
use crate::relay::relay_stream;
use crate::sender::{RelaySender, UserSnapshot};

// ── Shared state ──────────────────────────────────────────────────────

/// Everything a mention invocation needs, shared across both transports.
#[derive(Clone)]
pub struct RelayContext {
    pub sender: RelaySender,
    pub openai: OpenAiClient,
    pub tier_table: TierTable,
    pub bot_user_id: String,
    pub flush_every: usize,
    pub http_client: reqwest::Client,
}

/// The slice of an `app_mention` event the pipeline consumes. Both the
/// Socket Mode listener and the HTTP webhook produce this shape.
#[derive(Debug, Clone)]
pub struct MentionEvent {
    pub channel: String,
    pub user: String,
    pub ts: String,
    pub thread_ts: Option<String>,
}

/// Fields of the final structured record, filled in as the pipeline
/// resolves them. Whatever is still unresolved when an error reaches the
/// top-level catch is logged as absent.
#[derive(Debug, Default)]
struct RequestTrace {
    channel_id: String,
    thread_ts: String,
    model: Option<String>,
    conversation_tokens: Option<i64>,
    max_response_tokens: Option<i64>,
    username: Option<String>,
    real_name: Option<String>,
    email: Option<String>,
    request: Option<String>,
}

// ── Pipeline ──────────────────────────────────────────────────────────

/// Handle one `app_mention` event end to end.
///
/// Any pipeline error is caught here: it becomes an `Exception` record
/// carrying whatever request context had been resolved, plus a best-effort
/// error notice posted back into the thread.
pub async fn handle_mention(event: MentionEvent, ctx: Arc<RelayContext>) {
    tracing::debug!(
        channel = %event.channel,
        user = %event.user,
        ts = %event.ts,
        thread_ts = ?event.thread_ts,
        "Arguments"
    );

    let thread_ts = resolve_thread_ts(&event);
    let mut trace = RequestTrace {
        channel_id: event.channel.clone(),
        thread_ts: thread_ts.clone(),
        ..Default::default()
    };

    if let Err(e) = run_mention_pipeline(&event, &thread_ts, &ctx, &mut trace).await {
        tracing::error!(
            model_used = trace.model.as_deref(),
            token_used_count = trace.conversation_tokens,
            max_response_tokens = trace.max_response_tokens,
            channel_id = %trace.channel_id,
            thread_ts = %trace.thread_ts,
            user = trace.username.as_deref(),
            real_name = trace.real_name.as_deref(),
            email = trace.email.as_deref(),
            request = trace.request.as_deref(),
            exception = %e,
            "Exception"
        );
        if let Err(post_err) = ctx
            .sender
            .post_in_thread(&trace.channel_id, &trace.thread_ts, &error_notice(&e))
            .await
        {
            tracing::error!(error = %post_err, "Failed to post error notice to thread");
        }
    }
}

async fn run_mention_pipeline(
    event: &MentionEvent,
    thread_ts: &str,
    ctx: &Arc<RelayContext>,
    trace: &mut RequestTrace,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing::debug!(
        milestone = "Fetching user information from slack",
        user_id = %event.user,
        "Milestone"
    );
    let user = ctx.sender.fetch_user(&event.user).await?;
    trace.username = Some(user.username.clone());
    trace.real_name = Some(user.real_name.clone());
    trace.email = Some(user.email.clone());

    let reply_ts = ctx
        .sender
        .post_in_thread(&event.channel, thread_ts, &wait_message(&user))
        .await?;

    tracing::debug!(
        milestone = "Fetching conversation history from slack",
        email = %user.email,
        channel = %event.channel,
        thread_ts = %thread_ts,
        "Milestone"
    );
    let replies = ctx
        .sender
        .fetch_thread_replies(&event.channel, thread_ts)
        .await?;

    tracing::debug!(
        milestone = "Processing conversation history from slack",
        email = %user.email,
        channel = %event.channel,
        thread_ts = %thread_ts,
        "Milestone"
    );
    let messages = build_chat_history(&replies, &ctx.bot_user_id, &ctx.http_client).await;
    trace.request = messages.last().map(|m| m.content.clone());

    tracing::debug!(
        milestone = "Counting tokens",
        message_count = messages.len(),
        "Milestone"
    );
    let conversation_tokens = estimate_chat_tokens(&messages, &ctx.tier_table.base.model_id)?;
    trace.conversation_tokens = Some(conversation_tokens);

    tracing::debug!(
        milestone = "Determining OpenAI model to use",
        num_conversation_tokens = conversation_tokens,
        "Milestone"
    );
    let tier = ctx.tier_table.select(conversation_tokens);
    trace.model = Some(tier.model_id.clone());

    // A budget at or below zero is forwarded as-is; the API's rejection
    // becomes this request's error path.
    let max_response_tokens = tier.max_context_tokens - conversation_tokens;
    trace.max_response_tokens = Some(max_response_tokens);

    tracing::debug!(
        milestone = "Forwarding request to OpenAI",
        model_used = %tier.model_id,
        token_count = tier.max_context_tokens,
        token_used_count = conversation_tokens,
        email = %user.email,
        request = trace.request.as_deref(),
        "Milestone"
    );
    let (rx, stream_task) = ctx
        .openai
        .stream_chat_completion(&tier.model_id, &messages, max_response_tokens)
        .await?;

    let response = relay_stream(rx, ctx.flush_every, |text| {
        let sender = ctx.sender.clone();
        let channel = event.channel.clone();
        let reply_ts = reply_ts.clone();
        async move { sender.update_message(&channel, &reply_ts, &text).await }
    })
    .await?;

    // Surface stream-read failures even when the channel closed early.
    stream_task.await??;

    tracing::info!(
        model_used = %tier.model_id,
        token_used_count = conversation_tokens,
        max_response_tokens = max_response_tokens,
        channel_id = %event.channel,
        thread_ts = %thread_ts,
        user = %user.username,
        real_name = %user.real_name,
        email = %user.email,
        request = trace.request.as_deref(),
        response = %response,
        "RequestResponse"
    );

    Ok(())
}

// ── Helpers ───────────────────────────────────────────────────────────

/// A fresh top-level mention starts its own thread.
fn resolve_thread_ts(event: &MentionEvent) -> String {
    event
        .thread_ts
        .clone()
        .unwrap_or_else(|| event.ts.clone())
}

/// First whitespace-separated token of the display name. Users who never
/// set a display name yield an empty fragment rather than an error.
fn first_name(display_name: &str) -> &str {
    display_name.split_whitespace().next().unwrap_or("")
}

fn wait_message(user: &UserSnapshot) -> String {
    format!(
        "Hi {}! I got your request, please wait while I ask the wizard...",
        first_name(&user.display_name)
    )
}

fn error_notice(error: &(impl std::fmt::Display + ?Sized)) -> String {
    format!("Sorry, I can't provide a response. Encountered an error:\n`\n{error}\n`")
}

use axum::{
    Router,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::post,
};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::handler::{MentionEvent, RelayContext, handle_mention};

type HmacSha256 = Hmac<Sha256>;

#[derive(Clone)]
struct WebhookState {
    signing_secret: Option<String>,
    ctx: Arc<RelayContext>,
}

/// Start the Slack Events API HTTP webhook server.
///
/// This is the alternative to Socket Mode for deployments that can expose an
/// inbound HTTPS endpoint. Configure Slack to POST events to
/// `http://<host>:<port><path>`. Set `SLACK_SIGNING_SECRET` to enable request
/// signature verification.
pub async fn start_webhook_server(
    port: u16,
    path: String,
    signing_secret: Option<String>,
    ctx: Arc<RelayContext>,
) {
    let state = WebhookState { signing_secret, ctx };
    let app = Router::new()
        .route(&path, post(handle_events))
        .with_state(state);

    let addr = format!("0.0.0.0:{port}");
    let listener = match TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!(error = %e, addr = %addr, "Failed to bind webhook server");
            return;
        }
    };
    tracing::info!(port, "Slack Events webhook server listening");
    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!(error = %e, "Webhook server exited with error");
    }
}

async fn handle_events(
    State(state): State<WebhookState>,
    headers: HeaderMap,
    body: axum::body::Bytes,
) -> impl IntoResponse {
    // Verify Slack request signature when signing secret is configured.
    if let Some(ref secret) = state.signing_secret {
        let timestamp = headers
            .get("X-Slack-Request-Timestamp")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");
        let sig_header = headers
            .get("X-Slack-Signature")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");

        let expected =
            compute_signature(secret, timestamp, std::str::from_utf8(&body).unwrap_or(""));
        if expected != sig_header {
            tracing::warn!("Rejected webhook request: invalid Slack signature");
            return StatusCode::UNAUTHORIZED.into_response();
        }
    }

    let payload: serde_json::Value = match serde_json::from_slice(&body) {
        Ok(v) => v,
        Err(e) => {
            tracing::error!(error = %e, "Failed to parse webhook body as JSON");
            return StatusCode::BAD_REQUEST.into_response();
        }
    };

    // URL verification challenge (required when first configuring the endpoint).
    if payload["type"] == "url_verification" {
        let challenge = payload["challenge"].as_str().unwrap_or("").to_string();
        return axum::Json(serde_json::json!({ "challenge": challenge })).into_response();
    }

    // Process event callbacks.
    if payload["type"] == "event_callback" {
        let event = &payload["event"];
        if event["type"] == "app_mention" {
            let mention = mention_from_event(event);
            tracing::debug!(
                channel = %mention.channel,
                user = %mention.user,
                "Received app_mention via webhook"
            );
            // Slack retries deliveries that are not acknowledged within a few
            // seconds; answer on a separate task.
            tokio::spawn(handle_mention(mention, state.ctx.clone()));
        }
    }

    StatusCode::OK.into_response()
}

/// Slack request signature: `v0=` plus the hex HMAC-SHA256 of
/// `v0:{timestamp}:{body}` under the app's signing secret.
fn compute_signature(secret: &str, timestamp: &str, body: &str) -> String {
    let sig_base = format!("v0:{}:{}", timestamp, body);
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(sig_base.as_bytes());
    format!("v0={}", hex::encode(mac.finalize().into_bytes()))
}

fn mention_from_event(event: &serde_json::Value) -> MentionEvent {
    MentionEvent {
        channel: event["channel"].as_str().unwrap_or_default().to_string(),
        user: event["user"].as_str().unwrap_or_default().to_string(),
        ts: event["ts"].as_str().unwrap_or_default().to_string(),
        thread_ts: event["thread_ts"].as_str().map(str::to_string),
    }
}

mod augment;
mod config;
mod handler;
mod health;
mod history;
mod listener;
mod relay;
mod sender;
mod urls;
mod webhook;

use config::{BotMode, RelayConfig};
use handler::RelayContext;
use listener::{BotState, error_handler, handle_push_event};
use llm_openai::{OpenAiClient, OpenAiConfig};
use relay_std::env::SystemEnv;
use sender::RelaySender;
use slack_morphism::prelude::*;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = RelayConfig::from_env(&SystemEnv);
    let openai_config = OpenAiConfig::from_env(&SystemEnv);

    tracing::info!(port = config.health_port, "Starting health check server...");
    tokio::spawn(health::start_health_server(config.health_port));

    let slack_client = Arc::new(SlackClient::new(SlackClientHyperConnector::new()?));
    let sender = RelaySender::new(slack_client.clone(), config.bot_token.clone());

    tracing::info!("Resolving bot identity...");
    let bot_user_id = sender.resolve_bot_user_id().await?;
    tracing::info!(bot_user_id = %bot_user_id, "Authenticated with Slack");

    let ctx = Arc::new(RelayContext {
        sender,
        openai: OpenAiClient::from_config(&openai_config),
        tier_table: openai_config.tier_table(),
        bot_user_id,
        flush_every: config.flush_every,
        http_client: reqwest::Client::new(),
    });

    match config.mode {
        BotMode::Http => {
            tracing::info!(
                port = config.events_port,
                path = %config.http_path,
                "Starting Slack Events API webhook server..."
            );
            let webhook_handle = tokio::spawn(webhook::start_webhook_server(
                config.events_port,
                config.http_path.clone(),
                config.signing_secret.clone(),
                ctx.clone(),
            ));

            tracing::info!("Slack relay running. Press Ctrl+C to stop.");

            tokio::select! {
                res = webhook_handle => {
                    match res {
                        Ok(()) => tracing::warn!("Webhook server exited"),
                        Err(e) => tracing::error!(error = %e, "Webhook server panicked"),
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Received Ctrl+C, shutting down");
                }
            }
        }

        BotMode::Socket => {
            let app_token_value = config
                .app_token
                .clone()
                .expect("SLACK_APP_TOKEN must be set in socket mode");

            tracing::info!("Connecting to Slack via Socket Mode...");

            let bot_state = BotState { ctx: ctx.clone() };

            let socket_mode_callbacks =
                SlackSocketModeListenerCallbacks::new().with_push_events(handle_push_event);

            let listener_environment = Arc::new(
                SlackClientEventsListenerEnvironment::new(slack_client.clone())
                    .with_error_handler(error_handler)
                    .with_user_state(bot_state),
            );

            let socket_mode_listener = SlackClientSocketModeListener::new(
                &SlackClientSocketModeConfig::new(),
                listener_environment,
                socket_mode_callbacks,
            );

            let app_token: SlackApiToken = SlackApiToken::new(app_token_value.into());
            socket_mode_listener.listen_for(&app_token).await?;

            tracing::info!("Slack relay running. Press Ctrl+C to stop.");

            tokio::select! {
                _ = socket_mode_listener.serve() => {
                    tracing::warn!("Socket Mode listener exited");
                }
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Received Ctrl+C, shutting down");
                }
            }
        }
    }

    tracing::info!("Shutdown complete");

    Ok(())
}

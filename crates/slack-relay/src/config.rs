use relay_std::env::ReadEnv;

/// How the bot receives events from Slack.
#[derive(Debug, Clone, PartialEq)]
pub enum BotMode {
    /// Socket Mode (default): bot opens a WebSocket connection to Slack.
    /// Requires SLACK_APP_TOKEN (xapp-...).
    Socket,
    /// HTTP Events API: Slack POSTs events to our HTTP endpoint.
    /// Does not require SLACK_APP_TOKEN; uses SLACK_SIGNING_SECRET for verification.
    Http,
}

impl BotMode {
    pub fn from_str(s: &str) -> Self {
        match s {
            "http" => Self::Http,
            _ => Self::Socket,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Bot token (xoxb-...) used for all Web API calls.
    pub bot_token: String,
    /// App-level token (xapp-...) used to open the Socket Mode connection.
    pub app_token: Option<String>,
    /// Slack signing secret for verifying Events API webhook requests.
    /// When set, all webhook requests are signature-verified.
    pub signing_secret: Option<String>,
    /// Connection mode. Read from SLACK_MODE ("socket" or "http"). Default: socket.
    pub mode: BotMode,
    /// Port for the HTTP Events API webhook server. Default: 3000.
    pub events_port: u16,
    /// HTTP path for Events API webhook. Read from SLACK_HTTP_PATH. Default: "/slack/events".
    pub http_path: String,
    /// Port for the HTTP health check endpoint. Default: 8080.
    pub health_port: u16,
    /// How many streamed deltas accumulate before the in-progress Slack
    /// message is updated. Read from RELAY_FLUSH_EVERY. Default: 20.
    pub flush_every: usize,
}

impl RelayConfig {
    pub fn from_env<E: ReadEnv>(env: &E) -> Self {
        let bot_token = env
            .var("SLACK_BOT_TOKEN")
            .expect("SLACK_BOT_TOKEN must be set");
        let app_token = env.var("SLACK_APP_TOKEN").ok();
        let signing_secret = env.var("SLACK_SIGNING_SECRET").ok();
        let mode = env
            .var("SLACK_MODE")
            .map(|v| BotMode::from_str(&v))
            .unwrap_or(BotMode::Socket);
        let events_port = env
            .var("SLACK_EVENTS_PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(3000);
        let http_path = env
            .var("SLACK_HTTP_PATH")
            .unwrap_or_else(|_| "/slack/events".to_string());
        let health_port = env
            .var("HEALTH_PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(8080);
        let flush_every = env
            .var("RELAY_FLUSH_EVERY")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(20);

        Self {
            bot_token,
            app_token,
            signing_secret,
            mode,
            events_port,
            http_path,
            health_port,
            flush_every,
        }
    }
}

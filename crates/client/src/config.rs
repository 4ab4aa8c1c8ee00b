// crates/client/src/config.rs
//! Client configuration.

use std::time::Duration;

use crate::error::TransportError;

/// Default backend URL (the session server's default bind).
pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:8080";

/// Settings for the session channel and HTTP collaborators.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the session server, `http://` or `https://`.
    pub server_url: String,
    /// First reconnect delay; doubles per consecutive failure.
    pub backoff_base: Duration,
    /// Ceiling for the reconnect delay.
    pub backoff_cap: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            backoff_base: Duration::from_secs(1),
            backoff_cap: Duration::from_secs(16),
        }
    }
}

impl ClientConfig {
    pub fn new(server_url: impl Into<String>) -> Self {
        Self {
            server_url: server_url.into(),
            ..Self::default()
        }
    }

    /// WebSocket endpoint for one session: `ws(s)://host/ws/{session_id}`.
    pub fn ws_url(&self, session_id: &str) -> Result<String, TransportError> {
        let base = self.server_url.trim_end_matches('/');
        let ws_base = if let Some(rest) = base.strip_prefix("https://") {
            format!("wss://{rest}")
        } else if let Some(rest) = base.strip_prefix("http://") {
            format!("ws://{rest}")
        } else {
            return Err(TransportError::InvalidUrl {
                url: self.server_url.clone(),
            });
        };
        Ok(format!("{ws_base}/ws/{session_id}"))
    }
}

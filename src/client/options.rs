//! Client configuration

use crate::error::ConfigError;
use serde::Deserialize;
use std::time::Duration;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;

/// Connection configuration.
///
/// Immutable for the lifetime of the client; deserializable so a host
/// application can embed it in its own configuration file.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientOptions {
    /// WebSocket URL to connect to; may embed an access token as a query
    /// parameter
    pub url: String,

    /// Subprotocol sent as `Sec-WebSocket-Protocol`; may be empty
    #[serde(default)]
    pub subprotocol: String,

    /// Log full packet payloads instead of sizes; no behavioral effect
    #[serde(default)]
    pub debug_mode: bool,

    /// Timeout for opening the transport and completing the handshake
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    /// Interval between round-trip probes
    #[serde(default = "default_ping_interval_ms")]
    pub ping_interval_ms: u64,

    /// Consecutive unanswered probes tolerated before the client closes
    /// with code 3001; 0 keeps probes purely advisory
    #[serde(default = "default_ping_attempt_limit")]
    pub ping_attempt_limit: u32,
}

fn default_connect_timeout_ms() -> u64 {
    5000
}

fn default_ping_interval_ms() -> u64 {
    3000
}

fn default_ping_attempt_limit() -> u32 {
    5
}

impl ClientOptions {
    /// Create options for the given URL with default timing parameters
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            subprotocol: String::new(),
            debug_mode: false,
            connect_timeout_ms: default_connect_timeout_ms(),
            ping_interval_ms: default_ping_interval_ms(),
            ping_attempt_limit: default_ping_attempt_limit(),
        }
    }

    /// Validate the configuration.
    ///
    /// The URL must be non-empty and parse as a `ws://` or `wss://`
    /// client request.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.url.is_empty() {
            return Err(ConfigError::EmptyUrl);
        }
        if !self.url.starts_with("ws://") && !self.url.starts_with("wss://") {
            return Err(ConfigError::InvalidUrl {
                url: self.url.clone(),
                reason: "scheme must be ws or wss".to_string(),
            });
        }
        self.url
            .as_str()
            .into_client_request()
            .map_err(|e| ConfigError::InvalidUrl {
                url: self.url.clone(),
                reason: e.to_string(),
            })?;
        if self.ping_interval_ms == 0 {
            return Err(ConfigError::ZeroPingInterval);
        }
        Ok(())
    }

    /// Connect-and-handshake timeout as a `Duration`
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Probe interval as a `Duration`
    pub fn ping_interval(&self) -> Duration {
        Duration::from_millis(self.ping_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_defaults() {
        let options = ClientOptions::new("wss://example.com/ws");
        assert_eq!(options.connect_timeout_ms, 5000);
        assert_eq!(options.ping_interval_ms, 3000);
        assert_eq!(options.ping_attempt_limit, 5);
        assert!(!options.debug_mode);
        assert!(options.subprotocol.is_empty());
    }

    #[test]
    fn test_validate_accepts_ws_and_wss() {
        assert!(ClientOptions::new("ws://127.0.0.1:9000").validate().is_ok());
        assert!(ClientOptions::new("wss://example.com/ws?token=t0k3n")
            .validate()
            .is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_url() {
        let options = ClientOptions::new("");
        assert!(matches!(options.validate(), Err(ConfigError::EmptyUrl)));
    }

    #[test]
    fn test_validate_rejects_wrong_scheme() {
        let options = ClientOptions::new("https://example.com");
        assert!(matches!(
            options.validate(),
            Err(ConfigError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_zero_ping_interval() {
        let mut options = ClientOptions::new("ws://127.0.0.1:9000");
        options.ping_interval_ms = 0;
        assert!(matches!(
            options.validate(),
            Err(ConfigError::ZeroPingInterval)
        ));
    }
}

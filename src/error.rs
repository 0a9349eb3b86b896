//! Error taxonomy for the protocol client

use thiserror::Error;

/// Top-level client error
#[derive(Debug, Clone, Error)]
pub enum ClientError {
    /// Socket or network failure; always drives the connection down
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// Malformed inbound frame; the connection survives
    #[error(transparent)]
    Decode(#[from] DecodeError),
    /// Protocol violation; fatal for the connection
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
    /// API misuse; reported without any state change
    #[error(transparent)]
    Usage(#[from] UsageError),
}

/// Transport-level failures
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// Opening the socket failed
    #[error("Connection failed: {0}")]
    ConnectFailed(String),
    /// The connect attempt exceeded the configured timeout
    #[error("Connection timed out after {0} ms")]
    ConnectTimeout(u64),
    /// Writing a frame failed
    #[error("Send failed: {0}")]
    SendFailed(String),
    /// The socket failed while reading
    #[error("Socket error: {0}")]
    Socket(String),
}

/// Frame decoding failures; recoverable, a bad frame never ends the session
#[derive(Debug, Clone, Error)]
pub enum DecodeError {
    /// Frame shorter than the fixed header
    #[error("Frame truncated: {len} bytes is shorter than the {header}-byte header")]
    Truncated { len: usize, header: usize },
    /// Descriptor length field disagrees with the frame length
    #[error("Descriptor length {descriptor} exceeds remaining {remaining} bytes")]
    LengthMismatch { descriptor: usize, remaining: usize },
    /// The JSON descriptor does not parse
    #[error("Malformed JSON descriptor: {0}")]
    MalformedJson(String),
    /// Unrecognized frame discriminator
    #[error("Unknown frame type: {0}")]
    UnknownType(u8),
}

/// Protocol violations observed on an otherwise healthy transport
#[derive(Debug, Clone, Error)]
pub enum ProtocolError {
    /// The first frame was not a handshake verification frame
    #[error("Expected handshake verification frame, received a data packet")]
    HandshakeExpected,
    /// Handshake body is missing a required field
    #[error("Handshake response missing required field `{0}`")]
    HandshakeMissingField(&'static str),
    /// The handshake frame failed to decode
    #[error("Handshake frame invalid: {0}")]
    HandshakeInvalid(String),
    /// No handshake arrived within the connect timeout
    #[error("Handshake timed out after {0} ms")]
    HandshakeTimeout(u64),
    /// A second verification frame arrived after the session was established
    #[error("Duplicate handshake verification frame")]
    DuplicateHandshake,
}

/// API misuse errors
#[derive(Debug, Clone, Error)]
pub enum UsageError {
    /// `send` requires an established connection
    #[error("Not connected")]
    NotConnected,
    /// `connect` requires the disconnected state
    #[error("Already connected or connecting")]
    AlreadyConnected,
}

/// Configuration validation errors, raised at construction time
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// URL must be present
    #[error("WebSocket URL must not be empty")]
    EmptyUrl,
    /// URL must parse as a ws:// or wss:// endpoint
    #[error("Invalid WebSocket URL `{url}`: {reason}")]
    InvalidUrl { url: String, reason: String },
    /// Ping interval must be non-zero
    #[error("Ping interval must be greater than zero")]
    ZeroPingInterval,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ClientError::from(UsageError::NotConnected);
        assert_eq!(err.to_string(), "Not connected");

        let err = ClientError::from(DecodeError::UnknownType(7));
        assert_eq!(err.to_string(), "Unknown frame type: 7");

        let err = TransportError::ConnectFailed("refused".to_string());
        assert_eq!(err.to_string(), "Connection failed: refused");
    }

    #[test]
    fn test_taxonomy_conversions() {
        let err: ClientError = ProtocolError::DuplicateHandshake.into();
        assert!(matches!(err, ClientError::Protocol(_)));

        let err: ClientError = TransportError::Socket("reset".to_string()).into();
        assert!(matches!(err, ClientError::Transport(_)));
    }
}

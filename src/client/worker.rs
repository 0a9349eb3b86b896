//! Connection worker task
//!
//! Owns the socket for the lifetime of one connection attempt: opens the
//! transport, performs the handshake verification exchange, then drives a
//! select loop over the read half, the outbound command queue, and the
//! recurring round-trip probe. Transport I/O never runs on the caller's
//! context.

use super::options::ClientOptions;
use super::state::{ConnectionState, Shared};
use crate::codec::{self, describe_close_code, Frame, Packet};
use crate::error::{ClientError, ProtocolError, TransportError};
use crate::events::{ClientEvent, EventSender};
use crate::telemetry::{format_bytes, record_counter, record_rtt, CounterMetric};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::time::{interval_at, timeout, Instant, MissedTickBehavior};
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::header::{HeaderName, HeaderValue};
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use uuid::Uuid;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, Message>;
type WsSource = SplitStream<WsStream>;

/// Commands from the facade to the worker; the queue is the single writer
/// to the socket, so frames never interleave
#[derive(Debug)]
pub(crate) enum Command {
    /// Encode and write a packet
    Send(Packet),
    /// Begin the close handshake
    Disconnect { code: u16, reason: String },
}

/// Run one connection attempt to completion.
///
/// Emits exactly one `Connecting`, then either `Connected` followed
/// eventually by one `Disconnected`, or a terminal `Error` plus
/// `Disconnected` without ever reaching `Connected`.
pub(crate) async fn run(
    options: ClientOptions,
    shared: Arc<Shared>,
    events: EventSender,
    mut commands: mpsc::UnboundedReceiver<Command>,
) {
    if !events.emit(ClientEvent::Connecting).await {
        finish(&shared, &events, 1001, "", false).await;
        return;
    }

    // Race transport open + handshake against an early disconnect request
    let established = tokio::select! {
        res = establish(&options, &shared) => res,
        (code, reason) = next_disconnect(&mut commands) => {
            tracing::debug!(code, "Connect attempt aborted");
            finish(&shared, &events, code, &reason, true).await;
            return;
        }
    };

    let (stream, session_id, server_info) = match established {
        Ok(parts) => parts,
        Err(err) => {
            tracing::warn!(error = %err, "Connect attempt failed");
            let (code, reason) = close_info(&err);
            let emit_rest = events.emit(ClientEvent::Error(err)).await;
            finish(&shared, &events, code, reason, emit_rest).await;
            return;
        }
    };

    tracing::info!(session_id = %session_id, "Connected");
    if !events
        .emit(ClientEvent::Connected {
            session_id,
            server_info,
        })
        .await
    {
        finish(&shared, &events, 1001, "", false).await;
        return;
    }

    let (write, read) = stream.split();
    let (code, reason, emit_final) =
        connected_loop(&options, &shared, &events, &mut commands, write, read).await;
    finish(&shared, &events, code, &reason, emit_final).await;
}

/// Open the transport and complete the handshake verification exchange.
///
/// On success the session fields are recorded and the state is
/// `Connected`; the probe scheduler only starts after that.
async fn establish(
    options: &ClientOptions,
    shared: &Shared,
) -> Result<(WsStream, String, Value), ClientError> {
    let request = build_request(options, shared)?;

    let connect = timeout(options.connect_timeout(), connect_async(request));
    let (mut stream, _response) = match connect.await {
        Ok(Ok(ok)) => ok,
        Ok(Err(e)) => return Err(TransportError::ConnectFailed(e.to_string()).into()),
        Err(_) => return Err(TransportError::ConnectTimeout(options.connect_timeout_ms).into()),
    };

    tracing::debug!("Transport open, awaiting handshake verification");

    loop {
        let frame = match timeout(options.connect_timeout(), stream.next()).await {
            Ok(Some(Ok(frame))) => frame,
            Ok(Some(Err(e))) => return Err(TransportError::Socket(e.to_string()).into()),
            Ok(None) => {
                return Err(
                    TransportError::Socket("stream ended during handshake".to_string()).into(),
                )
            }
            Err(_) => {
                return Err(ProtocolError::HandshakeTimeout(options.connect_timeout_ms).into())
            }
        };

        match frame {
            Message::Binary(data) => match codec::decode(&data) {
                Ok(Frame::Handshake(body)) => {
                    let (client_id, session_id, info) = handshake_fields(&body)?;
                    shared.record_handshake(client_id, session_id.clone(), info.clone());
                    shared.set_state(ConnectionState::Connected);
                    return Ok((stream, session_id, info));
                }
                // The server must verify the session before any data flows
                Ok(Frame::Packet(_)) => return Err(ProtocolError::HandshakeExpected.into()),
                Err(e) => return Err(ProtocolError::HandshakeInvalid(e.to_string()).into()),
            },
            Message::Ping(data) => {
                stream
                    .send(Message::Pong(data))
                    .await
                    .map_err(|e| TransportError::SendFailed(e.to_string()))?;
            }
            Message::Close(frame) => {
                let detail = frame
                    .map(|f| format!("{} {}", u16::from(f.code), f.reason))
                    .unwrap_or_else(|| "no status".to_string());
                return Err(TransportError::Socket(format!(
                    "connection closed during handshake: {detail}"
                ))
                .into());
            }
            other => {
                tracing::debug!(?other, "Ignoring non-binary frame before handshake");
            }
        }
    }
}

/// The post-handshake select loop; returns the close code, reason, and
/// whether the final disconnection event should still be emitted.
async fn connected_loop(
    options: &ClientOptions,
    shared: &Shared,
    events: &EventSender,
    commands: &mut mpsc::UnboundedReceiver<Command>,
    mut write: WsSink,
    mut read: WsSource,
) -> (u16, String, bool) {
    // First probe one full interval after the handshake
    let mut probes = interval_at(
        Instant::now() + options.ping_interval(),
        options.ping_interval(),
    );
    probes.set_missed_tick_behavior(MissedTickBehavior::Skip);

    // Outstanding probe token and send time; only the matching pong
    // updates the measurement
    let mut awaiting: Option<(Uuid, Instant)> = None;
    let mut missed: u32 = 0;

    loop {
        tokio::select! {
            frame = read.next() => {
                match frame {
                    Some(Ok(Message::Binary(data))) => {
                        match codec::decode(&data) {
                            Ok(Frame::Packet(packet)) => {
                                log_packet("RECEIVED", &packet, options.debug_mode);
                                record_counter(CounterMetric::PacketsReceived);
                                if !events.emit(ClientEvent::PacketReceived(packet)).await {
                                    return close_quietly(shared, &mut write, 1001, "").await;
                                }
                            }
                            Ok(Frame::Handshake(_)) => {
                                let err = ClientError::from(ProtocolError::DuplicateHandshake);
                                let emit_rest = events.emit(ClientEvent::Error(err)).await;
                                let (code, reason, _) =
                                    close_quietly(shared, &mut write, 1002, "").await;
                                return (code, reason, emit_rest);
                            }
                            Err(e) => {
                                // A single bad frame never ends the session
                                tracing::warn!(error = %e, "Dropping undecodable frame");
                                record_counter(CounterMetric::DecodeFailures);
                                if !events.emit(ClientEvent::Error(e.into())).await {
                                    return close_quietly(shared, &mut write, 1001, "").await;
                                }
                            }
                        }
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if let Err(e) = write.send(Message::Pong(data)).await {
                            return socket_lost(shared, events,
                                TransportError::SendFailed(e.to_string())).await;
                        }
                    }
                    Some(Ok(Message::Pong(data))) => {
                        if let Some((token, sent_at)) = awaiting.take() {
                            if data.as_slice() == token.as_bytes() {
                                let rtt = sent_at.elapsed().as_millis() as u64;
                                shared.record_ping_rtt(rtt);
                                record_rtt(rtt);
                                missed = 0;
                                tracing::debug!(rtt_ms = rtt, "Probe round trip");
                                if !events.emit(ClientEvent::PingTime(rtt)).await {
                                    return close_quietly(shared, &mut write, 1001, "").await;
                                }
                            } else {
                                // Stale reply to an earlier probe
                                awaiting = Some((token, sent_at));
                            }
                        }
                    }
                    Some(Ok(Message::Close(frame))) => {
                        shared.set_state(ConnectionState::Disconnecting);
                        let (code, reason) = frame
                            .map(|f| (u16::from(f.code), f.reason.to_string()))
                            .unwrap_or((1005, String::new()));
                        tracing::info!(code, "Server closed the connection");
                        return (code, reason, true);
                    }
                    Some(Ok(Message::Text(_))) => {
                        // The protocol is binary-framed; text frames carry nothing
                        tracing::debug!("Ignoring text frame");
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        return socket_lost(shared, events,
                            TransportError::Socket(e.to_string())).await;
                    }
                    None => {
                        return socket_lost(shared, events,
                            TransportError::Socket("stream ended unexpectedly".to_string())).await;
                    }
                }
            }

            command = commands.recv() => {
                match command {
                    Some(Command::Send(packet)) => {
                        log_packet("SEND", &packet, options.debug_mode);
                        record_counter(CounterMetric::PacketsSent);
                        let bytes = codec::encode(&packet);
                        if let Err(e) = write.send(Message::Binary(bytes)).await {
                            return socket_lost(shared, events,
                                TransportError::SendFailed(e.to_string())).await;
                        }
                    }
                    Some(Command::Disconnect { code, reason }) => {
                        return close_quietly(shared, &mut write, code, &reason).await;
                    }
                    None => {
                        // Facade dropped; leave politely
                        return close_quietly(shared, &mut write, 1001, "").await;
                    }
                }
            }

            _ = probes.tick() => {
                if awaiting.is_some() {
                    missed += 1;
                    tracing::debug!(missed, "Probe unanswered");
                    if options.ping_attempt_limit > 0 && missed >= options.ping_attempt_limit {
                        return close_quietly(shared, &mut write, 3001, "Connection timeout").await;
                    }
                }
                let token = Uuid::new_v4();
                record_counter(CounterMetric::ProbesSent);
                match write.send(Message::Ping(token.as_bytes().to_vec())).await {
                    Ok(()) => awaiting = Some((token, Instant::now())),
                    Err(e) => {
                        return socket_lost(shared, events,
                            TransportError::SendFailed(e.to_string())).await;
                    }
                }
            }
        }
    }
}

/// Issue the close handshake and report the requested code and reason
async fn close_quietly(
    shared: &Shared,
    write: &mut WsSink,
    code: u16,
    reason: &str,
) -> (u16, String, bool) {
    shared.set_state(ConnectionState::Disconnecting);
    let reason = describe_close_code(code, reason);
    let frame = CloseFrame {
        code: CloseCode::from(code),
        reason: reason.clone().into(),
    };
    if let Err(e) = write.send(Message::Close(Some(frame))).await {
        tracing::debug!(error = %e, "Close frame not delivered");
    }
    (code, reason, true)
}

/// Report a transport failure and drive the connection down
async fn socket_lost(
    shared: &Shared,
    events: &EventSender,
    error: TransportError,
) -> (u16, String, bool) {
    shared.set_state(ConnectionState::Disconnecting);
    tracing::warn!(error = %error, "Transport failed");
    let emit_rest = events.emit(ClientEvent::Error(error.into())).await;
    (1006, String::new(), emit_rest)
}

/// Enter the terminal state and emit the single disconnection event
async fn finish(shared: &Shared, events: &EventSender, code: u16, reason: &str, emit: bool) {
    shared.clear_connection();
    shared.set_state(ConnectionState::Disconnected);
    let reason = describe_close_code(code, reason);
    tracing::info!(code, reason = %reason, "Disconnected");
    if emit {
        events
            .emit(ClientEvent::Disconnected {
                code,
                reason,
            })
            .await;
    }
}

/// Wait for a disconnect request while the attempt is still in flight.
///
/// Send commands cannot arrive here (the facade rejects them outside the
/// connected state); a closed queue means the facade itself is gone.
async fn next_disconnect(commands: &mut mpsc::UnboundedReceiver<Command>) -> (u16, String) {
    loop {
        match commands.recv().await {
            Some(Command::Disconnect { code, reason }) => return (code, reason),
            Some(Command::Send(_)) => continue,
            None => return (1001, String::new()),
        }
    }
}

fn build_request(
    options: &ClientOptions,
    shared: &Shared,
) -> Result<tokio_tungstenite::tungstenite::handshake::client::Request, ClientError> {
    let mut request = options
        .url
        .as_str()
        .into_client_request()
        .map_err(|e| TransportError::ConnectFailed(e.to_string()))?;

    let headers = request.headers_mut();
    headers.insert(
        HeaderName::from_static("sec-websocket-platform"),
        HeaderValue::from_static("rust"),
    );
    if !options.subprotocol.is_empty() {
        let value = HeaderValue::from_str(&options.subprotocol)
            .map_err(|e| TransportError::ConnectFailed(e.to_string()))?;
        headers.insert(HeaderName::from_static("sec-websocket-protocol"), value);
    }
    // Replay the session id so the server can resume the prior session
    let cookie = format!("X-Session-ID={}", shared.session().session_id);
    let value = HeaderValue::from_str(&cookie)
        .map_err(|e| TransportError::ConnectFailed(e.to_string()))?;
    headers.insert(HeaderName::from_static("cookie"), value);

    Ok(request)
}

/// Extract the required handshake fields `id`, `sid`, and `info`
fn handshake_fields(body: &Value) -> Result<(String, String, Value), ClientError> {
    let client_id = body
        .get("id")
        .and_then(Value::as_str)
        .ok_or(ProtocolError::HandshakeMissingField("id"))?;
    let session_id = body
        .get("sid")
        .and_then(Value::as_str)
        .ok_or(ProtocolError::HandshakeMissingField("sid"))?;
    let info = body
        .get("info")
        .cloned()
        .ok_or(ProtocolError::HandshakeMissingField("info"))?;
    Ok((client_id.to_string(), session_id.to_string(), info))
}

fn close_info(error: &ClientError) -> (u16, &'static str) {
    match error {
        ClientError::Protocol(_) => (1002, ""),
        _ => (1006, ""),
    }
}

fn log_packet(direction: &str, packet: &Packet, debug_mode: bool) {
    if debug_mode {
        tracing::debug!(
            direction,
            kind = ?packet.kind(),
            payload = %packet.payload(),
            attachment_bytes = packet.attachment().map(<[u8]>::len).unwrap_or(0),
            "Packet"
        );
    } else {
        let size = packet.payload().to_string().len()
            + packet.attachment().map(<[u8]>::len).unwrap_or(0);
        tracing::debug!(direction, kind = ?packet.kind(), size = %format_bytes(size as u64), "Packet");
    }
}

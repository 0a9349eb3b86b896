//! Wire framing encode/decode

use super::packet::Packet;
use crate::error::DecodeError;
use serde_json::Value;

/// Handshake verification frame discriminator
const TYPE_HANDSHAKE: u8 = 0;
/// JSON-only packet discriminator
const TYPE_TEXT: u8 = 1;
/// JSON descriptor plus attachment bytes discriminator
const TYPE_BINARY_ATTACHMENT: u8 = 2;

/// Fixed frame header: 1 discriminator byte + 4-byte big-endian
/// descriptor length
pub const HEADER_LEN: usize = 5;

/// A decoded wire frame
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    /// Session verification frame sent by the server after the transport
    /// opens; the body is the raw handshake document
    Handshake(Value),
    /// A regular protocol packet
    Packet(Packet),
}

/// Encode a packet into its wire representation.
///
/// A JSON-only packet is the header plus the serialized document; an
/// attachment packet appends the raw bytes after the descriptor, with the
/// header length field covering the descriptor only.
pub fn encode(packet: &Packet) -> Vec<u8> {
    let descriptor = packet.payload().to_string().into_bytes();
    let attachment = packet.attachment().unwrap_or(&[]);

    let mut out = Vec::with_capacity(HEADER_LEN + descriptor.len() + attachment.len());
    out.push(match packet.kind() {
        super::PacketKind::Text => TYPE_TEXT,
        super::PacketKind::BinaryAttachment => TYPE_BINARY_ATTACHMENT,
    });
    out.extend_from_slice(&(descriptor.len() as u32).to_be_bytes());
    out.extend_from_slice(&descriptor);
    out.extend_from_slice(attachment);
    out
}

/// Decode a wire frame.
///
/// Fails with a recoverable `DecodeError` on a short frame, an
/// inconsistent descriptor length, unparseable JSON, or an unknown
/// discriminator; the caller reports the error and keeps reading.
pub fn decode(bytes: &[u8]) -> Result<Frame, DecodeError> {
    if bytes.len() < HEADER_LEN {
        return Err(DecodeError::Truncated {
            len: bytes.len(),
            header: HEADER_LEN,
        });
    }

    let frame_type = bytes[0];
    let descriptor_len = u32::from_be_bytes([bytes[1], bytes[2], bytes[3], bytes[4]]) as usize;
    let body = &bytes[HEADER_LEN..];

    if descriptor_len > body.len() {
        return Err(DecodeError::LengthMismatch {
            descriptor: descriptor_len,
            remaining: body.len(),
        });
    }

    let descriptor = &body[..descriptor_len];
    let trailing = &body[descriptor_len..];

    match frame_type {
        TYPE_HANDSHAKE => {
            let payload = parse_descriptor(descriptor)?;
            Ok(Frame::Handshake(payload))
        }
        TYPE_TEXT => {
            if !trailing.is_empty() {
                return Err(DecodeError::LengthMismatch {
                    descriptor: descriptor_len,
                    remaining: body.len(),
                });
            }
            let payload = parse_descriptor(descriptor)?;
            Ok(Frame::Packet(Packet::text(payload)))
        }
        TYPE_BINARY_ATTACHMENT => {
            let payload = parse_descriptor(descriptor)?;
            Ok(Frame::Packet(Packet::binary_attachment(
                payload,
                trailing.to_vec(),
            )))
        }
        other => Err(DecodeError::UnknownType(other)),
    }
}

fn parse_descriptor(bytes: &[u8]) -> Result<Value, DecodeError> {
    serde_json::from_slice(bytes).map_err(|e| DecodeError::MalformedJson(e.to_string()))
}

/// Human-readable close reason for RFC 6455 close codes.
///
/// Returns the peer-supplied reason when it is substantial, otherwise a
/// description derived from the code's registry range.
pub fn describe_close_code(code: u16, reason: &str) -> String {
    if reason.len() > 2 {
        return reason.to_string();
    }
    let described = match code {
        1000 => "Normal Closure",
        1001 => "Going Away",
        1002 => "Protocol Error",
        1003 => "Unsupported Data",
        1004 => "(For future)",
        1005 => "No Status Received",
        1006 => "Abnormal Closure",
        1007 => "Invalid Frame Payload Data",
        1008 => "Policy Violation",
        1009 => "Message Too Big",
        1010 => "Missing Extension",
        1011 => "Internal Error",
        1012 => "Service Restart",
        1013 => "Try Again Later",
        1014 => "Bad Gateway",
        1015 => "TLS Handshake",
        0..=999 => "(Unused)",
        1016..=1999 => "(For WebSocket standard)",
        2000..=2999 => "(For WebSocket extensions)",
        3000..=3999 => "(For libraries and frameworks)",
        _ => "(For applications)",
    };
    described.to_string()
}

//! Packet types carried over the wire

use serde_json::Value;
use sha2::{Digest, Sha256};

/// Discriminator of a decoded or to-be-encoded packet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketKind {
    /// JSON document only
    Text,
    /// JSON descriptor followed by raw attachment bytes
    BinaryAttachment,
}

/// A decoded inbound or to-be-encoded outbound protocol unit
#[derive(Debug, Clone, PartialEq)]
pub enum Packet {
    /// JSON-only packet
    Text {
        /// The JSON document
        payload: Value,
    },
    /// JSON descriptor plus raw attachment bytes
    BinaryAttachment {
        /// The JSON descriptor
        payload: Value,
        /// The attachment bytes
        attachment: Vec<u8>,
    },
}

impl Packet {
    /// Create a JSON-only packet
    pub fn text(payload: Value) -> Self {
        Packet::Text { payload }
    }

    /// Create a packet carrying attachment bytes alongside a JSON descriptor
    pub fn binary_attachment(payload: Value, attachment: Vec<u8>) -> Self {
        Packet::BinaryAttachment {
            payload,
            attachment,
        }
    }

    /// The packet's wire discriminator kind
    pub fn kind(&self) -> PacketKind {
        match self {
            Packet::Text { .. } => PacketKind::Text,
            Packet::BinaryAttachment { .. } => PacketKind::BinaryAttachment,
        }
    }

    /// The JSON document or descriptor
    pub fn payload(&self) -> &Value {
        match self {
            Packet::Text { payload } => payload,
            Packet::BinaryAttachment { payload, .. } => payload,
        }
    }

    /// Attachment bytes, if the packet carries any
    pub fn attachment(&self) -> Option<&[u8]> {
        match self {
            Packet::Text { .. } => None,
            Packet::BinaryAttachment { attachment, .. } => Some(attachment),
        }
    }
}

/// Lowercase hex SHA-256 of attachment bytes, carried as `file_hash`
/// in the descriptor of outbound attachment packets
pub fn attachment_digest(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_packet_accessors() {
        let p = Packet::text(json!({"type": "help_request"}));
        assert_eq!(p.kind(), PacketKind::Text);
        assert_eq!(p.payload()["type"], "help_request");
        assert!(p.attachment().is_none());

        let p = Packet::binary_attachment(json!({"name": "a.bin"}), vec![1, 2, 3]);
        assert_eq!(p.kind(), PacketKind::BinaryAttachment);
        assert_eq!(p.attachment(), Some(&[1u8, 2, 3][..]));
    }

    #[test]
    fn test_attachment_digest_known_vector() {
        // SHA-256 of the empty input
        assert_eq!(
            attachment_digest(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        // SHA-256 of "abc"
        assert_eq!(
            attachment_digest(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}

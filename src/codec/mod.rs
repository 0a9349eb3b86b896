//! Packet codec module
//!
//! Wire framing for the packet protocol: a one-byte discriminator
//! distinguishing handshake, JSON-only, and JSON-plus-attachment frames,
//! followed by a big-endian descriptor length and the frame body.

mod packet;
mod wire;

pub use packet::{attachment_digest, Packet, PacketKind};
pub use wire::{decode, describe_close_code, encode, Frame, HEADER_LEN};

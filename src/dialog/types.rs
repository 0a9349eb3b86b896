//! Dialog control message types

use crate::codec::Packet;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

/// Envelope of control messages carried inside text packets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ControlMessage {
    /// Server asks the consumer to present a dialog
    #[serde(rename = "dialog.show")]
    DialogShow(DialogRequest),
    /// Consumer reports which action the user pressed
    #[serde(rename = "dialog.action_pressed")]
    DialogActionPressed(DialogReply),
}

impl ControlMessage {
    /// Interpret a packet's payload as a control message.
    ///
    /// Returns `None` for payloads that are no control message at all;
    /// the packet then flows to the consumer untouched.
    pub fn from_packet(packet: &Packet) -> Option<Self> {
        serde_json::from_value(packet.payload().clone()).ok()
    }

    /// The message as a JSON document ready for [`crate::client::WsClient::send`]
    pub fn to_value(&self) -> Value {
        // Infallible: the envelope shape always serializes
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// A server-requested dialog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialogRequest {
    /// Identifies the dialog in the reply
    pub id: i64,
    /// Dialog title
    pub title: String,
    /// Dialog body text
    pub message: String,
    /// Variant-specific fields
    #[serde(flatten)]
    pub variant: DialogVariant,
}

impl DialogRequest {
    /// How long a `with_actions` dialog may stay unresolved
    pub fn timeout(&self) -> Option<Duration> {
        match &self.variant {
            DialogVariant::WithActions { timeout, .. } => Some(Duration::from_millis(*timeout)),
            DialogVariant::Closable { .. } => None,
        }
    }
}

/// Dialog presentation variants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DialogVariant {
    /// Two actions and a timeout; the consumer replies with the pressed one
    WithActions {
        /// Label of the confirming action
        positive_action_label: String,
        /// Label of the declining action
        negative_action_label: String,
        /// Milliseconds before the dialog dismisses itself
        timeout: u64,
    },
    /// Informational dialog with a single close button and no reply
    Closable {
        /// Label of the close button
        close_action_label: String,
    },
}

/// Reply to a `with_actions` dialog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialogReply {
    /// The request's `id`
    pub dialog_id: i64,
    /// Which action was pressed
    pub dialog_action: DialogAction,
}

/// The pressed action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DialogAction {
    /// The confirming action
    PositiveAction,
    /// The declining action
    NegativeAction,
}

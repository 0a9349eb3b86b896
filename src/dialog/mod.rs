//! Server-driven dialog convention
//!
//! A protocol convention layered on top of text packets: the server
//! requests a dialog with a `dialog.show` message and the consumer
//! answers a `with_actions` dialog with `dialog.action_pressed` — or the
//! dialog times out, whichever comes first.

mod pending;
mod types;

pub use pending::{DialogOutcome, DialogResolver, PendingDialog};
pub use types::{ControlMessage, DialogAction, DialogReply, DialogRequest, DialogVariant};

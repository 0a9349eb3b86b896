//! Timer-scoped pending dialogs

use super::types::{DialogAction, DialogReply, DialogRequest};
use tokio::sync::oneshot;
use tokio::time::timeout;

/// A dialog awaiting resolution.
///
/// Created from a received [`DialogRequest`]; resolves exactly once —
/// through the paired [`DialogResolver`] or the request's timeout,
/// whichever comes first. The losing side is a no-op, so a late button
/// press after the timeout can never produce a second reply.
#[derive(Debug)]
pub struct PendingDialog {
    request: DialogRequest,
    rx: oneshot::Receiver<DialogAction>,
}

/// Resolving half of a pending dialog; consumed by the single resolution
#[derive(Debug)]
pub struct DialogResolver {
    tx: oneshot::Sender<DialogAction>,
}

/// How a pending dialog ended
#[derive(Debug, Clone, PartialEq)]
pub enum DialogOutcome {
    /// An action was pressed in time; the reply is ready to send
    Resolved(DialogReply),
    /// The timeout elapsed first
    TimedOut,
    /// The resolver was dropped without an action
    Abandoned,
}

impl PendingDialog {
    /// Open a pending dialog for a received request
    pub fn open(request: DialogRequest) -> (Self, DialogResolver) {
        let (tx, rx) = oneshot::channel();
        (Self { request, rx }, DialogResolver { tx })
    }

    /// The originating request
    pub fn request(&self) -> &DialogRequest {
        &self.request
    }

    /// Wait for the resolution or the timeout.
    ///
    /// A `with_actions` dialog is bounded by its `timeout` field; a
    /// `closable` dialog has no reply and completes only when the
    /// resolver goes away.
    pub async fn outcome(self) -> DialogOutcome {
        let dialog_id = self.request.id;
        match self.request.timeout() {
            Some(limit) => match timeout(limit, self.rx).await {
                Ok(Ok(action)) => DialogOutcome::Resolved(DialogReply {
                    dialog_id,
                    dialog_action: action,
                }),
                Ok(Err(_)) => DialogOutcome::Abandoned,
                Err(_) => DialogOutcome::TimedOut,
            },
            None => match self.rx.await {
                Ok(action) => DialogOutcome::Resolved(DialogReply {
                    dialog_id,
                    dialog_action: action,
                }),
                Err(_) => DialogOutcome::Abandoned,
            },
        }
    }
}

impl DialogResolver {
    /// Resolve the dialog with the pressed action.
    ///
    /// Returns false when the dialog already timed out or was dropped.
    pub fn resolve(self, action: DialogAction) -> bool {
        self.tx.send(action).is_ok()
    }
}

//! Caller handles for evaluation requests

use tokio::sync::oneshot;

use crate::error::EvalOutcome;

/// The party waiting on an evaluation request.
///
/// `reply` consumes the handle, so every handle is answered at most once.
pub trait ReplyHandle: Send + 'static {
    fn reply(self, outcome: EvalOutcome);
}

impl ReplyHandle for oneshot::Sender<EvalOutcome> {
    fn reply(self, outcome: EvalOutcome) {
        if self.send(outcome).is_err() {
            tracing::debug!("Evaluation result dropped, receiver is gone");
        }
    }
}

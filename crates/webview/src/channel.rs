//! Outbound channel to the host application
//!
//! Responses and events are pushed onto an unbounded channel; the host
//! bridge drains it on its own thread.

use desktop_webview_eval::{EvalOutcome, ReplyHandle};
use desktop_webview_ipc::{MethodResult, PluginToHost, WebviewEvent};
use tokio::sync::{mpsc, oneshot};

use crate::error::WebviewError;

pub type HostSender = mpsc::UnboundedSender<PluginToHost>;

/// Push an event to the host. A closed channel is logged and ignored.
pub fn emit(host: &HostSender, event: WebviewEvent) {
    if host.send(event.into()).is_err() {
        tracing::debug!("Host channel closed, dropping event");
    }
}

/// Answer a method call.
pub fn respond(host: &HostSender, call_id: u64, result: MethodResult) -> Result<(), WebviewError> {
    host.send(PluginToHost::response(call_id, result))
        .map_err(|_| WebviewError::ChannelClosed)
}

/// A method call whose response is still owed to the host
#[derive(Debug)]
pub struct PendingCall {
    call_id: u64,
    host: HostSender,
}

impl PendingCall {
    pub fn new(call_id: u64, host: HostSender) -> Self {
        Self { call_id, host }
    }
}

impl ReplyHandle for PendingCall {
    fn reply(self, outcome: EvalOutcome) {
        let result = match outcome {
            Ok(encoded) => MethodResult::value(encoded),
            Err(err) => MethodResult::error(err.code(), err.to_string()),
        };
        if respond(&self.host, self.call_id, result).is_err() {
            tracing::debug!(call_id = self.call_id, "Host gone before evaluation reply");
        }
    }
}

/// Whoever is waiting on an evaluation: the host, or native code in-process
#[derive(Debug)]
pub enum EvalReply {
    Host(PendingCall),
    Local(oneshot::Sender<EvalOutcome>),
}

impl ReplyHandle for EvalReply {
    fn reply(self, outcome: EvalOutcome) {
        match self {
            Self::Host(call) => call.reply(outcome),
            Self::Local(sender) => sender.reply(outcome),
        }
    }
}

impl From<PendingCall> for EvalReply {
    fn from(call: PendingCall) -> Self {
        Self::Host(call)
    }
}

impl From<oneshot::Sender<EvalOutcome>> for EvalReply {
    fn from(sender: oneshot::Sender<EvalOutcome>) -> Self {
        Self::Local(sender)
    }
}

//! IPC message protocol for desktop-webview
//!
//! Defines the method calls the host application sends to the plugin, the
//! responses it gets back, and the events windows push on their own.

mod error;
mod messages;
pub mod types;

pub use error::IpcError;
pub use messages::{MethodCall, MethodResult, PluginToHost, WebviewCommand, WebviewEvent};
pub use types::*;

//! Native webview windows for desktop-webview
//!
//! Each window is a GTK toplevel hosting a WebKitGTK view built through wry.
//! The [`WebviewPlugin`] owns the windows and answers host method calls;
//! responses and window events flow back over a [`HostSender`].
//!
//! Everything except [`channel`] must be used from the GTK main thread.

pub mod channel;
mod error;

#[cfg(target_os = "linux")]
mod cookies;
#[cfg(target_os = "linux")]
mod engine;
#[cfg(target_os = "linux")]
mod plugin;
#[cfg(target_os = "linux")]
mod window;

pub use channel::{EvalReply, HostSender, PendingCall};
pub use error::WebviewError;

#[cfg(target_os = "linux")]
pub use cookies::cookies_blocking;
#[cfg(target_os = "linux")]
pub use engine::{IdleScheduler, WebKitEngine};
#[cfg(target_os = "linux")]
pub use plugin::WebviewPlugin;
#[cfg(target_os = "linux")]
pub use window::WebviewWindow;

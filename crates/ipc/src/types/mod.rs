//! Type definitions for IPC messages.

mod cookie;
mod script;
mod window;

pub use cookie::*;
pub use script::*;
pub use window::*;

//! Shared configuration for desktop-webview
//!
//! This crate provides the single source of truth for window defaults and
//! the names shared between the native side and scripts running in the page.

use serde::{Deserialize, Serialize};

/// Default window width in pixels
pub const DEFAULT_WIDTH: i32 = 1280;

/// Default window height in pixels
pub const DEFAULT_HEIGHT: i32 = 720;

/// Default window title
pub const DEFAULT_TITLE: &str = "";

/// Script message handler exposed to pages as
/// `window.webkit.messageHandlers.msgToNative.postMessage(...)`
pub const SCRIPT_MESSAGE_HANDLER: &str = "msgToNative";

/// Window configuration resolved before a native window is created
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowConfig {
    /// Window title
    pub title: String,
    /// Default width in logical pixels
    pub width: i32,
    /// Default height in logical pixels
    pub height: i32,
    /// Keep the window hidden (the view still loads and runs scripts)
    pub headless: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            headless: false,
        }
    }
}

impl WindowConfig {
    /// Apply per-window overrides on top of these defaults.
    ///
    /// Non-positive dimensions are ignored. `headless` is sticky: a window is
    /// headless if either the defaults or the override ask for it.
    pub fn with_overrides(
        &self,
        title: Option<&str>,
        width: Option<i32>,
        height: Option<i32>,
        headless: bool,
    ) -> Self {
        Self {
            title: title.map(str::to_string).unwrap_or_else(|| self.title.clone()),
            width: width.filter(|w| *w > 0).unwrap_or(self.width),
            height: height.filter(|h| *h > 0).unwrap_or(self.height),
            headless: self.headless || headless,
        }
    }
}

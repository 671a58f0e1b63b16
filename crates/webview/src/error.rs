//! Error types for the webview crate

use thiserror::Error;

#[derive(Debug, Error)]
pub enum WebviewError {
    #[error("Failed to initialize GTK: {0}")]
    GtkInit(String),

    #[error("Failed to create webview: {0}")]
    WebviewCreate(String),

    #[error("Failed to navigate: {0}")]
    Navigation(String),

    #[error("No webview with id {0}")]
    UnknownView(i64),

    #[error("Host channel closed")]
    ChannelClosed,
}

impl WebviewError {
    /// Stable error code reported back to the host
    pub fn code(&self) -> &'static str {
        match self {
            Self::GtkInit(_) => "gtk_init_failed",
            Self::WebviewCreate(_) => "webview_create_failed",
            Self::Navigation(_) => "navigation_failed",
            Self::UnknownView(_) => "invalid_view_id",
            Self::ChannelClosed => "channel_closed",
        }
    }
}

//! Host configuration read from the environment

use desktop_webview_config::WindowConfig;

/// Log filter used when `DESKTOP_WEBVIEW_LOG` is unset
pub const DEFAULT_LOG_FILTER: &str = "info";

const LOG_VAR: &str = "DESKTOP_WEBVIEW_LOG";
const HEADLESS_VAR: &str = "DESKTOP_WEBVIEW_HEADLESS";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostConfig {
    /// `tracing_subscriber::EnvFilter` directives
    pub log_filter: String,
    /// Force every window to stay hidden
    pub headless: bool,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            log_filter: DEFAULT_LOG_FILTER.to_string(),
            headless: false,
        }
    }
}

impl HostConfig {
    /// Parse from DESKTOP_WEBVIEW_LOG and DESKTOP_WEBVIEW_HEADLESS
    pub fn from_env() -> Self {
        Self::from_vars(
            std::env::var(LOG_VAR).ok().as_deref(),
            std::env::var(HEADLESS_VAR).ok().as_deref(),
        )
    }

    fn from_vars(log: Option<&str>, headless: Option<&str>) -> Self {
        let log_filter = match log.map(str::trim) {
            Some(filter) if !filter.is_empty() => filter.to_string(),
            _ => DEFAULT_LOG_FILTER.to_string(),
        };
        let headless = matches!(
            headless.map(|v| v.trim().to_ascii_lowercase()).as_deref(),
            Some("1" | "true" | "yes" | "on")
        );
        Self { log_filter, headless }
    }

    /// Defaults applied to every window the host creates
    pub fn window_defaults(&self) -> WindowConfig {
        WindowConfig {
            headless: self.headless,
            ..WindowConfig::default()
        }
    }
}

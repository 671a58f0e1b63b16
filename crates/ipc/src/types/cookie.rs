//! Cookie snapshot types.

use serde::{Deserialize, Serialize};

/// One cookie as reported to the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cookie {
    pub name: String,
    pub value: String,
    pub domain: String,
    pub path: String,
    /// Expiry as a Unix timestamp in seconds, `None` for session cookies
    pub expires: Option<f64>,
    pub http_only: bool,
    pub secure: bool,
    pub session_only: bool,
}

impl Cookie {
    /// Map an engine expiry (seconds since the epoch) to the wire value.
    ///
    /// Negative values mean "no expiry" and are reported as `null`.
    pub fn expiry_from_seconds(seconds: Option<f64>) -> Option<f64> {
        seconds.filter(|s| *s >= 0.0)
    }
}

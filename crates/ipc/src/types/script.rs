//! User script injection types.

use serde::{Deserialize, Serialize};

/// When a user script runs relative to document parsing.
///
/// Encoded as an integer on the wire: `0` for document start, `1` for
/// document end.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum InjectionTime {
    #[default]
    DocumentStart,
    DocumentEnd,
}

impl TryFrom<u8> for InjectionTime {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::DocumentStart),
            1 => Ok(Self::DocumentEnd),
            other => Err(format!("invalid injection time {other}")),
        }
    }
}

impl From<InjectionTime> for u8 {
    fn from(value: InjectionTime) -> Self {
        match value {
            InjectionTime::DocumentStart => 0,
            InjectionTime::DocumentEnd => 1,
        }
    }
}

/// Script injected into every page load of a window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserScript {
    pub source: String,
    #[serde(default)]
    pub injection_time: InjectionTime,
    #[serde(default)]
    pub for_all_frames: bool,
}

impl UserScript {
    /// Top-frame script run at document start.
    pub fn at_document_start(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            injection_time: InjectionTime::DocumentStart,
            for_all_frames: false,
        }
    }
}

//! Window creation parameters and load phases.

use serde::{Deserialize, Serialize};

use super::UserScript;

/// Arguments of the `create` method. Missing fields fall back to the
/// configured window defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateWindowParams {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub width: Option<i32>,
    #[serde(default)]
    pub height: Option<i32>,
    #[serde(default)]
    pub headless: bool,
    #[serde(default)]
    pub user_scripts: Vec<UserScript>,
}

/// Page load progress reported by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoadPhase {
    Started,
    Redirected,
    Committed,
    Finished,
}

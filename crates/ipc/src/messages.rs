//! Main IPC message enums for communication between the host and the plugin.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::IpcError;
use crate::types::{CreateWindowParams, LoadPhase};

/// A method call from the host application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodCall {
    /// Correlates the eventual response with this call
    pub call_id: u64,
    pub method: String,
    #[serde(default)]
    pub args: Value,
}

impl MethodCall {
    pub fn new(call_id: u64, method: impl Into<String>, args: Value) -> Self {
        Self {
            call_id,
            method: method.into(),
            args,
        }
    }
}

/// Typed form of a [`MethodCall`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "method",
    content = "args",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum WebviewCommand {
    /// Create a new window, answered with its view id
    Create(CreateWindowParams),

    /// Load a URL
    Launch { view_id: i64, url: String },

    /// Inject a script at document start for every later page load
    AddScriptToExecuteOnDocumentCreated { view_id: i64, java_script: String },

    /// Append an application name to the default user agent
    SetApplicationNameForUserAgent {
        view_id: i64,
        application_name: String,
    },

    Back { view_id: i64 },

    Forward { view_id: i64 },

    Reload { view_id: i64 },

    Stop { view_id: i64 },

    Close { view_id: i64 },

    /// Evaluate a script; the response is deferred until the engine answers
    EvaluateJavaScript {
        view_id: i64,
        java_script_string: String,
    },

    GetAllCookies { view_id: i64 },

    IsWebviewAvailable,
}

impl WebviewCommand {
    /// Wire names of every supported method.
    pub const METHODS: &'static [&'static str] = &[
        "create",
        "launch",
        "addScriptToExecuteOnDocumentCreated",
        "setApplicationNameForUserAgent",
        "back",
        "forward",
        "reload",
        "stop",
        "close",
        "evaluateJavaScript",
        "getAllCookies",
        "isWebviewAvailable",
    ];

    /// Parse a raw method call into a typed command.
    pub fn from_call(call: &MethodCall) -> Result<Self, IpcError> {
        if !Self::METHODS.contains(&call.method.as_str()) {
            return Err(IpcError::UnknownMethod(call.method.clone()));
        }

        let mut envelope = serde_json::Map::new();
        envelope.insert("method".into(), Value::String(call.method.clone()));
        match (call.method.as_str(), &call.args) {
            ("isWebviewAvailable", _) => {}
            ("create", Value::Null) => {
                envelope.insert("args".into(), Value::Object(serde_json::Map::new()));
            }
            (_, Value::Null) => {}
            (_, args) => {
                envelope.insert("args".into(), args.clone());
            }
        }

        serde_json::from_value(Value::Object(envelope)).map_err(|e| IpcError::InvalidArguments {
            method: call.method.clone(),
            reason: e.to_string(),
        })
    }

    /// The window this command targets, if any.
    pub fn view_id(&self) -> Option<i64> {
        match self {
            Self::Create(_) | Self::IsWebviewAvailable => None,
            Self::Launch { view_id, .. }
            | Self::AddScriptToExecuteOnDocumentCreated { view_id, .. }
            | Self::SetApplicationNameForUserAgent { view_id, .. }
            | Self::Back { view_id }
            | Self::Forward { view_id }
            | Self::Reload { view_id }
            | Self::Stop { view_id }
            | Self::Close { view_id }
            | Self::EvaluateJavaScript { view_id, .. }
            | Self::GetAllCookies { view_id } => Some(*view_id),
        }
    }
}

/// Terminal answer to a [`MethodCall`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum MethodResult {
    Success {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<Value>,
    },
    Error {
        code: String,
        message: String,
    },
    NotImplemented,
}

impl MethodResult {
    /// Success without a payload
    pub fn ok() -> Self {
        Self::Success { value: None }
    }

    pub fn value(value: impl Into<Value>) -> Self {
        Self::Success {
            value: Some(value.into()),
        }
    }

    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Error {
            code: code.into(),
            message: message.into(),
        }
    }
}

impl From<IpcError> for MethodResult {
    fn from(err: IpcError) -> Self {
        match err {
            IpcError::UnknownMethod(_) => Self::NotImplemented,
            other => Self::error(other.code(), other.to_string()),
        }
    }
}

/// Events pushed from a window to the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "method",
    content = "args",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum WebviewEvent {
    OnWindowClose {
        id: i64,
    },
    OnHistoryChanged {
        id: i64,
        can_go_back: bool,
        can_go_forward: bool,
    },
    OnNavigationStarted {
        id: i64,
    },
    OnNavigationCompleted {
        id: i64,
    },
    OnUrlRequested {
        id: i64,
        url: String,
    },
    OnJavascriptWebMessageReceived {
        id: i64,
        message: String,
    },
}

impl WebviewEvent {
    /// Events emitted for one load change: the history state always, then
    /// the navigation start/completion when the phase calls for it.
    pub fn for_load_change(
        id: i64,
        phase: LoadPhase,
        can_go_back: bool,
        can_go_forward: bool,
    ) -> Vec<Self> {
        let mut events = vec![Self::OnHistoryChanged {
            id,
            can_go_back,
            can_go_forward,
        }];
        match phase {
            LoadPhase::Started => events.push(Self::OnNavigationStarted { id }),
            LoadPhase::Finished => events.push(Self::OnNavigationCompleted { id }),
            LoadPhase::Redirected | LoadPhase::Committed => {}
        }
        events
    }
}

/// Everything the plugin writes back to the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum PluginToHost {
    Response { call_id: u64, result: MethodResult },
    Event { event: WebviewEvent },
}

impl PluginToHost {
    pub fn response(call_id: u64, result: MethodResult) -> Self {
        Self::Response { call_id, result }
    }
}

impl From<WebviewEvent> for PluginToHost {
    fn from(event: WebviewEvent) -> Self {
        Self::Event { event }
    }
}

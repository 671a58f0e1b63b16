//! Method dispatch for host calls

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use desktop_webview_config::WindowConfig;
use desktop_webview_ipc::{CreateWindowParams, MethodCall, MethodResult, WebviewCommand};

use crate::channel::{self, HostSender, PendingCall};
use crate::error::WebviewError;
use crate::window::WebviewWindow;

type Windows = RefCell<HashMap<i64, Rc<WebviewWindow>>>;

/// Owns every open window and answers host method calls.
///
/// Lives on the GTK thread.
pub struct WebviewPlugin {
    windows: Rc<Windows>,
    next_id: Cell<i64>,
    host: HostSender,
    defaults: WindowConfig,
}

impl WebviewPlugin {
    pub fn new(host: HostSender, defaults: WindowConfig) -> Self {
        Self {
            windows: Rc::new(RefCell::new(HashMap::new())),
            next_id: Cell::new(1),
            host,
            defaults,
        }
    }

    /// Handle one call. The response is sent right away, except for
    /// `evaluateJavaScript` which answers once the script completes.
    pub fn handle(&self, call: MethodCall) {
        let call_id = call.call_id;
        let result = match WebviewCommand::from_call(&call) {
            Ok(command) => self.dispatch(call_id, command),
            Err(err) => {
                tracing::warn!("Rejected call {} ({}): {}", call_id, call.method, err);
                Some(err.into())
            }
        };

        if let Some(result) = result {
            if let Err(err) = channel::respond(&self.host, call_id, result) {
                tracing::debug!("Dropping response to call {}: {}", call_id, err);
            }
        }
    }

    fn dispatch(&self, call_id: u64, command: WebviewCommand) -> Option<MethodResult> {
        let window = match command.view_id() {
            Some(view_id) => match self.window(view_id) {
                Some(window) => Some(window),
                None => return Some(error_result(WebviewError::UnknownView(view_id))),
            },
            None => None,
        };

        let result = match (command, window) {
            (WebviewCommand::IsWebviewAvailable, _) => MethodResult::value(true),
            (WebviewCommand::Create(params), _) => match self.create(params) {
                Ok(id) => MethodResult::value(id),
                Err(err) => {
                    tracing::error!("Failed to create webview window: {}", err);
                    error_result(err)
                }
            },
            (WebviewCommand::EvaluateJavaScript { java_script_string, .. }, Some(window)) => {
                let pending = PendingCall::new(call_id, self.host.clone());
                window.evaluate_javascript(&java_script_string, pending);
                return None;
            }
            (command, Some(window)) => Self::apply(&window, command),
            (command, None) => {
                tracing::error!("Command without a target window: {:?}", command);
                MethodResult::error("invalid_view_id", "Missing view id")
            }
        };
        Some(result)
    }

    fn apply(window: &WebviewWindow, command: WebviewCommand) -> MethodResult {
        match command {
            WebviewCommand::Launch { url, .. } => match window.navigate(&url) {
                Ok(()) => MethodResult::ok(),
                Err(err) => error_result(err),
            },
            WebviewCommand::AddScriptToExecuteOnDocumentCreated { java_script, .. } => {
                window.run_javascript_when_content_ready(&java_script);
                MethodResult::ok()
            }
            WebviewCommand::SetApplicationNameForUserAgent {
                application_name, ..
            } => {
                window.set_application_name_for_user_agent(&application_name);
                MethodResult::ok()
            }
            WebviewCommand::Back { .. } => {
                window.go_back();
                MethodResult::ok()
            }
            WebviewCommand::Forward { .. } => {
                window.go_forward();
                MethodResult::ok()
            }
            WebviewCommand::Reload { .. } => {
                window.reload();
                MethodResult::ok()
            }
            WebviewCommand::Stop { .. } => {
                window.stop_loading();
                MethodResult::ok()
            }
            WebviewCommand::Close { .. } => {
                window.close();
                MethodResult::ok()
            }
            WebviewCommand::GetAllCookies { .. } => {
                match serde_json::to_value(window.get_all_cookies()) {
                    Ok(cookies) => MethodResult::value(cookies),
                    Err(err) => MethodResult::error("serialization_failed", err.to_string()),
                }
            }
            WebviewCommand::Create(_)
            | WebviewCommand::IsWebviewAvailable
            | WebviewCommand::EvaluateJavaScript { .. } => {
                MethodResult::error("invalid_arguments", "Unexpected command for window")
            }
        }
    }

    fn create(&self, params: CreateWindowParams) -> Result<i64, WebviewError> {
        let id = self.next_id.get();
        let config = self.defaults.with_overrides(
            params.title.as_deref(),
            params.width,
            params.height,
            params.headless,
        );

        let windows: Weak<Windows> = Rc::downgrade(&self.windows);
        let on_close = move || {
            if let Some(windows) = windows.upgrade() {
                let removed = windows.borrow_mut().remove(&id);
                // Dropped after the map borrow ends.
                drop(removed);
                tracing::debug!("Webview window {} unregistered", id);
            }
        };

        let window = WebviewWindow::new(self.host.clone(), id, on_close, &config, &params.user_scripts)?;
        self.next_id.set(id + 1);
        self.windows.borrow_mut().insert(id, Rc::new(window));
        Ok(id)
    }

    /// Look up a window. The map borrow ends before the caller touches the
    /// window, so window callbacks may unregister it.
    pub fn window(&self, id: i64) -> Option<Rc<WebviewWindow>> {
        self.windows.borrow().get(&id).cloned()
    }

    pub fn window_count(&self) -> usize {
        self.windows.borrow().len()
    }

    /// Destroy every open window
    pub fn close_all(&self) {
        let windows: Vec<_> = self.windows.borrow().values().cloned().collect();
        for window in windows {
            window.close();
        }
    }
}

fn error_result(err: WebviewError) -> MethodResult {
    MethodResult::error(err.code(), err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use desktop_webview_ipc::PluginToHost;
    use serde_json::json;
    use tokio::sync::mpsc;

    fn plugin() -> (WebviewPlugin, mpsc::UnboundedReceiver<PluginToHost>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (WebviewPlugin::new(tx, WindowConfig::default()), rx)
    }

    fn result_of(rx: &mut mpsc::UnboundedReceiver<PluginToHost>) -> (u64, MethodResult) {
        match rx.try_recv().unwrap() {
            PluginToHost::Response { call_id, result } => (call_id, result),
            other => panic!("expected response, got {other:?}"),
        }
    }

    #[test]
    fn test_webview_is_available() {
        let (plugin, mut rx) = plugin();
        plugin.handle(MethodCall::new(1, "isWebviewAvailable", serde_json::Value::Null));
        assert_eq!(result_of(&mut rx), (1, MethodResult::value(true)));
    }

    #[test]
    fn test_unknown_method_is_not_implemented() {
        let (plugin, mut rx) = plugin();
        plugin.handle(MethodCall::new(2, "openDevToolsWindow", json!({"viewId": 1})));
        assert_eq!(result_of(&mut rx), (2, MethodResult::NotImplemented));
    }

    #[test]
    fn test_unknown_view_id() {
        let (plugin, mut rx) = plugin();
        for (call_id, method) in [(3, "reload"), (4, "close"), (5, "getAllCookies")] {
            plugin.handle(MethodCall::new(call_id, method, json!({"viewId": 77})));
            let (id, result) = result_of(&mut rx);
            assert_eq!(id, call_id);
            assert_eq!(
                result,
                MethodResult::error("invalid_view_id", "No webview with id 77")
            );
        }
    }

    #[test]
    fn test_evaluate_on_unknown_view_answers_immediately() {
        let (plugin, mut rx) = plugin();
        plugin.handle(MethodCall::new(
            6,
            "evaluateJavaScript",
            json!({"viewId": 3, "javaScriptString": "1"}),
        ));
        let (_, result) = result_of(&mut rx);
        assert!(matches!(result, MethodResult::Error { ref code, .. } if code == "invalid_view_id"));
    }

    #[test]
    fn test_malformed_arguments() {
        let (plugin, mut rx) = plugin();
        plugin.handle(MethodCall::new(7, "launch", json!({"viewId": "one"})));
        let (_, result) = result_of(&mut rx);
        assert!(matches!(result, MethodResult::Error { ref code, .. } if code == "invalid_arguments"));
        assert_eq!(plugin.window_count(), 0);
    }
}

//! WebKitGTK bindings for the evaluation queue

use desktop_webview_eval::{EngineError, EvalCallback, JsValue, Scheduler, ScriptEngine};
use gio::Cancellable;
use javascriptcore::{ContextExt, ExceptionExt, ValueExt};
use webkit2gtk::WebViewExt;

/// Evaluates scripts in a WebKit view's main world
pub struct WebKitEngine {
    webview: webkit2gtk::WebView,
}

impl WebKitEngine {
    pub fn new(webview: webkit2gtk::WebView) -> Self {
        Self { webview }
    }
}

impl ScriptEngine for WebKitEngine {
    fn evaluate(&self, script: &str, on_complete: EvalCallback) {
        self.webview
            .evaluate_javascript(script, None, None, Cancellable::NONE, move |result| {
                let result = match result {
                    Ok(value) => js_value_from_jsc(&value),
                    Err(err) => Err(EngineError::Failed(err.message().to_string())),
                };
                on_complete(result);
            });
    }
}

/// Detach a JavaScriptCore value from its context.
///
/// A pending exception on the value's context wins over the value itself and
/// is cleared once read. Its text keeps the error name, e.g.
/// `ReferenceError: Can't find variable: foo`.
fn js_value_from_jsc(value: &javascriptcore::Value) -> Result<JsValue, EngineError> {
    if let Some(context) = value.context() {
        if let Some(exception) = context.exception() {
            let text = exception.to_str().to_string();
            let text = if text.is_empty() {
                exception.message().map(|m| m.to_string()).unwrap_or_default()
            } else {
                text
            };
            context.clear_exception();
            return Err(EngineError::Exception(text));
        }
    }

    let js_value = if value.is_null() {
        JsValue::Null
    } else if value.is_undefined() {
        JsValue::Undefined
    } else if value.is_boolean() {
        JsValue::Boolean(value.to_boolean())
    } else if value.is_number() {
        JsValue::Number(value.to_double())
    } else if value.is_string() {
        JsValue::String(value.to_str().to_string())
    } else if value.is_array() {
        let (json, text) = json_and_text(value);
        JsValue::Array { json, text }
    } else if value.is_object() {
        let (json, text) = json_and_text(value);
        JsValue::Object { json, text }
    } else {
        JsValue::Other {
            text: Some(value.to_str().to_string()),
        }
    };
    Ok(js_value)
}

// String coercion is only needed when JSON serialization fails (cycles,
// functions). A failed serialization may leave an exception on the context;
// it must not leak into the next evaluation.
fn json_and_text(value: &javascriptcore::Value) -> (Option<String>, Option<String>) {
    if let Some(json) = value.to_json(0) {
        return (Some(json.to_string()), None);
    }
    if let Some(context) = value.context() {
        context.clear_exception();
    }
    (None, Some(value.to_str().to_string()))
}

/// Defers tasks to the default GLib main context
#[derive(Debug, Default, Clone, Copy)]
pub struct IdleScheduler;

impl Scheduler for IdleScheduler {
    fn defer(&self, task: Box<dyn FnOnce() + 'static>) {
        glib::idle_add_local_once(task);
    }
}

//! Native webview windows on GTK and WebKitGTK

use std::cell::RefCell;
use std::rc::Rc;

use desktop_webview_config::{SCRIPT_MESSAGE_HANDLER, WindowConfig};
use desktop_webview_eval::{EvalOutcome, EvalSender, EvalSerializer, Submission};
use desktop_webview_ipc::{Cookie, InjectionTime, LoadPhase, UserScript, WebviewEvent};
use gtk::prelude::*;
use javascriptcore::ValueExt;
use tokio::sync::oneshot;
use webkit2gtk::{
    LoadEvent, SettingsExt, UserContentInjectedFrames, UserContentManagerExt,
    UserScriptInjectionTime, WebViewExt,
};
use wry::{WebViewBuilderExtUnix, WebViewExtUnix};

use crate::channel::{self, EvalReply, HostSender};
use crate::cookies;
use crate::engine::{IdleScheduler, WebKitEngine};
use crate::error::WebviewError;

type Evaluator = EvalSerializer<WebKitEngine, IdleScheduler, EvalReply>;

/// A top-level window hosting one WebKit view
pub struct WebviewWindow {
    id: i64,
    window: gtk::Window,
    webview: wry::WebView,
    webkit: webkit2gtk::WebView,
    default_user_agent: String,
    evaluator: Rc<Evaluator>,
}

impl WebviewWindow {
    /// Create the window, wire its signals to `host` and show it unless
    /// `config.headless` is set.
    ///
    /// `on_close` runs once when GTK destroys the window, before
    /// `onWindowClose` is emitted.
    pub fn new(
        host: HostSender,
        id: i64,
        on_close: impl FnOnce() + 'static,
        config: &WindowConfig,
        user_scripts: &[UserScript],
    ) -> Result<Self, WebviewError> {
        if !gtk::is_initialized() {
            gtk::init().map_err(|e| WebviewError::GtkInit(e.to_string()))?;
        }

        let window = gtk::Window::new(gtk::WindowType::Toplevel);
        window.set_title(&config.title);
        window.set_default_size(config.width, config.height);
        window.set_position(gtk::WindowPosition::Center);

        let container = gtk::Box::new(gtk::Orientation::Vertical, 0);
        window.add(&container);

        let (webview, webkit) = match Self::build_webview(&container, &host, id) {
            Ok(views) => views,
            Err(err) => {
                // Toplevels stay alive in GTK's window list until destroyed.
                destroy_window(&window);
                return Err(err);
            }
        };

        for script in user_scripts {
            add_user_script(&webkit, script);
        }
        Self::connect_script_messages(&webkit, &host, id);
        Self::connect_navigation(&webkit, &host, id);

        let default_user_agent = match WebViewExt::settings(&webkit) {
            Some(settings) => {
                settings.set_javascript_can_open_windows_automatically(true);
                settings.user_agent().map(|ua| ua.to_string()).unwrap_or_default()
            }
            None => String::new(),
        };

        let evaluator = Evaluator::new(WebKitEngine::new(webkit.clone()), IdleScheduler);
        if let Some(listener) = evaluator.kick_listener() {
            glib::MainContext::default().spawn_local(listener);
        }

        let on_close = RefCell::new(Some(on_close));
        let weak_evaluator = Rc::downgrade(&evaluator);
        let close_host = host.clone();
        window.connect_destroy(move |_| {
            tracing::info!("Webview window {} destroyed", id);
            if let Some(evaluator) = weak_evaluator.upgrade() {
                evaluator.close();
            }
            let callback = on_close.borrow_mut().take();
            if let Some(callback) = callback {
                callback();
            }
            channel::emit(&close_host, WebviewEvent::OnWindowClose { id });
        });

        if config.headless {
            tracing::debug!("Webview window {} is headless", id);
        } else {
            window.show_all();
            webkit.grab_focus();
        }

        tracing::info!(
            "Webview window {} created ({}x{})",
            id,
            config.width,
            config.height
        );

        Ok(Self {
            id,
            window,
            webview,
            webkit,
            default_user_agent,
            evaluator,
        })
    }

    fn build_webview(
        container: &gtk::Box,
        host: &HostSender,
        id: i64,
    ) -> Result<(wry::WebView, webkit2gtk::WebView), WebviewError> {
        let url_host = host.clone();
        let webview = wry::WebViewBuilder::new()
            .with_navigation_handler(move |url: String| {
                channel::emit(&url_host, WebviewEvent::OnUrlRequested { id, url });
                true
            })
            .build_gtk(container)
            .map_err(|e| WebviewError::WebviewCreate(e.to_string()))?;

        let webkit = webview.webview();
        Ok((webview, webkit))
    }

    fn connect_script_messages(webkit: &webkit2gtk::WebView, host: &HostSender, id: i64) {
        let Some(manager) = webkit.user_content_manager() else {
            tracing::warn!("Webview {} has no user content manager", id);
            return;
        };

        let host = host.clone();
        manager.connect_script_message_received(Some(SCRIPT_MESSAGE_HANDLER), move |_, result| {
            let message = result
                .js_value()
                .filter(|value| value.is_string())
                .map(|value| value.to_str().to_string());
            match message {
                Some(message) => {
                    channel::emit(&host, WebviewEvent::OnJavascriptWebMessageReceived { id, message })
                }
                None => tracing::warn!("Dropping non-string message from webview {}", id),
            }
        });
        if !manager.register_script_message_handler(SCRIPT_MESSAGE_HANDLER) {
            tracing::warn!("Failed to register '{}' handler", SCRIPT_MESSAGE_HANDLER);
        }
    }

    fn connect_navigation(webkit: &webkit2gtk::WebView, host: &HostSender, id: i64) {
        webkit.connect_load_failed_with_tls_errors(|_, uri, _, errors| {
            tracing::warn!("Ignoring TLS errors {:?} for {}", errors, uri);
            true
        });

        // Popups load in the same view.
        webkit.connect_create(|webview, _| Some(webview.clone().upcast()));

        let host = host.clone();
        webkit.connect_load_changed(move |webview, load_event| {
            let phase = match load_event {
                LoadEvent::Started => LoadPhase::Started,
                LoadEvent::Redirected => LoadPhase::Redirected,
                LoadEvent::Committed => LoadPhase::Committed,
                LoadEvent::Finished => LoadPhase::Finished,
                _ => return,
            };
            tracing::debug!("Webview {} load {:?}", id, phase);
            for event in WebviewEvent::for_load_change(
                id,
                phase,
                webview.can_go_back(),
                webview.can_go_forward(),
            ) {
                channel::emit(&host, event);
            }
        });
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    /// Whether the native window is still alive
    pub fn is_open(&self) -> bool {
        !self.evaluator.queue().is_closed()
    }

    pub fn default_user_agent(&self) -> &str {
        &self.default_user_agent
    }

    pub fn navigate(&self, url: &str) -> Result<(), WebviewError> {
        tracing::debug!("Webview {} navigating to {}", self.id, url);
        self.webview
            .load_url(url)
            .map_err(|e| WebviewError::Navigation(e.to_string()))
    }

    /// Run `script` at document start of every later top-frame load
    pub fn run_javascript_when_content_ready(&self, script: &str) {
        add_user_script(&self.webkit, &UserScript::at_document_start(script));
    }

    /// Destroy the window. Triggers `on_close` and `onWindowClose`.
    pub fn close(&self) {
        destroy_window(&self.window);
    }

    pub fn set_application_name_for_user_agent(&self, application_name: &str) {
        let Some(settings) = WebViewExt::settings(&self.webkit) else {
            return;
        };
        let user_agent = user_agent_with_application_name(&self.default_user_agent, application_name);
        settings.set_user_agent(Some(&user_agent));
    }

    pub fn go_back(&self) {
        self.webkit.go_back();
    }

    pub fn go_forward(&self) {
        self.webkit.go_forward();
    }

    pub fn reload(&self) {
        self.webkit.reload();
    }

    pub fn stop_loading(&self) {
        self.webkit.stop_loading();
    }

    pub fn get_all_cookies(&self) -> Vec<Cookie> {
        cookies::cookies_blocking(&self.webkit)
    }

    /// Queue `script` for evaluation. `reply` is answered exactly once.
    pub fn evaluate_javascript(&self, script: &str, reply: impl Into<EvalReply>) -> Submission {
        self.evaluator.submit(script, reply.into())
    }

    /// Queue `script` and wait for the result on a channel.
    pub fn evaluate(&self, script: &str) -> oneshot::Receiver<EvalOutcome> {
        self.evaluator.evaluate(script)
    }

    /// Handle for queueing scripts from other threads
    pub fn eval_sender(&self) -> EvalSender<EvalReply> {
        self.evaluator.sender()
    }
}

impl Drop for WebviewWindow {
    fn drop(&mut self) {
        self.evaluator.close();
    }
}

/// The application name is appended as given; callers supply any separator.
fn user_agent_with_application_name(default_user_agent: &str, application_name: &str) -> String {
    format!("{default_user_agent}{application_name}")
}

fn add_user_script(webkit: &webkit2gtk::WebView, script: &UserScript) {
    let Some(manager) = webkit.user_content_manager() else {
        tracing::warn!("Cannot add user script, no user content manager");
        return;
    };
    let frames = if script.for_all_frames {
        UserContentInjectedFrames::AllFrames
    } else {
        UserContentInjectedFrames::TopFrame
    };
    let time = match script.injection_time {
        InjectionTime::DocumentStart => UserScriptInjectionTime::Start,
        InjectionTime::DocumentEnd => UserScriptInjectionTime::End,
    };
    manager.add_script(&webkit2gtk::UserScript::new(&script.source, frames, time, &[], &[]));
}

#[allow(unsafe_code)]
fn destroy_window(window: &gtk::Window) {
    // SAFETY: called on the GTK thread; every Rust-side reference keeps the
    // GObject alive, only the widget is torn down. `close()` would be a
    // no-op for windows that were never realized (headless).
    unsafe { window.destroy() };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_application_name_is_appended_verbatim() {
        let default = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/605.1.15";
        assert_eq!(
            user_agent_with_application_name(default, " MyApp/1.0"),
            "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/605.1.15 MyApp/1.0"
        );
        assert_eq!(user_agent_with_application_name(default, "/x"), format!("{default}/x"));
        assert_eq!(user_agent_with_application_name(default, ""), default);
    }
}

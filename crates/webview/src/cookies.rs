//! Cookie snapshot for a webview's current page

use std::cell::RefCell;
use std::rc::Rc;

use desktop_webview_ipc::Cookie;
use gio::Cancellable;
use webkit2gtk::{CookieManagerExt, WebContextExt, WebViewExt};

/// Fetch the cookies WebKit would send to the view's current URI.
///
/// Blocks the caller by running a nested main loop until WebKit answers.
/// Failures are logged and produce an empty list.
pub fn cookies_blocking(webview: &webkit2gtk::WebView) -> Vec<Cookie> {
    let Some(uri) = webview.uri() else {
        tracing::debug!("No page loaded, no cookies to report");
        return Vec::new();
    };
    let Some(manager) = webview.context().and_then(|context| context.cookie_manager()) else {
        tracing::warn!("WebKit context has no cookie manager");
        return Vec::new();
    };

    let main_loop = glib::MainLoop::new(None, false);
    let slot = Rc::new(RefCell::new(None));
    {
        let slot = Rc::clone(&slot);
        let main_loop = main_loop.clone();
        manager.cookies(&uri, Cancellable::NONE, move |result| {
            *slot.borrow_mut() = Some(result);
            main_loop.quit();
        });
    }
    if slot.borrow().is_none() {
        main_loop.run();
    }

    let result = slot.borrow_mut().take();
    match result {
        Some(Ok(cookies)) => cookies.into_iter().map(cookie_from_soup).collect(),
        Some(Err(err)) => {
            tracing::warn!("Failed to get cookies for {}: {}", uri, err);
            Vec::new()
        }
        None => Vec::new(),
    }
}

fn cookie_from_soup(mut cookie: soup::Cookie) -> Cookie {
    let expires = cookie.expires().map(|date| date.to_unix() as f64);
    Cookie {
        name: text(cookie.name()),
        value: text(cookie.value()),
        domain: text(cookie.domain()),
        path: text(cookie.path()),
        expires: Cookie::expiry_from_seconds(expires),
        http_only: cookie.is_http_only(),
        secure: cookie.is_secure(),
        session_only: false,
    }
}

fn text(value: Option<glib::GString>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

//! `wry` adapter: runs the surface page inside a webview and wires both
//! directions of the bridge through it.

use std::rc::Rc;

use wry::{WebView, WebViewBuilder};

use crate::config::PageOptions;
use crate::error::BridgeError;
use crate::page::render_surface_page;
use crate::transport::{Mailbox, ScriptSink};

/// Host → surface: evaluates each message as a script call in the webview.
pub fn script_sink(
    webview: Rc<WebView>,
) -> ScriptSink<impl Fn(&str) -> Result<(), BridgeError>> {
    ScriptSink::new(move |js: &str| {
        webview
            .evaluate_script(js)
            .map_err(|err| BridgeError::Transport(err.to_string()))
    })
}

/// Surface → host: the page posts through `window.ipc`; raw bodies land in
/// `inbox` for the host to drain.
pub fn ipc_handler(inbox: Mailbox) -> impl Fn(http::Request<String>) + 'static {
    move |request: http::Request<String>| {
        let body = request.into_body();
        if body.is_empty() {
            tracing::warn!(target: "vayal::bridge", "ignoring empty ipc message");
            return;
        }
        inbox.push_raw(body);
    }
}

/// Loads the surface page seeded with `initial_html` and routes its
/// messages into `inbox`.
pub fn with_surface<'a>(
    builder: WebViewBuilder<'a>,
    initial_html: &str,
    options: &PageOptions,
    inbox: Mailbox,
) -> Result<WebViewBuilder<'a>, BridgeError> {
    let page = render_surface_page(initial_html, options)?;
    Ok(builder.with_html(page).with_ipc_handler(ipc_handler(inbox)))
}

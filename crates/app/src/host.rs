//! JSON-lines bridge between stdin/stdout and the GTK thread
//!
//! One reader thread turns stdin lines into method calls, one writer thread
//! serializes responses and events to stdout. The plugin itself only runs
//! on the GTK main loop.

use std::io::{BufRead, Write};
use std::thread;
use std::time::{Duration, Instant};

use desktop_webview::WebviewPlugin;
use desktop_webview_config::WindowConfig;
use desktop_webview_ipc::{MethodCall, MethodResult, PluginToHost};
use serde_json::Value;
use tokio::sync::mpsc;

/// How long shutdown waits for in-flight replies to reach stdout
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);
const SHUTDOWN_POLL: Duration = Duration::from_millis(10);

/// One parsed stdin line
#[derive(Debug, PartialEq)]
enum Inbound {
    Call(MethodCall),
    Malformed {
        call_id: Option<u64>,
        reason: String,
    },
    Blank,
}

fn parse_line(line: &str) -> Inbound {
    let line = line.trim();
    if line.is_empty() {
        return Inbound::Blank;
    }
    let value: Value = match serde_json::from_str(line) {
        Ok(value) => value,
        Err(err) => {
            return Inbound::Malformed {
                call_id: None,
                reason: err.to_string(),
            };
        }
    };
    let call_id = value.get("callId").and_then(Value::as_u64);
    match serde_json::from_value(value) {
        Ok(call) => Inbound::Call(call),
        Err(err) => Inbound::Malformed {
            call_id,
            reason: err.to_string(),
        },
    }
}

fn spawn_reader(
    calls: mpsc::UnboundedSender<MethodCall>,
    out: mpsc::UnboundedSender<PluginToHost>,
) -> std::io::Result<thread::JoinHandle<()>> {
    thread::Builder::new()
        .name("stdin-reader".into())
        .spawn(move || {
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                let line = match line {
                    Ok(line) => line,
                    Err(err) => {
                        tracing::error!("Failed to read stdin: {}", err);
                        break;
                    }
                };
                match parse_line(&line) {
                    Inbound::Call(call) => {
                        if calls.send(call).is_err() {
                            break;
                        }
                    }
                    Inbound::Malformed { call_id, reason } => {
                        tracing::warn!("Malformed method call: {}", reason);
                        if let Some(call_id) = call_id {
                            let result = MethodResult::error("invalid_arguments", reason);
                            let _ = out.send(PluginToHost::response(call_id, result));
                        }
                    }
                    Inbound::Blank => {}
                }
            }
            tracing::info!("stdin closed");
        })
}

/// Write every message as one JSON line until all senders are gone.
fn write_messages<W: Write>(out: &mut mpsc::UnboundedReceiver<PluginToHost>, sink: &mut W) {
    while let Some(message) = out.blocking_recv() {
        let line = match serde_json::to_string(&message) {
            Ok(line) => line,
            Err(err) => {
                tracing::error!("Failed to serialize message: {}", err);
                continue;
            }
        };
        if writeln!(sink, "{line}").and_then(|()| sink.flush()).is_err() {
            tracing::error!("stdout closed, stopping writer");
            break;
        }
    }
}

fn spawn_writer(
    mut out: mpsc::UnboundedReceiver<PluginToHost>,
) -> std::io::Result<thread::JoinHandle<()>> {
    thread::Builder::new()
        .name("stdout-writer".into())
        .spawn(move || {
            let stdout = std::io::stdout();
            write_messages(&mut out, &mut stdout.lock());
        })
}

/// Keep `pump` turning until the writer has flushed everything or `grace`
/// runs out. Returns whether the writer finished.
///
/// The writer only stops once every sender is dropped, and the last ones
/// belong to evaluations still waiting on the engine.
fn drain_writer(
    writer: &thread::JoinHandle<()>,
    grace: Duration,
    mut pump: impl FnMut() -> bool,
) -> bool {
    let deadline = Instant::now() + grace;
    while !writer.is_finished() {
        if Instant::now() >= deadline {
            return false;
        }
        if !pump() {
            thread::sleep(SHUTDOWN_POLL);
        }
    }
    true
}

/// Run the bridge until stdin reaches EOF. Must be called on the thread
/// that initialized GTK.
pub fn run(defaults: WindowConfig) -> std::io::Result<()> {
    let (call_tx, mut call_rx) = mpsc::unbounded_channel::<MethodCall>();
    let (out_tx, out_rx) = mpsc::unbounded_channel::<PluginToHost>();

    let writer = spawn_writer(out_rx)?;
    spawn_reader(call_tx, out_tx.clone())?;

    let plugin = WebviewPlugin::new(out_tx, defaults);
    glib::MainContext::default().spawn_local(async move {
        while let Some(call) = call_rx.recv().await {
            tracing::debug!("Call {}: {}", call.call_id, call.method);
            plugin.handle(call);
        }
        tracing::info!("Host disconnected, closing {} window(s)", plugin.window_count());
        plugin.close_all();
        gtk::main_quit();
    });

    tracing::info!("desktop-webview host ready");
    gtk::main();

    // The loop has quit but destroyed windows may still owe replies.
    let context = glib::MainContext::default();
    if drain_writer(&writer, SHUTDOWN_GRACE, || context.iteration(false)) {
        if writer.join().is_err() {
            tracing::error!("stdout writer panicked");
        }
    } else {
        tracing::warn!(
            "Discarding unanswered messages after {:?} shutdown grace",
            SHUTDOWN_GRACE
        );
    }
    Ok(())
}

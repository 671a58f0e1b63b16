//! desktop-webview host: drives native webview windows over stdin/stdout

mod config;
#[cfg(target_os = "linux")]
mod host;

use config::HostConfig;
use tracing_subscriber::EnvFilter;

fn main() {
    let config = HostConfig::from_env();

    // stdout carries the protocol, logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_new(&config.log_filter)
                .unwrap_or_else(|_| EnvFilter::new(config::DEFAULT_LOG_FILTER)),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!(
        "Starting desktop-webview host (headless: {})",
        config.headless
    );

    #[cfg(target_os = "linux")]
    {
        gtk::init().expect("Failed to initialize GTK");
        if let Err(err) = host::run(config.window_defaults()) {
            tracing::error!("Host bridge failed: {}", err);
            std::process::exit(1);
        }
    }

    #[cfg(not(target_os = "linux"))]
    {
        tracing::error!("desktop-webview only supports Linux (GTK/WebKitGTK)");
        std::process::exit(1);
    }
}

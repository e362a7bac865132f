//! hotplug-gateway server entry point.
//!
//! Starts the device observer, the broadcast hub and the Axum HTTP server
//! with REST and WebSocket endpoints.

use std::sync::Arc;

use anyhow::Context;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use hotplug_gateway::app::build_app;
use hotplug_gateway::app_state::AppState;
use hotplug_gateway::config::{GatewayConfig, LogFormat};
use hotplug_gateway::hub::ConnectionHub;
use hotplug_gateway::observer::{DeviceObserver, DeviceSource, UsbDeviceSource};
use hotplug_gateway::service::run_device_relay;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = GatewayConfig::from_env().context("loading configuration")?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match config.log_format {
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
        LogFormat::Json => tracing_subscriber::fmt().json().with_env_filter(filter).init(),
    }

    tracing::info!(
        addr = %config.listen_addr,
        poll_interval_ms = config.poll_interval.as_millis(),
        vendor_id = ?config.vendor_id,
        product_id = ?config.product_id,
        "starting hotplug-gateway"
    );

    let shutdown = CancellationToken::new();

    // Build broadcast hub and device observer
    let hub = ConnectionHub::spawn_with_capacity(config.write_timeout, config.queue_capacity);
    let source: Arc<dyn DeviceSource> = Arc::new(UsbDeviceSource::new());
    let observer = DeviceObserver::new(source)
        .with_poll_interval(config.poll_interval)
        .with_filter(config.device_filter());

    let relay = tokio::spawn(run_device_relay(
        observer.subscribe(),
        hub.clone(),
        shutdown.clone(),
    ));

    // Build application state and router
    let app_state = AppState {
        hub,
        observer,
        shutdown: shutdown.clone(),
    };
    let app = build_app(app_state, &config.static_dir, &config.index_file);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("binding {}", config.listen_addr))?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown.clone()))
        .await
        .context("serving HTTP")?;

    shutdown.cancel();
    if let Err(e) = relay.await {
        tracing::warn!(error = %e, "device relay task failed");
    }
    tracing::info!("hotplug-gateway stopped");

    Ok(())
}

/// Resolves on Ctrl-C, cancelling `shutdown` so background tasks stop too.
async fn shutdown_signal(shutdown: CancellationToken) {
    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                tracing::error!(error = %e, "failed to listen for ctrl-c");
            }
            tracing::info!("shutdown requested");
            shutdown.cancel();
        }
        () = shutdown.cancelled() => {}
    }
}

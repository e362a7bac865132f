//! Device relay: consumes observer events and broadcasts them.

use tokio_util::sync::CancellationToken;

use crate::domain::{BroadcastMessage, DeviceEvent};
use crate::hub::ConnectionHub;
use crate::observer::Subscription;

/// Forwards every device event from `subscription` to the hub.
///
/// Runs until the event stream ends or `shutdown` is cancelled, then shuts
/// the subscription down so the poll task is gone when this returns.
pub async fn run_device_relay(
    mut subscription: Subscription,
    hub: ConnectionHub,
    shutdown: CancellationToken,
) {
    loop {
        let event = tokio::select! {
            biased;
            () = shutdown.cancelled() => break,
            event = subscription.recv() => event,
        };
        let Some(event) = event else {
            tracing::warn!("device event stream ended");
            break;
        };
        relay_event(&hub, &event).await;
    }

    subscription.shutdown().await;
}

/// Logs one event and publishes its broadcast envelope, if it has one.
pub async fn relay_event(hub: &ConnectionHub, event: &DeviceEvent) {
    match event.device() {
        Some(device) => tracing::info!(
            event = event.kind_str(),
            path = %device.path,
            vendor_id = device.vendor_id,
            product_id = device.product_id,
            "device event"
        ),
        None => tracing::info!("device observer started"),
    }

    let Some(message) = BroadcastMessage::for_event(event) else {
        return;
    };
    match message.to_payload() {
        Ok(payload) => hub.publish(payload).await,
        Err(e) => tracing::warn!(error = %e, "could not encode device event"),
    }
}

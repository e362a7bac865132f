//! Polling change observer.
//!
//! [`DeviceObserver`] re-enumerates its [`DeviceSource`] on a fixed
//! interval and turns the difference between consecutive snapshots into
//! [`DeviceEvent`]s. Each call to [`DeviceObserver::subscribe`] starts an
//! independent background task.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::{DeviceSource, Subscription};
use crate::domain::{DeviceEvent, DeviceFilter, Snapshot};
use crate::error::GatewayError;

/// Poll interval used when none is configured.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Observes a device source and reports connect/disconnect changes.
#[derive(Debug, Clone)]
pub struct DeviceObserver {
    source: Arc<dyn DeviceSource>,
    poll_interval: Duration,
    filter: DeviceFilter,
}

impl DeviceObserver {
    /// Creates an observer with the default poll interval and no filter.
    #[must_use]
    pub fn new(source: Arc<dyn DeviceSource>) -> Self {
        Self {
            source,
            poll_interval: DEFAULT_POLL_INTERVAL,
            filter: DeviceFilter::any(),
        }
    }

    /// Sets the time between two snapshots.
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Only reports devices with this vendor ID.
    #[must_use]
    pub const fn with_vendor_id(mut self, vendor_id: u16) -> Self {
        self.filter = self.filter.with_vendor_id(vendor_id);
        self
    }

    /// Only reports devices with this product ID.
    #[must_use]
    pub const fn with_product_id(mut self, product_id: u16) -> Self {
        self.filter = self.filter.with_product_id(product_id);
        self
    }

    /// Replaces the whole filter.
    #[must_use]
    pub const fn with_filter(mut self, filter: DeviceFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Returns the configured poll interval.
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Returns the configured filter.
    #[must_use]
    pub const fn filter(&self) -> DeviceFilter {
        self.filter
    }

    /// Takes one filtered snapshot outside of any subscription.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Enumeration`] if the source fails.
    pub async fn snapshot(&self) -> Result<Snapshot, GatewayError> {
        take_snapshot(self.source.as_ref(), &self.filter).await
    }

    /// Starts polling in the background and returns the event stream.
    ///
    /// The first event is always [`DeviceEvent::Initial`]. If the very first
    /// enumeration fails the stream ends without any event.
    ///
    /// Must be called from within a Tokio runtime.
    #[must_use]
    pub fn subscribe(&self) -> Subscription {
        let (events, rx) = mpsc::channel(1);
        let cancel = CancellationToken::new();
        let worker = PollWorker {
            source: Arc::clone(&self.source),
            filter: self.filter,
            poll_interval: self.poll_interval,
            events,
            cancel: cancel.clone(),
        };
        let task = tokio::spawn(worker.run());
        Subscription::new(rx, cancel, task)
    }
}

async fn take_snapshot(
    source: &dyn DeviceSource,
    filter: &DeviceFilter,
) -> Result<Snapshot, GatewayError> {
    let devices = source.enumerate(filter).await?;
    Ok(devices.into_iter().filter(|d| filter.matches(d)).collect())
}

/// State owned by one subscription's background task.
struct PollWorker {
    source: Arc<dyn DeviceSource>,
    filter: DeviceFilter,
    poll_interval: Duration,
    events: mpsc::Sender<DeviceEvent>,
    cancel: CancellationToken,
}

impl PollWorker {
    async fn run(self) {
        let mut previous = match self.snapshot().await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::warn!(error = %e, "initial device enumeration failed, ending subscription");
                return;
            }
        };
        tracing::debug!(devices = previous.len(), "initial device snapshot taken");

        if !self.emit(DeviceEvent::Initial).await {
            return;
        }

        loop {
            tokio::select! {
                biased;
                () = self.cancel.cancelled() => {
                    tracing::debug!("device subscription cancelled");
                    return;
                }
                () = tokio::time::sleep(self.poll_interval) => {}
            }

            let current = match self.snapshot().await {
                Ok(snapshot) => snapshot,
                Err(e) => {
                    tracing::warn!(error = %e, "device enumeration failed, ending subscription");
                    return;
                }
            };

            for event in previous.diff(&current) {
                if !self.emit(event).await {
                    return;
                }
            }
            previous = current;
        }
    }

    async fn snapshot(&self) -> Result<Snapshot, GatewayError> {
        take_snapshot(self.source.as_ref(), &self.filter).await
    }

    /// Hands one event to the consumer and waits until it has been taken.
    /// Returns `false` when the task must stop (cancelled, or the receiver
    /// is gone).
    async fn emit(&self, event: DeviceEvent) -> bool {
        tokio::select! {
            biased;
            () = self.cancel.cancelled() => false,
            accepted = self.hand_off(event) => accepted,
        }
    }

    async fn hand_off(&self, event: DeviceEvent) -> bool {
        if self.events.send(event).await.is_err() {
            tracing::debug!("device event receiver dropped");
            return false;
        }
        // The only slot frees up once the consumer has received the event.
        match self.events.reserve().await {
            Ok(_permit) => true,
            Err(_) => {
                tracing::debug!("device event receiver dropped");
                false
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use tokio::sync::Mutex;

    use super::*;
    use crate::domain::DeviceDescriptor;

    const INTERVAL: Duration = Duration::from_secs(1);

    /// Replays a fixed list of enumeration results, then keeps returning
    /// the last successful one.
    #[derive(Debug, Default)]
    struct ScriptedSource {
        script: Mutex<VecDeque<Result<Vec<DeviceDescriptor>, String>>>,
        last: Mutex<Vec<DeviceDescriptor>>,
        calls: AtomicUsize,
    }

    impl ScriptedSource {
        fn new(script: Vec<Result<Vec<DeviceDescriptor>, String>>) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(script.into()),
                ..Self::default()
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl DeviceSource for ScriptedSource {
        async fn enumerate(
            &self,
            _filter: &DeviceFilter,
        ) -> Result<Vec<DeviceDescriptor>, GatewayError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let next = self.script.lock().await.pop_front();
            match next {
                Some(Ok(devices)) => {
                    *self.last.lock().await = devices.clone();
                    Ok(devices)
                }
                Some(Err(message)) => Err(GatewayError::Enumeration(message)),
                None => Ok(self.last.lock().await.clone()),
            }
        }
    }

    fn dev(path: &str) -> DeviceDescriptor {
        DeviceDescriptor::new(path, 0x2020, 0x2020)
    }

    fn observer(source: &Arc<ScriptedSource>) -> DeviceObserver {
        let source: Arc<dyn DeviceSource> = Arc::clone(source) as Arc<dyn DeviceSource>;
        DeviceObserver::new(source).with_poll_interval(INTERVAL)
    }

    #[tokio::test(start_paused = true)]
    async fn scenario_a_new_device_is_reported() {
        let source = ScriptedSource::new(vec![
            Ok(vec![dev("A")]),
            Ok(vec![dev("A"), DeviceDescriptor::new("X", 0x1111, 0x2020), dev("B")]),
        ]);
        let mut sub = observer(&source)
            .with_vendor_id(0x2020)
            .with_product_id(0x2020)
            .subscribe();

        assert_eq!(sub.recv().await, Some(DeviceEvent::Initial));
        assert_eq!(sub.recv().await, Some(DeviceEvent::Connected(dev("B"))));

        sub.cancel();
        assert_eq!(sub.recv().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn scenario_b_removed_device_is_reported() {
        let source = ScriptedSource::new(vec![Ok(vec![dev("A")]), Ok(vec![])]);
        let mut sub = observer(&source).subscribe();

        assert_eq!(sub.recv().await, Some(DeviceEvent::Initial));
        assert_eq!(sub.recv().await, Some(DeviceEvent::Disconnected(dev("A"))));
    }

    #[tokio::test(start_paused = true)]
    async fn scenario_c_enumeration_failure_ends_stream() {
        let source = ScriptedSource::new(vec![
            Ok(vec![dev("A")]),
            Err("device busy".to_string()),
        ]);
        let mut sub = observer(&source).subscribe();

        assert_eq!(sub.recv().await, Some(DeviceEvent::Initial));
        assert_eq!(sub.recv().await, None);
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn initial_failure_sends_nothing() {
        let source = ScriptedSource::new(vec![Err("no backend".to_string())]);
        let mut sub = observer(&source).subscribe();

        assert_eq!(sub.recv().await, None);
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn empty_initial_snapshot_still_emits_initial() {
        let source = ScriptedSource::new(vec![Ok(vec![]), Ok(vec![dev("A")])]);
        let mut sub = observer(&source).subscribe();

        assert_eq!(sub.recv().await, Some(DeviceEvent::Initial));
        assert_eq!(sub.recv().await, Some(DeviceEvent::Connected(dev("A"))));
    }

    #[tokio::test(start_paused = true)]
    async fn flapping_device_is_not_coalesced() {
        let source = ScriptedSource::new(vec![
            Ok(vec![dev("A")]),
            Ok(vec![]),
            Ok(vec![dev("A")]),
        ]);
        let mut sub = observer(&source).subscribe();

        assert_eq!(sub.recv().await, Some(DeviceEvent::Initial));
        assert_eq!(sub.recv().await, Some(DeviceEvent::Disconnected(dev("A"))));
        assert_eq!(sub.recv().await, Some(DeviceEvent::Connected(dev("A"))));
    }

    #[tokio::test(start_paused = true)]
    async fn tick_emits_disconnects_before_connects() {
        let source = ScriptedSource::new(vec![
            Ok(vec![dev("A"), dev("B")]),
            Ok(vec![dev("C"), dev("B"), dev("D")]),
        ]);
        let mut sub = observer(&source).subscribe();

        assert_eq!(sub.recv().await, Some(DeviceEvent::Initial));
        assert_eq!(sub.recv().await, Some(DeviceEvent::Disconnected(dev("A"))));
        assert_eq!(sub.recv().await, Some(DeviceEvent::Connected(dev("C"))));
        assert_eq!(sub.recv().await, Some(DeviceEvent::Connected(dev("D"))));
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_stops_polling_within_one_interval() {
        let source = ScriptedSource::new(vec![Ok(vec![dev("A")])]);
        let mut sub = observer(&source).subscribe();
        assert_eq!(sub.recv().await, Some(DeviceEvent::Initial));

        sub.cancel();
        assert_eq!(sub.recv().await, None);

        let stopped = tokio::time::timeout(INTERVAL, sub.shutdown()).await;
        assert!(stopped.is_ok());

        let calls = source.calls();
        tokio::time::sleep(INTERVAL * 5).await;
        assert_eq!(source.calls(), calls);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_consumer_throttles_polling() {
        let source = ScriptedSource::new(vec![
            Ok(vec![]),
            Ok(vec![dev("A")]),
            Ok(vec![dev("A"), dev("B")]),
        ]);
        let mut sub = observer(&source).subscribe();

        // Nobody has taken Initial yet, so the source is not polled again.
        tokio::time::sleep(INTERVAL * 10).await;
        assert_eq!(source.calls(), 1);

        assert_eq!(sub.recv().await, Some(DeviceEvent::Initial));
        assert_eq!(sub.recv().await, Some(DeviceEvent::Connected(dev("A"))));
        assert_eq!(sub.recv().await, Some(DeviceEvent::Connected(dev("B"))));
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_subscription_stops_task() {
        let source = ScriptedSource::new(vec![Ok(vec![]), Ok(vec![dev("A")])]);
        let sub = observer(&source).subscribe();
        drop(sub);

        tokio::time::sleep(INTERVAL * 5).await;
        assert!(source.calls() <= 1);
    }

    #[tokio::test]
    async fn repeated_snapshots_are_equal() {
        let source = ScriptedSource::new(vec![
            Ok(vec![dev("A"), dev("B")]),
            Ok(vec![dev("B"), dev("A")]),
        ]);
        let observer = observer(&source).with_vendor_id(0x2020);

        let Ok(first) = observer.snapshot().await else {
            panic!("first snapshot failed");
        };
        let Ok(second) = observer.snapshot().await else {
            panic!("second snapshot failed");
        };
        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn resubscribing_to_unchanged_devices_reports_no_change() {
        let source = ScriptedSource::new(vec![
            Ok(vec![dev("A"), dev("B")]),
            Ok(vec![dev("B"), dev("A")]),
        ]);
        let observer = observer(&source);

        let mut first = observer.subscribe();
        assert_eq!(first.recv().await, Some(DeviceEvent::Initial));
        first.shutdown().await;

        let mut second = observer.subscribe();
        assert_eq!(second.recv().await, Some(DeviceEvent::Initial));
        let quiet = tokio::time::timeout(INTERVAL * 5, second.recv()).await;
        assert!(quiet.is_err());
        assert!(source.calls() >= 4);
    }

    #[test]
    fn builder_sets_filter_and_interval() {
        let source: Arc<dyn DeviceSource> = ScriptedSource::new(vec![]);
        let observer = DeviceObserver::new(source)
            .with_poll_interval(Duration::from_millis(250))
            .with_vendor_id(1)
            .with_product_id(2);
        assert_eq!(observer.poll_interval(), Duration::from_millis(250));
        assert_eq!(
            observer.filter(),
            DeviceFilter::any().with_vendor_id(1).with_product_id(2)
        );
    }

    #[test]
    fn default_interval_is_one_second() {
        let source: Arc<dyn DeviceSource> = ScriptedSource::new(vec![]);
        assert_eq!(
            DeviceObserver::new(source).poll_interval(),
            Duration::from_secs(1)
        );
    }
}

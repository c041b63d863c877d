//! UdpFixPublisher - fire-and-forget location telemetry
//!
//! Location adapters hand every fix to `on_fix`, which only tries to enqueue.
//! A background task serializes queued fixes to JSON and sends one datagram
//! per fix. A slow or unreachable receiver never delays logging.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_channel::{Receiver, Sender, TrySendError};
use contracts::{DropPolicy, FixObserver, LocationFix, TelemetryConfig};
use serde::Serialize;
use tokio::net::UdpSocket;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, trace, warn};

use crate::error::{DispatcherError, Result};

/// Datagram body
#[derive(Debug, Serialize)]
struct FixDatagram<'a> {
    latitude: String,
    longitude: String,
    provider: &'a str,
    time_millis: i64,
}

impl<'a> FixDatagram<'a> {
    fn from_fix(fix: &'a LocationFix) -> Self {
        Self {
            latitude: format!("{:.8}", fix.latitude),
            longitude: format!("{:.8}", fix.longitude),
            provider: &fix.provider,
            time_millis: fix.time_millis,
        }
    }
}

/// Counters of the publisher
#[derive(Debug, Default)]
struct PublisherStats {
    queued: AtomicU64,
    sent: AtomicU64,
    dropped: AtomicU64,
    send_errors: AtomicU64,
}

/// Snapshot of the publisher counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TelemetryStats {
    pub queued: u64,
    pub sent: u64,
    pub dropped: u64,
    pub send_errors: u64,
}

/// Sends every location fix as a JSON datagram to a fixed address
pub struct UdpFixPublisher {
    target: SocketAddr,
    tx: Sender<LocationFix>,
    /// Second receiver handle, used to evict the oldest queued fix
    evict: Receiver<LocationFix>,
    drop_policy: DropPolicy,
    stats: Arc<PublisherStats>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl UdpFixPublisher {
    /// Bind a local socket, connect it to `config.addr` and spawn the sender task
    #[instrument(name = "udp_fix_publisher_spawn", skip(config), fields(addr = %config.addr))]
    pub async fn spawn(config: &TelemetryConfig) -> Result<Self> {
        let target = tokio::net::lookup_host(&config.addr)
            .await
            .map_err(|e| DispatcherError::telemetry(&config.addr, e.to_string()))?
            .next()
            .ok_or_else(|| DispatcherError::telemetry(&config.addr, "address did not resolve"))?;

        let bind_addr = if target.is_ipv4() { "0.0.0.0:0" } else { "[::]:0" };
        let socket = UdpSocket::bind(bind_addr)
            .await
            .map_err(|e| DispatcherError::telemetry(&config.addr, e.to_string()))?;
        socket
            .connect(target)
            .await
            .map_err(|e| DispatcherError::telemetry(&config.addr, e.to_string()))?;

        let (tx, rx) = async_channel::bounded(config.queue_capacity.max(1));
        let stats = Arc::new(PublisherStats::default());
        let task = tokio::spawn(publish_loop(socket, rx.clone(), Arc::clone(&stats)));

        info!(target = %target, capacity = config.queue_capacity, "UdpFixPublisher started");
        Ok(Self {
            target,
            tx,
            evict: rx,
            drop_policy: config.drop_policy,
            stats,
            task: Mutex::new(Some(task)),
        })
    }

    pub fn target(&self) -> SocketAddr {
        self.target
    }

    pub fn stats(&self) -> TelemetryStats {
        TelemetryStats {
            queued: self.stats.queued.load(Ordering::Relaxed),
            sent: self.stats.sent.load(Ordering::Relaxed),
            dropped: self.stats.dropped.load(Ordering::Relaxed),
            send_errors: self.stats.send_errors.load(Ordering::Relaxed),
        }
    }

    /// Stop accepting fixes, send what is queued, then end the task
    #[instrument(name = "udp_fix_publisher_shutdown", skip(self), fields(target = %self.target))]
    pub async fn shutdown(&self) {
        self.tx.close();
        let task = self
            .task
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        if let Some(task) = task {
            if let Err(e) = task.await {
                warn!(error = ?e, "Telemetry task panicked");
            }
        }
        let stats = self.stats();
        info!(sent = stats.sent, dropped = stats.dropped, "UdpFixPublisher stopped");
    }

    fn drop_one(&self) {
        self.stats.dropped.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("sensor_logger_telemetry_dropped_total").increment(1);
    }
}

impl FixObserver for UdpFixPublisher {
    fn on_fix(&self, fix: &LocationFix) {
        match self.tx.try_send(fix.clone()) {
            Ok(()) => {
                self.stats.queued.fetch_add(1, Ordering::Relaxed);
            }
            Err(TrySendError::Full(fix)) => match self.drop_policy {
                DropPolicy::DropNewest => {
                    trace!("Telemetry queue full, dropping newest fix");
                    self.drop_one();
                }
                DropPolicy::DropOldest => {
                    if self.evict.try_recv().is_ok() {
                        self.drop_one();
                    }
                    match self.tx.try_send(fix) {
                        Ok(()) => {
                            self.stats.queued.fetch_add(1, Ordering::Relaxed);
                        }
                        Err(_) => self.drop_one(),
                    }
                }
            },
            Err(TrySendError::Closed(_)) => {
                trace!("Telemetry stopped, fix ignored");
            }
        }
    }
}

async fn publish_loop(socket: UdpSocket, rx: Receiver<LocationFix>, stats: Arc<PublisherStats>) {
    while let Ok(fix) = rx.recv().await {
        let payload = match serde_json::to_vec(&FixDatagram::from_fix(&fix)) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(error = %e, "Fix serialization failed");
                continue;
            }
        };
        match socket.send(&payload).await {
            Ok(sent) => {
                stats.sent.fetch_add(1, Ordering::Relaxed);
                debug!(bytes = sent, provider = %fix.provider, "Fix sent");
            }
            Err(e) => {
                // UDP is best-effort
                stats.send_errors.fetch_add(1, Ordering::Relaxed);
                warn!(error = %e, "Fix datagram send failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn fix(lat: f64) -> LocationFix {
        LocationFix {
            provider: "gps".into(),
            latitude: lat,
            longitude: 24.93545,
            altitude: None,
            speed: None,
            accuracy: Some(3.9),
            bearing: None,
            time_millis: 1_700_000_000_000,
            speed_accuracy_mps: None,
            bearing_accuracy_deg: None,
            elapsed_realtime_nanos: 1,
            vertical_accuracy_m: None,
            elapsed_realtime_uncertainty_nanos: None,
        }
    }

    #[test]
    fn datagram_uses_eight_decimal_strings() {
        let fix = fix(60.16952);
        let json = serde_json::to_value(FixDatagram::from_fix(&fix)).unwrap();
        assert_eq!(json["latitude"], "60.16952000");
        assert_eq!(json["longitude"], "24.93545000");
        assert_eq!(json["provider"], "gps");
    }

    #[tokio::test]
    async fn sends_fixes_to_receiver() {
        let receiver = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let config = TelemetryConfig {
            addr: receiver.local_addr().unwrap().to_string(),
            queue_capacity: 8,
            drop_policy: DropPolicy::DropOldest,
        };
        let publisher = UdpFixPublisher::spawn(&config).await.unwrap();

        publisher.on_fix(&fix(1.0));

        let mut buf = [0u8; 512];
        let n = tokio::time::timeout(Duration::from_secs(2), receiver.recv(&mut buf))
            .await
            .unwrap()
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&buf[..n]).unwrap();
        assert_eq!(json["latitude"], "1.00000000");

        publisher.shutdown().await;
        assert_eq!(publisher.stats().sent, 1);
    }

    #[tokio::test]
    async fn unresolvable_address_is_an_error() {
        let config = TelemetryConfig {
            addr: "not an address".into(),
            queue_capacity: 8,
            drop_policy: DropPolicy::DropNewest,
        };
        assert!(matches!(
            UdpFixPublisher::spawn(&config).await,
            Err(DispatcherError::Telemetry { .. })
        ));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn full_queue_applies_drop_policy() {
        let receiver = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let config = TelemetryConfig {
            addr: receiver.local_addr().unwrap().to_string(),
            queue_capacity: 2,
            drop_policy: DropPolicy::DropNewest,
        };
        let publisher = UdpFixPublisher::spawn(&config).await.unwrap();

        // the sender task cannot run before the next await on this runtime
        for i in 0..5 {
            publisher.on_fix(&fix(i as f64));
        }
        let stats = publisher.stats();
        assert_eq!(stats.queued, 2);
        assert_eq!(stats.dropped, 3);

        publisher.shutdown().await;
    }
}

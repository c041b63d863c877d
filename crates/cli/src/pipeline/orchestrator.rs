//! Pipeline orchestrator - runs one logging session to completion.
//!
//! The platform is either the simulated phone or a replay of recorded raw
//! events. The session stops on the shutdown signal, after the configured
//! duration, when a replay ends, or when the log destination fails.

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use contracts::{SensorPlatform, SessionBlueprint};
use observability::{record_adapter_status, record_sink_metrics, SessionMetricsAggregator};
use platform_sim::{DeviceProfile, ReplayConfig, ReplayPlatform, SimulatedDevice};
use session::SessionHandle;
use tracing::{debug, info, warn};

use super::{PipelineStats, StopReason};

/// How often a running replay is checked for completion
const REPLAY_POLL: Duration = Duration::from_millis(100);

/// Source of raw events
#[derive(Debug, Clone)]
pub enum PlatformSource {
    /// Simulated phone with the standard sensor set
    Simulated,
    /// Recorded raw events (JSONL)
    Replay { path: PathBuf, speed: f64 },
}

/// Pipeline configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub blueprint: SessionBlueprint,

    /// Stop after this long (None = until shutdown)
    pub duration: Option<Duration>,

    pub source: PlatformSource,

    /// Time between status samples
    pub status_interval: Duration,
}

/// Main pipeline orchestrator
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Run the session until a stop condition; `shutdown` resolves on a user request
    pub async fn run<F>(self, shutdown: F) -> Result<PipelineStats>
    where
        F: Future<Output = ()>,
    {
        let start_time = Instant::now();
        let blueprint = &self.config.blueprint;

        let (platform, replay): (Arc<dyn SensorPlatform>, Option<Arc<ReplayPlatform>>) =
            match &self.config.source {
                PlatformSource::Simulated => {
                    info!("Using simulated phone");
                    (Arc::new(SimulatedDevice::new(DeviceProfile::typical_phone())), None)
                }
                PlatformSource::Replay { path, speed } => {
                    let replay = Arc::new(
                        ReplayPlatform::load(
                            path,
                            ReplayConfig {
                                speed_multiplier: *speed,
                            },
                        )
                        .with_context(|| format!("Failed to load replay {}", path.display()))?,
                    );
                    (replay.clone(), Some(replay))
                }
            };

        let handle = session::start_session(blueprint, platform)
            .await
            .context("Failed to start session")?;
        report_start(&handle);

        let playback = replay.as_ref().map(|r| r.play());

        let mut aggregator = SessionMetricsAggregator::new();
        let mut status_tick = tokio::time::interval(self.config.status_interval);
        status_tick.tick().await;
        let mut replay_tick = tokio::time::interval(REPLAY_POLL);

        let deadline = async {
            match self.config.duration {
                Some(duration) => tokio::time::sleep(duration).await,
                None => std::future::pending::<()>().await,
            }
        };
        tokio::pin!(deadline);
        tokio::pin!(shutdown);

        let stop_reason = loop {
            tokio::select! {
                _ = &mut shutdown => break StopReason::Signal,
                _ = &mut deadline => break StopReason::Duration,
                err = handle.sink_failed() => break StopReason::SinkFailed(err.to_string()),
                _ = status_tick.tick() => {
                    sample_status(&handle, start_time, &mut aggregator);
                }
                _ = replay_tick.tick(), if playback.is_some() => {
                    if playback.as_ref().is_some_and(|p| p.is_finished()) {
                        break StopReason::ReplayFinished;
                    }
                }
            }
        };
        info!(reason = %stop_reason, "Stopping session");

        if let Some(playback) = playback {
            let delivered = playback.stop();
            debug!(delivered, "Replay stopped");
        }

        sample_status(&handle, start_time, &mut aggregator);
        // a failed sink has already stopped the session
        let report = match session::stop_session(&handle).await {
            Some(report) => Some(report),
            None => handle.final_report().await,
        };

        Ok(PipelineStats {
            duration: start_time.elapsed(),
            stop_reason,
            output_path: handle.output_path().map(|p| p.to_path_buf()),
            start: handle.start_summary().clone(),
            report,
            telemetry: handle.telemetry_stats(),
            recent_lines: handle.recent_lines(),
            metrics: aggregator,
        })
    }
}

fn report_start(handle: &SessionHandle) {
    let summary = handle.start_summary();
    info!(
        registered = summary.registered.len(),
        unavailable = summary.unavailable.len(),
        disabled = summary.disabled.len(),
        failed = summary.failed.len(),
        "Session started"
    );
    for tag in &summary.unavailable {
        warn!(tag = %tag, "Sensor not present on this device");
    }
    for (tag, err) in &summary.failed {
        if err.is_permission_denied() {
            warn!(tag = %tag, error = %err, "Permission denied; grant it and restart the session");
        } else {
            warn!(tag = %tag, error = %err, "Registration failed");
        }
    }
}

fn sample_status(handle: &SessionHandle, start_time: Instant, aggregator: &mut SessionMetricsAggregator) {
    let status = handle.status();
    record_sink_metrics("log", &status.sink);
    for adapter in &status.adapters {
        record_adapter_status(adapter);
    }
    aggregator.update(start_time.elapsed(), &status.adapters, &status.sink);

    let records: u64 = status.adapters.iter().map(|a| a.record_count).sum();
    info!(
        state = %status.state,
        registered = status.registered_count(),
        records,
        written = status.sink.lines_written,
        queued = status.sink.pending,
        "Status"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{AdapterConfig, SensorKind};

    fn blueprint(dir: &std::path::Path) -> SessionBlueprint {
        let mut blueprint = SessionBlueprint::default_android();
        blueprint.session.output_dir = dir.to_path_buf();
        blueprint.sensors = vec![
            AdapterConfig::new(SensorKind::Accelerometer).with_sampling_period_us(5_000),
            AdapterConfig::new(SensorKind::Bluetooth),
        ];
        blueprint
    }

    #[tokio::test]
    async fn simulated_session_runs_for_duration() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = Pipeline::new(PipelineConfig {
            blueprint: blueprint(dir.path()),
            duration: Some(Duration::from_millis(200)),
            source: PlatformSource::Simulated,
            status_interval: Duration::from_millis(50),
        });

        let stats = pipeline.run(std::future::pending()).await.unwrap();
        assert!(matches!(stats.stop_reason, StopReason::Duration));
        assert_eq!(stats.start.registered.len(), 2);

        let report = stats.report.unwrap();
        assert!(report.failure.is_none());
        assert!(report.written > 0);

        let text = std::fs::read_to_string(stats.output_path.unwrap()).unwrap();
        assert!(text.lines().any(|l| l.starts_with("ACC,")));
    }

    #[tokio::test]
    async fn replay_session_stops_at_end_of_recording() {
        let dir = tempfile::tempdir().unwrap();
        let recording = dir.path().join("walk.jsonl");
        std::fs::write(
            &recording,
            r#"{"offset_ms":0,"event":{"sensor":{"sensor_type":"accelerometer","sensor_name":"","timestamp_nanos":1,"values":[0.1,0.2,9.8],"accuracy":3}}}
{"offset_ms":5,"event":{"sensor":{"sensor_type":"accelerometer","sensor_name":"","timestamp_nanos":2,"values":[0.1,0.2,9.7],"accuracy":3}}}
"#,
        )
        .unwrap();

        let pipeline = Pipeline::new(PipelineConfig {
            blueprint: blueprint(dir.path()),
            duration: Some(Duration::from_secs(10)),
            source: PlatformSource::Replay {
                path: recording,
                speed: 0.0,
            },
            status_interval: Duration::from_secs(1),
        });

        let stats = pipeline.run(std::future::pending()).await.unwrap();
        assert!(matches!(stats.stop_reason, StopReason::ReplayFinished));
        // the recording has no BLE scans
        assert_eq!(stats.start.unavailable.len(), 1);

        let text = std::fs::read_to_string(stats.output_path.unwrap()).unwrap();
        assert_eq!(text.lines().filter(|l| l.starts_with("ACC,")).count(), 2);
    }

    #[tokio::test]
    async fn shutdown_signal_stops_the_session() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = Pipeline::new(PipelineConfig {
            blueprint: blueprint(dir.path()),
            duration: None,
            source: PlatformSource::Simulated,
            status_interval: Duration::from_secs(1),
        });

        let stats = pipeline
            .run(tokio::time::sleep(Duration::from_millis(50)))
            .await
            .unwrap();
        assert!(matches!(stats.stop_reason, StopReason::Signal));
        assert!(stats.report.is_some());
    }
}

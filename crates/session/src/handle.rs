//! Host-facing session API

use std::path::{Path, PathBuf};
use std::sync::Arc;

use contracts::{FixObserver, LogDestination, SensorPlatform, SessionBlueprint, SinkError};
use dispatcher::{FileDestination, SinkReport, TelemetryStats, UdpFixPublisher};
use tokio::sync::Notify;
use tracing::{info, instrument, warn};

use crate::controller::{SessionController, SessionOptions};
use crate::error::{Result, SessionError};
use crate::status::{SessionState, SessionStatus, StartSummary};

/// Running session as seen by the host
#[derive(Clone)]
pub struct SessionHandle {
    controller: Arc<SessionController>,
    telemetry: Option<Arc<UdpFixPublisher>>,
    output_path: Option<PathBuf>,
    summary: Arc<StartSummary>,
    /// Releases the sink failure watcher after a host stop
    stopped: Arc<Notify>,
}

impl SessionHandle {
    pub fn controller(&self) -> &SessionController {
        &self.controller
    }

    /// Log file of the session, when it writes to one
    pub fn output_path(&self) -> Option<&Path> {
        self.output_path.as_deref()
    }

    pub fn start_summary(&self) -> &StartSummary {
        &self.summary
    }

    pub fn status(&self) -> SessionStatus {
        self.controller.status()
    }

    pub fn recent_lines(&self) -> Vec<String> {
        self.controller.recent_lines()
    }

    pub fn telemetry_stats(&self) -> Option<TelemetryStats> {
        self.telemetry.as_ref().map(|publisher| publisher.stats())
    }

    /// Resolves once the log destination failed
    ///
    /// The session stops itself on failure; this only lets the host react.
    pub async fn sink_failed(&self) -> SinkError {
        self.controller.sink_failed().await
    }

    /// Stop the session; later calls return `None`
    pub async fn stop(&self) -> Option<SinkReport> {
        let report = finalize(&self.controller, self.telemetry.as_deref()).await;
        self.stopped.notify_one();
        report
    }

    /// Report of the closed sink, whoever stopped the session
    pub async fn final_report(&self) -> Option<SinkReport> {
        match self.controller.state() {
            SessionState::Stopped => Some(self.controller.sink().close().await),
            _ => None,
        }
    }
}

async fn finalize(
    controller: &SessionController,
    telemetry: Option<&UdpFixPublisher>,
) -> Option<SinkReport> {
    let report = controller.stop().await;
    if report.is_some() {
        if let Some(publisher) = telemetry {
            publisher.shutdown().await;
        }
    }
    report
}

/// Stop the session when the sink hits a fatal write error
async fn watch_sink_failure(
    controller: Arc<SessionController>,
    telemetry: Option<Arc<UdpFixPublisher>>,
    stopped: Arc<Notify>,
) {
    tokio::select! {
        err = controller.sink_failed() => {
            warn!(error = %err, "log destination failed, stopping session");
            finalize(&controller, telemetry.as_deref()).await;
        }
        _ = stopped.notified() => {}
    }
}

/// Open `<prefix>_<yyyyMMdd_HHmmss>.csv` in the configured directory and start logging
///
/// # Errors
/// The log file cannot be created or the telemetry socket cannot be set up.
#[instrument(name = "start_session", skip(blueprint, platform), fields(dir = %blueprint.session.output_dir.display()))]
pub async fn start_session(
    blueprint: &SessionBlueprint,
    platform: Arc<dyn SensorPlatform>,
) -> Result<SessionHandle> {
    let dir = &blueprint.session.output_dir;
    let destination = FileDestination::create_in(dir, &blueprint.session.file_prefix)
        .map_err(|e| SessionError::output(dir, e))?;
    let path = destination.path().to_path_buf();

    let mut handle = start_session_with(blueprint, platform, destination, SessionOptions::default()).await?;
    info!(path = %path.display(), "Logging to file");
    handle.output_path = Some(path);
    Ok(handle)
}

/// Start a session writing to any destination
///
/// Telemetry from the blueprint is attached unless `options` already carries
/// a fix observer.
pub async fn start_session_with<D: LogDestination + Send + 'static>(
    blueprint: &SessionBlueprint,
    platform: Arc<dyn SensorPlatform>,
    destination: D,
    mut options: SessionOptions,
) -> Result<SessionHandle> {
    let mut telemetry = None;
    if let (Some(config), None) = (&blueprint.telemetry, &options.fix_observer) {
        let publisher = Arc::new(UdpFixPublisher::spawn(config).await?);
        options.fix_observer = Some(publisher.clone() as Arc<dyn FixObserver>);
        telemetry = Some(publisher);
    }
    options.recent_capacity = blueprint.session.recent_capacity;

    let controller = Arc::new(SessionController::new(
        &blueprint.sensors,
        platform,
        destination,
        options,
    ));
    let summary = match controller.start().await {
        Ok(summary) => summary,
        Err(err) => {
            if let Some(publisher) = &telemetry {
                publisher.shutdown().await;
            }
            return Err(err);
        }
    };

    let stopped = Arc::new(Notify::new());
    tokio::spawn(watch_sink_failure(
        controller.clone(),
        telemetry.clone(),
        stopped.clone(),
    ));

    Ok(SessionHandle {
        controller,
        telemetry,
        output_path: None,
        summary: Arc::new(summary),
        stopped,
    })
}

/// Stop a session started by `start_session`
pub async fn stop_session(handle: &SessionHandle) -> Option<SinkReport> {
    handle.stop().await
}

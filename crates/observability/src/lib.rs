//! # Observability
//!
//! Log output and Prometheus gauges for logging sessions.
//!
//! Diagnostics always go to stderr; stdout belongs to command output and the
//! CSV log never sees a diagnostic line.
//!
//! ```ignore
//! observability::init_with_config(ObservabilityConfig::from_verbosity(1, false))?;
//!
//! let status = handle.status();
//! observability::record_sink_metrics("csv", &status.sink);
//! for adapter in &status.adapters {
//!     observability::record_adapter_status(adapter);
//! }
//! ```

pub mod metrics;

use anyhow::{Context, Result};
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing::Subscriber;
use tracing_subscriber::{
    fmt, layer::SubscriberExt, registry::LookupSpan, util::SubscriberInitExt, EnvFilter, Layer,
};

pub use self::metrics::{
    record_adapter_status, record_sink_metrics, MetricsSummary, RunningStats,
    SessionMetricsAggregator, StatsSummary,
};

/// Compact logs at `info`, no exporter
pub fn init() -> Result<()> {
    init_with_config(ObservabilityConfig::default())
}

#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    pub log_format: LogFormat,
    /// Prometheus listener port (None = no exporter)
    pub metrics_port: Option<u16>,
    /// Filter used when `RUST_LOG` is unset
    pub default_log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self::from_verbosity(0, false)
    }
}

impl ObservabilityConfig {
    /// Map `-q` / `-v` / `-vv` to a default filter
    pub fn from_verbosity(verbose: u8, quiet: bool) -> Self {
        let level = match (quiet, verbose) {
            (true, _) => "warn",
            (false, 0) => "info",
            (false, 1) => "debug",
            (false, _) => "trace",
        };
        Self {
            log_format: LogFormat::Compact,
            metrics_port: None,
            default_log_level: level.to_string(),
        }
    }

    pub fn with_log_format(mut self, format: LogFormat) -> Self {
        self.log_format = format;
        self
    }

    pub fn with_metrics_port(mut self, port: u16) -> Self {
        self.metrics_port = Some(port);
        self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// One JSON object per event
    Json,
    Pretty,
    #[default]
    Compact,
}

impl std::str::FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "pretty" => Ok(Self::Pretty),
            "compact" => Ok(Self::Compact),
            other => anyhow::bail!("unknown log format '{other}' (expected json, pretty or compact)"),
        }
    }
}

fn stderr_layer<S>(format: LogFormat) -> Box<dyn Layer<S> + Send + Sync>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    let base = fmt::layer().with_writer(std::io::stderr);
    match format {
        LogFormat::Json => base
            .json()
            .with_thread_names(true)
            .with_current_span(true)
            .boxed(),
        LogFormat::Pretty => base.pretty().boxed(),
        LogFormat::Compact => base.compact().with_target(false).boxed(),
    }
}

/// Install the global subscriber, plus the exporter when a port is set
///
/// # Errors
/// Fails when a global subscriber is already installed or the exporter
/// cannot bind its port.
pub fn init_with_config(config: ObservabilityConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.default_log_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer(config.log_format))
        .try_init()
        .context("tracing subscriber already installed")?;

    if let Some(port) = config.metrics_port {
        init_metrics_only(port)?;
    }

    tracing::debug!(
        log_format = ?config.log_format,
        level = %config.default_log_level,
        "logging ready"
    );
    Ok(())
}

/// Serve `/metrics` on `port` without touching tracing
pub fn init_metrics_only(port: u16) -> Result<()> {
    PrometheusBuilder::new()
        .with_http_listener(([0, 0, 0, 0], port))
        .install()
        .with_context(|| format!("cannot start Prometheus exporter on port {port}"))?;

    tracing::info!(port, "Prometheus exporter listening");
    Ok(())
}

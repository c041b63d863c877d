//! Session metrics
//!
//! Exports sink and adapter status as Prometheus gauges and aggregates
//! periodic status samples into a run summary.

use std::collections::BTreeMap;
use std::time::Duration;

use dispatcher::MetricsSnapshot;
use ingestion::AdapterStatusSnapshot;
use metrics::gauge;

/// Publish sink counters
pub fn record_sink_metrics(sink: &str, snapshot: &MetricsSnapshot) {
    let label = sink.to_string();
    gauge!("sensor_logger_sink_pending_batches", "sink" => label.clone()).set(snapshot.pending as f64);
    gauge!("sensor_logger_sink_lines_written", "sink" => label.clone())
        .set(snapshot.lines_written as f64);
    gauge!("sensor_logger_sink_entries_rejected", "sink" => label.clone())
        .set(snapshot.rejected as f64);
    gauge!("sensor_logger_sink_entries_discarded", "sink" => label.clone())
        .set(snapshot.discarded as f64);
    gauge!("sensor_logger_sink_entries_in_flight", "sink" => label.clone())
        .set(snapshot.in_flight() as f64);
    gauge!("sensor_logger_sink_failures", "sink" => label).set(snapshot.write_failures as f64);
}

/// Publish one adapter's counters and flags
pub fn record_adapter_status(status: &AdapterStatusSnapshot) {
    let adapter = status.key();
    gauge!("sensor_logger_adapter_events", "adapter" => adapter.clone()).set(status.event_count as f64);
    gauge!("sensor_logger_adapter_records", "adapter" => adapter.clone())
        .set(status.record_count as f64);
    gauge!("sensor_logger_adapter_mismatched_events", "adapter" => adapter.clone())
        .set(status.mismatched_events as f64);
    gauge!("sensor_logger_adapter_registered", "adapter" => adapter)
        .set(if status.registered { 1.0 } else { 0.0 });
}

/// Aggregates status samples taken over a run
#[derive(Debug, Clone, Default)]
pub struct SessionMetricsAggregator {
    samples: u64,
    last_elapsed: Option<Duration>,
    last_records: BTreeMap<String, u64>,

    /// Records per second, per adapter key
    pub rate_stats: BTreeMap<String, RunningStats>,

    /// Sink queue length at each sample
    pub queue_stats: RunningStats,

    latest_sink: MetricsSnapshot,
    latest_adapters: Vec<AdapterStatusSnapshot>,
}

impl SessionMetricsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a sample taken `elapsed` after the session started
    pub fn update(
        &mut self,
        elapsed: Duration,
        adapters: &[AdapterStatusSnapshot],
        sink: &MetricsSnapshot,
    ) {
        self.samples += 1;
        self.queue_stats.push(sink.pending as f64);

        let dt = self
            .last_elapsed
            .map(|last| elapsed.saturating_sub(last).as_secs_f64())
            .unwrap_or_else(|| elapsed.as_secs_f64());

        for adapter in adapters.iter().filter(|a| a.registered) {
            let key = adapter.key();
            let previous = self.last_records.get(&key).copied().unwrap_or(0);
            if dt > 0.0 {
                let delta = adapter.record_count.saturating_sub(previous);
                self.rate_stats
                    .entry(key.clone())
                    .or_default()
                    .push(delta as f64 / dt);
            }
            self.last_records.insert(key, adapter.record_count);
        }

        self.last_elapsed = Some(elapsed);
        self.latest_sink = *sink;
        self.latest_adapters = adapters.to_vec();
    }

    pub fn samples(&self) -> u64 {
        self.samples
    }

    /// Summary of everything seen so far
    pub fn summary(&self) -> MetricsSummary {
        let silent_adapters = self
            .latest_adapters
            .iter()
            .filter(|a| a.registered && !a.received)
            .map(AdapterStatusSnapshot::key)
            .collect();

        MetricsSummary {
            samples: self.samples,
            total_records: self.latest_adapters.iter().map(|a| a.record_count).sum(),
            lines_written: self.latest_sink.lines_written,
            entries_rejected: self.latest_sink.rejected,
            entries_discarded: self.latest_sink.discarded,
            sink_failures: self.latest_sink.write_failures,
            pending_batches: StatsSummary::from(&self.queue_stats),
            record_rates: self
                .rate_stats
                .iter()
                .map(|(tag, stats)| (tag.clone(), StatsSummary::from(stats)))
                .collect(),
            silent_adapters,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Run summary
#[derive(Debug, Clone, Default)]
pub struct MetricsSummary {
    pub samples: u64,
    pub total_records: u64,
    pub lines_written: u64,
    pub entries_rejected: u64,
    pub entries_discarded: u64,
    pub sink_failures: u64,
    pub pending_batches: StatsSummary,
    pub record_rates: BTreeMap<String, StatsSummary>,
    /// Registered adapters that never delivered an event
    pub silent_adapters: Vec<String>,
}

impl std::fmt::Display for MetricsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Session Metrics Summary ===")?;
        writeln!(f, "Records: {}", self.total_records)?;
        writeln!(f, "Lines written: {}", self.lines_written)?;
        writeln!(
            f,
            "Rejected entries: {}, discarded entries: {}",
            self.entries_rejected, self.entries_discarded
        )?;
        writeln!(f, "Sink failures: {}", self.sink_failures)?;
        writeln!(f, "Pending batches: {}", self.pending_batches)?;

        if !self.record_rates.is_empty() {
            writeln!(f, "Record rates (1/s):")?;
            for (key, rate) in &self.record_rates {
                writeln!(f, "  {}: {}", key, rate)?;
            }
        }
        if !self.silent_adapters.is_empty() {
            writeln!(f, "No events from: {}", self.silent_adapters.join(", "))?;
        }

        Ok(())
    }
}

/// Frozen view of a `RunningStats`
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        let (min, max) = stats.range.unwrap_or_default();
        Self {
            count: stats.count,
            min,
            max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.count {
            0 => write!(f, "no samples"),
            1 => write!(f, "{:.3} (one sample)", self.mean),
            n => write!(
                f,
                "{:.3} avg, {:.3}..{:.3}, sd {:.3} over {n} samples",
                self.mean, self.min, self.max, self.std_dev
            ),
        }
    }
}

/// Streaming mean / variance (Welford) with min and max
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    /// Sum of squared deviations from the running mean
    sq_dev: f64,
    range: Option<(f64, f64)>,
}

impl RunningStats {
    pub fn push(&mut self, value: f64) {
        self.count += 1;
        self.range = Some(match self.range {
            None => (value, value),
            Some((lo, hi)) => (lo.min(value), hi.max(value)),
        });

        let before = value - self.mean;
        self.mean += before / self.count as f64;
        self.sq_dev += before * (value - self.mean);
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Sample variance, 0 below two samples
    pub fn variance(&self) -> f64 {
        match self.count {
            0 | 1 => 0.0,
            n => self.sq_dev / (n - 1) as f64,
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> Option<f64> {
        self.range.map(|(lo, _)| lo)
    }

    pub fn max(&self) -> Option<f64> {
        self.range.map(|(_, hi)| hi)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::SensorKind;
    use ingestion::AdapterState;

    fn adapter(tag: &str, events: usize) -> AdapterStatusSnapshot {
        let state = AdapterState::new(true);
        state.set_registered(true);
        for _ in 0..events {
            state.record_event(1);
        }
        state.snapshot(&tag.into(), &SensorKind::Accelerometer)
    }

    #[test]
    fn running_stats_track_spread() {
        let mut stats = RunningStats::default();
        assert_eq!(stats.min(), None);
        for rate in [48.0, 50.0, 52.0, 50.0] {
            stats.push(rate);
        }

        assert_eq!(stats.count(), 4);
        assert!((stats.mean() - 50.0).abs() < 1e-10);
        assert_eq!(stats.min(), Some(48.0));
        assert_eq!(stats.max(), Some(52.0));
        assert!((stats.variance() - 8.0 / 3.0).abs() < 1e-10);
        assert_eq!(StatsSummary::from(&stats).to_string(), "50.000 avg, 48.000..52.000, sd 1.633 over 4 samples");
    }

    #[test]
    fn rates_come_from_record_deltas() {
        let mut aggregator = SessionMetricsAggregator::new();
        let sink = MetricsSnapshot {
            lines_written: 10,
            ..MetricsSnapshot::default()
        };

        aggregator.update(Duration::from_secs(1), &[adapter("ACC", 50)], &sink);
        aggregator.update(Duration::from_secs(2), &[adapter("ACC", 150)], &sink);

        let summary = aggregator.summary();
        assert_eq!(summary.samples, 2);
        assert_eq!(summary.total_records, 150);
        let rate = &summary.record_rates["ACC"];
        assert_eq!(rate.count, 2);
        assert!((rate.min - 50.0).abs() < 1e-10);
        assert!((rate.max - 100.0).abs() < 1e-10);
    }

    #[test]
    fn summary_names_silent_adapters() {
        let mut aggregator = SessionMetricsAggregator::new();
        aggregator.update(
            Duration::from_millis(500),
            &[adapter("ACC", 3), adapter("HR", 0)],
            &MetricsSnapshot::default(),
        );

        let output = aggregator.summary().to_string();
        assert!(output.contains("=== Session Metrics Summary ==="));
        assert!(output.contains("No events from: HR"));
        assert!(output.contains("Records: 3"));
    }

    #[test]
    fn location_providers_get_separate_rates() {
        let fix = |provider: &str, records: usize| adapter("Fix", records).with_provider(provider);
        let mut aggregator = SessionMetricsAggregator::new();
        aggregator.update(
            Duration::from_secs(1),
            &[fix("gps", 1), fix("network", 0)],
            &MetricsSnapshot::default(),
        );
        aggregator.update(
            Duration::from_secs(2),
            &[fix("gps", 2), fix("network", 0)],
            &MetricsSnapshot::default(),
        );

        let summary = aggregator.summary();
        assert_eq!(summary.total_records, 2);
        assert!((summary.record_rates["Fix/gps"].max - 1.0).abs() < 1e-10);
        assert_eq!(summary.record_rates["Fix/network"].max, 0.0);
        assert_eq!(summary.silent_adapters, vec!["Fix/network".to_string()]);
    }
}

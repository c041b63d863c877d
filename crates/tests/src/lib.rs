//! # Integration Tests
//!
//! End-to-end tests over the simulated platform.
//!
//! Covers:
//! - Contract snapshots
//! - Session e2e tests (simulated device -> adapters -> sink -> destination)
//! - Storage exhaustion and telemetry paths

#[cfg(test)]
mod contract_tests {
    use contracts::{ConfigVersion, SensorKind, SessionBlueprint};

    #[test]
    fn test_contracts_compile() {
        let _ = ConfigVersion::V1;
    }

    #[test]
    fn test_default_blueprint_validates() {
        let blueprint = SessionBlueprint::default_android();
        config_loader::ConfigLoader::validate(&blueprint).unwrap();

        let toml = config_loader::ConfigLoader::to_toml(&blueprint).unwrap();
        let reloaded =
            config_loader::ConfigLoader::load_from_str(&toml, config_loader::ConfigFormat::Toml)
                .unwrap();
        assert_eq!(reloaded.sensors, blueprint.sensors);
    }

    #[test]
    fn test_every_builtin_kind_has_a_distinct_tag() {
        let mut tags: Vec<_> = SensorKind::BUILTIN.iter().map(|k| k.default_tag()).collect();
        tags.sort_unstable();
        tags.dedup();
        assert_eq!(tags.len(), SensorKind::BUILTIN.len());
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    use contracts::{
        AdapterConfig, BleScanResult, HardwareSensorType, LocationFix, RawEvent, SensorEvent,
        SensorKind, SessionBlueprint, SubscriptionRequest, TelemetryConfig,
    };
    use dispatcher::{FileDestination, MemoryDestination};
    use ingestion::ManualClock;
    use platform_sim::{synthesize, DeviceProfile, SimulatedDevice};
    use rand::Rng;
    use records::{parse_line, split_fields, summarize_log};
    use session::{SessionController, SessionOptions};

    fn manual_device() -> Arc<SimulatedDevice> {
        Arc::new(SimulatedDevice::new(DeviceProfile::typical_phone().manual()))
    }

    fn options() -> SessionOptions {
        SessionOptions::default()
            .with_clock(Arc::new(ManualClock::new(1_700_000_000_000, 1_000).with_step(1)))
    }

    fn sensor_event(sensor_type: HardwareSensorType, timestamp_nanos: i64, values: Vec<f32>) -> RawEvent {
        RawEvent::Sensor(SensorEvent {
            sensor_type,
            sensor_name: String::new(),
            timestamp_nanos,
            values,
            accuracy: 3,
        })
    }

    fn fix(provider: &str, latitude: f64, longitude: f64) -> LocationFix {
        LocationFix {
            provider: provider.to_string(),
            latitude,
            longitude,
            altitude: Some(12.5),
            speed: None,
            accuracy: Some(3.9),
            bearing: None,
            time_millis: 1_700_000_123_456,
            speed_accuracy_mps: None,
            bearing_accuracy_deg: None,
            elapsed_realtime_nanos: 42,
            vertical_accuracy_m: Some(4.0),
            elapsed_realtime_uncertainty_nanos: None,
        }
    }

    fn data_lines<'a>(lines: &'a [String], tag: &str) -> Vec<&'a String> {
        let prefix = format!("{tag},");
        lines.iter().filter(|l| l.starts_with(&prefix)).collect()
    }

    /// Three producer threads emit concurrently; each adapter's lines stay in emission order
    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_per_adapter_order_under_interleaving() {
        const EVENTS: i64 = 300;

        let device = manual_device();
        let destination = MemoryDestination::new("mem");
        let buffer = destination.buffer();
        let configs = vec![
            AdapterConfig::new(SensorKind::Accelerometer),
            AdapterConfig::new(SensorKind::Gyroscope),
            AdapterConfig::new(SensorKind::Pressure),
        ];
        let session = SessionController::new(&configs, device.clone(), destination, options());
        session.start().await.unwrap();

        let producers: Vec<_> = [
            (HardwareSensorType::Accelerometer, 3),
            (HardwareSensorType::Gyroscope, 3),
            (HardwareSensorType::Pressure, 1),
        ]
        .into_iter()
        .map(|(sensor_type, width)| {
            let device = Arc::clone(&device);
            thread::spawn(move || {
                let mut rng = rand::rng();
                for seq in 0..EVENTS {
                    let values = (0..width).map(|_| rng.random_range(-10.0..10.0)).collect();
                    assert_eq!(device.emit(sensor_event(sensor_type, seq, values)), 1);
                    if rng.random_bool(0.2) {
                        thread::yield_now();
                    }
                }
            })
        })
        .collect();
        for producer in producers {
            producer.join().unwrap();
        }

        let report = session.stop().await.unwrap();
        assert!(report.failure.is_none());

        let lines = buffer.lines();
        for tag in ["ACC", "GYRO", "PSR"] {
            let stamps: Vec<i64> = data_lines(&lines, tag)
                .iter()
                .map(|l| split_fields(l)[2].parse().unwrap())
                .collect();
            assert_eq!(stamps, (0..EVENTS).collect::<Vec<_>>(), "{tag} out of order");
        }
    }

    #[tokio::test]
    async fn test_stop_twice_unregisters_once() {
        let device = manual_device();
        let configs = SessionBlueprint::default_android().sensors;
        let session = SessionController::new(&configs, device.clone(), MemoryDestination::new("mem"), options());

        let summary = session.start().await.unwrap();
        let registered = summary.registered.len() as u64;
        assert_eq!(device.active_subscriptions() as u64, registered);

        assert!(session.stop().await.is_some());
        assert!(session.stop().await.is_none());
        assert_eq!(device.unsubscribe_calls(), registered);
        assert_eq!(device.active_subscriptions(), 0);
    }

    #[tokio::test]
    async fn test_raw_batch_lines_share_clock_columns() {
        let device = manual_device();
        let destination = MemoryDestination::new("mem");
        let buffer = destination.buffer();
        let configs = vec![AdapterConfig::new(SensorKind::GnssRawMeasurement)];
        let session = SessionController::new(&configs, device.clone(), destination, options());
        session.start().await.unwrap();

        device.emit(synthesize(&SubscriptionRequest::GnssMeasurements, 0, 5_000));
        session.stop().await;

        let lines = buffer.lines();
        let raw = data_lines(&lines, "Raw");
        assert_eq!(raw.len(), 3);

        let clocks: Vec<(String, String)> = raw
            .iter()
            .map(|l| {
                let fields = split_fields(l);
                (fields[1].to_string(), fields[2].to_string())
            })
            .collect();
        assert!(clocks.windows(2).all(|w| w[0] == w[1]));

        for line in raw {
            parse_line(line, &SensorKind::GnssRawMeasurement).unwrap();
        }
    }

    #[tokio::test]
    async fn test_ble_scan_without_payload_renders_empty_list() {
        let device = manual_device();
        let destination = MemoryDestination::new("mem");
        let buffer = destination.buffer();
        let configs = vec![AdapterConfig::new(SensorKind::Bluetooth)];
        let session = SessionController::new(&configs, device.clone(), destination, options());
        session.start().await.unwrap();

        device.emit(RawEvent::BleScan(BleScanResult {
            timestamp_nanos: 77,
            device: "C0:FF:EE:00:11:22".into(),
            rssi: -71,
            scan_record: None,
            ..BleScanResult::default()
        }));
        session.stop().await;

        let lines = buffer.lines();
        let ble = data_lines(&lines, "BLE");
        assert_eq!(ble.len(), 1);
        assert!(ble[0].ends_with(",[]"), "{}", ble[0]);
        assert_eq!(split_fields(ble[0])[2], "77");
    }

    #[tokio::test]
    async fn test_unavailable_adapter_writes_only_disabled_line() {
        let device = Arc::new(SimulatedDevice::new(
            DeviceProfile::typical_phone()
                .manual()
                .without_sensor(HardwareSensorType::Pressure),
        ));
        let destination = MemoryDestination::new("mem");
        let buffer = destination.buffer();
        let configs = vec![AdapterConfig::new(SensorKind::Pressure)];
        let session = SessionController::new(&configs, device.clone(), destination, options());

        let summary = session.start().await.unwrap();
        assert_eq!(summary.unavailable.len(), 1);
        assert_eq!(device.emit(sensor_event(HardwareSensorType::Pressure, 1, vec![1013.0])), 0);
        session.stop().await;

        let psr: Vec<String> = buffer.lines().into_iter().filter(|l| l.contains("PSR")).collect();
        assert_eq!(psr, vec!["# Sensor PSR disabled".to_string()]);
        assert!(!session.status().adapter("PSR").unwrap().available);
    }

    #[tokio::test]
    async fn test_values_survive_the_text_form() {
        let device = manual_device();
        let destination = MemoryDestination::new("mem");
        let buffer = destination.buffer();
        let configs = vec![
            AdapterConfig::new(SensorKind::Accelerometer),
            AdapterConfig::new(SensorKind::GnssLocation).with_provider("gps"),
        ];
        let session = SessionController::new(&configs, device.clone(), destination, options());
        session.start().await.unwrap();

        let mut rng = rand::rng();
        let samples: Vec<[f32; 3]> = (0..50)
            .map(|_| std::array::from_fn(|_| rng.random_range(-80.0..80.0)))
            .collect();
        for (seq, values) in samples.iter().enumerate() {
            device.emit(sensor_event(HardwareSensorType::Accelerometer, seq as i64, values.to_vec()));
        }
        device.emit(RawEvent::Location(fix("gps", 60.123456789, -24.987654321)));
        session.stop().await;

        let lines = buffer.lines();
        for (line, values) in data_lines(&lines, "ACC").iter().zip(&samples) {
            let record = parse_line(line, &SensorKind::Accelerometer).unwrap();
            for (field, expected) in record.fields.iter().zip(values) {
                assert_eq!(field.as_f64().unwrap() as f32, *expected);
            }
        }

        let fixes = data_lines(&lines, "Fix");
        assert_eq!(fixes.len(), 1);
        let record = parse_line(fixes[0], &SensorKind::GnssLocation).unwrap();
        assert_eq!(record.elapsed_realtime_nanos, 42);
        assert!((record.fields[1].as_f64().unwrap() - 60.123456789).abs() < 1e-8);
        assert!((record.fields[2].as_f64().unwrap() + 24.987654321).abs() < 1e-8);
    }

    /// Every line of a generated session parses against the column header of its tag
    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_generated_session_matches_headers() {
        let device = Arc::new(SimulatedDevice::new(DeviceProfile::typical_phone()));
        let destination = MemoryDestination::new("mem");
        let buffer = destination.buffer();
        let configs = SessionBlueprint::default_android().sensors;
        let session = SessionController::new(&configs, device, destination, SessionOptions::default());

        let summary = session.start().await.unwrap();
        assert!(summary.failed.is_empty());
        tokio::time::sleep(Duration::from_millis(300)).await;
        let report = session.stop().await.unwrap();
        assert!(report.failure.is_none());

        let text = buffer.text();
        let log = summarize_log(text.lines());
        assert_eq!(log.total_malformed(), 0, "{:?}", log.errors);
        for tag in &summary.registered {
            let entry = &log.tags[tag.as_str()];
            assert!(entry.enabled, "{tag} has no enabled header");
            assert!(entry.records > 0, "{tag} wrote no records");
        }
    }

    #[tokio::test]
    async fn test_storage_exhaustion_keeps_whole_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("full.csv");
        let destination = FileDestination::create(&path).unwrap().with_capacity_limit(4096);

        let device = manual_device();
        let configs = vec![AdapterConfig::new(SensorKind::Accelerometer)];
        let session = SessionController::new(&configs, device.clone(), destination, options());
        session.start().await.unwrap();

        for seq in 0..1_000 {
            device.emit(sensor_event(HardwareSensorType::Accelerometer, seq, vec![0.125, -0.5, 9.80665]));
        }
        let failure = tokio::time::timeout(Duration::from_secs(5), session.sink_failed())
            .await
            .unwrap();
        assert!(failure.to_string().contains("no space left"));

        device.emit(sensor_event(HardwareSensorType::Accelerometer, 1_000, vec![0.0, 0.0, 0.0]));
        assert!(session.status().adapter("ACC").unwrap().rejected_records >= 1);

        let report = session.stop().await.unwrap();
        assert!(report.failure.is_some());

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.len() <= 4096);
        assert!(text.ends_with('\n'));
        let log = summarize_log(text.lines());
        assert_eq!(log.total_malformed(), 0);
        assert!(log.total_records() > 0);
        assert_eq!(log.total_records(), report.written - log.comment_lines);
    }

    #[tokio::test]
    async fn test_config_file_to_log_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = format!(
            r#"
[session]
output_dir = "{}"
file_prefix = "bench"

[[sensors]]
kind = "pressure"

[[sensors]]
kind = {{ named_generic = "Device Orientation" }}
tag = "ORIENT"
"#,
            dir.path().display()
        );
        let blueprint =
            config_loader::ConfigLoader::load_from_str(&config, config_loader::ConfigFormat::Toml)
                .unwrap();

        let device = manual_device();
        let handle = session::start_session(&blueprint, device.clone()).await.unwrap();
        assert_eq!(handle.start_summary().registered.len(), 2);

        device.emit(sensor_event(HardwareSensorType::Pressure, 10, vec![1013.25]));
        device.emit(RawEvent::Sensor(SensorEvent {
            sensor_type: HardwareSensorType::Other,
            sensor_name: "Device Orientation".into(),
            timestamp_nanos: 11,
            values: vec![0.5, 1.5],
            accuracy: 2,
        }));
        assert!(session::stop_session(&handle).await.is_some());

        let path = handle.output_path().unwrap().to_path_buf();
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("bench_") && name.ends_with(".csv"), "{name}");

        let text = std::fs::read_to_string(&path).unwrap();
        let log = summarize_log(text.lines());
        assert_eq!(log.total_malformed(), 0);
        assert_eq!(log.tags["PSR"].records, 1);
        assert_eq!(log.tags["ORIENT"].records, 1);
    }

    #[tokio::test]
    async fn test_location_fixes_reach_telemetry() {
        let receiver = tokio::net::UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let dir = tempfile::tempdir().unwrap();

        let mut blueprint = SessionBlueprint::default_android();
        blueprint.session.output_dir = dir.path().to_path_buf();
        blueprint.sensors = vec![AdapterConfig::new(SensorKind::GnssLocation).with_provider("gps")];
        blueprint.telemetry = Some(TelemetryConfig {
            addr: receiver.local_addr().unwrap().to_string(),
            queue_capacity: 4,
            drop_policy: Default::default(),
        });

        let device = manual_device();
        let handle = session::start_session(&blueprint, device.clone()).await.unwrap();
        device.emit(RawEvent::Location(fix("gps", 60.1, 24.9)));

        let mut buf = [0u8; 512];
        let n = tokio::time::timeout(Duration::from_secs(5), receiver.recv(&mut buf))
            .await
            .unwrap()
            .unwrap();
        let datagram: serde_json::Value = serde_json::from_slice(&buf[..n]).unwrap();
        assert_eq!(datagram["time_millis"], 1_700_000_123_456i64);

        session::stop_session(&handle).await;
        assert_eq!(handle.telemetry_stats().unwrap().sent, 1);
    }
}

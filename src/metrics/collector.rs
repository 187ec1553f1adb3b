use crate::metrics::observation::{DeviceLabels, MetricKind, Observation};
use crate::metrics::status::status_metric_value;
use crate::oxidized::{Backend, Device, only_default_group, parse_backend_timestamp};
use futures::StreamExt;
use futures::stream::FuturesUnordered;
use tokio::sync::Semaphore;
use tokio::sync::mpsc::UnboundedSender;
use tokio::time::Instant;
use tracing::{debug, error, info, instrument, warn};

/// Upper bound of devices whose data is fetched at the same time within one scrape.
pub const MAX_CONCURRENT_DEVICES: usize = 100;

#[derive(Debug)]
pub struct Collector<B> {
    backend: B,
}

impl<B: Backend> Collector<B> {
    pub fn new(backend: B) -> Self {
        Collector { backend }
    }

    /// Runs one scrape and sends every resulting observation to `sink`.
    ///
    /// Returns once all devices are processed. When the device list cannot be retrieved only
    /// `oxidized_status 0` is emitted, otherwise `oxidized_status 1`, the device metrics and
    /// finally the collect duration.
    #[instrument(skip_all)]
    pub async fn collect(&self, sink: &UnboundedSender<Observation>) {
        info!("Collecting Oxidized metrics...");
        let start = Instant::now();

        let devices = match self.backend.list_devices().await {
            Ok(devices) => devices,
            Err(e) => {
                error!("❌ Could not get devices from Oxidized: {}", e);
                emit(sink, Observation::exporter(MetricKind::OxidizedStatus, 0.0));
                return;
            }
        };

        info!(count = devices.len(), "Got devices from Oxidized");
        emit(sink, Observation::exporter(MetricKind::OxidizedStatus, 1.0));

        let only_default_group = only_default_group(&devices);
        if only_default_group {
            info!("Oxidized only has devices in the default group");
        }

        let gate = Semaphore::new(MAX_CONCURRENT_DEVICES);
        let mut pending = devices
            .into_iter()
            .map(|device| self.collect_device(device, only_default_group, &gate, sink))
            .collect::<FuturesUnordered<_>>();
        while pending.next().await.is_some() {}

        let elapsed = start.elapsed();
        emit(sink, Observation::exporter(MetricKind::CollectDuration, elapsed.as_millis() as f64));
        info!(?elapsed, "Collecting Oxidized metrics... OK");
    }

    async fn collect_device(&self, device: Device, only_default_group: bool, gate: &Semaphore, sink: &UnboundedSender<Observation>) {
        // The gate lives for the whole scrape and is never closed
        let Ok(_permit) = gate.acquire().await else {
            return;
        };

        let labels = DeviceLabels::from(&device);
        for observation in translate_device(&device, &labels) {
            emit(sink, observation);
        }

        match self.backend.config_summary(&device.group, &device.name, only_default_group).await {
            Ok(summary) => {
                emit(sink, Observation::device(MetricKind::DeviceConfigSize, &labels, summary.size as f64));
                emit(sink, Observation::device(MetricKind::DeviceConfigLines, &labels, summary.lines as f64));
            }
            Err(e) => {
                warn!(device = device.full_name, address = device.address, "⚠️ Could not get config stats: {}", e);
            }
        }
    }
}

/// Translates the fields of a device listing, skipping the metrics whose source is absent.
pub fn translate_device(device: &Device, labels: &DeviceLabels) -> Vec<Observation> {
    let last = &device.last;
    let values = [
        (MetricKind::DeviceStatus, Some(status_metric_value(&device.status, &device.full_name))),
        (MetricKind::DeviceLastBackupStart, timestamp_value(&last.start, "start", device)),
        (MetricKind::DeviceLastBackupEnd, timestamp_value(&last.end, "end", device)),
        (MetricKind::DeviceLastBackupTime, duration_value(last.time, device)),
        (MetricKind::DeviceLastBackupStatus, last_status_value(&last.status, device)),
    ];

    values
        .into_iter()
        .filter_map(|(kind, value)| value.map(|value| Observation::device(kind, labels, value)))
        .collect()
}

fn timestamp_value(value: &str, field: &str, device: &Device) -> Option<f64> {
    if value.is_empty() {
        debug!(device = device.full_name, "Device has no last backup {} time", field);
        return None;
    }

    parse_backend_timestamp(value)
        .inspect_err(|e| warn!(device = device.full_name, "⚠️ Could not parse last backup {} time: {}", field, e))
        .ok()
        .map(|seconds| seconds as f64)
}

fn duration_value(seconds: f64, device: &Device) -> Option<f64> {
    if seconds == 0.0 {
        debug!(device = device.full_name, "Device has no last backup time");
        return None;
    }
    Some(seconds)
}

fn last_status_value(status: &str, device: &Device) -> Option<f64> {
    (!status.is_empty()).then(|| status_metric_value(status, &device.full_name))
}

fn emit(sink: &UnboundedSender<Observation>, observation: Observation) {
    // The receiver only goes away when the scrape request was dropped
    sink.send(observation).unwrap_or_default();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oxidized::{ConfigSummary, LastBackup, OxidizedError, device};
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use reqwest::StatusCode;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use test_log::test;
    use tokio::sync::mpsc;

    #[derive(Default)]
    struct FakeBackend {
        devices: Option<Vec<Device>>,
        configs: HashMap<String, ConfigSummary>,
        delay: Option<Duration>,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
        requests: Mutex<Vec<(String, String, bool)>>,
    }

    impl FakeBackend {
        fn with_devices(devices: Vec<Device>) -> Self {
            FakeBackend {
                devices: Some(devices),
                ..Default::default()
            }
        }

        fn config(mut self, name: &str, summary: ConfigSummary) -> Self {
            self.configs.insert(name.to_string(), summary);
            self
        }
    }

    #[async_trait]
    impl Backend for FakeBackend {
        async fn list_devices(&self) -> Result<Vec<Device>, OxidizedError> {
            self.devices.clone().ok_or(OxidizedError::BackendStatus {
                code: StatusCode::BAD_GATEWAY,
            })
        }

        async fn config_summary(&self, group: &str, name: &str, only_default_group: bool) -> Result<ConfigSummary, OxidizedError> {
            self.requests.lock().unwrap().push((group.to_string(), name.to_string(), only_default_group));

            let in_flight = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(in_flight, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            self.configs.get(name).copied().ok_or(OxidizedError::BackendStatus {
                code: StatusCode::NOT_FOUND,
            })
        }
    }

    async fn collect(collector: &Collector<FakeBackend>) -> Vec<Observation> {
        let (tx, mut rx) = mpsc::unbounded_channel();
        collector.collect(&tx).await;
        drop(tx);

        let mut observations = Vec::new();
        while let Some(observation) = rx.recv().await {
            observations.push(observation);
        }
        observations
    }

    fn count(observations: &[Observation], kind: MetricKind) -> usize {
        observations.iter().filter(|o| o.kind == kind).count()
    }

    fn value_of(observations: &[Observation], kind: MetricKind) -> Option<f64> {
        observations.iter().find(|o| o.kind == kind).map(|o| o.value)
    }

    #[test(tokio::test)]
    async fn emits_only_unreachable_status_when_listing_fails() {
        let collector = Collector::new(FakeBackend::default());

        let observations = collect(&collector).await;

        assert_eq!(observations, vec![Observation::exporter(MetricKind::OxidizedStatus, 0.0)]);
    }

    #[test(tokio::test)]
    async fn empty_device_list_emits_status_and_duration() {
        let collector = Collector::new(FakeBackend::with_devices(vec![]));

        let observations = collect(&collector).await;

        let kinds = observations.iter().map(|o| o.kind).collect::<Vec<_>>();
        assert_eq!(kinds, vec![MetricKind::OxidizedStatus, MetricKind::CollectDuration]);
        assert_eq!(observations[0].value, 1.0);
    }

    #[test(tokio::test)]
    async fn emits_one_device_status_per_device() {
        let devices = (0..250).map(|i| device(&format!("r{}", i), "net")).collect();
        let collector = Collector::new(FakeBackend::with_devices(devices));

        let observations = collect(&collector).await;

        assert_eq!(count(&observations, MetricKind::DeviceStatus), 250);
        assert_eq!(count(&observations, MetricKind::OxidizedStatus), 1);
        assert_eq!(count(&observations, MetricKind::CollectDuration), 1);
        assert_eq!(observations.last().map(|o| o.kind), Some(MetricKind::CollectDuration));
    }

    #[test(tokio::test)]
    async fn bounds_concurrent_device_fetches() {
        let devices = (0..350).map(|i| device(&format!("r{}", i), "net")).collect();
        let backend = FakeBackend {
            delay: Some(Duration::from_millis(10)),
            ..FakeBackend::with_devices(devices)
        };
        let collector = Collector::new(backend);

        let observations = collect(&collector).await;

        assert_eq!(collector.backend.max_in_flight.load(Ordering::SeqCst), MAX_CONCURRENT_DEVICES);
        assert_eq!(collector.backend.in_flight.load(Ordering::SeqCst), 0);
        assert_eq!(collector.backend.requests.lock().unwrap().len(), 350);
        assert_eq!(count(&observations, MetricKind::DeviceStatus), 350);
    }

    #[test(tokio::test)]
    async fn emits_only_the_metrics_with_source_data() {
        let mut r1 = device("r1", "net");
        r1.last = LastBackup {
            start: "2024-01-01 00:00:00 UTC".to_string(),
            end: "".to_string(),
            status: "".to_string(),
            time: 0.0,
        };
        let backend = FakeBackend::with_devices(vec![r1]).config("r1", ConfigSummary { size: 10, lines: 0 });
        let collector = Collector::new(backend);

        let observations = collect(&collector).await;

        let labels = DeviceLabels {
            full_name: "net/r1".to_string(),
            name: "r1".to_string(),
            group: "net".to_string(),
            model: "ios".to_string(),
        };
        assert_eq!(
            observations[..observations.len() - 1].to_vec(),
            vec![
                Observation::exporter(MetricKind::OxidizedStatus, 1.0),
                Observation::device(MetricKind::DeviceStatus, &labels, 2.0),
                Observation::device(MetricKind::DeviceLastBackupStart, &labels, 1_704_067_200.0),
                Observation::device(MetricKind::DeviceConfigSize, &labels, 10.0),
                Observation::device(MetricKind::DeviceConfigLines, &labels, 0.0),
            ]
        );
        assert_eq!(observations.last().map(|o| o.kind), Some(MetricKind::CollectDuration));
    }

    #[test(tokio::test)]
    async fn config_failure_only_skips_config_metrics() {
        let backend = FakeBackend::with_devices(vec![device("r1", "net"), device("r2", "net")]).config("r2", ConfigSummary { size: 42, lines: 3 });
        let collector = Collector::new(backend);

        let observations = collect(&collector).await;

        assert_eq!(count(&observations, MetricKind::DeviceStatus), 2);
        assert_eq!(count(&observations, MetricKind::DeviceConfigSize), 1);
        assert_eq!(count(&observations, MetricKind::DeviceConfigLines), 1);
        assert_eq!(value_of(&observations, MetricKind::DeviceConfigLines), Some(3.0));
        assert_eq!(count(&observations, MetricKind::CollectDuration), 1);
    }

    #[test(tokio::test)]
    async fn passes_the_default_group_flag_to_config_fetches() {
        let backend = FakeBackend::with_devices(vec![device("r1", "default"), device("r2", "default")]);
        let collector = Collector::new(backend);

        collect(&collector).await;

        let mut requests = collector.backend.requests.lock().unwrap().clone();
        requests.sort();
        assert_eq!(
            requests,
            vec![
                ("default".to_string(), "r1".to_string(), true),
                ("default".to_string(), "r2".to_string(), true),
            ]
        );
    }

    #[test]
    fn translates_all_last_backup_fields() {
        let mut r1 = device("r1", "net");
        r1.status = "no_connection".to_string();
        r1.last = LastBackup {
            start: "2024-01-01 00:00:00 UTC".to_string(),
            end: "2024-01-01 00:00:05 UTC".to_string(),
            status: "never".to_string(),
            time: 5.5,
        };
        let labels = DeviceLabels::from(&r1);

        let observations = translate_device(&r1, &labels);

        let values = observations.iter().map(|o| (o.kind, o.value)).collect::<Vec<_>>();
        assert_eq!(
            values,
            vec![
                (MetricKind::DeviceStatus, 0.0),
                (MetricKind::DeviceLastBackupStart, 1_704_067_200.0),
                (MetricKind::DeviceLastBackupEnd, 1_704_067_205.0),
                (MetricKind::DeviceLastBackupTime, 5.5),
                (MetricKind::DeviceLastBackupStatus, 1.0),
            ]
        );
    }

    #[test]
    fn unparseable_timestamp_only_skips_that_metric() {
        let mut r1 = device("r1", "net");
        r1.status = "unexpected".to_string();
        r1.last.start = "yesterday".to_string();
        r1.last.end = "2024-01-01 00:00:05 UTC".to_string();
        let labels = DeviceLabels::from(&r1);

        let observations = translate_device(&r1, &labels);

        let values = observations.iter().map(|o| (o.kind, o.value)).collect::<Vec<_>>();
        assert_eq!(
            values,
            vec![(MetricKind::DeviceStatus, 0.0), (MetricKind::DeviceLastBackupEnd, 1_704_067_205.0)]
        );
    }
}

use crate::oxidized::Device;

pub const DEVICE_LABELS: [&str; 4] = ["full_name", "name", "group", "model"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MetricKind {
    OxidizedStatus,
    DeviceStatus,
    DeviceLastBackupStart,
    DeviceLastBackupEnd,
    DeviceLastBackupTime,
    DeviceLastBackupStatus,
    DeviceConfigSize,
    DeviceConfigLines,
    CollectDuration,
}

impl MetricKind {
    pub fn name(self) -> &'static str {
        match self {
            MetricKind::OxidizedStatus => "oxidized_status",
            MetricKind::DeviceStatus => "oxidized_device_status",
            MetricKind::DeviceLastBackupStart => "oxidized_device_last_backup_start",
            MetricKind::DeviceLastBackupEnd => "oxidized_device_last_backup_end",
            MetricKind::DeviceLastBackupTime => "oxidized_device_last_backup_time",
            MetricKind::DeviceLastBackupStatus => "oxidized_device_last_backup_status",
            MetricKind::DeviceConfigSize => "oxidized_device_config_size",
            MetricKind::DeviceConfigLines => "oxidized_device_config_lines",
            MetricKind::CollectDuration => "oxidized_exporter_collect_duration",
        }
    }

    pub fn help(self) -> &'static str {
        match self {
            MetricKind::OxidizedStatus => "Status of oxidized connection, 1 = success, 0 = error",
            MetricKind::DeviceStatus => "Status of oxidized device, 2 = success, 1 = never, 0 = no connection",
            MetricKind::DeviceLastBackupStart => "Start time of last backup as unix timestamp",
            MetricKind::DeviceLastBackupEnd => "End time of last backup as unix timestamp",
            MetricKind::DeviceLastBackupTime => "Time of last backup in seconds",
            MetricKind::DeviceLastBackupStatus => "Status of last backup, 2 = success, 1 = never, 0 = error",
            MetricKind::DeviceConfigSize => "Size of the device config in bytes",
            MetricKind::DeviceConfigLines => "Number of lines in the device config",
            MetricKind::CollectDuration => "Time taken to collect metrics in ms",
        }
    }

    pub fn label_names(self) -> &'static [&'static str] {
        match self {
            MetricKind::OxidizedStatus | MetricKind::CollectDuration => &[],
            _ => &DEVICE_LABELS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeviceLabels {
    pub full_name: String,
    pub name: String,
    pub group: String,
    pub model: String,
}

impl DeviceLabels {
    pub fn values(&self) -> [&str; 4] {
        [&self.full_name, &self.name, &self.group, &self.model]
    }
}

impl From<&Device> for DeviceLabels {
    fn from(device: &Device) -> Self {
        DeviceLabels {
            full_name: device.full_name.clone(),
            name: device.name.clone(),
            group: device.group.clone(),
            model: device.model.clone(),
        }
    }
}

/// A single gauge sample produced during a scrape.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub kind: MetricKind,
    pub labels: Option<DeviceLabels>,
    pub value: f64,
}

impl Observation {
    pub fn exporter(kind: MetricKind, value: f64) -> Self {
        Observation { kind, labels: None, value }
    }

    pub fn device(kind: MetricKind, labels: &DeviceLabels, value: f64) -> Self {
        Observation {
            kind,
            labels: Some(labels.clone()),
            value,
        }
    }

    pub fn label_values(&self) -> Vec<&str> {
        self.labels.as_ref().map(|labels| labels.values().to_vec()).unwrap_or_default()
    }
}

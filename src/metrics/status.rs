use std::str::FromStr;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackupStatus {
    Success,
    Never,
    NoConnection,
}

impl BackupStatus {
    pub fn metric_value(self) -> f64 {
        match self {
            BackupStatus::Success => 2.0,
            BackupStatus::Never => 1.0,
            BackupStatus::NoConnection => 0.0,
        }
    }
}

impl FromStr for BackupStatus {
    type Err = UnknownStatusValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "success" => Ok(BackupStatus::Success),
            "never" => Ok(BackupStatus::Never),
            "no_connection" => Ok(BackupStatus::NoConnection),
            _ => Err(UnknownStatusValue(s.to_string())),
        }
    }
}

#[derive(Error, Debug, PartialEq)]
#[error("unknown status '{0}'")]
pub struct UnknownStatusValue(pub String);

/// Maps an Oxidized status string to its gauge value, unknown values count as an error.
pub fn status_metric_value(status: &str, full_name: &str) -> f64 {
    match status.parse::<BackupStatus>() {
        Ok(status) => status.metric_value(),
        Err(e) => {
            warn!(device = full_name, "⚠️ {}, reporting it as an error", e);
            BackupStatus::NoConnection.metric_value()
        }
    }
}

use serde::{Deserialize, Deserializer};

const DEFAULT_GROUP: &str = "default";

/// A node as reported by `GET /nodes?format=json`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Device {
    /// Group and name, e.g. "netzwerk/leaf-netzwerk-01"
    #[serde(default, deserialize_with = "null_as_default")]
    pub full_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub group: String,
    /// FQDN or IP of the device
    #[serde(default, rename = "ip", deserialize_with = "null_as_default")]
    pub address: String,
    /// Oxidized model, e.g. "ios"
    #[serde(default, deserialize_with = "null_as_default")]
    pub model: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub last: LastBackup,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct LastBackup {
    #[serde(default, deserialize_with = "null_as_default")]
    pub start: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub end: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: String,
    /// Elapsed seconds
    #[serde(default, deserialize_with = "null_as_default")]
    pub time: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfigSummary {
    pub size: usize,
    pub lines: usize,
}

impl ConfigSummary {
    pub fn from_body(body: &[u8]) -> Self {
        ConfigSummary {
            size: body.len(),
            lines: body.iter().filter(|&&byte| byte == b'\n').count(),
        }
    }
}

/// True when every device sits in the "default" group, i.e. Oxidized runs without groups.
pub fn only_default_group(devices: &[Device]) -> bool {
    devices.iter().all(|device| device.group == DEFAULT_GROUP)
}

// Oxidized serializes missing values as `null` rather than omitting them.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
pub fn device(name: &str, group: &str) -> Device {
    Device {
        full_name: format!("{}/{}", group, name),
        name: name.to_string(),
        group: group.to_string(),
        address: "192.0.2.1".to_string(),
        model: "ios".to_string(),
        status: "success".to_string(),
        last: LastBackup::default(),
    }
}

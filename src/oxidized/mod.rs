mod client;
mod device;
mod timestamp;

pub use client::{Backend, OxidizedError, new_client};
pub use device::{ConfigSummary, Device, only_default_group};
pub use timestamp::parse_backend_timestamp;

#[cfg(test)]
pub use device::{LastBackup, device};

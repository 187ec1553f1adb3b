use crate::metrics::observation::{MetricKind, Observation};
use prometheus::{Encoder, GaugeVec, Opts, Registry, TextEncoder};
use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, HashSet};
use thiserror::Error;
use tracing::warn;

/// Renders the observations of one scrape in the Prometheus text format.
///
/// Metrics without observations are left out entirely. When a label set repeats within a
/// metric the last value is kept.
pub fn render(observations: &[Observation]) -> Result<String, RenderError> {
    let registry = Registry::new();
    let mut gauges: BTreeMap<MetricKind, GaugeVec> = BTreeMap::new();
    let mut seen = HashSet::with_capacity(observations.len());

    for observation in observations {
        if !seen.insert((observation.kind, observation.labels.as_ref())) {
            warn!(
                metric = observation.kind.name(),
                labels = ?observation.labels,
                "⚠️ Duplicate label set within one scrape, overwriting the previous value"
            );
        }

        let gauge = match gauges.entry(observation.kind) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                let kind = observation.kind;
                let gauge = GaugeVec::new(Opts::new(kind.name(), kind.help()), kind.label_names())?;
                registry.register(Box::new(gauge.clone()))?;
                entry.insert(gauge)
            }
        };

        gauge.get_metric_with_label_values(observation.label_values().as_slice())?.set(observation.value);
    }

    let mut buffer = Vec::new();
    TextEncoder::new().encode(&registry.gather(), &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}

pub fn content_type() -> &'static str {
    prometheus::TEXT_FORMAT
}

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("could not build metric: {0}")]
    Prometheus(#[from] prometheus::Error),
    #[error("encoded metrics are not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

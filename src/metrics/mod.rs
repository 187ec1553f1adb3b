mod collector;
mod exposition;
mod observation;
mod status;

pub use collector::Collector;
pub use exposition::{content_type, render};
pub use observation::Observation;

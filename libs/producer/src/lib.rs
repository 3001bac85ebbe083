pub mod config;
pub mod error;
pub mod generator;
pub mod log;
mod pacing;
mod producer;

pub use config::{PartitionKey, ProducerConfig};
pub use error::ProducerError;
pub use generator::RecordGenerator;
pub use log::{OutcomeLog, TracingOutcomeLog};
pub use pacing::Pacing;
pub use producer::Producer;

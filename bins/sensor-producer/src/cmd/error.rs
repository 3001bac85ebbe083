use sensor_api::DeliveryError;

#[derive(Debug, thiserror::Error)]
pub enum ProducerCliError {
    #[error("{0}")]
    Config(String),

    #[error("sink: {0}")]
    Sink(#[from] DeliveryError),

    #[error("{0}")]
    Producer(#[from] producer::ProducerError),

    #[error("invocation {unit_id} exceeded its {secs}s budget")]
    Timeout { unit_id: String, secs: u64 },

    #[error("event ({path}): {detail}")]
    Event { path: String, detail: String },

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
}

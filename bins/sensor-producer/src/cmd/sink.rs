use std::sync::Arc;

use sensor_api::StreamSink;
use sink_kinesis::{KinesisSink, KinesisSinkConfig};
use sink_memory::{MemoryStream, MemoryStreamConfig};

use super::error::ProducerCliError;

#[derive(Debug, Clone)]
pub enum SinkSettings {
    Kinesis(KinesisSinkConfig),
    Memory(MemoryStreamConfig),
}

/// Собрать sink один раз на процесс; все producer'ы делят один клиент.
pub async fn build(settings: &SinkSettings) -> Result<Arc<dyn StreamSink>, ProducerCliError> {
    let sink: Arc<dyn StreamSink> = match settings {
        SinkSettings::Kinesis(cfg) => Arc::new(KinesisSink::connect(cfg).await?),
        SinkSettings::Memory(cfg) => Arc::new(MemoryStream::new(cfg)),
    };
    tracing::info!(sink = %sink.name(), "sink ready");
    Ok(sink)
}

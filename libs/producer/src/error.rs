#[derive(Debug, thiserror::Error)]
pub enum ProducerError {
    #[error("config: {0}")]
    Config(String),
}

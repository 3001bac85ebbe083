use aws_config::BehaviorVersion;
use aws_sdk_kinesis::error::{DisplayErrorContext, SdkError};
use aws_sdk_kinesis::operation::put_record::PutRecordError;
use aws_sdk_kinesis::primitives::Blob;

use sensor_api::{DeliverFuture, DeliveryError, Receipt, StreamSink};

// ═══════════════════════════════════════════════════════════════
//  KinesisSinkConfig
// ═══════════════════════════════════════════════════════════════

#[derive(Debug, Clone, serde::Deserialize)]
pub struct KinesisSinkConfig {
    pub stream_name: String,
    /// Регион. `None` = стандартная цепочка AWS (env / profile / IMDS).
    #[serde(default)]
    pub region: Option<String>,
    /// Override endpoint'а (LocalStack, kinesis-mock).
    #[serde(default)]
    pub endpoint_url: Option<String>,
}

// ═══════════════════════════════════════════════════════════════
//  KinesisSink
// ═══════════════════════════════════════════════════════════════

/// Запись в Kinesis Data Stream через `PutRecord`, одна запись на вызов.
///
/// Клиент SDK внутри `Arc`, один `KinesisSink` можно раздать любому
/// числу producer'ов.
pub struct KinesisSink {
    client: aws_sdk_kinesis::Client,
    stream_name: String,
    name: String,
}

impl KinesisSink {
    /// Build a client from the ambient AWS environment, applying the
    /// region / endpoint overrides from `config`.
    pub async fn connect(config: &KinesisSinkConfig) -> Result<Self, DeliveryError> {
        if config.stream_name.trim().is_empty() {
            return Err(DeliveryError::config("kinesis stream_name must not be empty"));
        }

        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = &config.region {
            loader = loader.region(aws_config::Region::new(region.clone()));
        }
        if let Some(url) = &config.endpoint_url {
            loader = loader.endpoint_url(url);
        }
        let shared = loader.load().await;

        tracing::info!(
            stream = %config.stream_name,
            region = ?shared.region(),
            endpoint = ?config.endpoint_url,
            "kinesis client ready"
        );

        Ok(Self::from_client(aws_sdk_kinesis::Client::new(&shared), &config.stream_name))
    }

    pub fn from_client(client: aws_sdk_kinesis::Client, stream_name: &str) -> Self {
        Self {
            client,
            stream_name: stream_name.to_string(),
            name: format!("kinesis:{stream_name}"),
        }
    }
}

impl StreamSink for KinesisSink {
    fn name(&self) -> &str {
        &self.name
    }

    fn deliver<'a>(&'a self, payload: &'a [u8], partition_key: &'a str) -> DeliverFuture<'a> {
        Box::pin(async move {
            let output = self
                .client
                .put_record()
                .stream_name(&self.stream_name)
                .partition_key(partition_key)
                .data(Blob::new(payload))
                .send()
                .await
                .map_err(|e| classify(&e))?;

            Ok(Receipt::new(output.shard_id()).with_sequence(output.sequence_number()))
        })
    }
}

/// Сопоставить ошибку SDK с `ErrorKind`. Producer ошибки не различает,
/// kind нужен только для логов.
fn classify<R: std::fmt::Debug>(err: &SdkError<PutRecordError, R>) -> DeliveryError {
    let message = DisplayErrorContext(err).to_string();
    match err {
        SdkError::ServiceError(ctx) => {
            let e = ctx.err();
            if e.is_provisioned_throughput_exceeded_exception() || e.is_kms_throttling_exception() {
                DeliveryError::throttled(message)
            } else {
                DeliveryError::rejected(message)
            }
        }
        SdkError::ConstructionFailure(_) => DeliveryError::format_err(message),
        _ => DeliveryError::io(message),
    }
}

#[cfg(test)]
mod tests {
    use aws_sdk_kinesis::types::error::{ProvisionedThroughputExceededException, ResourceNotFoundException};
    use sensor_api::ErrorKind;

    use super::*;

    #[test]
    fn throughput_exceeded_is_throttled() {
        let err: SdkError<PutRecordError, ()> = SdkError::service_error(
            PutRecordError::ProvisionedThroughputExceededException(
                ProvisionedThroughputExceededException::builder().message("Rate exceeded for shard").build(),
            ),
            (),
        );
        let e = classify(&err);
        assert_eq!(e.kind(), ErrorKind::Throttled);
        assert!(e.message().contains("Rate exceeded for shard"), "{}", e.message());
    }

    #[test]
    fn missing_stream_is_rejected() {
        let err: SdkError<PutRecordError, ()> = SdkError::service_error(
            PutRecordError::ResourceNotFoundException(
                ResourceNotFoundException::builder().message("Stream sensors not found").build(),
            ),
            (),
        );
        assert_eq!(classify(&err).kind(), ErrorKind::Rejected);
    }

    #[test]
    fn timeout_is_io() {
        let err: SdkError<PutRecordError, ()> = SdkError::timeout_error("operation timed out");
        assert_eq!(classify(&err).kind(), ErrorKind::Io);
    }

    #[test]
    fn config_from_toml() {
        let cfg: KinesisSinkConfig = toml::from_str(
            r#"
            stream_name = "sensors"
            endpoint_url = "http://localhost:4566"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.stream_name, "sensors");
        assert_eq!(cfg.region, None);
        assert_eq!(cfg.endpoint_url.as_deref(), Some("http://localhost:4566"));
    }

    #[tokio::test]
    async fn empty_stream_name_fails_before_touching_aws() {
        let cfg = KinesisSinkConfig { stream_name: " ".into(), region: None, endpoint_url: None };
        let err = KinesisSink::connect(&cfg).await.err().unwrap();
        assert_eq!(err.kind(), ErrorKind::Config);
    }

    #[tokio::test]
    async fn connect_with_explicit_region_and_endpoint() {
        let cfg = KinesisSinkConfig {
            stream_name: "sensors".into(),
            region: Some("eu-west-1".into()),
            endpoint_url: Some("http://localhost:4566".into()),
        };
        let sink = KinesisSink::connect(&cfg).await.unwrap();
        assert_eq!(sink.name(), "kinesis:sensors");
        assert_eq!(sink.stream_name, "sensors");
    }
}

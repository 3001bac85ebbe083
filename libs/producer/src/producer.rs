use std::sync::Arc;

use sensor_api::{DeliveryOutcome, InvocationSummary, StreamSink, TelemetryRecord};

use crate::config::ProducerConfig;
use crate::generator::RecordGenerator;
use crate::log::{OutcomeLog, TracingOutcomeLog};
use crate::ProducerError;

// ═══════════════════════════════════════════════════════════════
//  Producer: generate → serialize → deliver → log → sleep
// ═══════════════════════════════════════════════════════════════

/// Один producer = одна invocation. Циклы строго последовательны:
/// следующий начинается только после того, как доставка и запись
/// outcome'а предыдущего завершены.
///
/// Ошибка доставки не прерывает цикл и не ретраится: запись логируется
/// как неуспешная и отбрасывается.
pub struct Producer {
    config: ProducerConfig,
    sink: Arc<dyn StreamSink>,
    generator: RecordGenerator,
}

impl Producer {
    pub fn new(config: ProducerConfig, sink: Arc<dyn StreamSink>) -> Result<Self, ProducerError> {
        config.validate()?;
        let generator = RecordGenerator::new(config.seed);
        Ok(Self { config, sink, generator })
    }

    /// Выполнить `iterations` циклов. Никогда не падает: summary не
    /// отражает ошибки доставки, их видно только в `log`.
    pub async fn run(&mut self, log: &mut dyn OutcomeLog) -> InvocationSummary {
        let Self { config, sink, generator } = self;
        let unit_id = config.unit_id.as_str();
        let partition_key = config.partition_key.resolve(unit_id);
        let iterations = config.iterations;

        tracing::info!(unit_id, iterations, sink = %sink.name(), partition_key, "producer started");

        let mut delivered = 0u32;
        let mut failed = 0u32;

        for i in 0..iterations {
            let record = generator.generate(unit_id);
            let outcome = deliver_record(&**sink, record, partition_key).await;
            if outcome.success {
                delivered += 1;
            } else {
                failed += 1;
            }
            log.record(&outcome);

            if i + 1 < iterations {
                let delay = config.pacing.next_delay(generator.rng());
                tracing::trace!(unit_id, cycle = i, delay_ms = delay.as_millis() as u64, "pacing");
                tokio::time::sleep(delay).await;
            }
        }

        tracing::info!(unit_id, delivered, failed, "producer finished");

        InvocationSummary { unit_id: unit_id.to_string() }
    }

    /// `run` с записью outcome'ов в `tracing`.
    pub async fn run_traced(&mut self) -> InvocationSummary {
        self.run(&mut TracingOutcomeLog).await
    }
}

/// Одна попытка доставки. Любая ошибка (включая сериализацию)
/// превращается в неуспешный outcome.
async fn deliver_record(sink: &dyn StreamSink, record: TelemetryRecord, partition_key: &str) -> DeliveryOutcome {
    let result = match record.to_payload() {
        Ok(payload) => sink.deliver(&payload, partition_key).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(receipt) => DeliveryOutcome::delivered(record, &receipt),
        Err(e) => {
            tracing::debug!(sink = %sink.name(), kind = %e.kind(), error = ?e, "delivery failed");
            DeliveryOutcome::failed(record, &e)
        }
    }
}

use std::sync::Arc;
use std::time::Duration;

use producer::{Producer, ProducerConfig};
use sensor_api::{InvocationSummary, StreamSink};

use super::config::{Effective, InvokeArgs};
use super::error::ProducerCliError;
use super::sink;

// ═══════════════════════════════════════════════════════════════
//  Single invocation
// ═══════════════════════════════════════════════════════════════

pub async fn run(eff: &Effective, args: &InvokeArgs) -> Result<(), ProducerCliError> {
    let event = load_event(args.event.as_deref())?;
    tracing::debug!(%event, "invocation event (unused)");

    let unit_id = args
        .unit_id
        .clone()
        .or_else(|| eff.unit_id.clone())
        .ok_or_else(|| ProducerCliError::Config("unit id is required (--unit-id or FUNCTION_INDEX)".into()))?;

    let config = eff.producer_config(&unit_id, 0);

    let sink = sink::build(&eff.sink).await?;
    let summary = invoke_one(config, sink, eff.timeout).await?;

    println!("{}", serde_json::to_string(&summary)?);
    Ok(())
}

/// Запустить producer под wall-clock бюджетом хоста. По истечении бюджета
/// текущий цикл обрывается; его outcome может и не попасть в лог.
pub async fn invoke_one(
    config: ProducerConfig,
    sink: Arc<dyn StreamSink>,
    budget: Option<Duration>,
) -> Result<InvocationSummary, ProducerCliError> {
    let unit_id = config.unit_id.clone();
    let mut producer = Producer::new(config, sink)?;

    match budget {
        Some(budget) => tokio::time::timeout(budget, producer.run_traced())
            .await
            .map_err(|_| ProducerCliError::Timeout { unit_id, secs: budget.as_secs() }),
        None => Ok(producer.run_traced().await),
    }
}

/// Event payload хоста. Отсутствие файла = пустой объект.
fn load_event(path: Option<&str>) -> Result<serde_json::Value, ProducerCliError> {
    let Some(path) = path else {
        return Ok(serde_json::Value::Object(Default::default()));
    };
    let content = std::fs::read_to_string(path)
        .map_err(|e| ProducerCliError::Event { path: path.to_string(), detail: e.to_string() })?;
    serde_json::from_str(&content).map_err(|e| ProducerCliError::Event { path: path.to_string(), detail: e.to_string() })
}

use sensor_api::DeliveryOutcome;

/// Куда пишутся результаты доставки. Одна запись на цикл, без исключений.
pub trait OutcomeLog: Send {
    fn record(&mut self, outcome: &DeliveryOutcome);
}

/// Пишет каждый outcome как одно структурированное событие `tracing`
/// (target `delivery`): `info` при успехе, `warn` при ошибке. Поле `line`
/// содержит полный outcome в JSON - это и есть audit trail invocation'а.
#[derive(Debug, Default)]
pub struct TracingOutcomeLog;

impl OutcomeLog for TracingOutcomeLog {
    fn record(&mut self, outcome: &DeliveryOutcome) {
        let line = serde_json::to_string(outcome).unwrap_or_else(|e| format!("<unserializable outcome: {e}>"));
        let unit_id = outcome.record.unit_id.as_str();
        let serial = outcome.record.serial_number.as_str();

        if outcome.success {
            tracing::info!(target: "delivery", unit_id, serial, success = true, message = %outcome.message, %line);
        } else {
            tracing::warn!(target: "delivery", unit_id, serial, success = false, message = %outcome.message, %line);
        }
    }
}

impl OutcomeLog for Vec<DeliveryOutcome> {
    fn record(&mut self, outcome: &DeliveryOutcome) {
        self.push(outcome.clone());
    }
}

use serde::{Deserialize, Serialize};

use crate::DeliveryError;

// ════════════════════════════════════════════════════════════════
//  Telemetry Record
// ════════════════════════════════════════════════════════════════

/// Одно синтетическое показание датчика.
///
/// Имена полей на проводе совпадают с теми, что читают потребители
/// stream'а (ETL job): `unitname`, `serialnumber`, `name`, `origin`,
/// `time`, `temperature`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryRecord {
    /// Идентификатор producer'а (постоянный в рамках invocation).
    #[serde(rename = "unitname")]
    pub unit_id: String,
    /// UUID v4, уникален для каждой записи.
    #[serde(rename = "serialnumber")]
    pub serial_number: String,
    #[serde(rename = "name")]
    pub subject_name: String,
    pub origin: String,
    /// Unix ms на момент генерации.
    #[serde(rename = "time")]
    pub timestamp_ms: i64,
    /// Градусы, диапазон [35.00, 40.00], два знака после запятой.
    pub temperature: f64,
}

impl TelemetryRecord {
    /// Каноническое текстовое представление (JSON) для отправки в stream.
    pub fn to_payload(&self) -> Result<Vec<u8>, DeliveryError> {
        Ok(serde_json::to_vec(self)?)
    }
}

// ════════════════════════════════════════════════════════════════
//  Receipt
// ════════════════════════════════════════════════════════════════

/// Acknowledgement returned by a stream for one accepted record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    pub shard_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sequence_number: Option<String>,
}

impl Receipt {
    pub fn new(shard_id: impl Into<String>) -> Self {
        Self { shard_id: shard_id.into(), sequence_number: None }
    }

    pub fn with_sequence(mut self, sequence_number: impl Into<String>) -> Self {
        self.sequence_number = Some(sequence_number.into());
        self
    }
}

impl std::fmt::Display for Receipt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Shard ID: {}", self.shard_id)
    }
}

// ════════════════════════════════════════════════════════════════
//  Delivery Outcome
// ════════════════════════════════════════════════════════════════

/// Результат одной попытки доставки. Не сохраняется, только логируется.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryOutcome {
    #[serde(rename = "data")]
    pub record: TelemetryRecord,
    pub success: bool,
    pub message: String,
}

impl DeliveryOutcome {
    pub fn delivered(record: TelemetryRecord, receipt: &Receipt) -> Self {
        Self { record, success: true, message: receipt.to_string() }
    }

    pub fn failed(record: TelemetryRecord, error: &DeliveryError) -> Self {
        Self { record, success: false, message: format!("Error: {error}") }
    }
}

// ════════════════════════════════════════════════════════════════
//  Invocation Summary
// ════════════════════════════════════════════════════════════════

/// Value returned to whoever triggered the invocation. Delivery failures are
/// deliberately not reflected here; they only show up in the outcome log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvocationSummary {
    pub unit_id: String,
}

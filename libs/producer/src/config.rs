use serde::Deserialize;

use crate::ProducerError;
use crate::pacing::Pacing;

// ═══════════════════════════════════════════════════════════════
//  Partition Key
// ═══════════════════════════════════════════════════════════════

pub const DEFAULT_PARTITION_KEY: &str = "partition_key";

/// Как выбирается partition key для записей.
///
/// `Fixed` отправляет все записи всех producer'ов в один shard. Это
/// известное ограничение исходного развёртывания; `UnitId` распределяет
/// записи по shard'ам по идентификатору producer'а.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartitionKey {
    Fixed(String),
    UnitId,
}

impl Default for PartitionKey {
    fn default() -> Self {
        PartitionKey::Fixed(DEFAULT_PARTITION_KEY.into())
    }
}

impl PartitionKey {
    pub fn resolve<'a>(&'a self, unit_id: &'a str) -> &'a str {
        match self {
            PartitionKey::Fixed(key) => key,
            PartitionKey::UnitId => unit_id,
        }
    }
}

// ═══════════════════════════════════════════════════════════════
//  Producer Config
// ═══════════════════════════════════════════════════════════════

/// Всё, что нужно одному producer'у. Читается один раз на старте
/// invocation и дальше не меняется.
#[derive(Debug, Clone, Deserialize)]
pub struct ProducerConfig {
    pub unit_id: String,
    /// Сколько циклов generate → deliver → sleep выполнить.
    #[serde(default = "default_iterations")]
    pub iterations: u32,
    #[serde(default)]
    pub partition_key: PartitionKey,
    #[serde(default)]
    pub pacing: Pacing,
    /// Seed для PRNG. `None` = из энтропии ОС.
    #[serde(default)]
    pub seed: Option<u64>,
}

/// Верхняя граница одной паузы между циклами (1 час).
const MAX_PAUSE_MS: u64 = 60 * 60 * 1000;

pub fn default_iterations() -> u32 {
    60
}

impl ProducerConfig {
    pub fn new(unit_id: impl Into<String>) -> Self {
        Self {
            unit_id: unit_id.into(),
            iterations: default_iterations(),
            partition_key: PartitionKey::default(),
            pacing: Pacing::default(),
            seed: None,
        }
    }

    pub fn validate(&self) -> Result<(), ProducerError> {
        if self.unit_id.trim().is_empty() {
            return Err(ProducerError::Config("unit_id must not be empty".into()));
        }
        if let PartitionKey::Fixed(key) = &self.partition_key {
            if key.is_empty() {
                return Err(ProducerError::Config("fixed partition key must not be empty".into()));
            }
        }
        let p = &self.pacing;
        if p.min_steps == 0 || p.min_steps > p.max_steps {
            return Err(ProducerError::Config(format!(
                "pacing steps must satisfy 1 <= min ({}) <= max ({})",
                p.min_steps, p.max_steps
            )));
        }
        if p.step_ms == 0 {
            return Err(ProducerError::Config("pacing step_ms must be > 0".into()));
        }
        match p.longest_ms() {
            Some(ms) if ms <= MAX_PAUSE_MS => {}
            _ => {
                return Err(ProducerError::Config(format!(
                    "pacing max_steps ({}) * step_ms ({}) exceeds {MAX_PAUSE_MS} ms",
                    p.max_steps, p.step_ms
                )));
            }
        }
        Ok(())
    }
}

use std::collections::VecDeque;
use std::hash::{DefaultHasher, Hash, Hasher};

use tokio::sync::RwLock;

use sensor_api::{DeliverFuture, DeliveryError, Receipt, StreamSink};

// ═══════════════════════════════════════════════════════════════
//  MemoryStreamConfig
// ═══════════════════════════════════════════════════════════════

fn default_shards() -> u32 {
    1
}
fn default_max_records() -> usize {
    100_000
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct MemoryStreamConfig {
    #[serde(default = "default_shards")]
    pub shards: u32,
    #[serde(default = "default_max_records")]
    pub max_records: usize,
}

impl Default for MemoryStreamConfig {
    fn default() -> Self {
        Self {
            shards: default_shards(),
            max_records: default_max_records(),
        }
    }
}

// ═══════════════════════════════════════════════════════════════
//  MemoryStream
// ═══════════════════════════════════════════════════════════════

/// Запись, принятая in-memory stream'ом.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredRecord {
    pub shard_id: String,
    pub sequence_number: u64,
    pub partition_key: String,
    pub payload: Vec<u8>,
}

struct State {
    records: VecDeque<StoredRecord>,
    next_sequence: u64,
}

/// In-process stream: ring buffer на `max_records` записей, разбитый на
/// shard'ы по хешу partition key. Для локальных прогонов без AWS.
pub struct MemoryStream {
    state: RwLock<State>,
    shards: u32,
    max_records: usize,
}

impl MemoryStream {
    pub fn new(config: &MemoryStreamConfig) -> Self {
        Self {
            state: RwLock::new(State {
                records: VecDeque::with_capacity(config.max_records.min(65536)),
                next_sequence: 1,
            }),
            shards: config.shards.max(1),
            max_records: config.max_records.max(1),
        }
    }

    pub fn shard_for(&self, partition_key: &str) -> String {
        let mut hasher = DefaultHasher::new();
        partition_key.hash(&mut hasher);
        let shard = hasher.finish() % u64::from(self.shards);
        format!("shardId-{shard:012}")
    }

    /// Снимок сохранённых записей в порядке приёма.
    pub async fn records(&self) -> Vec<StoredRecord> {
        self.state.read().await.records.iter().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.records.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl StreamSink for MemoryStream {
    fn name(&self) -> &str {
        "memory"
    }

    fn deliver<'a>(&'a self, payload: &'a [u8], partition_key: &'a str) -> DeliverFuture<'a> {
        Box::pin(async move {
            if payload.is_empty() {
                return Err(DeliveryError::format_err("empty payload"));
            }
            if partition_key.is_empty() {
                return Err(DeliveryError::rejected("partition key must not be empty"));
            }

            let shard_id = self.shard_for(partition_key);
            let mut state = self.state.write().await;
            let sequence_number = state.next_sequence;
            state.next_sequence += 1;

            if state.records.len() >= self.max_records {
                state.records.pop_front();
            }
            state.records.push_back(StoredRecord {
                shard_id: shard_id.clone(),
                sequence_number,
                partition_key: partition_key.to_string(),
                payload: payload.to_vec(),
            });
            tracing::trace!(%shard_id, sequence_number, "memory stream append");

            Ok(Receipt::new(shard_id).with_sequence(sequence_number.to_string()))
        })
    }
}

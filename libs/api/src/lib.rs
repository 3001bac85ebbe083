use std::future::Future;
use std::pin::Pin;

mod error;
mod types;
mod util;

pub use error::{DeliveryError, ErrorKind};
pub use types::{DeliveryOutcome, InvocationSummary, Receipt, TelemetryRecord};
pub use util::now_ms;

/// Future returned by [`StreamSink::deliver`].
pub type DeliverFuture<'a> = Pin<Box<dyn Future<Output = Result<Receipt, DeliveryError>> + Send + 'a>>;

// ════════════════════════════════════════════════════════════════
//  Stream Sink
// ════════════════════════════════════════════════════════════════

/// Клиент append-only stream'а (Kinesis, in-memory, ...).
///
/// Единственная операция - записать один непрозрачный payload с
/// partition key. Реализация сама решает, в какой shard попадёт запись,
/// и возвращает `Receipt` с его идентификатором.
///
/// Один экземпляр может использоваться несколькими независимыми
/// producer'ами одновременно, поэтому `Send + Sync`.
pub trait StreamSink: Send + Sync {
    /// Имя sink'а для логов.
    fn name(&self) -> &str;

    /// Записать payload. Ошибка не ретраится вызывающей стороной.
    fn deliver<'a>(&'a self, payload: &'a [u8], partition_key: &'a str) -> DeliverFuture<'a>;
}

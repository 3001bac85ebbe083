use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Deserialize;

use producer::{Pacing, PartitionKey, ProducerConfig};
use sink_kinesis::KinesisSinkConfig;
use sink_memory::MemoryStreamConfig;

use super::error::ProducerCliError;
use super::sink::SinkSettings;

// ═══════════════════════════════════════════════════════════════
//  Config file (TOML)
// ═══════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SinkKind {
    Kinesis,
    Memory,
}

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    pub unit_id: Option<String>,
    pub iterations: Option<u32>,
    pub partition_key: Option<PartitionKey>,
    pub pacing: Option<Pacing>,
    pub seed: Option<u64>,
    pub timeout_secs: Option<u64>,
    pub sink: Option<SinkKind>,
    #[serde(default)]
    pub kinesis: KinesisSection,
    pub memory: Option<MemoryStreamConfig>,
    #[serde(default)]
    pub fleet: FleetSection,
}

/// `[kinesis]` - все поля опциональны, stream_name может прийти из env.
#[derive(Debug, Default, Deserialize)]
pub struct KinesisSection {
    pub stream_name: Option<String>,
    pub region: Option<String>,
    pub endpoint_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct FleetSection {
    pub instances: Option<u32>,
    pub every_secs: Option<u64>,
    pub rounds: Option<u64>,
    pub unit_prefix: Option<String>,
}

pub fn load_config(path: &str) -> Result<Config, ProducerCliError> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| ProducerCliError::Config(format!("cannot read config {path}: {e}")))?;
    parse_config(&content).map_err(|e| ProducerCliError::Config(format!("bad config {path}: {e}")))
}

fn parse_config(content: &str) -> Result<Config, toml::de::Error> {
    toml::from_str(content)
}

// ═══════════════════════════════════════════════════════════════
//  CLI args
// ═══════════════════════════════════════════════════════════════

#[derive(Parser)]
#[command(name = "sensor-producer", about = "Генератор синтетической телеметрии в stream")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Одна invocation: N циклов, затем summary в stdout
    Invoke(InvokeArgs),
    /// Локальный аналог расписания: каждые N секунд запустить группу producer'ов
    Fleet(FleetArgs),
}

#[derive(Args, Clone, Debug)]
pub struct CommonArgs {
    /// Путь к producer.toml
    #[arg(long, default_value = "producer.toml", env = "SENSOR_PRODUCER_CONFIG")]
    pub config: String,

    /// Куда писать записи
    #[arg(long, value_enum)]
    pub sink: Option<SinkKind>,

    /// Имя Kinesis stream'а
    #[arg(long, env = "STREAM_NAME")]
    pub stream_name: Option<String>,

    /// AWS регион
    #[arg(long, env = "AWS_REGION")]
    pub region: Option<String>,

    /// Override Kinesis endpoint (LocalStack и т.п.)
    #[arg(long, env = "KINESIS_ENDPOINT_URL")]
    pub endpoint_url: Option<String>,

    /// Циклов на invocation (по умолчанию 60)
    #[arg(long)]
    pub iterations: Option<u32>,

    /// Фиксированный partition key (по умолчанию "partition_key")
    #[arg(long, conflicts_with = "partition_by_unit")]
    pub partition_key: Option<String>,

    /// Использовать unit id как partition key
    #[arg(long)]
    pub partition_by_unit: bool,

    /// Seed для PRNG (без него - энтропия ОС)
    #[arg(long)]
    pub seed: Option<u64>,

    /// Лимит wall-clock на invocation в секундах (0 = без лимита)
    #[arg(long)]
    pub timeout_secs: Option<u64>,
}

#[derive(Args, Clone, Debug)]
pub struct InvokeArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Идентификатор producer'а
    #[arg(long, env = "FUNCTION_INDEX")]
    pub unit_id: Option<String>,

    /// JSON-файл с event payload (читается, но не используется)
    #[arg(long)]
    pub event: Option<String>,
}

#[derive(Args, Clone, Debug)]
pub struct FleetArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Producer'ов в одном раунде
    #[arg(long)]
    pub instances: Option<u32>,

    /// Период между раундами в секундах
    #[arg(long)]
    pub every_secs: Option<u64>,

    /// Сколько раундов (0 = до Ctrl+C)
    #[arg(long)]
    pub rounds: Option<u64>,

    /// Префикс unit id: <prefix>-<i>
    #[arg(long)]
    pub unit_prefix: Option<String>,
}

// ═══════════════════════════════════════════════════════════════
//  Effective: merged config
// ═══════════════════════════════════════════════════════════════

const DEFAULT_TIMEOUT_SECS: u64 = 180;

/// Итоговая конфигурация после мержа: producer.toml < env/CLI
#[derive(Debug)]
pub struct Effective {
    pub unit_id: Option<String>,
    pub iterations: u32,
    pub partition_key: PartitionKey,
    pub pacing: Pacing,
    pub seed: Option<u64>,
    pub timeout: Option<Duration>,
    pub sink: SinkSettings,
    pub fleet: FleetSection,
}

impl Effective {
    pub fn new(args: &CommonArgs) -> Result<Self, ProducerCliError> {
        let cfg = match load_config(&args.config) {
            Ok(c) => c,
            Err(e) => {
                if std::path::Path::new(&args.config).exists() {
                    return Err(e);
                }
                Config::default()
            }
        };
        Self::merge(args, cfg)
    }

    fn merge(args: &CommonArgs, cfg: Config) -> Result<Self, ProducerCliError> {
        let partition_key = if args.partition_by_unit {
            PartitionKey::UnitId
        } else if let Some(key) = &args.partition_key {
            PartitionKey::Fixed(key.clone())
        } else {
            cfg.partition_key.unwrap_or_default()
        };

        let sink = match args.sink.or(cfg.sink).unwrap_or(SinkKind::Kinesis) {
            SinkKind::Kinesis => {
                let stream_name = args.stream_name.clone().or(cfg.kinesis.stream_name).ok_or_else(|| {
                    ProducerCliError::Config("stream name is required (--stream-name or STREAM_NAME)".into())
                })?;
                SinkSettings::Kinesis(KinesisSinkConfig {
                    stream_name,
                    region: args.region.clone().or(cfg.kinesis.region),
                    endpoint_url: args.endpoint_url.clone().or(cfg.kinesis.endpoint_url),
                })
            }
            SinkKind::Memory => SinkSettings::Memory(cfg.memory.unwrap_or_default()),
        };

        let timeout_secs = args.timeout_secs.or(cfg.timeout_secs).unwrap_or(DEFAULT_TIMEOUT_SECS);

        Ok(Self {
            unit_id: cfg.unit_id,
            iterations: args.iterations.or(cfg.iterations).unwrap_or_else(producer::config::default_iterations),
            partition_key,
            pacing: cfg.pacing.unwrap_or_default(),
            seed: args.seed.or(cfg.seed),
            timeout: (timeout_secs > 0).then(|| Duration::from_secs(timeout_secs)),
            sink,
            fleet: cfg.fleet,
        })
    }

    /// Конфиг одного producer'а. `index` сдвигает seed, чтобы у экземпляров
    /// одного раунда были разные потоки случайности.
    pub fn producer_config(&self, unit_id: &str, index: u64) -> ProducerConfig {
        ProducerConfig {
            unit_id: unit_id.to_string(),
            iterations: self.iterations,
            partition_key: self.partition_key.clone(),
            pacing: self.pacing,
            seed: self.seed.map(|s| s.wrapping_add(index)),
        }
    }
}

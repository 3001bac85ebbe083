use std::sync::Arc;
use std::time::Duration;

use tokio::task::{JoinError, JoinSet};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use producer::ProducerConfig;
use sensor_api::StreamSink;

use super::config::{Effective, FleetArgs};
use super::error::ProducerCliError;
use super::invoke::invoke_one;
use super::sink;

// ═══════════════════════════════════════════════════════════════
//  Fleet plan
// ═══════════════════════════════════════════════════════════════

/// Параметры расписания: каждые `every` запускается `instances`
/// независимых invocation'ов. Раунды могут перекрываться, если
/// invocation длиннее периода.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FleetPlan {
    pub instances: u32,
    pub every: Duration,
    /// 0 = до отмены.
    pub rounds: u64,
    pub unit_prefix: String,
}

impl FleetPlan {
    pub fn new(eff: &Effective, args: &FleetArgs) -> Result<Self, ProducerCliError> {
        let plan = Self {
            instances: args.instances.or(eff.fleet.instances).unwrap_or(5),
            every: Duration::from_secs(args.every_secs.or(eff.fleet.every_secs).unwrap_or(60)),
            rounds: args.rounds.or(eff.fleet.rounds).unwrap_or(0),
            unit_prefix: args
                .unit_prefix
                .clone()
                .or_else(|| eff.fleet.unit_prefix.clone())
                .unwrap_or_else(|| "func".into()),
        };
        if plan.instances == 0 {
            return Err(ProducerCliError::Config("fleet needs at least one instance".into()));
        }
        if plan.every.is_zero() {
            return Err(ProducerCliError::Config("fleet period must be > 0".into()));
        }
        Ok(plan)
    }

    pub fn unit_id(&self, index: u32) -> String {
        format!("{}-{index}", self.unit_prefix)
    }

    pub fn configs(&self, eff: &Effective) -> Vec<ProducerConfig> {
        (0..self.instances)
            .map(|i| eff.producer_config(&self.unit_id(i), u64::from(i)))
            .collect()
    }
}

/// Итог одного раунда.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RoundReport {
    pub round: u64,
    pub finished: u32,
    pub timed_out: u32,
    pub failed: u32,
}

// ═══════════════════════════════════════════════════════════════
//  Entry
// ═══════════════════════════════════════════════════════════════

pub async fn run(eff: &Effective, args: &FleetArgs) -> Result<(), ProducerCliError> {
    let plan = FleetPlan::new(eff, args)?;
    let configs = plan.configs(eff);
    for cfg in &configs {
        cfg.validate()?;
    }

    let sink = sink::build(&eff.sink).await?;

    let token = CancellationToken::new();
    let ctrl_token = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Ctrl+C, no new rounds will be scheduled");
            ctrl_token.cancel();
        }
    });

    let reports = schedule(&plan, configs, sink, eff.timeout, token).await;
    let timed_out: u32 = reports.iter().map(|r| r.timed_out).sum();
    let failed: u32 = reports.iter().map(|r| r.failed).sum();
    tracing::info!(rounds = reports.len(), timed_out, failed, "fleet stopped");
    Ok(())
}

/// Запускать раунды по расписанию, пока не исчерпан `plan.rounds` или не
/// отменён `token`. Уже запущенные invocation'ы всегда дорабатывают.
pub async fn schedule(
    plan: &FleetPlan,
    configs: Vec<ProducerConfig>,
    sink: Arc<dyn StreamSink>,
    budget: Option<Duration>,
    token: CancellationToken,
) -> Vec<RoundReport> {
    let mut ticker = tokio::time::interval(plan.every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut rounds: JoinSet<RoundReport> = JoinSet::new();
    let mut reports = Vec::new();
    let mut round = 0u64;

    tracing::info!(
        instances = plan.instances,
        every_s = plan.every.as_secs(),
        rounds = plan.rounds,
        "fleet started"
    );

    loop {
        if plan.rounds != 0 && round >= plan.rounds {
            break;
        }
        tokio::select! {
            biased;
            _ = token.cancelled() => break,
            _ = ticker.tick() => {
                round += 1;
                rounds.spawn(fire_round(round, configs.clone(), sink.clone(), budget));
            }
        }
        while let Some(res) = rounds.try_join_next() {
            collect(res, &mut reports);
        }
    }

    if !rounds.is_empty() {
        tracing::info!(in_flight = rounds.len(), "waiting for in-flight rounds");
    }
    while let Some(res) = rounds.join_next().await {
        collect(res, &mut reports);
    }

    reports.sort_by_key(|r| r.round);
    reports
}

async fn fire_round(
    round: u64,
    configs: Vec<ProducerConfig>,
    sink: Arc<dyn StreamSink>,
    budget: Option<Duration>,
) -> RoundReport {
    let mut invocations = JoinSet::new();
    for cfg in configs {
        invocations.spawn(invoke_one(cfg, sink.clone(), budget));
    }

    let mut report = RoundReport { round, ..Default::default() };
    while let Some(res) = invocations.join_next().await {
        match res {
            Ok(Ok(summary)) => {
                report.finished += 1;
                tracing::debug!(round, unit_id = %summary.unit_id, "invocation finished");
            }
            Ok(Err(e @ ProducerCliError::Timeout { .. })) => {
                report.timed_out += 1;
                tracing::warn!(round, error = %e, "invocation terminated by budget");
            }
            Ok(Err(e)) => {
                report.failed += 1;
                tracing::error!(round, error = %e, "invocation failed");
            }
            Err(e) => {
                report.failed += 1;
                tracing::error!(round, error = %e, "invocation task panicked");
            }
        }
    }

    tracing::info!(
        round,
        finished = report.finished,
        timed_out = report.timed_out,
        failed = report.failed,
        "round complete"
    );
    report
}

fn collect(res: Result<RoundReport, JoinError>, reports: &mut Vec<RoundReport>) {
    match res {
        Ok(report) => reports.push(report),
        Err(e) => tracing::error!(error = %e, "round task panicked"),
    }
}

#[cfg(test)]
mod tests {
    use sink_memory::{MemoryStream, MemoryStreamConfig};

    use super::*;
    use crate::cmd::config::{Cli, Commands, Config};
    use crate::cmd::sink::SinkSettings;

    fn plan(instances: u32, rounds: u64) -> FleetPlan {
        FleetPlan {
            instances,
            every: Duration::from_secs(60),
            rounds,
            unit_prefix: "func".into(),
        }
    }

    fn configs(plan: &FleetPlan, iterations: u32) -> Vec<ProducerConfig> {
        (0..plan.instances)
            .map(|i| {
                let mut cfg = ProducerConfig::new(plan.unit_id(i));
                cfg.iterations = iterations;
                cfg.seed = Some(u64::from(i));
                cfg
            })
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn each_round_fires_every_instance() {
        let plan = plan(5, 2);
        let stream = Arc::new(MemoryStream::new(&MemoryStreamConfig::default()));
        let reports = schedule(
            &plan,
            configs(&plan, 3),
            stream.clone(),
            Some(Duration::from_secs(180)),
            CancellationToken::new(),
        )
        .await;

        assert_eq!(reports.len(), 2);
        assert!(reports.iter().all(|r| r.finished == 5 && r.timed_out == 0 && r.failed == 0));
        assert_eq!(stream.len().await, 2 * 5 * 3);

        let mut units: Vec<String> = stream
            .records()
            .await
            .iter()
            .map(|r| serde_json::from_slice::<sensor_api::TelemetryRecord>(&r.payload).unwrap().unit_id)
            .collect();
        units.sort();
        units.dedup();
        assert_eq!(units, ["func-0", "func-1", "func-2", "func-3", "func-4"]);
    }

    #[tokio::test(start_paused = true)]
    async fn budget_overrun_counts_as_timeout() {
        let plan = plan(2, 1);
        let stream = Arc::new(MemoryStream::new(&MemoryStreamConfig::default()));
        let reports = schedule(
            &plan,
            configs(&plan, 60),
            stream,
            Some(Duration::from_secs(1)),
            CancellationToken::new(),
        )
        .await;

        assert_eq!(reports, [RoundReport { round: 1, finished: 0, timed_out: 2, failed: 0 }]);
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_before_start_fires_nothing() {
        let plan = plan(3, 0);
        let stream = Arc::new(MemoryStream::new(&MemoryStreamConfig::default()));
        let token = CancellationToken::new();
        token.cancel();

        let reports = schedule(&plan, configs(&plan, 2), stream.clone(), None, token).await;
        assert!(reports.is_empty());
        assert!(stream.is_empty().await);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_lets_in_flight_rounds_finish() {
        let plan = plan(2, 0);
        let stream = Arc::new(MemoryStream::new(&MemoryStreamConfig::default()));
        let token = CancellationToken::new();

        let canceller = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(90)).await;
            canceller.cancel();
        });

        let reports = schedule(&plan, configs(&plan, 4), stream.clone(), None, token).await;
        // Раунды на t=0 и t=60, отмена на t=90.
        assert_eq!(reports.len(), 2);
        assert_eq!(stream.len().await, 2 * 2 * 4);
    }

    #[test]
    fn plan_from_args_and_file() {
        let cli = <Cli as clap::Parser>::try_parse_from([
            "sensor-producer",
            "fleet",
            "--config",
            "/nonexistent/producer.toml",
            "--sink",
            "memory",
            "--instances",
            "3",
        ])
        .unwrap();
        let Commands::Fleet(args) = cli.command else {
            panic!("expected fleet");
        };

        let mut eff = Effective::new(&args.common).unwrap();
        assert!(matches!(eff.sink, SinkSettings::Memory(_)));
        eff.fleet = Config::default().fleet;
        eff.fleet.every_secs = Some(15);

        let plan = FleetPlan::new(&eff, &args).unwrap();
        assert_eq!(plan.instances, 3);
        assert_eq!(plan.every, Duration::from_secs(15));
        assert_eq!(plan.rounds, 0);
        assert_eq!(plan.unit_id(2), "func-2");
        assert_eq!(plan.configs(&eff).len(), 3);
    }
}

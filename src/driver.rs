//! Harness Driver
//!
//! ```text
//!            ┌──────────┐
//!         ┌─▶│ Writer 0 │──┐
//! ┌──────┐│  └──────────┘  │  ┌───────────┐   ┌──────────┐
//! │Driver│┼─▶     ...      ┼─▶│  Barrier  │──▶│ Verifier │──▶ Verdict
//! └──────┘│  ┌──────────┐  │  │ (join all)│   └──────────┘
//!         └─▶│ Writer N │──┘  └───────────┘
//!            └──────────┘
//! ```
//!
//! Writers share nothing: each has its own connection and its own item
//! range. The only ordering the harness enforces is the barrier: the
//! verifier connects only after every writer has returned, so every
//! acknowledged write happened before the first query.

use std::time::{Duration, Instant};

use futures::StreamExt;
use futures::stream::FuturesUnordered;
use tokio::task::JoinHandle;

use crate::config::HarnessConfig;
use crate::error::{HarnessError, Result};
use crate::perf::ExchangeMetrics;
use crate::verifier::{Verdict, Verifier};
use crate::workload::Workload;
use crate::writer::WriterTask;

/// Outcome of one harness run
#[derive(Debug)]
pub struct HarnessReport {
    pub verdict: Verdict,
    pub writes: u64,
    pub write_elapsed: Duration,
    pub total_elapsed: Duration,
    pub metrics: ExchangeMetrics,
}

pub struct Harness {
    config: HarnessConfig,
    workload: Workload,
}

impl Harness {
    pub fn new(config: HarnessConfig) -> Result<Self> {
        config.validate()?;
        let workload = Workload::from(&config.workload);
        Ok(Self { config, workload })
    }

    /// Write phase, barrier, then verification.
    pub async fn run(&self) -> Result<HarnessReport> {
        let started = Instant::now();
        let metrics = self.write_phase().await?;
        let write_elapsed = started.elapsed();
        metrics.log_summary(write_elapsed);

        let verdict = self.verify().await?;

        Ok(HarnessReport {
            verdict,
            writes: metrics.exchanges,
            write_elapsed,
            total_elapsed: started.elapsed(),
            metrics,
        })
    }

    /// Spawn one writer per worker and wait for all of them.
    ///
    /// The first writer error aborts the remaining writers and is returned.
    pub async fn write_phase(&self) -> Result<ExchangeMetrics> {
        let addr = self.config.server.addr();
        let w = self.workload;
        tracing::info!(
            workers = w.worker_count,
            items_per_worker = w.item_amount,
            tables = w.table_amount,
            "Running {} writers, each adds {} items to each of {} tables",
            w.worker_count,
            w.item_amount,
            w.table_amount
        );

        let mut pending: FuturesUnordered<JoinHandle<Result<ExchangeMetrics>>> = w
            .workers()
            .map(|worker| {
                let task = WriterTask::new(worker, w);
                tokio::spawn(task.run(addr.clone(), self.config.network.clone()))
            })
            .collect();

        // Barrier: drain every handle before returning.
        let mut merged = ExchangeMetrics::new(1);
        while let Some(joined) = pending.next().await {
            let outcome = match joined {
                Ok(result) => result,
                Err(e) => Err(HarnessError::WorkerJoin(e.to_string())),
            };
            match outcome {
                Ok(metrics) => merged.merge(&metrics),
                Err(e) => {
                    tracing::error!(error = %e, "Writer failed, aborting remaining writers");
                    for handle in pending.iter() {
                        handle.abort();
                    }
                    return Err(e);
                }
            }
        }

        if merged.exchanges != w.total_writes() {
            return Err(HarnessError::WorkerJoin(format!(
                "writers reported {} exchanges, expected {}",
                merged.exchanges,
                w.total_writes()
            )));
        }
        tracing::info!(writes = merged.exchanges, "All writers joined");
        Ok(merged)
    }

    pub async fn verify(&self) -> Result<Verdict> {
        let addr = self.config.server.addr();
        Verifier::new(self.workload)
            .run(&addr, &self.config.network)
            .await
    }
}

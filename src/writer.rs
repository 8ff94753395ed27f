//! Writer Task
//!
//! One per worker. Opens a private connection and adds every item the
//! worker owns to every table, table-major, one exchange at a time. The
//! first failed exchange ends the task with that error.

use std::time::Instant;

use tokio::io::{AsyncRead, AsyncWrite};

use crate::config::NetworkConfig;
use crate::connection::Connection;
use crate::core_types::WorkerIndex;
use crate::error::Result;
use crate::perf::ExchangeMetrics;
use crate::protocol::Command;
use crate::workload::Workload;

/// Latency sample rate for write exchanges.
const LATENCY_SAMPLE_RATE: usize = 16;

pub struct WriterTask {
    pub worker: WorkerIndex,
    pub workload: Workload,
}

impl WriterTask {
    pub fn new(worker: WorkerIndex, workload: Workload) -> Self {
        Self { worker, workload }
    }

    /// Connect to `addr`, write this worker's slice, close.
    pub async fn run(self, addr: String, network: NetworkConfig) -> Result<ExchangeMetrics> {
        let conn = Connection::connect(&addr, &network).await?;
        tracing::info!(worker = self.worker, addr = %addr, "Writer connected");
        self.run_on(conn).await
    }

    /// Write this worker's slice over an already open connection, then close it.
    pub async fn run_on<S>(self, mut conn: Connection<S>) -> Result<ExchangeMetrics>
    where
        S: AsyncRead + AsyncWrite + Unpin + Send,
    {
        let items = self.workload.item_range(self.worker);
        let mut metrics = ExchangeMetrics::new(LATENCY_SAMPLE_RATE);

        for table in self.workload.tables() {
            for item in items.clone() {
                let cmd = Command::Add { table, item };
                let started = Instant::now();
                conn.send_ack(&cmd.to_bytes()).await?;
                metrics.record(started.elapsed());
            }
        }

        conn.close().await?;
        tracing::info!(
            worker = self.worker,
            writes = metrics.exchanges,
            expected = self.workload.writes_per_worker(),
            item_start = items.start,
            item_end = items.end,
            "Writer finished"
        );
        Ok(metrics)
    }
}

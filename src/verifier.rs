//! Verifier
//!
//! Runs after every writer has joined. Queries each table over one fresh
//! connection and compares the reported item count with
//! `item_amount * worker_count`. Stops at the first table that disagrees.

use serde_json::Value;
use tokio::io::{AsyncRead, AsyncWrite};

use crate::config::NetworkConfig;
use crate::connection::Connection;
use crate::core_types::TableId;
use crate::error::{HarnessError, Result};
use crate::protocol::Command;
use crate::workload::Workload;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Every table reported the expected count.
    Pass { tables: u32 },
    /// First table whose count was wrong. Later tables were not queried.
    Fail {
        table: TableId,
        expected: usize,
        actual: usize,
    },
}

impl Verdict {
    pub fn is_pass(&self) -> bool {
        matches!(self, Verdict::Pass { .. })
    }

    /// The failure as an error, for callers that propagate with `?`.
    pub fn into_result(self) -> Result<u32> {
        match self {
            Verdict::Pass { tables } => Ok(tables),
            Verdict::Fail {
                table,
                expected,
                actual,
            } => Err(HarnessError::CountMismatch {
                table,
                expected,
                actual,
            }),
        }
    }
}

/// Element count of a parsed query reply.
///
/// Arrays count their elements and objects their keys. Anything else is an
/// error so a garbage reply can never pass as "zero items".
pub fn element_count(value: &Value) -> Result<usize> {
    match value {
        Value::Array(items) => Ok(items.len()),
        Value::Object(map) => Ok(map.len()),
        other => Err(HarnessError::NotAnArray(truncate(other.to_string(), 64))),
    }
}

fn truncate(mut s: String, max: usize) -> String {
    if s.len() > max {
        let mut cut = max;
        while !s.is_char_boundary(cut) {
            cut -= 1;
        }
        s.truncate(cut);
        s.push_str("...");
    }
    s
}

pub struct Verifier {
    workload: Workload,
}

impl Verifier {
    pub fn new(workload: Workload) -> Self {
        Self { workload }
    }

    pub async fn run(&self, addr: &str, network: &NetworkConfig) -> Result<Verdict> {
        let conn = Connection::connect(addr, network).await?;
        tracing::info!(addr, "=== Checking ===");
        self.run_on(conn).await
    }

    pub async fn run_on<S>(&self, mut conn: Connection<S>) -> Result<Verdict>
    where
        S: AsyncRead + AsyncWrite + Unpin + Send,
    {
        let expected = self.workload.expected_per_table();

        for table in self.workload.tables() {
            let reply = conn
                .send_and_accumulate(&Command::Query { table }.to_bytes())
                .await?;
            let actual = element_count(&reply)?;
            tracing::debug!(table, actual, "Table checked");

            if actual != expected {
                tracing::error!(table, expected, actual, "Table has incorrect amount of items");
                // Best-effort close: the verdict is already decided.
                if let Err(e) = conn.close().await {
                    tracing::warn!(error = %e, "Close after mismatch failed");
                }
                return Ok(Verdict::Fail {
                    table,
                    expected,
                    actual,
                });
            }
        }

        conn.close().await?;
        tracing::info!(
            tables = self.workload.table_amount,
            expected,
            "All tables have the correct amount of items"
        );
        Ok(Verdict::Pass {
            tables: self.workload.table_amount,
        })
    }
}

//! In-process table store speaking the harness wire protocol.
//!
//! Used by the end-to-end tests and the `mock_store` binary. Every accepted
//! connection gets its own task. Tables live in a `DashMap`.
//!
//! A [`Fault`] makes the store misbehave in one specific, observable way.

use std::collections::BTreeSet;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use serde_json::json;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

use crate::config::FramingKind;
use crate::core_types::{ItemId, TableId};
use crate::framing::{self, Framing};
use crate::protocol::Command;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Fault {
    #[default]
    None,
    /// Report `delta` more (or fewer) items than stored for one table.
    CountSkew { table: TableId, delta: i32 },
    /// Answer every table query with exactly `read_capacity` bytes.
    FixedChunk,
    /// Answer every table query with text that is not JSON.
    Malformed,
}

#[derive(Debug, Clone, Copy)]
pub struct MockOptions {
    pub fault: Fault,
    pub framing: FramingKind,
    pub read_capacity: usize,
}

impl Default for MockOptions {
    fn default() -> Self {
        Self {
            fault: Fault::None,
            framing: FramingKind::ShortRead,
            read_capacity: 512,
        }
    }
}

#[derive(Debug, Default)]
pub struct MockStore {
    tables: DashMap<TableId, BTreeSet<ItemId>>,
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` if the item was already present.
    pub fn add(&self, table: TableId, item: ItemId) -> bool {
        self.tables.entry(table).or_default().insert(item)
    }

    pub fn remove(&self, table: TableId, item: ItemId) -> bool {
        self.tables
            .get_mut(&table)
            .map(|mut items| items.remove(&item))
            .unwrap_or(false)
    }

    pub fn contains(&self, table: TableId, item: ItemId) -> bool {
        self.tables
            .get(&table)
            .map(|items| items.contains(&item))
            .unwrap_or(false)
    }

    pub fn items(&self, table: TableId) -> Vec<ItemId> {
        self.tables
            .get(&table)
            .map(|items| items.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn len(&self, table: TableId) -> usize {
        self.tables.get(&table).map(|items| items.len()).unwrap_or(0)
    }
}

pub struct MockServer {
    addr: SocketAddr,
    store: Arc<MockStore>,
    accept_loop: JoinHandle<()>,
}

impl MockServer {
    /// Listen on an ephemeral loopback port.
    pub async fn start(options: MockOptions) -> std::io::Result<Self> {
        Self::bind("127.0.0.1:0", options).await
    }

    pub async fn bind(addr: &str, options: MockOptions) -> std::io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        let addr = listener.local_addr()?;
        let store = Arc::new(MockStore::new());

        let accept_store = store.clone();
        let accept_loop = tokio::spawn(async move {
            let mut failures = 0u32;
            loop {
                let (socket, peer) = match listener.accept().await {
                    Ok(accepted) => {
                        failures = 0;
                        accepted
                    }
                    Err(e) => {
                        failures = failures.saturating_add(1);
                        let pause = accept_backoff(failures);
                        tracing::warn!(error = %e, failures, ?pause, "Mock store accept failed");
                        tokio::time::sleep(pause).await;
                        continue;
                    }
                };
                tracing::debug!(%peer, "Mock store accepted connection");
                tokio::spawn(serve(socket, accept_store.clone(), options));
            }
        });

        tracing::info!(%addr, fault = ?options.fault, "Mock store listening");
        Ok(Self {
            addr,
            store,
            accept_loop,
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn store(&self) -> &MockStore {
        &self.store
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        self.accept_loop.abort();
    }
}

/// Pause before retrying `accept` after `failures` errors in a row.
/// Doubles from 10ms, capped at one second.
fn accept_backoff(failures: u32) -> Duration {
    const BASE_MS: u64 = 10;
    const MAX_MS: u64 = 1_000;
    let shift = failures.saturating_sub(1).min(16);
    Duration::from_millis((BASE_MS << shift).min(MAX_MS))
}

async fn serve(mut socket: TcpStream, store: Arc<MockStore>, options: MockOptions) {
    let framing: Box<dyn Framing> = framing::from_kind(options.framing, options.read_capacity);
    loop {
        let request = match framing.read_message(&mut socket).await {
            Ok(req) if !req.is_empty() => req,
            // EOF or a broken frame: the client is gone.
            _ => return,
        };

        let response = respond(&request, &store, &options);
        if let Err(e) = framing.write_message(&mut socket, &response).await {
            tracing::debug!(error = %e, "Mock store write failed");
            return;
        }
    }
}

fn respond(request: &[u8], store: &MockStore, options: &MockOptions) -> Vec<u8> {
    let cmd = match std::str::from_utf8(request).ok().and_then(Command::parse) {
        Some(cmd) => cmd,
        None => return b"wrong api".to_vec(),
    };

    match cmd {
        Command::Add { table, item } => {
            store.add(table, item);
            b"OK".to_vec()
        }
        Command::Remove { table, item } => {
            store.remove(table, item);
            b"OK".to_vec()
        }
        Command::QueryOne { table, item } => {
            let body = if store.contains(table, item) {
                json!({ "item_id": item, "table_id": table })
            } else {
                json!({ "msg": "not found" })
            };
            body.to_string().into_bytes()
        }
        Command::Query { table } => query_response(table, store, options),
    }
}

fn query_response(table: TableId, store: &MockStore, options: &MockOptions) -> Vec<u8> {
    let mut items = store.items(table);

    match options.fault {
        Fault::None => {}
        Fault::CountSkew {
            table: skewed,
            delta,
        } if skewed == table => {
            if delta < 0 {
                let keep = items.len().saturating_sub(delta.unsigned_abs() as usize);
                items.truncate(keep);
            } else {
                items.extend((0..delta as u32).map(|k| u32::MAX - k));
            }
        }
        Fault::CountSkew { .. } => {}
        Fault::FixedChunk => {
            // "[]" padded with whitespace: valid JSON, exactly one full read.
            let mut body = vec![b' '; options.read_capacity.max(2)];
            body[0] = b'[';
            body[1] = b']';
            return body;
        }
        Fault::Malformed => {
            if items.is_empty() {
                return b"]".to_vec();
            }
            let listed: Vec<String> = items
                .iter()
                .map(|item| format!("{{item_id: {}, table_id: {}}}", item, table))
                .collect();
            return format!("[{}]", listed.join(", ")).into_bytes();
        }
    }

    serde_json::to_vec(&items).unwrap_or_else(|_| b"[]".to_vec())
}

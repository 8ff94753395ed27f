//! table_hammer - concurrent writer / verifier harness
//!
//! Populates a fixed grid of (table, item) pairs on a remote store from many
//! independent writers at once, waits for every writer to finish, then
//! queries each table and checks it holds exactly the expected item count.
//!
//! # Modules
//!
//! - [`config`] - Harness configuration (YAML + defaults)
//! - [`protocol`] - Wire commands (`POST /add/..`, `GET /query/..`)
//! - [`framing`] - Message delimiting (short-read, length-prefixed)
//! - [`connection`] - One owned socket with ack / accumulate exchanges
//! - [`workload`] - Table range and per-worker item partition
//! - [`writer`] - Writer task, one per worker
//! - [`verifier`] - Post-barrier item count check
//! - [`driver`] - Spawn writers, join all, verify
//! - [`perf`] - Write latency sampling
//! - [`mock_server`] - In-process store for tests (feature `mock-server`)

// Core types - must be first!
pub mod core_types;

pub mod config;
pub mod connection;
pub mod driver;
pub mod error;
pub mod framing;
pub mod logging;
pub mod perf;
pub mod protocol;
pub mod verifier;
pub mod workload;
pub mod writer;

#[cfg(feature = "mock-server")]
pub mod mock_server;

// Convenient re-exports at crate root
pub use config::{FramingKind, HarnessConfig};
pub use connection::Connection;
pub use core_types::{ItemId, TableId, WorkerIndex};
pub use driver::{Harness, HarnessReport};
pub use error::{HarnessError, Result};
pub use framing::{Framing, LengthPrefixedFraming, ShortReadFraming};
pub use protocol::Command;
pub use verifier::{Verdict, Verifier};
pub use workload::Workload;
pub use writer::WriterTask;

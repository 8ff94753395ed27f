//! Connection - one socket, one owner
//!
//! Each writer and the verifier opens its own `Connection` right before use
//! and closes it when done. A connection is never shared between tasks.
//!
//! Two exchanges:
//! - [`Connection::send_ack`]: send a command, wait for any reply, ignore it.
//! - [`Connection::send_and_accumulate`]: send a command, reassemble the reply
//!   across reads, parse it as JSON.
//!
//! Socket failures are returned, never retried.

use std::future::Future;
use std::time::Duration;

use serde_json::Value;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;

use crate::config::NetworkConfig;
use crate::error::{HarnessError, Result};
use crate::framing::{self, Framing};

pub struct Connection<S = TcpStream> {
    stream: S,
    framing: Box<dyn Framing>,
    read_timeout: Option<Duration>,
    peer: String,
}

impl Connection<TcpStream> {
    /// Open a TCP connection to `addr` with the configured framing.
    pub async fn connect(addr: &str, network: &NetworkConfig) -> Result<Self> {
        let stream = TcpStream::connect(addr)
            .await
            .map_err(|source| HarnessError::Connect {
                addr: addr.to_string(),
                source,
            })?;
        stream.set_nodelay(true)?;

        let framing = framing::from_kind(network.framing, network.read_capacity);
        tracing::debug!(addr, framing = framing.name(), "Connected");

        Ok(Self::from_stream(
            stream,
            framing,
            network.read_timeout(),
            addr,
        ))
    }
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    pub fn from_stream(
        stream: S,
        framing: Box<dyn Framing>,
        read_timeout: Option<Duration>,
        peer: impl Into<String>,
    ) -> Self {
        Self {
            stream,
            framing,
            read_timeout,
            peer: peer.into(),
        }
    }

    /// Send `payload`, then consume one acknowledgement. The acknowledgement
    /// content is never inspected; empty and error replies both count.
    pub async fn send_ack(&mut self, payload: &[u8]) -> Result<()> {
        self.framing.write_message(&mut self.stream, payload).await?;
        let read_timeout = self.read_timeout;
        with_timeout(read_timeout, self.framing.read_ack(&mut self.stream)).await
    }

    /// Send `payload`, wait for the full reply and parse it as JSON.
    ///
    /// Blocks until the framing says the reply is complete, bounded only by
    /// the configured read timeout.
    pub async fn send_and_accumulate(&mut self, payload: &[u8]) -> Result<Value> {
        self.framing.write_message(&mut self.stream, payload).await?;
        let read_timeout = self.read_timeout;
        let raw = with_timeout(read_timeout, self.framing.read_message(&mut self.stream)).await?;
        let text = String::from_utf8(raw)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Shut down the write half and drop the socket.
    pub async fn close(mut self) -> Result<()> {
        self.stream.shutdown().await?;
        tracing::debug!(peer = %self.peer, "Connection closed");
        Ok(())
    }
}

async fn with_timeout<T>(
    read_timeout: Option<Duration>,
    fut: impl Future<Output = Result<T>>,
) -> Result<T> {
    match read_timeout {
        Some(after) => tokio::time::timeout(after, fut)
            .await
            .map_err(|_| HarnessError::Timeout { after })?,
        None => fut.await,
    }
}

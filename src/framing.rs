//! Message framing
//!
//! How a message is delimited on the socket, kept apart from what the
//! message means. The store under test speaks [`ShortReadFraming`]:
//! a response ends at the first read that returns fewer bytes than the read
//! capacity. That rule cannot tell "complete, exactly `capacity * n` bytes"
//! from "more pending", so such a response never terminates.
//! [`LengthPrefixedFraming`] is the drop-in alternative without that gap.

use std::fmt;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::config::FramingKind;
use crate::error::{HarnessError, Result};

pub type Reader<'a> = dyn AsyncRead + Unpin + Send + 'a;
pub type Writer<'a> = dyn AsyncWrite + Unpin + Send + 'a;

#[async_trait]
pub trait Framing: Send + Sync + fmt::Debug {
    /// Framing name for logging
    fn name(&self) -> &'static str;

    /// Send one whole message.
    async fn write_message(&self, writer: &mut Writer<'_>, payload: &[u8]) -> Result<()>;

    /// Consume one acknowledgement without looking at it.
    async fn read_ack(&self, reader: &mut Reader<'_>) -> Result<()>;

    /// Receive one whole message, reassembled from as many reads as it takes.
    async fn read_message(&self, reader: &mut Reader<'_>) -> Result<Vec<u8>>;
}

/// Build the framing selected in configuration.
pub fn from_kind(kind: FramingKind, read_capacity: usize) -> Box<dyn Framing> {
    match kind {
        FramingKind::ShortRead => Box::new(ShortReadFraming::new(read_capacity)),
        FramingKind::LengthPrefixed => Box::new(LengthPrefixedFraming),
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ShortReadFraming {
    capacity: usize,
}

impl ShortReadFraming {
    pub const DEFAULT_CAPACITY: usize = 512;

    pub fn new(capacity: usize) -> Self {
        Self { capacity }
    }
}

impl Default for ShortReadFraming {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}

#[async_trait]
impl Framing for ShortReadFraming {
    fn name(&self) -> &'static str {
        "short_read"
    }

    async fn write_message(&self, writer: &mut Writer<'_>, payload: &[u8]) -> Result<()> {
        writer.write_all(payload).await?;
        writer.flush().await?;
        Ok(())
    }

    async fn read_ack(&self, reader: &mut Reader<'_>) -> Result<()> {
        let mut buf = vec![0u8; self.capacity];
        let _ = reader.read(&mut buf).await?;
        Ok(())
    }

    async fn read_message(&self, reader: &mut Reader<'_>) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; self.capacity];
        let mut message = Vec::new();
        loop {
            let n = reader.read(&mut buf).await?;
            message.extend_from_slice(&buf[..n]);
            // A full read means "maybe more". EOF (n == 0) is short too.
            if n < self.capacity {
                return Ok(message);
            }
        }
    }
}

/// `u32` big-endian length, then the payload.
#[derive(Debug, Clone, Copy, Default)]
pub struct LengthPrefixedFraming;

impl LengthPrefixedFraming {
    /// Largest frame accepted in either direction.
    pub const MAX_FRAME_LEN: usize = 16 * 1024 * 1024;
}

#[async_trait]
impl Framing for LengthPrefixedFraming {
    fn name(&self) -> &'static str {
        "length_prefixed"
    }

    async fn write_message(&self, writer: &mut Writer<'_>, payload: &[u8]) -> Result<()> {
        if payload.len() > Self::MAX_FRAME_LEN {
            return Err(HarnessError::FrameTooLarge(payload.len()));
        }
        writer.write_u32(payload.len() as u32).await?;
        writer.write_all(payload).await?;
        writer.flush().await?;
        Ok(())
    }

    async fn read_ack(&self, reader: &mut Reader<'_>) -> Result<()> {
        self.read_message(reader).await.map(|_| ())
    }

    async fn read_message(&self, reader: &mut Reader<'_>) -> Result<Vec<u8>> {
        let len = reader.read_u32().await? as usize;
        if len > Self::MAX_FRAME_LEN {
            return Err(HarnessError::FrameTooLarge(len));
        }
        let mut message = vec![0u8; len];
        reader.read_exact(&mut message).await?;
        Ok(message)
    }
}

//! Output composer.
//!
//! An [`OutputBuffer`] is a bounded, append-only sink written by output
//! handlers while a machine runs. Writes never go past the capacity: a write
//! that does not fit is cut short and the buffer is marked truncated.
//!
//! Layout with `header_size = H` and `auto_terminate` on:
//!
//! ```text
//! [ header (H bytes) | body ... | 0 | unused ]
//! ```
//!
//! The header is never touched by body writes; handlers may keep binary
//! state there through [`OutputBuffer::header_mut`].

use crate::config::{EngineConfig, OutputConfig};
use crate::error::FsmError;
use crate::state::State;
use std::sync::Arc;

/// Side effect run when an entry matches.
pub trait OutputHandler {
    /// Called with the source and target states and the bytes the entry consumed.
    fn on_transition(&self, from: &State, to: &State, matched: &[u8], out: &mut OutputBuffer);
}

impl<F> OutputHandler for F
where
    F: Fn(&State, &State, &[u8], &mut OutputBuffer),
{
    fn on_transition(&self, from: &State, to: &State, matched: &[u8], out: &mut OutputBuffer) {
        self(from, to, matched, out)
    }
}

/// Shared handler; the same handler is usually attached to many entries.
pub type Handler = Arc<dyn OutputHandler + Send + Sync>;

/// Wraps a closure as a [`Handler`].
pub fn handler<F>(f: F) -> Handler
where
    F: Fn(&State, &State, &[u8], &mut OutputBuffer) + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Bounded output sink.
#[derive(Debug, Clone)]
pub struct OutputBuffer {
    buf: Vec<u8>,
    pos: usize,
    config: OutputConfig,
    truncated: bool,
}

impl OutputBuffer {
    /// Creates a zeroed buffer of `capacity` bytes.
    pub fn new(capacity: usize, config: OutputConfig) -> Result<Self, FsmError> {
        let reserved = config.header_size + usize::from(config.auto_terminate);
        if reserved > capacity {
            return Err(FsmError::OutputLayout { reserved, capacity });
        }

        Ok(Self {
            buf: vec![0; capacity],
            pos: 0,
            config,
            truncated: false,
        })
    }

    /// Creates a buffer sized and laid out by an engine configuration.
    pub fn from_config(config: &EngineConfig) -> Result<Self, FsmError> {
        Self::new(config.limits.max_output_size, config.output.clone())
    }

    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    pub fn config(&self) -> &OutputConfig {
        &self.config
    }

    /// Write position; zero until the first write.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Last usable byte offset for body writes.
    fn limit(&self) -> usize {
        self.buf.len() - usize::from(self.config.auto_terminate)
    }

    fn body_start(&self) -> usize {
        self.pos.max(self.config.header_size)
    }

    /// Bytes that can still be appended.
    pub fn remaining(&self) -> usize {
        self.limit().saturating_sub(self.body_start())
    }

    /// True once any write has been cut short since the last reset.
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    /// Appends as much of `bytes` as fits and returns the number written.
    pub fn write(&mut self, bytes: &[u8]) -> usize {
        let start = self.body_start();
        let n = bytes.len().min(self.remaining());
        self.buf[start..start + n].copy_from_slice(&bytes[..n]);
        self.pos = start + n;

        if n < bytes.len() {
            if !self.truncated {
                tracing::warn!(
                    wanted = bytes.len(),
                    written = n,
                    capacity = self.buf.len(),
                    "output truncated"
                );
            }
            self.truncated = true;
        }
        n
    }

    /// Appends all of `bytes` or nothing.
    pub fn try_write(&mut self, bytes: &[u8]) -> Result<(), FsmError> {
        let remaining = self.remaining();
        if bytes.len() > remaining {
            return Err(FsmError::OutputFull {
                needed: bytes.len(),
                remaining,
            });
        }
        self.write(bytes);
        Ok(())
    }

    /// Caller-reserved region at the front of the buffer.
    pub fn header(&self) -> &[u8] {
        &self.buf[..self.config.header_size]
    }

    pub fn header_mut(&mut self) -> &mut [u8] {
        &mut self.buf[..self.config.header_size]
    }

    /// Bytes written after the header.
    pub fn body(&self) -> &[u8] {
        if self.pos == 0 {
            return &[];
        }
        &self.buf[self.config.header_size..self.pos]
    }

    /// Body decoded as UTF-8, replacing invalid sequences.
    pub fn body_lossy(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(self.body())
    }

    /// Header and body, without the terminator.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.body_start()]
    }

    /// Header, body and terminator; `None` unless `auto_terminate` is set.
    pub fn terminated(&self) -> Option<&[u8]> {
        self.config
            .auto_terminate
            .then(|| &self.buf[..self.body_start() + 1])
    }

    /// Clears contents and rewinds to the start.
    pub fn reset(&mut self) {
        self.buf.fill(0);
        self.pos = 0;
        self.truncated = false;
    }

    /// Leaves the buffer in its terminated state after a run.
    pub fn finish(&mut self) {
        if self.config.auto_terminate {
            let end = self.body_start();
            self.buf[end] = 0;
        }
    }
}

impl std::fmt::Write for OutputBuffer {
    fn write_str(&mut self, s: &str) -> std::fmt::Result {
        if self.write(s.as_bytes()) < s.len() {
            return Err(std::fmt::Error);
        }
        Ok(())
    }
}

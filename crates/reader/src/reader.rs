//! Per-partition reader: construction, iteration, and teardown of one read
//! session.
//!
//! Responsibilities:
//! - open an authenticated channel and the partition batch stream;
//! - expose the engine-facing pull contract (`has_next` / `current_batch`);
//! - own the arena, channel, and cursor as one releasable unit.
//!
//! Teardown order is strict: cursor first (ends the RPC), channel second
//! (transport resources), arena last, so no column vector can outlive the
//! stream that produced it while transport buffers are being torn down.
//! Partial construction failures release whatever was already acquired
//! before the original error propagates.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use colflux_common::metrics::global_metrics;
use colflux_common::{Credentials, Endpoint, FluxError, MemoryArena, ReaderConfig, Result};
use tracing::{debug, info, warn};

use crate::adapter::{self, ColumnarBatch};
use crate::auth::{AuthenticatedChannel, SessionAuthenticator};
use crate::cursor::BatchStreamCursor;

/// Opaque partition ticket, forwarded verbatim to the remote service.
#[derive(Clone, PartialEq, Eq)]
pub struct Ticket(Vec<u8>);

impl Ticket {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// Tickets are opaque and may embed query text; log their size, never their
// contents.
impl fmt::Debug for Ticket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ticket({} bytes)", self.0.len())
    }
}

/// Reads one remote partition as a sequence of columnar batches.
///
/// One reader per partition, driven by one consumer task; the reader has no
/// internal locking and is not safe for concurrent use without external
/// synchronization. Partition-parallel reads construct one reader per
/// partition.
pub struct PartitionReader {
    cursor: Option<BatchStreamCursor>,
    channel: Option<AuthenticatedChannel>,
    arena: Arc<MemoryArena>,
    endpoint_label: String,
    rows_read: u64,
    closed: bool,
}

// The cursor and channel wrap transport state that is not itself `Debug`;
// summarize the reader's observable state instead of its internals.
impl fmt::Debug for PartitionReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PartitionReader")
            .field("endpoint", &self.endpoint_label)
            .field("rows_read", &self.rows_read)
            .field("closed", &self.closed)
            .field("open", &(self.cursor.is_some() && self.channel.is_some()))
            .finish()
    }
}

impl PartitionReader {
    /// Open an authenticated session and start the partition stream.
    ///
    /// Acquisition order is arena, channel, cursor; any later failure
    /// releases everything acquired earlier before the error is returned.
    pub async fn connect(
        ticket: Ticket,
        endpoint: Endpoint,
        credentials: Credentials,
        config: ReaderConfig,
    ) -> Result<Self> {
        let endpoint_label = endpoint.label();
        let auth_timeout = Duration::from_millis(config.auth_timeout_ms);
        let advance_timeout = Duration::from_millis(config.advance_timeout_ms);
        info!(
            endpoint = %endpoint_label,
            ticket_len = ticket.len(),
            "opening partition reader"
        );

        let arena = MemoryArena::new();
        let channel = match SessionAuthenticator::open(&endpoint, &credentials, auth_timeout).await
        {
            Ok(channel) => channel,
            Err(e) => {
                global_metrics().record_error(&endpoint_label, error_class(&e));
                arena.release();
                return Err(e);
            }
        };

        let cursor =
            match BatchStreamCursor::open(&channel, &ticket, Arc::clone(&arena), advance_timeout)
                .await
            {
                Ok(cursor) => cursor,
                Err(e) => {
                    global_metrics().record_error(&endpoint_label, error_class(&e));
                    drop(channel);
                    arena.release();
                    return Err(e);
                }
            };

        Ok(Self {
            cursor: Some(cursor),
            channel: Some(channel),
            arena,
            endpoint_label,
            rows_read: 0,
            closed: false,
        })
    }

    /// Advance to the next batch; `false` means the partition is exhausted.
    ///
    /// This is the reader's only suspension point: one network receive,
    /// bounded by the configured advance deadline.
    pub async fn has_next(&mut self) -> Result<bool> {
        if self.closed {
            return Err(FluxError::Closed("reader is closed".to_string()));
        }
        let cursor = self
            .cursor
            .as_mut()
            .ok_or_else(|| FluxError::Closed("reader is closed".to_string()))?;
        let started = Instant::now();
        match cursor.advance().await {
            Ok(true) => {
                let batch = cursor.current_wire_batch()?;
                let rows = batch.num_rows() as u64;
                let bytes = batch.get_array_memory_size() as u64;
                self.rows_read += rows;
                global_metrics().record_advance(
                    &self.endpoint_label,
                    rows,
                    bytes,
                    started.elapsed().as_secs_f64(),
                );
                Ok(true)
            }
            Ok(false) => {
                debug!(
                    endpoint = %self.endpoint_label,
                    rows_read = self.rows_read,
                    "partition stream exhausted"
                );
                Ok(false)
            }
            Err(e) => {
                global_metrics().record_error(&self.endpoint_label, error_class(&e));
                warn!(endpoint = %self.endpoint_label, error = %e, "advance failed");
                Err(e)
            }
        }
    }

    /// Materialize the current batch as native column vectors.
    ///
    /// The returned batch shares buffers with the current wire batch and is
    /// valid only until the next `has_next` call or `close`.
    pub fn current_batch(&self) -> Result<ColumnarBatch> {
        if self.closed {
            return Err(FluxError::Closed("reader is closed".to_string()));
        }
        let cursor = self
            .cursor
            .as_ref()
            .ok_or_else(|| FluxError::Closed("reader is closed".to_string()))?;
        let wire = cursor.current_wire_batch()?;
        adapter::materialize(wire)
    }

    /// Total rows delivered so far.
    pub fn rows_read(&self) -> u64 {
        self.rows_read
    }

    /// Bytes currently covered by this reader's arena.
    pub fn arena_in_use_bytes(&self) -> usize {
        self.arena.in_use_bytes()
    }

    /// Release the cursor, then the channel, then the arena.
    ///
    /// Idempotent and callable from any state. Teardown problems are logged
    /// at `warn` and swallowed so they cannot mask the error that caused the
    /// close.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        if let Some(mut cursor) = self.cursor.take() {
            cursor.close();
        }
        // The channel goes after the stream it carried.
        drop(self.channel.take());
        let outstanding = self.arena.release();
        if outstanding > 0 {
            warn!(
                endpoint = %self.endpoint_label,
                outstanding_bytes = outstanding,
                "arena released with live leases"
            );
        }
        info!(
            endpoint = %self.endpoint_label,
            rows_read = self.rows_read,
            "partition reader closed"
        );
    }
}

impl Drop for PartitionReader {
    fn drop(&mut self) {
        self.close();
    }
}

fn error_class(e: &FluxError) -> &'static str {
    match e {
        FluxError::CredentialsRejected(_) => "credentials_rejected",
        FluxError::Unreachable(_) => "unreachable",
        FluxError::Transport(_) => "transport",
        FluxError::Adapter(_) => "adapter",
        FluxError::Contract(_) => "contract",
        FluxError::Closed(_) => "closed",
        FluxError::Timeout(_) => "timeout",
        FluxError::InvalidConfig(_) => "invalid_config",
        FluxError::Io(_) => "io",
    }
}

//! Pull-based cursor over one partition's batch stream.
//!
//! One cursor wraps one server-streaming call. The cursor holds at most one
//! live batch; advancing drops the previous batch and its arena lease before
//! the next receive, so a wire batch reference is never valid across an
//! advance.

use std::sync::Arc;
use std::time::Duration;

use arrow::record_batch::RecordBatch;
use arrow_schema::SchemaRef;
use colflux_common::{ArenaLease, FluxError, MemoryArena, Result};
use tonic::Streaming;
use tracing::debug;

use crate::auth::AuthenticatedChannel;
use crate::codec;
use crate::grpc::v1;
use crate::reader::Ticket;

/// Cursor lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorState {
    /// The stream is open and more batches may arrive.
    Streaming,
    /// The server ended the stream; no more batches.
    Exhausted,
    /// A transport error or deadline expiry ended the stream.
    Failed,
    /// The cursor was closed. Terminal.
    Closed,
}

/// One active server-streaming call, advanced one batch at a time.
pub struct BatchStreamCursor {
    stream: Option<Streaming<v1::BatchChunk>>,
    state: CursorState,
    schema: Option<SchemaRef>,
    current: Option<(RecordBatch, ArenaLease)>,
    arena: Arc<MemoryArena>,
    advance_timeout: Duration,
}

impl BatchStreamCursor {
    /// Issue the streaming call for `ticket` and return a cursor already in
    /// the streaming state.
    pub async fn open(
        channel: &AuthenticatedChannel,
        ticket: &Ticket,
        arena: Arc<MemoryArena>,
        advance_timeout: Duration,
    ) -> Result<Self> {
        let mut client = channel.client();
        let request = v1::FetchPartitionRequest {
            ticket: ticket.as_bytes().to_vec(),
        };
        let response = tokio::time::timeout(advance_timeout, client.fetch_partition(request))
            .await
            .map_err(|_| {
                FluxError::Timeout(format!(
                    "stream open did not complete within {advance_timeout:?}"
                ))
            })?
            .map_err(|status| stream_status_err("stream open", &status))?;
        debug!(ticket_len = ticket.len(), "batch stream opened");
        Ok(Self {
            stream: Some(response.into_inner()),
            state: CursorState::Streaming,
            schema: None,
            current: None,
            arena,
            advance_timeout,
        })
    }

    /// Current lifecycle state.
    pub fn state(&self) -> CursorState {
        self.state
    }

    /// Receive the next batch.
    ///
    /// Returns `Ok(true)` when a new batch is current and `Ok(false)` on
    /// exhaustion. Exhaustion is idempotent; a deadline expiry or transport
    /// failure moves the cursor to `Failed` and advancing it again is a
    /// contract violation.
    pub async fn advance(&mut self) -> Result<bool> {
        match self.state {
            CursorState::Closed => {
                return Err(FluxError::Closed("advance on closed cursor".to_string()));
            }
            CursorState::Failed => {
                return Err(FluxError::Contract("advance on failed cursor".to_string()));
            }
            CursorState::Exhausted => return Ok(false),
            CursorState::Streaming => {}
        }
        // The previous batch's validity ends here, whatever the outcome.
        self.current = None;

        let stream = self
            .stream
            .as_mut()
            .ok_or_else(|| FluxError::Contract("cursor has no open stream".to_string()))?;
        let chunk = match tokio::time::timeout(self.advance_timeout, stream.message()).await {
            Err(_) => {
                self.state = CursorState::Failed;
                return Err(FluxError::Timeout(format!(
                    "no batch arrived within {:?}",
                    self.advance_timeout
                )));
            }
            Ok(Err(status)) => {
                self.state = CursorState::Failed;
                return Err(stream_status_err("batch receive", &status));
            }
            Ok(Ok(None)) => {
                self.state = CursorState::Exhausted;
                return Ok(false);
            }
            Ok(Ok(Some(chunk))) => chunk,
        };

        let batch = match codec::decode_batch(&chunk.ipc_payload) {
            Ok(batch) => batch,
            Err(e) => {
                self.state = CursorState::Failed;
                return Err(e);
            }
        };
        if let Some(schema) = &self.schema {
            if batch.schema().as_ref() != schema.as_ref() {
                self.state = CursorState::Failed;
                return Err(FluxError::Transport(
                    "wire schema changed mid-stream".to_string(),
                ));
            }
        } else {
            self.schema = Some(batch.schema());
        }

        let lease = match self.arena.carve(batch.get_array_memory_size()) {
            Ok(lease) => lease,
            Err(e) => {
                self.state = CursorState::Failed;
                return Err(e);
            }
        };
        self.current = Some((batch, lease));
        Ok(true)
    }

    /// Wire batch reference from the most recent successful advance.
    pub fn current_wire_batch(&self) -> Result<&RecordBatch> {
        match self.state {
            CursorState::Closed => Err(FluxError::Closed(
                "current batch on closed cursor".to_string(),
            )),
            CursorState::Streaming => {
                self.current.as_ref().map(|(batch, _)| batch).ok_or_else(|| {
                    FluxError::Contract(
                        "current batch requested before the first advance".to_string(),
                    )
                })
            }
            CursorState::Exhausted => Err(FluxError::Contract(
                "current batch requested after stream exhaustion".to_string(),
            )),
            CursorState::Failed => Err(FluxError::Contract(
                "current batch requested after stream failure".to_string(),
            )),
        }
    }

    /// Schema carried by the stream, once the first batch has arrived.
    pub fn schema(&self) -> Option<SchemaRef> {
        self.schema.clone()
    }

    /// End the stream. Dropping the underlying call cancels the RPC without
    /// waiting for a round-trip. Idempotent and reachable from every state.
    pub fn close(&mut self) {
        if self.state == CursorState::Closed {
            return;
        }
        self.current = None;
        self.stream = None;
        self.state = CursorState::Closed;
        debug!("batch stream cursor closed");
    }
}

fn stream_status_err(op: &str, status: &tonic::Status) -> FluxError {
    FluxError::Transport(format!("{op} failed: {status}"))
}

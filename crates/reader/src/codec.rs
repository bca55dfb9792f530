//! Arrow IPC payload codec for wire batch chunks.
//!
//! Each `BatchChunk` payload is a self-contained IPC stream holding exactly
//! one record batch; the embedded schema makes every chunk independently
//! decodable.

use std::io::Cursor;

use arrow::record_batch::RecordBatch;
use colflux_common::{FluxError, Result};

/// Encode one batch as a self-contained IPC stream payload.
pub fn encode_batch(batch: &RecordBatch) -> Result<Vec<u8>> {
    let mut out = Vec::<u8>::new();
    {
        let mut writer =
            arrow::ipc::writer::StreamWriter::try_new(&mut out, batch.schema().as_ref())
                .map_err(|e| FluxError::Transport(format!("ipc writer init failed: {e}")))?;
        writer
            .write(batch)
            .map_err(|e| FluxError::Transport(format!("ipc write failed: {e}")))?;
        writer
            .finish()
            .map_err(|e| FluxError::Transport(format!("ipc finish failed: {e}")))?;
    }
    Ok(out)
}

/// Decode the single batch carried by one chunk payload.
pub fn decode_batch(payload: &[u8]) -> Result<RecordBatch> {
    let cur = Cursor::new(payload.to_vec());
    let reader = arrow::ipc::reader::StreamReader::try_new(cur, None)
        .map_err(|e| FluxError::Transport(format!("ipc reader init failed: {e}")))?;
    let mut batches = reader
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| FluxError::Transport(format!("ipc read failed: {e}")))?;
    if batches.len() != 1 {
        return Err(FluxError::Transport(format!(
            "chunk must hold exactly one batch, got {}",
            batches.len()
        )));
    }
    Ok(batches.remove(0))
}

//! Per-reader memory-arena accounting.
//!
//! Every buffer decoded from the wire is covered by a lease carved from one
//! arena. The arena is the lifetime bound for those buffers: once it is
//! released, nothing new may be carved from it, and outstanding accounting
//! must already have drained. One arena per reader; arenas are never shared
//! across readers.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use crate::error::{FluxError, Result};

/// Allocation-accounting domain owned by exactly one reader.
#[derive(Debug)]
pub struct MemoryArena {
    in_use_bytes: AtomicUsize,
    released: AtomicBool,
}

impl MemoryArena {
    /// Create a fresh arena with zero bytes in use.
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            in_use_bytes: AtomicUsize::new(0),
            released: AtomicBool::new(false),
        })
    }

    /// Carve a lease covering `bytes` of wire-decoded buffer memory.
    ///
    /// Fails once the arena has been released; a released arena must never
    /// back new batches.
    pub fn carve(self: &Arc<Self>, bytes: usize) -> Result<ArenaLease> {
        if self.released.load(Ordering::Acquire) {
            return Err(FluxError::Closed(
                "memory arena has been released".to_string(),
            ));
        }
        self.in_use_bytes.fetch_add(bytes, Ordering::AcqRel);
        Ok(ArenaLease {
            arena: Arc::clone(self),
            bytes,
        })
    }

    /// Bytes currently covered by outstanding leases.
    #[must_use]
    pub fn in_use_bytes(&self) -> usize {
        self.in_use_bytes.load(Ordering::Acquire)
    }

    /// Whether `release` has been called.
    #[must_use]
    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::Acquire)
    }

    /// Mark the arena released. Idempotent and terminal.
    ///
    /// Returns the number of bytes that were still leased at release time;
    /// a non-zero value means a batch outlived its cursor.
    pub fn release(&self) -> usize {
        self.released.store(true, Ordering::Release);
        self.in_use_bytes.load(Ordering::Acquire)
    }
}

/// RAII accounting cover for one decoded batch; returns its bytes on drop.
#[derive(Debug)]
pub struct ArenaLease {
    arena: Arc<MemoryArena>,
    bytes: usize,
}

impl ArenaLease {
    /// Bytes covered by this lease.
    #[must_use]
    pub fn bytes(&self) -> usize {
        self.bytes
    }
}

impl Drop for ArenaLease {
    fn drop(&mut self) {
        if self.bytes > 0 {
            self.arena.in_use_bytes.fetch_sub(self.bytes, Ordering::AcqRel);
        }
    }
}

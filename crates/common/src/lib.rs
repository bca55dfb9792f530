//! Shared configuration, error types, memory accounting, and observability
//! primitives for colflux crates.
//!
//! Architecture role:
//! - defines endpoint/credential/reader configuration passed across layers
//! - provides common [`FluxError`] / [`Result`] contracts
//! - hosts the per-reader memory arena and the metrics registry
//!
//! Key modules:
//! - [`config`]
//! - [`error`]
//! - [`memory`]
//! - [`metrics`]

pub mod config;
pub mod error;
pub mod memory;
pub mod metrics;

pub use config::{Credentials, Endpoint, ReaderConfig, TransportSecurity};
pub use error::{FluxError, Result};
pub use memory::{ArenaLease, MemoryArena};
pub use metrics::MetricsRegistry;

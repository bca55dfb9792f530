//! Remote columnar stream reader.
//!
//! colflux-reader pulls one partition's result data from a remote analytic
//! data service over a streaming gRPC session and presents it as native
//! column-vector batches backed by the wire buffers.
//!
//! Key modules:
//! - [`auth`]: connection establishment plus the credential handshake
//! - [`cursor`]: pull-based iteration over the server batch stream
//! - [`adapter`]: wire batch to native column vector translation
//! - [`reader`]: per-partition lifecycle (construct, iterate, tear down)
//! - [`grpc`]: generated protocol module and client/service re-exports
//! - [`codec`]: Arrow IPC payload encode/decode for wire chunks

pub mod adapter;
pub mod auth;
pub mod codec;
pub mod cursor;
pub mod grpc;
pub mod reader;

pub use adapter::{materialize, materialize_with, ColumnVector, ColumnarBatch, WireColumnTarget};
pub use auth::{AuthenticatedChannel, SessionAuthenticator};
pub use codec::{decode_batch, encode_batch};
pub use cursor::{BatchStreamCursor, CursorState};
pub use reader::{PartitionReader, Ticket};

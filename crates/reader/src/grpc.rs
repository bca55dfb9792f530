//! gRPC protocol module for the partition data plane.
//!
//! RPC schema source: `proto/colflux_data.proto`.
//!
//! Key RPCs (generated under [`v1`]):
//! - `Authenticate`
//! - `FetchPartition` (stream)
//!
//! Useful generated request/response types:
//! [`v1::AuthenticateRequest`], [`v1::FetchPartitionRequest`],
//! [`v1::BatchChunk`].

#[allow(missing_docs)]
pub mod v1 {
    tonic::include_proto!("colflux.data.v1");
}

pub use v1::data_service_client::DataServiceClient;
pub use v1::data_service_server::{DataService, DataServiceServer};

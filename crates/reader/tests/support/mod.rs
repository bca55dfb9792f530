//! In-process mock data service for reader tests.

use std::collections::HashMap;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use arrow::array::{Int32Array, StringArray};
use arrow::record_batch::RecordBatch;
use arrow_schema::{DataType, Field, Schema, SchemaRef};
use colflux_common::{Credentials, Endpoint};
use colflux_reader::codec;
use colflux_reader::grpc::{v1, DataService, DataServiceServer};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_stream::wrappers::{ReceiverStream, TcpListenerStream};
use tokio_stream::Stream;
use tonic::{Request, Response, Status};

pub const MOCK_USERNAME: &str = "svc-user";
pub const MOCK_SECRET: &str = "svc-secret";
const MOCK_TOKEN: &str = "mock-session-token";

/// Scripted stream behavior for one ticket.
#[derive(Clone)]
pub enum TicketScript {
    /// Stream these batches, then end the stream.
    Batches(Vec<RecordBatch>),
    /// Stream these batches, then fail with `UNAVAILABLE`.
    FailAfter(Vec<RecordBatch>),
    /// Stream these batches, then go silent without ending the stream.
    StallAfter(Vec<RecordBatch>),
}

#[derive(Clone)]
pub struct MockDataService {
    scripts: Arc<HashMap<Vec<u8>, TicketScript>>,
}

type ChunkStream = Pin<Box<dyn Stream<Item = Result<v1::BatchChunk, Status>> + Send>>;

#[tonic::async_trait]
impl DataService for MockDataService {
    async fn authenticate(
        &self,
        request: Request<v1::AuthenticateRequest>,
    ) -> Result<Response<v1::AuthenticateResponse>, Status> {
        let req = request.into_inner();
        if req.username == MOCK_USERNAME && req.secret == MOCK_SECRET {
            Ok(Response::new(v1::AuthenticateResponse {
                token: MOCK_TOKEN.to_string(),
            }))
        } else {
            Err(Status::unauthenticated("bad credentials"))
        }
    }

    type FetchPartitionStream = ChunkStream;

    async fn fetch_partition(
        &self,
        request: Request<v1::FetchPartitionRequest>,
    ) -> Result<Response<Self::FetchPartitionStream>, Status> {
        let expected = format!("Bearer {MOCK_TOKEN}");
        let authorized = request
            .metadata()
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(|v| v == expected)
            .unwrap_or(false);
        if !authorized {
            return Err(Status::unauthenticated("missing or invalid session token"));
        }

        let req = request.into_inner();
        let script = self
            .scripts
            .get(&req.ticket)
            .cloned()
            .ok_or_else(|| Status::not_found("unknown ticket"))?;

        let (tx, rx) = mpsc::channel(4);
        tokio::spawn(async move {
            let (batches, fail, stall) = match script {
                TicketScript::Batches(b) => (b, false, false),
                TicketScript::FailAfter(b) => (b, true, false),
                TicketScript::StallAfter(b) => (b, false, true),
            };
            for batch in &batches {
                let payload = codec::encode_batch(batch).expect("encode batch");
                let chunk = v1::BatchChunk {
                    ipc_payload: payload,
                };
                if tx.send(Ok(chunk)).await.is_err() {
                    return;
                }
            }
            if fail {
                let _ = tx.send(Err(Status::unavailable("stream interrupted"))).await;
            } else if stall {
                // Hold the sender open so the client sees silence, not EOS.
                tokio::time::sleep(Duration::from_secs(3600)).await;
            }
        });
        Ok(Response::new(Box::pin(ReceiverStream::new(rx))))
    }
}

pub struct MockServer {
    pub endpoint: Endpoint,
}

impl MockServer {
    pub fn credentials(&self) -> Credentials {
        Credentials::new(MOCK_USERNAME, MOCK_SECRET)
    }
}

/// Start the mock service on an ephemeral local port.
pub async fn start_mock(scripts: HashMap<Vec<u8>, TicketScript>) -> MockServer {
    let service = MockDataService {
        scripts: Arc::new(scripts),
    };
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let port = listener.local_addr().expect("local addr").port();
    tokio::spawn(async move {
        let _ = tonic::transport::Server::builder()
            .add_service(DataServiceServer::new(service))
            .serve_with_incoming(TcpListenerStream::new(listener))
            .await;
    });
    MockServer {
        endpoint: Endpoint::insecure("127.0.0.1", port),
    }
}

pub fn id_name_schema() -> SchemaRef {
    Arc::new(Schema::new(vec![
        Field::new("id", DataType::Int32, false),
        Field::new("name", DataType::Utf8, true),
    ]))
}

/// Batch of `rows` rows over (`id` INT32, `name` UTF8) starting at `start`.
pub fn id_name_batch(start: i32, rows: usize) -> RecordBatch {
    let ids = (0..rows as i32).map(|i| start + i).collect::<Vec<_>>();
    let names = ids
        .iter()
        .map(|i| Some(format!("row-{i}")))
        .collect::<StringArray>();
    RecordBatch::try_new(
        id_name_schema(),
        vec![Arc::new(Int32Array::from(ids)), Arc::new(names)],
    )
    .expect("build batch")
}

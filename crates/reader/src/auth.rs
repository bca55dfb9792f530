//! Session establishment against the remote data service.
//!
//! Connection establishment and the credential handshake are combined into
//! one open call bounded by a single deadline. The handshake yields a bearer
//! token that is attached to every subsequent request on the channel.

use std::time::{Duration, Instant};

use colflux_common::metrics::global_metrics;
use colflux_common::{Credentials, Endpoint, FluxError, Result};
use tonic::metadata::{Ascii, MetadataValue};
use tonic::service::interceptor::InterceptedService;
use tonic::service::Interceptor;
use tonic::transport::Channel;
use tonic::{Request, Status};
use tracing::{debug, info};

use crate::grpc::{v1, DataServiceClient};

/// Attaches the session bearer token to every request on the channel.
#[derive(Clone)]
pub struct BearerAuth {
    token: MetadataValue<Ascii>,
}

impl Interceptor for BearerAuth {
    fn call(&mut self, mut request: Request<()>) -> std::result::Result<Request<()>, Status> {
        request
            .metadata_mut()
            .insert("authorization", self.token.clone());
        Ok(request)
    }
}

/// Client type minted by [`AuthenticatedChannel::client`].
pub type AuthedClient = DataServiceClient<InterceptedService<Channel, BearerAuth>>;

/// A connected, credentialed channel to one endpoint.
///
/// Owns the transport-level resources acquired during
/// [`SessionAuthenticator::open`]; dropping it releases the underlying
/// connection.
pub struct AuthenticatedChannel {
    channel: Channel,
    token: MetadataValue<Ascii>,
    endpoint_label: String,
}

impl AuthenticatedChannel {
    /// Mint a client that carries the session token on every call.
    pub fn client(&self) -> AuthedClient {
        DataServiceClient::with_interceptor(
            self.channel.clone(),
            BearerAuth {
                token: self.token.clone(),
            },
        )
    }

    /// `host:port` label of the endpoint this channel is connected to.
    pub fn endpoint_label(&self) -> &str {
        &self.endpoint_label
    }
}

/// Combined connection establishment and credential handshake.
pub struct SessionAuthenticator;

impl SessionAuthenticator {
    /// Open and authenticate a channel to `endpoint` within `timeout`.
    ///
    /// Credential rejection and transport failure are reported as distinct
    /// errors so callers can decide whether new credentials or a different
    /// endpoint is the right retry.
    pub async fn open(
        endpoint: &Endpoint,
        credentials: &Credentials,
        timeout: Duration,
    ) -> Result<AuthenticatedChannel> {
        let started = Instant::now();
        let label = endpoint.label();
        let handshake = Self::open_inner(endpoint, credentials);
        let channel = tokio::time::timeout(timeout, handshake)
            .await
            .map_err(|_| {
                FluxError::Timeout(format!(
                    "authentication against {label} did not complete within {timeout:?}"
                ))
            })??;
        global_metrics().record_auth(&label, started.elapsed().as_secs_f64());
        info!(endpoint = %label, "session authenticated");
        Ok(channel)
    }

    async fn open_inner(
        endpoint: &Endpoint,
        credentials: &Credentials,
    ) -> Result<AuthenticatedChannel> {
        let label = endpoint.label();
        let channel = Channel::from_shared(endpoint.uri())
            .map_err(|e| FluxError::InvalidConfig(format!("invalid endpoint uri: {e}")))?
            .connect()
            .await
            .map_err(|e| FluxError::Unreachable(format!("connect to {label} failed: {e}")))?;
        debug!(endpoint = %label, "transport established");

        let mut client = DataServiceClient::new(channel.clone());
        let response = client
            .authenticate(v1::AuthenticateRequest {
                username: credentials.username.clone(),
                secret: credentials.secret.clone(),
            })
            .await
            .map_err(|status| auth_status_err(&label, &status))?;

        let token = response.into_inner().token;
        let token = format!("Bearer {token}")
            .parse::<MetadataValue<Ascii>>()
            .map_err(|e| {
                FluxError::InvalidConfig(format!("session token is not valid header material: {e}"))
            })?;

        Ok(AuthenticatedChannel {
            channel,
            token,
            endpoint_label: label,
        })
    }
}

fn auth_status_err(endpoint: &str, status: &Status) -> FluxError {
    match status.code() {
        tonic::Code::Unauthenticated | tonic::Code::PermissionDenied => {
            FluxError::CredentialsRejected(format!("{endpoint}: {}", status.message()))
        }
        _ => FluxError::Unreachable(format!("handshake with {endpoint} failed: {status}")),
    }
}

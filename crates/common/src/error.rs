use thiserror::Error;

/// Canonical colflux error taxonomy used across crates.
///
/// Classification guidance:
/// - [`FluxError::CredentialsRejected`]: the remote service refused the supplied credentials
/// - [`FluxError::Unreachable`]: the transport to the endpoint could not be established
/// - [`FluxError::Transport`]: mid-stream network or protocol failures after the session opened
/// - [`FluxError::Adapter`]: wire column types with no supported native counterpart
/// - [`FluxError::Contract`]: caller misuse of the reader/cursor state machine
/// - [`FluxError::Closed`]: any operation on an already-closed reader or cursor
/// - [`FluxError::Timeout`]: a caller-supplied deadline expired before the remote responded
/// - [`FluxError::InvalidConfig`]: endpoint/credential/config contract violations
/// - [`FluxError::Io`]: raw IO failures from std APIs
#[derive(Debug, Error)]
pub enum FluxError {
    /// The authentication handshake completed but the credentials were refused.
    ///
    /// Retrying with the same credentials will not succeed; the caller must
    /// supply different ones.
    #[error("credentials rejected: {0}")]
    CredentialsRejected(String),

    /// The transport to the endpoint could not be established.
    ///
    /// Examples:
    /// - connection refused / DNS failure
    /// - TLS negotiation failure
    /// - handshake RPC failed before credentials were evaluated
    #[error("endpoint unreachable: {0}")]
    Unreachable(String),

    /// The stream failed after it was successfully opened.
    ///
    /// Examples:
    /// - connection reset mid-stream
    /// - server-side status on a batch receive
    /// - malformed or schema-drifting wire payload
    ///
    /// Not retried internally; callers may construct a new reader with the
    /// same ticket.
    #[error("transport error: {0}")]
    Transport(String),

    /// A wire field's encoded type has no supported native column counterpart.
    ///
    /// Always fatal for the batch; never silently skipped or truncated.
    #[error("unsupported column type: {0}")]
    Adapter(String),

    /// Caller misuse of the reader/cursor state machine.
    ///
    /// Examples:
    /// - reading the current batch before the first successful advance
    /// - reading the current batch after the stream was exhausted
    /// - advancing a cursor that already failed
    #[error("contract violation: {0}")]
    Contract(String),

    /// The reader or cursor was closed; no further operations are permitted.
    #[error("closed: {0}")]
    Closed(String),

    /// A caller-supplied deadline expired.
    ///
    /// Distinct from stream exhaustion: the server not responding is not the
    /// same thing as "no more data".
    #[error("deadline exceeded: {0}")]
    Timeout(String),

    /// Invalid endpoint, credential, or reader configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Transparent std IO failures.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Standard colflux result alias.
pub type Result<T> = std::result::Result<T, FluxError>;

//! The one caller-visible error surface: misconfiguration at `start`/`join`
//! time. Everything else on the recording path is a silent no-op by design
//! (see the crate-level docs for the full error taxonomy).
use traceline_types::Endpoint;

/// An error returned by [`crate::start`] or [`crate::join`].
///
/// This is the only error surface exposed by this crate: once a trace has
/// begun, recording is fire-and-forget and cannot fail from the caller's
/// point of view.
#[derive(Debug, thiserror::Error)]
pub enum StartError {
    /// The `ttl` option was zero or otherwise out of the accepted range.
    #[error("invalid ttl: {0}ms (must be > 0)")]
    InvalidTtl(u64),
    /// The `remote` endpoint option did not name any usable address.
    #[error("invalid remote endpoint: {0:?}")]
    InvalidRemoteEndpoint(Endpoint),
    /// No process-wide reporter has been installed and the start options did
    /// not override one.
    #[error("no reporter configured: call set_process_config or pass a reporter override")]
    NoReporter,
}

//! Starts trace actors, monitors their initiating caller, and restarts them
//! across a spontaneous crash.
//!
//! Every function here must be called from inside a running Tokio runtime:
//! spawning the actor's mailbox task and the caller-exit watcher both use
//! [`tokio::spawn`].
use crate::actor::{CallerExited, SpanKind, StartArgs, TraceActor};
use crate::config;
use crate::delta::Delta;
use crate::error::StartError;
use crate::handle::{CallerGuard, SpanHandle};
use crate::ids::{self, RegistryKey};
use crate::registry;
use crate::reporter::Reporter;
use crate::time;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use traceline_types::{Endpoint, SpanId, TraceId};
use xtra::prelude::*;
use xtra::spawn::Tokio;

const DEFAULT_TTL: Duration = Duration::from_millis(30_000);

/// Options accepted by [`start`].
#[derive(Default)]
pub struct StartOptions {
    /// The root span's initial name.
    pub name: Option<String>,
    /// Whether to record this trace. Defaults to `false`.
    pub sample: bool,
    /// Forces recording regardless of `sample`. Defaults to `false`.
    pub debug: bool,
    /// Which side of a call this trace represents. Defaults to
    /// [`SpanKind::Client`].
    pub kind: Option<SpanKind>,
    /// The remote peer of this call, if known.
    pub remote: Option<Endpoint>,
    /// Deltas applied to the root span immediately after its seed
    /// annotation.
    pub annotations: Vec<Delta>,
    /// The idle time-to-live, in milliseconds. Defaults to 30 000.
    pub ttl: Option<u64>,
    /// Overrides the process-wide reporter for this trace only.
    pub reporter: Option<Arc<dyn Reporter>>,
}

/// Options accepted by [`join`].
#[derive(Default)]
pub struct JoinOptions {
    /// The root span's initial name.
    pub name: Option<String>,
    /// Forces recording regardless of the propagated `sampled` flag.
    /// Defaults to `false`.
    pub debug: bool,
    /// Which side of a call this trace represents. Defaults to
    /// [`SpanKind::Server`].
    pub kind: Option<SpanKind>,
    /// The remote peer of this call (the caller this trace was joined
    /// from), if known.
    pub remote: Option<Endpoint>,
    /// Overrides the default local endpoint (derived from
    /// [`crate::ProcessConfig::system_id`]/`ipv4`) recorded on this trace's
    /// own annotations.
    pub endpoint: Option<Endpoint>,
    /// Deltas applied to the root span immediately after its seed
    /// annotation.
    pub annotations: Vec<Delta>,
    /// The idle time-to-live, in milliseconds. Defaults to 30 000.
    pub ttl: Option<u64>,
    /// Overrides the process-wide reporter for this trace only.
    pub reporter: Option<Arc<dyn Reporter>>,
}

/// Begins a new trace.
///
/// A no-op trace (`sample == false && debug == false`) still mints and
/// returns an `Active` handle carrying fresh IDs — so a caller that
/// ultimately decides not to sample can still hand a consistent span ID to
/// a downstream peer — but spawns no actor and touches no registry.
pub fn start(opts: StartOptions) -> Result<SpanHandle, StartError> {
    let ttl = resolve_ttl(opts.ttl)?;
    validate_remote(opts.remote.as_ref())?;

    let trace_id = ids::next_trace_id();
    let uniquifier = ids::next_uniquifier();
    let root_span_id = ids::next_span_id();

    spawn_if_recording(
        opts.sample,
        opts.debug,
        trace_id,
        uniquifier,
        root_span_id,
        None, // a freshly started trace's root span always has no parent
        opts.kind.unwrap_or(SpanKind::Client),
        opts.name,
        opts.remote,
        None,
        opts.annotations,
        ttl,
        opts.reporter,
    )
}

/// Begins a trace actor for a trace propagated from an upstream peer.
///
/// `sampled` carries the upstream peer's sampling decision; unlike
/// [`start`], a joined trace has no `sample` option of its own to decide
/// with — it defers entirely to what was propagated.
#[allow(clippy::too_many_arguments)]
pub fn join(
    trace_id: TraceId,
    span_id: SpanId,
    parent_span_id: Option<SpanId>,
    sampled: bool,
    opts: JoinOptions,
) -> Result<SpanHandle, StartError> {
    let ttl = resolve_ttl(opts.ttl)?;
    validate_remote(opts.remote.as_ref())?;

    let uniquifier = ids::next_uniquifier();

    spawn_if_recording(
        sampled,
        opts.debug,
        trace_id,
        uniquifier,
        span_id,
        parent_span_id,
        opts.kind.unwrap_or(SpanKind::Server),
        opts.name,
        opts.remote,
        opts.endpoint,
        opts.annotations,
        ttl,
        opts.reporter,
    )
}

#[allow(clippy::too_many_arguments)]
fn spawn_if_recording(
    sampled: bool,
    debug: bool,
    trace_id: TraceId,
    uniquifier: u64,
    root_span_id: SpanId,
    root_parent_id: Option<SpanId>,
    kind: SpanKind,
    name: Option<String>,
    remote: Option<Endpoint>,
    local_endpoint_override: Option<Endpoint>,
    annotations: Vec<Delta>,
    ttl: Duration,
    reporter_override: Option<Arc<dyn Reporter>>,
) -> Result<SpanHandle, StartError> {
    let (guard_tx, guard_rx) = oneshot::channel();
    let caller_guard = Arc::new(CallerGuard::new(guard_tx));

    if sampled || debug {
        let reporter = resolve_reporter(reporter_override)?;
        let registry_key = RegistryKey::new(trace_id, uniquifier);
        let local_endpoint = local_endpoint_override.or_else(default_local_endpoint);

        let mut initial_deltas = Vec::with_capacity(annotations.len() + 1);
        if let Some(name) = name {
            initial_deltas.push(Delta::Name(name));
        }
        initial_deltas.extend(annotations);

        let args = StartArgs {
            registry_key,
            root_span_id,
            root_parent_id,
            kind,
            remote,
            local_endpoint,
            debug,
            ttl,
            reporter,
            start_timestamp: time::now_micros(),
            initial_deltas,
        };

        spawn_supervised(args);
        spawn_caller_watcher(registry_key, guard_rx);
    }

    Ok(SpanHandle::new_active(
        trace_id,
        uniquifier,
        root_span_id,
        sampled,
        debug,
        caller_guard,
    ))
}

fn resolve_ttl(ttl_ms: Option<u64>) -> Result<Duration, StartError> {
    match ttl_ms {
        None => Ok(DEFAULT_TTL),
        Some(0) => Err(StartError::InvalidTtl(0)),
        Some(ms) => Ok(Duration::from_millis(ms)),
    }
}

fn validate_remote(remote: Option<&Endpoint>) -> Result<(), StartError> {
    match remote {
        Some(endpoint)
            if endpoint.service_name().is_none()
                && endpoint.ipv4().is_none()
                && endpoint.ipv6().is_none() =>
        {
            Err(StartError::InvalidRemoteEndpoint(endpoint.clone()))
        }
        _ => Ok(()),
    }
}

/// Builds the endpoint attached by default to this trace's own annotations,
/// from the process-wide `system_id`/`ipv4` settings. `None` if no process
/// config was installed or it carries neither field — annotations then
/// simply go out with no endpoint rather than an empty one.
fn default_local_endpoint() -> Option<Endpoint> {
    let cfg = config::process_config()?;
    if cfg.system_id.is_empty() && cfg.ipv4.is_none() {
        return None;
    }
    let mut builder = Endpoint::builder();
    if !cfg.system_id.is_empty() {
        builder.service_name(&cfg.system_id);
    }
    if let Some(ipv4) = cfg.ipv4 {
        builder.ipv4(ipv4);
    }
    Some(builder.build())
}

fn resolve_reporter(
    reporter_override: Option<Arc<dyn Reporter>>,
) -> Result<Arc<dyn Reporter>, StartError> {
    if let Some(reporter) = reporter_override {
        return Ok(reporter);
    }
    config::process_config()
        .map(|cfg| cfg.reporter.clone())
        .ok_or(StartError::NoReporter)
}

/// Spawns a trace actor and a watchdog task that respawns it, under the
/// same registry key, if it exits without having run its own terminal
/// sweep — a spontaneous crash rather than a normal finish.
fn spawn_supervised(args: StartArgs) {
    let terminated = Arc::new(AtomicBool::new(false));
    let address = TraceActor::new(args.clone(), terminated.clone())
        .create(None)
        .spawn(&mut Tokio::Global);
    registry::insert(args.registry_key, address.clone());

    tokio::spawn(async move {
        while address.is_connected() {
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        }
        if !terminated.load(Ordering::SeqCst) {
            log::warn!(
                "trace actor for {} crashed, restarting",
                args.registry_key.trace_id()
            );
            spawn_supervised(args);
        }
    });
}

/// Spawns the task that turns "last handle clone dropped" into a
/// [`CallerExited`] message, as long as an actor is still registered under
/// `key` by the time it fires.
fn spawn_caller_watcher(key: RegistryKey, guard_rx: oneshot::Receiver<()>) {
    tokio::spawn(async move {
        if guard_rx.await.is_ok() {
            if let Some(address) = registry::lookup(&key) {
                let _ = address.do_send(CallerExited);
            }
        }
    });
}

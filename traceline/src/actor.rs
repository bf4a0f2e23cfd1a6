//! The per-trace worker owning one trace's span tree.
//!
//! One `TraceActor` exists per `(TraceId, uniquifier)` while its trace is
//! live. Its mailbox is an `xtra` address: messages are delivered strictly
//! FIFO from whichever caller thread sent them, so every mutation below
//! runs to completion before the next one starts — no locking is needed
//! around `self.spans`.
use crate::delta::{AnnotationValue, Delta};
use crate::encoder;
use crate::ids::RegistryKey;
use crate::registry;
use crate::reporter::Reporter;
use crate::span_record::SpanRecord;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use traceline_types::{BinaryAnnotationValue, Endpoint, SpanId};
use xtra::prelude::*;

/// Which side of an RPC a trace represents, governing the implicit seed
/// annotation its root span receives on creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpanKind {
    /// The trace was started locally as the client side of a call.
    Client,
    /// The trace was joined as the server side of a propagated call.
    Server,
}

/// Everything needed to construct a trace actor, retained by the supervisor
/// so a crashed actor can be respawned identically.
#[derive(Clone)]
pub(crate) struct StartArgs {
    pub registry_key: RegistryKey,
    pub root_span_id: SpanId,
    pub root_parent_id: Option<SpanId>,
    pub kind: SpanKind,
    pub remote: Option<Endpoint>,
    pub local_endpoint: Option<Endpoint>,
    pub debug: bool,
    pub ttl: Duration,
    pub reporter: Arc<dyn Reporter>,
    pub start_timestamp: u64,
    pub initial_deltas: Vec<Delta>,
}

/// How often the idle timer is checked. Small relative to any realistic
/// `ttl` so TTL expiry is detected promptly without busy-polling.
const TICK_INTERVAL: Duration = Duration::from_millis(250);

/// Inserts a new open span under the current trace. Delivered by
/// [`crate::SpanHandle::start_span`].
pub(crate) struct StartSpan {
    pub span_id: SpanId,
    pub parent_id: Option<SpanId>,
    pub timestamp: u64,
    pub deltas: Vec<Delta>,
}

impl Message for StartSpan {
    type Result = ();
}

/// Closes a span, applying any trailing deltas first. Delivered by
/// [`crate::SpanHandle::finish_span`]. A no-op if the span doesn't exist or
/// is already closed.
pub(crate) struct FinishSpan {
    pub span_id: SpanId,
    pub timestamp: u64,
    pub deltas: Vec<Delta>,
}

impl Message for FinishSpan {
    type Result = ();
}

/// Applies deltas to an existing span without closing it. Delivered by
/// [`crate::SpanHandle::update`].
pub(crate) struct UpdateSpan {
    pub span_id: SpanId,
    pub timestamp: u64,
    pub deltas: Vec<Delta>,
}

impl Message for UpdateSpan {
    type Result = ();
}

/// Begins termination of the whole trace. Delivered by
/// [`crate::SpanHandle::finish`].
pub(crate) struct FinishTrace {
    pub timestamp: u64,
    pub r#async: bool,
    pub deltas: Vec<Delta>,
}

impl Message for FinishTrace {
    type Result = ();
}

/// Sent by the watcher task spawned alongside this actor when the last
/// clone of the initiating caller's handle is dropped.
pub(crate) struct CallerExited;

impl Message for CallerExited {
    type Result = ();
}

struct Tick;

impl Message for Tick {
    type Result = ();
}

pub struct TraceActor {
    args: StartArgs,
    spans: Vec<SpanRecord>,
    root_span_id: SpanId,
    last_activity: Instant,
    /// Set by an `async` delta on any span, or by `finish`'s `async` option.
    /// Marks the trace so `finish` defers termination until every span
    /// closes instead of sweeping immediately.
    trace_async: bool,
    /// Set once `finish` has run on an async trace; termination is then
    /// deferred until every span closes.
    async_terminating: bool,
    /// Shared with the supervisor's watchdog task: flipped just before
    /// `ctx.stop()` so the watchdog can tell a clean exit from a crash.
    terminated: Arc<AtomicBool>,
}

impl TraceActor {
    pub(crate) fn new(mut args: StartArgs, terminated: Arc<AtomicBool>) -> TraceActor {
        let root_span_id = args.root_span_id;
        let start_timestamp = args.start_timestamp;
        let mut root = SpanRecord::new(root_span_id, args.root_parent_id, start_timestamp);

        let seed = match args.kind {
            SpanKind::Client => AnnotationValue::ClientSend,
            SpanKind::Server => AnnotationValue::ServerReceive,
        };
        root.push_annotation(seed, start_timestamp, args.local_endpoint.clone());

        if let Some(remote) = args.remote.clone() {
            let key = match args.kind {
                SpanKind::Client => "sa",
                SpanKind::Server => "ca",
            };
            root.push_binary_annotation(key.to_string(), BinaryAnnotationValue::Bool(true), Some(remote));
        }

        let mut trace_async = false;
        for delta in args.initial_deltas.drain(..) {
            if root.apply(delta, start_timestamp) {
                trace_async = true;
            }
        }

        TraceActor {
            args,
            spans: vec![root],
            root_span_id,
            last_activity: Instant::now(),
            trace_async,
            async_terminating: false,
            terminated,
        }
    }

    fn span_mut(&mut self, id: SpanId) -> Option<&mut SpanRecord> {
        self.spans.iter_mut().find(|s| s.id() == id)
    }

    fn touch(&mut self) {
        self.last_activity = Instant::now();
    }

    fn all_closed(&self) -> bool {
        self.spans.iter().all(|s| !s.is_open())
    }

    async fn maybe_complete_async(&mut self, ctx: &mut Context<Self>) {
        if self.async_terminating && self.all_closed() {
            self.terminate(ctx, false).await;
        }
    }

    /// Runs the terminal sweep: closes and annotates every still-open span,
    /// hands the encoded batch to the reporter, and deregisters.
    async fn terminate(&mut self, ctx: &mut Context<Self>, caller_exited: bool) {
        let now = crate::time::now_micros();
        for record in &mut self.spans {
            if record.is_open() {
                record.close(now);
                record.push_annotation(AnnotationValue::Timeout, now, None);
            }
        }
        if caller_exited {
            if let Some(root) = self.span_mut(self.root_span_id) {
                root.push_annotation(AnnotationValue::Error, now, None);
            }
        }

        let batch = encoder::encode_trace(
            self.args.registry_key.trace_id(),
            self.args.debug,
            &self.spans,
        );
        self.args.reporter.ingest(batch);
        registry::remove(&self.args.registry_key);
        self.terminated.store(true, Ordering::SeqCst);
        ctx.stop();
    }
}

#[async_trait::async_trait]
impl Actor for TraceActor {
    async fn started(&mut self, ctx: &mut Context<Self>) {
        let _ = ctx.notify_interval(TICK_INTERVAL, || Tick);
    }
}

#[async_trait::async_trait]
impl Handler<StartSpan> for TraceActor {
    async fn handle(&mut self, msg: StartSpan, _ctx: &mut Context<Self>) {
        self.touch();
        let mut record = SpanRecord::new(msg.span_id, msg.parent_id, msg.timestamp);
        let mut became_async = false;
        for delta in msg.deltas {
            if record.apply(delta, msg.timestamp) {
                became_async = true;
            }
        }
        self.spans.push(record);
        if became_async {
            self.trace_async = true;
        }
    }
}

#[async_trait::async_trait]
impl Handler<FinishSpan> for TraceActor {
    async fn handle(&mut self, msg: FinishSpan, ctx: &mut Context<Self>) {
        self.touch();
        let mut became_async = false;
        if let Some(record) = self.span_mut(msg.span_id) {
            for delta in msg.deltas {
                if record.apply(delta, msg.timestamp) {
                    became_async = true;
                }
            }
            record.close(msg.timestamp);
        }
        if became_async {
            self.trace_async = true;
        }
        self.maybe_complete_async(ctx).await;
    }
}

#[async_trait::async_trait]
impl Handler<UpdateSpan> for TraceActor {
    async fn handle(&mut self, msg: UpdateSpan, _ctx: &mut Context<Self>) {
        self.touch();
        let mut became_async = false;
        if let Some(record) = self.span_mut(msg.span_id) {
            for delta in msg.deltas {
                if record.apply(delta, msg.timestamp) {
                    became_async = true;
                }
            }
        }
        if became_async {
            self.trace_async = true;
        }
    }
}

#[async_trait::async_trait]
impl Handler<FinishTrace> for TraceActor {
    async fn handle(&mut self, msg: FinishTrace, ctx: &mut Context<Self>) {
        self.touch();
        let mut became_async = msg.r#async || self.trace_async;
        if let Some(root) = self.span_mut(self.root_span_id) {
            for delta in msg.deltas {
                if root.apply(delta, msg.timestamp) {
                    became_async = true;
                }
            }
            root.close(msg.timestamp);
        }

        if became_async {
            self.async_terminating = true;
            self.maybe_complete_async(ctx).await;
        } else {
            self.terminate(ctx, false).await;
        }
    }
}

#[async_trait::async_trait]
impl Handler<CallerExited> for TraceActor {
    async fn handle(&mut self, _msg: CallerExited, ctx: &mut Context<Self>) {
        self.terminate(ctx, true).await;
    }
}

#[async_trait::async_trait]
impl Handler<Tick> for TraceActor {
    async fn handle(&mut self, _msg: Tick, ctx: &mut Context<Self>) {
        if self.last_activity.elapsed() >= self.args.ttl {
            self.terminate(ctx, false).await;
        }
    }
}

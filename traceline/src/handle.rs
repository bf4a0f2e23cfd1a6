//! The caller-held identifier handle and the dispatch operations that turn
//! caller calls into messages sent to a trace actor.
use crate::actor::{FinishSpan, FinishTrace, StartSpan, UpdateSpan};
use crate::delta::Delta;
use crate::ids::{self, RegistryKey};
use crate::time;
use std::fmt;
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;
use traceline_types::{BinaryAnnotationValue, SpanId, TraceId};

/// Fires its queued oneshot sender exactly once, when the last clone of the
/// `Arc` wrapping it is dropped. Installed on every [`ActiveHandle`] created
/// by `start`/`join`; its counterpart end sits in a task spawned by the
/// supervisor that turns the fired signal into a [`crate::actor::CallerExited`]
/// message.
///
/// Cloning an `ActiveHandle` clones the `Arc`, not the guard itself — the
/// signal only fires once nothing in the process still holds the handle.
#[derive(Debug)]
pub(crate) struct CallerGuard {
    sender: Mutex<Option<oneshot::Sender<()>>>,
}

impl CallerGuard {
    pub(crate) fn new(sender: oneshot::Sender<()>) -> CallerGuard {
        CallerGuard {
            sender: Mutex::new(Some(sender)),
        }
    }
}

impl Drop for CallerGuard {
    fn drop(&mut self) {
        if let Some(sender) = self.sender.lock().unwrap().take() {
            let _ = sender.send(());
        }
    }
}

/// Options accepted by [`SpanHandle::start_span`].
#[derive(Debug, Clone, Default)]
pub struct SpanOptions {
    /// The new span's name.
    pub name: Option<String>,
    /// If set, adds a string binary annotation with key `lc` and this value,
    /// naming the local component the span represents.
    pub local: Option<String>,
    /// Deltas applied to the new span immediately after creation.
    pub annotations: Vec<Delta>,
}

/// Options accepted by [`SpanHandle::finish_span`].
#[derive(Debug, Clone, Default)]
pub struct FinishOptions {
    /// Deltas applied to the span before it is stamped closed.
    pub annotations: Vec<Delta>,
}

/// Options accepted by [`SpanHandle::update`].
#[derive(Debug, Clone, Default)]
pub struct UpdateOptions {
    /// Overrides the timestamp attached to the deltas; defaults to now.
    pub timestamp: Option<u64>,
}

/// Options accepted by [`SpanHandle::finish`].
#[derive(Debug, Clone, Default)]
pub struct FinishTraceOptions {
    /// Marks the trace async: the actor survives past trace-finish until
    /// every span closes or the TTL fires.
    pub r#async: bool,
    /// Deltas applied to the root span before it is stamped closed.
    pub annotations: Vec<Delta>,
}

/// The caller-held handle naming a trace and the caller's current position
/// in its span stack.
///
/// `SpanHandle` is an immutable value: every operation returns a new handle
/// rather than mutating the receiver, and it may be freely cloned across
/// threads. The `Ignore` variant and an unsampled `Active` handle both make
/// every dispatch operation a no-op without ever touching the registry.
#[derive(Debug, Clone)]
pub enum SpanHandle {
    /// Carries no trace; every operation is a no-op.
    Ignore,
    /// A handle naming a live (or formerly live) trace.
    Active(ActiveHandle),
}

impl SpanHandle {
    /// Builds the root handle for a freshly started or joined trace.
    pub(crate) fn new_active(
        trace_id: TraceId,
        uniquifier: u64,
        root_span_id: SpanId,
        sampled: bool,
        debug: bool,
        caller_guard: Arc<CallerGuard>,
    ) -> SpanHandle {
        SpanHandle::Active(ActiveHandle {
            trace_id,
            uniquifier,
            current_span_id: root_span_id,
            parent_stack: Vec::new(),
            sampled,
            debug,
            caller_guard,
        })
    }

    /// Whether this handle carries a live trace and is sampled — i.e.
    /// whether any operation on it does real work.
    pub fn is_active(&self) -> bool {
        matches!(self, SpanHandle::Active(a) if a.sampled)
    }

    fn active(&self) -> Option<&ActiveHandle> {
        match self {
            SpanHandle::Ignore => None,
            SpanHandle::Active(a) => Some(a),
        }
    }

    /// Starts a child span under the span this handle currently names.
    ///
    /// Returns a new handle pointing at the child. A no-op (verbatim handle
    /// returned) for the `Ignore` variant or an unsampled handle, except
    /// that the span stack is still advanced so propagation stays
    /// consistent for any downstream peer this handle is passed to.
    pub fn start_span(&self, opts: SpanOptions) -> SpanHandle {
        let active = match self.active() {
            None => return SpanHandle::Ignore,
            Some(a) => a,
        };
        let new_span_id = ids::next_span_id();
        let parent_id = active.current_span_id;
        if active.sampled {
            let timestamp = time::now_micros();
            let mut deltas = Vec::with_capacity(opts.annotations.len() + 2);
            if let Some(name) = opts.name {
                deltas.push(Delta::Name(name));
            }
            if let Some(local) = opts.local {
                deltas.push(Delta::BinaryAnnotate {
                    key: "lc".to_string(),
                    value: BinaryAnnotationValue::String(local),
                    endpoint: None,
                });
            }
            deltas.extend(opts.annotations);
            if let Some(address) = crate::registry::lookup(&active.registry_key()) {
                let _ = address.do_send(StartSpan {
                    span_id: new_span_id,
                    parent_id: Some(parent_id),
                    timestamp,
                    deltas,
                });
            }
        }
        SpanHandle::Active(active.clone().push(new_span_id))
    }

    /// Finishes the span this handle currently names and returns the handle
    /// for its parent — the handle that was passed into the matching
    /// `start_span` call.
    pub fn finish_span(&self, opts: FinishOptions) -> SpanHandle {
        let active = match self.active() {
            None => return SpanHandle::Ignore,
            Some(a) => a,
        };
        if active.sampled {
            let timestamp = time::now_micros();
            if let Some(address) = crate::registry::lookup(&active.registry_key()) {
                let _ = address.do_send(FinishSpan {
                    span_id: active.current_span_id,
                    timestamp,
                    deltas: opts.annotations,
                });
            }
        }
        SpanHandle::Active(active.clone().pop())
    }

    /// Applies deltas to the span this handle currently names, without
    /// changing the span stack.
    pub fn update(&self, deltas: Vec<Delta>, opts: UpdateOptions) -> SpanHandle {
        let active = match self.active() {
            None => return SpanHandle::Ignore,
            Some(a) => a,
        };
        if active.sampled {
            let timestamp = opts.timestamp.unwrap_or_else(time::now_micros);
            if let Some(address) = crate::registry::lookup(&active.registry_key()) {
                let _ = address.do_send(UpdateSpan {
                    span_id: active.current_span_id,
                    timestamp,
                    deltas,
                });
            }
        }
        self.clone()
    }

    /// Begins termination of the whole trace.
    pub fn finish(&self, opts: FinishTraceOptions) {
        let active = match self.active() {
            None => return,
            Some(a) => a,
        };
        if !active.sampled {
            return;
        }
        let timestamp = time::now_micros();
        if let Some(address) = crate::registry::lookup(&active.registry_key()) {
            let _ = address.do_send(FinishTrace {
                timestamp,
                r#async: opts.r#async,
                deltas: opts.annotations,
            });
        }
    }
}

impl fmt::Display for SpanHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpanHandle::Ignore => write!(f, "ignore"),
            SpanHandle::Active(a) => a.fmt(f),
        }
    }
}

/// A [`SpanHandle::Active`] payload: the trace and span-stack state a
/// caller carries between calls.
#[derive(Debug, Clone)]
pub struct ActiveHandle {
    trace_id: TraceId,
    uniquifier: u64,
    current_span_id: SpanId,
    parent_stack: Vec<SpanId>,
    sampled: bool,
    debug: bool,
    caller_guard: Arc<CallerGuard>,
}

impl ActiveHandle {
    /// The trace ID this handle belongs to.
    pub fn trace_id(&self) -> TraceId {
        self.trace_id
    }

    /// The span ID this handle currently names.
    pub fn current_span_id(&self) -> SpanId {
        self.current_span_id
    }

    /// The ancestor span IDs, most-recent-first.
    pub fn parent_stack(&self) -> &[SpanId] {
        &self.parent_stack
    }

    /// Whether this trace is being recorded.
    pub fn sampled(&self) -> bool {
        self.sampled
    }

    /// Whether this trace forces recording regardless of `sampled`.
    pub fn debug(&self) -> bool {
        self.debug
    }

    fn registry_key(&self) -> RegistryKey {
        RegistryKey::new(self.trace_id, self.uniquifier)
    }

    /// Advances the handle to a new current span, pushing the old current
    /// span onto the ancestor stack.
    fn push(mut self, new_span_id: SpanId) -> ActiveHandle {
        self.parent_stack.insert(0, self.current_span_id);
        self.current_span_id = new_span_id;
        self
    }

    /// Returns to the parent span. A no-op if the ancestor stack is already
    /// empty.
    fn pop(mut self) -> ActiveHandle {
        if self.parent_stack.is_empty() {
            return self;
        }
        self.current_span_id = self.parent_stack.remove(0);
        self
    }
}

impl fmt::Display for ActiveHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}:{},{}",
            self.trace_id,
            self.uniquifier,
            self.current_span_id,
            if self.sampled { "SAMPLED" } else { "UNSAMPLED" }
        )?;
        if self.debug {
            write!(f, ",DEBUG")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle(sampled: bool) -> SpanHandle {
        let (tx, _rx) = oneshot::channel();
        SpanHandle::new_active(
            ids::next_trace_id(),
            1,
            ids::next_span_id(),
            sampled,
            false,
            Arc::new(CallerGuard::new(tx)),
        )
    }

    #[test]
    fn push_then_pop_round_trips() {
        let h0 = handle(true);
        let active0 = match &h0 {
            SpanHandle::Active(a) => a.clone(),
            SpanHandle::Ignore => unreachable!(),
        };
        let pushed = active0.clone().push(ids::next_span_id());
        let popped = pushed.pop();
        assert_eq!(popped.current_span_id(), active0.current_span_id());
        assert_eq!(popped.parent_stack(), active0.parent_stack());
    }

    #[test]
    fn pop_on_empty_stack_is_noop() {
        let active = match handle(true) {
            SpanHandle::Active(a) => a,
            SpanHandle::Ignore => unreachable!(),
        };
        let before = active.current_span_id();
        let after = active.pop();
        assert_eq!(after.current_span_id(), before);
        assert!(after.parent_stack().is_empty());
    }

    #[test]
    fn ignore_handle_start_span_stays_ignore() {
        let h = SpanHandle::Ignore;
        let h2 = h.start_span(SpanOptions::default());
        assert!(matches!(h2, SpanHandle::Ignore));
    }

    #[test]
    fn unsampled_handle_advances_stack_without_dispatch() {
        let h0 = handle(false);
        let h1 = h0.start_span(SpanOptions::default());
        let h2 = h1.finish_span(FinishOptions::default());
        match (&h0, &h2) {
            (SpanHandle::Active(a0), SpanHandle::Active(a2)) => {
                assert_eq!(a0.current_span_id(), a2.current_span_id());
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn display_includes_sampled_and_debug() {
        let (tx, _rx) = oneshot::channel();
        let h = SpanHandle::new_active(
            ids::next_trace_id(),
            7,
            ids::next_span_id(),
            true,
            true,
            Arc::new(CallerGuard::new(tx)),
        );
        let rendered = h.to_string();
        assert!(rendered.contains("SAMPLED"));
        assert!(rendered.contains("DEBUG"));
    }
}

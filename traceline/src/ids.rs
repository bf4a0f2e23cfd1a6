//! Identifiers used to address a trace actor.
use rand::Rng;
use traceline_types::TraceId;

/// The pair `(T, U)` described in the data model: the wire trace ID `T`
/// plus a process-local uniquifier `U` that disambiguates two local traces
/// which happen to share the same `T` (e.g. a server receiving parallel
/// calls that all propagate the same upstream trace ID).
///
/// `T` alone is what gets reported externally; `(T, U)` is what indexes
/// the registry, since exactly one trace actor may exist per `(T, U)`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct RegistryKey {
    trace_id: TraceId,
    uniquifier: u64,
}

impl RegistryKey {
    /// Builds a registry key from a trace ID and its process-local
    /// uniquifier.
    pub fn new(trace_id: TraceId, uniquifier: u64) -> RegistryKey {
        RegistryKey {
            trace_id,
            uniquifier,
        }
    }

    /// The wire trace ID component, `T`.
    pub fn trace_id(&self) -> TraceId {
        self.trace_id
    }

    /// The process-local uniquifier component, `U`.
    pub fn uniquifier(&self) -> u64 {
        self.uniquifier
    }
}

/// Generates a fresh process-local uniquifier.
pub fn next_uniquifier() -> u64 {
    rand::thread_rng().gen()
}

/// Generates a fresh 128-bit trace ID.
pub fn next_trace_id() -> TraceId {
    let bytes: [u8; 16] = rand::thread_rng().gen();
    TraceId::random(bytes)
}

/// Generates a fresh 64-bit span ID.
pub fn next_span_id() -> traceline_types::SpanId {
    let id: u64 = rand::thread_rng().gen();
    traceline_types::SpanId::from(id)
}

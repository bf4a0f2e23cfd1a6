//! The sink a trace actor hands its finished batch to.
use traceline_types::Span;

/// A pluggable sink for finished trace batches.
///
/// `ingest` is called once per terminating trace, on the actor's own task.
/// Implementations must be effectively non-blocking and must not panic —
/// the actor does not wait on delivery and treats the call as best-effort,
/// exactly as the reporter interface this trait models promises. Anything
/// beyond enqueueing the batch for later delivery (batching, retrying,
/// talking to a collector over the network) belongs in a separate crate
/// built on top of this trait, not in an implementation used directly here.
pub trait Reporter: Send + Sync {
    /// Accepts one trace's worth of finished spans.
    fn ingest(&self, spans: Vec<Span>);
}

/// A reporter that discards everything it receives.
///
/// The default when no [`crate::ProcessConfig`] has been installed and no
/// trace supplies its own override.
#[derive(Debug, Default, Clone, Copy)]
pub struct NopReporter;

impl Reporter for NopReporter {
    fn ingest(&self, _spans: Vec<Span>) {}
}

/// A reporter that logs each batch at `info` level, for local debugging.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingReporter;

impl Reporter for LoggingReporter {
    fn ingest(&self, spans: Vec<Span>) {
        for span in &spans {
            log::info!(
                "trace {} span {} ({}) [{}..{}]",
                span.trace_id(),
                span.id(),
                span.name(),
                span.timestamp(),
                span.timestamp() + span.duration().unwrap_or(0),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nop_reporter_accepts_anything() {
        NopReporter.ingest(Vec::new());
    }
}

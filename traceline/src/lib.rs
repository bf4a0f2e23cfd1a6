//! A per-trace concurrent lifecycle engine for collecting Zipkin-compatible
//! distributed traces.
//!
//! Each sampled trace is owned by its own actor: a long-lived task that
//! receives span start/finish/update events over a FIFO mailbox, enforces
//! an idle time-to-live, and emits one finished batch to a
//! [`Reporter`] when the trace completes. Callers interact with a trace
//! exclusively through a [`SpanHandle`], an immutable value that is cheap
//! to clone and carries no direct reference to the actor — every operation
//! on it does a [registry](crate) lookup and fires a message, never
//! blocking on the actor's state.
//!
//! ```no_run
//! use traceline::{start, StartOptions};
//!
//! # fn example() -> Result<(), traceline::StartError> {
//! let handle = start(StartOptions {
//!     name: Some("fetch".into()),
//!     sample: true,
//!     reporter: Some(std::sync::Arc::new(traceline::LoggingReporter)),
//!     ..Default::default()
//! })?;
//! let handle = handle.start_span(Default::default());
//! let handle = handle.finish_span(Default::default());
//! handle.finish(Default::default());
//! # Ok(())
//! # }
//! ```
//!
//! Every function on this page must be called from inside a running Tokio
//! runtime — spawning a trace's mailbox task, its idle-timer tick, and its
//! caller-exit watcher all require one.
//!
//! This crate implements the tracing *core* only: the actor, the registry,
//! the wire encoder, and the `Reporter` seam. It does not ship an HTTP
//! reporter, B3 header parsing, or host IP discovery — those are the
//! concern of a collaborating crate built on top of this one.
#![warn(missing_docs)]

mod actor;
pub mod config;
pub mod delta;
mod encoder;
pub mod error;
pub mod handle;
mod ids;
pub mod reporter;
mod registry;
mod span_record;
pub mod supervisor;
mod time;

#[doc(inline)]
pub use actor::SpanKind;
#[doc(inline)]
pub use config::{process_config, set_process_config, ProcessConfig};
#[doc(inline)]
pub use delta::{AnnotationValue, Delta};
#[doc(inline)]
pub use error::StartError;
#[doc(inline)]
pub use handle::{ActiveHandle, FinishOptions, FinishTraceOptions, SpanHandle, SpanOptions, UpdateOptions};
#[doc(inline)]
pub use reporter::{LoggingReporter, NopReporter, Reporter};
#[doc(inline)]
pub use supervisor::{join, start, JoinOptions, StartOptions};

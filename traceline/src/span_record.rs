//! The mutable, actor-owned representation of one span.
use crate::delta::{AnnotationValue, Delta};
use traceline_types::{BinaryAnnotationValue, Endpoint, SpanId};

/// A timed annotation as recorded inside a [`SpanRecord`], before it is
/// translated to the wire `Annotation` shape by the encoder.
#[derive(Debug, Clone)]
pub struct RecordedAnnotation {
    /// The annotation's value, still a symbol rather than a wire string.
    pub value: AnnotationValue,
    /// When the annotation occurred, in microseconds since the Unix epoch.
    pub timestamp: u64,
    /// The endpoint the annotation was recorded on, if any.
    pub endpoint: Option<Endpoint>,
}

/// A typed keyed tag as recorded inside a [`SpanRecord`].
#[derive(Debug, Clone)]
pub struct RecordedBinaryAnnotation {
    /// The tag's key.
    pub key: String,
    /// The tag's typed value.
    pub value: BinaryAnnotationValue,
    /// The endpoint the tag was recorded on, if any.
    pub endpoint: Option<Endpoint>,
}

/// The in-actor representation of one span: timings, annotations, and the
/// child lifecycle state the spec calls for.
#[derive(Debug, Clone)]
pub struct SpanRecord {
    name: Option<String>,
    id: SpanId,
    /// `None` means this span's parent is the sentinel `root`.
    parent_id: Option<SpanId>,
    start_timestamp: u64,
    end_timestamp: Option<u64>,
    annotations: Vec<RecordedAnnotation>,
    binary_annotations: Vec<RecordedBinaryAnnotation>,
    r#async: bool,
}

impl SpanRecord {
    /// Creates a new, open span record.
    pub fn new(id: SpanId, parent_id: Option<SpanId>, start_timestamp: u64) -> SpanRecord {
        SpanRecord {
            name: None,
            id,
            parent_id,
            start_timestamp,
            end_timestamp: None,
            annotations: Vec::new(),
            binary_annotations: Vec::new(),
            r#async: false,
        }
    }

    /// The span's ID.
    pub fn id(&self) -> SpanId {
        self.id
    }

    /// The span's parent, or `None` for the root span.
    pub fn parent_id(&self) -> Option<SpanId> {
        self.parent_id
    }

    /// The span's name, if one has been set.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The span's start time, in microseconds since the Unix epoch.
    pub fn start_timestamp(&self) -> u64 {
        self.start_timestamp
    }

    /// The span's end time, if it has been closed.
    pub fn end_timestamp(&self) -> Option<u64> {
        self.end_timestamp
    }

    /// Whether the span is still open.
    pub fn is_open(&self) -> bool {
        self.end_timestamp.is_none()
    }

    /// Whether the span (or the trace it belongs to, via propagation) has
    /// been marked `async`.
    pub fn is_async(&self) -> bool {
        self.r#async
    }

    /// The span's timed annotations, in recorded order.
    pub fn annotations(&self) -> &[RecordedAnnotation] {
        &self.annotations
    }

    /// The span's typed tags, in recorded order (by first-write position).
    pub fn binary_annotations(&self) -> &[RecordedBinaryAnnotation] {
        &self.binary_annotations
    }

    /// Stamps the span closed at `ts` if it is still open. A no-op if the
    /// span was already closed — finishing an already-finished span is
    /// ignored per the spec.
    pub fn close(&mut self, ts: u64) {
        if self.end_timestamp.is_none() {
            self.end_timestamp = Some(ts);
        }
    }

    /// Appends a timed annotation directly (used for the implicit seed
    /// annotations and the terminal-sweep `timeout`/`error` annotations,
    /// which aren't expressed as caller-supplied deltas).
    pub fn push_annotation(&mut self, value: AnnotationValue, timestamp: u64, endpoint: Option<Endpoint>) {
        self.annotations.push(RecordedAnnotation {
            value,
            timestamp,
            endpoint,
        });
    }

    /// Adds a binary annotation directly, honoring the same replace-by-key
    /// policy as [`SpanRecord::apply`].
    pub fn push_binary_annotation(
        &mut self,
        key: String,
        value: BinaryAnnotationValue,
        endpoint: Option<Endpoint>,
    ) {
        self.set_binary_annotation(key, value, endpoint);
    }

    fn set_binary_annotation(&mut self, key: String, value: BinaryAnnotationValue, endpoint: Option<Endpoint>) {
        match self.binary_annotations.iter_mut().find(|a| a.key == key) {
            Some(existing) => {
                existing.value = value;
                existing.endpoint = endpoint;
            }
            None => self.binary_annotations.push(RecordedBinaryAnnotation {
                key,
                value,
                endpoint,
            }),
        }
    }

    /// Applies a single delta at the given timestamp.
    ///
    /// Returns `true` if the delta marked this span `async`, so the caller
    /// (the trace actor) can propagate that flag to the trace as a whole.
    pub fn apply(&mut self, delta: Delta, timestamp: u64) -> bool {
        match delta {
            Delta::Name(name) => {
                self.name = Some(name);
                false
            }
            Delta::Async => {
                self.r#async = true;
                true
            }
            Delta::Annotate { value, endpoint } => {
                self.push_annotation(value, timestamp, endpoint);
                false
            }
            Delta::BinaryAnnotate {
                key,
                value,
                endpoint,
            } => {
                self.set_binary_annotation(key, value, endpoint);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use traceline_types::BinaryAnnotationValue;

    #[test]
    fn close_is_idempotent() {
        let mut span = SpanRecord::new(SpanId::from(1u64), None, 10);
        span.close(20);
        span.close(30);
        assert_eq!(span.end_timestamp(), Some(20));
    }

    #[test]
    fn later_binary_annotation_write_supersedes_earlier_in_place() {
        let mut span = SpanRecord::new(SpanId::from(1u64), None, 0);
        span.apply(
            Delta::BinaryAnnotate {
                key: "http.status".into(),
                value: BinaryAnnotationValue::I32(200),
                endpoint: None,
            },
            1,
        );
        span.apply(
            Delta::Name("first".into()),
            1,
        );
        span.apply(
            Delta::BinaryAnnotate {
                key: "other".into(),
                value: BinaryAnnotationValue::Bool(true),
                endpoint: None,
            },
            2,
        );
        span.apply(
            Delta::BinaryAnnotate {
                key: "http.status".into(),
                value: BinaryAnnotationValue::I32(500),
                endpoint: None,
            },
            3,
        );
        let tags = span.binary_annotations();
        assert_eq!(tags.len(), 2);
        assert_eq!(tags[0].key, "http.status");
        assert_eq!(tags[0].value, BinaryAnnotationValue::I32(500));
        assert_eq!(tags[1].key, "other");
    }

    #[test]
    fn async_delta_reports_itself() {
        let mut span = SpanRecord::new(SpanId::from(1u64), None, 0);
        assert!(!span.apply(Delta::Annotate { value: AnnotationValue::ClientSend, endpoint: None }, 0));
        assert!(span.apply(Delta::Async, 0));
        assert!(span.is_async());
    }
}

// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Spans.
use crate::{Annotation, BinaryAnnotation, SpanId, TraceId};

/// A `Span` represents a single timed operation, as it appears on the wire
/// sent to a collector.
///
/// This is the reporter-facing representation produced by the encoder; it
/// is not the mutable record a trace actor holds while a span is still
/// open (see `traceline::SpanRecord` in the runtime crate).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct Span {
    trace_id: TraceId,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    parent_id: Option<SpanId>,
    id: SpanId,
    name: String,
    timestamp: u64,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    duration: Option<u64>,
    #[cfg_attr(
        feature = "serde",
        serde(skip_serializing_if = "is_false", default = "value_false")
    )]
    debug: bool,
    #[cfg_attr(
        feature = "serde",
        serde(skip_serializing_if = "Vec::is_empty", default)
    )]
    annotations: Vec<Annotation>,
    #[cfg_attr(
        feature = "serde",
        serde(skip_serializing_if = "Vec::is_empty", default)
    )]
    binary_annotations: Vec<BinaryAnnotation>,
}

#[cfg(feature = "serde")]
#[inline]
fn is_false(v: &bool) -> bool {
    !*v
}

#[cfg(feature = "serde")]
#[inline]
fn value_false() -> bool {
    false
}

/// The name used for a span whose name was never set.
pub const UNKNOWN_SPAN_NAME: &str = "unknown";

impl Span {
    /// Returns a builder used to construct a `Span`.
    #[inline]
    pub fn builder() -> Builder {
        Builder::default()
    }

    /// The randomly generated identifier for the trace this span belongs to.
    #[inline]
    pub fn trace_id(&self) -> TraceId {
        self.trace_id
    }

    /// The parent span's ID, or `None` if this is the root span of the trace.
    #[inline]
    pub fn parent_id(&self) -> Option<SpanId> {
        self.parent_id
    }

    /// The unique identifier for this span within the trace.
    #[inline]
    pub fn id(&self) -> SpanId {
        self.id
    }

    /// The logical operation this span represents.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The start of the span, in microseconds since the Unix epoch.
    #[inline]
    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    /// The duration of the span in microseconds, if known.
    #[inline]
    pub fn duration(&self) -> Option<u64> {
        self.duration
    }

    /// Whether this span was recorded in debug mode.
    #[inline]
    pub fn debug(&self) -> bool {
        self.debug
    }

    /// The timed annotations attached to this span, in recorded order.
    #[inline]
    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    /// The typed key/value tags attached to this span, in recorded order.
    #[inline]
    pub fn binary_annotations(&self) -> &[BinaryAnnotation] {
        &self.binary_annotations
    }
}

/// A builder for `Span`s.
#[derive(Default)]
pub struct Builder {
    trace_id: Option<TraceId>,
    parent_id: Option<SpanId>,
    id: Option<SpanId>,
    name: Option<String>,
    timestamp: Option<u64>,
    duration: Option<u64>,
    debug: bool,
    annotations: Vec<Annotation>,
    binary_annotations: Vec<BinaryAnnotation>,
}

impl Builder {
    /// Sets the trace ID of the span.
    #[inline]
    pub fn trace_id(&mut self, trace_id: TraceId) -> &mut Builder {
        self.trace_id = Some(trace_id);
        self
    }

    /// Sets the ID of the span's parent. Omit entirely for a root span.
    #[inline]
    pub fn parent_id(&mut self, parent_id: SpanId) -> &mut Builder {
        self.parent_id = Some(parent_id);
        self
    }

    /// Sets the ID of the span.
    #[inline]
    pub fn id(&mut self, id: SpanId) -> &mut Builder {
        self.id = Some(id);
        self
    }

    /// Sets the name of the span.
    #[inline]
    pub fn name(&mut self, name: impl Into<String>) -> &mut Builder {
        self.name = Some(name.into());
        self
    }

    /// Sets the start time of the span, in microseconds since the Unix epoch.
    #[inline]
    pub fn timestamp(&mut self, timestamp: u64) -> &mut Builder {
        self.timestamp = Some(timestamp);
        self
    }

    /// Sets the duration of the span, in microseconds.
    #[inline]
    pub fn duration(&mut self, duration: u64) -> &mut Builder {
        self.duration = Some(duration);
        self
    }

    /// Sets the debug flag of the span.
    #[inline]
    pub fn debug(&mut self, debug: bool) -> &mut Builder {
        self.debug = debug;
        self
    }

    /// Adds an annotation to the span.
    #[inline]
    pub fn annotation(&mut self, annotation: Annotation) -> &mut Builder {
        self.annotations.push(annotation);
        self
    }

    /// Adds a binary annotation to the span.
    #[inline]
    pub fn binary_annotation(&mut self, annotation: BinaryAnnotation) -> &mut Builder {
        self.binary_annotations.push(annotation);
        self
    }

    /// Constructs a `Span`.
    ///
    /// # Panics
    ///
    /// Panics if `trace_id`, `id`, or `timestamp` was not set.
    #[inline]
    pub fn build(&mut self) -> Span {
        Span {
            trace_id: self.trace_id.expect("trace ID not set"),
            parent_id: self.parent_id,
            id: self.id.expect("span ID not set"),
            name: self.name.take().unwrap_or_else(|| UNKNOWN_SPAN_NAME.to_string()),
            timestamp: self.timestamp.expect("timestamp not set"),
            duration: self.duration,
            debug: self.debug,
            annotations: std::mem::take(&mut self.annotations),
            binary_annotations: std::mem::take(&mut self.binary_annotations),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_span_omits_parent_id() {
        let span = Span::builder()
            .trace_id(TraceId::from([1; 8]))
            .id(SpanId::from(1u64))
            .timestamp(1)
            .build();
        assert_eq!(span.parent_id(), None);
    }

    #[test]
    fn unnamed_span_defaults_to_unknown() {
        let span = Span::builder()
            .trace_id(TraceId::from([1; 8]))
            .id(SpanId::from(1u64))
            .timestamp(1)
            .build();
        assert_eq!(span.name(), UNKNOWN_SPAN_NAME);
    }
}

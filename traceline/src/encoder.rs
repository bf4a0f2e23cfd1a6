//! Translates one trace's finished [`SpanRecord`]s into the wire `Span`
//! list handed to a [`crate::Reporter`].
use crate::span_record::SpanRecord;
use traceline_types::{Annotation, BinaryAnnotation, Span, TraceId};

/// Encodes every record in `spans` (one trace's closed span tree) into the
/// wire format, in the order given.
///
/// Records are expected to already be closed (`end_timestamp` set) by the
/// time this runs — the trace actor only calls this after its terminal
/// sweep has stamped every open span.
pub fn encode_trace(trace_id: TraceId, debug: bool, spans: &[SpanRecord]) -> Vec<Span> {
    spans
        .iter()
        .map(|record| encode_span(trace_id, debug, record))
        .collect()
}

fn encode_span(trace_id: TraceId, debug: bool, record: &SpanRecord) -> Span {
    let mut builder = Span::builder();
    builder.trace_id(trace_id).id(record.id()).timestamp(record.start_timestamp()).debug(debug);
    if let Some(parent_id) = record.parent_id() {
        builder.parent_id(parent_id);
    }
    if let Some(name) = record.name() {
        builder.name(name);
    }
    if let Some(end) = record.end_timestamp() {
        builder.duration(end.saturating_sub(record.start_timestamp()));
    }
    for annotation in record.annotations() {
        builder.annotation(Annotation::new(
            annotation.timestamp,
            annotation.value.as_wire_str(),
            annotation.endpoint.clone(),
        ));
    }
    for tag in record.binary_annotations() {
        let mut tag_builder = BinaryAnnotation::builder();
        if let Some(endpoint) = tag.endpoint.clone() {
            tag_builder.endpoint(endpoint);
        }
        builder.binary_annotation(tag_builder.build(&tag.key, tag.value.clone()));
    }
    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delta::{AnnotationValue, Delta};
    use traceline_types::{BinaryAnnotationValue, SpanId};

    #[test]
    fn root_span_omits_parent_id() {
        let mut record = SpanRecord::new(SpanId::from(1u64), None, 10);
        record.close(20);
        let trace_id = TraceId::from([1; 8]);
        let spans = encode_trace(trace_id, false, &[record]);
        assert_eq!(spans[0].parent_id(), None);
        assert_eq!(spans[0].duration(), Some(10));
    }

    #[test]
    fn annotations_and_tags_translate_in_order() {
        let mut record = SpanRecord::new(SpanId::from(2u64), Some(SpanId::from(1u64)), 0);
        record.apply(
            Delta::Annotate {
                value: AnnotationValue::ClientSend,
                endpoint: None,
            },
            0,
        );
        record.apply(
            Delta::BinaryAnnotate {
                key: "http.status".into(),
                value: BinaryAnnotationValue::I32(200),
                endpoint: None,
            },
            1,
        );
        record.close(5);
        let spans = encode_trace(TraceId::from([1; 16]), false, &[record]);
        let span = &spans[0];
        assert_eq!(span.annotations()[0].value(), "cs");
        assert_eq!(span.binary_annotations()[0].key(), "http.status");
    }

    #[test]
    fn unset_name_defaults_to_unknown() {
        let mut record = SpanRecord::new(SpanId::from(1u64), None, 0);
        record.close(1);
        let spans = encode_trace(TraceId::from([1; 8]), false, &[record]);
        assert_eq!(spans[0].name(), traceline_types::UNKNOWN_SPAN_NAME);
    }
}

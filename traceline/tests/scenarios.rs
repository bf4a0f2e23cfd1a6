//! Integration tests exercising full start/span/finish flows against an
//! in-memory reporter, covering the concrete recording scenarios this
//! crate is built around.
use std::sync::{Arc, Mutex};
use std::time::Duration;
use traceline::{
    join, start, FinishOptions, FinishTraceOptions, JoinOptions, Reporter, SpanOptions,
    StartError, StartOptions,
};
use traceline_types::{Endpoint, Span, SpanId, TraceId};

#[derive(Clone, Default)]
struct RecordingReporter {
    batches: Arc<Mutex<Vec<Vec<Span>>>>,
}

impl Reporter for RecordingReporter {
    fn ingest(&self, spans: Vec<Span>) {
        self.batches.lock().unwrap().push(spans);
    }
}

impl RecordingReporter {
    fn batches(&self) -> Vec<Vec<Span>> {
        self.batches.lock().unwrap().clone()
    }
}

async fn wait_for_batch(reporter: &RecordingReporter) -> Vec<Vec<Span>> {
    for _ in 0..100 {
        let batches = reporter.batches();
        if !batches.is_empty() {
            return batches;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("reporter never received a batch");
}

#[tokio::test]
async fn unsampled_trace_never_reports() {
    let reporter = RecordingReporter::default();
    let handle = start(StartOptions {
        name: Some("x".into()),
        sample: false,
        reporter: Some(Arc::new(reporter.clone())),
        ..Default::default()
    })
    .unwrap();

    let handle = handle.start_span(SpanOptions::default());
    let handle = handle.finish_span(FinishOptions::default());
    handle.finish(FinishTraceOptions::default());

    tokio::time::sleep(Duration::from_millis(150)).await;
    assert!(reporter.batches().is_empty());
}

#[tokio::test]
async fn client_trace_with_remote_emits_seed_and_sa_tag() {
    let reporter = RecordingReporter::default();
    let remote = Endpoint::builder().service_name("upstream").build();
    let handle = start(StartOptions {
        name: Some("fetch".into()),
        sample: true,
        remote: Some(remote),
        reporter: Some(Arc::new(reporter.clone())),
        ..Default::default()
    })
    .unwrap();

    handle.finish(FinishTraceOptions::default());

    let batches = wait_for_batch(&reporter).await;
    assert_eq!(batches.len(), 1);
    let spans = &batches[0];
    assert_eq!(spans.len(), 1);
    let span = &spans[0];
    assert_eq!(span.name(), "fetch");
    assert!(span.annotations().iter().any(|a| a.value() == "cs"));
    let tag = span
        .binary_annotations()
        .iter()
        .find(|t| t.key() == "sa")
        .expect("sa tag present");
    assert_eq!(
        tag.endpoint().and_then(|e| e.service_name()),
        Some("upstream")
    );
}

#[tokio::test]
async fn server_trace_with_child_shares_trace_and_nests_parent() {
    let reporter = RecordingReporter::default();
    let trace_id = TraceId::from([7; 16]);
    let root_span_id = SpanId::from(42u64);

    let handle = join(
        trace_id,
        root_span_id,
        None,
        true,
        JoinOptions {
            reporter: Some(Arc::new(reporter.clone())),
            ..Default::default()
        },
    )
    .unwrap();

    let child = handle.start_span(SpanOptions {
        name: Some("db".into()),
        ..Default::default()
    });
    let handle = child.finish_span(FinishOptions::default());
    handle.finish(FinishTraceOptions::default());

    let batches = wait_for_batch(&reporter).await;
    let spans = &batches[0];
    assert_eq!(spans.len(), 2);

    let root = spans.iter().find(|s| s.id() == root_span_id).unwrap();
    assert_eq!(root.trace_id(), trace_id);
    assert!(root.annotations().iter().any(|a| a.value() == "sr"));

    let db_span = spans.iter().find(|s| s.id() != root_span_id).unwrap();
    assert_eq!(db_span.parent_id(), Some(root_span_id));
    assert_eq!(db_span.name(), "db");
    assert!(db_span.duration().is_some());
}

#[tokio::test]
async fn async_trace_waits_for_last_span_before_reporting() {
    let reporter = RecordingReporter::default();
    let handle = start(StartOptions {
        sample: true,
        ttl: Some(60_000),
        reporter: Some(Arc::new(reporter.clone())),
        ..Default::default()
    })
    .unwrap();

    let child = handle.start_span(SpanOptions {
        name: Some("a".into()),
        ..Default::default()
    });
    handle.finish(FinishTraceOptions {
        r#async: true,
        ..Default::default()
    });

    tokio::time::sleep(Duration::from_millis(150)).await;
    assert!(
        reporter.batches().is_empty(),
        "async trace must not report before its last span closes"
    );

    child.finish_span(FinishOptions::default());

    let batches = wait_for_batch(&reporter).await;
    assert_eq!(batches.len(), 1);
    let spans = &batches[0];
    assert!(spans.iter().all(|s| s.duration().is_some()));
    assert!(spans
        .iter()
        .all(|s| !s.annotations().iter().any(|a| a.value() == "timeout")));
}

#[tokio::test]
async fn ttl_expiry_sweeps_every_open_span() {
    let reporter = RecordingReporter::default();
    let handle = start(StartOptions {
        sample: true,
        ttl: Some(50),
        reporter: Some(Arc::new(reporter.clone())),
        ..Default::default()
    })
    .unwrap();

    let _leak = handle.start_span(SpanOptions {
        name: Some("leak".into()),
        ..Default::default()
    });

    let batches = wait_for_batch(&reporter).await;
    assert_eq!(batches.len(), 1);
    let spans = &batches[0];
    assert_eq!(spans.len(), 2);
    for span in spans {
        assert!(span.duration().is_some());
        assert!(span.annotations().iter().any(|a| a.value() == "timeout"));
    }
}

#[tokio::test]
async fn parallel_starts_on_one_handle_produce_siblings() {
    let reporter = RecordingReporter::default();
    let handle = start(StartOptions {
        sample: true,
        reporter: Some(Arc::new(reporter.clone())),
        ..Default::default()
    })
    .unwrap();

    let h1 = handle.clone();
    let h2 = handle.clone();
    let (a, b) = tokio::join!(
        async move {
            h1.start_span(SpanOptions {
                name: Some("a".into()),
                ..Default::default()
            })
        },
        async move {
            h2.start_span(SpanOptions {
                name: Some("b".into()),
                ..Default::default()
            })
        },
    );
    a.finish_span(FinishOptions::default());
    b.finish_span(FinishOptions::default());
    handle.finish(FinishTraceOptions::default());

    let batches = wait_for_batch(&reporter).await;
    let spans = &batches[0];
    assert_eq!(spans.len(), 3);
    let root_id = spans.iter().find(|s| s.parent_id().is_none()).unwrap().id();
    let children: Vec<_> = spans
        .iter()
        .filter(|s| s.parent_id() == Some(root_id))
        .collect();
    assert_eq!(children.len(), 2);
}

#[test]
fn zero_ttl_is_rejected_synchronously() {
    let err = start(StartOptions {
        sample: true,
        ttl: Some(0),
        ..Default::default()
    })
    .unwrap_err();
    assert!(matches!(err, StartError::InvalidTtl(0)));
}

#[test]
fn empty_remote_endpoint_is_rejected_synchronously() {
    let err = start(StartOptions {
        sample: true,
        remote: Some(Endpoint::default()),
        ..Default::default()
    })
    .unwrap_err();
    assert!(matches!(err, StartError::InvalidRemoteEndpoint(_)));
}

#[test]
fn starting_without_any_reporter_configured_is_rejected() {
    let err = start(StartOptions {
        sample: true,
        ..Default::default()
    })
    .unwrap_err();
    assert!(matches!(err, StartError::NoReporter));
}

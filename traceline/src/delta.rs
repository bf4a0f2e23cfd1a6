//! The uniform mutation vocabulary applied to a span: `annotate`, to name
//! a span, to mark it `async`, or to attach a typed tag.
//!
//! A shorthand [`AnnotationValue`] is kept as a symbol rather than
//! expanded to its string form at construction time; the translation table
//! lives in the encoder, the one place the wire representation is decided.
use traceline_types::{BinaryAnnotationValue, Endpoint};

/// The value of a timed annotation.
///
/// Standard single-letter Zipkin v1 codes are kept as distinct variants so
/// callers can write `AnnotationValue::ClientSend` instead of remembering
/// that it serializes to `"cs"`; anything else is a free-form string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnnotationValue {
    /// The client side of an RPC sent a request. Wire value: `cs`.
    ClientSend,
    /// The client side of an RPC received a response. Wire value: `cr`.
    ClientReceive,
    /// The server side of an RPC sent a response. Wire value: `ss`.
    ServerSend,
    /// The server side of an RPC received a request. Wire value: `sr`.
    ServerReceive,
    /// A message was put on the wire. Wire value: `ws`.
    WireSend,
    /// A message was taken off the wire. Wire value: `wr`.
    WireReceive,
    /// The span was forcibly closed by the idle TTL sweep. Wire value:
    /// `timeout`.
    Timeout,
    /// The span was forcibly closed because its initiating caller exited.
    /// Wire value: `error`.
    Error,
    /// A free-form annotation value, rendered on the wire verbatim.
    Custom(String),
}

impl AnnotationValue {
    /// Renders this value to its wire string form.
    pub fn as_wire_str(&self) -> &str {
        match self {
            AnnotationValue::ClientSend => "cs",
            AnnotationValue::ClientReceive => "cr",
            AnnotationValue::ServerSend => "ss",
            AnnotationValue::ServerReceive => "sr",
            AnnotationValue::WireSend => "ws",
            AnnotationValue::WireReceive => "wr",
            AnnotationValue::Timeout => "timeout",
            AnnotationValue::Error => "error",
            AnnotationValue::Custom(s) => s,
        }
    }
}

impl From<&str> for AnnotationValue {
    /// Parses a free-form string into a shorthand variant when it matches
    /// one of the standard codes, otherwise keeps it as `Custom`.
    fn from(s: &str) -> AnnotationValue {
        match s {
            "cs" | "client_send" => AnnotationValue::ClientSend,
            "cr" | "client_recv" => AnnotationValue::ClientReceive,
            "ss" | "server_send" => AnnotationValue::ServerSend,
            "sr" | "server_recv" => AnnotationValue::ServerReceive,
            "ws" | "wire_send" => AnnotationValue::WireSend,
            "wr" | "wire_recv" => AnnotationValue::WireReceive,
            "timeout" => AnnotationValue::Timeout,
            "error" => AnnotationValue::Error,
            other => AnnotationValue::Custom(other.to_string()),
        }
    }
}

/// A mutation applied to a span at a point in time.
///
/// Deltas are the vocabulary shared by `start_span`'s initial annotations,
/// `finish_span`'s trailing annotations, and `update_span`'s explicit delta
/// list — all three funnel into the same application logic in the trace
/// actor.
#[derive(Debug, Clone)]
pub enum Delta {
    /// Replaces the span's name. Last writer wins.
    Name(String),
    /// Marks the span (and by propagation, the trace) as async, permitting
    /// child spans to keep recording after the root closes.
    Async,
    /// Appends a timed annotation.
    Annotate {
        /// The annotation's value.
        value: AnnotationValue,
        /// The endpoint the annotation was recorded on, if any.
        endpoint: Option<Endpoint>,
    },
    /// Adds or replaces a keyed tag. A later write to the same key on the
    /// same span supersedes an earlier one.
    BinaryAnnotate {
        /// The tag's key.
        key: String,
        /// The tag's typed value.
        value: BinaryAnnotationValue,
        /// The endpoint the tag was recorded on, if any.
        endpoint: Option<Endpoint>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shorthand_round_trips_to_wire_string() {
        assert_eq!(AnnotationValue::ClientSend.as_wire_str(), "cs");
        assert_eq!(AnnotationValue::from("cs"), AnnotationValue::ClientSend);
    }

    #[test]
    fn free_form_value_preserved() {
        let v = AnnotationValue::from("http.retry");
        assert_eq!(v.as_wire_str(), "http.retry");
        assert_eq!(v, AnnotationValue::Custom("http.retry".to_string()));
    }
}

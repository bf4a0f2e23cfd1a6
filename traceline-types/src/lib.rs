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

//! Wire-format type definitions for the `traceline` distributed tracing
//! client.
//!
//! This crate has no opinion on concurrency, actors, or timing — it is the
//! external protocol model that `traceline`'s encoder produces and that a
//! reporter serializes to a collector. See the [Zipkin v1 spans
//! format](https://zipkin.io/zipkin-api/zipkin-api.yaml) for the origin of
//! these shapes.
//!
//! # Serialization
//!
//! With the `serde` feature enabled, `Annotation`, `BinaryAnnotation`,
//! `Endpoint`, `Span`, `SpanId`, and `TraceId` implement `Serialize` and
//! `Deserialize`.
#![warn(missing_docs)]

#[doc(inline)]
pub use annotation::Annotation;
#[doc(inline)]
pub use binary_annotation::{BinaryAnnotation, BinaryAnnotationType, BinaryAnnotationValue};
#[doc(inline)]
pub use endpoint::Endpoint;
#[doc(inline)]
pub use span::{Span, UNKNOWN_SPAN_NAME};
#[doc(inline)]
pub use span_id::SpanId;
#[doc(inline)]
pub use trace_id::TraceId;

pub mod annotation;
pub mod binary_annotation;
pub mod endpoint;
pub mod span;
pub mod span_id;
pub mod trace_id;

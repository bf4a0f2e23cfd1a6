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

//! Binary annotations.
use crate::Endpoint;
use std::fmt;

/// The type tag of a `BinaryAnnotation`'s value, rendered uppercase on the
/// wire (`BOOL`, `STRING`, `I16`, `I32`, `I64`, `DOUBLE`, `BYTES`).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BinaryAnnotationType {
    /// A UTF-8 string value.
    String,
    /// A boolean value.
    Bool,
    /// A 16-bit signed integer value.
    I16,
    /// A 32-bit signed integer value.
    I32,
    /// A 64-bit signed integer value.
    I64,
    /// A double-precision floating point value.
    Double,
    /// A raw byte string value.
    Bytes,
}

impl fmt::Display for BinaryAnnotationType {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BinaryAnnotationType::String => "STRING",
            BinaryAnnotationType::Bool => "BOOL",
            BinaryAnnotationType::I16 => "I16",
            BinaryAnnotationType::I32 => "I32",
            BinaryAnnotationType::I64 => "I64",
            BinaryAnnotationType::Double => "DOUBLE",
            BinaryAnnotationType::Bytes => "BYTES",
        };
        fmt.write_str(s)
    }
}

/// The typed value of a `BinaryAnnotation`.
///
/// With the `serde` feature, this is tagged by its `BinaryAnnotationType` (as
/// the wire's uppercase `type` field) and flattens into the enclosing
/// `BinaryAnnotation`'s `value` field — the same `{key, value, type,
/// endpoint?}` shape `BinaryAnnotationType`'s `Display` impl already targets.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "type", content = "value"))]
pub enum BinaryAnnotationValue {
    /// A UTF-8 string value.
    #[cfg_attr(feature = "serde", serde(rename = "STRING"))]
    String(String),
    /// A boolean value.
    #[cfg_attr(feature = "serde", serde(rename = "BOOL"))]
    Bool(bool),
    /// A 16-bit signed integer value.
    #[cfg_attr(feature = "serde", serde(rename = "I16"))]
    I16(i16),
    /// A 32-bit signed integer value.
    #[cfg_attr(feature = "serde", serde(rename = "I32"))]
    I32(i32),
    /// A 64-bit signed integer value.
    #[cfg_attr(feature = "serde", serde(rename = "I64"))]
    I64(i64),
    /// A double-precision floating point value.
    #[cfg_attr(feature = "serde", serde(rename = "DOUBLE"))]
    Double(f64),
    /// A raw byte string value.
    #[cfg_attr(feature = "serde", serde(rename = "BYTES"))]
    Bytes(Vec<u8>),
}

impl BinaryAnnotationValue {
    /// Returns the type tag for this value.
    pub fn annotation_type(&self) -> BinaryAnnotationType {
        match self {
            BinaryAnnotationValue::String(_) => BinaryAnnotationType::String,
            BinaryAnnotationValue::Bool(_) => BinaryAnnotationType::Bool,
            BinaryAnnotationValue::I16(_) => BinaryAnnotationType::I16,
            BinaryAnnotationValue::I32(_) => BinaryAnnotationType::I32,
            BinaryAnnotationValue::I64(_) => BinaryAnnotationType::I64,
            BinaryAnnotationValue::Double(_) => BinaryAnnotationType::Double,
            BinaryAnnotationValue::Bytes(_) => BinaryAnnotationType::Bytes,
        }
    }
}

/// A `BinaryAnnotation` represents a typed, keyed tag attached to a span.
///
/// It consists of a key/value pair along with an optional `Endpoint`
/// identifying the service that generated it.
///
/// Zipkin defines a number of "standard" keys, e.g. `lc` ("Local Component",
/// used for spans that do not involve a remote call), `sa`/`ca`
/// ("Server"/"Client Address"). Arbitrary user-defined keys are also valid.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BinaryAnnotation {
    key: String,
    #[cfg_attr(feature = "serde", serde(flatten))]
    value: BinaryAnnotationValue,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    endpoint: Option<Endpoint>,
}

impl BinaryAnnotation {
    /// Returns a builder used to construct a `BinaryAnnotation`.
    pub fn builder() -> Builder {
        Builder { endpoint: None }
    }

    /// Returns the binary annotation's key.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Returns the binary annotation's value.
    pub fn value(&self) -> &BinaryAnnotationValue {
        &self.value
    }

    /// Returns the type tag of the binary annotation's value.
    pub fn annotation_type(&self) -> BinaryAnnotationType {
        self.value.annotation_type()
    }

    /// Returns the endpoint on which the binary annotation was generated.
    pub fn endpoint(&self) -> Option<&Endpoint> {
        self.endpoint.as_ref()
    }
}

/// A builder for `BinaryAnnotation`s.
pub struct Builder {
    endpoint: Option<Endpoint>,
}

impl Builder {
    /// Sets the endpoint associated with the binary annotation.
    ///
    /// Defaults to `None`.
    pub fn endpoint(&mut self, endpoint: Endpoint) -> &mut Builder {
        self.endpoint = Some(endpoint);
        self
    }

    /// Constructs the `BinaryAnnotation`.
    pub fn build(&mut self, key: &str, value: BinaryAnnotationValue) -> BinaryAnnotation {
        BinaryAnnotation {
            key: key.to_string(),
            value,
            endpoint: self.endpoint.take(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_tag_matches_value() {
        let b = BinaryAnnotation::builder().build("ok", BinaryAnnotationValue::Bool(true));
        assert_eq!(b.annotation_type(), BinaryAnnotationType::Bool);
    }

    #[test]
    fn type_renders_uppercase() {
        assert_eq!(BinaryAnnotationType::I64.to_string(), "I64");
        assert_eq!(BinaryAnnotationType::String.to_string(), "STRING");
    }
}

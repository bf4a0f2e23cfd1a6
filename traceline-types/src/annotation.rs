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

//! Annotations.
use crate::Endpoint;

/// A timestamped event attached to a span, e.g. `cs` ("Client Send").
///
/// Unlike the shorthand symbol used while a trace is being recorded, the
/// wire `Annotation`'s `value` is always a plain string: standard
/// single-letter codes are already expanded to their string form by the
/// time a span is encoded.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct Annotation {
    timestamp: u64,
    value: String,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    endpoint: Option<Endpoint>,
}

impl Annotation {
    /// Creates a new `Annotation` at the given timestamp (microseconds
    /// since the Unix epoch).
    pub fn new(timestamp: u64, value: impl Into<String>, endpoint: Option<Endpoint>) -> Annotation {
        Annotation {
            timestamp,
            value: value.into(),
            endpoint,
        }
    }

    /// Returns the time at which the annotated event occurred, in
    /// microseconds since the Unix epoch.
    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    /// Returns the value of the annotation.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Returns the endpoint on which the annotation was generated.
    pub fn endpoint(&self) -> Option<&Endpoint> {
        self.endpoint.as_ref()
    }
}

/*
 * Copyright (c) 2024. Govcraft
 *
 * Licensed under either of
 *   * Apache License, Version 2.0 (the "License");
 *     you may not use this file except in compliance with the License.
 *     You may obtain a copy of the License at http://www.apache.org/licenses/LICENSE-2.0
 *   * MIT license: http://opensource.org/licenses/MIT
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the applicable License for the specific language governing permissions and
 * limitations under that License.
 */

/// Represents errors raised while encoding or decoding a [`Message`](super::Message).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageError {
    /// The payload or wire body is not valid for the canonical JSON encoding.
    Serialization(String),
    /// A typed payload serialized to something other than a JSON object.
    NotAnObject(&'static str),
    /// A typed decode was attempted on a message of another kind.
    KindMismatch {
        /// `name/version` the caller asked for.
        expected: String,
        /// `name/version` the message carries.
        found: String,
    },
}

impl std::fmt::Display for MessageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Serialization(msg) => write!(f, "message serialization failed: {msg}"),
            Self::NotAnObject(kind) => {
                write!(f, "payload of {kind} must serialize to a JSON object")
            }
            Self::KindMismatch { expected, found } => {
                write!(f, "expected a {expected} message, found {found}")
            }
        }
    }
}

impl std::error::Error for MessageError {}

impl From<serde_json::Error> for MessageError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

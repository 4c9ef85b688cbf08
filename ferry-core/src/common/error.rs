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

use std::error::Error;
use std::fmt;

use crate::message::MessageError;

/// Raised when a batch cannot be partitioned under the configured ceilings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkError {
    /// A single entry does not fit even in an empty chunk.
    EntryTooLarge {
        /// Serialized size of the offending entry.
        bytes: usize,
        /// Fixed per-entry overhead added to every entry.
        overhead: usize,
        /// Configured byte ceiling per chunk.
        max_bytes: usize,
    },
    /// A count ceiling of zero admits no entry at all.
    ZeroCount,
}

impl fmt::Display for ChunkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EntryTooLarge {
                bytes,
                overhead,
                max_bytes,
            } => write!(
                f,
                "unable to chunk by bytes, single entry: {bytes} + overhead: {overhead} is bigger than max bytes: {max_bytes}"
            ),
            Self::ZeroCount => write!(f, "unable to chunk with a maximum of zero entries per chunk"),
        }
    }
}

impl Error for ChunkError {}

/// Errors surfaced by a transport's publish and lifecycle operations.
///
/// `UnknownDestination` is kept apart from `Backend` so callers can tell a
/// misconfigured queue, topic or bus (retrying will not help) from a failed
/// network call. See [`TransportError::is_retryable`].
#[derive(Debug)]
pub enum TransportError {
    /// The named queue, topic or bus could not be resolved.
    UnknownDestination(String),
    /// An outbound batch could not be partitioned; nothing was submitted.
    Chunk(ChunkError),
    /// A message or batch entry could not be serialized.
    Serialization(String),
    /// The backend call itself failed.
    Backend(Box<dyn Error + Send + Sync>),
}

impl TransportError {
    /// Wraps any backend failure.
    pub fn backend(error: impl Into<Box<dyn Error + Send + Sync>>) -> Self {
        Self::Backend(error.into())
    }

    /// Whether repeating the same call may succeed.
    ///
    /// Only backend failures qualify; a missing destination, an oversized entry or
    /// a serialization failure will fail the same way again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Backend(_))
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownDestination(name) => write!(f, "destination could not be found: {name}"),
            Self::Chunk(err) => write!(f, "batch could not be chunked: {err}"),
            Self::Serialization(msg) => write!(f, "serialization failed: {msg}"),
            Self::Backend(err) => write!(f, "transport call failed: {err}"),
        }
    }
}

impl Error for TransportError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Chunk(err) => Some(err),
            Self::Backend(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl From<ChunkError> for TransportError {
    fn from(err: ChunkError) -> Self {
        Self::Chunk(err)
    }
}

impl From<MessageError> for TransportError {
    fn from(err: MessageError) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for TransportError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

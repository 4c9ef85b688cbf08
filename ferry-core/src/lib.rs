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

#![forbid(unsafe_code)]

//! # Ferry Core
//!
//! Transport-independent building blocks of the Ferry message broker:
//!
//! - **Messages (`Message`, `MessageKind`)**: a `(name, version)` pair plus a JSON object
//!   payload. Dispatch identity is structural, never per instance.
//! - **Handlers (`Handler`, `HandlerRegistry`)**: a predicate paired with an asynchronous
//!   action. Handlers compare by identity so a registry can remove the exact instance that
//!   was registered.
//! - **Middleware (`Middleware`, `middleware_chain`)**: handler-wrapping functions composed
//!   outermost-first.
//! - **Chunking (`chunk_by_bytes`, `chunk_json`)**: greedy partitioning of a batch under
//!   byte and count ceilings imposed by a transport's batch APIs.
//! - **Traits (`Publisher`, `Receiver`, `Managed`)**: the capabilities every transport and
//!   the broker itself expose.

/// Error types and batch chunking.
pub mod common;

/// The message model and handlers operating on it.
pub mod message;

/// Capability traits implemented by transports and the broker.
pub mod traits;

pub use common::{
    chunk_by_bytes, chunk_json, BatchLimits, ChunkError, SizedItem, TransportError,
};
pub use message::{
    dispatch_all, middleware_chain, panic_error, Handler, HandlerFuture, HandlerId,
    HandlerRegistry, Message, MessageError, MessageKind, Middleware,
};
pub use traits::{Managed, Publisher, Receiver, Transport};

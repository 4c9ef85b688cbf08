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

//! The polling cloud queue transport.
//!
//! [`QueueTransport`] talks to the queue through a [`QueueClient`] the
//! application implements over its SDK. Received messages are turned into
//! domain messages by a [`Translator`].

// --- Public Re-exports ---
pub use client::{
    QueueClient, QueueMessage, ReceiptEntry, ReceiveRequest, SendBatchEntry, VisibilityEntry,
};
pub use translation::{default_translation, default_translator, TranslateError, Translator};
pub use transport::{
    with_queue_receiver, with_queue_sender, with_queue_transport, DispatchErrorHook,
    QueueTransport, QueueTransportBuilder, QueueTransportOptions,
};

// --- Submodules ---

/// Client trait and wire types of the queue backend.
mod client;
/// Translation of received messages.
mod translation;
/// The transport and its poll loop.
mod transport;

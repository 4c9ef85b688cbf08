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

//! Transports moving messages between publishers and receivers.
//!
//! * [`MemoryTransport`]: same-process delivery, the broker's default.
//! * [`QueueTransport`]: a long-polled managed cloud queue.
//! * [`TopicPublisher`] and [`EventBusPublisher`]: publish-only cloud fan-out.
//! * [`ManyPublishers`] and [`ManyReceivers`]: combine several of the above.
//!
//! Cloud backends are reached through small client traits implemented over
//! the application's SDK client.

// --- Public Re-exports ---
pub use event_bus::{with_event_bus_publisher, EventBusClient, EventBusEntry, EventBusPublisher};
pub use many::{with_many_publishers, with_many_receivers, ManyPublishers, ManyReceivers};
pub use memory::{with_memory_transport, MemoryTransport};
pub use queue::{
    default_translation, default_translator, with_queue_receiver, with_queue_sender,
    with_queue_transport, DispatchErrorHook, QueueClient, QueueMessage, QueueTransport,
    QueueTransportBuilder, QueueTransportOptions, ReceiptEntry, ReceiveRequest, SendBatchEntry,
    TranslateError, Translator, VisibilityEntry,
};
pub use topic::{with_topic_publisher, TopicClient, TopicEntry, TopicPublisher};
pub use wire::{AttributeValue, MessageAttributes};

// --- Crate-Internal Re-exports ---
pub(crate) use wire::{chunk_entries, kind_attributes};

// --- Submodules ---

/// Event bus publisher.
mod event_bus;
/// Fan-out over several publishers or receivers.
mod many;
/// In-process transport.
mod memory;
/// Polling queue transport.
mod queue;
/// Pub/sub topic publisher.
mod topic;
/// Attribute and batch helpers shared by the cloud transports.
mod wire;

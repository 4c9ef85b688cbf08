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

//! # Ferry Broker
//!
//! A message broker that decouples application handlers from the transport
//! moving their messages.
//!
//! ## Key Concepts
//!
//! - **Broker (`Broker`)**: the application-facing façade. Handlers register on
//!   it, messages are published through it, and it starts and stops the
//!   transports it manages.
//! - **Assembly (`Configure`)**: a broker is built by folding configuration
//!   steps such as `with_queue_transport` or `with_middleware` over an empty
//!   `BrokerConfig`. With no transport configured it runs in memory.
//! - **Transports**: `MemoryTransport` for in-process delivery,
//!   `QueueTransport` for a long-polled managed queue with at-least-once
//!   delivery, and the publish-only `TopicPublisher` and `EventBusPublisher`.
//! - **Middleware**: `tracing_middleware` and `retry_middleware` wrap every
//!   handler invocation.
//! - **Configuration (`FerryConfig`)**: defaults for polling, batching and
//!   retries, read from `ferry/config.toml` in the XDG config directories.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use ferry_broker::prelude::*;
//!
//! #[ferry_message(name = "orders/created", version = "2022-01-02")]
//! struct OrderCreated {
//!     order_id: u64,
//! }
//!
//! let broker = Broker::new(Vec::new())?;
//! broker
//!     .handle(Handler::on_kind::<OrderCreated, _, _>(|order| async move {
//!         tracing::info!(order_id = order.order_id, "order created");
//!         Ok(())
//!     }))
//!     .await;
//! broker.start().await?;
//! broker.publish_one(Message::encode(&OrderCreated { order_id: 7 })?).await?;
//! ```

extern crate self as ferry_broker;

/// Broker façade and configuration folding.
pub(crate) mod broker;

/// File-backed configuration.
pub(crate) mod common;

/// Built-in middleware.
pub(crate) mod middleware;

/// Transports and their cloud client traits.
pub mod transports;

pub use common::{BatchConfig, FerryConfig, QueueConfig, RetryConfig, CONFIG};

/// A prelude module for conveniently importing the most commonly used items.
///
/// # Re-exports
///
/// ## Macros (from `ferry-macro`)
/// *   [`ferry_macro::ferry_message`]: Attribute macro defining a message kind.
///
/// ## External Crates
/// *   [`async_trait::async_trait`](https://docs.rs/async-trait/latest/async_trait/attr.async_trait.html): needed to implement the client and capability traits.
///
/// ## Core Types (from `ferry-core`)
/// *   [`ferry_core::Message`], [`ferry_core::MessageKind`]: the message model.
/// *   [`ferry_core::Handler`], [`ferry_core::HandlerRegistry`]: handlers and their registry.
/// *   [`ferry_core::Middleware`]: handler-wrapping functions.
/// *   [`ferry_core::Publisher`], [`ferry_core::Receiver`], [`ferry_core::Managed`]: capabilities.
/// *   [`ferry_core::TransportError`], [`ferry_core::ChunkError`]: transport errors.
///
/// ## Broker
/// *   [`crate::broker::Broker`] and its configuration steps.
/// *   [`crate::middleware::tracing_middleware`], [`crate::middleware::retry_middleware`].
/// *   Every transport and its configuration steps.
pub mod prelude {
    // Macros from ferry-macro
    pub use ferry_macro::*;

    // External crate re-exports
    pub use async_trait::async_trait;

    // Core types
    pub use ferry_core::{
        chunk_by_bytes, chunk_json, BatchLimits, ChunkError, Handler, HandlerId, HandlerRegistry,
        Managed, Message, MessageError, MessageKind, Middleware, Publisher, Receiver, SizedItem,
        Transport, TransportError,
    };

    // Broker
    pub use crate::broker::{
        configure, with_managed, with_middleware, with_publisher, with_receiver, Broker,
        BrokerConfig, BrokerError, Configure,
    };
    pub use crate::middleware::{retry_middleware, tracing_middleware, RetryPolicy};
    pub use crate::transports::*;
}

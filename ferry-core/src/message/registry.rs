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

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::trace;

use super::{Handler, HandlerId, Message};
use crate::traits::Receiver;

/// A set of [`Handler`]s, unique by identity.
///
/// Clones share the same underlying set. Add, remove and iteration may race freely
/// across threads: dispatch works on a [`snapshot`](Self::snapshot) taken per
/// message, so a handler registered mid-dispatch simply misses that message.
///
/// The registry itself is a [`Receiver`], which is how the broker accepts
/// handlers without the application distinguishing it from a transport.
#[derive(Debug, Clone, Default)]
pub struct HandlerRegistry {
    handlers: Arc<DashMap<HandlerId, Handler>>,
}

impl HandlerRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `handler`. Returns `false` if this exact handler was already present.
    pub fn insert(&self, handler: Handler) -> bool {
        let id = handler.id();
        let added = self.handlers.insert(id, handler).is_none();
        trace!(handler = %id, added, "Handler registered");
        added
    }

    /// Removes `handler`. Returns `false` if it was not registered.
    pub fn remove(&self, handler: &Handler) -> bool {
        let removed = self.handlers.remove(&handler.id()).is_some();
        trace!(handler = %handler.id(), removed, "Handler removed");
        removed
    }

    /// Whether this exact handler is registered.
    pub fn contains(&self, handler: &Handler) -> bool {
        self.handlers.contains_key(&handler.id())
    }

    /// Number of registered handlers.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Whether no handler is registered.
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// All registered handlers, in no particular order.
    pub fn snapshot(&self) -> Vec<Handler> {
        self.handlers
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }

    /// The registered handlers whose predicate accepts `message`.
    pub fn matching(&self, message: &Message) -> Vec<Handler> {
        self.snapshot()
            .into_iter()
            .filter(|handler| handler.can_handle(message))
            .collect()
    }
}

#[async_trait]
impl Receiver for HandlerRegistry {
    async fn handle(&self, handler: Handler) {
        self.insert(handler);
    }

    async fn remove_handler(&self, handler: &Handler) {
        self.remove(handler);
    }
}

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

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use ferry_core::{BatchLimits, Message, Publisher, TransportError};
use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use tracing::{instrument, trace};

use super::chunk_entries;
use crate::broker::{BrokerConfig, Configure};
use crate::common::CONFIG;

/// One event of a put-events call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EventBusEntry {
    /// JSON message.
    pub detail: String,
    /// `name/version` of the message.
    pub detail_type: String,
    /// Configured event source.
    pub source: String,
    /// Target bus.
    pub event_bus_name: String,
}

/// The single call the event bus publisher makes.
#[async_trait]
pub trait EventBusClient: Send + Sync {
    /// Puts a batch of events.
    async fn put_events(&self, entries: Vec<EventBusEntry>) -> Result<(), TransportError>;
}

/// Publishes to an event bus in chunked, concurrent batches.
#[derive(Clone)]
pub struct EventBusPublisher {
    client: Arc<dyn EventBusClient>,
    source: String,
    bus_name: String,
    limits: BatchLimits,
}

impl EventBusPublisher {
    /// Publishes events from `source` onto `bus_name`.
    pub fn new(
        client: Arc<dyn EventBusClient>,
        source: impl Into<String>,
        bus_name: impl Into<String>,
    ) -> Self {
        Self {
            client,
            source: source.into(),
            bus_name: bus_name.into(),
            limits: CONFIG.batch.limits(),
        }
    }

    /// Overrides the batch limits.
    pub fn with_limits(mut self, limits: BatchLimits) -> Self {
        self.limits = limits;
        self
    }

    fn entry(&self, message: &Message) -> Result<EventBusEntry, TransportError> {
        Ok(EventBusEntry {
            detail: message.to_json()?,
            detail_type: message.kind(),
            source: self.source.clone(),
            event_bus_name: self.bus_name.clone(),
        })
    }
}

impl fmt::Debug for EventBusPublisher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBusPublisher")
            .field("source", &self.source)
            .field("bus_name", &self.bus_name)
            .field("limits", &self.limits)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Publisher for EventBusPublisher {
    #[instrument(skip(self, messages), fields(bus = %self.bus_name, count = messages.len()))]
    async fn publish(&self, messages: Vec<Message>) -> Result<(), TransportError> {
        let entries = messages
            .iter()
            .map(|message| self.entry(message))
            .collect::<Result<Vec<_>, _>>()?;

        let chunks = chunk_entries(entries, self.limits)?;
        trace!(chunks = chunks.len(), "Putting event batches");
        try_join_all(
            chunks
                .into_iter()
                .map(|chunk| self.client.put_events(chunk)),
        )
        .await?;
        Ok(())
    }
}

/// Publishes through `publisher`.
pub fn with_event_bus_publisher(publisher: EventBusPublisher) -> Configure {
    Box::new(move |config: BrokerConfig| BrokerConfig {
        publisher: Some(Arc::new(publisher)),
        ..config
    })
}

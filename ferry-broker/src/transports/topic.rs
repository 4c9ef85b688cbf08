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
use uuid::Uuid;

use super::{chunk_entries, kind_attributes, MessageAttributes};
use crate::broker::{BrokerConfig, Configure};
use crate::common::CONFIG;

/// One entry of a topic publish batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TopicEntry {
    /// Correlation id, unique within the batch.
    pub id: String,
    /// JSON message.
    pub message: String,
    /// Sender attributes.
    pub message_attributes: MessageAttributes,
}

/// The single call the topic publisher makes.
#[async_trait]
pub trait TopicClient: Send + Sync {
    /// Publishes a batch of entries to `topic`.
    async fn publish_batch(&self, topic: &str, entries: Vec<TopicEntry>)
        -> Result<(), TransportError>;
}

/// Publishes to a pub/sub topic in chunked, concurrent batches.
#[derive(Clone)]
pub struct TopicPublisher {
    client: Arc<dyn TopicClient>,
    topic: String,
    limits: BatchLimits,
}

impl TopicPublisher {
    /// Publishes to `topic` with the configured batch limits.
    pub fn new(client: Arc<dyn TopicClient>, topic: impl Into<String>) -> Self {
        Self {
            client,
            topic: topic.into(),
            limits: CONFIG.batch.limits(),
        }
    }

    /// Overrides the batch limits.
    pub fn with_limits(mut self, limits: BatchLimits) -> Self {
        self.limits = limits;
        self
    }
}

impl fmt::Debug for TopicPublisher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TopicPublisher")
            .field("topic", &self.topic)
            .field("limits", &self.limits)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Publisher for TopicPublisher {
    #[instrument(skip(self, messages), fields(topic = %self.topic, count = messages.len()))]
    async fn publish(&self, messages: Vec<Message>) -> Result<(), TransportError> {
        let entries = messages
            .iter()
            .map(|message| -> Result<TopicEntry, TransportError> {
                Ok(TopicEntry {
                    id: Uuid::new_v4().to_string(),
                    message: message.to_json()?,
                    message_attributes: kind_attributes(message),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let chunks = chunk_entries(entries, self.limits)?;
        trace!(chunks = chunks.len(), "Publishing batches");
        try_join_all(
            chunks
                .into_iter()
                .map(|chunk| self.client.publish_batch(&self.topic, chunk)),
        )
        .await?;
        Ok(())
    }
}

/// Publishes through `publisher`.
pub fn with_topic_publisher(publisher: TopicPublisher) -> Configure {
    Box::new(move |config: BrokerConfig| BrokerConfig {
        publisher: Some(Arc::new(publisher)),
        ..config
    })
}

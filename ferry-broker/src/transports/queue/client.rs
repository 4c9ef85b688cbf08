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

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use ferry_core::TransportError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::transports::MessageAttributes;

/// A message as returned by a receive call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct QueueMessage {
    /// Backend-assigned message id.
    pub message_id: Option<String>,
    /// Handle used to delete the message or change its visibility.
    pub receipt_handle: Option<String>,
    /// Raw message body.
    pub body: Option<String>,
    /// System attributes such as the receive count.
    pub attributes: HashMap<String, String>,
    /// Attributes set by the sender.
    pub message_attributes: MessageAttributes,
}

impl QueueMessage {
    /// A received message carrying `body` under `receipt_handle`.
    pub fn new(receipt_handle: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            receipt_handle: Some(receipt_handle.into()),
            body: Some(body.into()),
            ..Self::default()
        }
    }
}

/// One entry of a send batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SendBatchEntry {
    /// Correlation id, unique within the batch.
    pub id: String,
    /// JSON body.
    pub message_body: String,
    /// Sender attributes.
    pub message_attributes: MessageAttributes,
}

/// One entry of a delete batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ReceiptEntry {
    /// Correlation id, unique within the batch.
    pub id: String,
    /// Receipt handle of the message to delete.
    pub receipt_handle: String,
}

impl ReceiptEntry {
    pub(crate) fn new(receipt_handle: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            receipt_handle,
        }
    }
}

/// One entry of a change-visibility batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct VisibilityEntry {
    /// Correlation id, unique within the batch.
    pub id: String,
    /// Receipt handle of the message to change.
    pub receipt_handle: String,
    /// New visibility timeout in seconds. Zero makes the message receivable again at once.
    pub visibility_timeout: u32,
}

impl VisibilityEntry {
    pub(crate) fn release(receipt_handle: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            receipt_handle,
            visibility_timeout: 0,
        }
    }
}

/// Parameters of a long-poll receive call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiveRequest {
    /// How long the backend may hold the call open waiting for messages.
    pub wait_time: Duration,
    /// Upper bound on messages returned.
    pub max_messages: u32,
    /// System attributes to return.
    pub attribute_names: Vec<String>,
    /// Sender attributes to return, as patterns.
    pub message_attribute_names: Vec<String>,
}

impl ReceiveRequest {
    /// Requests every system and sender attribute.
    pub fn all_attributes(wait_time: Duration, max_messages: u32) -> Self {
        Self {
            wait_time,
            max_messages,
            attribute_names: vec!["All".to_string()],
            message_attribute_names: vec![".*".to_string()],
        }
    }
}

/// The calls the queue transport makes against a managed queue.
///
/// Implement this over the vendor SDK client. Every method maps onto exactly one
/// backend request; failures are reported as [`TransportError::Backend`].
#[async_trait]
pub trait QueueClient: Send + Sync {
    /// Resolves a queue name to its address. `Ok(None)` means no such queue.
    async fn queue_url(&self, queue_name: &str) -> Result<Option<String>, TransportError>;

    /// Sends one message.
    async fn send_message(&self, queue_url: &str, body: String) -> Result<(), TransportError>;

    /// Sends a batch of messages.
    async fn send_message_batch(
        &self,
        queue_url: &str,
        entries: Vec<SendBatchEntry>,
    ) -> Result<(), TransportError>;

    /// Long-polls for messages.
    async fn receive_messages(
        &self,
        queue_url: &str,
        request: ReceiveRequest,
    ) -> Result<Vec<QueueMessage>, TransportError>;

    /// Deletes processed messages.
    async fn delete_message_batch(
        &self,
        queue_url: &str,
        entries: Vec<ReceiptEntry>,
    ) -> Result<(), TransportError>;

    /// Changes the visibility timeout of received messages.
    async fn change_message_visibility_batch(
        &self,
        queue_url: &str,
        entries: Vec<VisibilityEntry>,
    ) -> Result<(), TransportError>;
}

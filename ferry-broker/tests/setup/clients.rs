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
#![allow(unused)]

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use ferry_broker::prelude::*;
use parking_lot::Mutex;

/// Scripted queue backend recording every call.
///
/// Receive calls return the scripted batches in order, then empty batches
/// after a short simulated long-poll.
#[derive(Default)]
pub struct FakeQueueClient {
    queues: HashMap<String, String>,
    state: Mutex<QueueState>,
}

#[derive(Default)]
struct QueueState {
    lookups: usize,
    inbox: VecDeque<Vec<QueueMessage>>,
    receive_calls: usize,
    receive_failures: usize,
    delete_failures: usize,
    release_failures: usize,
    ack_failures: usize,
    sent: Vec<String>,
    batches: Vec<Vec<SendBatchEntry>>,
    deleted: Vec<Vec<ReceiptEntry>>,
    released: Vec<Vec<VisibilityEntry>>,
}

impl FakeQueueClient {
    /// A backend knowing one queue, `name`.
    pub fn with_queue(name: &str) -> Arc<Self> {
        Arc::new(Self {
            queues: HashMap::from([(name.to_string(), format!("https://queue.test/{name}"))]),
            state: Mutex::default(),
        })
    }

    /// A backend knowing no queue at all.
    pub fn empty() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Scripts the next non-empty receive response.
    pub fn enqueue(&self, messages: Vec<QueueMessage>) {
        self.state.lock().inbox.push_back(messages);
    }

    /// Makes the next `count` receive calls fail.
    pub fn fail_receives(&self, count: usize) {
        self.state.lock().receive_failures = count;
    }

    /// Makes the next `count` delete batches fail.
    pub fn fail_deletes(&self, count: usize) {
        self.state.lock().delete_failures = count;
    }

    /// Makes the next `count` visibility batches fail.
    pub fn fail_releases(&self, count: usize) {
        self.state.lock().release_failures = count;
    }

    /// Delete and visibility batches that failed as scripted.
    pub fn ack_failures(&self) -> usize {
        self.state.lock().ack_failures
    }

    pub fn lookups(&self) -> usize {
        self.state.lock().lookups
    }

    pub fn receive_calls(&self) -> usize {
        self.state.lock().receive_calls
    }

    pub fn sent(&self) -> Vec<String> {
        self.state.lock().sent.clone()
    }

    pub fn batches(&self) -> Vec<Vec<SendBatchEntry>> {
        self.state.lock().batches.clone()
    }

    pub fn deleted_handles(&self) -> Vec<String> {
        let state = self.state.lock();
        state
            .deleted
            .iter()
            .flatten()
            .map(|entry| entry.receipt_handle.clone())
            .collect()
    }

    pub fn released(&self) -> Vec<VisibilityEntry> {
        self.state.lock().released.iter().flatten().cloned().collect()
    }

    pub fn released_handles(&self) -> Vec<String> {
        self.released()
            .into_iter()
            .map(|entry| entry.receipt_handle)
            .collect()
    }

    fn known(&self, queue_url: &str) -> Result<(), TransportError> {
        if self.queues.values().any(|url| url == queue_url) {
            Ok(())
        } else {
            Err(TransportError::backend(format!("no queue at {queue_url}")))
        }
    }
}

#[async_trait]
impl QueueClient for FakeQueueClient {
    async fn queue_url(&self, queue_name: &str) -> Result<Option<String>, TransportError> {
        self.state.lock().lookups += 1;
        Ok(self.queues.get(queue_name).cloned())
    }

    async fn send_message(&self, queue_url: &str, body: String) -> Result<(), TransportError> {
        self.known(queue_url)?;
        self.state.lock().sent.push(body);
        Ok(())
    }

    async fn send_message_batch(
        &self,
        queue_url: &str,
        entries: Vec<SendBatchEntry>,
    ) -> Result<(), TransportError> {
        self.known(queue_url)?;
        self.state.lock().batches.push(entries);
        Ok(())
    }

    async fn receive_messages(
        &self,
        queue_url: &str,
        request: ReceiveRequest,
    ) -> Result<Vec<QueueMessage>, TransportError> {
        self.known(queue_url)?;
        let scripted = {
            let mut state = self.state.lock();
            state.receive_calls += 1;
            if state.receive_failures > 0 {
                state.receive_failures -= 1;
                return Err(TransportError::backend("receive failed"));
            }
            state.inbox.pop_front()
        };
        match scripted {
            Some(messages) => Ok(messages),
            None => {
                tokio::time::sleep(Duration::from_millis(5)).await;
                Ok(Vec::new())
            }
        }
    }

    async fn delete_message_batch(
        &self,
        queue_url: &str,
        entries: Vec<ReceiptEntry>,
    ) -> Result<(), TransportError> {
        self.known(queue_url)?;
        let mut state = self.state.lock();
        if state.delete_failures > 0 {
            state.delete_failures -= 1;
            state.ack_failures += 1;
            return Err(TransportError::backend("delete failed"));
        }
        state.deleted.push(entries);
        Ok(())
    }

    async fn change_message_visibility_batch(
        &self,
        queue_url: &str,
        entries: Vec<VisibilityEntry>,
    ) -> Result<(), TransportError> {
        self.known(queue_url)?;
        let mut state = self.state.lock();
        if state.release_failures > 0 {
            state.release_failures -= 1;
            state.ack_failures += 1;
            return Err(TransportError::backend("release failed"));
        }
        state.released.push(entries);
        Ok(())
    }
}

/// Topic backend recording every batch.
#[derive(Default)]
pub struct FakeTopicClient {
    batches: Mutex<Vec<(String, Vec<TopicEntry>)>>,
}

impl FakeTopicClient {
    pub fn batches(&self) -> Vec<(String, Vec<TopicEntry>)> {
        self.batches.lock().clone()
    }
}

#[async_trait]
impl TopicClient for FakeTopicClient {
    async fn publish_batch(
        &self,
        topic: &str,
        entries: Vec<TopicEntry>,
    ) -> Result<(), TransportError> {
        self.batches.lock().push((topic.to_string(), entries));
        Ok(())
    }
}

/// Event bus backend recording every batch.
#[derive(Default)]
pub struct FakeEventBusClient {
    batches: Mutex<Vec<Vec<EventBusEntry>>>,
}

impl FakeEventBusClient {
    pub fn batches(&self) -> Vec<Vec<EventBusEntry>> {
        self.batches.lock().clone()
    }
}

#[async_trait]
impl EventBusClient for FakeEventBusClient {
    async fn put_events(&self, entries: Vec<EventBusEntry>) -> Result<(), TransportError> {
        self.batches.lock().push(entries);
        Ok(())
    }
}

/// A publisher recording what it was asked to publish.
#[derive(Clone, Default)]
pub struct RecordingPublisher {
    published: Arc<Mutex<Vec<Message>>>,
}

impl RecordingPublisher {
    pub fn published(&self) -> Vec<Message> {
        self.published.lock().clone()
    }
}

#[async_trait]
impl Publisher for RecordingPublisher {
    async fn publish(&self, messages: Vec<Message>) -> Result<(), TransportError> {
        self.published.lock().extend(messages);
        Ok(())
    }
}

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
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use ferry_core::{
    dispatch_all, panic_error, BatchLimits, Handler, HandlerRegistry, Managed, Message, Publisher,
    Receiver, TransportError,
};
use futures::future::{join_all, try_join_all};
use futures::FutureExt;
use static_assertions::assert_impl_all;
use tokio::sync::{Mutex, Notify, OnceCell};
use tokio::task::JoinHandle;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, instrument, trace, warn};
use uuid::Uuid;

use super::{
    default_translator, QueueClient, QueueMessage, ReceiptEntry, ReceiveRequest, SendBatchEntry,
    TranslateError, Translator, VisibilityEntry,
};
use crate::broker::{BrokerConfig, Configure};
use crate::common::CONFIG;
use crate::transports::{chunk_entries, kind_attributes};

/// Called with the received message and the cause whenever a message fails
/// translation or dispatch and is released for redelivery.
pub type DispatchErrorHook = Arc<dyn Fn(&QueueMessage, &anyhow::Error) + Send + Sync>;

/// Tunables of a [`QueueTransport`].
#[derive(Debug, Clone, PartialEq)]
pub struct QueueTransportOptions {
    /// Delay before every poll cycle.
    pub poll_interval: Duration,
    /// Long-poll wait of each receive call.
    pub wait_time: Duration,
    /// Messages requested per receive call.
    pub max_messages: u32,
    /// Ceilings applied to every batch call.
    pub batch_limits: BatchLimits,
}

impl Default for QueueTransportOptions {
    fn default() -> Self {
        Self {
            poll_interval: CONFIG.queue.poll_interval(),
            wait_time: CONFIG.queue.wait_time(),
            max_messages: CONFIG.queue.max_messages,
            batch_limits: CONFIG.batch.limits(),
        }
    }
}

/// Builds a [`QueueTransport`].
pub struct QueueTransportBuilder {
    client: Arc<dyn QueueClient>,
    queue: String,
    options: QueueTransportOptions,
    translator: Translator,
    on_dispatch_error: Option<DispatchErrorHook>,
}

impl QueueTransportBuilder {
    /// Replaces all options at once.
    pub fn options(mut self, options: QueueTransportOptions) -> Self {
        self.options = options;
        self
    }

    /// Sets the delay before every poll cycle.
    pub fn poll_interval(mut self, poll_interval: Duration) -> Self {
        self.options.poll_interval = poll_interval;
        self
    }

    /// Replaces the default body-parsing translation.
    pub fn translator<F>(mut self, translator: F) -> Self
    where
        F: Fn(&QueueMessage) -> Result<Message, TranslateError> + Send + Sync + 'static,
    {
        self.translator = Arc::new(translator);
        self
    }

    /// Observes every message released for redelivery.
    pub fn on_dispatch_error<F>(mut self, hook: F) -> Self
    where
        F: Fn(&QueueMessage, &anyhow::Error) + Send + Sync + 'static,
    {
        self.on_dispatch_error = Some(Arc::new(hook));
        self
    }

    /// Builds the transport. Nothing is contacted until `start` or `publish`.
    pub fn build(self) -> QueueTransport {
        let shutdown = CancellationToken::new();
        QueueTransport {
            shutdown: Arc::new(shutdown.clone().drop_guard()),
            inner: Arc::new(QueueInner {
                client: self.client,
                queue: self.queue,
                options: self.options,
                translator: self.translator,
                on_dispatch_error: self.on_dispatch_error,
                queue_url: OnceCell::new(),
                started: AtomicBool::new(false),
                handlers: HandlerRegistry::new(),
                handlers_changed: Notify::new(),
                poller: Mutex::new(None),
                shutdown,
            }),
        }
    }
}

/// A transport over a managed, long-polled cloud queue.
///
/// Publishing sends a single message directly and larger batches in chunked,
/// concurrent batch calls. Once started, one poll task per transport receives
/// messages, dispatches each to the registered handlers, deletes those that
/// succeeded and makes those that failed visible again immediately.
///
/// The poll task idles while no handler is registered, so a started transport
/// with no consumers issues no receive calls. `stop` prevents the next cycle
/// but lets a cycle already underway finish. A panicking handler or
/// translator fails its message like any other error.
///
/// Clones share the same queue, registry and poll task. Dropping the last
/// clone stops the poll task after its current cycle.
#[derive(Clone)]
pub struct QueueTransport {
    inner: Arc<QueueInner>,
    shutdown: Arc<DropGuard>,
}

assert_impl_all!(QueueTransport: Send, Sync);

struct QueueInner {
    client: Arc<dyn QueueClient>,
    queue: String,
    options: QueueTransportOptions,
    translator: Translator,
    on_dispatch_error: Option<DispatchErrorHook>,
    queue_url: OnceCell<String>,
    started: AtomicBool,
    handlers: HandlerRegistry,
    handlers_changed: Notify,
    poller: Mutex<Option<Poller>>,
    // Cancelled once every `QueueTransport` handle is gone.
    shutdown: CancellationToken,
}

struct Poller {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl QueueTransport {
    /// Starts building a transport for the queue named `queue`.
    pub fn builder(client: Arc<dyn QueueClient>, queue: impl Into<String>) -> QueueTransportBuilder {
        QueueTransportBuilder {
            client,
            queue: queue.into(),
            options: QueueTransportOptions::default(),
            translator: default_translator(),
            on_dispatch_error: None,
        }
    }

    /// A transport with default options and translation.
    pub fn new(client: Arc<dyn QueueClient>, queue: impl Into<String>) -> Self {
        Self::builder(client, queue).build()
    }

    /// The symbolic queue name.
    pub fn queue(&self) -> &str {
        &self.inner.queue
    }

    /// Whether the transport is started.
    pub fn is_started(&self) -> bool {
        self.inner.started.load(Ordering::SeqCst)
    }

    /// Number of registered handlers.
    pub fn handler_count(&self) -> usize {
        self.inner.handlers.len()
    }
}

impl fmt::Debug for QueueTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueueTransport")
            .field("queue", &self.inner.queue)
            .field("started", &self.is_started())
            .field("handlers", &self.inner.handlers.len())
            .finish()
    }
}

impl QueueInner {
    async fn resolve_queue_url(&self) -> Result<&str, TransportError> {
        let url = self
            .queue_url
            .get_or_try_init(|| self.lookup_queue_url())
            .await?;
        Ok(url.as_str())
    }

    async fn lookup_queue_url(&self) -> Result<String, TransportError> {
        match self.client.queue_url(&self.queue).await? {
            Some(url) => {
                debug!(queue = %self.queue, url = %url, "Resolved queue address");
                Ok(url)
            }
            None => Err(TransportError::UnknownDestination(self.queue.clone())),
        }
    }

    /// Waits until the next cycle is due. Returns `false` once cancelled.
    async fn next_poll(&self, cancel: &CancellationToken) -> bool {
        loop {
            while self.handlers.is_empty() {
                trace!(queue = %self.queue, "No handlers registered, poll loop idle");
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => return false,
                    () = self.handlers_changed.notified() => {}
                }
            }

            tokio::select! {
                biased;
                () = cancel.cancelled() => return false,
                () = tokio::time::sleep(self.options.poll_interval) => {}
            }

            // The last handler may have gone while waiting.
            if !self.handlers.is_empty() {
                return true;
            }
        }
    }

    #[instrument(skip(self, queue_url), fields(queue = %self.queue))]
    async fn poll_once(&self, queue_url: &str) {
        let request =
            ReceiveRequest::all_attributes(self.options.wait_time, self.options.max_messages);
        let received = match self.client.receive_messages(queue_url, request).await {
            Ok(received) => received,
            Err(err) => {
                warn!(error = %err, "Receive failed, retrying next cycle");
                return;
            }
        };
        if received.is_empty() {
            trace!("No messages received");
            return;
        }
        debug!(count = received.len(), "Received messages");

        let outcomes = join_all(received.iter().map(|wire| self.dispatch(wire))).await;

        let mut succeeded = Vec::new();
        let mut failed = Vec::new();
        for (wire, ok) in received.iter().zip(outcomes) {
            let Some(receipt_handle) = wire.receipt_handle.clone() else {
                warn!(message_id = ?wire.message_id, "Received message has no receipt handle, skipping acknowledgement");
                continue;
            };
            if ok {
                succeeded.push(receipt_handle);
            } else {
                failed.push(receipt_handle);
            }
        }

        let deleted = succeeded.len();
        let released = failed.len();
        let (delete_result, release_result) = tokio::join!(
            self.delete_succeeded(queue_url, succeeded),
            self.release_failed(queue_url, failed)
        );
        if let Err(err) = delete_result {
            warn!(error = %err, count = deleted, "Deleting processed messages failed, they will be redelivered");
        }
        if let Err(err) = release_result {
            warn!(error = %err, count = released, "Releasing failed messages failed, they reappear after the visibility timeout");
        }
        trace!(deleted, released, "Poll cycle acknowledged");
    }

    /// Translates and dispatches one received message. Returns whether it succeeded.
    async fn dispatch(&self, wire: &QueueMessage) -> bool {
        let result = AssertUnwindSafe(self.translate_and_dispatch(wire))
            .catch_unwind()
            .await
            .unwrap_or_else(|payload| Err(panic_error(payload)));

        match result {
            Ok(()) => true,
            Err(err) => {
                warn!(
                    queue = %self.queue,
                    message_id = ?wire.message_id,
                    error = %err,
                    "Message failed, releasing for redelivery"
                );
                if let Some(hook) = &self.on_dispatch_error {
                    hook(wire, &err);
                }
                false
            }
        }
    }

    async fn translate_and_dispatch(&self, wire: &QueueMessage) -> anyhow::Result<()> {
        let message = (self.translator)(wire)?;
        dispatch_all(self.handlers.matching(&message), &message).await
    }

    async fn delete_succeeded(
        &self,
        queue_url: &str,
        receipt_handles: Vec<String>,
    ) -> Result<(), TransportError> {
        if receipt_handles.is_empty() {
            return Ok(());
        }
        let entries: Vec<ReceiptEntry> = receipt_handles
            .into_iter()
            .map(ReceiptEntry::new)
            .collect();
        let chunks = chunk_entries(entries, self.options.batch_limits)?;
        try_join_all(
            chunks
                .into_iter()
                .map(|chunk| self.client.delete_message_batch(queue_url, chunk)),
        )
        .await?;
        Ok(())
    }

    async fn release_failed(
        &self,
        queue_url: &str,
        receipt_handles: Vec<String>,
    ) -> Result<(), TransportError> {
        if receipt_handles.is_empty() {
            return Ok(());
        }
        let entries: Vec<VisibilityEntry> = receipt_handles
            .into_iter()
            .map(VisibilityEntry::release)
            .collect();
        let chunks = chunk_entries(entries, self.options.batch_limits)?;
        try_join_all(
            chunks
                .into_iter()
                .map(|chunk| self.client.change_message_visibility_batch(queue_url, chunk)),
        )
        .await?;
        Ok(())
    }
}

async fn run_poll_loop(inner: Arc<QueueInner>, queue_url: String, cancel: CancellationToken) {
    trace!(queue = %inner.queue, "Poll loop running");
    while inner.next_poll(&cancel).await {
        inner.poll_once(&queue_url).await;
    }
    trace!(queue = %inner.queue, "Poll loop finished");
}

#[async_trait]
impl Publisher for QueueTransport {
    #[instrument(skip(self, messages), fields(queue = %self.inner.queue, count = messages.len()))]
    async fn publish(&self, messages: Vec<Message>) -> Result<(), TransportError> {
        if messages.is_empty() {
            return Ok(());
        }
        let queue_url = self.inner.resolve_queue_url().await?;

        if let [message] = messages.as_slice() {
            return self
                .inner
                .client
                .send_message(queue_url, message.to_json()?)
                .await;
        }

        let entries = messages
            .iter()
            .map(|message| -> Result<SendBatchEntry, TransportError> {
                Ok(SendBatchEntry {
                    id: Uuid::new_v4().to_string(),
                    message_body: message.to_json()?,
                    message_attributes: kind_attributes(message),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let chunks = chunk_entries(entries, self.inner.options.batch_limits)?;
        trace!(chunks = chunks.len(), "Submitting batches");
        try_join_all(
            chunks
                .into_iter()
                .map(|chunk| self.inner.client.send_message_batch(queue_url, chunk)),
        )
        .await?;
        Ok(())
    }
}

#[async_trait]
impl Receiver for QueueTransport {
    async fn handle(&self, handler: Handler) {
        if self.inner.handlers.insert(handler) {
            self.inner.handlers_changed.notify_one();
        }
    }

    async fn remove_handler(&self, handler: &Handler) {
        if self.inner.handlers.remove(handler) {
            self.inner.handlers_changed.notify_one();
        }
    }
}

#[async_trait]
impl Managed for QueueTransport {
    #[instrument(skip(self), fields(queue = %self.inner.queue))]
    async fn start(&self) -> Result<(), TransportError> {
        let mut poller = self.inner.poller.lock().await;
        if self.is_started() {
            trace!("Queue transport already started");
            return Ok(());
        }

        let queue_url = self.inner.resolve_queue_url().await?.to_string();

        // A stopped loop may still be finishing its last cycle.
        if let Some(previous) = poller.take() {
            previous.cancel.cancel();
            if let Err(err) = previous.task.await {
                warn!(error = %err, "Previous poll loop ended abnormally");
            }
        }

        let cancel = self.inner.shutdown.child_token();
        let task = tokio::spawn(run_poll_loop(
            Arc::clone(&self.inner),
            queue_url,
            cancel.clone(),
        ));
        *poller = Some(Poller { cancel, task });
        self.inner.started.store(true, Ordering::SeqCst);
        debug!("Queue transport started");
        Ok(())
    }

    #[instrument(skip(self), fields(queue = %self.inner.queue))]
    async fn stop(&self) -> Result<(), TransportError> {
        let poller = self.inner.poller.lock().await;
        if !self.is_started() {
            trace!("Queue transport already stopped");
            return Ok(());
        }
        if let Some(poller) = poller.as_ref() {
            poller.cancel.cancel();
        }
        self.inner.started.store(false, Ordering::SeqCst);
        debug!("Queue transport stopped");
        Ok(())
    }
}

/// Publishes through `transport`.
pub fn with_queue_sender(transport: QueueTransport) -> Configure {
    Box::new(move |config: BrokerConfig| BrokerConfig {
        publisher: Some(Arc::new(transport)),
        ..config
    })
}

/// Receives through `transport` and manages its lifecycle.
pub fn with_queue_receiver(transport: QueueTransport) -> Configure {
    Box::new(move |mut config: BrokerConfig| {
        config.managed.push(Arc::new(transport.clone()));
        config.receiver = Some(Arc::new(transport));
        config
    })
}

/// Publishes and receives through `transport`.
pub fn with_queue_transport(transport: QueueTransport) -> Configure {
    let sender = with_queue_sender(transport.clone());
    let receiver = with_queue_receiver(transport);
    Box::new(move |config: BrokerConfig| sender(receiver(config)))
}

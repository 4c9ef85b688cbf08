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
use std::sync::Arc;

use async_trait::async_trait;
use ferry_core::{
    dispatch_all, panic_error, Handler, HandlerRegistry, Managed, Message, Publisher, Receiver,
    TransportError,
};
use futures::FutureExt;
use static_assertions::assert_impl_all;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, trace, warn};

use crate::broker::{BrokerConfig, Configure};

type DeliveryQueue = mpsc::UnboundedReceiver<Message>;

/// Same-process transport delivering every published message to every
/// matching handler.
///
/// Published messages are queued in order and delivered by a task that runs
/// between `start` and `stop`. Messages published while stopped wait for the
/// next `start`. Each message is dispatched to its handlers concurrently and
/// the next message waits until they have all finished. Handler failures,
/// panics included, are logged and do not stop delivery.
#[derive(Clone)]
pub struct MemoryTransport {
    inner: Arc<MemoryInner>,
}

assert_impl_all!(MemoryTransport: Send, Sync);

struct MemoryInner {
    sender: mpsc::UnboundedSender<Message>,
    handlers: HandlerRegistry,
    worker: Mutex<Worker>,
}

enum Worker {
    Idle(DeliveryQueue),
    Running {
        cancel: CancellationToken,
        task: JoinHandle<DeliveryQueue>,
    },
    Lost,
}

impl MemoryTransport {
    /// A stopped transport with an empty queue.
    pub fn new() -> Self {
        let (sender, queue) = mpsc::unbounded_channel();
        Self {
            inner: Arc::new(MemoryInner {
                sender,
                handlers: HandlerRegistry::new(),
                worker: Mutex::new(Worker::Idle(queue)),
            }),
        }
    }

    /// Number of registered handlers.
    pub fn handler_count(&self) -> usize {
        self.inner.handlers.len()
    }
}

impl Default for MemoryTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MemoryTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryTransport")
            .field("handlers", &self.inner.handlers.len())
            .finish_non_exhaustive()
    }
}

async fn deliver(
    handlers: HandlerRegistry,
    mut queue: DeliveryQueue,
    cancel: CancellationToken,
) -> DeliveryQueue {
    loop {
        let message = tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            next = queue.recv() => match next {
                Some(message) => message,
                None => break,
            },
        };
        trace!(kind = %message.kind(), "Delivering message");
        let delivered = AssertUnwindSafe(async {
            dispatch_all(handlers.matching(&message), &message).await
        })
        .catch_unwind()
        .await
        .unwrap_or_else(|payload| Err(panic_error(payload)));
        if let Err(err) = delivered {
            warn!(kind = %message.kind(), error = %err, "In-memory delivery failed");
        }
    }
    queue
}

#[async_trait]
impl Publisher for MemoryTransport {
    async fn publish(&self, messages: Vec<Message>) -> Result<(), TransportError> {
        for message in messages {
            self.inner
                .sender
                .send(message)
                .map_err(|_| TransportError::backend("in-memory delivery queue is closed"))?;
        }
        Ok(())
    }
}

#[async_trait]
impl Receiver for MemoryTransport {
    async fn handle(&self, handler: Handler) {
        self.inner.handlers.insert(handler);
    }

    async fn remove_handler(&self, handler: &Handler) {
        self.inner.handlers.remove(handler);
    }
}

#[async_trait]
impl Managed for MemoryTransport {
    #[instrument(skip(self))]
    async fn start(&self) -> Result<(), TransportError> {
        let mut worker = self.inner.worker.lock().await;
        match std::mem::replace(&mut *worker, Worker::Lost) {
            Worker::Idle(queue) => {
                let cancel = CancellationToken::new();
                let task = tokio::spawn(deliver(
                    self.inner.handlers.clone(),
                    queue,
                    cancel.clone(),
                ));
                *worker = Worker::Running { cancel, task };
                debug!("In-memory transport started");
                Ok(())
            }
            running @ Worker::Running { .. } => {
                *worker = running;
                trace!("In-memory transport already started");
                Ok(())
            }
            Worker::Lost => Err(TransportError::backend(
                "in-memory delivery queue was lost by a failed delivery task",
            )),
        }
    }

    #[instrument(skip(self))]
    async fn stop(&self) -> Result<(), TransportError> {
        let mut worker = self.inner.worker.lock().await;
        match std::mem::replace(&mut *worker, Worker::Lost) {
            Worker::Running { cancel, task } => {
                cancel.cancel();
                let queue = task.await.map_err(TransportError::backend)?;
                *worker = Worker::Idle(queue);
                debug!("In-memory transport stopped");
                Ok(())
            }
            other => {
                *worker = other;
                trace!("In-memory transport already stopped");
                Ok(())
            }
        }
    }
}

/// Publishes and receives through `transport`, and manages its delivery task.
pub fn with_memory_transport(transport: MemoryTransport) -> Configure {
    Box::new(move |mut config: BrokerConfig| {
        config.publisher = Some(Arc::new(transport.clone()));
        config.receiver = Some(Arc::new(transport.clone()));
        config.managed.push(Arc::new(transport));
        config
    })
}

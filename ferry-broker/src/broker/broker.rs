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
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use ferry_core::{
    dispatch_all, middleware_chain, Handler, HandlerRegistry, Managed, Message, Middleware,
    Publisher, Receiver, TransportError,
};
use futures::future::join_all;
use static_assertions::assert_impl_all;
use tokio::sync::Mutex;
use tracing::{debug, instrument, trace, warn};

use super::{BrokerConfig, BrokerError, Configure};
use crate::transports::MemoryTransport;

/// The application-facing message broker.
///
/// A broker owns one logical publisher and one logical receiver, each possibly
/// fanned out over several transports, plus the components whose lifecycle it
/// manages. Application handlers are registered on the broker itself; the
/// receiver only ever sees a single internal fan-out handler which, for every
/// inbound message, runs each matching handler through the middleware chain.
///
/// ```rust,ignore
/// let broker = Broker::new([with_queue_transport(queue), with_middleware(tracing_middleware())])?;
/// broker.handle(Handler::on_kind::<OrderCreated, _, _>(|order| async move { ship(order).await })).await;
/// broker.start().await?;
/// broker.publish_one(Message::encode(&OrderCreated { order_id: 7 })?).await?;
/// ```
///
/// Clones share the same state.
#[derive(Clone)]
pub struct Broker {
    inner: Arc<BrokerInner>,
}

assert_impl_all!(Broker: Send, Sync);

struct BrokerInner {
    publisher: Arc<dyn Publisher>,
    receiver: Arc<dyn Receiver>,
    managed: Vec<Arc<dyn Managed>>,
    handlers: HandlerRegistry,
    fan_out: Handler,
    lifecycle: Mutex<()>,
    started: AtomicBool,
}

impl Broker {
    /// Folds `steps` over an empty configuration and builds the broker.
    ///
    /// # Errors
    ///
    /// Fails if exactly one of publisher and receiver ends up configured. When
    /// neither is, a fresh [`MemoryTransport`] serves as both.
    pub fn new<I>(steps: I) -> Result<Self, BrokerError>
    where
        I: IntoIterator<Item = Configure>,
    {
        let config = steps
            .into_iter()
            .fold(BrokerConfig::default(), |config, step| step(config));
        Self::from_config(config)
    }

    /// Builds the broker from an assembled configuration.
    ///
    /// # Errors
    ///
    /// See [`Broker::new`].
    pub fn from_config(config: BrokerConfig) -> Result<Self, BrokerError> {
        let BrokerConfig {
            publisher,
            receiver,
            mut managed,
            middleware,
        } = config;

        let (publisher, receiver): (Arc<dyn Publisher>, Arc<dyn Receiver>) =
            match (publisher, receiver) {
                (Some(publisher), Some(receiver)) => (publisher, receiver),
                (None, None) => {
                    debug!("No transport configured, using an in-memory transport");
                    let memory = MemoryTransport::new();
                    managed.push(Arc::new(memory.clone()));
                    let publisher: Arc<dyn Publisher> = Arc::new(memory.clone());
                    let receiver: Arc<dyn Receiver> = Arc::new(memory);
                    (publisher, receiver)
                }
                (None, Some(_)) => return Err(BrokerError::NoPublisherConfigured),
                (Some(_), None) => return Err(BrokerError::NoReceiverConfigured),
            };

        let handlers = HandlerRegistry::new();
        let fan_out = fan_out(handlers.clone(), middleware.into());

        Ok(Self {
            inner: Arc::new(BrokerInner {
                publisher,
                receiver,
                managed,
                handlers,
                fan_out,
                lifecycle: Mutex::new(()),
                started: AtomicBool::new(false),
            }),
        })
    }

    /// Whether the broker is started.
    pub fn is_started(&self) -> bool {
        self.inner.started.load(Ordering::SeqCst)
    }

    /// Number of application handlers registered.
    pub fn handler_count(&self) -> usize {
        self.inner.handlers.len()
    }

    async fn stop_managed(&self) -> Result<(), TransportError> {
        let results = join_all(self.inner.managed.iter().map(|component| component.stop())).await;
        first_error(results, "Managed component failed to stop")
    }
}

impl fmt::Debug for Broker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Broker")
            .field("started", &self.is_started())
            .field("handlers", &self.inner.handlers.len())
            .field("managed", &self.inner.managed.len())
            .finish_non_exhaustive()
    }
}

/// The single handler a broker registers on its receiver.
fn fan_out(handlers: HandlerRegistry, middleware: Arc<[Middleware]>) -> Handler {
    Handler::any(move |message: Message| {
        let matching = handlers.matching(&message);
        let middleware = Arc::clone(&middleware);
        async move {
            let chains = matching
                .into_iter()
                .map(|handler| middleware_chain(handler, &middleware));
            dispatch_all(chains, &message).await
        }
    })
}

/// Logs every failure and returns the first.
fn first_error(
    results: Vec<Result<(), TransportError>>,
    context: &'static str,
) -> Result<(), TransportError> {
    let mut first = None;
    for err in results.into_iter().filter_map(Result::err) {
        warn!(error = %err, "{}", context);
        first.get_or_insert(err);
    }
    first.map_or(Ok(()), Err)
}

#[async_trait]
impl Publisher for Broker {
    async fn publish(&self, messages: Vec<Message>) -> Result<(), TransportError> {
        trace!(count = messages.len(), "Publishing");
        self.inner.publisher.publish(messages).await
    }
}

#[async_trait]
impl Receiver for Broker {
    async fn handle(&self, handler: Handler) {
        self.inner.handlers.insert(handler);
    }

    async fn remove_handler(&self, handler: &Handler) {
        self.inner.handlers.remove(handler);
    }
}

#[async_trait]
impl Managed for Broker {
    /// Attaches the fan-out handler to the receiver, then starts every managed
    /// component. If any of them fails, the ones already started are stopped
    /// again and the broker stays stopped.
    #[instrument(skip(self))]
    async fn start(&self) -> Result<(), TransportError> {
        let _lifecycle = self.inner.lifecycle.lock().await;
        if self.is_started() {
            trace!("Broker already started");
            return Ok(());
        }

        self.inner.receiver.handle(self.inner.fan_out.clone()).await;

        let results = join_all(self.inner.managed.iter().map(|component| component.start())).await;
        if let Err(err) = first_error(results, "Managed component failed to start") {
            if let Err(stop_err) = self.stop_managed().await {
                warn!(error = %stop_err, "Rolling back a failed start did not stop cleanly");
            }
            self.inner.receiver.remove_handler(&self.inner.fan_out).await;
            return Err(err);
        }

        self.inner.started.store(true, Ordering::SeqCst);
        debug!(managed = self.inner.managed.len(), "Broker started");
        Ok(())
    }

    /// Stops every managed component, then detaches the fan-out handler.
    #[instrument(skip(self))]
    async fn stop(&self) -> Result<(), TransportError> {
        let _lifecycle = self.inner.lifecycle.lock().await;
        if !self.is_started() {
            trace!("Broker already stopped");
            return Ok(());
        }

        let stopped = self.stop_managed().await;
        self.inner.receiver.remove_handler(&self.inner.fan_out).await;
        self.inner.started.store(false, Ordering::SeqCst);
        debug!("Broker stopped");
        stopped
    }
}

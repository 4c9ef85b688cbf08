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

use std::any::Any;
use std::fmt;
use std::future::Future;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::future::{join_all, BoxFuture, FutureExt};
use serde::de::DeserializeOwned;
use static_assertions::assert_impl_all;
use tracing::{trace, warn};

use super::{Message, MessageKind};

/// The boxed future returned by a handler action.
pub type HandlerFuture = BoxFuture<'static, anyhow::Result<()>>;

type Action = dyn Fn(Message) -> HandlerFuture + Send + Sync;
type Predicate = dyn Fn(&Message) -> bool + Send + Sync;

static NEXT_HANDLER_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a [`Handler`]; shared by all clones of the same handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandlerId(u64);

impl fmt::Display for HandlerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "handler-{}", self.0)
    }
}

enum Accepts {
    Any,
    Kind { name: String, version: String },
    Custom(Box<Predicate>),
}

struct HandlerInner {
    id: HandlerId,
    accepts: Accepts,
    action: Box<Action>,
}

/// A predicate over [`Message`] paired with an asynchronous action.
///
/// Cloning is cheap and a clone *is* the same handler: equality and hashing go by
/// identity, never by the behaviour wrapped. That is what lets a registry remove
/// exactly the instance that was added.
///
/// ```rust,ignore
/// let audit = Handler::any(|message| async move {
///     tracing::info!(kind = %message.kind(), "seen");
///     Ok(())
/// });
/// let created = Handler::on("orders/created", "2022-01-02", |message| async move {
///     store(message).await
/// });
/// ```
#[derive(Clone)]
pub struct Handler {
    inner: Arc<HandlerInner>,
}

assert_impl_all!(Handler: Send, Sync);

impl Handler {
    fn build<F, Fut>(accepts: Accepts, action: F) -> Self
    where
        F: Fn(Message) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let id = HandlerId(NEXT_HANDLER_ID.fetch_add(1, Ordering::Relaxed));
        Self {
            inner: Arc::new(HandlerInner {
                id,
                accepts,
                action: Box::new(move |message| action(message).boxed()),
            }),
        }
    }

    /// A catch-all handler: its predicate accepts every message.
    pub fn any<F, Fut>(action: F) -> Self
    where
        F: Fn(Message) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        Self::build(Accepts::Any, action)
    }

    /// A handler accepting exactly the messages named `name` at `version`.
    pub fn on<F, Fut>(name: impl Into<String>, version: impl Into<String>, action: F) -> Self
    where
        F: Fn(Message) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let accepts = Accepts::Kind {
            name: name.into(),
            version: version.into(),
        };
        Self::build(accepts, action)
    }

    /// A handler for the typed kind `T`; the payload is decoded before `action` runs.
    ///
    /// A payload that does not decode fails the invocation.
    pub fn on_kind<T, F, Fut>(action: F) -> Self
    where
        T: MessageKind + DeserializeOwned + Send + 'static,
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let action = Arc::new(action);
        Self::on(T::NAME, T::VERSION, move |message: Message| {
            let action = Arc::clone(&action);
            async move {
                let payload = message.decode::<T>()?;
                action(payload).await
            }
        })
    }

    /// A handler with an arbitrary predicate.
    pub fn when<P, F, Fut>(predicate: P, action: F) -> Self
    where
        P: Fn(&Message) -> bool + Send + Sync + 'static,
        F: Fn(Message) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        Self::build(Accepts::Custom(Box::new(predicate)), action)
    }

    /// This handler's identity.
    pub fn id(&self) -> HandlerId {
        self.inner.id
    }

    /// Whether this handler accepts `message`.
    pub fn can_handle(&self, message: &Message) -> bool {
        match &self.inner.accepts {
            Accepts::Any => true,
            Accepts::Kind { name, version } => message.is_kind(name, version),
            Accepts::Custom(predicate) => predicate(message),
        }
    }

    /// Runs the action. The predicate is not consulted.
    pub fn handle(&self, message: Message) -> HandlerFuture {
        (self.inner.action)(message)
    }
}

impl PartialEq for Handler {
    fn eq(&self, other: &Self) -> bool {
        self.inner.id == other.inner.id
    }
}

impl Eq for Handler {}

impl Hash for Handler {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.inner.id.hash(state);
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let accepts = match &self.inner.accepts {
            Accepts::Any => "any".to_string(),
            Accepts::Kind { name, version } => format!("{name}/{version}"),
            Accepts::Custom(_) => "custom".to_string(),
        };
        f.debug_struct("Handler")
            .field("id", &self.inner.id)
            .field("accepts", &accepts)
            .finish()
    }
}

/// Turns the payload of a caught panic into an error.
pub fn panic_error(payload: Box<dyn Any + Send>) -> anyhow::Error {
    let detail = payload
        .downcast_ref::<&str>()
        .map(|message| (*message).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_string());
    anyhow::anyhow!("handler panicked: {detail}")
}

fn flatten_panic(outcome: std::thread::Result<anyhow::Result<()>>) -> anyhow::Result<()> {
    outcome.unwrap_or_else(|payload| Err(panic_error(payload)))
}

/// Runs every handler in `handlers` on `message` concurrently and waits for all of them.
///
/// Predicates are not consulted; callers pass the handlers that already matched.
/// Every handler runs to completion even when another fails. A panicking handler
/// counts as a failed one. Each failure is logged on its own, and the first one
/// (in `handlers` order) is returned.
pub async fn dispatch_all<I>(handlers: I, message: &Message) -> anyhow::Result<()>
where
    I: IntoIterator<Item = Handler>,
{
    let handlers: Vec<Handler> = handlers.into_iter().collect();
    if handlers.is_empty() {
        trace!(kind = %message.kind(), "No handlers matched message");
        return Ok(());
    }

    let total = handlers.len();
    let results = join_all(handlers.iter().map(|handler| {
        AssertUnwindSafe(handler.handle(message.clone()))
            .catch_unwind()
            .map(flatten_panic)
    }))
    .await;

    let mut failures = handlers
        .iter()
        .zip(results)
        .filter_map(|(handler, result)| result.err().map(|err| (handler.id(), err)))
        .inspect(|(id, err)| {
            warn!(handler = %id, kind = %message.kind(), error = %err, "Handler failed");
        })
        .collect::<Vec<_>>();

    if failures.is_empty() {
        trace!(count = total, kind = %message.kind(), "All handlers completed");
        return Ok(());
    }

    let failed = failures.len();
    let (_, first) = failures.swap_remove(0);
    if failed == 1 {
        Err(first)
    } else {
        Err(first.context(format!("{failed} of {total} handlers failed")))
    }
}

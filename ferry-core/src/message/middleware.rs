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
use std::future::Future;
use std::sync::Arc;

use super::{Handler, Message};

/// A function wrapping one [`Handler`] into another.
///
/// Middleware adds cross-cutting behaviour (logging, retries, tracing) around a
/// handler without touching the handler. Most middleware is easiest to write with
/// [`Middleware::around`], which receives each message together with the handler
/// it wraps.
#[derive(Clone)]
pub struct Middleware(Arc<dyn Fn(Handler) -> Handler + Send + Sync>);

impl Middleware {
    /// Middleware from a raw `Handler -> Handler` function.
    pub fn new<F>(wrap: F) -> Self
    where
        F: Fn(Handler) -> Handler + Send + Sync + 'static,
    {
        Self(Arc::new(wrap))
    }

    /// Middleware from an async function of the message and the next handler.
    ///
    /// ```rust,ignore
    /// let timing = Middleware::around(|message, next| async move {
    ///     let started = std::time::Instant::now();
    ///     let result = next.handle(message).await;
    ///     tracing::debug!(elapsed = ?started.elapsed());
    ///     result
    /// });
    /// ```
    pub fn around<F, Fut>(f: F) -> Self
    where
        F: Fn(Message, Handler) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let f = Arc::new(f);
        Self::new(move |next: Handler| {
            let f = Arc::clone(&f);
            Handler::any(move |message| f(message, next.clone()))
        })
    }

    /// Wraps `next`.
    pub fn apply(&self, next: Handler) -> Handler {
        (self.0)(next)
    }
}

impl fmt::Debug for Middleware {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Middleware")
    }
}

/// Composes `middleware` around `terminal`.
///
/// The last middleware wraps `terminal` first and the first middleware ends up
/// outermost, so on the way in the middleware run in list order. The composed
/// handler accepts every message: callers check the terminal handler's predicate
/// before building the chain.
pub fn middleware_chain(terminal: Handler, middleware: &[Middleware]) -> Handler {
    let composed = middleware
        .iter()
        .rev()
        .fold(terminal, |next, current| current.apply(next));
    Handler::any(move |message| composed.handle(message))
}

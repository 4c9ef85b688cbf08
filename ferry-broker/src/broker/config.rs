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

use ferry_core::{Managed, Middleware, Publisher, Receiver};

/// Assembly-time wiring of a [`Broker`](super::Broker).
///
/// Built by folding [`Configure`] functions over [`BrokerConfig::default`];
/// later functions see, and may override, what earlier ones set.
#[derive(Clone, Default)]
pub struct BrokerConfig {
    /// Where published messages go.
    pub publisher: Option<Arc<dyn Publisher>>,
    /// Where inbound messages come from.
    pub receiver: Option<Arc<dyn Receiver>>,
    /// Components started and stopped with the broker.
    pub managed: Vec<Arc<dyn Managed>>,
    /// Middleware wrapped around every handler, outermost first.
    pub middleware: Vec<Middleware>,
}

impl fmt::Debug for BrokerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BrokerConfig")
            .field("publisher", &self.publisher.is_some())
            .field("receiver", &self.receiver.is_some())
            .field("managed", &self.managed.len())
            .field("middleware", &self.middleware.len())
            .finish()
    }
}

/// One step of broker assembly.
pub type Configure = Box<dyn FnOnce(BrokerConfig) -> BrokerConfig + Send>;

/// Boxes a closure as a [`Configure`] step.
pub fn configure<F>(step: F) -> Configure
where
    F: FnOnce(BrokerConfig) -> BrokerConfig + Send + 'static,
{
    Box::new(step)
}

/// Publishes through `publisher`.
pub fn with_publisher<P: Publisher + 'static>(publisher: P) -> Configure {
    configure(move |config| BrokerConfig {
        publisher: Some(Arc::new(publisher)),
        ..config
    })
}

/// Receives through `receiver`.
pub fn with_receiver<R: Receiver + 'static>(receiver: R) -> Configure {
    configure(move |config| BrokerConfig {
        receiver: Some(Arc::new(receiver)),
        ..config
    })
}

/// Starts and stops `component` with the broker.
pub fn with_managed<M: Managed + 'static>(component: M) -> Configure {
    configure(move |mut config| {
        config.managed.push(Arc::new(component));
        config
    })
}

/// Appends `middleware`, making it the innermost so far.
pub fn with_middleware(middleware: Middleware) -> Configure {
    configure(move |mut config| {
        config.middleware.push(middleware);
        config
    })
}

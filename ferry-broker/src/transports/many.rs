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
use ferry_core::{Handler, Message, Publisher, Receiver, TransportError};
use futures::future::{join_all, try_join_all};

use crate::broker::{BrokerConfig, Configure};

/// Publishes every batch to each of several publishers, concurrently.
///
/// Fails with the first error once every publisher has been attempted.
#[derive(Clone, Default)]
pub struct ManyPublishers {
    publishers: Vec<Arc<dyn Publisher>>,
}

impl ManyPublishers {
    /// Fans out to `publishers`.
    pub fn new(publishers: Vec<Arc<dyn Publisher>>) -> Self {
        Self { publishers }
    }

    /// Number of inner publishers.
    pub fn len(&self) -> usize {
        self.publishers.len()
    }

    /// Whether there are no inner publishers.
    pub fn is_empty(&self) -> bool {
        self.publishers.is_empty()
    }
}

impl fmt::Debug for ManyPublishers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManyPublishers")
            .field("publishers", &self.publishers.len())
            .finish()
    }
}

#[async_trait]
impl Publisher for ManyPublishers {
    async fn publish(&self, messages: Vec<Message>) -> Result<(), TransportError> {
        let results = join_all(
            self.publishers
                .iter()
                .map(|publisher| publisher.publish(messages.clone())),
        )
        .await;
        results.into_iter().collect()
    }
}

/// Registers and removes handlers on each of several receivers, concurrently.
#[derive(Clone, Default)]
pub struct ManyReceivers {
    receivers: Vec<Arc<dyn Receiver>>,
}

impl ManyReceivers {
    /// Fans out to `receivers`.
    pub fn new(receivers: Vec<Arc<dyn Receiver>>) -> Self {
        Self { receivers }
    }
}

impl fmt::Debug for ManyReceivers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManyReceivers")
            .field("receivers", &self.receivers.len())
            .finish()
    }
}

#[async_trait]
impl Receiver for ManyReceivers {
    async fn handle(&self, handler: Handler) {
        join_all(
            self.receivers
                .iter()
                .map(|receiver| receiver.handle(handler.clone())),
        )
        .await;
    }

    async fn remove_handler(&self, handler: &Handler) {
        join_all(
            self.receivers
                .iter()
                .map(|receiver| receiver.remove_handler(handler)),
        )
        .await;
    }
}

/// Publishes through all of `publishers`.
pub fn with_many_publishers(publishers: Vec<Arc<dyn Publisher>>) -> Configure {
    Box::new(move |config: BrokerConfig| BrokerConfig {
        publisher: Some(Arc::new(ManyPublishers::new(publishers))),
        ..config
    })
}

/// Receives through all of `receivers`.
pub fn with_many_receivers(receivers: Vec<Arc<dyn Receiver>>) -> Configure {
    Box::new(move |config: BrokerConfig| BrokerConfig {
        receiver: Some(Arc::new(ManyReceivers::new(receivers))),
        ..config
    })
}

#[cfg(test)]
mod tests {
    use ferry_core::HandlerRegistry;

    use super::*;

    struct Failing;

    #[async_trait]
    impl Publisher for Failing {
        async fn publish(&self, _messages: Vec<Message>) -> Result<(), TransportError> {
            Err(TransportError::UnknownDestination("nowhere".into()))
        }
    }

    #[tokio::test]
    async fn receivers_all_see_the_handler() {
        let first = HandlerRegistry::new();
        let second = HandlerRegistry::new();
        let receivers: Vec<Arc<dyn Receiver>> =
            vec![Arc::new(first.clone()), Arc::new(second.clone())];
        let many = ManyReceivers::new(receivers);
        let handler = Handler::any(|_| async { Ok(()) });

        many.handle(handler.clone()).await;
        assert!(first.contains(&handler) && second.contains(&handler));

        many.remove_handler(&handler).await;
        assert!(first.is_empty() && second.is_empty());
    }

    #[tokio::test]
    async fn one_failing_publisher_fails_the_publish() {
        let publishers: Vec<Arc<dyn Publisher>> = vec![Arc::new(Failing)];
        let many = ManyPublishers::new(publishers);
        let err = many.publish(vec![Message::new("a", "1")]).await.unwrap_err();
        assert!(matches!(err, TransportError::UnknownDestination(_)));
    }

    #[tokio::test]
    async fn no_publishers_is_a_no_op() {
        assert!(ManyPublishers::default()
            .publish(vec![Message::new("a", "1")])
            .await
            .is_ok());
    }
}

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

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::info;

use ferry_broker::prelude::*;

use crate::setup::*;

mod setup;

#[derive(Clone, Default)]
struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    fn record(&self, entry: impl Into<String>) {
        self.0.lock().push(entry.into());
    }

    fn entries(&self) -> Vec<String> {
        self.0.lock().clone()
    }

    fn len(&self) -> usize {
        self.0.lock().len()
    }

    fn handler(&self, tag: &'static str) -> Handler {
        let journal = self.clone();
        Handler::any(move |message| {
            let journal = journal.clone();
            async move {
                journal.record(format!("{tag}:{}", message.kind()));
                Ok(())
            }
        })
    }

    fn middleware(&self, tag: &'static str) -> Middleware {
        let journal = self.clone();
        Middleware::around(move |message, next| {
            let journal = journal.clone();
            async move {
                journal.record(format!("{tag}:in"));
                let result = next.handle(message).await;
                journal.record(format!("{tag}:out"));
                result
            }
        })
    }
}

#[tokio::test]
async fn in_memory_broker_dispatches_to_matching_handlers() -> anyhow::Result<()> {
    initialize_tracing();
    let broker = Broker::new(Vec::new())?;
    let journal = Journal::default();

    let typed = journal.clone();
    broker
        .handle(Handler::on_kind::<OrderCreated, _, _>(move |order| {
            let typed = typed.clone();
            async move {
                info!(order_id = order.order_id, "order created");
                typed.record(format!("created:{}", order.order_id));
                Ok(())
            }
        }))
        .await;
    let cancelled = journal.clone();
    broker
        .handle(Handler::on_kind::<OrderCancelled, _, _>(move |order| {
            let cancelled = cancelled.clone();
            async move {
                cancelled.record(format!("cancelled:{}", order.order_id));
                Ok(())
            }
        }))
        .await;
    broker.handle(journal.handler("audit")).await;

    broker.start().await?;
    broker
        .publish_one(Message::encode(&OrderCreated { order_id: 7 })?)
        .await?;

    assert!(eventually(|| journal.len() == 2).await);
    broker.stop().await?;

    let mut entries = journal.entries();
    entries.sort();
    assert_eq!(
        entries,
        vec!["audit:orders/created/2022-01-02", "created:7"]
    );
    Ok(())
}

#[tokio::test]
async fn messages_without_handlers_are_a_no_op() -> anyhow::Result<()> {
    initialize_tracing();
    let broker = Broker::new(Vec::new())?;
    broker.start().await?;
    broker.publish_one(Message::encode(&Ping)?).await?;
    broker.publish(Vec::new()).await?;
    tokio::time::sleep(Duration::from_millis(20)).await;
    broker.stop().await?;
    Ok(())
}

#[tokio::test]
async fn middleware_runs_outermost_first() -> anyhow::Result<()> {
    initialize_tracing();
    let journal = Journal::default();
    let broker = Broker::new([
        with_middleware(journal.middleware("A")),
        with_middleware(journal.middleware("B")),
    ])?;
    broker.handle(journal.handler("handler")).await;

    broker.start().await?;
    broker.publish_one(Message::new("test/test", "2022-01-02")).await?;
    assert!(eventually(|| journal.len() == 5).await);
    broker.stop().await?;

    assert_eq!(
        journal.entries(),
        vec![
            "A:in",
            "B:in",
            "handler:test/test/2022-01-02",
            "B:out",
            "A:out"
        ]
    );
    Ok(())
}

#[tokio::test]
async fn removed_handlers_no_longer_receive() -> anyhow::Result<()> {
    initialize_tracing();
    let broker = Broker::new(Vec::new())?;
    let journal = Journal::default();
    let handler = journal.handler("h");
    broker.handle(handler.clone()).await;
    broker.handle(handler.clone()).await;
    assert_eq!(broker.handler_count(), 1);

    broker.start().await?;
    broker.publish_one(Message::new("a", "1")).await?;
    assert!(eventually(|| journal.len() == 1).await);

    broker.remove_handler(&handler).await;
    broker.remove_handler(&handler).await;
    assert_eq!(broker.handler_count(), 0);
    broker.publish_one(Message::new("a", "1")).await?;
    tokio::time::sleep(Duration::from_millis(30)).await;
    broker.stop().await?;

    assert_eq!(journal.len(), 1);
    Ok(())
}

#[tokio::test]
async fn queue_broker_acknowledges_by_handler_outcome() -> anyhow::Result<()> {
    initialize_tracing();
    let client = FakeQueueClient::with_queue("orders");
    let queue = QueueTransport::builder(client.clone(), "orders")
        .poll_interval(Duration::from_millis(5))
        .build();
    let broker = Broker::new([
        with_queue_transport(queue.clone()),
        with_middleware(tracing_middleware()),
    ])?;

    broker
        .handle(Handler::on_kind::<OrderCreated, _, _>(|order| async move {
            if order.order_id % 2 == 0 {
                Ok(())
            } else {
                Err(anyhow::anyhow!("odd orders are rejected"))
            }
        }))
        .await;

    let wire = |handle: &str, order_id: u64| -> anyhow::Result<QueueMessage> {
        let body = Message::encode(&OrderCreated { order_id })?.to_json()?;
        Ok(QueueMessage::new(handle, body))
    };
    client.enqueue(vec![wire("r-2", 2)?, wire("r-3", 3)?, wire("r-4", 4)?]);

    broker.start().await?;
    assert_eq!(queue.handler_count(), 1);
    assert!(eventually(|| client.deleted_handles().len() == 2 && client.released().len() == 1).await);
    broker.stop().await?;

    let mut deleted = client.deleted_handles();
    deleted.sort();
    assert_eq!(deleted, vec!["r-2", "r-4"]);
    assert_eq!(client.released_handles(), vec!["r-3"]);
    Ok(())
}

#[tokio::test]
async fn broker_lifecycle_is_idempotent() -> anyhow::Result<()> {
    initialize_tracing();
    let client = FakeQueueClient::with_queue("orders");
    let queue = QueueTransport::builder(client.clone(), "orders")
        .poll_interval(Duration::from_millis(5))
        .build();
    let broker = Broker::new([with_queue_transport(queue.clone())])?;

    broker.start().await?;
    broker.start().await?;
    assert!(broker.is_started());
    assert!(queue.is_started());
    assert_eq!(queue.handler_count(), 1);

    broker.stop().await?;
    broker.stop().await?;
    assert!(!broker.is_started());
    assert!(!queue.is_started());
    assert_eq!(queue.handler_count(), 0);
    Ok(())
}

#[tokio::test]
async fn failed_start_leaves_the_broker_stopped() {
    initialize_tracing();
    let queue = QueueTransport::new(FakeQueueClient::empty(), "missing");
    let memory = MemoryTransport::new();
    let broker = Broker::new([
        with_queue_receiver(queue.clone()),
        with_publisher(memory.clone()),
        with_managed(memory),
    ])
    .expect("publisher and receiver are configured");

    let err = broker.start().await.unwrap_err();
    assert!(matches!(err, TransportError::UnknownDestination(_)));
    assert!(!broker.is_started());
    assert_eq!(queue.handler_count(), 0);
}

#[tokio::test]
async fn publishing_goes_to_the_configured_publisher() -> anyhow::Result<()> {
    let recorder = RecordingPublisher::default();
    let broker = Broker::new([
        with_publisher(recorder.clone()),
        with_receiver(HandlerRegistry::new()),
    ])?;

    broker
        .publish(vec![Message::new("a", "1"), Message::new("b", "1")])
        .await?;
    let kinds: Vec<String> = recorder.published().iter().map(Message::kind).collect();
    assert_eq!(kinds, vec!["a/1", "b/1"]);
    Ok(())
}

#[test]
fn exactly_one_side_configured_is_rejected() {
    let err = Broker::new([with_publisher(RecordingPublisher::default())]).unwrap_err();
    assert!(matches!(err, BrokerError::NoReceiverConfigured));
    assert_eq!(err.to_string(), "no receiver configured");
}

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

use async_trait::async_trait;

use crate::common::TransportError;
use crate::message::Message;

/// Sends messages to a destination.
///
/// Implementations decide the batching policy; a caller may pass any number of
/// messages and an empty batch is a successful no-op.
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Publishes `messages`.
    ///
    /// # Errors
    ///
    /// [`TransportError::UnknownDestination`] when the destination does not exist,
    /// distinguishable from [`TransportError::Backend`] so callers can decide whether
    /// a retry makes sense.
    async fn publish(&self, messages: Vec<Message>) -> Result<(), TransportError>;

    /// Publishes a single message.
    async fn publish_one(&self, message: Message) -> Result<(), TransportError> {
        self.publish(vec![message]).await
    }
}

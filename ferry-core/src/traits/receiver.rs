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

use super::Publisher;
use crate::message::Handler;

/// Accepts handlers that inbound messages are dispatched to.
///
/// Both operations are idempotent: adding a registered handler again leaves it
/// registered once, and removing an unregistered handler does nothing.
#[async_trait]
pub trait Receiver: Send + Sync {
    /// Registers `handler`.
    async fn handle(&self, handler: Handler);

    /// Unregisters `handler`.
    async fn remove_handler(&self, handler: &Handler);
}

/// A component that both publishes and receives.
pub trait Transport: Publisher + Receiver {}

impl<T: Publisher + Receiver + ?Sized> Transport for T {}

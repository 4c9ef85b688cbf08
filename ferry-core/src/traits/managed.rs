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

/// Lifecycle of a component owning background work, such as a poll loop.
///
/// Both operations must be safe to call in the target state: starting a started
/// component or stopping a stopped one changes nothing.
#[async_trait]
pub trait Managed: Send + Sync {
    /// Starts the background work.
    async fn start(&self) -> Result<(), TransportError>;

    /// Stops the background work. Work already in flight may finish.
    async fn stop(&self) -> Result<(), TransportError>;
}

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

// --- Public Re-exports ---
pub use handler::{dispatch_all, panic_error, Handler, HandlerFuture, HandlerId};
pub use message::{Message, MessageKind};
pub use message_error::MessageError;
pub use middleware::{middleware_chain, Middleware};
pub use registry::HandlerRegistry;

// --- Submodules ---

/// Defines [`Handler`], a predicate paired with an asynchronous action.
mod handler;
/// Defines the [`Message`] envelope and the [`MessageKind`] trait.
#[allow(clippy::module_inception)]
mod message;
mod message_error;
/// Defines [`Middleware`] and the chain that composes it.
mod middleware;
/// Defines the identity-keyed [`HandlerRegistry`].
mod registry;

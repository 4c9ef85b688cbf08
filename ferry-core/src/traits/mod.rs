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

//! Capability traits shared by transports and the broker.
//!
//! * [`Publisher`]: sends messages.
//! * [`Receiver`]: accepts handlers that inbound messages are dispatched to.
//! * [`Managed`]: owns background work with a start/stop lifecycle.
//! * [`Transport`]: anything that both publishes and receives.

// --- Public Re-exports ---
pub use managed::Managed;
pub use publisher::Publisher;
pub use receiver::{Receiver, Transport};

// --- Submodules ---

/// Defines the [`Managed`] lifecycle trait.
mod managed;
/// Defines the [`Publisher`] trait.
mod publisher;
/// Defines the [`Receiver`] and [`Transport`] traits.
mod receiver;

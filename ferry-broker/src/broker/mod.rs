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

//! The broker façade and its assembly.
//!
//! A [`Broker`] is built by folding [`Configure`] steps over an empty
//! [`BrokerConfig`]. Transport modules provide their own steps, such as
//! `with_queue_transport`.

// --- Public Re-exports ---
pub use broker::Broker;
pub use broker_error::BrokerError;
pub use config::{
    configure, with_managed, with_middleware, with_publisher, with_receiver, BrokerConfig,
    Configure,
};

// --- Submodules ---

/// The broker itself.
#[allow(clippy::module_inception)]
mod broker;
/// Construction errors.
mod broker_error;
/// Configuration record and generic steps.
mod config;

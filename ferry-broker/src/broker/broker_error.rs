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

use std::error::Error;
use std::fmt;

use ferry_core::TransportError;

/// Errors raised while assembling or running a [`Broker`](super::Broker).
#[derive(Debug)]
pub enum BrokerError {
    /// A receiver was configured but no publisher.
    NoPublisherConfigured,
    /// A publisher was configured but no receiver.
    NoReceiverConfigured,
    /// A transport operation failed.
    Transport(TransportError),
}

impl fmt::Display for BrokerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoPublisherConfigured => write!(f, "no publisher configured"),
            Self::NoReceiverConfigured => write!(f, "no receiver configured"),
            Self::Transport(err) => write!(f, "transport error: {err}"),
        }
    }
}

impl Error for BrokerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Transport(err) => Some(err),
            _ => None,
        }
    }
}

impl From<TransportError> for BrokerError {
    fn from(err: TransportError) -> Self {
        Self::Transport(err)
    }
}

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
use std::sync::Arc;

use ferry_core::{Message, MessageError};

use super::QueueMessage;

/// Turns a received queue message into a domain [`Message`].
///
/// A translation failure marks that single message failed, releasing it for
/// redelivery.
pub type Translator = Arc<dyn Fn(&QueueMessage) -> Result<Message, TranslateError> + Send + Sync>;

/// Errors produced while translating a received message.
#[derive(Debug)]
pub enum TranslateError {
    /// The body is not a canonical message encoding.
    InvalidBody(MessageError),
    /// A custom translator rejected the message.
    Rejected(String),
}

impl fmt::Display for TranslateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidBody(err) => write!(f, "message body could not be translated: {err}"),
            Self::Rejected(reason) => write!(f, "message rejected by translator: {reason}"),
        }
    }
}

impl Error for TranslateError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidBody(err) => Some(err),
            Self::Rejected(_) => None,
        }
    }
}

impl From<MessageError> for TranslateError {
    fn from(err: MessageError) -> Self {
        Self::InvalidBody(err)
    }
}

/// Parses the body as the canonical JSON encoding. A missing body reads as `{}`.
pub fn default_translation(message: &QueueMessage) -> Result<Message, TranslateError> {
    Ok(Message::from_json(message.body.as_deref().unwrap_or("{}"))?)
}

/// [`default_translation`] as a [`Translator`].
pub fn default_translator() -> Translator {
    Arc::new(default_translation)
}

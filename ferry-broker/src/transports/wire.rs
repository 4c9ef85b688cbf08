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

use std::collections::HashMap;

use ferry_core::{chunk_json, BatchLimits, Message, TransportError};
use serde::{Deserialize, Serialize};

/// A typed attribute attached to an outbound entry or a received message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AttributeValue {
    /// Attribute type, `"String"` for everything Ferry writes.
    pub data_type: String,
    /// Value of a string attribute.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub string_value: Option<String>,
}

impl AttributeValue {
    /// A `String` attribute.
    pub fn string(value: impl Into<String>) -> Self {
        Self {
            data_type: "String".to_string(),
            string_value: Some(value.into()),
        }
    }
}

/// Named attributes of an entry or message.
pub type MessageAttributes = HashMap<String, AttributeValue>;

/// The `name` and `version` attributes carried by every batch entry.
pub(crate) fn kind_attributes(message: &Message) -> MessageAttributes {
    HashMap::from([
        ("name".to_string(), AttributeValue::string(message.name())),
        ("version".to_string(), AttributeValue::string(message.version())),
    ])
}

/// Chunks `entries` by their JSON size and strips the size bookkeeping.
pub(crate) fn chunk_entries<T: Serialize>(
    entries: Vec<T>,
    limits: BatchLimits,
) -> Result<Vec<Vec<T>>, TransportError> {
    Ok(chunk_json(entries, limits, 0)?
        .into_iter()
        .map(|chunk| chunk.into_iter().map(|item| item.data).collect())
        .collect())
}

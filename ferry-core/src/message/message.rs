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

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use static_assertions::assert_impl_all;

use super::MessageError;

/// A named, versioned payload type.
///
/// Implemented for application payload structs, usually through the
/// `#[ferry_message(name = "...", version = "...")]` attribute. The pair
/// `(NAME, VERSION)` is what handlers match on.
pub trait MessageKind {
    /// Message name, e.g. `"orders/created"`.
    const NAME: &'static str;
    /// Message version, e.g. `"2022-01-02"`.
    const VERSION: &'static str;
}

/// A domain event or command travelling through the broker.
///
/// A message is identified by its `(name, version)` pair; two messages with the
/// same pair are the same kind for dispatch purposes regardless of payload. The
/// payload is an arbitrary JSON object.
///
/// The canonical wire encoding is a single JSON object holding `$name`,
/// `$version` and the payload fields side by side:
///
/// ```json
/// {"$name":"orders/created","$version":"2022-01-02","order_id":7}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    #[serde(rename = "$name")]
    name: String,
    #[serde(rename = "$version")]
    version: String,
    #[serde(flatten)]
    payload: Map<String, Value>,
}

assert_impl_all!(Message: Send, Sync);

impl Message {
    /// Creates a message with an empty payload.
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self::with_payload(name, version, Map::new())
    }

    /// Creates a message carrying `payload`.
    pub fn with_payload(
        name: impl Into<String>,
        version: impl Into<String>,
        payload: Map<String, Value>,
    ) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            payload,
        }
    }

    /// Builds a message from a typed payload.
    ///
    /// Unit-like payloads serialize to `null` and produce an empty payload; any
    /// other non-object serialization is rejected.
    pub fn encode<T: MessageKind + Serialize>(payload: &T) -> Result<Self, MessageError> {
        let payload = match serde_json::to_value(payload)? {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            _ => return Err(MessageError::NotAnObject(T::NAME)),
        };
        Ok(Self::with_payload(T::NAME, T::VERSION, payload))
    }

    /// Reads the payload back as `T`.
    ///
    /// Fails with [`MessageError::KindMismatch`] if this message is not a `T`.
    pub fn decode<T: MessageKind + DeserializeOwned>(&self) -> Result<T, MessageError> {
        if !self.is::<T>() {
            return Err(MessageError::KindMismatch {
                expected: format!("{}/{}", T::NAME, T::VERSION),
                found: self.kind(),
            });
        }
        let object = Value::Object(self.payload.clone());
        match serde_json::from_value(object) {
            Ok(decoded) => Ok(decoded),
            // Unit-like payload types only deserialize from `null`.
            Err(_) if self.payload.is_empty() => Ok(serde_json::from_value(Value::Null)?),
            Err(err) => Err(err.into()),
        }
    }

    /// Parses the canonical JSON encoding.
    pub fn from_json(body: &str) -> Result<Self, MessageError> {
        Ok(serde_json::from_str(body)?)
    }

    /// Produces the canonical JSON encoding.
    pub fn to_json(&self) -> Result<String, MessageError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Whether this message is of kind `T`.
    pub fn is<T: MessageKind>(&self) -> bool {
        self.is_kind(T::NAME, T::VERSION)
    }

    /// Whether this message has exactly this name and version.
    pub fn is_kind(&self, name: &str, version: &str) -> bool {
        self.name == name && self.version == version
    }

    /// The message name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The message version.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// `name/version`, the form used in logs and event bus detail types.
    pub fn kind(&self) -> String {
        format!("{}/{}", self.name, self.version)
    }

    /// The payload fields.
    pub fn payload(&self) -> &Map<String, Value> {
        &self.payload
    }

    /// Looks up a single payload field.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.payload.get(field)
    }
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};
    use serde_json::json;

    use super::*;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct OrderCreated {
        order_id: u64,
    }

    impl MessageKind for OrderCreated {
        const NAME: &'static str = "orders/created";
        const VERSION: &'static str = "2022-01-02";
    }

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Ping;

    impl MessageKind for Ping {
        const NAME: &'static str = "test/ping";
        const VERSION: &'static str = "1";
    }

    #[test]
    fn canonical_encoding_flattens_payload() {
        let message = Message::encode(&OrderCreated { order_id: 7 }).unwrap();
        let value: Value = serde_json::from_str(&message.to_json().unwrap()).unwrap();
        assert_eq!(
            value,
            json!({"$name": "orders/created", "$version": "2022-01-02", "order_id": 7})
        );
    }

    #[test]
    fn typed_payload_survives_the_wire() {
        let body = r#"{"$name":"orders/created","$version":"2022-01-02","order_id":42}"#;
        let message = Message::from_json(body).unwrap();
        assert!(message.is::<OrderCreated>());
        assert_eq!(
            message.decode::<OrderCreated>().unwrap(),
            OrderCreated { order_id: 42 }
        );
    }

    #[test]
    fn unit_payloads_encode_as_empty_objects() {
        let message = Message::encode(&Ping).unwrap();
        assert!(message.payload().is_empty());
        assert_eq!(message.decode::<Ping>().unwrap(), Ping);
    }

    #[test]
    fn decode_rejects_other_kinds() {
        let message = Message::new("orders/created", "2023-01-01");
        let err = message.decode::<OrderCreated>().unwrap_err();
        assert!(matches!(err, MessageError::KindMismatch { .. }));
    }

    #[test]
    fn body_without_identity_is_rejected() {
        assert!(Message::from_json(r#"{"order_id":1}"#).is_err());
        assert!(Message::from_json("{}").is_err());
        assert!(Message::from_json("not json").is_err());
    }
}

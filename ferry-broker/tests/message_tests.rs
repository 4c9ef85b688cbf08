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

use ferry_broker::prelude::*;

use crate::setup::*;

mod setup;

#[test]
fn the_attribute_sets_name_and_version() {
    assert_eq!(OrderCreated::NAME, "orders/created");
    assert_eq!(OrderCreated::VERSION, "2022-01-02");
    assert_eq!(Ping::NAME, "test/ping");
}

#[test]
fn derived_types_encode_and_decode() -> anyhow::Result<()> {
    let original = OrderCreated { order_id: 11 };
    let message = Message::encode(&original)?;
    assert_eq!(message.kind(), "orders/created/2022-01-02");
    assert_eq!(message.decode::<OrderCreated>()?, original.clone());
    assert!(!message.is::<OrderCancelled>());
    Ok(())
}

#[test]
fn unit_kinds_round_trip_through_the_wire() -> anyhow::Result<()> {
    let body = Message::encode(&Ping)?.to_json()?;
    let message = Message::from_json(&body)?;
    assert!(message.is::<Ping>());
    message.decode::<Ping>()?;
    Ok(())
}

#[test]
fn typed_handlers_match_macro_kinds() {
    let handler = Handler::on_kind::<OrderCancelled, _, _>(|_| async { Ok(()) });
    assert!(handler.can_handle(&Message::new("orders/cancelled", "2022-01-02")));
    assert!(!handler.can_handle(&Message::new("orders/created", "2022-01-02")));
}

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
#![allow(unused)]

use ferry_broker::prelude::*;

#[ferry_message(name = "orders/created", version = "2022-01-02")]
#[derive(PartialEq)]
pub struct OrderCreated {
    pub order_id: u64,
}

#[ferry_message(name = "orders/cancelled", version = "2022-01-02")]
pub struct OrderCancelled {
    pub order_id: u64,
    pub reason: String,
}

#[ferry_message(name = "test/ping", version = "1")]
pub struct Ping;

/// Canonical body of an arbitrary `name`/`version` message.
pub fn body(name: &str, version: &str) -> String {
    Message::new(name, version)
        .to_json()
        .expect("message should serialize")
}

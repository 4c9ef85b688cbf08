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

use std::time::Instant;

use ferry_core::Middleware;
use tracing::{debug, debug_span, warn, Instrument};

/// Runs every handler invocation inside a `handle_message` span and logs its
/// outcome and duration.
pub fn tracing_middleware() -> Middleware {
    Middleware::around(|message, next| async move {
        let kind = message.kind();
        let span = debug_span!("handle_message", kind = %kind);
        let started = Instant::now();
        let result = next.handle(message).instrument(span).await;
        let elapsed = started.elapsed();
        match &result {
            Ok(()) => debug!(kind = %kind, ?elapsed, "Handler completed"),
            Err(err) => warn!(kind = %kind, ?elapsed, error = %err, "Handler failed"),
        }
        result
    })
}

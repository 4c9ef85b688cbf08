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

use std::time::Duration;

use ferry_core::Middleware;
use rand::Rng;
use tracing::{debug, warn};

use crate::common::CONFIG;

/// How [`retry_middleware`] re-invokes a failing handler.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, the first one included. Values below one count as one.
    pub max_attempts: u32,
    /// Backoff before the first retry.
    pub initial_backoff: Duration,
    /// Upper bound for any single backoff.
    pub max_backoff: Duration,
    /// Factor applied to the backoff after every retry.
    pub multiplier: f64,
    /// Randomize each backoff between half and all of its nominal value.
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        let retry = &CONFIG.retry;
        Self {
            max_attempts: retry.max_attempts,
            initial_backoff: Duration::from_millis(retry.initial_backoff_ms),
            max_backoff: Duration::from_millis(retry.max_backoff_ms),
            multiplier: retry.backoff_multiplier,
            jitter: true,
        }
    }
}

impl RetryPolicy {
    /// Nominal backoff after failed attempt number `attempt` (starting at 1).
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let nominal = self.initial_backoff.as_secs_f64() * self.multiplier.max(1.0).powi(exponent);
        // NaN and infinity fail the conversion and fall back to the cap.
        match Duration::try_from_secs_f64(nominal) {
            Ok(backoff) if backoff < self.max_backoff => backoff,
            _ => self.max_backoff,
        }
    }

    fn delay(&self, attempt: u32) -> Duration {
        let nominal = self.backoff(attempt);
        if !self.jitter || nominal.is_zero() {
            return nominal;
        }
        let half = nominal / 2;
        half + rand::rng().random_range(Duration::ZERO..=half)
    }
}

/// Re-invokes the wrapped handler on failure with exponential backoff.
///
/// Returns the last error once `policy.max_attempts` attempts have failed.
/// Each message is cloned per attempt.
pub fn retry_middleware(policy: RetryPolicy) -> Middleware {
    Middleware::around(move |message, next| {
        let policy = policy.clone();
        async move {
            let max_attempts = policy.max_attempts.max(1);
            let mut attempt = 1;
            loop {
                match next.handle(message.clone()).await {
                    Ok(()) => return Ok(()),
                    Err(err) if attempt >= max_attempts => {
                        warn!(kind = %message.kind(), attempts = attempt, error = %err, "Handler failed, giving up");
                        return Err(err);
                    }
                    Err(err) => {
                        let delay = policy.delay(attempt);
                        debug!(kind = %message.kind(), attempt, ?delay, error = %err, "Handler failed, retrying");
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                    }
                }
            }
        }
    })
}

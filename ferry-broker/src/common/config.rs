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

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};

/// Configuration for the Ferry broker and its transports
///
/// Loaded from TOML files in XDG-compliant directories. Every section and every
/// field is optional in the file; missing values fall back to their defaults.
///
/// ```toml
/// [queue]
/// poll_interval_ms = 250
///
/// [retry]
/// max_attempts = 5
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FerryConfig {
    /// Polling queue transport settings
    pub queue: QueueConfig,
    /// Outbound batch ceilings
    pub batch: BatchConfig,
    /// Retry middleware settings
    pub retry: RetryConfig,
}

/// Polling queue configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Delay between two poll cycles in milliseconds
    pub poll_interval_ms: u64,
    /// Long-poll wait passed to each receive call, in seconds
    pub wait_time_secs: u32,
    /// Maximum messages requested per receive call
    pub max_messages: u32,
}

/// Batch ceilings used when chunking outbound entries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Maximum cumulative serialized bytes per batch call
    pub max_bytes: usize,
    /// Maximum entries per batch call
    pub max_entries: usize,
}

/// Retry middleware configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts, the first one included
    pub max_attempts: u32,
    /// Backoff before the first retry in milliseconds
    pub initial_backoff_ms: u64,
    /// Upper bound for any single backoff in milliseconds
    pub max_backoff_ms: u64,
    /// Factor applied to the backoff after every retry
    pub backoff_multiplier: f64,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 100,
            wait_time_secs: 5,
            max_messages: 10,
        }
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        // 256 KiB per call, shortened for leeway.
        Self {
            max_bytes: 240_000,
            max_entries: 10,
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff_ms: 100,
            max_backoff_ms: 5_000,
            backoff_multiplier: 2.0,
        }
    }
}

impl QueueConfig {
    /// Inter-poll delay as a `Duration`
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Long-poll wait as a `Duration`
    pub const fn wait_time(&self) -> Duration {
        Duration::from_secs(self.wait_time_secs as u64)
    }
}

impl BatchConfig {
    /// The ceilings as chunking limits
    pub fn limits(&self) -> ferry_core::BatchLimits {
        ferry_core::BatchLimits {
            max_bytes: self.max_bytes,
            max_entries: self.max_entries,
        }
    }
}

impl FerryConfig {
    /// Parse configuration from TOML text
    ///
    /// # Errors
    ///
    /// Returns the `toml` error if the text is not valid TOML or a value has the
    /// wrong type.
    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Load configuration from XDG-compliant locations
    ///
    /// Looks for `ferry/config.toml` under the XDG config directories
    /// (`$XDG_CONFIG_HOME`, then `$XDG_CONFIG_DIRS`). If no file is found
    /// the default configuration is returned. A file that cannot be read or
    /// parsed is logged and the defaults are used instead.
    pub fn load() -> Self {
        use tracing::{error, info};

        let xdg_dirs = match xdg::BaseDirectories::with_prefix("ferry") {
            Ok(dirs) => dirs,
            Err(e) => {
                error!("Failed to initialize XDG directories: {}", e);
                return Self::default();
            }
        };

        let Some(path) = xdg_dirs.find_config_file("config.toml") else {
            info!("No configuration file found, using defaults");
            return Self::default();
        };

        info!("Loading configuration from: {}", path.display());
        match std::fs::read_to_string(&path) {
            Ok(config_str) => match Self::from_toml_str(&config_str) {
                Ok(config) => {
                    info!("Successfully loaded configuration");
                    config
                }
                Err(e) => {
                    error!("Failed to parse configuration file {}: {}", path.display(), e);
                    Self::default()
                }
            },
            Err(e) => {
                error!("Failed to read configuration file {}: {}", path.display(), e);
                Self::default()
            }
        }
    }
}

lazy_static! {
    /// Global configuration instance loaded from XDG-compliant locations
    pub static ref CONFIG: FerryConfig = FerryConfig::load();
}

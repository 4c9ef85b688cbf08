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

//! Partitioning of outbound batches under per-call size and count ceilings.
//!
//! Cloud queue, topic and event bus APIs cap both the payload size and the number
//! of entries of a single batch call. [`chunk_by_bytes`] packs a batch greedily into
//! as few calls as those ceilings allow while keeping the input order.

use derive_new::new;
use serde::Serialize;

use super::{ChunkError, TransportError};

/// A payload paired with its serialized length in bytes.
#[derive(new, Debug, Clone, PartialEq, Eq)]
pub struct SizedItem<T> {
    /// The entry itself.
    pub data: T,
    /// Serialized length of `data`.
    pub bytes: usize,
}

/// Per-call ceilings of a batch API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchLimits {
    /// Maximum cumulative bytes (entries plus overhead) per call.
    pub max_bytes: usize,
    /// Maximum number of entries per call.
    pub max_entries: usize,
}

impl Default for BatchLimits {
    fn default() -> Self {
        Self {
            // 256 KiB is the hard limit; leave some leeway for envelope fields.
            max_bytes: 240_000,
            max_entries: 10,
        }
    }
}

/// Partitions `items` into chunks whose summed `bytes + overhead` never exceeds
/// `max_bytes` and whose length never exceeds `max_count`.
///
/// Single greedy pass: each item joins the current chunk if both ceilings still
/// hold, otherwise it opens a new chunk. Order is preserved within and across
/// chunks and every item appears exactly once. Empty input yields no chunks.
///
/// # Errors
///
/// * [`ChunkError::EntryTooLarge`] if one item cannot fit even in an empty chunk.
///   Nothing is returned in that case; the caller must not submit a partial batch.
/// * [`ChunkError::ZeroCount`] if `max_count` is `Some(0)`.
pub fn chunk_by_bytes<T>(
    items: impl IntoIterator<Item = SizedItem<T>>,
    max_bytes: usize,
    overhead: usize,
    max_count: Option<usize>,
) -> Result<Vec<Vec<SizedItem<T>>>, ChunkError> {
    if max_count == Some(0) {
        return Err(ChunkError::ZeroCount);
    }

    let mut chunks: Vec<Vec<SizedItem<T>>> = Vec::new();
    let mut current_bytes = 0usize;

    for item in items {
        let cost = item.bytes.saturating_add(overhead);
        if cost > max_bytes {
            return Err(ChunkError::EntryTooLarge {
                bytes: item.bytes,
                overhead,
                max_bytes,
            });
        }

        match chunks.last_mut() {
            Some(chunk)
                if cost <= max_bytes - current_bytes
                    && max_count.map_or(true, |max| chunk.len() < max) =>
            {
                chunk.push(item);
                current_bytes += cost;
            }
            _ => {
                chunks.push(vec![item]);
                current_bytes = cost;
            }
        }
    }

    Ok(chunks)
}

/// Sizes every entry by the byte length of its JSON form and chunks the batch
/// under `limits`.
///
/// `overhead` is added to every entry to account for the request envelope each
/// entry costs beyond its own JSON.
pub fn chunk_json<T: Serialize>(
    entries: Vec<T>,
    limits: BatchLimits,
    overhead: usize,
) -> Result<Vec<Vec<SizedItem<T>>>, TransportError> {
    let sized = entries
        .into_iter()
        .map(|entry| -> Result<SizedItem<T>, serde_json::Error> {
            let bytes = serde_json::to_vec(&entry)?.len();
            Ok(SizedItem::new(entry, bytes))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(chunk_by_bytes(
        sized,
        limits.max_bytes,
        overhead,
        Some(limits.max_entries),
    )?)
}

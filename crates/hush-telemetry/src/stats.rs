// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Counters for executed purges.

use std::collections::BTreeMap;

/// Running totals of purges, keyed by reason label.
#[derive(Debug, Clone, Default)]
pub struct PurgeStats {
    by_reason: BTreeMap<&'static str, u64>,
    total: u64,
    failed_steps: u64,
    last_reason: Option<&'static str>,
}

impl PurgeStats {
    /// Creates empty counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one executed purge and how many of its steps failed.
    pub fn record(&mut self, reason: &'static str, failed_steps: usize) {
        *self.by_reason.entry(reason).or_insert(0) += 1;
        self.total += 1;
        self.failed_steps += failed_steps as u64;
        self.last_reason = Some(reason);
    }

    /// Purges recorded for `reason`.
    pub fn count(&self, reason: &str) -> u64 {
        self.by_reason.get(reason).copied().unwrap_or(0)
    }

    /// Purges recorded for any reason.
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Steps that failed across all purges.
    pub fn failed_steps(&self) -> u64 {
        self.failed_steps
    }

    /// Reason of the most recent purge.
    pub fn last_reason(&self) -> Option<&'static str> {
        self.last_reason
    }

    /// `(reason, count)` pairs in reason order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, u64)> + '_ {
        self.by_reason.iter().map(|(reason, count)| (*reason, *count))
    }
}

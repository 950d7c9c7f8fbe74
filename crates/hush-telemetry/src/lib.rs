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

//! Logging, memory monitoring and purge statistics for the controller.

pub mod logging;
pub mod memory_monitor;
pub mod sampler;
pub mod stats;

pub use logging::{init_logging, init_logging_with};
pub use memory_monitor::ProcessMemoryMonitor;
pub use sampler::{HeapHistory, HeapSampler, RingBuffer};
pub use stats::PurgeStats;

/// Bytes in one megabyte, as heap readings are reported.
pub const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

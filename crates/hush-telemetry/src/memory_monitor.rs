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

//! Process memory monitor
//!
//! Reads the resident memory of the current process through `sysinfo`, for
//! hosts that have no finer-grained heap introspection of their own.

use std::sync::Mutex;

use hush_core::MemoryInfo;
use sysinfo::{Pid, ProcessesToUpdate, System};

use crate::BYTES_PER_MB;

/// A [`MemoryInfo`] backed by the operating system's view of this process.
#[derive(Debug)]
pub struct ProcessMemoryMonitor {
    system: Mutex<System>,
    pid: Option<Pid>,
}

impl ProcessMemoryMonitor {
    /// Creates a monitor for the current process.
    pub fn new() -> Self {
        let pid = match sysinfo::get_current_pid() {
            Ok(pid) => Some(pid),
            Err(e) => {
                log::warn!("ProcessMemoryMonitor: current pid unavailable: {e}");
                None
            }
        };
        Self {
            system: Mutex::new(System::new()),
            pid,
        }
    }

    /// Refreshes and returns the resident memory of this process in bytes.
    pub fn resident_bytes(&self) -> Option<u64> {
        let pid = self.pid?;
        let mut system = self.system.lock().ok()?;
        system.refresh_processes(ProcessesToUpdate::Some(&[pid]), true);
        system.process(pid).map(|process| process.memory())
    }
}

impl Default for ProcessMemoryMonitor {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryInfo for ProcessMemoryMonitor {
    fn used_heap_mb(&self) -> Option<f64> {
        self.resident_bytes()
            .map(|bytes| bytes as f64 / BYTES_PER_MB)
    }
}

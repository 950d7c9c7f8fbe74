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

//! Player activity tracking.

use std::time::Duration;

/// Remembers when input was last seen.
#[derive(Debug, Clone, Copy)]
pub struct IdleTracker {
    last_active: Duration,
}

impl IdleTracker {
    /// Starts tracking at `start`, which counts as activity.
    pub fn new(start: Duration) -> Self {
        Self { last_active: start }
    }

    /// Records this tick's input state and returns how long the player has
    /// been idle.
    pub fn on_tick(&mut self, input_present: bool, now: Duration) -> Duration {
        if input_present {
            self.last_active = now;
        }
        now.saturating_sub(self.last_active)
    }

    /// Time of the last observed input.
    pub fn last_active(&self) -> Duration {
        self.last_active
    }
}

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

//! Automatic purge scheduling.
//!
//! The policy only fires on the field map, outside battle, and never more
//! often than [`AUTO_PURGE_FLOOR`]. Past that gate it either waits for the
//! configured interval or watches the heap against the configured limit.

use std::time::Duration;

use hush_core::{AutoPurgeMode, Config, MemoryInfo, SceneState};

use crate::guard::guarded;
use crate::purge::PurgeReason;

/// Minimum spacing between two automatic purges, whatever the mode.
pub const AUTO_PURGE_FLOOR: Duration = Duration::from_secs(60);

/// A policy evaluation that could not complete.
#[derive(Debug, thiserror::Error)]
pub enum PolicyError {
    /// A scene query returned an error.
    #[error("scene query '{query}' failed: {error:#}")]
    SceneQuery {
        /// The query that failed.
        query: &'static str,
        /// The host's error.
        error: anyhow::Error,
    },
    /// A scene query panicked.
    #[error("scene query '{query}' panicked: {message}")]
    Panicked {
        /// The query that panicked.
        query: &'static str,
        /// The panic message.
        message: String,
    },
}

/// Decides when an automatic purge is due.
pub struct AutoPurgePolicy {
    scene: Box<dyn SceneState>,
    memory: Option<Box<dyn MemoryInfo>>,
    last_auto_purge: Duration,
}

impl AutoPurgePolicy {
    /// Creates a policy whose timer starts at `start`.
    ///
    /// `memory` must be `None` when the host lacks the memory-info
    /// capability; smart mode then never fires.
    pub fn new(
        scene: Box<dyn SceneState>,
        memory: Option<Box<dyn MemoryInfo>>,
        start: Duration,
    ) -> Self {
        Self {
            scene,
            memory,
            last_auto_purge: start,
        }
    }

    /// Returns the purge reason if one is due at `now`.
    ///
    /// Does not record the purge; call [`AutoPurgePolicy::record_purge`] once
    /// it has run. On error no state is touched.
    ///
    /// ## Arguments
    /// * `now` - The current clock reading.
    /// * `config` - The live configuration.
    ///
    /// ## Returns
    /// The trigger that fired, `None` when nothing is due, or a
    /// [`PolicyError`] when a scene query failed or panicked.
    pub fn evaluate(
        &self,
        now: Duration,
        config: &Config,
    ) -> Result<Option<PurgeReason>, PolicyError> {
        if config.auto_purge_mode == AutoPurgeMode::None {
            return Ok(None);
        }

        let elapsed = now.saturating_sub(self.last_auto_purge);
        if !self.gate_open()? || elapsed < AUTO_PURGE_FLOOR {
            return Ok(None);
        }

        match config.auto_purge_mode {
            AutoPurgeMode::None => Ok(None),
            AutoPurgeMode::Interval => {
                if elapsed >= config.auto_purge_interval() {
                    Ok(Some(PurgeReason::AutoInterval))
                } else {
                    Ok(None)
                }
            }
            AutoPurgeMode::Smart => {
                let limit = config.auto_purge_mem_limit_mb;
                match self.heap_reading() {
                    Some(used) if used > limit => {
                        log::info!("AutoPurge: MEM {used:.1}MB / LIMIT {limit}MB");
                        Ok(Some(PurgeReason::AutoSmart))
                    }
                    _ => Ok(None),
                }
            }
        }
    }

    /// True when the player is on the field map and not in battle.
    pub fn gate_open(&self) -> Result<bool, PolicyError> {
        if self.query("in_battle", |scene| scene.in_battle())? {
            return Ok(false);
        }
        self.query("current_scene_is_map", |scene| scene.current_scene_is_map())
    }

    /// Restarts the timer after an automatic purge ran at `now`.
    pub fn record_purge(&mut self, now: Duration) {
        self.last_auto_purge = now;
    }

    /// When the last automatic purge ran (or the policy started).
    pub fn last_auto_purge(&self) -> Duration {
        self.last_auto_purge
    }

    fn query(
        &self,
        query: &'static str,
        f: impl FnOnce(&dyn SceneState) -> anyhow::Result<bool>,
    ) -> Result<bool, PolicyError> {
        let scene = self.scene.as_ref();
        match guarded(|| f(scene)) {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(error)) => Err(PolicyError::SceneQuery { query, error }),
            Err(message) => Err(PolicyError::Panicked { query, message }),
        }
    }

    fn heap_reading(&self) -> Option<f64> {
        let memory = self.memory.as_deref()?;
        match guarded(|| memory.used_heap_mb()) {
            Ok(reading) => reading.filter(|mb| mb.is_finite()),
            Err(message) => {
                log::warn!("Heap reading panicked: {message}");
                None
            }
        }
    }
}

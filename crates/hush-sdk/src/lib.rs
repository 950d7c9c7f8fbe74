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

//! The public-facing SDK for embedding hush in a host engine.
//!
//! The host fills a [`HostServices`] with its collaborators, hands it to a
//! [`HushBuilder`] and then calls [`Hush::tick`] from its scheduler.

use std::path::Path;

use anyhow::{Context, Result};
use hush_control::Controller;
use hush_core::{Capabilities, Clock, Config, HostServices, MonotonicClock, Params};
use hush_telemetry::{HeapHistory, HeapSampler, ProcessMemoryMonitor};

pub mod prelude {
    pub use crate::{Hush, HushBuilder};
    pub use hush_control::{
        CommandError, CommandOutcome, Controller, PurgeReason, PurgeReport, PurgeStep,
        StepOutcome, TickReport,
    };
    pub use hush_core::{
        AudioService, AutoPurgeMode, Capabilities, Clock, Config, GcHint, HostEvent,
        HostServices, ImageCache, InputSignals, ManualClock, MapDataStore, MapId, MemoryInfo,
        MonotonicClock, Params, RendererFps, RunMode, SceneKind, SceneState, SpriteId,
        SpriteRefresher,
    };
    pub use hush_telemetry::{init_logging, init_logging_with, HeapHistory, PurgeStats};
}

/// Assembles a [`Hush`] controller.
pub struct HushBuilder<C: Clock = MonotonicClock> {
    params: Params,
    capabilities: Capabilities,
    clock: C,
    track_process_memory: bool,
}

impl HushBuilder {
    /// Starts from default parameters, every capability declared and a
    /// monotonic clock.
    pub fn new() -> Self {
        Self {
            params: Params::new(),
            capabilities: Capabilities::ALL,
            clock: MonotonicClock::new(),
            track_process_memory: false,
        }
    }
}

impl Default for HushBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock + 'static> HushBuilder<C> {
    /// Uses `params` as the host's parameter map.
    pub fn params(mut self, params: Params) -> Self {
        self.params = params;
        self
    }

    /// Parses the parameter map from a JSON object.
    pub fn params_json(mut self, text: &str) -> Result<Self> {
        self.params = Params::from_json_str(text).context("invalid parameter JSON")?;
        Ok(self)
    }

    /// Loads the parameter map from a JSON file.
    pub fn params_file(mut self, path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        self.params = Params::from_json_file(path)
            .with_context(|| format!("loading parameters from {}", path.display()))?;
        Ok(self)
    }

    /// Declares which optional capabilities the host supports.
    pub fn capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Replaces the time source.
    pub fn clock<C2: Clock + 'static>(self, clock: C2) -> HushBuilder<C2> {
        HushBuilder {
            params: self.params,
            capabilities: self.capabilities,
            clock,
            track_process_memory: self.track_process_memory,
        }
    }

    /// Falls back to this process's resident memory when the host supplies
    /// no heap reading of its own.
    pub fn track_process_memory(mut self, enabled: bool) -> Self {
        self.track_process_memory = enabled;
        self
    }

    /// Resolves the configuration and wires the controller.
    pub fn build(self, mut services: HostServices) -> Hush {
        let config = Config::resolve(&self.params);

        let mut heap_history = None;
        if services.memory.is_none() && self.track_process_memory {
            let sampler = HeapSampler::new(ProcessMemoryMonitor::new());
            heap_history = Some(sampler.history());
            services.memory = Some(Box::new(sampler));
            log::debug!("Using process resident memory as the heap reading");
        }

        Hush {
            controller: Controller::new(config, self.capabilities, services, self.clock),
            heap_history,
        }
    }
}

/// A running controller plus the telemetry the SDK attached to it.
pub struct Hush {
    controller: Controller,
    heap_history: Option<HeapHistory>,
}

impl Hush {
    /// Shorthand for [`Controller::tick`].
    pub fn tick(&mut self) -> hush_control::TickReport {
        self.controller.tick()
    }

    /// The wrapped controller.
    pub fn controller(&self) -> &Controller {
        &self.controller
    }

    /// The wrapped controller, mutably.
    pub fn controller_mut(&mut self) -> &mut Controller {
        &mut self.controller
    }

    /// Readings from the process memory monitor, when the SDK installed one.
    pub fn heap_history(&self) -> Option<&HeapHistory> {
        self.heap_history.as_ref()
    }

    /// Unwraps the controller.
    pub fn into_controller(self) -> Controller {
        self.controller
    }
}

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

//! The controller that owns every component and drives them once per tick.

use std::time::Duration;

use hush_core::{
    AutoPurgeMode, Capabilities, Clock, Config, EventBus, EventSender, HostEvent, HostServices,
    InputSignals, RunMode, SceneKind,
};
use hush_telemetry::PurgeStats;

use crate::command::CommandFacade;
use crate::frame_rate::FrameRateController;
use crate::guard::guarded;
use crate::idle::IdleTracker;
use crate::lazy::{DeferredRefreshQueue, LazyMapTracker};
use crate::policy::AutoPurgePolicy;
use crate::purge::{PurgeExecutor, PurgeReason, PurgeReport};

/// What one tick did.
#[derive(Debug)]
pub struct TickReport {
    /// Clock reading at the start of the tick.
    pub now: Duration,
    /// Time since the last observed input.
    pub idle: Duration,
    /// The frame rate applied this tick, if it changed.
    pub frame_rate_change: Option<u32>,
    /// The automatic purge run this tick, if any.
    pub auto_purge: Option<PurgeReport>,
    /// Number of host events processed before the tick.
    pub events_handled: usize,
}

/// The adaptive resource-purging controller.
///
/// Built once at boot from the resolved [`Config`], the host's declared
/// [`Capabilities`] and its [`HostServices`]. The host calls
/// [`Controller::tick`] from its scheduler and publishes lifecycle events on
/// the sender returned by [`Controller::event_sender`].
pub struct Controller {
    config: Config,
    capabilities: Capabilities,
    clock: Box<dyn Clock>,
    input: Box<dyn InputSignals>,
    idle: IdleTracker,
    frame_rate: Option<FrameRateController>,
    executor: PurgeExecutor,
    policy: AutoPurgePolicy,
    lazy_map: Option<LazyMapTracker>,
    lazy_images: Option<DeferredRefreshQueue>,
    events: EventBus<HostEvent>,
    stats: PurgeStats,
}

impl Controller {
    /// Wires the controller.
    ///
    /// Capabilities are resolved once here as the intersection of `declared`
    /// and the collaborators actually present in `services`. Collaborators
    /// behind an inactive capability are dropped.
    ///
    /// ## Arguments
    /// * `config` - The resolved configuration.
    /// * `declared` - The capabilities the host claims to support.
    /// * `services` - The host's collaborators.
    /// * `clock` - Time source; its reading now seeds every timer.
    pub fn new(
        config: Config,
        declared: Capabilities,
        services: HostServices,
        clock: impl Clock + 'static,
    ) -> Self {
        let capabilities = services.resolve_capabilities(declared);
        let HostServices {
            input,
            scene,
            image_cache,
            audio,
            gc,
            renderer,
            memory,
            map_data,
            sprites,
        } = services;

        let start = clock.now();
        let frame_rate = renderer
            .filter(|_| capabilities.frame_rate_control)
            .map(|renderer| FrameRateController::new(renderer, &config));
        let gc = gc.filter(|_| capabilities.gc_hint);
        let memory = memory.filter(|_| capabilities.memory_info);

        let lazy_map = match map_data {
            Some(store) if config.enable_lazy_map => Some(LazyMapTracker::new(store)),
            None if config.enable_lazy_map => {
                log::warn!("Lazy map loading enabled but the host supplied no map data store");
                None
            }
            _ => None,
        };
        let lazy_images = match sprites {
            Some(refresher) if config.enable_lazy_images => {
                Some(DeferredRefreshQueue::new(refresher))
            }
            None if config.enable_lazy_images => {
                log::warn!("Lazy image loading enabled but the host supplied no sprite refresher");
                None
            }
            _ => None,
        };

        log::info!(
            "Controller ready (frame rate control: {}, gc hint: {}, memory info: {})",
            capabilities.frame_rate_control,
            capabilities.gc_hint,
            capabilities.memory_info
        );

        Self {
            executor: PurgeExecutor::new(image_cache, audio, gc),
            policy: AutoPurgePolicy::new(scene, memory, start),
            idle: IdleTracker::new(start),
            frame_rate,
            lazy_map,
            lazy_images,
            config,
            capabilities,
            clock: Box::new(clock),
            input,
            events: EventBus::new(),
            stats: PurgeStats::new(),
        }
    }

    /// Runs one scheduler tick: pending host events, idle tracking, frame
    /// rate and the auto-purge policy, in that order.
    ///
    /// ## Returns
    /// A [`TickReport`] describing what changed.
    pub fn tick(&mut self) -> TickReport {
        let events_handled = self.pump_events();
        let now = self.clock.now();

        let input = self.input.as_ref();
        let input_present = guarded(|| input.any_pressed()).unwrap_or_else(|message| {
            log::warn!("Input query panicked: {message}");
            false
        });
        let idle = self.idle.on_tick(input_present, now);

        let frame_rate_change = match self.frame_rate.as_mut() {
            Some(frame_rate) => frame_rate.on_tick(idle, &self.config),
            None => None,
        };

        let auto_purge = self.run_auto_purge(now);

        TickReport {
            now,
            idle,
            frame_rate_change,
            auto_purge,
            events_handled,
        }
    }

    fn run_auto_purge(&mut self, now: Duration) -> Option<PurgeReport> {
        if self.config.auto_purge_mode == AutoPurgeMode::None {
            return None;
        }
        match self.policy.evaluate(now, &self.config) {
            Ok(Some(reason)) => {
                let report = self.purge(reason);
                self.policy.record_purge(now);
                Some(report)
            }
            Ok(None) => None,
            Err(e) => {
                log::warn!("Auto purge check skipped: {e}");
                None
            }
        }
    }

    /// Handles every queued host event. Returns how many were processed.
    pub fn pump_events(&mut self) -> usize {
        let events = self.events.drain();
        let count = events.len();
        for event in events {
            self.handle_event(event);
        }
        count
    }

    fn handle_event(&mut self, event: HostEvent) {
        if let HostEvent::SceneTerminated(_) = event {
            if let Some(queue) = self.lazy_images.as_mut() {
                queue.clear();
            }
        }

        match event {
            HostEvent::BootComplete => self.log_boot(),
            HostEvent::SceneTerminated(SceneKind::Map) => {
                if self.config.clear_on_map_change {
                    self.purge(PurgeReason::MapChange);
                }
            }
            HostEvent::SceneTerminated(SceneKind::Battle) => {
                if self.config.clear_on_battle_end {
                    self.purge(PurgeReason::BattleEnd);
                }
            }
            HostEvent::SceneTerminated(SceneKind::Other) => {}
            HostEvent::MapLoading { map_id } => {
                if let Some(lazy_map) = self.lazy_map.as_mut() {
                    lazy_map.on_map_loading(map_id);
                }
            }
            HostEvent::BitmapAssigned { sprite, ready } => {
                if let Some(queue) = self.lazy_images.as_mut() {
                    queue.on_bitmap_assigned(sprite, ready);
                }
            }
            HostEvent::BitmapLoaded { sprite } => {
                if let Some(queue) = self.lazy_images.as_mut() {
                    queue.on_bitmap_loaded(sprite);
                }
            }
            HostEvent::SpriteDisposed { sprite } => {
                if let Some(queue) = self.lazy_images.as_mut() {
                    queue.forget(sprite);
                }
            }
        }
    }

    fn log_boot(&self) {
        match serde_json::to_string(&self.config) {
            Ok(json) => log::info!("Resolved config: {json}"),
            Err(e) => log::warn!("Failed to serialize config: {e}"),
        }
        log::info!("{}", self.config.summary());
    }

    /// A sender the host uses to publish lifecycle events.
    pub fn event_sender(&self) -> EventSender<HostEvent> {
        self.events.sender()
    }

    /// Borrows the command entry points.
    pub fn commands(&mut self) -> CommandFacade<'_> {
        CommandFacade::new(self)
    }

    /// The live configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The capabilities resolved at construction.
    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    /// The frame rate last applied, or `None` without frame-rate control.
    pub fn current_fps(&self) -> Option<u32> {
        self.frame_rate.as_ref().map(FrameRateController::current_fps)
    }

    /// When the last automatic purge ran (or the controller started).
    pub fn last_auto_purge(&self) -> Duration {
        self.policy.last_auto_purge()
    }

    /// Purge counters since construction.
    pub fn stats(&self) -> &PurgeStats {
        &self.stats
    }

    /// Sprites still waiting for their bitmap.
    pub fn pending_refreshes(&self) -> usize {
        self.lazy_images
            .as_ref()
            .map_or(0, DeferredRefreshQueue::pending)
    }

    /// The controller's current clock reading.
    pub fn now(&self) -> Duration {
        self.clock.now()
    }

    pub(crate) fn purge(&mut self, reason: PurgeReason) -> PurgeReport {
        let report = self.executor.purge(reason, &self.config);
        self.stats.record(reason.as_str(), report.failure_count());
        report
    }

    pub(crate) fn set_mode(&mut self, mode: RunMode) {
        self.config.set_mode(mode);
        log::info!("Mode switched to {mode}");
    }
}

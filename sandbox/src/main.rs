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

// Hush Sandbox
// Plays a scripted ten-minute session against a simulated engine.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use hush_sdk::prelude::*;

const SESSION_SECS: u64 = 600;
const TICK: Duration = Duration::from_millis(250);
const HEAP_GROWTH_MB_PER_SEC: u32 = 6;
const HEAP_BASELINE_MB: u32 = 700;

const PARAMS: &str = r#"{
    "mode": "release",
    "idleSeconds": 5,
    "activeFps": 60,
    "idleFps": 30,
    "autoPurgeMode": "smart",
    "autoPurgeMemLimit": 1024,
    "enableLazyMap": true
}"#;

/// The simulated engine's state, shared by every collaborator.
#[derive(Default)]
struct World {
    pressing: AtomicBool,
    in_battle: AtomicBool,
    heap_mb: AtomicU32,
    fps: AtomicU32,
}

#[derive(Clone, Default)]
struct Engine(Arc<World>);

impl InputSignals for Engine {
    fn any_pressed(&self) -> bool {
        self.0.pressing.load(Ordering::Relaxed)
    }
}

impl SceneState for Engine {
    fn current_scene_is_map(&self) -> Result<bool> {
        Ok(!self.0.in_battle.load(Ordering::Relaxed))
    }

    fn in_battle(&self) -> Result<bool> {
        Ok(self.0.in_battle.load(Ordering::Relaxed))
    }
}

impl ImageCache for Engine {
    fn clear(&mut self) -> Result<()> {
        self.0.heap_mb.store(HEAP_BASELINE_MB, Ordering::Relaxed);
        Ok(())
    }
}

impl AudioService for Engine {
    fn stop_sound_effects(&mut self) -> Result<()> {
        Ok(())
    }

    fn stop_background_cue(&mut self) -> Result<()> {
        Ok(())
    }
}

impl GcHint for Engine {
    fn request_collection(&mut self) -> Result<()> {
        log::debug!("GC hint received");
        Ok(())
    }
}

impl RendererFps for Engine {
    fn set_frame_rate(&mut self, fps: u32) -> Result<()> {
        self.0.fps.store(fps, Ordering::Relaxed);
        Ok(())
    }
}

impl MemoryInfo for Engine {
    fn used_heap_mb(&self) -> Option<f64> {
        Some(f64::from(self.0.heap_mb.load(Ordering::Relaxed)))
    }
}

impl MapDataStore for Engine {
    fn release_map(&mut self, map_id: MapId) -> Result<()> {
        log::debug!("Map {} data released", map_id.0);
        Ok(())
    }
}

/// Whether the scripted player is touching the controls at `secs`.
fn player_active(secs: u64) -> bool {
    matches!(secs, 0..=20 | 90..=95 | 300..=330)
}

fn main() -> Result<()> {
    init_logging();

    let engine = Engine::default();
    engine.0.heap_mb.store(HEAP_BASELINE_MB, Ordering::Relaxed);
    engine.0.fps.store(60, Ordering::Relaxed);

    let services = HostServices::new(engine.clone(), engine.clone())
        .with_image_cache(engine.clone())
        .with_audio(engine.clone())
        .with_gc(engine.clone())
        .with_renderer(engine.clone())
        .with_memory(engine.clone())
        .with_map_data(engine.clone());

    let clock = ManualClock::new();
    let mut hush = HushBuilder::new()
        .params_json(PARAMS)?
        .clock(clock.clone())
        .build(services);

    let events = hush.controller().event_sender();
    events.send(HostEvent::BootComplete)?;
    events.send(HostEvent::MapLoading { map_id: MapId(1) })?;

    let mut previous_sec = None;
    while clock.now() < Duration::from_secs(SESSION_SECS) {
        clock.advance(TICK);
        let secs = clock.now().as_secs();

        if previous_sec != Some(secs) {
            previous_sec = Some(secs);
            engine.0.pressing.store(player_active(secs), Ordering::Relaxed);
            engine
                .0
                .heap_mb
                .fetch_add(HEAP_GROWTH_MB_PER_SEC, Ordering::Relaxed);

            match secs {
                150 => {
                    events.send(HostEvent::SceneTerminated(SceneKind::Map))?;
                    engine.0.in_battle.store(true, Ordering::Relaxed);
                }
                200 => {
                    events.send(HostEvent::SceneTerminated(SceneKind::Battle))?;
                    engine.0.in_battle.store(false, Ordering::Relaxed);
                }
                400 => {
                    events.send(HostEvent::SceneTerminated(SceneKind::Map))?;
                    events.send(HostEvent::MapLoading { map_id: MapId(2) })?;
                }
                _ => {}
            }
        }

        let report = hush.tick();
        if let Some(fps) = report.frame_rate_change {
            log::info!("t={:>5.1}s  frame rate -> {fps}", report.now.as_secs_f64());
        }
        if let Some(purge) = &report.auto_purge {
            log::info!(
                "t={:>5.1}s  automatic purge ({}), {} failed steps",
                report.now.as_secs_f64(),
                purge.reason(),
                purge.failure_count()
            );
        }
    }

    let report = hush.controller_mut().commands().purge_now();
    log::info!("Final manual purge clean: {}", report.is_clean());

    let stats = hush.controller().stats();
    log::info!("--- Purge Summary ---");
    for (reason, count) in stats.iter() {
        log::info!("  {reason}: {count}");
    }
    log::info!(
        "  total {} | failed steps {} | fps now {}",
        stats.total(),
        stats.failed_steps(),
        engine.0.fps.load(Ordering::Relaxed)
    );
    Ok(())
}

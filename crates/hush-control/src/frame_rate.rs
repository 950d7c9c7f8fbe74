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

//! Idle-driven frame-rate throttling.

use std::time::Duration;

use hush_core::{Config, RendererFps};

use crate::guard::guarded;

/// Switches the renderer between the active and idle frame rates.
///
/// Only built when the host supports direct frame-rate control. The host is
/// assumed to boot at the active rate, so nothing is applied until the player
/// first goes idle.
pub struct FrameRateController {
    renderer: Box<dyn RendererFps>,
    current_fps: u32,
}

impl FrameRateController {
    /// Creates a controller driving `renderer`.
    pub fn new(renderer: Box<dyn RendererFps>, config: &Config) -> Self {
        Self {
            renderer,
            current_fps: config.active_fps,
        }
    }

    /// The rate that should apply after `idle` without input.
    pub fn target_fps(idle: Duration, config: &Config) -> u32 {
        if idle > config.idle_threshold() {
            config.idle_fps
        } else {
            config.active_fps
        }
    }

    /// Applies the target rate if it differs from the current one.
    ///
    /// Returns the newly applied rate. A host call that fails or panics
    /// leaves the current rate untouched so the next tick tries again.
    pub fn on_tick(&mut self, idle: Duration, config: &Config) -> Option<u32> {
        let target = Self::target_fps(idle, config);
        if target == self.current_fps {
            return None;
        }

        let renderer = &mut self.renderer;
        match guarded(|| renderer.set_frame_rate(target)) {
            Ok(Ok(())) => {
                log::debug!(
                    "Frame rate {} -> {} (idle {} ms)",
                    self.current_fps,
                    target,
                    idle.as_millis()
                );
                self.current_fps = target;
                Some(target)
            }
            Ok(Err(e)) => {
                log::warn!("Failed to set frame rate to {target}: {e:#}");
                None
            }
            Err(message) => {
                log::warn!("Setting frame rate to {target} panicked: {message}");
                None
            }
        }
    }

    /// The rate last applied (or assumed at boot).
    pub fn current_fps(&self) -> u32 {
        self.current_fps
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{anyhow, Result};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct RecordingRenderer {
        calls: Arc<Mutex<Vec<u32>>>,
        fail: bool,
        panics_left: Arc<AtomicUsize>,
    }

    impl RendererFps for RecordingRenderer {
        fn set_frame_rate(&mut self, fps: u32) -> Result<()> {
            self.calls.lock().unwrap().push(fps);
            if self
                .panics_left
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
            {
                panic!("device lost");
            }
            if self.fail {
                Err(anyhow!("renderer is gone"))
            } else {
                Ok(())
            }
        }
    }

    fn controller(renderer: &RecordingRenderer) -> (FrameRateController, Config) {
        let config = Config::default();
        (
            FrameRateController::new(Box::new(renderer.clone()), &config),
            config,
        )
    }

    #[test]
    fn threshold_is_inclusive_for_active() {
        let config = Config::default();
        assert_eq!(
            FrameRateController::target_fps(Duration::from_secs(5), &config),
            60
        );
        assert_eq!(
            FrameRateController::target_fps(Duration::from_millis(5001), &config),
            30
        );
    }

    #[test]
    fn active_player_triggers_no_host_calls() {
        let renderer = RecordingRenderer::default();
        let (mut fps, config) = controller(&renderer);

        for ms in [0, 1000, 4999, 5000] {
            assert_eq!(fps.on_tick(Duration::from_millis(ms), &config), None);
        }
        assert!(renderer.calls.lock().unwrap().is_empty());
        assert_eq!(fps.current_fps(), 60);
    }

    #[test]
    fn idle_is_applied_once_then_reverts() {
        let renderer = RecordingRenderer::default();
        let (mut fps, config) = controller(&renderer);

        assert_eq!(fps.on_tick(Duration::from_millis(6000), &config), Some(30));
        assert_eq!(fps.on_tick(Duration::from_millis(6000), &config), None);
        assert_eq!(fps.on_tick(Duration::from_millis(9000), &config), None);
        assert_eq!(fps.on_tick(Duration::ZERO, &config), Some(60));

        assert_eq!(*renderer.calls.lock().unwrap(), vec![30, 60]);
    }

    #[test]
    fn failed_set_is_retried_next_tick() {
        let renderer = RecordingRenderer {
            fail: true,
            ..Default::default()
        };
        let (mut fps, config) = controller(&renderer);

        assert_eq!(fps.on_tick(Duration::from_secs(10), &config), None);
        assert_eq!(fps.on_tick(Duration::from_secs(11), &config), None);
        assert_eq!(fps.current_fps(), 60);
        assert_eq!(*renderer.calls.lock().unwrap(), vec![30, 30]);
    }

    #[test]
    fn panicking_renderer_is_contained_and_retried() {
        let renderer = RecordingRenderer {
            panics_left: Arc::new(AtomicUsize::new(2)),
            ..Default::default()
        };
        let (mut fps, config) = controller(&renderer);

        assert_eq!(fps.on_tick(Duration::from_secs(10), &config), None);
        assert_eq!(fps.on_tick(Duration::from_secs(11), &config), None);
        assert_eq!(fps.current_fps(), 60);

        assert_eq!(fps.on_tick(Duration::from_secs(12), &config), Some(30));
        assert_eq!(fps.current_fps(), 30);
        assert_eq!(*renderer.calls.lock().unwrap(), vec![30, 30, 30]);
    }
}

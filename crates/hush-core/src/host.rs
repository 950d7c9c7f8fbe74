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

//! Abstract contracts for the host engine services the controller drives.
//!
//! These traits are the boundary between the controller's policy logic and
//! the engine that actually owns caches, audio, rendering and scenes. The
//! host implements them and hands them over in a [`HostServices`] bundle.
//! Mutating calls return a `Result`; the controller never lets one of those
//! errors escape to the player.

use anyhow::Result;
use serde::Serialize;

/// Identifier of a map, as the host numbers them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MapId(pub u32);

/// Identifier of a sprite whose refresh may be deferred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SpriteId(pub u64);

/// The host's decoded image/bitmap cache.
pub trait ImageCache: Send {
    /// Drops every cached image.
    fn clear(&mut self) -> Result<()>;
}

/// The host's audio playback service.
pub trait AudioService: Send {
    /// Stops every playing sound effect.
    fn stop_sound_effects(&mut self) -> Result<()>;
    /// Stops the playing background/"me" cue.
    fn stop_background_cue(&mut self) -> Result<()>;
}

/// Optional ability to ask the runtime for a garbage collection.
pub trait GcHint: Send {
    /// Requests a collection. The runtime may ignore it.
    fn request_collection(&mut self) -> Result<()>;
}

/// Optional direct control over the renderer's target frame rate.
pub trait RendererFps: Send {
    /// Sets the target frame rate.
    fn set_frame_rate(&mut self, fps: u32) -> Result<()>;
}

/// The tracked input devices (keyboard, gamepad, touch).
pub trait InputSignals: Send {
    /// Returns true if any tracked input is currently pressed.
    fn any_pressed(&self) -> bool;
}

/// Queries about the scene the host is currently running.
///
/// Both queries may fail, for instance before the first scene exists.
pub trait SceneState: Send {
    /// Returns true if the active scene is the map scene.
    fn current_scene_is_map(&self) -> Result<bool>;
    /// Returns true if the party is in battle.
    fn in_battle(&self) -> Result<bool>;
}

/// Optional heap introspection.
pub trait MemoryInfo: Send {
    /// Returns the used heap in megabytes, or `None` if no reading is available.
    fn used_heap_mb(&self) -> Option<f64>;
}

/// Optional access to the host's loaded map data.
pub trait MapDataStore: Send {
    /// Releases the data of a map that is no longer current.
    fn release_map(&mut self, map_id: MapId) -> Result<()>;
}

/// Optional hook for redrawing a sprite once its bitmap is ready.
pub trait SpriteRefresher: Send {
    /// Refreshes the sprite.
    fn refresh(&mut self, sprite: SpriteId) -> Result<()>;
}

/// Which optional host capabilities the controller may use.
///
/// Resolved once when the controller is built: a capability is only active if
/// the host declares it *and* supplies the matching collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Capabilities {
    /// The renderer's frame rate can be set directly (desktop-class runtimes).
    pub frame_rate_control: bool,
    /// The runtime accepts garbage-collection hints.
    pub gc_hint: bool,
    /// Heap usage can be read.
    pub memory_info: bool,
}

impl Capabilities {
    /// Nothing optional is available.
    pub const NONE: Self = Self {
        frame_rate_control: false,
        gc_hint: false,
        memory_info: false,
    };

    /// Everything optional is available.
    pub const ALL: Self = Self {
        frame_rate_control: true,
        gc_hint: true,
        memory_info: true,
    };

    /// Keeps only the capabilities present in both descriptors.
    pub fn intersect(self, other: Self) -> Self {
        Self {
            frame_rate_control: self.frame_rate_control && other.frame_rate_control,
            gc_hint: self.gc_hint && other.gc_hint,
            memory_info: self.memory_info && other.memory_info,
        }
    }
}

/// The set of host collaborators handed to the controller.
///
/// Input and scene queries are mandatory; everything else is optional and a
/// missing collaborator simply turns the matching behaviour into a no-op.
pub struct HostServices {
    /// Tracked input devices.
    pub input: Box<dyn InputSignals>,
    /// Scene queries.
    pub scene: Box<dyn SceneState>,
    /// Image cache.
    pub image_cache: Option<Box<dyn ImageCache>>,
    /// Audio playback.
    pub audio: Option<Box<dyn AudioService>>,
    /// Garbage-collection hint.
    pub gc: Option<Box<dyn GcHint>>,
    /// Frame-rate setter.
    pub renderer: Option<Box<dyn RendererFps>>,
    /// Heap introspection.
    pub memory: Option<Box<dyn MemoryInfo>>,
    /// Loaded map data.
    pub map_data: Option<Box<dyn MapDataStore>>,
    /// Sprite refresh hook.
    pub sprites: Option<Box<dyn SpriteRefresher>>,
}

impl HostServices {
    /// Creates a bundle with only the mandatory collaborators.
    pub fn new(input: impl InputSignals + 'static, scene: impl SceneState + 'static) -> Self {
        Self {
            input: Box::new(input),
            scene: Box::new(scene),
            image_cache: None,
            audio: None,
            gc: None,
            renderer: None,
            memory: None,
            map_data: None,
            sprites: None,
        }
    }

    /// Attaches the image cache.
    pub fn with_image_cache(mut self, cache: impl ImageCache + 'static) -> Self {
        self.image_cache = Some(Box::new(cache));
        self
    }

    /// Attaches the audio service.
    pub fn with_audio(mut self, audio: impl AudioService + 'static) -> Self {
        self.audio = Some(Box::new(audio));
        self
    }

    /// Attaches the garbage-collection hint.
    pub fn with_gc(mut self, gc: impl GcHint + 'static) -> Self {
        self.gc = Some(Box::new(gc));
        self
    }

    /// Attaches the frame-rate setter.
    pub fn with_renderer(mut self, renderer: impl RendererFps + 'static) -> Self {
        self.renderer = Some(Box::new(renderer));
        self
    }

    /// Attaches heap introspection.
    pub fn with_memory(mut self, memory: impl MemoryInfo + 'static) -> Self {
        self.memory = Some(Box::new(memory));
        self
    }

    /// Attaches the map data store.
    pub fn with_map_data(mut self, store: impl MapDataStore + 'static) -> Self {
        self.map_data = Some(Box::new(store));
        self
    }

    /// Attaches the sprite refresh hook.
    pub fn with_sprites(mut self, sprites: impl SpriteRefresher + 'static) -> Self {
        self.sprites = Some(Box::new(sprites));
        self
    }

    /// Capabilities backed by a supplied collaborator.
    pub fn supplied(&self) -> Capabilities {
        Capabilities {
            frame_rate_control: self.renderer.is_some(),
            gc_hint: self.gc.is_some(),
            memory_info: self.memory.is_some(),
        }
    }

    /// Resolves the effective capabilities against what the host declared.
    pub fn resolve_capabilities(&self, declared: Capabilities) -> Capabilities {
        declared.intersect(self.supplied())
    }
}

impl std::fmt::Debug for HostServices {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostServices")
            .field("image_cache", &self.image_cache.is_some())
            .field("audio", &self.audio.is_some())
            .field("gc", &self.gc.is_some())
            .field("renderer", &self.renderer.is_some())
            .field("memory", &self.memory.is_some())
            .field("map_data", &self.map_data.is_some())
            .field("sprites", &self.sprites.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoInput;
    impl InputSignals for NoInput {
        fn any_pressed(&self) -> bool {
            false
        }
    }

    struct OnMap;
    impl SceneState for OnMap {
        fn current_scene_is_map(&self) -> Result<bool> {
            Ok(true)
        }
        fn in_battle(&self) -> Result<bool> {
            Ok(false)
        }
    }

    struct NullGc;
    impl GcHint for NullGc {
        fn request_collection(&mut self) -> Result<()> {
            Ok(())
        }
    }

    struct FixedHeap(f64);
    impl MemoryInfo for FixedHeap {
        fn used_heap_mb(&self) -> Option<f64> {
            Some(self.0)
        }
    }

    #[test]
    fn declared_capability_without_collaborator_is_inactive() {
        let services = HostServices::new(NoInput, OnMap);
        assert_eq!(
            services.resolve_capabilities(Capabilities::ALL),
            Capabilities::NONE
        );
    }

    #[test]
    fn collaborator_without_declaration_is_inactive() {
        let services = HostServices::new(NoInput, OnMap)
            .with_gc(NullGc)
            .with_memory(FixedHeap(10.0));
        let declared = Capabilities {
            gc_hint: true,
            ..Capabilities::NONE
        };
        let resolved = services.resolve_capabilities(declared);
        assert!(resolved.gc_hint);
        assert!(!resolved.memory_info);
        assert!(!resolved.frame_rate_control);
    }

    #[test]
    fn supplied_reflects_attached_collaborators() {
        let services = HostServices::new(NoInput, OnMap).with_memory(FixedHeap(1.0));
        assert_eq!(
            services.supplied(),
            Capabilities {
                memory_info: true,
                ..Capabilities::NONE
            }
        );
    }
}

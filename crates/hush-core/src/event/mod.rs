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

//! Host lifecycle events.
//!
//! Instead of wrapping engine methods, the host publishes these events and the
//! controller reacts to them when it drains its bus.

pub mod bus;

pub use bus::{EventBus, EventSender};

use crate::host::{MapId, SpriteId};

/// The kind of scene that just ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SceneKind {
    /// The field map.
    Map,
    /// A battle.
    Battle,
    /// Any other scene (menus, title, ...).
    Other,
}

/// A lifecycle notification from the host engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    /// The engine finished booting and is about to start the game.
    BootComplete,
    /// A scene was torn down.
    SceneTerminated(SceneKind),
    /// The host is about to load a map's data.
    MapLoading {
        /// The map being loaded.
        map_id: MapId,
    },
    /// A sprite was given a bitmap.
    BitmapAssigned {
        /// The sprite that received the bitmap.
        sprite: SpriteId,
        /// Whether the bitmap was already decoded.
        ready: bool,
    },
    /// A sprite's bitmap finished loading.
    BitmapLoaded {
        /// The sprite whose bitmap is now ready.
        sprite: SpriteId,
    },
    /// A sprite was destroyed, whether or not its bitmap had loaded.
    SpriteDisposed {
        /// The destroyed sprite.
        sprite: SpriteId,
    },
}

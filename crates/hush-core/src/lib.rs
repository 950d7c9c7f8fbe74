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

//! # Hush Core
//!
//! Foundational crate containing the configuration model, the capability
//! descriptor, the host collaborator traits and the lifecycle events that the
//! `hush-control` controller is built against.
//!
//! Nothing in this crate makes decisions. It only describes what the host
//! engine can do and what the controller is allowed to ask of it.

#![warn(missing_docs)]

pub mod clock;
pub mod config;
pub mod event;
pub mod host;

pub use clock::{Clock, ManualClock, MonotonicClock};
pub use config::{AutoPurgeMode, Config, ConfigError, Params, RunMode};
pub use event::{EventBus, EventSender, HostEvent, SceneKind};
pub use host::{
    AudioService, Capabilities, GcHint, HostServices, ImageCache, InputSignals, MapDataStore,
    MapId, MemoryInfo, RendererFps, SceneState, SpriteId, SpriteRefresher,
};

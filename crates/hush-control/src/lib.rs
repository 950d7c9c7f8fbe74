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

//! # Hush Control
//!
//! The adaptive resource-purging controller.
//!
//! Each scheduler tick runs, in order: host event dispatch, idle tracking,
//! frame-rate throttling and the auto-purge policy. Manual purges go through
//! the [`CommandFacade`] and bypass the policy entirely.

pub mod command;
pub mod controller;
pub mod frame_rate;
mod guard;
pub mod idle;
pub mod lazy;
pub mod policy;
pub mod purge;

pub use command::{CommandError, CommandFacade, CommandOutcome};
pub use controller::{Controller, TickReport};
pub use frame_rate::FrameRateController;
pub use idle::IdleTracker;
pub use lazy::{DeferredRefreshQueue, LazyMapTracker};
pub use policy::{AutoPurgePolicy, PolicyError, AUTO_PURGE_FLOOR};
pub use purge::{PurgeExecutor, PurgeReason, PurgeReport, PurgeStep, StepFailure, StepOutcome};

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

//! The purge action itself.
//!
//! A purge runs four independent steps in a fixed order: clear the image
//! cache, stop sound effects, stop the background cue, then hint a garbage
//! collection. A step that errors or panics is recorded and logged, and the
//! remaining steps still run. [`PurgeExecutor::purge`] itself never fails.

use std::fmt;

use hush_core::{AudioService, Config, GcHint, ImageCache};

use crate::guard::guarded;

/// Why a purge was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PurgeReason {
    /// Explicit command from a script or designer.
    Command,
    /// The map scene terminated.
    MapChange,
    /// The battle scene terminated.
    BattleEnd,
    /// The auto-purge interval elapsed.
    AutoInterval,
    /// Heap usage crossed the configured limit.
    AutoSmart,
}

impl PurgeReason {
    /// The label used in logs and statistics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Command => "command",
            Self::MapChange => "map-change",
            Self::BattleEnd => "battle-end",
            Self::AutoInterval => "auto-interval",
            Self::AutoSmart => "auto-smart",
        }
    }

    /// Whether the auto-purge policy issued this purge.
    pub fn is_automatic(&self) -> bool {
        matches!(self, Self::AutoInterval | Self::AutoSmart)
    }
}

impl fmt::Display for PurgeReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One step of a purge, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PurgeStep {
    /// Clear the image cache.
    ImageCache,
    /// Stop playing sound effects.
    SoundEffects,
    /// Stop the background cue.
    BackgroundCue,
    /// Request a garbage collection.
    GarbageCollection,
}

impl PurgeStep {
    /// All steps, in execution order.
    pub const ALL: [PurgeStep; 4] = [
        PurgeStep::ImageCache,
        PurgeStep::SoundEffects,
        PurgeStep::BackgroundCue,
        PurgeStep::GarbageCollection,
    ];
}

impl fmt::Display for PurgeStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ImageCache => "image cache clear",
            Self::SoundEffects => "sound effect stop",
            Self::BackgroundCue => "background cue stop",
            Self::GarbageCollection => "gc hint",
        })
    }
}

/// A step that did not complete.
#[derive(Debug, thiserror::Error)]
pub enum StepFailure {
    /// The collaborator returned an error.
    #[error("{step} failed: {error:#}")]
    Errored {
        /// The failing step.
        step: PurgeStep,
        /// The collaborator's error.
        error: anyhow::Error,
    },
    /// The collaborator panicked.
    #[error("{step} panicked: {message}")]
    Panicked {
        /// The failing step.
        step: PurgeStep,
        /// The panic message.
        message: String,
    },
}

impl StepFailure {
    /// The step that failed.
    pub fn step(&self) -> PurgeStep {
        match self {
            Self::Errored { step, .. } | Self::Panicked { step, .. } => *step,
        }
    }
}

/// How a single step ended.
#[derive(Debug)]
pub enum StepOutcome {
    /// The collaborator call succeeded.
    Done,
    /// The step did not apply (collaborator absent or GC not allowed).
    Skipped,
    /// The collaborator call failed.
    Failed(StepFailure),
}

impl StepOutcome {
    /// True for [`StepOutcome::Done`].
    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done)
    }

    /// True for [`StepOutcome::Skipped`].
    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped)
    }
}

/// What happened during one purge.
#[derive(Debug)]
pub struct PurgeReport {
    reason: PurgeReason,
    steps: Vec<(PurgeStep, StepOutcome)>,
}

impl PurgeReport {
    fn new(reason: PurgeReason) -> Self {
        Self {
            reason,
            steps: Vec::with_capacity(PurgeStep::ALL.len()),
        }
    }

    fn record(&mut self, step: PurgeStep, outcome: StepOutcome) {
        match &outcome {
            StepOutcome::Failed(failure) => {
                log::warn!("Purge '{}': {}", self.reason, failure);
            }
            StepOutcome::Skipped => {
                log::debug!("Purge '{}': {} skipped", self.reason, step);
            }
            StepOutcome::Done => {}
        }
        self.steps.push((step, outcome));
    }

    /// The reason the purge ran.
    pub fn reason(&self) -> PurgeReason {
        self.reason
    }

    /// Every step with its outcome, in execution order.
    pub fn steps(&self) -> &[(PurgeStep, StepOutcome)] {
        &self.steps
    }

    /// The outcome of one step.
    pub fn outcome(&self, step: PurgeStep) -> Option<&StepOutcome> {
        self.steps
            .iter()
            .find(|(s, _)| *s == step)
            .map(|(_, outcome)| outcome)
    }

    /// Every failed step.
    pub fn failures(&self) -> impl Iterator<Item = &StepFailure> {
        self.steps.iter().filter_map(|(_, outcome)| match outcome {
            StepOutcome::Failed(failure) => Some(failure),
            _ => None,
        })
    }

    /// Number of failed steps.
    pub fn failure_count(&self) -> usize {
        self.failures().count()
    }

    /// True if no step failed.
    pub fn is_clean(&self) -> bool {
        self.failure_count() == 0
    }
}

fn run_step(step: PurgeStep, f: impl FnOnce() -> anyhow::Result<()>) -> StepOutcome {
    match guarded(f) {
        Ok(Ok(())) => StepOutcome::Done,
        Ok(Err(error)) => StepOutcome::Failed(StepFailure::Errored { step, error }),
        Err(message) => StepOutcome::Failed(StepFailure::Panicked { step, message }),
    }
}

/// Runs purges against the host's cache, audio and GC collaborators.
pub struct PurgeExecutor {
    image_cache: Option<Box<dyn ImageCache>>,
    audio: Option<Box<dyn AudioService>>,
    gc: Option<Box<dyn GcHint>>,
}

impl PurgeExecutor {
    /// Creates an executor. Pass `gc: None` when the host has no GC-hint
    /// capability.
    pub fn new(
        image_cache: Option<Box<dyn ImageCache>>,
        audio: Option<Box<dyn AudioService>>,
        gc: Option<Box<dyn GcHint>>,
    ) -> Self {
        Self {
            image_cache,
            audio,
            gc,
        }
    }

    /// Runs every step for `reason`. Mode and GC settings are read from
    /// `config` at call time, so runtime mode switches apply immediately.
    ///
    /// ## Arguments
    /// * `reason` - Why the purge runs; recorded in the report.
    /// * `config` - The live configuration.
    ///
    /// ## Returns
    /// One outcome per step. Failures are collected, never propagated.
    pub fn purge(&mut self, reason: PurgeReason, config: &Config) -> PurgeReport {
        log::info!("Cache purge: {reason}");
        let mut report = PurgeReport::new(reason);

        let outcome = match self.image_cache.as_mut() {
            Some(cache) => run_step(PurgeStep::ImageCache, || cache.clear()),
            None => StepOutcome::Skipped,
        };
        report.record(PurgeStep::ImageCache, outcome);

        match self.audio.as_mut() {
            Some(audio) => {
                let outcome = run_step(PurgeStep::SoundEffects, || audio.stop_sound_effects());
                report.record(PurgeStep::SoundEffects, outcome);
                let outcome =
                    run_step(PurgeStep::BackgroundCue, || audio.stop_background_cue());
                report.record(PurgeStep::BackgroundCue, outcome);
            }
            None => {
                report.record(PurgeStep::SoundEffects, StepOutcome::Skipped);
                report.record(PurgeStep::BackgroundCue, StepOutcome::Skipped);
            }
        }

        let outcome = match self.gc.as_mut() {
            Some(gc) if config.gc_allowed() => {
                run_step(PurgeStep::GarbageCollection, || gc.request_collection())
            }
            _ => StepOutcome::Skipped,
        };
        report.record(PurgeStep::GarbageCollection, outcome);

        report
    }
}

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

//! Commands exposed to game scripts and designers.

use hush_core::{Params, RunMode};

use crate::controller::Controller;
use crate::purge::{PurgeReason, PurgeReport};

/// Command name for an immediate purge.
pub const PURGE_CACHE: &str = "purgeCache";
/// Command name for a mode switch.
pub const SET_MODE: &str = "setMode";
/// Argument carrying the target mode of [`SET_MODE`].
pub const MODE_ARG: &str = "mode";

/// A command the controller does not know.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    /// No command is registered under this name.
    #[error("unknown command '{0}'")]
    UnknownCommand(String),
}

/// The result of a dispatched command.
#[derive(Debug)]
pub enum CommandOutcome {
    /// A manual purge ran.
    Purged(PurgeReport),
    /// The execution mode changed.
    ModeSwitched(RunMode),
}

/// Borrowed command entry points of a [`Controller`].
pub struct CommandFacade<'a> {
    controller: &'a mut Controller,
}

impl<'a> CommandFacade<'a> {
    pub(crate) fn new(controller: &'a mut Controller) -> Self {
        Self { controller }
    }

    /// Purges right away, ignoring the scene gate and the auto-purge floor.
    /// The automatic timer is left alone.
    pub fn purge_now(&mut self) -> PurgeReport {
        self.controller.purge(PurgeReason::Command)
    }

    /// Switches the execution mode. Applies from the next purge on.
    pub fn set_mode(&mut self, mode: RunMode) {
        self.controller.set_mode(mode);
    }

    /// Runs a command by its registered name.
    ///
    /// ## Arguments
    /// * `name` - The command name (`purgeCache` or `setMode`).
    /// * `args` - Command arguments; `setMode` reads `mode`.
    ///
    /// ## Returns
    /// What the command did, or [`CommandError::UnknownCommand`] for an
    /// unregistered name.
    pub fn dispatch(&mut self, name: &str, args: &Params) -> Result<CommandOutcome, CommandError> {
        match name {
            PURGE_CACHE => Ok(CommandOutcome::Purged(self.purge_now())),
            SET_MODE => {
                let mode = match args.get(MODE_ARG) {
                    Some(raw) => RunMode::from_name(raw).unwrap_or_else(|| {
                        log::warn!("Unknown mode '{raw}', using release");
                        RunMode::Release
                    }),
                    None => RunMode::Release,
                };
                self.set_mode(mode);
                Ok(CommandOutcome::ModeSwitched(mode))
            }
            other => Err(CommandError::UnknownCommand(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use hush_core::{Capabilities, Config, HostServices, InputSignals, ManualClock, SceneState};

    struct Idle;

    impl InputSignals for Idle {
        fn any_pressed(&self) -> bool {
            false
        }
    }

    struct Menu;

    impl SceneState for Menu {
        fn current_scene_is_map(&self) -> Result<bool> {
            Ok(false)
        }
        fn in_battle(&self) -> Result<bool> {
            Ok(true)
        }
    }

    fn controller_with(config: Config) -> Controller {
        Controller::new(
            config,
            Capabilities::NONE,
            HostServices::new(Idle, Menu),
            ManualClock::new(),
        )
    }

    fn controller() -> Controller {
        controller_with(Config::default())
    }

    #[test]
    fn purge_ignores_scene_gate() {
        let mut controller = controller();
        let outcome = controller
            .commands()
            .dispatch(PURGE_CACHE, &Params::new())
            .unwrap();
        assert!(matches!(
            outcome,
            CommandOutcome::Purged(ref r) if r.reason() == PurgeReason::Command
        ));
        assert_eq!(controller.stats().count("command"), 1);
    }

    #[test]
    fn set_mode_parses_argument() {
        let mut controller =
            controller_with(Config::resolve(&Params::new().with("safeGC", "false")));
        assert!(!controller.config().safe_gc);
        let args = Params::new().with(MODE_ARG, "Safe");

        let outcome = controller.commands().dispatch(SET_MODE, &args).unwrap();
        assert!(matches!(outcome, CommandOutcome::ModeSwitched(RunMode::Safe)));
        assert_eq!(controller.config().mode, RunMode::Safe);
        assert!(controller.config().safe_gc);
    }

    #[test]
    fn set_mode_falls_back_to_release() {
        let mut controller = controller();
        controller.commands().set_mode(RunMode::Dev);

        controller
            .commands()
            .dispatch(SET_MODE, &Params::new().with(MODE_ARG, "turbo"))
            .unwrap();
        assert_eq!(controller.config().mode, RunMode::Release);

        controller.commands().set_mode(RunMode::Dev);
        controller.commands().dispatch(SET_MODE, &Params::new()).unwrap();
        assert_eq!(controller.config().mode, RunMode::Release);
    }

    #[test]
    fn unknown_command_is_rejected() {
        let mut controller = controller();
        let err = controller
            .commands()
            .dispatch("reticulate", &Params::new())
            .unwrap_err();
        assert_eq!(err, CommandError::UnknownCommand("reticulate".into()));
        assert_eq!(err.to_string(), "unknown command 'reticulate'");
    }
}

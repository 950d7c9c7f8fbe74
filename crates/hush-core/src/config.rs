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

//! Resolved controller settings and the raw parameter map they come from.
//!
//! The host engine stores plugin parameters as a flat map of strings. Resolution
//! never fails: every missing, unparseable or out-of-range value silently falls
//! back to its default so that a broken parameter can never stop the game from
//! booting.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Parameter names, as the host stores them.
pub mod keys {
    /// Execution mode (`release`, `dev`, `safe`).
    pub const MODE: &str = "mode";
    /// Purge when the map scene terminates.
    pub const CLEAR_ON_MAP_CHANGE: &str = "clearOnMapChange";
    /// Purge when the battle scene terminates.
    pub const CLEAR_ON_BATTLE_END: &str = "clearOnBattleEnd";
    /// Release the previous map's data when a new map loads.
    pub const ENABLE_LAZY_MAP: &str = "enableLazyMap";
    /// Defer sprite refreshes until their bitmap is ready.
    pub const ENABLE_LAZY_IMAGES: &str = "enableLazyImages";
    /// Seconds without input before the player counts as idle.
    pub const IDLE_SECONDS: &str = "idleSeconds";
    /// Frame rate while the player is active.
    pub const ACTIVE_FPS: &str = "activeFps";
    /// Frame rate while the player is idle.
    pub const IDLE_FPS: &str = "idleFps";
    /// Only hint garbage collection when this is enabled.
    pub const SAFE_GC: &str = "safeGC";
    /// Automatic purge trigger (`none`, `interval`, `smart`).
    pub const AUTO_PURGE_MODE: &str = "autoPurgeMode";
    /// Seconds between interval-triggered purges.
    pub const AUTO_PURGE_INTERVAL: &str = "autoPurgeInterval";
    /// Heap usage in MB above which smart purges fire.
    pub const AUTO_PURGE_MEM_LIMIT: &str = "autoPurgeMemLimit";
}

/// Errors raised while loading a parameter map from its serialized form.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The parameter file could not be read.
    #[error("failed to read parameter file '{}': {source}", .path.display())]
    Io {
        /// The file that failed to load.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The text is not valid JSON.
    #[error("malformed parameter JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// The JSON document is valid but is not an object.
    #[error("parameter JSON must be an object, found {found}")]
    NotAnObject {
        /// The JSON type that was found instead.
        found: &'static str,
    },
}

/// The raw, string-valued parameter map provided by the host.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params(BTreeMap<String, String>);

impl Params {
    /// Creates an empty parameter map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    /// Inserts or replaces a parameter.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    /// Returns the raw value of a parameter, if present.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Returns the number of parameters.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if no parameters are set.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Parses the JSON object the host uses to store plugin parameters.
    ///
    /// Scalar values are stringified (`5` becomes `"5"`, `true` becomes
    /// `"true"`), `null` entries are dropped and nested values are kept as
    /// their JSON text.
    ///
    /// ## Arguments
    /// * `text` - A JSON object of parameter names to values.
    ///
    /// ## Returns
    /// The parameters, or a [`ConfigError`] if `text` is not valid JSON or not
    /// an object.
    ///
    /// # Example
    ///
    /// ```rust
    /// use hush_core::Params;
    ///
    /// let params = Params::from_json_str(r#"{"idleSeconds": 5, "safeGC": true, "x": null}"#)
    ///     .unwrap();
    /// assert_eq!(params.get("idleSeconds"), Some("5"));
    /// assert_eq!(params.get("safeGC"), Some("true"));
    /// assert_eq!(params.get("x"), None);
    /// assert!(Params::from_json_str("[1, 2]").is_err());
    /// ```
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let value: serde_json::Value = serde_json::from_str(text)?;
        let object = match value {
            serde_json::Value::Object(object) => object,
            other => {
                return Err(ConfigError::NotAnObject {
                    found: json_type_name(&other),
                })
            }
        };

        let mut params = Params::new();
        for (key, value) in object {
            match value {
                serde_json::Value::Null => {}
                serde_json::Value::String(s) => params.insert(key, s),
                other => params.insert(key, other.to_string()),
            }
        }
        Ok(params)
    }

    /// Reads and parses a JSON parameter file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Params {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Params::new();
        for (key, value) in iter {
            params.insert(key, value);
        }
        params
    }
}

fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

/// The controller's execution mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    /// Normal operation.
    #[default]
    Release,
    /// Development: garbage-collection hints are never issued.
    Dev,
    /// Conservative: forces safe GC on.
    Safe,
}

impl RunMode {
    /// Parses a mode name, ignoring case and surrounding whitespace.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "release" => Some(Self::Release),
            "dev" => Some(Self::Dev),
            "safe" => Some(Self::Safe),
            _ => None,
        }
    }

    /// The canonical lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Release => "release",
            Self::Dev => "dev",
            Self::Safe => "safe",
        }
    }
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What triggers automatic purges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AutoPurgeMode {
    /// Automatic purging is off.
    #[default]
    None,
    /// Purge every `auto_purge_interval_secs`.
    Interval,
    /// Purge when heap usage exceeds `auto_purge_mem_limit_mb`.
    Smart,
}

impl AutoPurgeMode {
    /// Parses a mode name, ignoring case and surrounding whitespace.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "none" => Some(Self::None),
            "interval" => Some(Self::Interval),
            "smart" => Some(Self::Smart),
            _ => None,
        }
    }

    /// The canonical lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Interval => "interval",
            Self::Smart => "smart",
        }
    }
}

impl fmt::Display for AutoPurgeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A numeric parameter with an inclusive valid range and a default.
struct RangedParam {
    key: &'static str,
    min: f64,
    max: f64,
    default: f64,
}

const IDLE_SECONDS: RangedParam = RangedParam {
    key: keys::IDLE_SECONDS,
    min: 1.0,
    max: 600.0,
    default: 5.0,
};
const ACTIVE_FPS: RangedParam = RangedParam {
    key: keys::ACTIVE_FPS,
    min: 30.0,
    max: 120.0,
    default: 60.0,
};
const IDLE_FPS: RangedParam = RangedParam {
    key: keys::IDLE_FPS,
    min: 10.0,
    max: 60.0,
    default: 30.0,
};
const AUTO_PURGE_INTERVAL: RangedParam = RangedParam {
    key: keys::AUTO_PURGE_INTERVAL,
    min: 10.0,
    max: 3600.0,
    default: 180.0,
};
const AUTO_PURGE_MEM_LIMIT: RangedParam = RangedParam {
    key: keys::AUTO_PURGE_MEM_LIMIT,
    min: 100.0,
    max: 4096.0,
    default: 1024.0,
};

impl RangedParam {
    /// Returns the value as given when it lies in range, else the default.
    fn resolve(&self, params: &Params) -> f64 {
        let Some(raw) = params.get(self.key) else {
            return self.default;
        };
        let raw = raw.trim();
        if raw.is_empty() {
            return self.default;
        }
        match raw.parse::<f64>() {
            Ok(value) if (self.min..=self.max).contains(&value) => value,
            Ok(value) if value.is_finite() => {
                log::warn!(
                    "Parameter '{}'={} is outside [{}, {}], using {}",
                    self.key,
                    value,
                    self.min,
                    self.max,
                    self.default
                );
                self.default
            }
            _ => {
                log::warn!(
                    "Parameter '{}'='{}' is not a number, using {}",
                    self.key,
                    raw,
                    self.default
                );
                self.default
            }
        }
    }

    /// Like [`RangedParam::resolve`], rounded to a whole frame rate.
    fn resolve_fps(&self, params: &Params) -> u32 {
        // In range, so the cast cannot truncate.
        self.resolve(params).round() as u32
    }
}

/// A present boolean is true only when it is exactly `"true"`.
fn resolve_bool(params: &Params, key: &str, default: bool) -> bool {
    params.get(key).map_or(default, |raw| raw == "true")
}

/// Fully resolved controller settings.
///
/// Created once at startup. Only [`mode`](Self::mode) and
/// [`safe_gc`](Self::safe_gc) change afterwards, through [`Config::set_mode`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Execution mode.
    pub mode: RunMode,
    /// Purge when the map scene terminates.
    pub clear_on_map_change: bool,
    /// Purge when the battle scene terminates.
    pub clear_on_battle_end: bool,
    /// Release the previous map's data when a different map loads.
    pub enable_lazy_map: bool,
    /// Defer sprite refreshes until their bitmap has loaded.
    pub enable_lazy_images: bool,
    /// Seconds without input before the player is idle, in `[1, 600]`.
    /// Fractions are kept.
    pub idle_seconds: f64,
    /// Frame rate while active, in `[30, 120]`.
    pub active_fps: u32,
    /// Frame rate while idle, in `[10, 60]`.
    pub idle_fps: u32,
    /// Allow garbage-collection hints.
    #[serde(rename = "safeGC")]
    pub safe_gc: bool,
    /// Automatic purge trigger.
    pub auto_purge_mode: AutoPurgeMode,
    /// Seconds between interval purges, in `[10, 3600]`.
    #[serde(rename = "autoPurgeInterval")]
    pub auto_purge_interval_secs: f64,
    /// Heap limit for smart purges in MB, in `[100, 4096]`.
    #[serde(rename = "autoPurgeMemLimit")]
    pub auto_purge_mem_limit_mb: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self::resolve(&Params::new())
    }
}

impl Config {
    /// Resolves settings from the host's parameter map.
    pub fn resolve(params: &Params) -> Self {
        let mode = match params.get(keys::MODE) {
            None => RunMode::default(),
            Some(raw) => RunMode::from_name(raw).unwrap_or_else(|| {
                log::warn!("Unknown mode '{}', using release", raw);
                RunMode::Release
            }),
        };
        let auto_purge_mode = match params.get(keys::AUTO_PURGE_MODE) {
            None => AutoPurgeMode::default(),
            Some(raw) => AutoPurgeMode::from_name(raw).unwrap_or_else(|| {
                log::warn!("Unknown autoPurgeMode '{}', using none", raw);
                AutoPurgeMode::None
            }),
        };

        let mut config = Self {
            mode,
            clear_on_map_change: resolve_bool(params, keys::CLEAR_ON_MAP_CHANGE, true),
            clear_on_battle_end: resolve_bool(params, keys::CLEAR_ON_BATTLE_END, true),
            enable_lazy_map: resolve_bool(params, keys::ENABLE_LAZY_MAP, false),
            enable_lazy_images: resolve_bool(params, keys::ENABLE_LAZY_IMAGES, false),
            idle_seconds: IDLE_SECONDS.resolve(params),
            active_fps: ACTIVE_FPS.resolve_fps(params),
            idle_fps: IDLE_FPS.resolve_fps(params),
            safe_gc: resolve_bool(params, keys::SAFE_GC, true),
            auto_purge_mode,
            auto_purge_interval_secs: AUTO_PURGE_INTERVAL.resolve(params),
            auto_purge_mem_limit_mb: AUTO_PURGE_MEM_LIMIT.resolve(params),
        };
        if config.mode == RunMode::Safe {
            config.safe_gc = true;
        }
        config
    }

    /// Switches the execution mode. `Safe` forces `safe_gc` on.
    pub fn set_mode(&mut self, mode: RunMode) {
        self.mode = mode;
        if mode == RunMode::Safe {
            self.safe_gc = true;
        }
    }

    /// Whether the current mode and flags allow a garbage-collection hint.
    pub fn gc_allowed(&self) -> bool {
        self.mode != RunMode::Dev && self.safe_gc
    }

    /// Idle time after which the idle frame rate applies.
    pub fn idle_threshold(&self) -> Duration {
        Duration::from_secs_f64(self.idle_seconds)
    }

    /// Spacing between interval-triggered purges.
    pub fn auto_purge_interval(&self) -> Duration {
        Duration::from_secs_f64(self.auto_purge_interval_secs)
    }

    /// One-line human summary, logged at boot.
    pub fn summary(&self) -> String {
        format!(
            "Mode: {} | FPS: {}→{} | LazyMap:{} | LazyImages:{} | AutoPurge:{}",
            self.mode,
            self.active_fps,
            self.idle_fps,
            self.enable_lazy_map,
            self.enable_lazy_images,
            self.auto_purge_mode
        )
    }
}

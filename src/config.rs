//! Bootstrap configuration
//!
//! The window/world parameters the engine is constructed with. Loadable from
//! a JSON file; a missing or malformed file falls back to the defaults with
//! a logged warning.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::game::layers;

/// Parameters the host supplies when bringing the game up.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameInfo {
    /// Window title / game name
    pub name: String,
    /// Fixed playfield width in pixels
    pub target_width: u32,
    /// Fixed playfield height in pixels
    pub target_height: u32,
    /// Target frame rate the speed multiplier is normalized against
    pub target_fps: u32,
    /// Number of world layers allocated at startup
    pub max_world_layers: usize,
}

impl Default for GameInfo {
    fn default() -> Self {
        Self {
            name: "Sky Invaders".to_owned(),
            target_width: 1280,
            target_height: 720,
            target_fps: 30,
            max_world_layers: layers::COUNT,
        }
    }
}

impl GameInfo {
    /// Parse a configuration from a JSON string.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Serialize the configuration to JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Load a configuration file, falling back to defaults on any failure.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(json) => match Self::from_json(&json) {
                Ok(info) => {
                    log::info!(target: "config", "loaded configuration from {}", path.display());
                    info
                }
                Err(error) => {
                    log::warn!(
                        target: "config",
                        "invalid configuration in {}: {error}, using defaults",
                        path.display()
                    );
                    Self::default()
                }
            },
            Err(error) => {
                log::warn!(
                    target: "config",
                    "could not read {}: {error}, using defaults",
                    path.display()
                );
                Self::default()
            }
        }
    }
}

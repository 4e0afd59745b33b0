//! Runtime settings

use anyhow::{Context, Result};
use sable_core::WorldConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Settings for the demo simulation. Every field is optional in the JSON
/// file; unknown fields are rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RuntimeSettings {
    pub world: WorldConfig,
    /// Fixed steps to run before exiting.
    pub steps: u32,
    pub tick_rate_hz: u32,
    /// Entities created by the spawner pass each step.
    pub spawn_per_step: u32,
    /// Steps an entity lives before it is destroyed.
    pub lifetime_steps: u32,
}

impl Default for RuntimeSettings {
    fn default() -> Self {
        Self {
            world: WorldConfig::default(),
            steps: 600,
            tick_rate_hz: 60,
            spawn_per_step: 16,
            lifetime_steps: 90,
        }
    }
}

impl RuntimeSettings {
    /// Load from a JSON file, or defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading settings from {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("parsing {}", path.display()))
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

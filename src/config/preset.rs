// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Saved effects-preset payloads.

use serde::{Deserialize, Serialize};

/// One effect instance in a preset chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectSlot {
    /// Effect identifier (e.g. "limiter", "equalizer").
    pub effect_id: String,
    #[serde(default)]
    pub bypassed: bool,
    /// Raw parameter values, opaque to the registry engine.
    #[serde(default)]
    pub parameters: Vec<f32>,
}

impl EffectSlot {
    pub fn new(effect_id: impl Into<String>) -> Self {
        Self {
            effect_id: effect_id.into(),
            bypassed: false,
            parameters: Vec::new(),
        }
    }
}

/// A named effects chain saved to disk.
///
/// The engine only ever deals in preset names; the payload exists so the
/// store has something real to persist and hand to the processing side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preset {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub effects: Vec<EffectSlot>,
}

impl Preset {
    /// Create an empty preset.
    pub fn empty(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            effects: Vec::new(),
        }
    }

    /// Load from TOML string.
    pub fn from_toml(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }

    /// Serialize to TOML string.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

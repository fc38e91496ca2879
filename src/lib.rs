// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Live device registry and preset autoloading engine for PipeWire.
//!
//! EmberFX watches the audio graph from a dedicated PipeWire thread,
//! mirrors devices, modules, and clients into ordered registries, and
//! keeps per-device preset autoload rules in sync with an on-disk store.
//! All state changes are applied on a single control thread that drains
//! typed events from the graph and the store.

use serde::{Deserialize, Serialize};

pub mod autoload;
pub mod config;
pub mod directory;
pub mod engine;
pub mod graph;
pub mod mirrors;
pub mod registry;

pub use autoload::{AutoloadError, AutoloadMatcher};
pub use config::{AutoloadRule, Preferences, Preset, PresetStore, StoreError, StoreEvent};
pub use directory::DeviceDirectory;
pub use engine::Engine;
pub use graph::{Client, Device, DeviceKind, GraphEvent, GraphSnapshot, Module, PipeWireGraph};
pub use mirrors::InfoMirrors;
pub use registry::{Keyed, Registry};

/// Stream direction a device, preset, or autoload rule belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Capture side (microphones and other sources).
    Input,
    /// Playback side (speakers and other sinks).
    Output,
}

impl Direction {
    /// Directory and file stem used for this direction in the store.
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Input => "input",
            Direction::Output => "output",
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

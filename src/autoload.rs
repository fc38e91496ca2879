// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Autoload rule management keyed on device and route profile.
//!
//! Rules are matched by device name. Two devices that announce the same
//! name share rules and cannot be told apart by the pair key; that is the
//! accepted trade-off of name-based matching.

use crate::config::{AutoloadRule, PresetStore, StoreError};
use crate::graph::{Device, GraphSnapshot};
use crate::registry::Registry;
use crate::Direction;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum AutoloadError {
    #[error("no {direction:?} device named '{name}' is present")]
    DeviceResolution { direction: Direction, name: String },

    #[error("preset store error: {0}")]
    Store(#[from] StoreError),
}

/// Keeps at most one autoload rule per (device name, route profile) pair
/// and direction.
///
/// The matcher holds a read-only mirror of the persisted rules. Mutations
/// go through the store, and the mirror is refreshed only when the store
/// reports a rules change, never optimistically.
#[derive(Default)]
pub struct AutoloadMatcher {
    input_rules: Registry<AutoloadRule>,
    output_rules: Registry<AutoloadRule>,
}

impl AutoloadMatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// The mirrored rules for a direction.
    pub fn rules(&self, direction: Direction) -> &Registry<AutoloadRule> {
        match direction {
            Direction::Input => &self.input_rules,
            Direction::Output => &self.output_rules,
        }
    }

    fn rules_mut(&mut self, direction: Direction) -> &mut Registry<AutoloadRule> {
        match direction {
            Direction::Input => &mut self.input_rules,
            Direction::Output => &mut self.output_rules,
        }
    }

    /// Install the store's current rule set for a direction.
    pub fn handle_rules_changed(&mut self, direction: Direction, rules: Vec<AutoloadRule>) {
        debug!(
            "Autoload rules changed for {:?}: {} entries",
            direction,
            rules.len()
        );
        self.rules_mut(direction).replace_all(rules);
    }

    /// Bind a preset to the named device under its currently active route
    /// profile, replacing any rule already covering that pair.
    ///
    /// The device is resolved by name against the live registry; a miss is
    /// an error. A missing route profile is not: the rule is then keyed on
    /// the empty profile name. When a rule for the pair exists it is
    /// removed before the new one is added, so an interruption between the
    /// two writes leaves no rule rather than two.
    pub fn add_or_replace(
        &self,
        devices: &Registry<Device>,
        graph: &impl GraphSnapshot,
        store: &PresetStore,
        direction: Direction,
        device_name: &str,
        preset_name: &str,
    ) -> Result<(), AutoloadError> {
        let device = devices
            .iter()
            .find(|d| d.name == device_name)
            .ok_or_else(|| AutoloadError::DeviceResolution {
                direction,
                name: device_name.to_string(),
            })?;

        let profile = device
            .group_id
            .and_then(|group| graph.device_group_route(group, direction))
            .unwrap_or_default();

        if let Some(old) = self
            .rules(direction)
            .iter()
            .find(|rule| rule.matches_pair(&device.name, &profile))
        {
            debug!(
                "Replacing autoload rule for ('{}', '{}'): '{}' -> '{}'",
                device.name, profile, old.preset_name, preset_name
            );
            store.remove_autoload(direction, &old.preset_name, &old.device, &old.device_profile)?;
        }
        store.add_autoload(direction, preset_name, &device.name, &profile)?;

        info!(
            "Autoload set: {:?} preset '{}' for device '{}' profile '{}'",
            direction, preset_name, device.name, profile
        );
        Ok(())
    }

    /// Drop the exact rule triple from the store. Unknown triples are a
    /// silent no-op there.
    pub fn remove(
        &self,
        store: &PresetStore,
        direction: Direction,
        preset_name: &str,
        device: &str,
        device_profile: &str,
    ) -> Result<(), AutoloadError> {
        store.remove_autoload(direction, preset_name, device, device_profile)?;
        Ok(())
    }
}

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Live device registries and per-role device selection.

use crate::config::Preferences;
use crate::graph::{Device, DeviceKind};
use crate::registry::Registry;
use crate::Direction;
use tracing::{debug, warn};

/// Tracks which devices exist and which one each stream role uses.
///
/// Two registries mirror the graph, one per role. Selection is a persisted
/// device name; when the named device is absent the selection dangles and
/// `resolve_selected` returns `None` rather than reassigning. With
/// follow-default enabled for a role, default-device changes drive the
/// selection until the mode is turned off.
pub struct DeviceDirectory {
    inputs: Registry<Device>,
    outputs: Registry<Device>,
    prefs: Preferences,
    /// Last observed system default per role, so enabling follow-default
    /// can re-point the selection immediately.
    last_default_input: Option<String>,
    last_default_output: Option<String>,
}

impl DeviceDirectory {
    pub fn new(prefs: Preferences) -> Self {
        Self {
            inputs: Registry::new(),
            outputs: Registry::new(),
            prefs,
            last_default_input: None,
            last_default_output: None,
        }
    }

    /// The live registry for a role.
    pub fn devices(&self, role: Direction) -> &Registry<Device> {
        match role {
            Direction::Input => &self.inputs,
            Direction::Output => &self.outputs,
        }
    }

    fn registry_mut(&mut self, kind: DeviceKind) -> &mut Registry<Device> {
        match kind {
            DeviceKind::Source => &mut self.inputs,
            DeviceKind::Sink => &mut self.outputs,
        }
    }

    /// Register a device, ignoring duplicate announcements for a known id.
    /// Returns whether the device was actually added.
    pub fn on_device_added(&mut self, device: Device) -> bool {
        let id = device.id;
        let name = device.name.clone();
        let kind = device.kind;

        let inserted = self.registry_mut(kind).insert(device);
        if inserted {
            debug!("Device added: id={}, name='{}', kind={:?}", id, name, kind);
        } else {
            debug!("Ignoring duplicate announcement for device {}", id);
        }
        inserted
    }

    /// Refresh a known device's entry in place; unknown ids are ignored.
    pub fn on_device_changed(&mut self, device: Device) {
        let id = device.id;
        if self.registry_mut(device.kind).update(device) {
            debug!("Device changed: id={}", id);
        }
    }

    /// Drop a device from its registry. A selection pointing at it is left
    /// dangling on purpose; consumers re-resolve on their next read.
    pub fn on_device_removed(&mut self, device: &Device) {
        let role = device.kind.direction();
        if let Some(removed) = self.registry_mut(device.kind).remove(&device.id) {
            debug!(
                "Device removed: id={}, name='{}'",
                removed.id, removed.name
            );
            if self.prefs.device(role) == Some(removed.name.as_str()) {
                warn!(
                    "Selected {:?} device '{}' disappeared, selection now dangling",
                    role, removed.name
                );
            }
        }
    }

    /// Persist the named device as the active selection for a role.
    pub fn select(&mut self, role: Direction, name: &str) {
        debug!("Selecting {:?} device '{}'", role, name);
        self.prefs.set_device(role, name);
    }

    /// Toggle follow-default for a role. Enabling it re-points the
    /// selection at the last observed system default right away, if one
    /// has been seen.
    pub fn set_follow_default(&mut self, role: Direction, enabled: bool) {
        self.prefs.set_follow_default(role, enabled);
        if enabled {
            let last = match role {
                Direction::Input => self.last_default_input.clone(),
                Direction::Output => self.last_default_output.clone(),
            };
            if let Some(name) = last {
                self.select(role, &name);
            }
        }
    }

    /// Record a system default change, driving the selection when the
    /// role follows the default.
    pub fn on_default_changed(&mut self, role: Direction, device: &Device) {
        match role {
            Direction::Input => self.last_default_input = Some(device.name.clone()),
            Direction::Output => self.last_default_output = Some(device.name.clone()),
        }
        if self.prefs.follows_default(role) {
            self.select(role, &device.name);
        }
    }

    /// The selected device for a role, or `None` when nothing was ever
    /// selected or the selection dangles.
    pub fn resolve_selected(&self, role: Direction) -> Option<&Device> {
        let name = self.prefs.device(role)?;
        self.devices(role).iter().find(|d| d.name == name)
    }

    pub fn selected_name(&self, role: Direction) -> Option<&str> {
        self.prefs.device(role)
    }

    pub fn follows_default(&self, role: Direction) -> bool {
        self.prefs.follows_default(role)
    }

    pub fn preferences(&self) -> &Preferences {
        &self.prefs
    }
}

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Event-driven core tying the graph, the preset store, and the
//! selection state together.

use crate::autoload::{AutoloadError, AutoloadMatcher};
use crate::config::{AutoloadRule, Preferences, PresetStore, StoreEvent};
use crate::directory::DeviceDirectory;
use crate::graph::{Client, Device, GraphEvent, GraphSnapshot, Module};
use crate::mirrors::InfoMirrors;
use crate::registry::Registry;
use crate::Direction;
use std::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Owns all engine state and applies events from the graph and the store.
///
/// Collaborators marshal their notifications onto the two channels; the
/// engine drains them from a single control thread and never synchronizes
/// internally.
pub struct Engine<G: GraphSnapshot> {
    directory: DeviceDirectory,
    mirrors: InfoMirrors,
    autoload: AutoloadMatcher,
    input_presets: Registry<String>,
    output_presets: Registry<String>,
    store: PresetStore,
    graph: G,
    graph_rx: mpsc::Receiver<GraphEvent>,
    store_rx: mpsc::Receiver<StoreEvent>,
}

impl<G: GraphSnapshot> Engine<G> {
    /// Build the engine, seeding selection state, preset names, and
    /// autoload rules from the store. Unreadable state is logged and
    /// replaced with defaults so startup never blocks on a bad file.
    pub fn new(
        store: PresetStore,
        graph: G,
        graph_rx: mpsc::Receiver<GraphEvent>,
        store_rx: mpsc::Receiver<StoreEvent>,
    ) -> Self {
        let prefs = match store.load_preferences() {
            Ok(prefs) => prefs,
            Err(e) => {
                warn!("Failed to load preferences, using defaults: {}", e);
                Preferences::default()
            }
        };

        let mut engine = Self {
            directory: DeviceDirectory::new(prefs),
            mirrors: InfoMirrors::new(),
            autoload: AutoloadMatcher::new(),
            input_presets: Registry::new(),
            output_presets: Registry::new(),
            store,
            graph,
            graph_rx,
            store_rx,
        };

        for direction in [Direction::Input, Direction::Output] {
            match engine.store.names(direction) {
                Ok(names) => {
                    let registry = engine.preset_registry_mut(direction);
                    for name in names {
                        registry.insert(name);
                    }
                }
                Err(e) => warn!("Failed to list {:?} presets: {}", direction, e),
            }
            match engine.store.autoload_rules(direction) {
                Ok(rules) => engine.autoload.handle_rules_changed(direction, rules),
                Err(e) => warn!("Failed to load {:?} autoload rules: {}", direction, e),
            }
        }

        engine
    }

    // ==================== Event processing ====================

    /// Drain and apply all pending events from both channels.
    pub fn process_events(&mut self) {
        let graph_events: Vec<GraphEvent> = self.graph_rx.try_iter().collect();
        for event in graph_events {
            self.handle_graph_event(event);
        }

        let store_events: Vec<StoreEvent> = self.store_rx.try_iter().collect();
        for event in store_events {
            self.handle_store_event(event);
        }
    }

    fn handle_graph_event(&mut self, event: GraphEvent) {
        match event {
            GraphEvent::Connected => {
                info!("Audio graph connected");
                self.refresh_modules();
                self.refresh_clients();
            }
            GraphEvent::Disconnected => {
                warn!("Audio graph disconnected");
            }
            GraphEvent::DeviceAdded(device) => {
                self.directory.on_device_added(device);
            }
            GraphEvent::DeviceChanged(device) => {
                self.directory.on_device_changed(device);
            }
            GraphEvent::DeviceRemoved(device) => {
                self.directory.on_device_removed(&device);
            }
            GraphEvent::DefaultInputChanged(device) => {
                self.apply_default_change(Direction::Input, &device);
            }
            GraphEvent::DefaultOutputChanged(device) => {
                self.apply_default_change(Direction::Output, &device);
            }
            GraphEvent::Error(message) => {
                error!("Audio graph error: {}", message);
            }
        }
    }

    fn handle_store_event(&mut self, event: StoreEvent) {
        match event {
            StoreEvent::PresetCreated(category, name) => {
                debug!("Preset created: {:?} '{}'", category, name);
                self.preset_registry_mut(category).insert(name);
            }
            StoreEvent::PresetRemoved(category, name) => {
                debug!("Preset removed: {:?} '{}'", category, name);
                self.preset_registry_mut(category).remove(&name);
            }
            StoreEvent::AutoloadRulesChanged(direction, rules) => {
                self.autoload.handle_rules_changed(direction, rules);
            }
        }
    }

    fn apply_default_change(&mut self, role: Direction, device: &Device) {
        debug!("System default {:?} is now '{}'", role, device.name);
        let follows = self.directory.follows_default(role);
        self.directory.on_default_changed(role, device);
        if follows {
            self.persist_preferences();
        }
    }

    fn persist_preferences(&self) {
        if let Err(e) = self.store.save_preferences(self.directory.preferences()) {
            warn!("Failed to persist preferences: {}", e);
        }
    }

    fn preset_registry_mut(&mut self, category: Direction) -> &mut Registry<String> {
        match category {
            Direction::Input => &mut self.input_presets,
            Direction::Output => &mut self.output_presets,
        }
    }

    // ==================== Public API methods ====================

    /// Pick the named device as the active selection for a role and
    /// persist the choice.
    pub fn select_device(&mut self, role: Direction, name: &str) {
        self.directory.select(role, name);
        self.persist_preferences();
    }

    /// Toggle automatic tracking of the system default device for a role.
    pub fn set_follow_default(&mut self, role: Direction, enabled: bool) {
        self.directory.set_follow_default(role, enabled);
        self.persist_preferences();
    }

    pub fn resolve_selected(&self, role: Direction) -> Option<&Device> {
        self.directory.resolve_selected(role)
    }

    pub fn devices(&self, role: Direction) -> &Registry<Device> {
        self.directory.devices(role)
    }

    pub fn preferences(&self) -> &Preferences {
        self.directory.preferences()
    }

    pub fn preset_names(&self, category: Direction) -> &Registry<String> {
        match category {
            Direction::Input => &self.input_presets,
            Direction::Output => &self.output_presets,
        }
    }

    pub fn autoload_rules(&self, direction: Direction) -> &Registry<AutoloadRule> {
        self.autoload.rules(direction)
    }

    /// Bind a preset to a device for autoloading, replacing any rule for
    /// the same device and route profile.
    pub fn add_autoload(
        &self,
        direction: Direction,
        device_name: &str,
        preset_name: &str,
    ) -> Result<(), AutoloadError> {
        self.autoload.add_or_replace(
            self.directory.devices(direction),
            &self.graph,
            &self.store,
            direction,
            device_name,
            preset_name,
        )
    }

    /// Drop the exact autoload rule triple.
    pub fn remove_autoload(
        &self,
        direction: Direction,
        preset_name: &str,
        device: &str,
        device_profile: &str,
    ) -> Result<(), AutoloadError> {
        self.autoload
            .remove(&self.store, direction, preset_name, device, device_profile)
    }

    pub fn refresh_modules(&mut self) {
        self.mirrors.refresh_modules(&self.graph);
    }

    pub fn refresh_clients(&mut self) {
        self.mirrors.refresh_clients(&self.graph);
    }

    pub fn modules(&self) -> &Registry<Module> {
        self.mirrors.modules()
    }

    pub fn clients(&self) -> &Registry<Client> {
        self.mirrors.clients()
    }

    pub fn store(&self) -> &PresetStore {
        &self.store
    }
}

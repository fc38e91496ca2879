// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Filesystem-backed preset and autoload rule store.

use crate::config::{AutoloadRule, Preferences, Preset};
use crate::Direction;
use directories::ProjectDirs;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to determine config directory")]
    NoConfigDir,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Change notifications emitted by the store after successful writes.
#[derive(Debug, Clone)]
pub enum StoreEvent {
    /// A preset file appeared in a category.
    PresetCreated(Direction, String),
    /// A preset file was deleted from a category.
    PresetRemoved(Direction, String),
    /// A direction's rule file was rewritten; carries the full new set.
    AutoloadRulesChanged(Direction, Vec<AutoloadRule>),
}

/// Persists presets, autoload rules, and preferences on disk.
///
/// Layout under the root: `presets/input/` and `presets/output/` hold one
/// TOML file per preset (file stem = preset name), `autoload/input.json`
/// and `autoload/output.json` hold the rule arrays, `config.toml` holds
/// the preferences. The store enforces no rule invariants of its own;
/// `add_autoload` appends whatever it is given.
pub struct PresetStore {
    config_dir: PathBuf,
    input_presets_dir: PathBuf,
    output_presets_dir: PathBuf,
    autoload_dir: PathBuf,
    event_tx: mpsc::Sender<StoreEvent>,
}

impl PresetStore {
    /// Create a store rooted at the per-user config directory.
    pub fn new(event_tx: mpsc::Sender<StoreEvent>) -> Result<Self, StoreError> {
        let project_dirs =
            ProjectDirs::from("", "", "emberfx").ok_or(StoreError::NoConfigDir)?;
        Self::with_root(project_dirs.config_dir(), event_tx)
    }

    /// Create a store rooted at an explicit directory, initializing the
    /// layout beneath it.
    pub fn with_root(root: &Path, event_tx: mpsc::Sender<StoreEvent>) -> Result<Self, StoreError> {
        let config_dir = root.to_path_buf();
        let presets_dir = config_dir.join("presets");
        let input_presets_dir = presets_dir.join(Direction::Input.as_str());
        let output_presets_dir = presets_dir.join(Direction::Output.as_str());
        let autoload_dir = config_dir.join("autoload");

        fs::create_dir_all(&config_dir)?;
        fs::create_dir_all(&input_presets_dir)?;
        fs::create_dir_all(&output_presets_dir)?;
        fs::create_dir_all(&autoload_dir)?;

        Ok(Self {
            config_dir,
            input_presets_dir,
            output_presets_dir,
            autoload_dir,
            event_tx,
        })
    }

    fn presets_dir(&self, category: Direction) -> &Path {
        match category {
            Direction::Input => &self.input_presets_dir,
            Direction::Output => &self.output_presets_dir,
        }
    }

    fn preset_path(&self, category: Direction, name: &str) -> PathBuf {
        self.presets_dir(category).join(format!("{}.toml", name))
    }

    fn autoload_path(&self, direction: Direction) -> PathBuf {
        self.autoload_dir.join(format!("{}.json", direction.as_str()))
    }

    /// Get the path to the preferences file.
    pub fn config_path(&self) -> PathBuf {
        self.config_dir.join("config.toml")
    }

    fn emit(&self, event: StoreEvent) {
        if self.event_tx.send(event).is_err() {
            warn!("Store event receiver dropped, notification lost");
        }
    }

    // ==================== Preferences ====================

    /// Load the persisted preferences, falling back to defaults when the
    /// file does not exist yet.
    pub fn load_preferences(&self) -> Result<Preferences, StoreError> {
        let path = self.config_path();
        if path.exists() {
            let content = fs::read_to_string(&path)?;
            Ok(Preferences::from_toml(&content)?)
        } else {
            Ok(Preferences::default())
        }
    }

    /// Save the preferences.
    pub fn save_preferences(&self, prefs: &Preferences) -> Result<(), StoreError> {
        let content = prefs.to_toml()?;
        fs::write(self.config_path(), content)?;
        Ok(())
    }

    // ==================== Presets ====================

    /// List preset names in a category, in directory order, deduplicated.
    pub fn names(&self, category: Direction) -> Result<Vec<String>, StoreError> {
        let mut names = Vec::new();
        let dir = self.presets_dir(category);

        if dir.exists() {
            for entry in fs::read_dir(dir)? {
                let entry = entry?;
                let path = entry.path();
                if path.extension().map(|e| e == "toml").unwrap_or(false) {
                    if let Some(name) = path.file_stem() {
                        let name = name.to_string_lossy().to_string();
                        if !names.contains(&name) {
                            names.push(name);
                        }
                    }
                }
            }
        }

        Ok(names)
    }

    /// Load a preset by name. A missing file yields an empty preset of
    /// that name.
    pub fn load_preset(&self, category: Direction, name: &str) -> Result<Preset, StoreError> {
        let path = self.preset_path(category, name);
        if path.exists() {
            let content = fs::read_to_string(&path)?;
            Ok(Preset::from_toml(&content)?)
        } else {
            Ok(Preset::empty(name))
        }
    }

    /// Save a preset, announcing it when the name is new to the category.
    pub fn save_preset(&self, category: Direction, preset: &Preset) -> Result<(), StoreError> {
        let path = self.preset_path(category, &preset.name);
        let is_new = !path.exists();

        let content = preset.to_toml()?;
        fs::write(path, content)?;
        debug!("Saved {:?} preset '{}'", category, preset.name);

        if is_new {
            self.emit(StoreEvent::PresetCreated(category, preset.name.clone()));
        }
        Ok(())
    }

    /// Delete a preset. Deleting a name that does not exist is a silent
    /// no-op and emits nothing.
    pub fn delete_preset(&self, category: Direction, name: &str) -> Result<(), StoreError> {
        let path = self.preset_path(category, name);
        if path.exists() {
            fs::remove_file(path)?;
            debug!("Deleted {:?} preset '{}'", category, name);
            self.emit(StoreEvent::PresetRemoved(category, name.to_string()));
        }
        Ok(())
    }

    // ==================== Autoload rules ====================

    /// Load the rule set for a direction. A missing file is an empty set.
    pub fn autoload_rules(&self, direction: Direction) -> Result<Vec<AutoloadRule>, StoreError> {
        let path = self.autoload_path(direction);
        if path.exists() {
            let content = fs::read_to_string(&path)?;
            Ok(serde_json::from_str(&content)?)
        } else {
            Ok(Vec::new())
        }
    }

    fn save_autoload_rules(
        &self,
        direction: Direction,
        rules: Vec<AutoloadRule>,
    ) -> Result<(), StoreError> {
        let content = serde_json::to_string_pretty(&rules)?;
        fs::write(self.autoload_path(direction), content)?;
        self.emit(StoreEvent::AutoloadRulesChanged(direction, rules));
        Ok(())
    }

    /// Append a rule record as given. Uniqueness across (device, profile)
    /// pairs is the caller's concern, not the store's.
    pub fn add_autoload(
        &self,
        direction: Direction,
        preset_name: &str,
        device: &str,
        device_profile: &str,
    ) -> Result<(), StoreError> {
        let mut rules = self.autoload_rules(direction)?;
        rules.push(AutoloadRule::new(device, device_profile, preset_name));
        debug!(
            "Adding {:?} autoload rule: device='{}', profile='{}', preset='{}'",
            direction, device, device_profile, preset_name
        );
        self.save_autoload_rules(direction, rules)
    }

    /// Remove the first rule matching the exact triple. Removing an absent
    /// rule is a silent no-op and emits nothing.
    pub fn remove_autoload(
        &self,
        direction: Direction,
        preset_name: &str,
        device: &str,
        device_profile: &str,
    ) -> Result<(), StoreError> {
        let mut rules = self.autoload_rules(direction)?;
        let pos = rules
            .iter()
            .position(|r| r.is_exact(preset_name, device, device_profile));

        match pos {
            Some(pos) => {
                rules.remove(pos);
                debug!(
                    "Removing {:?} autoload rule: device='{}', profile='{}', preset='{}'",
                    direction, device, device_profile, preset_name
                );
                self.save_autoload_rules(direction, rules)
            }
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc::Receiver;
    use tempfile::TempDir;

    fn test_store() -> (PresetStore, Receiver<StoreEvent>, TempDir) {
        let dir = TempDir::new().unwrap();
        let (tx, rx) = mpsc::channel();
        let store = PresetStore::with_root(dir.path(), tx).unwrap();
        (store, rx, dir)
    }

    #[test]
    fn test_fresh_store_is_empty() {
        let (store, _rx, _dir) = test_store();
        assert!(store.names(Direction::Input).unwrap().is_empty());
        assert!(store.names(Direction::Output).unwrap().is_empty());
        assert!(store.autoload_rules(Direction::Input).unwrap().is_empty());
        assert_eq!(store.load_preferences().unwrap(), Preferences::default());
    }

    #[test]
    fn test_save_preset_announces_new_names_once() {
        let (store, rx, _dir) = test_store();
        let preset = Preset::empty("Podcast");

        store.save_preset(Direction::Input, &preset).unwrap();
        match rx.try_recv().unwrap() {
            StoreEvent::PresetCreated(Direction::Input, name) => assert_eq!(name, "Podcast"),
            other => panic!("unexpected event: {:?}", other),
        }

        // Re-saving an existing preset is an update, not a creation.
        store.save_preset(Direction::Input, &preset).unwrap();
        assert!(rx.try_recv().is_err());

        assert_eq!(store.names(Direction::Input).unwrap(), vec!["Podcast"]);
    }

    #[test]
    fn test_preset_names_keep_their_case() {
        let (store, _rx, _dir) = test_store();
        store
            .save_preset(Direction::Output, &Preset::empty("Loud Movie Night"))
            .unwrap();
        assert_eq!(
            store.names(Direction::Output).unwrap(),
            vec!["Loud Movie Night"]
        );
    }

    #[test]
    fn test_delete_preset_announces_and_tolerates_absence() {
        let (store, rx, _dir) = test_store();
        store
            .save_preset(Direction::Output, &Preset::empty("Music"))
            .unwrap();
        let _ = rx.try_recv();

        store.delete_preset(Direction::Output, "Music").unwrap();
        match rx.try_recv().unwrap() {
            StoreEvent::PresetRemoved(Direction::Output, name) => assert_eq!(name, "Music"),
            other => panic!("unexpected event: {:?}", other),
        }

        // Second delete is a no-op with no event.
        store.delete_preset(Direction::Output, "Music").unwrap();
        assert!(rx.try_recv().is_err());
        assert!(store.names(Direction::Output).unwrap().is_empty());
    }

    #[test]
    fn test_categories_are_separate() {
        let (store, _rx, _dir) = test_store();
        store
            .save_preset(Direction::Input, &Preset::empty("Mic Chain"))
            .unwrap();
        assert!(store.names(Direction::Output).unwrap().is_empty());
        assert_eq!(store.names(Direction::Input).unwrap(), vec!["Mic Chain"]);
    }

    #[test]
    fn test_add_autoload_persists_and_announces() {
        let (store, rx, _dir) = test_store();
        store
            .add_autoload(Direction::Input, "Podcast", "USB Mic", "analog-stereo")
            .unwrap();

        match rx.try_recv().unwrap() {
            StoreEvent::AutoloadRulesChanged(Direction::Input, rules) => {
                assert_eq!(rules.len(), 1);
                assert!(rules[0].is_exact("Podcast", "USB Mic", "analog-stereo"));
            }
            other => panic!("unexpected event: {:?}", other),
        }

        let rules = store.autoload_rules(Direction::Input).unwrap();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].preset_name, "Podcast");
    }

    #[test]
    fn test_store_does_not_enforce_rule_uniqueness() {
        let (store, _rx, _dir) = test_store();
        store
            .add_autoload(Direction::Output, "A", "Speakers", "analog-stereo")
            .unwrap();
        store
            .add_autoload(Direction::Output, "B", "Speakers", "analog-stereo")
            .unwrap();
        assert_eq!(store.autoload_rules(Direction::Output).unwrap().len(), 2);
    }

    #[test]
    fn test_remove_autoload_is_exact_and_silent_when_absent() {
        let (store, rx, _dir) = test_store();
        store
            .add_autoload(Direction::Input, "Podcast", "USB Mic", "analog-stereo")
            .unwrap();
        let _ = rx.try_recv();

        // Wrong preset name: no removal, no event.
        store
            .remove_autoload(Direction::Input, "Music", "USB Mic", "analog-stereo")
            .unwrap();
        assert!(rx.try_recv().is_err());
        assert_eq!(store.autoload_rules(Direction::Input).unwrap().len(), 1);

        store
            .remove_autoload(Direction::Input, "Podcast", "USB Mic", "analog-stereo")
            .unwrap();
        match rx.try_recv().unwrap() {
            StoreEvent::AutoloadRulesChanged(Direction::Input, rules) => assert!(rules.is_empty()),
            other => panic!("unexpected event: {:?}", other),
        }
        assert!(store.autoload_rules(Direction::Input).unwrap().is_empty());
    }

    #[test]
    fn test_rules_survive_reopen() {
        let dir = TempDir::new().unwrap();
        {
            let (tx, _rx) = mpsc::channel();
            let store = PresetStore::with_root(dir.path(), tx).unwrap();
            store
                .add_autoload(Direction::Output, "Movie", "HDMI Out", "hdmi-stereo")
                .unwrap();
        }

        let (tx, _rx) = mpsc::channel();
        let store = PresetStore::with_root(dir.path(), tx).unwrap();
        let rules = store.autoload_rules(Direction::Output).unwrap();
        assert_eq!(rules.len(), 1);
        assert!(rules[0].is_exact("Movie", "HDMI Out", "hdmi-stereo"));
    }

    #[test]
    fn test_preferences_round_trip() {
        let (store, _rx, _dir) = test_store();
        let mut prefs = Preferences::default();
        prefs.set_device(crate::Direction::Input, "usb-mic");
        prefs.set_follow_default(crate::Direction::Input, false);

        store.save_preferences(&prefs).unwrap();
        assert_eq!(store.load_preferences().unwrap(), prefs);
    }
}

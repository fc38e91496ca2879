// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Persisted device selection state.

use crate::Direction;
use serde::{Deserialize, Serialize};

/// Which device serves each stream role, and whether the selection tracks
/// the system default.
///
/// Selections are stored as device names, not graph ids: ids are not stable
/// across sessions, names are. A stored name may dangle when the device is
/// unplugged; resolution against the live registry decides what that means.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    /// Selected capture device name, if one was ever chosen.
    pub input_device: Option<String>,
    /// Selected playback device name, if one was ever chosen.
    pub output_device: Option<String>,
    /// Re-point the input selection whenever the system default changes.
    pub follow_default_input: bool,
    /// Re-point the output selection whenever the system default changes.
    pub follow_default_output: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            input_device: None,
            output_device: None,
            follow_default_input: true,
            follow_default_output: true,
        }
    }
}

impl Preferences {
    pub fn device(&self, role: Direction) -> Option<&str> {
        match role {
            Direction::Input => self.input_device.as_deref(),
            Direction::Output => self.output_device.as_deref(),
        }
    }

    pub fn set_device(&mut self, role: Direction, name: impl Into<String>) {
        let slot = match role {
            Direction::Input => &mut self.input_device,
            Direction::Output => &mut self.output_device,
        };
        *slot = Some(name.into());
    }

    pub fn follows_default(&self, role: Direction) -> bool {
        match role {
            Direction::Input => self.follow_default_input,
            Direction::Output => self.follow_default_output,
        }
    }

    pub fn set_follow_default(&mut self, role: Direction, enabled: bool) {
        match role {
            Direction::Input => self.follow_default_input = enabled,
            Direction::Output => self.follow_default_output = enabled,
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_follow_system_default() {
        let prefs = Preferences::default();
        assert_eq!(prefs.device(Direction::Input), None);
        assert_eq!(prefs.device(Direction::Output), None);
        assert!(prefs.follows_default(Direction::Input));
        assert!(prefs.follows_default(Direction::Output));
    }

    #[test]
    fn test_toml_round_trip() {
        let mut prefs = Preferences::default();
        prefs.set_device(Direction::Output, "alsa_output.pci-0000_00_1f.3");
        prefs.set_follow_default(Direction::Output, false);

        let toml = prefs.to_toml().unwrap();
        let loaded = Preferences::from_toml(&toml).unwrap();
        assert_eq!(loaded, prefs);
    }

    #[test]
    fn test_missing_fields_fall_back_to_defaults() {
        let loaded = Preferences::from_toml("input_device = \"usb-mic\"\n").unwrap();
        assert_eq!(loaded.device(Direction::Input), Some("usb-mic"));
        assert_eq!(loaded.device(Direction::Output), None);
        assert!(loaded.follows_default(Direction::Output));
    }
}

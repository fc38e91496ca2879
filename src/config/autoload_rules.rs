// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Autoload rule records tying a device and route profile to a preset.

use serde::{Deserialize, Serialize};

/// A persisted autoload association.
///
/// Rules key on names rather than graph ids because ids are not stable
/// across sessions. The field names on disk are kebab-case, matching the
/// rule files this format descends from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutoloadRule {
    /// Device name the rule applies to.
    pub device: String,
    /// Route profile that must be active, empty when the device-group has
    /// no resolvable route.
    #[serde(rename = "device-profile")]
    pub device_profile: String,
    /// Preset to load when the pair becomes active.
    #[serde(rename = "preset-name")]
    pub preset_name: String,
}

impl AutoloadRule {
    pub fn new(
        device: impl Into<String>,
        device_profile: impl Into<String>,
        preset_name: impl Into<String>,
    ) -> Self {
        Self {
            device: device.into(),
            device_profile: device_profile.into(),
            preset_name: preset_name.into(),
        }
    }

    /// Whether this rule targets the given (device, profile) pair. This is
    /// the uniqueness key: at most one rule per pair may exist.
    pub fn matches_pair(&self, device: &str, device_profile: &str) -> bool {
        self.device == device && self.device_profile == device_profile
    }

    /// Whether this rule equals the given triple exactly.
    pub fn is_exact(&self, preset_name: &str, device: &str, device_profile: &str) -> bool {
        self.preset_name == preset_name && self.matches_pair(device, device_profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches_pair_ignores_preset() {
        let rule = AutoloadRule::new("USB Mic", "analog-stereo", "Podcast");
        assert!(rule.matches_pair("USB Mic", "analog-stereo"));
        assert!(!rule.matches_pair("USB Mic", "iec958-stereo"));
        assert!(!rule.matches_pair("Other Mic", "analog-stereo"));
    }

    #[test]
    fn test_empty_profile_is_a_valid_key() {
        let rule = AutoloadRule::new("Virtual Source", "", "Streaming");
        assert!(rule.matches_pair("Virtual Source", ""));
        assert!(!rule.matches_pair("Virtual Source", "analog-stereo"));
    }

    #[test]
    fn test_exact_match_includes_preset() {
        let rule = AutoloadRule::new("USB Mic", "analog-stereo", "Podcast");
        assert!(rule.is_exact("Podcast", "USB Mic", "analog-stereo"));
        assert!(!rule.is_exact("Music", "USB Mic", "analog-stereo"));
    }

    #[test]
    fn test_json_field_names_are_kebab_case() {
        let rule = AutoloadRule::new("USB Mic", "analog-stereo", "Podcast");
        let json = serde_json::to_string(&rule).unwrap();
        assert!(json.contains("\"device-profile\""));
        assert!(json.contains("\"preset-name\""));
    }

    #[test]
    fn test_parses_existing_rule_file_format() {
        let json = r#"[
            {"device": "USB Mic", "device-profile": "analog-stereo", "preset-name": "Podcast"},
            {"device": "Webcam", "device-profile": "", "preset-name": "Meetings"}
        ]"#;
        let rules: Vec<AutoloadRule> = serde_json::from_str(json).unwrap();
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0].preset_name, "Podcast");
        assert_eq!(rules[1].device_profile, "");
    }
}

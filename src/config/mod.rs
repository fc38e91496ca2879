// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Configuration and persistence for EmberFX.

pub mod autoload_rules;
pub mod preferences;
pub mod preset;
pub mod store;

pub use autoload_rules::AutoloadRule;
pub use preferences::Preferences;
pub use preset::{EffectSlot, Preset};
pub use store::{PresetStore, StoreError, StoreEvent};

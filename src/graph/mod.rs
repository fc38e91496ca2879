// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Graph subsystem - PipeWire integration.

pub mod pipewire_thread;
pub mod types;

pub use pipewire_thread::{GraphError, PipeWireGraph};
pub use types::*;

use crate::Direction;

/// Point-in-time reads against the live graph.
///
/// The backend keeps these tables current on its own thread; reads are
/// synchronous and reflect the state at the moment of the call. Nothing
/// here blocks.
pub trait GraphSnapshot {
    fn current_modules(&self) -> Vec<Module>;

    fn current_clients(&self) -> Vec<Client>;

    /// Active route profile name for a device group in the given
    /// direction, or `None` when the group is unknown or has no route for
    /// that direction.
    fn device_group_route(&self, group_id: u32, direction: Direction) -> Option<String>;
}

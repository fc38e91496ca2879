// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Graph entity definitions for devices, modules, and clients.

use crate::registry::Keyed;
use crate::Direction;

/// Whether a device produces or consumes audio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceKind {
    /// Capture device (microphone, virtual source).
    Source,
    /// Playback device (speakers, headphones, virtual sink).
    Sink,
}

impl DeviceKind {
    /// Parse a media.class property string; non-device classes map to `None`.
    pub fn from_media_class(s: &str) -> Option<Self> {
        match s {
            "Audio/Source" => Some(Self::Source),
            "Audio/Sink" => Some(Self::Sink),
            _ => None,
        }
    }

    pub fn as_media_class(&self) -> &'static str {
        match self {
            Self::Source => "Audio/Source",
            Self::Sink => "Audio/Sink",
        }
    }

    /// The stream role this device serves: sources feed input streams,
    /// sinks serve output streams.
    pub fn direction(&self) -> Direction {
        match self {
            Self::Source => Direction::Input,
            Self::Sink => Direction::Output,
        }
    }
}

/// A live audio device entry.
///
/// The active route profile is deliberately not carried here; it is fetched
/// from the device-group table at the moment it is needed, keyed by
/// `group_id`.
#[derive(Debug, Clone, PartialEq)]
pub struct Device {
    /// Graph object id, stable for the device's lifetime.
    pub id: u32,
    /// Node name, the identity used for persisted selections and rules.
    pub name: String,
    pub description: String,
    /// Device-group id; a physical device may expose several logical
    /// entries sharing one group. Absent on purely virtual nodes.
    pub group_id: Option<u32>,
    pub kind: DeviceKind,
}

impl Device {
    pub fn display_name(&self) -> &str {
        if !self.description.is_empty() {
            &self.description
        } else {
            &self.name
        }
    }
}

impl Keyed for Device {
    type Key = u32;

    fn key(&self) -> &u32 {
        &self.id
    }
}

/// A loaded processing module, read-only diagnostic info.
#[derive(Debug, Clone, PartialEq)]
pub struct Module {
    pub id: u32,
    pub name: String,
    pub description: String,
}

impl Keyed for Module {
    type Key = u32;

    fn key(&self) -> &u32 {
        &self.id
    }
}

/// A connected graph client, read-only diagnostic info.
#[derive(Debug, Clone, PartialEq)]
pub struct Client {
    pub id: u32,
    pub name: String,
    pub api: String,
    pub access: String,
}

impl Keyed for Client {
    type Key = u32;

    fn key(&self) -> &u32 {
        &self.id
    }
}

/// Events sent from the graph backend to the control thread.
#[derive(Debug, Clone)]
pub enum GraphEvent {
    /// Graph connection established.
    Connected,
    /// Graph connection lost.
    Disconnected,
    /// Device appeared in the graph.
    DeviceAdded(Device),
    /// Known device re-announced with refreshed properties.
    DeviceChanged(Device),
    /// Device left the graph.
    DeviceRemoved(Device),
    /// System default capture device changed.
    DefaultInputChanged(Device),
    /// System default playback device changed.
    DefaultOutputChanged(Device),
    /// Backend error.
    Error(String),
}

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Read-only mirrors of the graph's module and client tables.

use crate::graph::{Client, GraphSnapshot, Module};
use crate::registry::Registry;
use tracing::debug;

/// Point-in-time copies of the loaded modules and connected clients.
///
/// Each refresh wholesale-replaces the mirror with the graph's current
/// snapshot, so stale entries never linger and repeated refreshes against
/// an unchanged graph are idempotent.
#[derive(Default)]
pub struct InfoMirrors {
    modules: Registry<Module>,
    clients: Registry<Client>,
}

impl InfoMirrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn refresh_modules(&mut self, graph: &impl GraphSnapshot) {
        let snapshot = graph.current_modules();
        debug!("Refreshing module mirror with {} entries", snapshot.len());
        self.modules.replace_all(snapshot);
    }

    pub fn refresh_clients(&mut self, graph: &impl GraphSnapshot) {
        let snapshot = graph.current_clients();
        debug!("Refreshing client mirror with {} entries", snapshot.len());
        self.clients.replace_all(snapshot);
    }

    pub fn modules(&self) -> &Registry<Module> {
        &self.modules
    }

    pub fn clients(&self) -> &Registry<Client> {
        &self.clients
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Direction;

    struct FakeGraph {
        modules: Vec<Module>,
        clients: Vec<Client>,
    }

    impl GraphSnapshot for FakeGraph {
        fn current_modules(&self) -> Vec<Module> {
            self.modules.clone()
        }

        fn current_clients(&self) -> Vec<Client> {
            self.clients.clone()
        }

        fn device_group_route(&self, _group_id: u32, _direction: Direction) -> Option<String> {
            None
        }
    }

    fn module(id: u32, name: &str, description: &str) -> Module {
        Module {
            id,
            name: name.to_string(),
            description: description.to_string(),
        }
    }

    #[test]
    fn test_refresh_replaces_stale_entries() {
        let mut mirrors = InfoMirrors::new();
        mirrors.modules.replace_all(vec![
            module(1, "echo-cancel", "Echo cancellation"),
            module(2, "loopback", "Loopback"),
        ]);

        let graph = FakeGraph {
            modules: vec![module(5, "limiter", "Dynamic range limiter")],
            clients: Vec::new(),
        };
        mirrors.refresh_modules(&graph);

        let entries: Vec<&Module> = mirrors.modules().iter().collect();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id, 5);
        assert_eq!(entries[0].name, "limiter");
        assert_eq!(entries[0].description, "Dynamic range limiter");
    }

    #[test]
    fn test_refresh_is_idempotent() {
        let graph = FakeGraph {
            modules: vec![module(1, "rt", "Realtime scheduling"), module(2, "portal", "Portal")],
            clients: Vec::new(),
        };

        let mut mirrors = InfoMirrors::new();
        mirrors.refresh_modules(&graph);
        mirrors.refresh_modules(&graph);

        let ids: Vec<u32> = mirrors.modules().iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn test_refresh_clients_preserves_snapshot_order() {
        let graph = FakeGraph {
            modules: Vec::new(),
            clients: vec![
                Client {
                    id: 31,
                    name: "Music Player".to_string(),
                    api: "pipewire-pulse".to_string(),
                    access: "flatpak".to_string(),
                },
                Client {
                    id: 30,
                    name: "Recorder".to_string(),
                    api: "pipewire-rust".to_string(),
                    access: "unrestricted".to_string(),
                },
            ],
        };

        let mut mirrors = InfoMirrors::new();
        mirrors.refresh_clients(&graph);

        let ids: Vec<u32> = mirrors.clients().iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![31, 30]);
    }
}

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! PipeWire thread management and event handling.
//!
//! All PipeWire operations run on a dedicated thread since PipeWire
//! objects are not Send/Sync. Device lifecycle flows out as events over
//! an mpsc channel; module, client, and route tables are kept in shared
//! snapshot storage the control thread reads on demand.

use crate::graph::types::{Client, Device, DeviceKind, GraphEvent, Module};
use crate::graph::GraphSnapshot;
use crate::Direction;
use parking_lot::Mutex;
use pipewire::metadata::{Metadata, MetadataListener};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::{mpsc, Arc};
use std::thread::{self, JoinHandle};
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// Commands sent from the control thread to the PipeWire thread.
#[derive(Debug, Clone)]
pub enum GraphCommand {
    /// Shutdown the PipeWire thread.
    Shutdown,
}

#[derive(Debug, Error)]
pub enum GraphError {
    #[error("PipeWire initialization failed: {0}")]
    InitFailed(String),
    #[error("Failed to connect to PipeWire: {0}")]
    ConnectionFailed(String),
    #[error("PipeWire thread error: {0}")]
    ThreadError(String),
}

/// Tables the control thread snapshots on demand.
#[derive(Default)]
struct SnapshotTables {
    /// Loaded modules in announce order.
    modules: Vec<Module>,
    /// Connected clients in announce order.
    clients: Vec<Client>,
    /// Active route profile per device group and direction.
    routes: HashMap<(u32, Direction), String>,
}

/// The bound default-device metadata object and its listener.
struct BoundMetadata {
    id: u32,
    _proxy: Metadata,
    _listener: MetadataListener,
}

/// State tracked within the PipeWire thread.
struct PwThreadState {
    /// Known audio devices indexed by node ID.
    devices: HashMap<u32, Device>,
    /// Default device names announced before the device itself.
    pending_default_input: Option<String>,
    pending_default_output: Option<String>,
    /// Keeps the metadata proxy and its listener alive.
    metadata: Option<BoundMetadata>,
    event_tx: Rc<mpsc::Sender<GraphEvent>>,
}

impl PwThreadState {
    fn new(event_tx: Rc<mpsc::Sender<GraphEvent>>) -> Self {
        Self {
            devices: HashMap::new(),
            pending_default_input: None,
            pending_default_output: None,
            metadata: None,
            event_tx,
        }
    }

    fn send_default_changed(&self, role: Direction, device: Device) {
        debug!("Default {:?} device: '{}'", role, device.name);
        let event = match role {
            Direction::Input => GraphEvent::DefaultInputChanged(device),
            Direction::Output => GraphEvent::DefaultOutputChanged(device),
        };
        let _ = self.event_tx.send(event);
    }

    /// Resolve a default-device name against the known devices, parking
    /// it until the device is announced when it is not yet known.
    fn apply_default_name(&mut self, role: Direction, name: String) {
        let device = self
            .devices
            .values()
            .find(|d| d.kind.direction() == role && d.name == name)
            .cloned();

        match device {
            Some(device) => {
                self.clear_pending(role);
                self.send_default_changed(role, device);
            }
            None => {
                debug!("Default {:?} '{}' not announced yet, parking", role, name);
                match role {
                    Direction::Input => self.pending_default_input = Some(name),
                    Direction::Output => self.pending_default_output = Some(name),
                }
            }
        }
    }

    fn clear_pending(&mut self, role: Direction) {
        match role {
            Direction::Input => self.pending_default_input = None,
            Direction::Output => self.pending_default_output = None,
        }
    }

    /// Fire a parked default change once its device shows up.
    fn resolve_pending_default(&mut self, device: &Device) {
        let role = device.kind.direction();
        let pending = match role {
            Direction::Input => &mut self.pending_default_input,
            Direction::Output => &mut self.pending_default_output,
        };
        if pending.as_deref() == Some(device.name.as_str()) {
            *pending = None;
            self.send_default_changed(role, device.clone());
        }
    }
}

/// Handle to the PipeWire thread.
///
/// Snapshot reads lock the shared tables briefly; everything else is
/// delivered through the event channel handed to [`PipeWireGraph::spawn`].
pub struct PipeWireGraph {
    /// Channel to send commands to the PipeWire thread.
    cmd_tx: pipewire::channel::Sender<GraphCommand>,
    /// Handle to the spawned thread.
    handle: Option<JoinHandle<()>>,
    tables: Arc<Mutex<SnapshotTables>>,
}

impl PipeWireGraph {
    /// Spawn the PipeWire thread and return a handle.
    pub fn spawn(event_tx: mpsc::Sender<GraphEvent>) -> Result<Self, GraphError> {
        let (cmd_tx, cmd_rx) = pipewire::channel::channel::<GraphCommand>();
        let tables = Arc::new(Mutex::new(SnapshotTables::default()));
        let thread_tables = tables.clone();

        let handle = thread::Builder::new()
            .name("pipewire".to_string())
            .spawn(move || {
                if let Err(e) = run_pipewire_loop(cmd_rx, event_tx.clone(), thread_tables) {
                    error!("PipeWire thread error: {}", e);
                    let _ = event_tx.send(GraphEvent::Error(e.to_string()));
                }
            })
            .map_err(|e| GraphError::ThreadError(e.to_string()))?;

        Ok(Self {
            cmd_tx,
            handle: Some(handle),
            tables,
        })
    }

    /// Request shutdown and wait for the thread to finish.
    pub fn shutdown(mut self) {
        let _ = self.cmd_tx.send(GraphCommand::Shutdown);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl GraphSnapshot for PipeWireGraph {
    fn current_modules(&self) -> Vec<Module> {
        self.tables.lock().modules.clone()
    }

    fn current_clients(&self) -> Vec<Client> {
        self.tables.lock().clients.clone()
    }

    fn device_group_route(&self, group_id: u32, direction: Direction) -> Option<String> {
        self.tables.lock().routes.get(&(group_id, direction)).cloned()
    }
}

impl Drop for PipeWireGraph {
    fn drop(&mut self) {
        let _ = self.cmd_tx.send(GraphCommand::Shutdown);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// Main PipeWire event loop (runs on dedicated thread).
fn run_pipewire_loop(
    cmd_rx: pipewire::channel::Receiver<GraphCommand>,
    event_tx: mpsc::Sender<GraphEvent>,
    tables: Arc<Mutex<SnapshotTables>>,
) -> Result<(), GraphError> {
    pipewire::init();
    info!("PipeWire initialized");

    let main_loop = pipewire::main_loop::MainLoopRc::new(None)
        .map_err(|e| GraphError::InitFailed(e.to_string()))?;

    let context = pipewire::context::ContextRc::new(&main_loop, None)
        .map_err(|e| GraphError::InitFailed(e.to_string()))?;

    let core = context
        .connect_rc(None)
        .map_err(|e| GraphError::ConnectionFailed(e.to_string()))?;

    let registry = core
        .get_registry_rc()
        .map_err(|e| GraphError::ConnectionFailed(e.to_string()))?;

    info!("Connected to PipeWire");
    let _ = event_tx.send(GraphEvent::Connected);

    // Thread-local state
    let event_tx = Rc::new(event_tx);
    let state = Rc::new(RefCell::new(PwThreadState::new(event_tx.clone())));

    // Attach command receiver to main loop
    let main_loop_weak = main_loop.downgrade();
    let _cmd_receiver = cmd_rx.attach(main_loop.loop_(), move |cmd| match cmd {
        GraphCommand::Shutdown => {
            debug!("Received shutdown command");
            if let Some(main_loop) = main_loop_weak.upgrade() {
                main_loop.quit();
            }
        }
    });

    // Watch the registry for devices, modules, clients, and metadata
    let _registry_listener = setup_registry_listener(&registry, state, event_tx.clone(), tables);

    // Run the main loop (blocks until quit)
    main_loop.run();

    info!("PipeWire thread shutting down");
    let _ = event_tx.send(GraphEvent::Disconnected);

    Ok(())
}

/// Extract the device name from a default-metadata JSON value.
fn default_target_name(value: &str) -> Option<String> {
    let parsed: serde_json::Value = serde_json::from_str(value).ok()?;
    parsed
        .get("name")
        .and_then(|name| name.as_str())
        .map(|name| name.to_string())
}

/// Build a device from a node announcement, if it is an audio endpoint.
fn device_from_props(id: u32, props: &libspa::utils::dict::DictRef) -> Option<Device> {
    let kind = DeviceKind::from_media_class(props.get("media.class")?)?;
    let name = props.get("node.name")?.to_string();
    let description = props
        .get("node.description")
        .or_else(|| props.get("node.nick"))
        .unwrap_or("")
        .to_string();
    let group_id = props.get("device.id").and_then(|v| v.parse().ok());

    Some(Device {
        id,
        name,
        description,
        group_id,
        kind,
    })
}

/// Bind the "default" metadata object and watch its default-device keys.
fn bind_default_metadata(
    registry: &pipewire::registry::RegistryRc,
    global: &pipewire::registry::GlobalObject<&libspa::utils::dict::DictRef>,
    state: Rc<RefCell<PwThreadState>>,
) {
    let metadata_id = global.id;
    let proxy: Metadata = match registry.bind(global) {
        Ok(p) => p,
        Err(e) => {
            warn!("Failed to bind metadata {}: {}", metadata_id, e);
            return;
        }
    };

    let state_prop = state.clone();
    let listener = proxy
        .add_listener_local()
        .property(move |_subject, key, _type, value| {
            let role = match key {
                Some("default.audio.source") => Direction::Input,
                Some("default.audio.sink") => Direction::Output,
                _ => return 0,
            };
            match value.and_then(default_target_name) {
                Some(name) => state_prop.borrow_mut().apply_default_name(role, name),
                None => state_prop.borrow_mut().clear_pending(role),
            }
            0
        })
        .register();

    state.borrow_mut().metadata = Some(BoundMetadata {
        id: metadata_id,
        _proxy: proxy,
        _listener: listener,
    });
    debug!("Bound default metadata object {}", metadata_id);
}

/// Set up the registry listener to watch for the objects we track.
fn setup_registry_listener(
    registry: &pipewire::registry::Registry,
    state: Rc<RefCell<PwThreadState>>,
    event_tx: Rc<mpsc::Sender<GraphEvent>>,
    tables: Arc<Mutex<SnapshotTables>>,
) -> pipewire::registry::Listener {
    let state_add = state.clone();
    let state_remove = state;
    let event_tx_add = event_tx.clone();
    let event_tx_remove = event_tx;
    let tables_add = tables.clone();
    let tables_remove = tables;
    let registry_clone = registry.clone();

    registry
        .add_listener_local()
        .global(move |global| {
            use pipewire::types::ObjectType;

            let props = match global.props {
                Some(p) => p,
                None => return,
            };

            match global.type_ {
                ObjectType::Node => {
                    let device = match device_from_props(global.id, props) {
                        Some(d) => d,
                        None => return,
                    };

                    if let (Some(group), Some(profile)) =
                        (device.group_id, props.get("device.profile.name"))
                    {
                        tables_add
                            .lock()
                            .routes
                            .insert((group, device.kind.direction()), profile.to_string());
                    }

                    debug!(
                        "Device announced: id={}, name='{}', kind={:?}",
                        device.id, device.name, device.kind
                    );

                    let mut st = state_add.borrow_mut();
                    let known = st.devices.insert(device.id, device.clone()).is_some();
                    if known {
                        let _ = event_tx_add.send(GraphEvent::DeviceChanged(device));
                    } else {
                        let _ = event_tx_add.send(GraphEvent::DeviceAdded(device.clone()));
                        st.resolve_pending_default(&device);
                    }
                }
                ObjectType::Module => {
                    let module = Module {
                        id: global.id,
                        name: props.get("module.name").unwrap_or("").to_string(),
                        description: props.get("module.description").unwrap_or("").to_string(),
                    };
                    debug!("Module announced: id={}, name='{}'", module.id, module.name);

                    let mut tables = tables_add.lock();
                    match tables.modules.iter().position(|m| m.id == module.id) {
                        Some(pos) => tables.modules[pos] = module,
                        None => tables.modules.push(module),
                    }
                }
                ObjectType::Client => {
                    let client = Client {
                        id: global.id,
                        name: props.get("application.name").unwrap_or("").to_string(),
                        api: props.get("pipewire.client.api").unwrap_or("").to_string(),
                        access: props.get("pipewire.access").unwrap_or("").to_string(),
                    };
                    debug!("Client announced: id={}, name='{}'", client.id, client.name);

                    let mut tables = tables_add.lock();
                    match tables.clients.iter().position(|c| c.id == client.id) {
                        Some(pos) => tables.clients[pos] = client,
                        None => tables.clients.push(client),
                    }
                }
                ObjectType::Metadata => {
                    if props.get("metadata.name") == Some("default") {
                        bind_default_metadata(&registry_clone, global.id, state_add.clone());
                    }
                }
                _ => {}
            }
        })
        .global_remove(move |id| {
            let mut st = state_remove.borrow_mut();

            if st.metadata.as_ref().map(|m| m.id) == Some(id) {
                debug!("Default metadata object removed");
                st.metadata = None;
            }

            if let Some(device) = st.devices.remove(&id) {
                debug!("Device removed: id={}, name='{}'", device.id, device.name);
                if let Some(group) = device.group_id {
                    tables_remove
                        .lock()
                        .routes
                        .remove(&(group, device.kind.direction()));
                }
                let _ = event_tx_remove.send(GraphEvent::DeviceRemoved(device));
            } else {
                let mut tables = tables_remove.lock();
                if let Some(pos) = tables.modules.iter().position(|m| m.id == id) {
                    debug!("Module removed: {}", id);
                    tables.modules.remove(pos);
                } else if let Some(pos) = tables.clients.iter().position(|c| c.id == id) {
                    debug!("Client removed: {}", id);
                    tables.clients.remove(pos);
                }
            }
        })
        .register()
}

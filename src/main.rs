// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! EmberFX - Device-aware preset autoloading service for PipeWire.
//!
//! Watches the audio graph, tracks device selections, and keeps preset
//! autoload rules synchronized with the on-disk store.

use emberfx::{Engine, PipeWireGraph, PresetStore};
use std::sync::mpsc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("emberfx=debug".parse().unwrap()),
        )
        .init();

    info!("EmberFX starting...");

    // Store notifications and graph events both land on the control
    // thread's channels.
    let (store_tx, store_rx) = mpsc::channel();
    let store = PresetStore::new(store_tx)?;
    info!("Preset store at {}", store.config_path().display());

    let (graph_tx, graph_rx) = mpsc::channel();
    let graph = match PipeWireGraph::spawn(graph_tx) {
        Ok(graph) => graph,
        Err(e) => {
            error!("Failed to start PipeWire: {}", e);
            return Err(e.into());
        }
    };

    let mut engine = Engine::new(store, graph, graph_rx, store_rx);
    info!("EmberFX ready");

    // Handle shutdown signals
    let mut sigterm = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())?;
    let mut sigint = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::interrupt())?;

    // Periodic mirror refresh - every ~2 seconds (20 iterations at 100ms
    // each) to catch module and client churn between events.
    let mut refresh_counter = 0u32;

    loop {
        tokio::select! {
            _ = sigterm.recv() => {
                info!("Received SIGTERM, shutting down...");
                break;
            }
            _ = sigint.recv() => {
                info!("Received SIGINT, shutting down...");
                break;
            }
            _ = tokio::time::sleep(tokio::time::Duration::from_millis(100)) => {
                engine.process_events();

                refresh_counter += 1;
                if refresh_counter >= 20 {
                    refresh_counter = 0;
                    engine.refresh_modules();
                    engine.refresh_clients();
                }
            }
        }
    }

    info!("EmberFX stopped");
    Ok(())
}

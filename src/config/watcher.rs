//! Key-map file watcher for hot-reload support

use anyhow::{Context, Result};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use super::KeymapConfig;

/// Editors write in bursts; wait for the file to settle before
/// re-reading it
const RELOAD_DEBOUNCE: Duration = Duration::from_millis(100);

/// Watches the key-map document and sends each successfully reloaded
/// config. A document that no longer parses delivers nothing, so the
/// consumer keeps the table it already has.
pub struct ConfigWatcher {
    _watcher: RecommendedWatcher,
    rx: mpsc::Receiver<KeymapConfig>,
}

impl ConfigWatcher {
    /// Create a new watcher for the specified file, returning it along
    /// with the initially loaded config
    pub async fn new(config_path: String) -> Result<(Self, Arc<KeymapConfig>)> {
        let (tx, rx) = mpsc::channel(10);

        // The initial load is not tolerant: an unreadable document at
        // startup is fatal
        let initial_config = KeymapConfig::load(&config_path)
            .await
            .context("Failed to load initial key map")?;
        let initial_config = Arc::new(initial_config);

        // notify callbacks run on their own OS thread, so grab the
        // runtime handle here to spawn the reload from there
        let runtime_handle = tokio::runtime::Handle::current();
        let watched_path = config_path.clone();

        let mut watcher = notify::recommended_watcher(move |res: Result<Event, notify::Error>| {
            match res {
                Ok(event) if matches!(event.kind, EventKind::Modify(_)) => {
                    debug!("Key-map file modified: {:?}", event.paths);
                    let path = watched_path.clone();
                    let tx = tx.clone();
                    runtime_handle.spawn(async move {
                        tokio::time::sleep(RELOAD_DEBOUNCE).await;
                        Self::reload_and_send(&path, &tx).await;
                    });
                }
                Ok(_) => {}
                Err(e) => error!("Key-map watch error: {}", e),
            }
        })
        .context("Failed to create file watcher")?;

        watcher
            .watch(Path::new(&config_path), RecursiveMode::NonRecursive)
            .with_context(|| format!("Failed to watch key-map file: {}", config_path))?;

        Ok((
            Self {
                _watcher: watcher,
                rx,
            },
            initial_config,
        ))
    }

    /// Re-read the document and deliver it to the consumer if it
    /// still parses; otherwise warn and deliver nothing.
    async fn reload_and_send(path: &str, tx: &mpsc::Sender<KeymapConfig>) {
        match KeymapConfig::load(path).await {
            Ok(new_config) => {
                info!("Key map reloaded: {} entries", new_config.midi_key_map.len());
                if let Err(e) = tx.send(new_config).await {
                    error!("Failed to send key-map update: {}", e);
                }
            }
            Err(e) => warn!("Failed to reload key map (keeping old map): {}", e),
        }
    }

    /// Receive the next successfully reloaded config.
    /// Returns None if the watcher has been closed.
    pub async fn next_config(&mut self) -> Option<KeymapConfig> {
        self.rx.recv().await
    }
}

//! Configuration management
//!
//! Handles loading and hot-reloading of the JSON key-map document.

pub mod watcher;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::fs;

pub use watcher::ConfigWatcher;

/// Key-map document:
/// `{ "midi_key_map": { "C4": "a", ... }, "octave_shift": 0 }`
///
/// A document that is not structurally valid JSON of this shape fails
/// the whole load. Individually bad entries (unparseable note name,
/// unsupported key label) survive deserialization and are skipped
/// later when the binding table is built.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct KeymapConfig {
    #[serde(default)]
    pub midi_key_map: HashMap<String, String>,

    #[serde(default)]
    pub octave_shift: i32,
}

impl KeymapConfig {
    /// Load a key-map document from file
    pub async fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read key-map file: {}", path))?;

        let config: KeymapConfig = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse key-map JSON: {}", path))?;

        Ok(config)
    }
}

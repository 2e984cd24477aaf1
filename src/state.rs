use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use reconcile::ResourceModel;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::resources;

/// Current state file format
const STATE_VERSION: u32 = 1;

// ============================================================================
// State Structures
// ============================================================================

/// Last observed state of every managed resource
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct FabricState {
    pub version: u32,

    /// Observed models keyed by `type.address`
    #[serde(default)]
    pub resources: BTreeMap<String, ResourceModel>,

    /// Last time the state was updated
    pub last_updated: DateTime<Utc>,
}

impl Default for FabricState {
    fn default() -> Self {
        Self {
            version: STATE_VERSION,
            resources: BTreeMap::new(),
            last_updated: Utc::now(),
        }
    }
}

// ============================================================================
// FabricState Implementation
// ============================================================================

impl FabricState {
    /// Load state from disk, or return default if file doesn't exist
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("State file does not exist, using empty state");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read state file: {}", path.display()))?;

        let state: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse state file: {}", path.display()))?;
        if state.version > STATE_VERSION {
            bail!(
                "State file {} has version {}, this build reads up to {STATE_VERSION}",
                path.display(),
                state.version
            );
        }

        log::debug!(
            "Loaded {} resources from {}",
            state.resources.len(),
            path.display()
        );
        Ok(state)
    }

    /// Update the last_updated timestamp and save
    pub fn save(&mut self, path: &Path) -> Result<()> {
        self.last_updated = Utc::now();

        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).with_context(|| {
                format!("Failed to create state directory: {}", dir.display())
            })?;
        }

        let content =
            serde_json::to_string_pretty(&self).context("Failed to serialize state to JSON")?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write state file: {}", path.display()))?;

        log::debug!("Saved state to {}", path.display());
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&ResourceModel> {
        self.resources.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, model: ResourceModel) {
        self.resources.insert(key.into(), model);
    }

    pub fn remove(&mut self, key: &str) -> Option<ResourceModel> {
        self.resources.remove(key)
    }

    /// Keys of resources nested under the resource at `key`
    pub fn dependents(&self, key: &str) -> Vec<String> {
        let Some(prefix) = self
            .get(key)
            .and_then(composite_id)
            .map(|id| format!("{id}/"))
        else {
            return Vec::new();
        };
        self.resources
            .iter()
            .filter(|(k, m)| *k != key && composite_id(m).is_some_and(|id| id.starts_with(&prefix)))
            .map(|(k, _)| k.clone())
            .collect()
    }
}

fn composite_id(model: &ResourceModel) -> Option<&str> {
    model.id(resources::descriptor(&model.resource_type)?)
}

use anyhow::{Context, Result, bail};
use fabric_client::{ClientConfig, RetryConfig};
use reconcile::{Attr, ResourceDescriptor, ResourceModel};
use serde::Deserialize;
use serde_json::Value as Json;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::commands::validate_address;
use crate::resources;
use crate::state::FabricState;

/// Get the config directory path (~/.config/hyperfab)
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home.join(".config").join("hyperfab"))
}

// ============================================================================
// Provider Config
// ============================================================================

/// Controller connection settings from `config.toml`
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderConfig {
    pub endpoint: Option<String>,
    pub token: Option<String>,
    /// File holding the token, `~` is expanded
    pub token_file: Option<String>,
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub retry: RetrySettings,
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RetrySettings {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub backoff_factor: f64,
    pub max_delay_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        let defaults = RetryConfig::default();
        Self {
            max_attempts: defaults.max_attempts,
            base_delay_ms: defaults.base_delay.as_millis() as u64,
            backoff_factor: defaults.backoff_factor,
            max_delay_ms: defaults.max_delay.as_millis() as u64,
        }
    }
}

impl From<&RetrySettings> for RetryConfig {
    fn from(settings: &RetrySettings) -> Self {
        Self {
            max_attempts: settings.max_attempts.max(1),
            base_delay: Duration::from_millis(settings.base_delay_ms),
            backoff_factor: settings.backoff_factor,
            max_delay: Duration::from_millis(settings.max_delay_ms),
        }
    }
}

impl ProviderConfig {
    /// Load `~/.config/hyperfab/config.toml`, or defaults if it doesn't exist
    pub fn load() -> Result<Self> {
        Self::load_from(&config_dir()?.join("config.toml"))
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("No provider config at {}", path.display());
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Could not read {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("Invalid config: {}", path.display()))
    }

    /// Combine with command-line overrides into client settings.
    ///
    /// Flags and environment variables win over the file; an inline token
    /// wins over `token_file`.
    pub fn resolve(&self, endpoint: Option<&str>, token: Option<&str>) -> Result<ClientConfig> {
        let endpoint = endpoint
            .or(self.endpoint.as_deref())
            .context("No controller endpoint (use --endpoint, HYPERFAB_ENDPOINT or config.toml)")?;

        let token = match token.or(self.token.as_deref()) {
            Some(token) => token.to_string(),
            None => {
                let file = self
                    .token_file
                    .as_deref()
                    .context("No API token (use --token, HYPERFAB_TOKEN or config.toml)")?;
                let path = PathBuf::from(shellexpand::tilde(file).as_ref());
                fs::read_to_string(&path)
                    .with_context(|| format!("Could not read token file {}", path.display()))?
                    .trim()
                    .to_string()
            }
        };

        let mut config = ClientConfig::new(endpoint, token).retry(RetryConfig::from(&self.retry));
        if let Some(secs) = self.timeout_secs {
            config = config.timeout(Duration::from_secs(secs));
        }
        Ok(config)
    }
}

// ============================================================================
// Declared Config
// ============================================================================

/// Desired resources, as declared in `hyperfab.toml`
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeclaredConfig {
    #[serde(default, rename = "resource")]
    pub resources: Vec<DeclaredResource>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeclaredResource {
    #[serde(rename = "type")]
    pub resource_type: String,
    pub address: String,
    #[serde(default)]
    pub attributes: toml::Table,
}

impl DeclaredConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Could not read {}", path.display()))?;
        let config: Self =
            toml::from_str(&content).with_context(|| format!("Invalid {}", path.display()))?;
        config.validate()?;
        log::debug!("Loaded {} resources from {}", config.resources.len(), path.display());
        Ok(config)
    }

    /// Check types, addresses and references
    pub fn validate(&self) -> Result<()> {
        let mut seen = BTreeSet::new();
        for resource in &self.resources {
            resource.descriptor()?;
            validate_address(&resource.address)?;
            if !seen.insert(resource.key()) {
                bail!("Duplicate resource {}", resource.key());
            }
        }

        for resource in &self.resources {
            for (name, value) in &resource.attributes {
                let Some(target) = value.as_str().and_then(reference) else {
                    continue;
                };
                let (key, _) = parse_reference(target)?;
                if !seen.contains(&key) {
                    bail!(
                        "{}.{name} refers to undeclared resource {key}",
                        resource.key()
                    );
                }
            }
        }
        Ok(())
    }

    pub fn find(&self, key: &str) -> Option<&DeclaredResource> {
        self.resources.iter().find(|r| r.key() == key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.find(key).is_some()
    }

    /// Resources parents first, declaration order within a kind
    pub fn ordered(&self) -> Vec<&DeclaredResource> {
        let mut ordered: Vec<_> = self.resources.iter().collect();
        ordered.sort_by_key(|r| resources::rank(&r.resource_type));
        ordered
    }
}

impl DeclaredResource {
    /// State key, `type.address`
    pub fn key(&self) -> String {
        format!("{}.{}", self.resource_type, self.address)
    }

    pub fn descriptor(&self) -> Result<&'static ResourceDescriptor> {
        resources::descriptor(&self.resource_type).with_context(|| {
            format!(
                "Unknown resource type {:?} (expected one of: {})",
                self.resource_type,
                resources::type_names().join(", ")
            )
        })
    }

    /// Desired model with references resolved against `state`.
    ///
    /// A reference to something not applied yet becomes `Unknown`.
    /// Desired model with references resolved against state.
    ///
    /// References to resources in `replacing` are left unknown: their
    /// values change once the replacement is applied.
    pub fn to_model(
        &self,
        state: &FabricState,
        replacing: &BTreeSet<String>,
    ) -> Result<ResourceModel> {
        let desc = self.descriptor()?;
        let mut declared = match serde_json::to_value(&self.attributes)? {
            Json::Object(map) => map,
            _ => serde_json::Map::new(),
        };

        let mut pending = Vec::new();
        for (name, value) in &mut declared {
            let Some(target) = value.as_str().and_then(reference).map(str::to_string) else {
                continue;
            };
            let (key, _) = parse_reference(&target)?;
            let resolved = if replacing.contains(&key) {
                None
            } else {
                resolve_reference(&target, state)?
            };
            match resolved {
                Some(resolved) => *value = resolved,
                None => {
                    log::debug!("{}.{name}: {target} not known until apply", self.key());
                    *value = Json::Null;
                    pending.push(name.clone());
                }
            }
        }

        let mut model = ResourceModel::from_declared(desc, &declared)
            .with_context(|| format!("Invalid attributes for {}", self.key()))?;
        for name in pending {
            model.set(&name, Attr::Unknown);
        }
        Ok(model)
    }
}

// ============================================================================
// References
// ============================================================================

/// Inner text of a `${type.address.attribute}` reference
fn reference(value: &str) -> Option<&str> {
    value.strip_prefix("${")?.strip_suffix('}')
}

/// Split `type.address.attribute` into state key and attribute
fn parse_reference(target: &str) -> Result<(String, String)> {
    let (key, attribute) = target
        .rsplit_once('.')
        .filter(|(key, attr)| key.contains('.') && !attr.is_empty())
        .with_context(|| format!("Invalid reference ${{{target}}}"))?;
    let (type_name, _) = key.split_once('.').unwrap_or((key, ""));
    let desc = resources::descriptor(type_name)
        .with_context(|| format!("Unknown resource type in ${{{target}}}"))?;
    if desc.attribute(attribute).is_none() {
        bail!("{type_name} has no attribute {attribute:?} (in ${{{target}}})");
    }
    Ok((key.to_string(), attribute.to_string()))
}

/// Current value of the referenced attribute, if it is known
fn resolve_reference(target: &str, state: &FabricState) -> Result<Option<Json>> {
    let (key, attribute) = parse_reference(target)?;
    let Some(model) = state.get(&key) else {
        return Ok(None);
    };
    let desc = resources::descriptor(&model.resource_type)
        .with_context(|| format!("State entry {key} has unknown type"))?;
    let kind = desc
        .attribute(&attribute)
        .map(|a| a.kind)
        .with_context(|| format!("{key} has no attribute {attribute:?}"))?;
    Ok(model
        .get(&attribute)
        .known()
        .map(|value| reconcile::encode(kind, value)))
}

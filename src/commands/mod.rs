//! Command implementations
//!
//! - `plan` - Preview what apply would change
//! - `apply` - Make the fabric match the declared configuration
//! - `refresh` - Re-read every managed resource into state
//! - `import` - Adopt an existing remote resource
//! - `show` - Inspect state
//! - `destroy` - Delete a managed resource

pub mod apply;
pub mod destroy;
pub mod import;
pub mod plan;
pub mod refresh;
pub mod show;

use anyhow::{Context as AnyhowContext, Result, bail};
use reconcile::{Plan, PlanSummary, ResourceDescriptor, ResourceModel};

use crate::resources;

/// What apply will do with one resource
#[derive(Debug)]
pub enum Change {
    /// Declared resource: create, update, replace or leave alone
    Apply(Plan),
    /// In state but no longer declared
    Delete(ResourceModel),
}

/// A planned change for one state key
#[derive(Debug)]
pub struct PlannedChange {
    pub key: String,
    pub descriptor: &'static ResourceDescriptor,
    /// Last observed model, if the resource is managed already
    pub prior: Option<ResourceModel>,
    pub change: Change,
}

impl PlannedChange {
    pub fn is_change(&self) -> bool {
        match &self.change {
            Change::Apply(plan) => plan.is_change(),
            Change::Delete(_) => true,
        }
    }

    /// Verb for progress and error messages
    pub fn verb(&self) -> String {
        match &self.change {
            Change::Apply(plan) => plan.action.to_string(),
            Change::Delete(_) => "delete".to_string(),
        }
    }
}

/// Tally planned changes
pub fn summarize(changes: &[PlannedChange]) -> PlanSummary {
    let mut summary = PlanSummary::default();
    for change in changes {
        match &change.change {
            Change::Apply(plan) => summary.add(plan.action),
            Change::Delete(_) => summary.add_delete(),
        }
    }
    summary
}

/// Parse a `type.address` target
pub fn parse_target(target: &str) -> Result<(&'static ResourceDescriptor, &str)> {
    let (type_name, address) = target
        .split_once('.')
        .with_context(|| format!("Invalid target '{target}'. Use format: type.address"))?;
    let descriptor = resources::descriptor(type_name).with_context(|| {
        format!(
            "Unknown resource type '{type_name}'. Valid types: {}",
            resources::type_names().join(", ")
        )
    })?;
    validate_address(address)?;
    Ok((descriptor, address))
}

/// Addresses are single words: no dots, slashes or whitespace
pub fn validate_address(address: &str) -> Result<()> {
    if address.is_empty()
        || address.contains(['.', '/'])
        || address.chars().any(char::is_whitespace)
    {
        bail!("Invalid address {address:?}");
    }
    Ok(())
}

/// Descriptor of a model loaded from state
pub fn state_descriptor(key: &str, model: &ResourceModel) -> Result<&'static ResourceDescriptor> {
    resources::descriptor(&model.resource_type)
        .with_context(|| format!("State entry {key} has unknown type {:?}", model.resource_type))
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_target() {
        let (desc, address) = parse_target("node_breakout.uplinks").unwrap();
        assert_eq!(desc.type_name, "node_breakout");
        assert_eq!(address, "uplinks");

        assert!(parse_target("uplinks").is_err());
        assert!(parse_target("interface.e1").is_err());
        assert!(parse_target("node.a/b").is_err());
        assert!(parse_target("node.").is_err());
    }

    #[test]
    fn test_validate_address() {
        assert!(validate_address("leaf-1_a").is_ok());
        assert!(validate_address("leaf 1").is_err());
        assert!(validate_address("").is_err());
    }
}

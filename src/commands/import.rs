//! `hyperfab import` - adopt an existing remote resource into state

use anyhow::{Context as AnyhowContext, Result, bail};
use reconcile::{Collaborator, Engine};

use super::validate_address;
use crate::Context;
use crate::resources;
use crate::state::FabricState;
use crate::ui;

pub fn run(ctx: &Context, resource_type: &str, address: &str, path: &str) -> Result<()> {
    let mut state = ctx.load_state()?;
    let client = ctx.client()?;

    let key = import_into(&client, &mut state, resource_type, address, path)?;
    state.save(&ctx.state_file)?;

    ui::success(&format!("Imported {path} as {key}"));
    if let Some(model) = state.get(&key) {
        ui::display_model(&key, model);
    }
    if !ctx.config_file.exists() || !ctx.load_config()?.contains(&key) {
        println!();
        ui::dim(&format!(
            "{key} is not declared in {}; the next apply will delete it",
            ctx.config_file.display()
        ));
    }
    Ok(())
}

/// Import `path` (id- or name-based) and record it under `type.address`
pub fn import_into(
    collaborator: &dyn Collaborator,
    state: &mut FabricState,
    resource_type: &str,
    address: &str,
    path: &str,
) -> Result<String> {
    let descriptor = resources::descriptor(resource_type).with_context(|| {
        format!(
            "Unknown resource type '{resource_type}'. Valid types: {}",
            resources::type_names().join(", ")
        )
    })?;
    validate_address(address)?;
    let key = format!("{resource_type}.{address}");
    if state.get(&key).is_some() {
        bail!("{key} is already in state");
    }

    let outcome = Engine::new(collaborator, descriptor)
        .import(path)
        .with_context(|| format!("Failed to import {path}"))?;
    for err in &outcome.errors {
        ui::warn(&format!("{key}: {err}"));
    }

    if let Some(id) = outcome.model.id(descriptor)
        && let Some((other, _)) = state
            .resources
            .iter()
            .find(|(_, m)| m.resource_type == resource_type && m.id(descriptor) == Some(id))
    {
        bail!("{id} is already managed as {other}");
    }

    state.insert(key.clone(), outcome.model);
    Ok(key)
}

//! `hyperfab show` - inspect state

use anyhow::{Context as AnyhowContext, Result};

use super::parse_target;
use crate::Context;
use crate::state::FabricState;
use crate::ui;

pub fn run(ctx: &Context, address: Option<&str>) -> Result<()> {
    let state = ctx.load_state()?;

    if let Some(key) = address {
        parse_target(key)?;
        let model = state
            .get(key)
            .with_context(|| format!("{key} is not in state"))?;
        ui::display_model(key, model);
        return Ok(());
    }

    if state.resources.is_empty() {
        ui::info("No resources in state");
        return Ok(());
    }

    ui::header(&format!("Managed resources ({})", state.resources.len()));
    for (key, id) in listing(&state) {
        ui::kv(&key, &id);
    }
    println!();
    ui::dim(&format!(
        "State: {} (updated {})",
        ctx.state_file.display(),
        state.last_updated.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    Ok(())
}

/// `(key, composite id)` for every state entry
pub fn listing(state: &FabricState) -> Vec<(String, String)> {
    state
        .resources
        .iter()
        .map(|(key, model)| {
            let id = super::state_descriptor(key, model)
                .ok()
                .and_then(|desc| model.id(desc))
                .unwrap_or("(unknown id)");
            (key.clone(), id.to_string())
        })
        .collect()
}

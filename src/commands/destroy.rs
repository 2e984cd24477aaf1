//! `hyperfab destroy` - delete a managed resource

use anyhow::{Context as AnyhowContext, Result, bail};
use reconcile::{Collaborator, Engine, ResourceModel};

use super::{parse_target, state_descriptor};
use crate::Context;
use crate::state::FabricState;
use crate::ui;

pub fn run(ctx: &Context, address: &str, dry_run: bool) -> Result<()> {
    parse_target(address)?;
    let mut state = ctx.load_state()?;
    check_destroyable(&state, address)?;

    if dry_run {
        let id = state
            .get(address)
            .and_then(|m| m.id(state_descriptor(address, m).ok()?))
            .unwrap_or("(unknown id)");
        ui::info(&format!("Would destroy {address} ({id})"));
        return Ok(());
    }

    let client = ctx.client()?;
    let model = destroy_in(&client, &mut state, address)?;
    state.save(&ctx.state_file)?;

    let descriptor = state_descriptor(address, &model)?;
    ui::success(&format!(
        "Destroyed {address} ({})",
        model.id(descriptor).unwrap_or("(unknown id)")
    ));
    if ctx.config_file.exists() && ctx.load_config()?.contains(address) {
        ui::warn(&format!(
            "{address} is still declared in {}; the next apply will create it again",
            ctx.config_file.display()
        ));
    }
    Ok(())
}

fn check_destroyable(state: &FabricState, key: &str) -> Result<()> {
    if state.get(key).is_none() {
        bail!("{key} is not in state");
    }
    let dependents = state.dependents(key);
    if !dependents.is_empty() {
        bail!(
            "{key} still has dependents in state: {}. Destroy them first",
            dependents.join(", ")
        );
    }
    Ok(())
}

/// Delete the resource at `key` remotely and drop it from state
pub fn destroy_in(
    collaborator: &dyn Collaborator,
    state: &mut FabricState,
    key: &str,
) -> Result<ResourceModel> {
    check_destroyable(state, key)?;
    let model = state
        .get(key)
        .with_context(|| format!("{key} is not in state"))?;
    let descriptor = state_descriptor(key, model)?;

    Engine::new(collaborator, descriptor)
        .delete(model)
        .with_context(|| format!("Failed to destroy {key}"))?;
    state
        .remove(key)
        .with_context(|| format!("{key} is not in state"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing;
    use crate::commands::import::import_into;
    use fabric_client::MockBackend;
    use serde_json::json;

    fn setup() -> (MockBackend, FabricState) {
        let mock = MockBackend::new();
        mock.insert("fabrics/F1", json!({"id": "F1", "name": "fab-a"}));
        mock.insert("fabrics/F1/vrfs/V1", json!({"id": "V1", "fabricId": "F1", "name": "blue"}));
        let client = testing::client(&mock);
        let mut state = FabricState::default();
        import_into(&client, &mut state, "fabric", "main", "F1").unwrap();
        import_into(&client, &mut state, "vrf", "blue", "F1/vrfs/V1").unwrap();
        (mock, state)
    }

    #[test]
    fn test_destroy_refuses_parent_with_dependents() {
        let (mock, mut state) = setup();
        let err = destroy_in(&testing::client(&mock), &mut state, "fabric.main").unwrap_err();
        assert!(err.to_string().contains("dependents in state: vrf.blue"));
        assert!(mock.object("fabrics/F1").is_some());
    }

    #[test]
    fn test_destroy_child_then_parent() {
        let (mock, mut state) = setup();
        let client = testing::client(&mock);

        let vrf = destroy_in(&client, &mut state, "vrf.blue").unwrap();
        assert_eq!(vrf.get_str("vrf_id"), Some("V1"));
        assert!(mock.object("fabrics/F1/vrfs/V1").is_none());

        destroy_in(&client, &mut state, "fabric.main").unwrap();
        assert!(state.resources.is_empty());
        assert!(
            mock.requests()
                .contains(&"DELETE /api/v1/fabrics/F1".to_string())
        );
    }

    #[test]
    fn test_destroy_already_gone_remotely() {
        let (mock, mut state) = setup();
        let client = testing::client(&mock);
        destroy_in(&client, &mut state, "vrf.blue").unwrap();
        // Removed behind our back; a 404 on delete is fine
        state.insert("vrf.blue", ResourceModel::blank(&crate::resources::VRF));
        state
            .resources
            .get_mut("vrf.blue")
            .unwrap()
            .set_str("id", "F1/vrfs/V1");
        destroy_in(&client, &mut state, "vrf.blue").unwrap();
        assert!(state.get("vrf.blue").is_none());
    }

    #[test]
    fn test_destroy_unknown_key() {
        let (mock, mut state) = setup();
        let err = destroy_in(&testing::client(&mock), &mut state, "vrf.red").unwrap_err();
        assert!(err.to_string().contains("not in state"));
    }
}

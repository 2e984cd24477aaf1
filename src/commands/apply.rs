//! `hyperfab apply` - make the fabric match the declared configuration

use anyhow::{Context as AnyhowContext, Result};
use reconcile::{Action, Collaborator, Engine, MergeOutcome, PlanSummary};
use std::collections::BTreeSet;
use std::path::Path;

use super::plan::{compute, plan_one};
use super::refresh::{Refreshed, refresh_one};
use super::{Change, PlannedChange, summarize};
use crate::Context;
use crate::config::DeclaredConfig;
use crate::state::FabricState;
use crate::ui;

/// Options for apply
#[derive(Debug, Clone, Default)]
pub struct ApplyOptions {
    /// Only touch this `type.address`
    pub target: Option<String>,
    /// Don't make changes, just show what would happen
    pub dry_run: bool,
}

pub fn run(ctx: &Context, opts: &ApplyOptions) -> Result<()> {
    let config = ctx.load_config()?;
    let mut state = ctx.load_state()?;
    let client = ctx.client()?;

    let summary = execute(&client, &config, &mut state, &ctx.state_file, opts)?;
    if summary.has_changes() && !opts.dry_run {
        println!();
        ui::success(&format!(
            "Apply complete: {} created, {} updated, {} replaced, {} deleted",
            summary.creates, summary.updates, summary.replaces, summary.deletes
        ));
    }
    Ok(())
}

/// Refresh, plan and apply, saving state after every change.
///
/// Stops at the first failure; whatever was applied before it stays
/// recorded in state.
pub fn execute(
    collaborator: &dyn Collaborator,
    config: &DeclaredConfig,
    state: &mut FabricState,
    state_path: &Path,
    opts: &ApplyOptions,
) -> Result<PlanSummary> {
    refresh_selected(collaborator, config, state, opts.target.as_deref())?;

    let changes = compute(config, state, opts.target.as_deref())?;
    let planned = summarize(&changes);
    ui::display_plan(&changes, &planned);

    if !planned.has_changes() {
        return Ok(PlanSummary::default());
    }
    if opts.dry_run {
        println!();
        ui::info("Dry run, no changes made");
        return Ok(planned);
    }

    println!();
    let total = planned.total();
    let mut applied = PlanSummary::default();
    for (index, change) in changes.iter().filter(|c| c.is_change()).enumerate() {
        ui::step(index + 1, total, &format!("{} {}", change.verb(), change.key));
        let done = apply_change(collaborator, config, state, change)
            .with_context(|| format!("Failed to {} {}", change.verb(), change.key));
        // Keep whatever succeeded so far
        state.save(state_path)?;
        match done? {
            Some(action) => applied.add(action),
            None => applied.add_delete(),
        }
    }
    Ok(applied)
}

/// Re-read the prior state of everything apply may touch
fn refresh_selected(
    collaborator: &dyn Collaborator,
    config: &DeclaredConfig,
    state: &mut FabricState,
    target: Option<&str>,
) -> Result<()> {
    let keys: Vec<String> = state
        .resources
        .keys()
        .filter(|key| target.is_none_or(|t| t == key.as_str()))
        .cloned()
        .collect();

    for key in keys {
        let Some(prior) = state.get(&key) else {
            continue;
        };
        match refresh_one(collaborator, &key, prior)? {
            Refreshed::Present(outcome) => {
                report_degraded(&key, &outcome);
                state.insert(key, outcome.model);
            }
            Refreshed::Gone => {
                if config.contains(&key) {
                    ui::warn(&format!("{key} no longer exists remotely, it will be created"));
                } else {
                    log::info!("{key} is already gone remotely");
                }
                state.remove(&key);
            }
        }
    }
    Ok(())
}

/// Apply one planned change; `None` means a delete
fn apply_change(
    collaborator: &dyn Collaborator,
    config: &DeclaredConfig,
    state: &mut FabricState,
    change: &PlannedChange,
) -> Result<Option<Action>> {
    let engine = Engine::new(collaborator, change.descriptor);
    let key = &change.key;

    let declared = match &change.change {
        Change::Delete(model) => {
            engine.delete(model)?;
            state.remove(key);
            return Ok(None);
        }
        Change::Apply(_) => config
            .find(key)
            .with_context(|| format!("{key} is not declared"))?,
    };

    // Plan again: references to resources applied earlier in this run are known now
    let fresh = plan_one(declared, state, &BTreeSet::new())?;
    let Change::Apply(plan) = fresh.change else {
        return Ok(None);
    };

    let outcome = match plan.action {
        Action::NoOp => return Ok(Some(Action::NoOp)),
        Action::Create => engine.create(&plan.model)?,
        Action::Update => engine.update(&plan.model)?,
        Action::Replace => {
            if let Some(prior) = &fresh.prior {
                engine.delete(prior)?;
            }
            state.remove(key);
            let desired = declared.to_model(state, &BTreeSet::new())?;
            let recreate = reconcile::plan(change.descriptor, &desired, None)?;
            engine.create(&recreate.model)?
        }
    };

    report_degraded(key, &outcome);
    if let Some(id) = outcome.model.id(change.descriptor) {
        ui::dim(id);
    }
    state.insert(key.clone(), outcome.model);
    Ok(Some(plan.action))
}

fn report_degraded(key: &str, outcome: &MergeOutcome) {
    for err in &outcome.errors {
        ui::warn(&format!("{key}: {err}"));
    }
}

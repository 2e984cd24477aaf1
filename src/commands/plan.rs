//! `hyperfab plan` - preview changes without touching the fabric

use anyhow::{Context as AnyhowContext, Result, bail};
use reconcile::Action;
use std::cmp::Reverse;
use std::collections::BTreeSet;

use super::{Change, PlannedChange, state_descriptor, summarize};
use crate::Context;
use crate::config::{DeclaredConfig, DeclaredResource};
use crate::resources;
use crate::state::FabricState;
use crate::ui;

pub fn run(ctx: &Context, target: Option<&str>) -> Result<()> {
    let config = ctx.load_config()?;
    let state = ctx.load_state()?;

    let changes = compute(&config, &state, target)?;
    let summary = summarize(&changes);
    ui::display_plan(&changes, &summary);

    if ctx.verbose > 0 {
        for change in changes.iter().filter(|c| !c.is_change()) {
            ui::dim(&format!("{} is up to date", change.key));
        }
    }
    if summary.has_changes() && !ctx.quiet {
        println!();
        ui::dim("Plan is based on the last refreshed state. Run 'hyperfab apply' to execute.");
    }
    Ok(())
}

/// Plan every declared resource, then every orphan in state.
///
/// Declared resources come parents first; orphans children first so they
/// can be deleted in order. A resource referring to one that will be
/// replaced is planned against an unknown value, so it is replaced too.
pub fn compute(
    config: &DeclaredConfig,
    state: &FabricState,
    target: Option<&str>,
) -> Result<Vec<PlannedChange>> {
    if let Some(target) = target {
        super::parse_target(target)?;
        if !config.contains(target) && state.get(target).is_none() {
            bail!("{target} is neither declared nor in state");
        }
    }
    let selected = |key: &str| target.is_none_or(|t| t == key);

    let mut changes = Vec::new();
    let mut replacing = BTreeSet::new();
    for declared in config.ordered() {
        if !selected(&declared.key()) {
            continue;
        }
        let change = plan_one(declared, state, &replacing)?;
        if matches!(&change.change, Change::Apply(p) if p.action == Action::Replace) {
            replacing.insert(change.key.clone());
        }
        changes.push(change);
    }

    let mut orphans: Vec<_> = state
        .resources
        .iter()
        .filter(|(key, _)| !config.contains(key) && selected(key))
        .collect();
    orphans.sort_by_key(|(_, model)| Reverse(resources::rank(&model.resource_type)));
    for (key, model) in orphans {
        changes.push(PlannedChange {
            key: key.clone(),
            descriptor: state_descriptor(key, model)?,
            prior: Some(model.clone()),
            change: Change::Delete(model.clone()),
        });
    }
    Ok(changes)
}

/// Plan a single declared resource against its state entry
pub fn plan_one(
    declared: &DeclaredResource,
    state: &FabricState,
    replacing: &BTreeSet<String>,
) -> Result<PlannedChange> {
    let key = declared.key();
    let descriptor = declared.descriptor()?;
    let desired = declared.to_model(state, replacing)?;
    let prior = state.get(&key).cloned();

    let plan = reconcile::plan(descriptor, &desired, prior.as_ref())
        .with_context(|| format!("Failed to plan {key}"))?;
    log::debug!("{key}: {} ({} changed)", plan.action, plan.changed.len());
    Ok(PlannedChange {
        key,
        descriptor,
        prior,
        change: Change::Apply(plan),
    })
}

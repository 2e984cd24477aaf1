//! `hyperfab refresh` - re-read every managed resource into state

use anyhow::{Context as AnyhowContext, Result, bail};
use colored::Colorize;
use rayon::prelude::*;
use reconcile::{Collaborator, Engine, MergeOutcome, ResourceModel};

use super::state_descriptor;
use crate::Context;
use crate::state::FabricState;
use crate::ui;

/// Result of reading one managed resource
#[derive(Debug)]
pub enum Refreshed {
    Present(MergeOutcome),
    /// The controller no longer has it
    Gone,
}

/// What a refresh changed in state
#[derive(Debug, Default)]
pub struct RefreshReport {
    pub updated: Vec<String>,
    pub unchanged: usize,
    pub gone: Vec<String>,
    /// Resources read with attribute-level errors
    pub degraded: Vec<(String, Vec<String>)>,
    pub failed: Vec<(String, String)>,
}

pub fn run(ctx: &Context, jobs: usize) -> Result<()> {
    let mut state = ctx.load_state()?;
    if state.resources.is_empty() {
        ui::info("No resources in state, nothing to refresh");
        return Ok(());
    }
    let client = ctx.client()?;

    ui::header(&format!("Refreshing {} resources", state.resources.len()));
    let report = refresh_all(&client, &mut state, jobs)?;
    state.save(&ctx.state_file)?;

    for key in &report.updated {
        println!("  {} {key}", "~".yellow());
    }
    for key in &report.gone {
        ui::warn(&format!("{key} no longer exists, removed from state"));
    }
    for (key, errors) in &report.degraded {
        for err in errors {
            ui::warn(&format!("{key}: {err}"));
        }
    }
    for (key, err) in &report.failed {
        ui::error(&format!("{key}: {err}"));
    }

    println!();
    if !report.failed.is_empty() {
        bail!("{} of the resources could not be refreshed", report.failed.len());
    }
    ui::success(&format!(
        "Refreshed: {} updated, {} unchanged, {} gone",
        report.updated.len(),
        report.unchanged,
        report.gone.len()
    ));
    Ok(())
}

/// Read one state entry from the controller
pub fn refresh_one(
    collaborator: &dyn Collaborator,
    key: &str,
    model: &ResourceModel,
) -> Result<Refreshed> {
    let descriptor = state_descriptor(key, model)?;
    let outcome = Engine::new(collaborator, descriptor)
        .read(model)
        .with_context(|| format!("Failed to read {key}"))?;
    if outcome.is_gone(descriptor) {
        return Ok(Refreshed::Gone);
    }
    Ok(Refreshed::Present(outcome))
}

/// Read every state entry in parallel and fold the results into state.
///
/// Failed reads leave their entry untouched.
pub fn refresh_all(
    collaborator: &dyn Collaborator,
    state: &mut FabricState,
    jobs: usize,
) -> Result<RefreshReport> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(jobs)
        .build()
        .context("Failed to create thread pool")?;

    let results: Vec<(String, Result<Refreshed>)> = pool.install(|| {
        state
            .resources
            .par_iter()
            .map(|(key, model)| (key.clone(), refresh_one(collaborator, key, model)))
            .collect()
    });

    let mut report = RefreshReport::default();
    for (key, result) in results {
        match result {
            Ok(Refreshed::Present(outcome)) => {
                if outcome.is_degraded() {
                    let errors = outcome.errors.iter().map(ToString::to_string).collect();
                    report.degraded.push((key.clone(), errors));
                }
                if state
                    .get(&key)
                    .is_some_and(|prior| prior.is_identical(&outcome.model))
                {
                    report.unchanged += 1;
                } else {
                    report.updated.push(key.clone());
                }
                state.insert(key, outcome.model);
            }
            Ok(Refreshed::Gone) => {
                state.remove(&key);
                report.gone.push(key);
            }
            Err(err) => report.failed.push((key, format!("{err:#}"))),
        }
    }
    log::debug!(
        "refresh: {} updated, {} gone, {} failed",
        report.updated.len(),
        report.gone.len(),
        report.failed.len()
    );
    Ok(report)
}

//! Planner - turns a desired model and prior state into a proposed change

use crate::descriptor::ResourceDescriptor;
use crate::drift::{changed_inputs, reconcile_drift};
use crate::error::Result;
use crate::model::ResourceModel;
use crate::semantic::semantic_equals;
use serde::Serialize;
use std::fmt;

/// What applying a plan will do to the remote resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Resource does not exist yet
    Create,
    /// Attributes change in place
    Update,
    /// A change forces delete then create
    Replace,
    /// Nothing to do
    NoOp,
}

impl Action {
    /// Check if the action represents a change
    pub fn is_change(&self) -> bool {
        !matches!(self, Self::NoOp)
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Create => "+",
            Self::Update => "~",
            Self::Replace => "-/+",
            Self::NoOp => " ",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Replace => "replace",
            Self::NoOp => "no-op",
        };
        f.write_str(name)
    }
}

/// A proposed change for a single resource
#[derive(Debug, Clone)]
pub struct Plan {
    /// The model as it is expected to look after apply
    pub model: ResourceModel,
    pub action: Action,
    /// Attributes whose declared value differs from prior state
    pub changed: Vec<&'static str>,
    /// Changed attributes that force a replacement
    pub replace_reasons: Vec<&'static str>,
}

impl Plan {
    pub fn is_change(&self) -> bool {
        self.action.is_change()
    }
}

/// Build the plan for `desired` given the last observed state.
///
/// Before drift detection, identifier attributes that name the same
/// resource as in prior state adopt the prior spelling, and attributes
/// marked `preserve_unknown` adopt the prior value while unknown.
pub fn plan(
    desc: &ResourceDescriptor,
    desired: &ResourceModel,
    prior: Option<&ResourceModel>,
) -> Result<Plan> {
    let Some(prior) = prior else {
        let model = reconcile_drift(desc, desired, None);
        let changed = desc
            .attributes
            .iter()
            .filter(|a| model.get(a.name).is_known())
            .map(|a| a.name)
            .collect();
        return Ok(Plan {
            model,
            action: Action::Create,
            changed,
            replace_reasons: Vec::new(),
        });
    };

    let mut model = desired.clone();
    for attr in desc.attributes {
        let proposed = model.get(attr.name);
        let previous = prior.get(attr.name);
        if attr.leaf_or_path && semantic_equals(proposed, previous)? {
            model.set(attr.name, previous.clone());
        } else if attr.preserve_unknown && proposed.is_unknown() {
            model.set(attr.name, previous.clone());
        }
    }

    let model = reconcile_drift(desc, &model, Some(prior));
    let changed = changed_inputs(desc, &model, prior);
    let replace_reasons: Vec<&'static str> = changed
        .iter()
        .copied()
        .filter(|name| desc.attribute(name).is_some_and(|a| a.requires_replace))
        .collect();

    let action = if changed.is_empty() {
        Action::NoOp
    } else if replace_reasons.is_empty() {
        Action::Update
    } else {
        Action::Replace
    };

    log::debug!("{}: planned {action}", desc.type_name);
    Ok(Plan {
        model,
        action,
        changed,
        replace_reasons,
    })
}

/// Summary statistics over a set of plans
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlanSummary {
    pub creates: usize,
    pub updates: usize,
    pub replaces: usize,
    pub deletes: usize,
    pub unchanged: usize,
}

impl PlanSummary {
    pub fn add(&mut self, action: Action) {
        match action {
            Action::Create => self.creates += 1,
            Action::Update => self.updates += 1,
            Action::Replace => self.replaces += 1,
            Action::NoOp => self.unchanged += 1,
        }
    }

    pub fn add_delete(&mut self) {
        self.deletes += 1;
    }

    /// Total number of changes
    pub fn total(&self) -> usize {
        self.creates + self.updates + self.replaces + self.deletes
    }

    /// Check if there are any changes
    pub fn has_changes(&self) -> bool {
        self.total() > 0
    }
}

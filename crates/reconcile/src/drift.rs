//! Plan-time drift detection for derived attributes
//!
//! A derived attribute (e.g. the sub-ports produced by splitting a physical
//! port) is computed by the remote from other attributes. Its prior value is
//! carried into the plan only while every other attribute is unchanged;
//! otherwise it becomes `Unknown` until the remote recomputes it.

use crate::attr::Attr;
use crate::descriptor::ResourceDescriptor;
use crate::model::ResourceModel;

/// Names of non-derived attributes whose values differ between `a` and `b`.
///
/// Uses strict attribute equality: an `Unknown` on either side counts as a
/// difference. Set-valued attributes compare by membership.
pub fn changed_inputs(
    desc: &ResourceDescriptor,
    a: &ResourceModel,
    b: &ResourceModel,
) -> Vec<&'static str> {
    desc.attributes
        .iter()
        .filter(|attr| !attr.derived)
        .filter(|attr| a.get(attr.name) != b.get(attr.name))
        .map(|attr| attr.name)
        .collect()
}

/// Decide, for every derived attribute, whether the prior value carries
/// into `plan` or must be re-determined by the remote.
///
/// Without prior state the plan is returned as is, so derived attributes
/// keep their schema default.
pub fn reconcile_drift(
    desc: &ResourceDescriptor,
    plan: &ResourceModel,
    prior: Option<&ResourceModel>,
) -> ResourceModel {
    let mut out = plan.clone();
    let Some(prior) = prior else {
        return out;
    };

    for attr in desc.derived() {
        out.set(attr.name, prior.get(attr.name).clone());
    }

    let changed = changed_inputs(desc, &out, prior);
    if !changed.is_empty() {
        log::debug!(
            "{}: inputs changed ({}), derived attributes pending",
            desc.type_name,
            changed.join(", ")
        );
        for attr in desc.derived() {
            out.set(attr.name, Attr::Unknown);
        }
    }
    out
}

//! Snapshot merge engine
//!
//! Folds a remote snapshot into a desired model. Ordinary attributes are
//! decoded and overwritten one by one; a decode failure is recorded and the
//! merge moves on. Identity attributes (own leaf id, ancestor ids) are
//! collected first and the composite identifier is composed once at the
//! end, so the result does not depend on snapshot key order.

use crate::attr::Attr;
use crate::descriptor::ResourceDescriptor;
use crate::error::{Error, Result};
use crate::id::{CompositeId, Segment, check_component, compose, decompose, leaf_id};
use crate::model::ResourceModel;
use crate::value::{decode, json_shape};
use serde_json::Value as Json;

/// Attribute map as returned by the remote API
pub type RemoteSnapshot = serde_json::Map<String, Json>;

/// Leaf ids of a resource's ancestors, root first. `None` marks an
/// ancestor whose id is not known yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AncestorChain {
    leaves: Vec<Option<String>>,
}

impl AncestorChain {
    pub fn unresolved(len: usize) -> Self {
        Self {
            leaves: vec![None; len],
        }
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.leaves.get(index).and_then(|l| l.as_deref())
    }

    /// Set an ancestor's leaf id, returning whether it changed
    pub fn set(&mut self, index: usize, leaf: &str) -> bool {
        match self.leaves.get_mut(index) {
            Some(slot) if slot.as_deref() != Some(leaf) => {
                *slot = Some(leaf.to_string());
                true
            }
            _ => false,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.leaves.iter().all(Option::is_some)
    }

    /// Fill unresolved slots from a decoded identifier whose root and
    /// segments line up with this chain.
    fn fill_from(&mut self, id: &CompositeId) {
        let ids = std::iter::once(id.root()).chain(id.segments().iter().map(|s| s.id.as_str()));
        for (slot, leaf) in self.leaves.iter_mut().zip(ids) {
            if slot.is_none() {
                *slot = Some(leaf.to_string());
            }
        }
    }

    /// Root id and ancestor segments below it, once every slot is resolved
    fn parts(&self, desc: &ResourceDescriptor) -> Result<(&str, Vec<Segment>)> {
        let missing = |index: usize| Error::InvalidSegment {
            segment: String::new(),
            reason: if index == 0 {
                "root id is unresolved"
            } else {
                "ancestor id is unresolved"
            },
        };

        let root = self.get(0).ok_or_else(|| missing(0))?;
        let mut segments = Vec::with_capacity(desc.depth());
        for (index, ancestor) in desc.ancestors.iter().enumerate().skip(1) {
            let leaf = self.get(index).ok_or_else(|| missing(index))?;
            segments.push(Segment::new(ancestor.collection, leaf));
        }
        Ok((root, segments))
    }

    /// Compose the parent identifier; `None` for root resources
    pub fn parent(&self, desc: &ResourceDescriptor) -> Result<Option<CompositeId>> {
        if desc.is_root() {
            return Ok(None);
        }
        let (root, segments) = self.parts(desc)?;
        compose(root, &segments, None).map(Some)
    }

    /// Compose the parent identifier and this resource's identifier
    pub fn compose(
        &self,
        desc: &ResourceDescriptor,
        own: &str,
    ) -> Result<(Option<CompositeId>, CompositeId)> {
        if desc.is_root() {
            return Ok((None, compose(own, &[], None)?));
        }

        let (root, segments) = self.parts(desc)?;
        let parent = compose(root, &segments, None)?;
        let id = compose(root, &segments, Some(&Segment::new(desc.collection, own)))?;
        Ok((Some(parent), id))
    }
}

/// Resolves the ancestor chain already known for a model
pub trait AncestorResolver {
    fn resolve(&self, desc: &ResourceDescriptor, model: &ResourceModel) -> AncestorChain;
}

/// Default resolver: reads the parent foreign key, falling back to the
/// model's own composite id for whatever the parent does not provide.
///
/// A parent given as a bare leaf id resolves only the immediate parent.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParentPathResolver;

impl AncestorResolver for ParentPathResolver {
    fn resolve(&self, desc: &ResourceDescriptor, model: &ResourceModel) -> AncestorChain {
        let len = desc.ancestors.len();
        let mut chain = AncestorChain::unresolved(len);
        if len == 0 {
            return chain;
        }

        if let Some(parent) = desc.parent_attr.and_then(|p| model.non_empty_str(p)) {
            match decompose(parent, len - 1) {
                Ok(id) => chain.fill_from(&id),
                Err(_) if !parent.contains('/') => {
                    chain.set(len - 1, parent);
                }
                Err(err) => log::debug!("{}: ignoring parent id: {err}", desc.type_name),
            }
        }

        if !chain.is_complete()
            && let Some(own) = model.id(desc)
            && let Ok(id) = decompose(own, len)
        {
            chain.fill_from(&id);
        }
        chain
    }
}

/// Result of a merge: the reconciled model plus any attribute-scoped errors
#[derive(Debug)]
pub struct MergeOutcome {
    pub model: ResourceModel,
    pub errors: Vec<Error>,
}

impl MergeOutcome {
    /// Whether some attributes could not be merged
    pub fn is_degraded(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Whether the remote reported the resource as not found
    pub fn is_gone(&self, desc: &ResourceDescriptor) -> bool {
        self.model.is_gone(desc)
    }
}

/// The leaf id a model currently holds for itself
pub fn held_leaf(desc: &ResourceDescriptor, model: &ResourceModel) -> Option<String> {
    model
        .non_empty_str(desc.leaf_attr)
        .or_else(|| model.id(desc).map(leaf_id))
        .map(str::to_string)
}

/// Merge `snapshot` into a copy of `desired` using the default resolver.
pub fn merge(
    desc: &ResourceDescriptor,
    desired: &ResourceModel,
    snapshot: &RemoteSnapshot,
) -> MergeOutcome {
    merge_with(desc, desired, snapshot, &ParentPathResolver)
}

/// Merge `snapshot` into a copy of `desired`.
///
/// An empty snapshot means the remote resource was not found: the
/// identifier attribute becomes `Null` and nothing else changes.
pub fn merge_with(
    desc: &ResourceDescriptor,
    desired: &ResourceModel,
    snapshot: &RemoteSnapshot,
    resolver: &dyn AncestorResolver,
) -> MergeOutcome {
    let mut model = desired.clone();
    let mut errors = Vec::new();

    if snapshot.is_empty() {
        log::debug!("{}: empty snapshot, marking as not found", desc.type_name);
        model.set(desc.id_attr, Attr::Null);
        return MergeOutcome { model, errors };
    }

    let mut chain = resolver.resolve(desc, desired);
    let mut own = held_leaf(desc, desired);
    let mut identity_changed = false;

    for (key, raw) in snapshot {
        if key == desc.leaf_key {
            match identity_value(desc.leaf_attr, raw) {
                Ok(Some(leaf)) if own.as_deref() != Some(leaf) => {
                    own = Some(leaf.to_string());
                    identity_changed = true;
                }
                Ok(_) => {}
                Err(err) => errors.push(err),
            }
            continue;
        }

        if let Some(index) = desc.ancestor_by_key(key) {
            match identity_value(key, raw) {
                Ok(Some(leaf)) => identity_changed |= chain.set(index, leaf),
                Ok(None) => {}
                Err(err) => errors.push(err),
            }
            continue;
        }

        let Some(attr) = desc.attribute_by_remote(key) else {
            log::trace!("{}: ignoring undeclared key {key:?}", desc.type_name);
            continue;
        };
        match decode(attr.name, attr.kind, raw) {
            Ok(value) => {
                log::trace!("{}: {} <- {}", desc.type_name, attr.name, value.state_name());
                model.set(attr.name, value);
            }
            Err(err) => errors.push(err),
        }
    }

    if let Some(own) = own {
        if chain.is_complete() {
            // Identity attributes move together or not at all
            match chain.compose(desc, &own) {
                Ok((parent, id)) => {
                    model.set_str(desc.leaf_attr, own);
                    if let (Some(attr), Some(parent)) = (desc.parent_attr, parent) {
                        model.set_str(attr, parent.to_string());
                    }
                    model.set_str(desc.id_attr, id.to_string());
                }
                Err(err) => errors.push(err),
            }
        } else {
            log::debug!("{}: ancestors unresolved, identifier not composed yet", desc.type_name);
            model.set_str(desc.leaf_attr, own);
        }
    }

    if identity_changed {
        log::debug!(
            "{}: identifier now {:?}",
            desc.type_name,
            model.get_str(desc.id_attr)
        );
    }

    MergeOutcome { model, errors }
}

/// A leaf id from the snapshot; `None` when absent or empty
fn identity_value<'a>(attribute: &str, raw: &'a Json) -> Result<Option<&'a str>> {
    match raw {
        Json::Null => Ok(None),
        Json::String(s) if s.is_empty() => Ok(None),
        Json::String(s) => {
            check_component(s, "id is empty")?;
            Ok(Some(s))
        }
        other => Err(Error::mismatch(attribute, "string", json_shape(other))),
    }
}

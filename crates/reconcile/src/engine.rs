//! Reconciliation engine - drives one resource kind against its collaborator

use crate::attr::Attr;
use crate::collaborator::Collaborator;
use crate::descriptor::ResourceDescriptor;
use crate::error::{Error, Result};
use crate::id::{CompositeId, decompose};
use crate::merge::{
    AncestorResolver, MergeOutcome, ParentPathResolver, RemoteSnapshot, merge,
};
use crate::model::ResourceModel;
use crate::value::encode;

/// Generic lifecycle operations for a single resource kind.
///
/// The engine holds no state of its own; every operation takes the model
/// it works on and returns a fresh one.
pub struct Engine<'c> {
    collaborator: &'c dyn Collaborator,
    descriptor: &'static ResourceDescriptor,
}

impl<'c> Engine<'c> {
    pub fn new(collaborator: &'c dyn Collaborator, descriptor: &'static ResourceDescriptor) -> Self {
        Self {
            collaborator,
            descriptor,
        }
    }

    pub fn descriptor(&self) -> &'static ResourceDescriptor {
        self.descriptor
    }

    /// Refresh `state` from the remote.
    ///
    /// A resource the remote no longer has comes back with a `Null`
    /// identifier (see [`MergeOutcome::is_gone`]).
    pub fn read(&self, state: &ResourceModel) -> Result<MergeOutcome> {
        let desc = self.descriptor;
        let model = self.normalize(state)?;
        let path = self.remote_path(&model)?;
        log::debug!("{}: reading {path}", desc.type_name);

        let snapshot = self.collaborator.fetch(&path)?.unwrap_or_default();
        let outcome = merge(desc, &model, &snapshot);
        self.report(&outcome);
        log::debug!(
            "{}: read {path} done{}",
            desc.type_name,
            if outcome.is_gone(desc) { " (gone)" } else { "" }
        );
        Ok(outcome)
    }

    /// Create the planned resource and return it as the remote reports it
    pub fn create(&self, plan: &ResourceModel) -> Result<MergeOutcome> {
        let desc = self.descriptor;
        let parent_path = match ParentPathResolver.resolve(desc, plan).parent(desc)? {
            Some(parent) => format!("{}/{parent}", desc.root_collection()),
            None => String::new(),
        };
        log::debug!("{}: creating under {parent_path:?}", desc.type_name);

        let payload = build_payload(desc, plan);
        let created = self
            .collaborator
            .create(&parent_path, desc.collection, payload)?;
        let leaf = created
            .get(desc.leaf_key)
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                Error::UnexpectedResponse(format!(
                    "created {} carries no {:?}",
                    desc.type_name, desc.leaf_key
                ))
            })?;

        let mut seeded = plan.clone();
        seeded.set_str(desc.leaf_attr, leaf);
        let seeded = merge(desc, &seeded, &created).model;
        self.settled_read(&seeded, "create")
    }

    /// Push the planned attributes of an existing resource
    pub fn update(&self, plan: &ResourceModel) -> Result<MergeOutcome> {
        let desc = self.descriptor;
        let model = self.normalize(plan)?;
        let path = self.remote_path(&model)?;
        log::debug!("{}: updating {path}", desc.type_name);

        self.collaborator
            .update(&path, build_payload(desc, &model))?;
        self.settled_read(&model, "update")
    }

    pub fn delete(&self, state: &ResourceModel) -> Result<()> {
        let path = self.remote_path(state)?;
        log::debug!("{}: deleting {path}", self.descriptor.type_name);
        self.collaborator.delete(&path)?;
        log::debug!("{}: deleted {path}", self.descriptor.type_name);
        Ok(())
    }

    /// Adopt an existing remote resource by its external path.
    ///
    /// The final component may be the resource's id or its name; either
    /// way the result carries the remote's own id.
    pub fn import(&self, path: &str) -> Result<MergeOutcome> {
        let desc = self.descriptor;
        let id = parse_id(desc, path)?;
        log::debug!("{}: importing {id}", desc.type_name);

        let mut seeded = ResourceModel::blank(desc);
        seed_identity(desc, &mut seeded, &id);
        let mut outcome = self.read(&seeded)?;
        if outcome.is_gone(desc) {
            return Err(self.not_found(path));
        }
        outcome.model.settle_unknowns();
        Ok(outcome)
    }

    /// Read-only lookup of a declared resource.
    ///
    /// Uses the declared leaf id when present, otherwise the declared
    /// `name`. A missing resource is an error rather than a gone model.
    pub fn lookup(&self, desired: &ResourceModel) -> Result<MergeOutcome> {
        let desc = self.descriptor;
        let leaf = desired
            .non_empty_str(desc.leaf_attr)
            .or_else(|| desired.non_empty_str("name"))
            .ok_or_else(|| Error::MissingAttribute {
                resource: desc.type_name.to_string(),
                name: desc.leaf_attr.to_string(),
            })?
            .to_string();

        let chain = ParentPathResolver.resolve(desc, desired);
        let (_, id) = chain.compose(desc, &leaf)?;
        let mut seeded = desired.clone();
        seed_identity(desc, &mut seeded, &id);

        let mut outcome = self.read(&seeded)?;
        if outcome.is_gone(desc) {
            return Err(self.not_found(&id.to_string()));
        }
        outcome.model.settle_unknowns();
        Ok(outcome)
    }

    /// API path of a model, e.g. `fabrics/F1/nodes/N1`
    pub fn remote_path(&self, model: &ResourceModel) -> Result<String> {
        let id = model.id(self.descriptor).ok_or_else(|| self.missing_id())?;
        Ok(format!("{}/{id}", self.descriptor.root_collection()))
    }

    /// Split the own identifier into leaf and parent attributes
    fn normalize(&self, state: &ResourceModel) -> Result<ResourceModel> {
        let desc = self.descriptor;
        let id = state.id(desc).ok_or_else(|| self.missing_id())?;
        let id = parse_id(desc, id)?;
        let mut model = state.clone();
        seed_identity(desc, &mut model, &id);
        Ok(model)
    }

    fn settled_read(&self, model: &ResourceModel, operation: &str) -> Result<MergeOutcome> {
        let desc = self.descriptor;
        let mut outcome = self.read(model)?;
        if outcome.is_gone(desc) {
            return Err(Error::UnexpectedResponse(format!(
                "{} vanished right after {operation}",
                desc.type_name
            )));
        }
        let settled = outcome.model.settle_unknowns();
        if !settled.is_empty() {
            log::debug!(
                "{}: not reported after {operation}: {}",
                desc.type_name,
                settled.join(", ")
            );
        }
        Ok(outcome)
    }

    fn report(&self, outcome: &MergeOutcome) {
        for err in &outcome.errors {
            log::warn!("{}: {err}", self.descriptor.type_name);
        }
    }

    fn missing_id(&self) -> Error {
        Error::MissingAttribute {
            resource: self.descriptor.type_name.to_string(),
            name: self.descriptor.id_attr.to_string(),
        }
    }

    fn not_found(&self, id: &str) -> Error {
        Error::NotFound {
            resource: self.descriptor.type_name.to_string(),
            id: id.to_string(),
        }
    }
}

/// Parse a composite identifier and check its collections against the
/// descriptor's ancestor chain.
pub fn parse_id(desc: &ResourceDescriptor, path: &str) -> Result<CompositeId> {
    let id = decompose(path, desc.depth())?;
    let expected = desc
        .ancestors
        .iter()
        .skip(1)
        .map(|a| a.collection)
        .chain((!desc.is_root()).then_some(desc.collection));
    let matches = id
        .segments()
        .iter()
        .zip(expected)
        .all(|(segment, collection)| segment.collection == collection);
    if !matches {
        let mut pattern = String::from("<root>");
        for ancestor in desc.ancestors.iter().skip(1) {
            pattern.push_str(&format!("/{}/<id>", ancestor.collection));
        }
        if !desc.is_root() {
            pattern.push_str(&format!("/{}/<id>", desc.collection));
        }
        return Err(Error::MalformedPath {
            path: path.to_string(),
            expected: pattern,
        });
    }
    Ok(id)
}

fn seed_identity(desc: &ResourceDescriptor, model: &mut ResourceModel, id: &CompositeId) {
    model.set_str(desc.id_attr, id.to_string());
    model.set_str(desc.leaf_attr, id.leaf());
    if let (Some(attr), Some(parent)) = (desc.parent_attr, id.parent()) {
        model.set_str(attr, parent.to_string());
    }
}

/// Flat request payload: every settable attribute with a remote key and a
/// known value, encoded to its remote shape.
pub fn build_payload(desc: &ResourceDescriptor, model: &ResourceModel) -> RemoteSnapshot {
    let mut payload = RemoteSnapshot::new();
    for attr in desc.attributes.iter().filter(|a| a.mode.is_settable()) {
        let (Some(key), Attr::Known(value)) = (attr.remote, model.get(attr.name)) else {
            continue;
        };
        payload.insert(key.to_string(), encode(attr.kind, value));
    }
    payload
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborator::child_path;
    use crate::descriptor::{Ancestor, Attribute};
    use crate::value::{AttrKind, Value};
    use serde_json::{Value as Json, json};
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    static BREAKOUT: ResourceDescriptor = ResourceDescriptor {
        type_name: "node_breakout",
        collection: "breakouts",
        id_attr: "id",
        leaf_attr: "breakout_id",
        leaf_key: "id",
        parent_attr: Some("node_id"),
        ancestors: &[
            Ancestor::new("fabrics", "fabricId"),
            Ancestor::new("nodes", "nodeId"),
        ],
        attributes: &[
            Attribute::computed("id", AttrKind::String).local(),
            Attribute::computed("breakout_id", AttrKind::String).remote("id"),
            Attribute::required("node_id", AttrKind::String).local(),
            Attribute::required("name", AttrKind::String),
            Attribute::optional_computed("description", AttrKind::String),
            Attribute::required("ports", AttrKind::StringSet),
            Attribute::derived("breakouts", AttrKind::StringSet),
            Attribute::required("mode", AttrKind::String),
            Attribute::computed("pluggable", AttrKind::String),
        ],
    };

    /// In-memory remote keyed by API path; the last path component may be
    /// an id or a name.
    #[derive(Default)]
    struct FakeRemote {
        objects: Mutex<BTreeMap<String, RemoteSnapshot>>,
        next_id: Mutex<u32>,
    }

    impl FakeRemote {
        fn with(path: &str, snapshot: Json) -> Self {
            let remote = Self::default();
            remote.insert(path, snapshot);
            remote
        }

        fn insert(&self, path: &str, snapshot: Json) {
            let snapshot = snapshot.as_object().cloned().unwrap();
            self.objects.lock().unwrap().insert(path.to_string(), snapshot);
        }

        fn resolve(&self, path: &str) -> Option<String> {
            let objects = self.objects.lock().unwrap();
            if objects.contains_key(path) {
                return Some(path.to_string());
            }
            let (parent, name) = path.rsplit_once('/')?;
            objects
                .iter()
                .find(|(key, snapshot)| {
                    key.rsplit_once('/').map(|(p, _)| p) == Some(parent)
                        && snapshot.get("name").and_then(Json::as_str) == Some(name)
                })
                .map(|(key, _)| key.clone())
        }
    }

    impl Collaborator for FakeRemote {
        fn fetch(&self, path: &str) -> Result<Option<RemoteSnapshot>> {
            let Some(key) = self.resolve(path) else {
                return Ok(None);
            };
            Ok(self.objects.lock().unwrap().get(&key).cloned())
        }

        fn create(
            &self,
            parent_path: &str,
            collection: &str,
            mut payload: RemoteSnapshot,
        ) -> Result<RemoteSnapshot> {
            let mut next = self.next_id.lock().unwrap();
            *next += 1;
            let id = format!("B{next}");
            payload.insert("id".into(), json!(id));
            payload.insert("fabricId".into(), json!("F1"));
            payload.insert("nodeId".into(), json!("N1"));
            payload.insert("breakouts".into(), json!(["Ethernet1_1_1", "Ethernet1_1_2"]));
            let path = format!("{}/{id}", child_path(parent_path, collection));
            self.objects.lock().unwrap().insert(path, payload.clone());
            Ok(payload)
        }

        fn update(&self, path: &str, payload: RemoteSnapshot) -> Result<RemoteSnapshot> {
            let key = self.resolve(path).ok_or_else(|| Error::NotFound {
                resource: "breakout".into(),
                id: path.into(),
            })?;
            let mut objects = self.objects.lock().unwrap();
            let current = objects.get_mut(&key).unwrap();
            current.extend(payload);
            Ok(current.clone())
        }

        fn delete(&self, path: &str) -> Result<()> {
            if let Some(key) = self.resolve(path) {
                self.objects.lock().unwrap().remove(&key);
            }
            Ok(())
        }
    }

    const B1_PATH: &str = "fabrics/F1/nodes/N1/breakouts/B1";

    fn b1() -> Json {
        json!({
            "id": "B1",
            "fabricId": "F1",
            "nodeId": "N1",
            "name": "brk1",
            "description": "",
            "ports": ["Ethernet1_1"],
            "breakouts": ["Ethernet1_1_1", "Ethernet1_1_2", "Ethernet1_1_3", "Ethernet1_1_4"],
            "mode": "4x25G(4)",
            "pluggable": "QSFP28-100G-DAC"
        })
    }

    fn desired() -> ResourceModel {
        let mut model = ResourceModel::empty(&BREAKOUT);
        model.set_str("node_id", "F1/nodes/N1");
        model.set_str("name", "brk1");
        model.set_str("mode", "4x25G(4)");
        model.set("ports", Attr::Known(Value::string_set(["Ethernet1_1"])));
        model
    }

    #[test]
    fn test_read_normalizes_and_merges() {
        let remote = FakeRemote::with(B1_PATH, b1());
        let engine = Engine::new(&remote, &BREAKOUT);
        let mut state = ResourceModel::blank(&BREAKOUT);
        state.set_str("id", "F1/nodes/N1/breakouts/B1");

        let outcome = engine.read(&state).unwrap();
        assert!(!outcome.is_degraded());
        let model = outcome.model;
        assert_eq!(model.get_str("breakout_id"), Some("B1"));
        assert_eq!(model.get_str("node_id"), Some("F1/nodes/N1"));
        assert_eq!(model.get_str("pluggable"), Some("QSFP28-100G-DAC"));
    }

    #[test]
    fn test_read_missing_resource_is_gone() {
        let remote = FakeRemote::default();
        let engine = Engine::new(&remote, &BREAKOUT);
        let mut state = desired();
        state.set_str("id", "F1/nodes/N1/breakouts/B1");
        let outcome = engine.read(&state).unwrap();
        assert!(outcome.is_gone(&BREAKOUT));
        assert_eq!(outcome.model.get_str("name"), Some("brk1"));
    }

    #[test]
    fn test_read_without_id_is_error() {
        let remote = FakeRemote::default();
        let engine = Engine::new(&remote, &BREAKOUT);
        let err = engine.read(&desired()).unwrap_err();
        assert!(matches!(err, Error::MissingAttribute { ref name, .. } if name == "id"));
    }

    #[test]
    fn test_create_composes_id_and_settles() {
        let remote = FakeRemote::default();
        let engine = Engine::new(&remote, &BREAKOUT);
        let outcome = engine.create(&desired()).unwrap();
        let model = outcome.model;
        assert_eq!(model.get_str("id"), Some("F1/nodes/N1/breakouts/B1"));
        assert_eq!(model.get_str("breakout_id"), Some("B1"));
        assert!(model.get("breakouts").is_known());
        // Not reported by the remote
        assert!(model.get("pluggable").is_null());
        assert!(model.attributes.values().all(|v| !v.is_unknown()));
    }

    #[test]
    fn test_create_with_bare_parent_fails() {
        let remote = FakeRemote::default();
        let engine = Engine::new(&remote, &BREAKOUT);
        let mut plan = desired();
        plan.set_str("node_id", "N1");
        let err = engine.create(&plan).unwrap_err();
        assert!(matches!(err, Error::InvalidSegment { .. }));
    }

    #[test]
    fn test_update_pushes_payload() {
        let remote = FakeRemote::with(B1_PATH, b1());
        let engine = Engine::new(&remote, &BREAKOUT);
        let mut plan = desired();
        plan.set_str("id", "F1/nodes/N1/breakouts/B1");
        plan.set_str("description", "uplinks");

        let outcome = engine.update(&plan).unwrap();
        assert_eq!(outcome.model.get_str("description"), Some("uplinks"));
        let stored = remote.fetch(B1_PATH).unwrap().unwrap();
        assert_eq!(stored["description"], json!("uplinks"));
        // Identity never goes into the payload
        assert!(!stored.contains_key("node_id"));
    }

    #[test]
    fn test_delete() {
        let remote = FakeRemote::with(B1_PATH, b1());
        let engine = Engine::new(&remote, &BREAKOUT);
        let mut state = desired();
        state.set_str("id", "F1/nodes/N1/breakouts/B1");
        engine.delete(&state).unwrap();
        assert!(remote.fetch(B1_PATH).unwrap().is_none());
    }

    #[test]
    fn test_import_by_id_and_by_name_agree() {
        let remote = FakeRemote::with(B1_PATH, b1());
        let engine = Engine::new(&remote, &BREAKOUT);
        let by_id = engine.import("F1/nodes/N1/breakouts/B1").unwrap().model;
        let by_name = engine.import("F1/nodes/N1/breakouts/brk1").unwrap().model;
        assert!(by_id.is_identical(&by_name), "{by_id:?} vs {by_name:?}");
        // Nothing is left unknown after import
        assert_eq!(by_id, by_name);
        assert_eq!(by_name.get_str("id"), Some("F1/nodes/N1/breakouts/B1"));
    }

    #[test]
    fn test_import_rejects_wrong_shape() {
        let remote = FakeRemote::default();
        let engine = Engine::new(&remote, &BREAKOUT);
        let err = engine.import("F1/nodes/N1").unwrap_err();
        assert!(matches!(err, Error::MalformedPath { .. }));
        let err = engine.import("F1/vrfs/N1/breakouts/B1").unwrap_err();
        assert!(matches!(err, Error::MalformedPath { ref expected, .. }
            if expected == "<root>/nodes/<id>/breakouts/<id>"));
    }

    #[test]
    fn test_import_missing_is_not_found() {
        let remote = FakeRemote::default();
        let engine = Engine::new(&remote, &BREAKOUT);
        let err = engine.import("F1/nodes/N1/breakouts/B9").unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
        assert!(err.to_string().contains("has not been found"));
    }

    #[test]
    fn test_lookup_by_name() {
        let remote = FakeRemote::with(B1_PATH, b1());
        let engine = Engine::new(&remote, &BREAKOUT);
        let mut wanted = ResourceModel::empty(&BREAKOUT);
        wanted.set_str("node_id", "F1/nodes/N1");
        wanted.set_str("name", "brk1");

        let model = engine.lookup(&wanted).unwrap().model;
        assert_eq!(model.get_str("breakout_id"), Some("B1"));
        assert_eq!(model.get_str("mode"), Some("4x25G(4)"));

        wanted.set_str("name", "nope");
        let err = engine.lookup(&wanted).unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }

    #[test]
    fn test_build_payload_skips_computed_and_local() {
        let payload = build_payload(&BREAKOUT, &desired());
        let mut keys: Vec<&str> = payload.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(keys, vec!["mode", "name", "ports"]);
    }
}

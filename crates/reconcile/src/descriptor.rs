//! Declarative resource descriptors
//!
//! One static [`ResourceDescriptor`] per resource kind drives every generic
//! operation: model construction, snapshot merge, plan-time drift detection
//! and payload building.

use crate::value::AttrKind;

/// How an attribute may be set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Must be declared by the caller
    Required,
    /// May be declared; absent means `Null`
    Optional,
    /// May be declared; absent means the remote decides
    OptionalComputed,
    /// Only ever set by the remote system
    Computed,
}

impl Mode {
    /// Whether the caller may declare a value
    pub fn is_settable(self) -> bool {
        !matches!(self, Self::Computed)
    }

    /// Whether an undeclared value is left for the remote to determine
    pub fn is_computed(self) -> bool {
        matches!(self, Self::Computed | Self::OptionalComputed)
    }
}

/// A single declared attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attribute {
    /// Name in the resource model
    pub name: &'static str,
    /// Key in snapshots and payloads; `None` for local-only attributes
    pub remote: Option<&'static str>,
    pub kind: AttrKind,
    pub mode: Mode,
    /// Value is computed by the remote from other attributes
    pub derived: bool,
    /// Plan keeps the prior value while this one is unknown
    pub preserve_unknown: bool,
    /// A change forces the resource to be replaced
    pub requires_replace: bool,
    /// Identifier that may appear as a leaf id or as a full path
    pub leaf_or_path: bool,
}

impl Attribute {
    pub const fn new(name: &'static str, kind: AttrKind, mode: Mode) -> Self {
        Self {
            name,
            remote: Some(name),
            kind,
            mode,
            derived: false,
            preserve_unknown: false,
            requires_replace: false,
            leaf_or_path: false,
        }
    }

    pub const fn required(name: &'static str, kind: AttrKind) -> Self {
        Self::new(name, kind, Mode::Required)
    }

    pub const fn optional(name: &'static str, kind: AttrKind) -> Self {
        Self::new(name, kind, Mode::Optional)
    }

    pub const fn optional_computed(name: &'static str, kind: AttrKind) -> Self {
        Self::new(name, kind, Mode::OptionalComputed).preserve_unknown()
    }

    pub const fn computed(name: &'static str, kind: AttrKind) -> Self {
        Self::new(name, kind, Mode::Computed)
    }

    /// Computed by the remote from other declared attributes
    pub const fn derived(name: &'static str, kind: AttrKind) -> Self {
        let mut attr = Self::computed(name, kind);
        attr.derived = true;
        attr
    }

    pub const fn remote(mut self, key: &'static str) -> Self {
        self.remote = Some(key);
        self
    }

    pub const fn local(mut self) -> Self {
        self.remote = None;
        self
    }

    pub const fn preserve_unknown(mut self) -> Self {
        self.preserve_unknown = true;
        self
    }

    pub const fn requires_replace(mut self) -> Self {
        self.requires_replace = true;
        self
    }

    pub const fn leaf_or_path(mut self) -> Self {
        self.leaf_or_path = true;
        self
    }
}

/// An ancestor level of a resource, root first
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ancestor {
    /// Collection the ancestor lives in (`fabrics`, `nodes`, ...)
    pub collection: &'static str,
    /// Snapshot key carrying the ancestor's leaf id
    pub snapshot_key: &'static str,
}

impl Ancestor {
    pub const fn new(collection: &'static str, snapshot_key: &'static str) -> Self {
        Self {
            collection,
            snapshot_key,
        }
    }
}

/// Static description of a resource kind
#[derive(Debug)]
pub struct ResourceDescriptor {
    /// Resource type name (`node_breakout`)
    pub type_name: &'static str,
    /// Collection this resource lives in (`breakouts`)
    pub collection: &'static str,
    /// Attribute holding the composite identifier
    pub id_attr: &'static str,
    /// Attribute holding the resource's own leaf id
    pub leaf_attr: &'static str,
    /// Snapshot key carrying the resource's own leaf id
    pub leaf_key: &'static str,
    /// Foreign-key attribute holding the parent's composite id
    pub parent_attr: Option<&'static str>,
    /// Ancestor chain, root scope first; empty for root resources
    pub ancestors: &'static [Ancestor],
    pub attributes: &'static [Attribute],
}

impl ResourceDescriptor {
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    pub fn attribute_by_remote(&self, key: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.remote == Some(key))
    }

    /// Number of `collection/id` segments in this resource's composite id
    pub fn depth(&self) -> usize {
        self.ancestors.len()
    }

    pub fn is_root(&self) -> bool {
        self.ancestors.is_empty()
    }

    /// Ancestor index whose leaf id is carried by `key`
    pub fn ancestor_by_key(&self, key: &str) -> Option<usize> {
        self.ancestors.iter().position(|a| a.snapshot_key == key)
    }

    /// Attributes computed by the remote from other attributes
    pub fn derived(&self) -> impl Iterator<Item = &Attribute> {
        self.attributes.iter().filter(|a| a.derived)
    }

    /// Collection the root scope lives in (`fabrics`)
    pub fn root_collection(&self) -> &'static str {
        self.ancestors.first().map_or(self.collection, |a| a.collection)
    }

    /// Whether `name` is one of the identifier attributes managed by the codec
    pub fn is_identity_attr(&self, name: &str) -> bool {
        name == self.id_attr || name == self.leaf_attr || Some(name) == self.parent_attr
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static ATTRS: &[Attribute] = &[
        Attribute::computed("id", AttrKind::String).local().preserve_unknown(),
        Attribute::computed("breakout_id", AttrKind::String)
            .remote("id")
            .preserve_unknown(),
        Attribute::required("node_id", AttrKind::String)
            .local()
            .requires_replace()
            .leaf_or_path(),
        Attribute::required("ports", AttrKind::StringSet),
        Attribute::derived("breakouts", AttrKind::StringSet),
        Attribute::optional_computed("description", AttrKind::String),
    ];

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
        attributes: ATTRS,
    };

    #[test]
    fn test_lookup_by_name_and_remote() {
        assert_eq!(BREAKOUT.attribute("ports").unwrap().name, "ports");
        assert_eq!(BREAKOUT.attribute_by_remote("id").unwrap().name, "breakout_id");
        assert!(BREAKOUT.attribute("missing").is_none());
        assert!(BREAKOUT.attribute_by_remote("node_id").is_none());
    }

    #[test]
    fn test_ancestor_chain() {
        assert_eq!(BREAKOUT.depth(), 2);
        assert_eq!(BREAKOUT.root_collection(), "fabrics");
        assert_eq!(BREAKOUT.ancestor_by_key("nodeId"), Some(1));
        assert_eq!(BREAKOUT.ancestor_by_key("name"), None);
    }

    #[test]
    fn test_flags() {
        let derived: Vec<_> = BREAKOUT.derived().map(|a| a.name).collect();
        assert_eq!(derived, vec!["breakouts"]);
        assert!(BREAKOUT.attribute("description").unwrap().preserve_unknown);
        assert!(BREAKOUT.attribute("node_id").unwrap().leaf_or_path);
        assert!(BREAKOUT.is_identity_attr("breakout_id"));
        assert!(!BREAKOUT.is_identity_attr("ports"));
    }

    #[test]
    fn test_mode_predicates() {
        assert!(Mode::Required.is_settable());
        assert!(!Mode::Computed.is_settable());
        assert!(Mode::OptionalComputed.is_computed());
        assert!(!Mode::Optional.is_computed());
    }
}

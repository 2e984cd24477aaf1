//! Resource kinds managed by hyperfab
//!
//! Each kind is a static [`ResourceDescriptor`]; the generic engine in the
//! `reconcile` crate does the rest.

mod breakout;
mod fabric;
mod node;
mod vrf;

pub use breakout::NODE_BREAKOUT;
pub use fabric::FABRIC;
pub use node::NODE;
pub use vrf::VRF;

use reconcile::{AttrKind, Attribute, Field, ResourceDescriptor};

/// All supported kinds, parents before children
pub static ALL: &[&ResourceDescriptor] = &[&FABRIC, &NODE, &NODE_BREAKOUT, &VRF];

/// Look up a resource kind by type name
pub fn descriptor(type_name: &str) -> Option<&'static ResourceDescriptor> {
    ALL.iter().copied().find(|d| d.type_name == type_name)
}

/// Type names of all supported kinds
pub fn type_names() -> Vec<&'static str> {
    ALL.iter().map(|d| d.type_name).collect()
}

/// Apply order of a kind: parents first
pub fn rank(type_name: &str) -> usize {
    ALL.iter()
        .position(|d| d.type_name == type_name)
        .unwrap_or(ALL.len())
}

const METADATA_FIELDS: &[Field] = &[
    Field::new("created_at", "createdAt", AttrKind::String),
    Field::new("created_by", "createdBy", AttrKind::String),
    Field::new("modified_at", "modifiedAt", AttrKind::String),
    Field::new("modified_by", "modifiedBy", AttrKind::String),
    Field::new("revision_id", "revisionId", AttrKind::Number),
];

const ANNOTATION_FIELDS: &[Field] = &[
    Field::new("data_type", "dataType", AttrKind::String),
    Field::new("name", "name", AttrKind::String),
    Field::new("value", "value", AttrKind::String),
];

/// Audit metadata maintained by the controller
pub(crate) const METADATA: Attribute =
    Attribute::computed("metadata", AttrKind::Object(METADATA_FIELDS)).preserve_unknown();

pub(crate) const LABELS: Attribute = Attribute::optional_computed("labels", AttrKind::StringSet);

pub(crate) const ANNOTATIONS: Attribute =
    Attribute::optional_computed("annotations", AttrKind::ObjectSet(ANNOTATION_FIELDS));

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_lookup() {
        assert_eq!(descriptor("node_breakout").unwrap().collection, "breakouts");
        assert!(descriptor("interface").is_none());
        assert_eq!(type_names(), vec!["fabric", "node", "node_breakout", "vrf"]);
    }

    #[test]
    fn test_rank_orders_parents_first() {
        assert!(rank("fabric") < rank("node"));
        assert!(rank("node") < rank("node_breakout"));
        assert_eq!(rank("unknown"), ALL.len());
    }

    #[test]
    fn test_descriptors_are_consistent() {
        for desc in ALL {
            for name in [desc.id_attr, desc.leaf_attr] {
                assert!(desc.attribute(name).is_some(), "{}: {name}", desc.type_name);
            }
            if let Some(parent) = desc.parent_attr {
                let attr = desc.attribute(parent).unwrap();
                assert!(attr.leaf_or_path && attr.requires_replace && attr.remote.is_none());
            }
            assert_eq!(desc.is_root(), desc.parent_attr.is_none());
            assert!(desc.attribute("name").is_some());
        }
    }
}

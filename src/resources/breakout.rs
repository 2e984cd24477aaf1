//! Node breakout: splits physical ports of a node into sub-ports

use super::{ANNOTATIONS, LABELS, METADATA};
use reconcile::{Ancestor, AttrKind, Attribute, ResourceDescriptor};

pub static NODE_BREAKOUT: ResourceDescriptor = ResourceDescriptor {
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
        Attribute::computed("id", AttrKind::String)
            .local()
            .preserve_unknown(),
        Attribute::computed("breakout_id", AttrKind::String)
            .remote("id")
            .preserve_unknown(),
        Attribute::required("node_id", AttrKind::String)
            .local()
            .requires_replace()
            .leaf_or_path(),
        Attribute::required("name", AttrKind::String).requires_replace(),
        Attribute::optional_computed("description", AttrKind::String),
        Attribute::optional_computed("enabled", AttrKind::Bool),
        // Sub-ports the controller derives from ports and mode
        Attribute::derived("breakouts", AttrKind::StringSet),
        Attribute::required("ports", AttrKind::StringSet),
        Attribute::required("mode", AttrKind::String),
        Attribute::optional_computed("pluggable", AttrKind::String),
        METADATA,
        LABELS,
        ANNOTATIONS,
    ],
};

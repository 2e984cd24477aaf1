//! Node: a switch inside a fabric

use super::{ANNOTATIONS, LABELS, METADATA};
use reconcile::{Ancestor, AttrKind, Attribute, ResourceDescriptor};

pub static NODE: ResourceDescriptor = ResourceDescriptor {
    type_name: "node",
    collection: "nodes",
    id_attr: "id",
    leaf_attr: "node_id",
    leaf_key: "id",
    parent_attr: Some("fabric_id"),
    ancestors: &[Ancestor::new("fabrics", "fabricId")],
    attributes: &[
        Attribute::computed("id", AttrKind::String)
            .local()
            .preserve_unknown(),
        Attribute::computed("node_id", AttrKind::String)
            .remote("id")
            .preserve_unknown(),
        Attribute::required("fabric_id", AttrKind::String)
            .local()
            .requires_replace()
            .leaf_or_path(),
        Attribute::required("name", AttrKind::String).requires_replace(),
        Attribute::optional_computed("description", AttrKind::String),
        Attribute::optional_computed("enabled", AttrKind::Bool),
        Attribute::required("model_name", AttrKind::String).remote("modelName"),
        Attribute::required("roles", AttrKind::StringSet),
        Attribute::optional("location", AttrKind::String),
        Attribute::optional_computed("serial_number", AttrKind::String).remote("serialNumber"),
        METADATA,
        LABELS,
        ANNOTATIONS,
    ],
};

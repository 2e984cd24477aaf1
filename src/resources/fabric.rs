//! Fabric: the root scope every other resource lives under

use super::{ANNOTATIONS, LABELS, METADATA};
use reconcile::{AttrKind, Attribute, ResourceDescriptor};

pub static FABRIC: ResourceDescriptor = ResourceDescriptor {
    type_name: "fabric",
    collection: "fabrics",
    id_attr: "id",
    leaf_attr: "fabric_id",
    leaf_key: "id",
    parent_attr: None,
    ancestors: &[],
    attributes: &[
        Attribute::computed("id", AttrKind::String)
            .local()
            .preserve_unknown(),
        Attribute::computed("fabric_id", AttrKind::String)
            .remote("id")
            .preserve_unknown(),
        Attribute::required("name", AttrKind::String).requires_replace(),
        Attribute::optional_computed("description", AttrKind::String),
        Attribute::optional_computed("enabled", AttrKind::Bool),
        Attribute::optional("address", AttrKind::String),
        Attribute::optional("location", AttrKind::String),
        METADATA,
        LABELS,
        ANNOTATIONS,
    ],
};

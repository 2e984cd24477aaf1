//! VRF: a routing instance scoped to a fabric

use super::{ANNOTATIONS, LABELS, METADATA};
use reconcile::{Ancestor, AttrKind, Attribute, ResourceDescriptor};

pub static VRF: ResourceDescriptor = ResourceDescriptor {
    type_name: "vrf",
    collection: "vrfs",
    id_attr: "id",
    leaf_attr: "vrf_id",
    leaf_key: "id",
    parent_attr: Some("fabric_id"),
    ancestors: &[Ancestor::new("fabrics", "fabricId")],
    attributes: &[
        Attribute::computed("id", AttrKind::String)
            .local()
            .preserve_unknown(),
        Attribute::computed("vrf_id", AttrKind::String)
            .remote("id")
            .preserve_unknown(),
        Attribute::required("fabric_id", AttrKind::String)
            .local()
            .requires_replace()
            .leaf_or_path(),
        Attribute::required("name", AttrKind::String).requires_replace(),
        Attribute::optional_computed("description", AttrKind::String),
        Attribute::optional_computed("enabled", AttrKind::Bool),
        Attribute::computed("is_default", AttrKind::Bool)
            .remote("isDefault")
            .preserve_unknown(),
        Attribute::optional_computed("asn", AttrKind::Number),
        Attribute::optional_computed("vni", AttrKind::Number),
        Attribute::optional_computed("route_target", AttrKind::String).remote("routeTarget"),
        METADATA,
        LABELS,
        ANNOTATIONS,
    ],
};

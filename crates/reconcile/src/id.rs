//! Composite identifier codec
//!
//! A composite identifier locates a resource under its ancestor chain,
//! relative to a root scope (the fabric):
//!
//! ```text
//! <rootId>/<collection>/<id>(/<collection>/<id>)*
//! fabricA/nodes/node1/breakouts/brk1
//! ```
//!
//! A bare value without `/` is a valid leaf identifier on its own.

use crate::error::{Error, Result};
use std::fmt;

const DELIMITER: char = '/';

/// One `(collection, id)` step of a composite identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Segment {
    pub collection: String,
    pub id: String,
}

impl Segment {
    pub fn new(collection: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            id: id.into(),
        }
    }
}

impl<C: Into<String>, I: Into<String>> From<(C, I)> for Segment {
    fn from((collection, id): (C, I)) -> Self {
        Self::new(collection, id)
    }
}

/// A decoded composite identifier: root id plus ordered segments
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CompositeId {
    root: String,
    segments: Vec<Segment>,
}

impl CompositeId {
    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Leaf id: the last segment's id, or the root when there are none
    pub fn leaf(&self) -> &str {
        self.segments.last().map_or(&self.root, |s| &s.id)
    }

    /// The identifier of the parent resource, if any
    pub fn parent(&self) -> Option<CompositeId> {
        let (_, ancestors) = self.segments.split_last()?;
        Some(CompositeId {
            root: self.root.clone(),
            segments: ancestors.to_vec(),
        })
    }

    pub fn into_parts(self) -> (String, Vec<Segment>) {
        (self.root, self.segments)
    }
}

impl fmt::Display for CompositeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.root)?;
        for segment in &self.segments {
            write!(f, "{DELIMITER}{}{DELIMITER}{}", segment.collection, segment.id)?;
        }
        Ok(())
    }
}

pub(crate) fn check_component(value: &str, reason_empty: &'static str) -> Result<()> {
    if value.is_empty() {
        return Err(Error::InvalidSegment {
            segment: value.to_string(),
            reason: reason_empty,
        });
    }
    if value.contains(DELIMITER) {
        return Err(Error::InvalidSegment {
            segment: value.to_string(),
            reason: "component must not contain '/'",
        });
    }
    Ok(())
}

/// Build a composite identifier from a root id, the ancestor segments and
/// the resource's own segment.
///
/// Fails with [`Error::InvalidSegment`] if any component is empty or
/// contains the delimiter.
pub fn compose(root: &str, ancestors: &[Segment], own: Option<&Segment>) -> Result<CompositeId> {
    check_component(root, "root id is empty")?;
    let mut segments = Vec::with_capacity(ancestors.len() + 1);
    for segment in ancestors.iter().chain(own) {
        check_component(&segment.collection, "collection name is empty")?;
        check_component(&segment.id, "id is empty")?;
        segments.push(segment.clone());
    }
    Ok(CompositeId {
        root: root.to_string(),
        segments,
    })
}

/// Parse a composite path that must hold exactly `expected_segments`
/// `collection/id` groups after the root id.
pub fn decompose(path: &str, expected_segments: usize) -> Result<CompositeId> {
    let malformed = || Error::MalformedPath {
        path: path.to_string(),
        expected: format!("<root>{}", "/<collection>/<id>".repeat(expected_segments)),
    };

    let mut parts = path.split(DELIMITER);
    let root = parts.next().filter(|r| !r.is_empty()).ok_or_else(malformed)?;
    let rest: Vec<&str> = parts.collect();
    if rest.len() != expected_segments * 2 || rest.iter().any(|p| p.is_empty()) {
        return Err(malformed());
    }

    let segments = rest
        .chunks_exact(2)
        .map(|pair| Segment::new(pair[0], pair[1]))
        .collect();

    Ok(CompositeId {
        root: root.to_string(),
        segments,
    })
}

/// The substring after the final `/`, or the whole input if it has none.
pub fn leaf_id(path: &str) -> &str {
    path.rsplit_once(DELIMITER).map_or(path, |(_, leaf)| leaf)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain() -> Vec<Segment> {
        vec![Segment::new("nodes", "N1")]
    }

    #[test]
    fn test_compose_breakout_path() {
        let own = Segment::new("breakouts", "B1");
        let id = compose("F1", &chain(), Some(&own)).unwrap();
        assert_eq!(id.to_string(), "F1/nodes/N1/breakouts/B1");
        assert_eq!(id.leaf(), "B1");
    }

    #[test]
    fn test_compose_root_only() {
        let id = compose("F1", &[], None).unwrap();
        assert_eq!(id.to_string(), "F1");
        assert_eq!(id.leaf(), "F1");
        assert!(id.parent().is_none());
    }

    #[test]
    fn test_compose_rejects_empty_components() {
        let own = Segment::new("breakouts", "");
        let err = compose("F1", &chain(), Some(&own)).unwrap_err();
        assert!(matches!(err, Error::InvalidSegment { .. }));

        let err = compose("", &chain(), None).unwrap_err();
        assert!(matches!(err, Error::InvalidSegment { .. }));

        let err = compose("F1", &[Segment::new("", "N1")], None).unwrap_err();
        assert!(matches!(err, Error::InvalidSegment { .. }));
    }

    #[test]
    fn test_compose_rejects_path_as_leaf() {
        let own = Segment::new("breakouts", "N1/breakouts/B1");
        let err = compose("F1", &[], Some(&own)).unwrap_err();
        assert!(matches!(err, Error::InvalidSegment { .. }));
    }

    #[test]
    fn test_decompose_breakout_path() {
        let id = decompose("F1/nodes/N1/breakouts/B1", 2).unwrap();
        assert_eq!(id.root(), "F1");
        assert_eq!(
            id.segments(),
            &[Segment::new("nodes", "N1"), Segment::new("breakouts", "B1")]
        );
        assert_eq!(id.parent().unwrap().to_string(), "F1/nodes/N1");
    }

    #[test]
    fn test_decompose_wrong_count() {
        let err = decompose("F1/nodes/N1/breakouts/B1", 1).unwrap_err();
        assert!(matches!(err, Error::MalformedPath { .. }));
        let err = decompose("F1/nodes/N1", 2).unwrap_err();
        assert!(matches!(err, Error::MalformedPath { .. }));
        let err = decompose("F1/nodes", 1).unwrap_err();
        assert!(matches!(err, Error::MalformedPath { .. }));
    }

    #[test]
    fn test_decompose_missing_root() {
        let err = decompose("/nodes/N1", 1).unwrap_err();
        assert!(matches!(err, Error::MalformedPath { .. }));
        let err = decompose("", 0).unwrap_err();
        assert!(matches!(err, Error::MalformedPath { .. }));
    }

    #[test]
    fn test_decompose_empty_group() {
        let err = decompose("F1/nodes//breakouts/B1", 2).unwrap_err();
        assert!(matches!(err, Error::MalformedPath { .. }));
    }

    #[test]
    fn test_decompose_inverts_compose() {
        let cases = [
            ("fabricA", vec![], Segment::new("vrfs", "v1")),
            ("F1", chain(), Segment::new("breakouts", "B1")),
            (
                "r",
                vec![Segment::new("a", "1"), Segment::new("b", "2")],
                Segment::new("c", "3"),
            ),
        ];
        for (root, ancestors, own) in cases {
            let path = compose(root, &ancestors, Some(&own)).unwrap().to_string();
            let back = decompose(&path, ancestors.len() + 1).unwrap();
            let mut expected = ancestors.clone();
            expected.push(own);
            assert_eq!(back.root(), root);
            assert_eq!(back.segments(), expected.as_slice());
        }
    }

    #[test]
    fn test_leaf_id() {
        assert_eq!(leaf_id("F1/nodes/N1/breakouts/B1"), "B1");
        assert_eq!(leaf_id("B1"), "B1");
        assert_eq!(leaf_id(""), "");
        assert_eq!(leaf_id("F1/"), "");
    }

    #[test]
    fn test_leaf_id_idempotent() {
        for input in ["F1/nodes/N1", "N1", "a/b/c/d/e", "", "/", "x/"] {
            assert_eq!(leaf_id(leaf_id(input)), leaf_id(input));
        }
    }
}

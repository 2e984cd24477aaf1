//! The remote side of reconciliation

use crate::error::Result;
use crate::merge::RemoteSnapshot;

/// REST collaborator the engine talks to.
///
/// Paths are relative to the API root and built from composite
/// identifiers, e.g. `fabrics/F1/nodes/N1/breakouts/B1`. Implementations
/// own transport concerns such as authentication, retry and URL prefixes.
pub trait Collaborator: Send + Sync {
    /// Fetch a single resource. `Ok(None)` means it does not exist.
    fn fetch(&self, path: &str) -> Result<Option<RemoteSnapshot>>;

    /// Create a resource in `collection` under `parent_path` (empty for
    /// root collections), returning the created resource as reported by
    /// the remote.
    fn create(
        &self,
        parent_path: &str,
        collection: &str,
        payload: RemoteSnapshot,
    ) -> Result<RemoteSnapshot>;

    /// Replace the writable attributes of an existing resource
    fn update(&self, path: &str, payload: RemoteSnapshot) -> Result<RemoteSnapshot>;

    /// Delete a resource. Deleting something already gone is not an error.
    fn delete(&self, path: &str) -> Result<()>;
}

/// Join a collection onto a parent path
pub fn child_path(parent_path: &str, collection: &str) -> String {
    if parent_path.is_empty() {
        collection.to_string()
    } else {
        format!("{parent_path}/{collection}")
    }
}

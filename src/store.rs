//! Durable, diagram-content-addressed geometry overrides. One store instance
//! is constructed at startup and passed by reference; keys are node ids and
//! composite edge keys, shared across every diagram whose content produces
//! the same keys.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::geometry::{Point, Rect};

pub const STORE_FILE_NAME: &str = "node_positions.json";

/// Persisted edge interaction state. All fields optional so gestures can
/// merge field-wise without clobbering what another gesture set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EdgeOverride {
    #[serde(default)]
    pub use_bezier: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_offset: Option<Point>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_offset: Option<Point>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub control1: Option<Point>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub control2: Option<Point>,
}

impl EdgeOverride {
    /// Field-wise merge: `Some` fields of `patch` win, `None` fields keep the
    /// stored value. `use_bezier` always follows the patch.
    pub fn merge(&mut self, patch: &EdgeOverride) {
        self.use_bezier = patch.use_bezier;
        if patch.start_offset.is_some() {
            self.start_offset = patch.start_offset;
        }
        if patch.end_offset.is_some() {
            self.end_offset = patch.end_offset;
        }
        if patch.control1.is_some() {
            self.control1 = patch.control1;
        }
        if patch.control2.is_some() {
            self.control2 = patch.control2;
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreFile {
    #[serde(default)]
    nodes: BTreeMap<String, Rect>,
    #[serde(default)]
    edges: BTreeMap<String, EdgeOverride>,
}

#[derive(Debug)]
pub struct PositionStore {
    path: PathBuf,
    nodes: BTreeMap<String, Rect>,
    edges: BTreeMap<String, EdgeOverride>,
}

impl PositionStore {
    /// Open the store at `path`. An unreadable or corrupt file starts the
    /// store empty; persistence problems are never fatal.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let (nodes, edges) = match fs::read_to_string(&path) {
            Ok(contents) => parse_store(&contents),
            Err(_) => (BTreeMap::new(), BTreeMap::new()),
        };
        Self { path, nodes, edges }
    }

    /// Project-local store file, the unpackaged default. A packaged shell
    /// passes its own per-user path to `open` instead.
    pub fn at_default_path() -> Self {
        Self::open(PathBuf::from(STORE_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn node_override(&self, id: &str) -> Option<Rect> {
        self.nodes.get(id).copied()
    }

    pub fn edge_override(&self, key: &str) -> Option<&EdgeOverride> {
        self.edges.get(key)
    }

    pub fn has_custom_layout(&self) -> bool {
        !self.nodes.is_empty()
    }

    pub fn node_overrides(&self) -> &BTreeMap<String, Rect> {
        &self.nodes
    }

    pub fn edge_overrides(&self) -> &BTreeMap<String, EdgeOverride> {
        &self.edges
    }

    /// Durable immediately: every completed gesture writes through.
    pub fn set_node_override(&mut self, id: &str, rect: Rect) -> Result<(), Error> {
        self.nodes.insert(id.to_string(), rect);
        self.persist()
    }

    pub fn merge_edge_override(&mut self, key: &str, patch: &EdgeOverride) -> Result<(), Error> {
        self.edges.entry(key.to_string()).or_default().merge(patch);
        self.persist()
    }

    pub fn remove_node_override(&mut self, id: &str) -> Result<(), Error> {
        self.nodes.remove(id);
        self.persist()
    }

    pub fn remove_edge_override(&mut self, key: &str) -> Result<(), Error> {
        self.edges.remove(key);
        self.persist()
    }

    /// Reset-all: drops every node and edge override.
    pub fn clear(&mut self) -> Result<(), Error> {
        self.nodes.clear();
        self.edges.clear();
        self.persist()
    }

    /// Replace the whole contents, used when opening a saved document.
    pub fn replace(
        &mut self,
        nodes: BTreeMap<String, Rect>,
        edges: BTreeMap<String, EdgeOverride>,
    ) -> Result<(), Error> {
        self.nodes = sanitize_nodes(nodes);
        self.edges = edges;
        self.persist()
    }

    /// Write-then-rename so an abrupt termination never leaves a truncated
    /// store behind.
    fn persist(&self) -> Result<(), Error> {
        let persist_err = |source| Error::Persistence {
            path: self.path.clone(),
            source,
        };
        let file = StoreFile {
            nodes: self.nodes.clone(),
            edges: self.edges.clone(),
        };
        let payload = serde_json::to_string_pretty(&file).map_err(|e| persist_err(e.into()))?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, payload).map_err(persist_err)?;
        fs::rename(&tmp, &self.path).map_err(persist_err)
    }
}

/// Accepts both the enveloped `{nodes, edges}` layout and the legacy flat
/// node map written by early versions.
fn parse_store(contents: &str) -> (BTreeMap<String, Rect>, BTreeMap<String, EdgeOverride>) {
    if let Ok(file) = serde_json::from_str::<StoreFile>(contents)
        && let Ok(value) = serde_json::from_str::<serde_json::Value>(contents)
        && (value.get("nodes").is_some() || value.get("edges").is_some())
    {
        return (sanitize_nodes(file.nodes), file.edges);
    }
    match serde_json::from_str::<BTreeMap<String, Rect>>(contents) {
        Ok(nodes) => (sanitize_nodes(nodes), BTreeMap::new()),
        Err(_) => (BTreeMap::new(), BTreeMap::new()),
    }
}

/// Override geometry must keep strictly positive dimensions; entries that
/// do not are treated as corrupt and dropped.
fn sanitize_nodes(mut nodes: BTreeMap<String, Rect>) -> BTreeMap<String, Rect> {
    nodes.retain(|_, rect| rect.width > 0.0 && rect.height > 0.0);
    nodes
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    static COUNTER: AtomicU32 = AtomicU32::new(0);

    fn temp_store_path() -> PathBuf {
        let n = COUNTER.fetch_add(1, Ordering::SeqCst);
        std::env::temp_dir().join(format!(
            "manodiag-store-{}-{n}.json",
            std::process::id()
        ))
    }

    #[test]
    fn set_and_reload_node_override() {
        let path = temp_store_path();
        let mut store = PositionStore::open(&path);
        store
            .set_node_override("A", Rect::new(10.0, 20.0, 100.0, 50.0))
            .unwrap();

        let reopened = PositionStore::open(&path);
        assert_eq!(
            reopened.node_override("A"),
            Some(Rect::new(10.0, 20.0, 100.0, 50.0))
        );
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn edge_override_merges_field_wise() {
        let path = temp_store_path();
        let mut store = PositionStore::open(&path);
        store
            .merge_edge_override(
                "A|B||arrow",
                &EdgeOverride {
                    use_bezier: true,
                    control1: Some(Point::new(1.0, 2.0)),
                    ..Default::default()
                },
            )
            .unwrap();
        store
            .merge_edge_override(
                "A|B||arrow",
                &EdgeOverride {
                    use_bezier: true,
                    end_offset: Some(Point::new(3.0, 4.0)),
                    ..Default::default()
                },
            )
            .unwrap();

        let stored = store.edge_override("A|B||arrow").unwrap();
        assert!(stored.use_bezier);
        assert_eq!(stored.control1, Some(Point::new(1.0, 2.0)));
        assert_eq!(stored.end_offset, Some(Point::new(3.0, 4.0)));
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn remove_drops_single_entries() {
        let path = temp_store_path();
        let mut store = PositionStore::open(&path);
        store
            .set_node_override("A", Rect::new(0.0, 0.0, 10.0, 10.0))
            .unwrap();
        store
            .merge_edge_override("A|B||arrow", &EdgeOverride::default())
            .unwrap();

        store.remove_node_override("A").unwrap();
        store.remove_edge_override("A|B||arrow").unwrap();
        assert!(store.node_override("A").is_none());
        assert!(store.edge_override("A|B||arrow").is_none());
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn corrupt_file_starts_empty() {
        let path = temp_store_path();
        fs::write(&path, "{ not json").unwrap();
        let store = PositionStore::open(&path);
        assert!(!store.has_custom_layout());
        assert!(store.edge_overrides().is_empty());
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn non_positive_dimensions_are_dropped_on_load() {
        let path = temp_store_path();
        fs::write(
            &path,
            r#"{"nodes":{"A":{"x":10.0,"y":20.0,"width":-50.0,"height":0.0},"B":{"x":0.0,"y":0.0,"width":80.0,"height":40.0}}}"#,
        )
        .unwrap();
        let store = PositionStore::open(&path);
        assert!(store.node_override("A").is_none());
        assert_eq!(
            store.node_override("B"),
            Some(Rect::new(0.0, 0.0, 80.0, 40.0))
        );
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn legacy_flat_format_loads_as_nodes() {
        let path = temp_store_path();
        fs::write(&path, r#"{"A":{"x":1.0,"y":2.0,"width":30.0,"height":40.0}}"#).unwrap();
        let store = PositionStore::open(&path);
        assert_eq!(store.node_override("A"), Some(Rect::new(1.0, 2.0, 30.0, 40.0)));
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn clear_removes_everything_durably() {
        let path = temp_store_path();
        let mut store = PositionStore::open(&path);
        store
            .set_node_override("A", Rect::new(0.0, 0.0, 10.0, 10.0))
            .unwrap();
        store.clear().unwrap();

        let reopened = PositionStore::open(&path);
        assert!(!reopened.has_custom_layout());
        let _ = fs::remove_file(&path);
    }
}

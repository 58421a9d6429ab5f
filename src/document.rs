//! `.manodiag.json` save files: diagram text, the override maps, and display
//! settings in one envelope, so a document restores on any machine without
//! the shared position store.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::geometry::Rect;
use crate::store::{EdgeOverride, PositionStore};
use std::collections::BTreeMap;

pub const DOCUMENT_FORMAT: &str = "manodiag";
pub const DOCUMENT_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagramSource {
    pub text: String,
}

/// View settings carried alongside the diagram. Colors are hex strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplaySettings {
    pub show_grid: bool,
    pub antialiasing: bool,
    pub node_color: String,
    pub border_color: String,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            show_grid: true,
            antialiasing: true,
            node_color: "#DCDDFF".to_string(),
            border_color: "#6464C8".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub format: String,
    pub version: u32,
    pub diagram: DiagramSource,
    #[serde(default)]
    pub nodes: BTreeMap<String, Rect>,
    #[serde(default)]
    pub edges: BTreeMap<String, EdgeOverride>,
    #[serde(default)]
    pub settings: DisplaySettings,
}

pub fn save_document(
    path: impl AsRef<Path>,
    text: &str,
    store: &PositionStore,
    settings: &DisplaySettings,
) -> Result<(), Error> {
    let path = path.as_ref();
    let document = Document {
        format: DOCUMENT_FORMAT.to_string(),
        version: DOCUMENT_VERSION,
        diagram: DiagramSource {
            text: text.to_string(),
        },
        nodes: store.node_overrides().clone(),
        edges: store.edge_overrides().clone(),
        settings: settings.clone(),
    };
    let ser_err = |source| Error::Serialization {
        path: path.to_path_buf(),
        source,
    };
    let payload = serde_json::to_string_pretty(&document).map_err(|e| ser_err(e.into()))?;
    fs::write(path, payload).map_err(ser_err)
}

/// Load a document and adopt its overrides as the store's new contents. A
/// missing or corrupt file is reported, never a panic; the store is only
/// touched after the document parsed.
pub fn load_document(path: impl AsRef<Path>, store: &mut PositionStore) -> Result<Document, Error> {
    let path = path.as_ref();
    let doc_err = |reason: String| Error::Document {
        path: path.to_path_buf(),
        reason,
    };
    let contents = fs::read_to_string(path).map_err(|e| doc_err(e.to_string()))?;
    let document: Document =
        serde_json::from_str(&contents).map_err(|e| doc_err(e.to_string()))?;
    if document.format != DOCUMENT_FORMAT {
        return Err(doc_err(format!("unknown format {:?}", document.format)));
    }
    if document.version > DOCUMENT_VERSION {
        return Err(doc_err(format!(
            "unsupported version {}",
            document.version
        )));
    }
    store.replace(document.nodes.clone(), document.edges.clone())?;
    Ok(document)
}

//! Document sources: byte-level loaders keyed by logical resource name.
//!
//! A screen called `home` lives at `home.json` in a [`DirectorySource`],
//! the theme at `theme.json`, components at `components.json`. Absence is
//! reported as [`DocumentError::NotFound`] so callers can treat it as
//! "feature not present".

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use tessera_core::ViewNode;
use tracing::debug;

use crate::error::DocumentError;

pub const THEME_DOCUMENT: &str = "theme";
pub const COMPONENTS_DOCUMENT: &str = "components";

pub trait DocumentSource: Send + Sync {
    /// Raw bytes of the named document.
    fn load(&self, name: &str) -> Result<Vec<u8>, DocumentError>;
}

/// Decode a named document into any serde shape.
pub fn load_json<T: DeserializeOwned>(
    source: &dyn DocumentSource,
    name: &str,
) -> Result<T, DocumentError> {
    let bytes = source.load(name)?;
    serde_json::from_slice(&bytes).map_err(|e| DocumentError::Decode {
        name: name.to_string(),
        source: e,
    })
}

/// Load and decode a screen's root node.
pub fn load_screen(source: &dyn DocumentSource, name: &str) -> Result<ViewNode, DocumentError> {
    load_json(source, name)
}

// ──────────────────────────────────────────────
// DirectorySource
// ──────────────────────────────────────────────

/// Reads `<root>/<name>.json`.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        DirectorySource { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path for a document name. Names that would escape the root
    /// (separators, `..`) have no path.
    fn document_path(&self, name: &str) -> Option<PathBuf> {
        if name.is_empty() || name.contains(['/', '\\']) || name.contains("..") {
            return None;
        }
        Some(self.root.join(format!("{}.json", name)))
    }
}

impl DocumentSource for DirectorySource {
    fn load(&self, name: &str) -> Result<Vec<u8>, DocumentError> {
        let not_found = || DocumentError::NotFound {
            name: name.to_string(),
        };
        let path = self.document_path(name).ok_or_else(not_found)?;
        match std::fs::read(&path) {
            Ok(bytes) => {
                debug!(path = %path.display(), bytes = bytes.len(), "loaded document");
                Ok(bytes)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(not_found()),
            Err(source) => Err(DocumentError::Io { path, source }),
        }
    }
}

// ──────────────────────────────────────────────
// MemorySource
// ──────────────────────────────────────────────

/// Documents held in memory, keyed by name.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    documents: HashMap<String, Vec<u8>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(mut self, name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        self.insert(name, bytes);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        self.documents.insert(name.into(), bytes.into());
    }

    pub fn remove(&mut self, name: &str) -> Option<Vec<u8>> {
        self.documents.remove(name)
    }
}

impl DocumentSource for MemorySource {
    fn load(&self, name: &str) -> Result<Vec<u8>, DocumentError> {
        self.documents
            .get(name)
            .cloned()
            .ok_or_else(|| DocumentError::NotFound {
                name: name.to_string(),
            })
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directory_source_reads_named_json() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("home.json"), br#"{"type":"screen"}"#).unwrap();
        let source = DirectorySource::new(dir.path());

        let screen = load_screen(&source, "home").unwrap();
        assert_eq!(screen.node_type, "screen");
    }

    #[test]
    fn directory_source_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let source = DirectorySource::new(dir.path());
        let err = source.load("absent").unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn names_cannot_escape_the_root() {
        let dir = tempfile::tempdir().unwrap();
        let inner = dir.path().join("screens");
        std::fs::create_dir(&inner).unwrap();
        std::fs::write(dir.path().join("secret.json"), b"{}").unwrap();
        let source = DirectorySource::new(&inner);

        assert!(source.load("../secret").unwrap_err().is_not_found());
        assert!(source.load("a/b").unwrap_err().is_not_found());
        assert!(source.load("").unwrap_err().is_not_found());
    }

    #[test]
    fn malformed_document_is_a_decode_error() {
        let source = MemorySource::new().with_document("home", "{not json");
        assert!(matches!(
            load_screen(&source, "home"),
            Err(DocumentError::Decode { .. })
        ));
    }

    #[test]
    fn memory_source_round_trip() {
        let mut source = MemorySource::new();
        source.insert("theme", br#"{"colors":{}}"#.to_vec());
        assert_eq!(source.load("theme").unwrap(), br#"{"colors":{}}"#.to_vec());
        source.remove("theme");
        assert!(source.load("theme").unwrap_err().is_not_found());
    }
}

//! Document persistence seam

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use tracing::debug;

use crate::document::Document;
use crate::error::{GenerationError, Result};

/// Loads templates and saves generated documents.
///
/// Hosts plug real docx/xlsx codecs in here. Saving must create missing
/// parent directories.
pub trait DocumentStore {
    /// Load the document at `path`
    fn load(&self, path: &Path) -> Result<Document>;

    /// Save `document` to `path`, replacing any existing file
    fn save(&self, path: &Path, document: &Document) -> Result<()>;
}

/// Documents kept in memory, keyed by path
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    documents: RwLock<BTreeMap<PathBuf, Document>>,
}

impl MemoryDocumentStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a document, typically a template
    pub fn insert(&self, path: impl Into<PathBuf>, document: Document) -> Result<()> {
        let path = path.into();
        let mut documents = self.documents.write().map_err(|_| poisoned(&path))?;
        documents.insert(path, document);
        Ok(())
    }

    /// Copy of the document at `path`
    pub fn get(&self, path: &Path) -> Option<Document> {
        self.documents
            .read()
            .ok()
            .and_then(|documents| documents.get(path).cloned())
    }

    /// Every stored path, sorted
    pub fn paths(&self) -> Vec<PathBuf> {
        self.documents
            .read()
            .map(|documents| documents.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Stored paths under `root`, sorted
    pub fn paths_under(&self, root: &Path) -> Vec<PathBuf> {
        self.paths()
            .into_iter()
            .filter(|path| path.starts_with(root))
            .collect()
    }
}

fn poisoned(path: &Path) -> GenerationError {
    GenerationError::Store {
        path: path.to_path_buf(),
        message: "document store lock poisoned".to_string(),
    }
}

impl DocumentStore for MemoryDocumentStore {
    fn load(&self, path: &Path) -> Result<Document> {
        let documents = self.documents.read().map_err(|_| poisoned(path))?;
        documents
            .get(path)
            .cloned()
            .ok_or_else(|| GenerationError::Store {
                path: path.to_path_buf(),
                message: "no such document".to_string(),
            })
    }

    fn save(&self, path: &Path, document: &Document) -> Result<()> {
        let mut documents = self.documents.write().map_err(|_| poisoned(path))?;
        documents.insert(path.to_path_buf(), document.clone());
        Ok(())
    }
}

/// Documents stored as JSON files on disk
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonDocumentStore;

impl JsonDocumentStore {
    /// Create a store
    pub fn new() -> Self {
        Self
    }
}

impl DocumentStore for JsonDocumentStore {
    fn load(&self, path: &Path) -> Result<Document> {
        let content = fs::read_to_string(path).map_err(|e| GenerationError::Store {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Ok(serde_json::from_str(&content)?)
    }

    fn save(&self, path: &Path, document: &Document) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(document)?;
        fs::write(path, content)?;
        debug!("Wrote {}", path.display());
        Ok(())
    }
}

//! Document loading
//!
//! The passes never read files themselves; they go through a [`Loader`].
//! [`FileLoader`] reads YAML or JSON from disk, [`MemoryLoader`] serves named
//! documents from memory.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result, SourceLocation};
use crate::value::Value;

/// Source of documents for the root config and for `${file.yaml}` inclusions
pub trait Loader: Send + Sync {
    /// Load and parse the document at `path`
    fn load(&self, path: &str) -> Result<Value>;
}

/// Parse a YAML document
pub fn parse_yaml(text: &str) -> Result<Value> {
    serde_yaml::from_str(text).map_err(|e| Error::parse(e.to_string()))
}

/// Parse a JSON document
pub fn parse_json(text: &str) -> Result<Value> {
    serde_json::from_str(text).map_err(|e| Error::parse(e.to_string()))
}

fn source(file: &Path) -> SourceLocation {
    SourceLocation {
        file: file.display().to_string(),
        line: None,
        column: None,
    }
}

/// Loads documents from the filesystem
///
/// Relative paths are joined to `base_path` when one is set, otherwise they
/// are taken relative to the working directory.
#[derive(Debug, Clone, Default)]
pub struct FileLoader {
    base_path: Option<PathBuf>,
}

impl FileLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve relative paths against `base_path`
    pub fn with_base_path(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: Some(base_path.into()),
        }
    }

    pub fn base_path(&self) -> Option<&Path> {
        self.base_path.as_deref()
    }

    fn full_path(&self, path: &str) -> PathBuf {
        let path = Path::new(path);
        match &self.base_path {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }
}

impl Loader for FileLoader {
    fn load(&self, path: &str) -> Result<Value> {
        let full_path = self.full_path(path);
        log::debug!("Loading document {}", full_path.display());

        let content = std::fs::read_to_string(&full_path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::file_not_found(full_path.display().to_string())
            } else {
                Error::io(full_path.display().to_string(), e.to_string())
            }
        })?;

        let parsed = match full_path.extension().and_then(|e| e.to_str()) {
            Some("json") => parse_json(&content),
            _ => parse_yaml(&content),
        };
        parsed.map_err(|e| e.with_source_location(source(&full_path)))
    }
}

/// Serves YAML documents registered by name
#[derive(Debug, Clone, Default)]
pub struct MemoryLoader {
    documents: HashMap<String, String>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a document, replacing any previous one with the same name
    pub fn with_document(mut self, path: impl Into<String>, yaml: impl Into<String>) -> Self {
        self.insert(path, yaml);
        self
    }

    pub fn insert(&mut self, path: impl Into<String>, yaml: impl Into<String>) {
        self.documents.insert(path.into(), yaml.into());
    }
}

impl Loader for MemoryLoader {
    fn load(&self, path: &str) -> Result<Value> {
        let text = self
            .documents
            .get(path)
            .ok_or_else(|| Error::file_not_found(path))?;
        parse_yaml(text).map_err(|e| {
            e.with_source_location(SourceLocation {
                file: path.to_string(),
                line: None,
                column: None,
            })
        })
    }
}

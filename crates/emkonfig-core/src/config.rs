//! Main Emkonfig type
//!
//! Emkonfig owns a raw document and the pipeline that resolves it. The
//! resolved tree is computed on first access and cached.

use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use crate::error::{Error, Result};
use crate::loader::{parse_yaml, FileLoader, Loader};
use crate::pipeline::Pipeline;
use crate::registry::SlugRegistry;
use crate::value::Value;

/// Configuration options for loading configs
#[derive(Debug, Clone, Default)]
pub struct ConfigOptions {
    /// Base path for relative `${file.yaml}` inclusions (working directory when unset)
    pub base_path: Option<PathBuf>,
}

impl ConfigOptions {
    fn loader(&self) -> FileLoader {
        match &self.base_path {
            Some(base) => FileLoader::with_base_path(base),
            None => FileLoader::new(),
        }
    }
}

/// A raw configuration document together with its resolution pipeline
pub struct Emkonfig {
    /// The document as loaded, markers included
    raw: Arc<Value>,
    pipeline: Arc<Pipeline>,
    /// Fully resolved tree, filled by the first `parse`
    resolved: RwLock<Option<Arc<Value>>>,
}

impl Emkonfig {
    /// Create an Emkonfig from a Value and a pipeline
    pub fn new(value: Value, pipeline: Arc<Pipeline>) -> Self {
        Self {
            raw: Arc::new(value),
            pipeline,
            resolved: RwLock::new(None),
        }
    }

    /// Load configuration from a YAML string
    ///
    /// Inclusions are read from disk relative to the working directory.
    pub fn from_yaml(yaml: &str, registry: Arc<SlugRegistry>) -> Result<Self> {
        Self::from_yaml_with_options(yaml, registry, ConfigOptions::default())
    }

    /// Load configuration from a YAML string with options
    pub fn from_yaml_with_options(
        yaml: &str,
        registry: Arc<SlugRegistry>,
        options: ConfigOptions,
    ) -> Result<Self> {
        let value = parse_yaml(yaml)?;
        let pipeline = Pipeline::new(registry, Arc::new(options.loader()));
        Ok(Self::new(value, Arc::new(pipeline)))
    }

    /// Load configuration from a YAML or JSON file
    pub fn load(path: &str, registry: Arc<SlugRegistry>) -> Result<Self> {
        Self::load_with_options(path, registry, ConfigOptions::default())
    }

    /// Load configuration from a file with options
    ///
    /// A relative `path` is joined to `base_path` like any inclusion.
    pub fn load_with_options(
        path: &str,
        registry: Arc<SlugRegistry>,
        options: ConfigOptions,
    ) -> Result<Self> {
        let loader: Arc<dyn Loader> = Arc::new(options.loader());
        let value = loader.load(path)?;
        Ok(Self::new(value, Arc::new(Pipeline::new(registry, loader))))
    }

    /// The document as loaded, before any pass ran
    pub fn raw(&self) -> &Value {
        &self.raw
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Resolve the whole document
    ///
    /// The first call runs the pipeline; later calls return the cached tree
    /// until [`clear_cache`](Self::clear_cache) is called.
    pub fn parse(&self) -> Result<Arc<Value>> {
        {
            let cached = self
                .resolved
                .read()
                .map_err(|_| Error::internal("resolution cache lock poisoned"))?;
            if let Some(resolved) = cached.as_ref() {
                return Ok(Arc::clone(resolved));
            }
        }

        let resolved = Arc::new(self.pipeline.resolve(&self.raw)?);

        let mut cached = self
            .resolved
            .write()
            .map_err(|_| Error::internal("resolution cache lock poisoned"))?;
        *cached = Some(Arc::clone(&resolved));

        Ok(resolved)
    }

    /// Get a resolved value at a dotted path
    pub fn get(&self, path: &str) -> Result<Value> {
        let resolved = self.parse()?;
        resolved.get_path(path).cloned()
    }

    /// Get the raw (unresolved) value at a path
    pub fn get_raw(&self, path: &str) -> Result<&Value> {
        self.raw.get_path(path)
    }

    /// Clear the resolution cache
    pub fn clear_cache(&self) {
        if let Ok(mut cached) = self.resolved.write() {
            *cached = None;
        }
    }
}

impl Clone for Emkonfig {
    /// Shares the raw document and pipeline; the clone starts with an empty cache
    fn clone(&self) -> Self {
        Self {
            raw: Arc::clone(&self.raw),
            pipeline: Arc::clone(&self.pipeline),
            resolved: RwLock::new(None),
        }
    }
}

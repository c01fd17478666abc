//! Pass sequencing
//!
//! A [`Pipeline`] runs one [`Pass`] per [`Syntax`] over the whole document.
//! Each pass sees the tree exactly as the previous pass left it.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::loader::Loader;
use crate::passes::{ClassSlugPass, Pass, ReferenceKeyPass, ReferenceYamlPass};
use crate::registry::SlugRegistry;
use crate::syntax::Syntax;
use crate::value::{Mapping, Value};

/// Ordered set of passes that turns a raw document into a resolved tree
pub struct Pipeline {
    order: Vec<Syntax>,
    passes: HashMap<Syntax, Arc<dyn Pass>>,
    loader: Arc<dyn Loader>,
}

impl Pipeline {
    /// Create the default pipeline: inclusion, then slugs, then references
    pub fn new(registry: Arc<SlugRegistry>, loader: Arc<dyn Loader>) -> Self {
        let passes: [Arc<dyn Pass>; 3] = [
            Arc::new(ReferenceYamlPass::new(
                Arc::clone(&registry),
                Arc::clone(&loader),
            )),
            Arc::new(ClassSlugPass::new(registry)),
            Arc::new(ReferenceKeyPass::new()),
        ];

        Self {
            order: Syntax::DEFAULT_ORDER.to_vec(),
            passes: passes.into_iter().map(|p| (p.syntax(), p)).collect(),
            loader,
        }
    }

    /// Start from the default passes and customize order or pass table
    pub fn builder(registry: Arc<SlugRegistry>, loader: Arc<dyn Loader>) -> PipelineBuilder {
        PipelineBuilder::new(registry, loader)
    }

    /// Syntaxes in the order their passes run
    pub fn order(&self) -> &[Syntax] {
        &self.order
    }

    pub fn loader(&self) -> &Arc<dyn Loader> {
        &self.loader
    }

    /// Resolve a document
    ///
    /// Passes only rewrite mappings; any other root is returned unchanged.
    pub fn resolve(&self, root: &Value) -> Result<Value> {
        match root {
            Value::Mapping(map) => self.resolve_mapping(map).map(Value::Mapping),
            other => Ok(other.clone()),
        }
    }

    /// Run every pass in order over a mapping
    pub fn resolve_mapping(&self, root: &Mapping) -> Result<Mapping> {
        let mut current = root.clone();

        for syntax in &self.order {
            let pass = self
                .passes
                .get(syntax)
                .ok_or_else(|| Error::invalid_pipeline(syntax.as_str()))?;
            log::debug!("Running {} pass", syntax);
            current = pass.apply(&current, &current)?;
        }

        Ok(current)
    }

    /// Load a document through the loader and resolve it
    pub fn resolve_file(&self, path: &str) -> Result<Value> {
        let document = self.loader.load(path)?;
        self.resolve(&document)
    }
}

/// Builder for pipelines with a custom pass order or custom passes
pub struct PipelineBuilder {
    order: Vec<Syntax>,
    passes: HashMap<Syntax, Arc<dyn Pass>>,
    loader: Arc<dyn Loader>,
}

impl PipelineBuilder {
    /// Start from the default order and the default passes
    pub fn new(registry: Arc<SlugRegistry>, loader: Arc<dyn Loader>) -> Self {
        let Pipeline {
            order,
            passes,
            loader,
        } = Pipeline::new(registry, loader);
        Self {
            order,
            passes,
            loader,
        }
    }

    /// Replace the pass order
    pub fn order(mut self, order: Vec<Syntax>) -> Self {
        self.order = order;
        self
    }

    /// Add a pass, replacing the one registered for the same syntax
    pub fn with_pass(mut self, pass: Arc<dyn Pass>) -> Self {
        self.passes.insert(pass.syntax(), pass);
        self
    }

    /// Drop the pass for a syntax
    pub fn without_pass(mut self, syntax: Syntax) -> Self {
        self.passes.remove(&syntax);
        self
    }

    /// Build the pipeline
    ///
    /// # Returns
    /// * `Ok(Pipeline)` when every syntax in the order has a pass
    /// * `Err(Error)` naming the first syntax without one
    pub fn build(self) -> Result<Pipeline> {
        if let Some(missing) = self.order.iter().find(|s| !self.passes.contains_key(*s)) {
            return Err(Error::invalid_pipeline(missing.as_str()));
        }

        Ok(Pipeline {
            order: self.order,
            passes: self.passes,
            loader: self.loader,
        })
    }
}

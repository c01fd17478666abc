//! Class-slug registry
//!
//! Maps short slugs to constructible types. Each type describes its own
//! constructor parameters; default arguments are snapshotted once, when the
//! type is registered, and copied on every expansion.
//!
//! The registry is an ordinary value owned by the application and handed to
//! the pipeline, so separate pipelines can use separate registries.

use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::syntax::PARTIAL_KEY;
use crate::value::{Mapping, Value};

/// One constructor parameter of a registrable type
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    /// Parameter name as the instantiator expects it
    pub name: String,
    /// Default value, `None` for parameters the config must supply
    pub default: Option<Value>,
}

impl Parameter {
    /// A parameter without a default
    pub fn required(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default: None,
        }
    }

    /// A parameter with a default value
    pub fn optional(name: impl Into<String>, default: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            default: Some(default.into()),
        }
    }
}

/// Description of a constructible type: where it lives and what it takes
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDescriptor {
    target: String,
    parameters: Vec<Parameter>,
    partial: bool,
}

impl TypeDescriptor {
    /// Create a descriptor for the fully-qualified target name
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            parameters: Vec::new(),
            partial: false,
        }
    }

    /// Describe a registrable Rust type
    pub fn of<T: Registrable>() -> Self {
        Self {
            target: T::target(),
            parameters: T::parameters(),
            partial: T::partial(),
        }
    }

    /// Add a parameter without a default
    pub fn required(mut self, name: impl Into<String>) -> Self {
        self.parameters.push(Parameter::required(name));
        self
    }

    /// Add a parameter with a default
    pub fn optional(mut self, name: impl Into<String>, default: impl Into<Value>) -> Self {
        self.parameters.push(Parameter::optional(name, default));
        self
    }

    /// Mark the type as partially applied by the instantiator
    pub fn partial(mut self, partial: bool) -> Self {
        self.partial = partial;
        self
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub fn is_partial(&self) -> bool {
        self.partial
    }

    /// Parameter defaults in declaration order; parameters without one are left out
    pub fn default_args(&self) -> Mapping {
        let mut defaults = Mapping::new();
        if self.partial {
            defaults.insert(PARTIAL_KEY.to_string(), Value::Bool(true));
        }
        for param in &self.parameters {
            if let Some(default) = &param.default {
                defaults.insert(param.name.clone(), default.clone());
            }
        }
        defaults
    }
}

/// Implemented by types that can be built from a construction record
///
/// ```rust
/// use emkonfig_core::registry::{Parameter, Registrable, SlugRegistry};
///
/// struct Linear;
///
/// impl Registrable for Linear {
///     fn parameters() -> Vec<Parameter> {
///         vec![Parameter::required("in_features"), Parameter::optional("bias", true)]
///     }
/// }
///
/// let mut registry = SlugRegistry::new();
/// registry.register_type::<Linear>("linear");
/// assert_eq!(registry.get("linear").unwrap().default_args.len(), 1);
/// ```
pub trait Registrable {
    /// Constructor parameters in declaration order
    fn parameters() -> Vec<Parameter>;

    /// Fully-qualified name handed to the instantiator
    fn target() -> String {
        std::any::type_name::<Self>().to_string()
    }

    /// Whether the instantiator should build a partial application
    fn partial() -> bool {
        false
    }
}

/// A registered slug with its defaults snapshot
#[derive(Debug, Clone, PartialEq)]
pub struct RegistryEntry {
    pub slug: String,
    pub target: String,
    pub default_args: Mapping,
}

/// Registry of available class slugs
#[derive(Debug, Clone, Default)]
pub struct SlugRegistry {
    entries: HashMap<String, RegistryEntry>,
}

impl SlugRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a type under a slug, silently replacing any previous entry
    pub fn register(&mut self, slug: impl Into<String>, descriptor: TypeDescriptor) {
        let slug = slug.into();
        let entry = RegistryEntry {
            slug: slug.clone(),
            target: descriptor.target().to_string(),
            default_args: descriptor.default_args(),
        };
        if let Some(previous) = self.entries.insert(slug.clone(), entry) {
            log::debug!(
                "Slug '{}' re-registered: {} replaced by {}",
                slug,
                previous.target,
                descriptor.target()
            );
        } else {
            log::debug!("Registered slug '{}' -> {}", slug, descriptor.target());
        }
    }

    /// Register a type with optional force overwrite.
    ///
    /// # Returns
    /// * `Ok(())` on success
    /// * `Err(Error)` if force=false and the slug is already registered
    pub fn register_with_force(
        &mut self,
        slug: impl Into<String>,
        descriptor: TypeDescriptor,
        force: bool,
    ) -> Result<()> {
        let slug = slug.into();
        if !force && self.entries.contains_key(&slug) {
            return Err(Error::already_registered(slug));
        }
        self.register(slug, descriptor);
        Ok(())
    }

    /// Register a Rust type that describes itself
    pub fn register_type<T: Registrable>(&mut self, slug: impl Into<String>) {
        self.register(slug, TypeDescriptor::of::<T>());
    }

    /// Get an entry by slug
    pub fn get(&self, slug: &str) -> Option<&RegistryEntry> {
        self.entries.get(slug)
    }

    /// Get an entry by slug, failing if it was never registered
    pub fn lookup(&self, slug: &str) -> Result<&RegistryEntry> {
        self.entries
            .get(slug)
            .ok_or_else(|| Error::unknown_slug(slug))
    }

    /// Check if a slug is registered
    pub fn contains(&self, slug: &str) -> bool {
        self.entries.contains_key(slug)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// List all registered slugs (sorted)
    pub fn slugs(&self) -> Vec<&str> {
        let mut slugs: Vec<_> = self.entries.keys().map(|s| s.as_str()).collect();
        slugs.sort();
        slugs
    }

    /// Remove every entry
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

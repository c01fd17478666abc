//! emkonfig-core: Multi-pass configuration resolution
//!
//! A document is rewritten by three passes, in this order:
//!
//! 1. `${path/to/file.yaml}` values are replaced by the included document,
//!    itself fully resolved (under the `_` key it is merged into the parent).
//! 2. `_{slug}` / `_{slug as alias}` keys are expanded into construction
//!    records `{_target_: ..., ..args}` using the types in a [`SlugRegistry`].
//! 3. `${dotted.path[0].key}` values are replaced by the value they point at.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use emkonfig_core::{Emkonfig, SlugRegistry, TypeDescriptor};
//!
//! let mut registry = SlugRegistry::new();
//! registry.register(
//!     "linear",
//!     TypeDescriptor::new("nn.Linear")
//!         .required("in_features")
//!         .optional("bias", true),
//! );
//!
//! let yaml = r#"
//! width: 64
//! _{linear as head}:
//!   in_features: ${width}
//! "#;
//!
//! let config = Emkonfig::from_yaml(yaml, Arc::new(registry)).unwrap();
//! assert_eq!(config.get("head._target_").unwrap().as_str(), Some("nn.Linear"));
//! assert_eq!(config.get("head.in_features").unwrap().as_i64(), Some(64));
//! assert_eq!(config.get("head.bias").unwrap().as_bool(), Some(true));
//! ```

pub mod error;
pub mod loader;
pub mod passes;
pub mod pipeline;
pub mod registry;
pub mod syntax;
pub mod value;

mod config;

pub use config::{ConfigOptions, Emkonfig};
pub use error::{Error, ErrorKind, Result};
pub use loader::{FileLoader, Loader, MemoryLoader};
pub use passes::Pass;
pub use pipeline::{Pipeline, PipelineBuilder};
pub use registry::{Parameter, Registrable, RegistryEntry, SlugRegistry, TypeDescriptor};
pub use syntax::Syntax;
pub use value::{Mapping, Value};

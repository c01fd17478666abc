//! Resolution passes
//!
//! Each pass rewrites the whole document once for a single [`Syntax`]. A pass
//! receives the tree as it stood when the pass started (`full`) and the
//! mapping it is rewriting (`content`); it never mutates either and returns a
//! fresh mapping.

mod class_slug;
mod reference_key;
mod reference_yaml;

pub use class_slug::ClassSlugPass;
pub use reference_key::ReferenceKeyPass;
pub use reference_yaml::ReferenceYamlPass;

use crate::error::Result;
use crate::syntax::Syntax;
use crate::value::Mapping;

/// A single tree rewrite handled by the pipeline
pub trait Pass: Send + Sync {
    /// The syntax this pass expands
    fn syntax(&self) -> Syntax;

    /// Rewrite `content`, looking up global references in `full`
    fn apply(&self, full: &Mapping, content: &Mapping) -> Result<Mapping>;
}

/// Key path of a mapping entry, for error context
fn child_path(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", parent, key)
    }
}

/// Key path of a sequence item, for error context
fn item_path(parent: &str, index: usize) -> String {
    format!("{}[{}]", parent, index)
}

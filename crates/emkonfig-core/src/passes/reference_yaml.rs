//! `${path/to/file.yaml}` inclusion
//!
//! The included document runs through a fresh default pipeline of its own
//! before it is spliced in, so it may itself include files, expand slugs and
//! hold references (resolved against the included document).

use std::sync::Arc;

use super::{child_path, Pass};
use crate::error::{Error, Result};
use crate::loader::Loader;
use crate::pipeline::Pipeline;
use crate::registry::SlugRegistry;
use crate::syntax::{yaml_reference_path, Syntax, MERGE_KEY};
use crate::value::{Mapping, Value};

/// Replaces `${file.yaml}` values with the resolved included document
///
/// Under the `_` key the included mapping is merged into the enclosing
/// mapping instead, and `_` is dropped.
pub struct ReferenceYamlPass {
    registry: Arc<SlugRegistry>,
    loader: Arc<dyn Loader>,
}

impl ReferenceYamlPass {
    pub fn new(registry: Arc<SlugRegistry>, loader: Arc<dyn Loader>) -> Self {
        Self { registry, loader }
    }

    fn include(&self, path: &str) -> Result<Value> {
        log::debug!("Including {}", path);
        Pipeline::new(Arc::clone(&self.registry), Arc::clone(&self.loader)).resolve_file(path)
    }

    fn resolve_mapping(&self, content: &Mapping, at: &str) -> Result<Mapping> {
        let mut resolved = content.clone();

        for (key, value) in content {
            let key_path = child_path(at, key);
            match value {
                Value::Mapping(map) => {
                    let nested = self.resolve_mapping(map, &key_path)?;
                    resolved.insert(key.clone(), Value::Mapping(nested));
                }
                Value::String(s) => {
                    let Some(path) = yaml_reference_path(s) else {
                        continue;
                    };
                    let included = self
                        .include(path)
                        .map_err(|e| e.with_path(key_path.clone()))?;

                    if key == MERGE_KEY {
                        match included {
                            Value::Mapping(map) => resolved.extend(map),
                            other => {
                                return Err(Error::invalid_shape(
                                    "mapping for a merged inclusion",
                                    other.type_name(),
                                )
                                .with_path(key_path))
                            }
                        }
                        resolved.shift_remove(MERGE_KEY);
                    } else {
                        resolved.insert(key.clone(), included);
                    }
                }
                _ => {}
            }
        }

        Ok(resolved)
    }
}

impl Pass for ReferenceYamlPass {
    fn syntax(&self) -> Syntax {
        Syntax::ReferenceYaml
    }

    fn apply(&self, _full: &Mapping, content: &Mapping) -> Result<Mapping> {
        self.resolve_mapping(content, "")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::loader::{parse_yaml, MemoryLoader};
    use crate::registry::TypeDescriptor;
    use pretty_assertions::assert_eq;

    fn pass(loader: MemoryLoader) -> ReferenceYamlPass {
        let mut registry = SlugRegistry::new();
        registry.register("optim", TypeDescriptor::new("torch.optim.Adam").optional("lr", 0.001));
        ReferenceYamlPass::new(Arc::new(registry), Arc::new(loader))
    }

    fn apply(pass: &ReferenceYamlPass, yaml: &str) -> Result<Mapping> {
        let doc = parse_yaml(yaml).unwrap();
        let map = doc.as_mapping().unwrap();
        pass.apply(map, map)
    }

    #[test]
    fn test_include_assigns_under_key() {
        let pass = pass(MemoryLoader::new().with_document("db.yaml", "host: localhost\nport: 5432\n"));
        let resolved = apply(&pass, "name: app\ndatabase: ${db.yaml}\n").unwrap();

        assert_eq!(
            Value::Mapping(resolved),
            parse_yaml("name: app\ndatabase:\n  host: localhost\n  port: 5432\n").unwrap()
        );
    }

    #[test]
    fn test_include_merges_under_underscore() {
        let pass = pass(MemoryLoader::new().with_document("base.yaml", "a: 10\nc: 3\n"));
        let resolved = apply(&pass, "a: 1\n_: ${base.yaml}\nb: 2\n").unwrap();
        let keys: Vec<&str> = resolved.keys().map(|k| k.as_str()).collect();

        // existing keys keep their position, new ones are appended, `_` is gone
        assert_eq!(keys, vec!["a", "b", "c"]);
        assert_eq!(resolved["a"], Value::Integer(10));
        assert_eq!(resolved["c"], Value::Integer(3));
    }

    #[test]
    fn test_include_in_nested_mapping() {
        let pass = pass(MemoryLoader::new().with_document("leaf.yaml", "x: 1\n"));
        let resolved = apply(&pass, "outer:\n  inner: ${leaf.yaml}\n").unwrap();

        assert_eq!(
            Value::Mapping(resolved).get_path("outer.inner.x").unwrap(),
            &Value::Integer(1)
        );
    }

    #[test]
    fn test_included_document_is_fully_resolved() {
        let loader = MemoryLoader::new()
            .with_document("train.yaml", "_{optim}:\n  lr: 0.1\nsteps: 10\nlimit: ${steps}\nmore: ${more.yaml}\n")
            .with_document("more.yaml", "deep: true\n");
        let pass = pass(loader);
        let resolved = Value::Mapping(apply(&pass, "train: ${train.yaml}\n").unwrap());

        assert_eq!(
            resolved.get_path("train.optim._target_").unwrap().as_str(),
            Some("torch.optim.Adam")
        );
        assert_eq!(resolved.get_path("train.optim.lr").unwrap().as_f64(), Some(0.1));
        assert_eq!(resolved.get_path("train.limit").unwrap().as_i64(), Some(10));
        assert_eq!(resolved.get_path("train.more.deep").unwrap().as_bool(), Some(true));
    }

    #[test]
    fn test_sequences_and_plain_values_pass_through() {
        let pass = pass(MemoryLoader::new());
        let yaml = "list:\n  - ${a.yaml}\nref: ${a.b}\nn: 3\n";
        let resolved = apply(&pass, yaml).unwrap();

        assert_eq!(Value::Mapping(resolved), parse_yaml(yaml).unwrap());
    }

    #[test]
    fn test_missing_include_is_fatal() {
        let pass = pass(MemoryLoader::new());
        let err = apply(&pass, "model:\n  cfg: ${missing.yaml}\n").unwrap_err();

        assert!(matches!(err.kind, ErrorKind::FileNotFound { ref path } if path == "missing.yaml"));
        assert_eq!(err.path, Some("model.cfg".into()));
    }

    #[test]
    fn test_merged_include_must_be_mapping() {
        let pass = pass(MemoryLoader::new().with_document("list.yaml", "- 1\n- 2\n"));
        let err = apply(&pass, "_: ${list.yaml}\n").unwrap_err();

        assert!(matches!(err.kind, ErrorKind::InvalidShape { .. }));
    }
}

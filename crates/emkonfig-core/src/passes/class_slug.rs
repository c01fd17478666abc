//! `_{slug}` expansion
//!
//! A key `_{slug}` (or `_{slug as alias}`) is replaced by a construction
//! record `{_target_: <target>, ..defaults, ..explicit}` stored under the slug
//! (or alias). Destination `_` merges the record into the enclosing mapping.
//! Nested values are expanded first, so slugs inside slug arguments are
//! already records when the outer slug is built.

use std::sync::Arc;

use super::{child_path, item_path, Pass};
use crate::error::{Error, Result};
use crate::registry::SlugRegistry;
use crate::syntax::{parse_slug_key, SlugKey, Syntax, TARGET_KEY};
use crate::value::{Mapping, Value};

/// Expands class-slug keys into construction records
pub struct ClassSlugPass {
    registry: Arc<SlugRegistry>,
}

impl ClassSlugPass {
    pub fn new(registry: Arc<SlugRegistry>) -> Self {
        Self { registry }
    }

    /// Build the construction record for one slug key
    ///
    /// Starts from a copy of the registered defaults; explicit arguments
    /// overwrite them key by key.
    pub fn construction_record(&self, slug_key: &SlugKey<'_>, explicit: Mapping) -> Result<Mapping> {
        let entry = self.registry.lookup(slug_key.slug)?;

        let mut args = entry.default_args.clone();
        args.extend(explicit);

        let mut record = Mapping::with_capacity(args.len() + 1);
        record.insert(TARGET_KEY.to_string(), Value::String(entry.target.clone()));
        record.extend(args);

        log::trace!(
            "Expanded slug '{}' into '{}' ({})",
            slug_key.slug,
            slug_key.destination,
            entry.target
        );
        Ok(record)
    }

    fn resolve_node(&self, value: &Value, at: &str) -> Result<Value> {
        match value {
            Value::Mapping(map) => Ok(Value::Mapping(self.resolve_mapping(map, at)?)),
            Value::Sequence(items) => Ok(Value::Sequence(self.resolve_sequence(items, at)?)),
            other => Ok(other.clone()),
        }
    }

    fn resolve_sequence(&self, items: &[Value], at: &str) -> Result<Vec<Value>> {
        items
            .iter()
            .enumerate()
            .map(|(i, item)| self.resolve_node(item, &item_path(at, i)))
            .collect()
    }

    fn resolve_mapping(&self, content: &Mapping, at: &str) -> Result<Mapping> {
        let mut resolved = content.clone();

        for (key, value) in content {
            let key_path = child_path(at, key);
            if value.is_mapping() || value.is_sequence() {
                resolved.insert(key.clone(), self.resolve_node(value, &key_path)?);
            }

            let Some(slug_key) = parse_slug_key(key) else {
                continue;
            };

            let explicit = match resolved.shift_remove(key.as_str()) {
                None | Some(Value::Null) => Mapping::new(),
                Some(Value::Mapping(map)) => map,
                Some(other) => {
                    return Err(Error::invalid_shape(
                        format!("mapping of arguments for '{}'", key),
                        other.type_name(),
                    )
                    .with_path(key_path))
                }
            };

            let record = self
                .construction_record(&slug_key, explicit)
                .map_err(|e| e.with_path(key_path))?;

            if slug_key.is_merge() {
                resolved.extend(record);
            } else {
                resolved.insert(slug_key.destination.to_string(), Value::Mapping(record));
            }
        }

        Ok(resolved)
    }
}

impl Pass for ClassSlugPass {
    fn syntax(&self) -> Syntax {
        Syntax::ClassSlug
    }

    fn apply(&self, _full: &Mapping, content: &Mapping) -> Result<Mapping> {
        self.resolve_mapping(content, "")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::loader::parse_yaml;
    use crate::registry::TypeDescriptor;
    use pretty_assertions::assert_eq;

    fn registry() -> SlugRegistry {
        let mut registry = SlugRegistry::new();
        registry.register(
            "some_class",
            TypeDescriptor::new("examples.classes.SomeClass")
                .optional("a", 1)
                .optional("b", 2),
        );
        registry.register("linear", TypeDescriptor::new("nn.Linear").required("size"));
        registry
    }

    fn apply(registry: SlugRegistry, yaml: &str) -> Result<Value> {
        let doc = parse_yaml(yaml).unwrap();
        let map = doc.as_mapping().unwrap();
        ClassSlugPass::new(Arc::new(registry))
            .apply(map, map)
            .map(Value::Mapping)
    }

    #[test]
    fn test_defaults_merge_with_explicit_arguments() {
        let resolved = apply(registry(), "_{some_class}:\n  b: 3\n  c: 4\n").unwrap();

        assert_eq!(
            resolved,
            parse_yaml(
                "some_class:\n  _target_: examples.classes.SomeClass\n  a: 1\n  b: 3\n  c: 4\n"
            )
            .unwrap()
        );
    }

    #[test]
    fn test_alias_sets_destination_key() {
        let resolved = apply(registry(), "_{linear as encoder}:\n  size: 8\n").unwrap();
        let map = resolved.as_mapping().unwrap();

        assert!(!map.contains_key("_{linear as encoder}"));
        assert!(!map.contains_key("linear"));
        assert_eq!(
            resolved.get_path("encoder._target_").unwrap().as_str(),
            Some("nn.Linear")
        );
        assert_eq!(resolved.get_path("encoder.size").unwrap().as_i64(), Some(8));
    }

    #[test]
    fn test_merge_destination_flattens_record() {
        let resolved = apply(
            registry(),
            "model:\n  name: m\n  _{some_class as _}:\n    a: 5\n",
        )
        .unwrap();

        assert_eq!(
            resolved,
            parse_yaml("model:\n  name: m\n  _target_: examples.classes.SomeClass\n  a: 5\n  b: 2\n")
                .unwrap()
        );
    }

    #[test]
    fn test_null_value_means_no_arguments() {
        let resolved = apply(registry(), "_{some_class}:\n").unwrap();

        assert_eq!(resolved.get_path("some_class.a").unwrap().as_i64(), Some(1));
        assert_eq!(resolved.get_path("some_class.b").unwrap().as_i64(), Some(2));
    }

    #[test]
    fn test_nested_slugs_expand_first() {
        let yaml = "_{linear as head}:\n  size: 4\n  init:\n    _{some_class}:\n      a: 9\n";
        let resolved = apply(registry(), yaml).unwrap();

        assert_eq!(
            resolved
                .get_path("head.init.some_class._target_")
                .unwrap()
                .as_str(),
            Some("examples.classes.SomeClass")
        );
        assert_eq!(
            resolved.get_path("head.init.some_class.a").unwrap().as_i64(),
            Some(9)
        );
    }

    #[test]
    fn test_slugs_inside_sequences() {
        let yaml = "layers:\n  - _{linear}:\n      size: 1\n  - _{linear}:\n      size: 2\n  - plain\n";
        let resolved = apply(registry(), yaml).unwrap();

        assert_eq!(resolved.get_path("layers[1].linear.size").unwrap().as_i64(), Some(2));
        assert_eq!(resolved.get_path("layers[2]").unwrap().as_str(), Some("plain"));
    }

    #[test]
    fn test_defaults_snapshot_is_not_mutated() {
        let registry = Arc::new(registry());
        let pass = ClassSlugPass::new(Arc::clone(&registry));
        let doc = parse_yaml("_{some_class}:\n  a: 100\n  extra: x\n").unwrap();
        let map = doc.as_mapping().unwrap();
        pass.apply(map, map).unwrap();

        let defaults = &registry.get("some_class").unwrap().default_args;
        assert_eq!(defaults.len(), 2);
        assert_eq!(defaults["a"], Value::Integer(1));
    }

    #[test]
    fn test_unknown_slug_fails() {
        let err = apply(registry(), "_{missing}: {}\n").unwrap_err();

        assert_eq!(
            err.kind,
            ErrorKind::UnknownSlug {
                slug: "missing".into()
            }
        );
        assert!(err.to_string().contains("missing"));
    }

    #[test]
    fn test_non_mapping_value_is_a_shape_error() {
        let err = apply(registry(), "outer:\n  _{linear}: 3\n").unwrap_err();

        assert!(matches!(err.kind, ErrorKind::InvalidShape { .. }));
        assert_eq!(err.path, Some("outer._{linear}".into()));
    }

    #[test]
    fn test_plain_keys_untouched() {
        let yaml = "a: 1\nb:\n  c: [1, 2]\n";
        assert_eq!(apply(registry(), yaml).unwrap(), parse_yaml(yaml).unwrap());
    }
}

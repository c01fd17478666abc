//! `${dotted.path[0].key}` substitution
//!
//! References are looked up in the tree as it stood when this pass began,
//! never in the partially rewritten output, so the result does not depend on
//! key order. The value found is resolved again before substitution, which
//! lets references point at subtrees (or strings) that hold references.

use super::{child_path, item_path, Pass};
use crate::error::{Error, Result};
use crate::syntax::{reference_key_path, PathSegment, Syntax};
use crate::value::{Mapping, Value};

/// Replaces reference strings with the values they point at
#[derive(Debug, Clone, Copy, Default)]
pub struct ReferenceKeyPass;

impl ReferenceKeyPass {
    pub fn new() -> Self {
        Self
    }

    /// Follow a dotted path through `full`
    ///
    /// Any missing segment fails with the whole path in the error.
    pub fn lookup<'a>(&self, full: &'a Mapping, path: &str) -> Result<&'a Value> {
        let mut segments = path.split('.');
        let first = segments.next().unwrap_or_default();
        let mut current = step(full, first, path)?;

        for raw in segments {
            let map = current.as_mapping().ok_or_else(|| {
                log::warn!(
                    "Cannot look up '{}' in a {} while resolving '{}'",
                    raw,
                    current.type_name(),
                    path
                );
                Error::ref_not_found(path, raw)
            })?;
            current = step(map, raw, path)?;
        }

        Ok(current)
    }

    fn resolve_reference(
        &self,
        full: &Mapping,
        reference: &str,
        at: &str,
        stack: &mut Vec<String>,
    ) -> Result<Value> {
        let Some(path) = reference_key_path(reference) else {
            return Ok(Value::String(reference.to_string()));
        };

        if stack.iter().any(|p| p == path) {
            let mut chain = stack.clone();
            chain.push(path.to_string());
            return Err(Error::circular_reference(at, chain));
        }

        let found = self.lookup(full, path).map_err(|e| e.with_path(at))?;
        log::trace!("Substituting '{}' at '{}'", reference, at);

        stack.push(path.to_string());
        let result = self.resolve_node(full, found, at, stack);
        stack.pop();

        result
    }

    fn resolve_node(
        &self,
        full: &Mapping,
        value: &Value,
        at: &str,
        stack: &mut Vec<String>,
    ) -> Result<Value> {
        match value {
            Value::String(s) => self.resolve_reference(full, s, at, stack),
            Value::Sequence(items) => items
                .iter()
                .enumerate()
                .map(|(i, item)| self.resolve_node(full, item, &item_path(at, i), stack))
                .collect::<Result<Vec<_>>>()
                .map(Value::Sequence),
            Value::Mapping(map) => self
                .resolve_mapping(full, map, at, stack)
                .map(Value::Mapping),
            other => Ok(other.clone()),
        }
    }

    fn resolve_mapping(
        &self,
        full: &Mapping,
        content: &Mapping,
        at: &str,
        stack: &mut Vec<String>,
    ) -> Result<Mapping> {
        content
            .iter()
            .map(|(key, value)| {
                let resolved = self.resolve_node(full, value, &child_path(at, key), stack)?;
                Ok((key.clone(), resolved))
            })
            .collect()
    }
}

/// Look up one `key` or `key[index]` segment in a mapping
fn step<'a>(map: &'a Mapping, raw: &str, path: &str) -> Result<&'a Value> {
    let segment = PathSegment::parse(raw).map_err(|_| Error::ref_not_found(path, raw))?;

    let value = map.get(segment.key.as_str()).ok_or_else(|| {
        log::warn!("Key '{}' not found while resolving '{}'", segment.key, path);
        Error::ref_not_found(path, raw)
    })?;

    match segment.index {
        None => Ok(value),
        Some(idx) => value
            .as_sequence()
            .and_then(|seq| seq.get(idx))
            .ok_or_else(|| {
                log::warn!("Index {} not available in '{}' while resolving '{}'", idx, segment.key, path);
                Error::ref_not_found(path, raw)
            }),
    }
}

impl Pass for ReferenceKeyPass {
    fn syntax(&self) -> Syntax {
        Syntax::ReferenceKey
    }

    fn apply(&self, full: &Mapping, content: &Mapping) -> Result<Mapping> {
        let mut stack = Vec::new();
        self.resolve_mapping(full, content, "", &mut stack)
    }
}

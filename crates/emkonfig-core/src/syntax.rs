//! Syntax markers recognised by the resolution passes
//!
//! - `${path/to/file.yaml}` - include another document
//! - `${dotted.path[0].key}` - reference a value elsewhere in the document
//! - `_{slug}` / `_{slug as alias}` - class-slug construction shorthand
//! - `_` - merge target (for both includes and slug expansion)

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

use crate::error::{Error, Result};

/// Opening delimiter of a reference
pub const REFERENCE_PREFIX: &str = "${";
/// Closing delimiter of a reference
pub const REFERENCE_SUFFIX: &str = "}";
/// Suffix that turns a reference into a file inclusion
pub const YAML_REFERENCE_SUFFIX: &str = ".yaml}";
/// Opening delimiter of a class-slug key
pub const SLUG_PREFIX: &str = "_{";
/// Closing delimiter of a class-slug key
pub const SLUG_SUFFIX: &str = "}";
/// Separator between slug and destination key
pub const SLUG_ALIAS_SEPARATOR: &str = " as ";
/// Key that merges its content into the enclosing mapping
pub const MERGE_KEY: &str = "_";
/// Key holding the type descriptor in a construction record
pub const TARGET_KEY: &str = "_target_";
/// Key marking a construction record as a partial application
pub const PARTIAL_KEY: &str = "_partial_";

/// The syntaxes handled by the pipeline, one pass each
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Syntax {
    /// `${file.yaml}` inclusion
    ReferenceYaml,
    /// `_{slug}` expansion
    ClassSlug,
    /// `${dotted.path}` substitution
    ReferenceKey,
}

impl Syntax {
    /// The order passes run in unless configured otherwise
    pub const DEFAULT_ORDER: [Syntax; 3] =
        [Syntax::ReferenceYaml, Syntax::ClassSlug, Syntax::ReferenceKey];

    pub fn as_str(&self) -> &'static str {
        match self {
            Syntax::ReferenceYaml => "reference_yaml",
            Syntax::ClassSlug => "class_slug",
            Syntax::ReferenceKey => "reference_key",
        }
    }
}

impl fmt::Display for Syntax {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Strip the `${` ... `}` delimiters, returning the inner text
fn reference_body(value: &str) -> Option<&str> {
    value
        .strip_prefix(REFERENCE_PREFIX)?
        .strip_suffix(REFERENCE_SUFFIX)
}

/// Check if a string is a file inclusion (`${...yaml}`)
pub fn is_yaml_reference(value: &str) -> bool {
    value.starts_with(REFERENCE_PREFIX) && value.ends_with(YAML_REFERENCE_SUFFIX)
}

/// Get the file path of a file inclusion
pub fn yaml_reference_path(value: &str) -> Option<&str> {
    if is_yaml_reference(value) {
        reference_body(value)
    } else {
        None
    }
}

/// Check if a string is a dotted-path reference (`${...}` not ending in `.yaml}`)
pub fn is_reference_key(value: &str) -> bool {
    value.starts_with(REFERENCE_PREFIX)
        && value.ends_with(REFERENCE_SUFFIX)
        && !value.ends_with(YAML_REFERENCE_SUFFIX)
}

/// Get the dotted path of a reference
pub fn reference_key_path(value: &str) -> Option<&str> {
    if is_reference_key(value) {
        reference_body(value)
    } else {
        None
    }
}

/// A parsed `_{slug}` or `_{slug as alias}` key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlugKey<'a> {
    /// Registered slug to look up
    pub slug: &'a str,
    /// Key the construction record is written to (`_` merges into the parent)
    pub destination: &'a str,
}

impl SlugKey<'_> {
    /// Whether the construction record merges into the enclosing mapping
    pub fn is_merge(&self) -> bool {
        self.destination == MERGE_KEY
    }
}

/// Parse a class-slug key, returning None for ordinary keys
pub fn parse_slug_key(key: &str) -> Option<SlugKey<'_>> {
    let body = key.strip_prefix(SLUG_PREFIX)?.strip_suffix(SLUG_SUFFIX)?;
    let (slug, destination) = body
        .split_once(SLUG_ALIAS_SEPARATOR)
        .unwrap_or((body, body));
    Some(SlugKey { slug, destination })
}

/// A segment of a dotted path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathSegment {
    /// Mapping key to look up
    pub key: String,
    /// Optional sequence index applied to the value found under `key`
    pub index: Option<usize>,
}

fn index_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    // Only the digits inside the brackets are taken as the index
    PATTERN.get_or_init(|| {
        Regex::new(r"^(.*?)\[[^\d]*(\d+)[^\d]*\].*$").expect("index pattern is valid")
    })
}

impl PathSegment {
    /// Parse one `.`-separated segment such as `name` or `name[0]`
    pub fn parse(segment: &str) -> Result<Self> {
        match index_pattern().captures(segment) {
            Some(caps) => {
                let digits = &caps[2];
                let index = digits.parse::<usize>().map_err(|_| {
                    Error::parse(format!("Invalid sequence index in path segment: {}", segment))
                })?;
                Ok(Self {
                    key: caps[1].to_string(),
                    index: Some(index),
                })
            }
            None => Ok(Self {
                key: segment.to_string(),
                index: None,
            }),
        }
    }
}

/// Split a dotted path into segments
pub fn parse_path(path: &str) -> Result<Vec<PathSegment>> {
    path.split('.').map(PathSegment::parse).collect()
}

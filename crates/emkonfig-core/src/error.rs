//! Error types for emkonfig
//!
//! Every failure aborts the whole resolution. Errors carry the key path
//! inside the document where they happened, an optional source file and an
//! actionable help message.

use std::fmt;

/// Result type alias for emkonfig operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for emkonfig operations
#[derive(Debug, Clone)]
pub struct Error {
    /// The kind of error that occurred
    pub kind: ErrorKind,
    /// Key path in the document where the error occurred (e.g., "model.layers[1]")
    pub path: Option<String>,
    /// Source location (file, line) if available
    pub source_location: Option<SourceLocation>,
    /// Actionable help message
    pub help: Option<String>,
    /// Underlying cause (as string for Clone compatibility)
    pub cause: Option<String>,
}

/// Location in a source file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocation {
    pub file: String,
    pub line: Option<usize>,
    pub column: Option<usize>,
}

/// Categories of errors that can occur
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ErrorKind {
    /// Malformed YAML/JSON document or path expression
    #[error("Parse error")]
    Parse,
    /// Included or loaded document does not exist
    #[error("File not found: {path}")]
    FileNotFound { path: String },
    /// Any other I/O failure while reading a document
    #[error("I/O error")]
    Io,
    /// A `_{slug}` key names a slug that was never registered
    #[error("Unknown class slug: {slug}")]
    UnknownSlug { slug: String },
    /// A `${dotted.path}` reference could not be followed
    #[error("Invalid reference key: {reference}")]
    RefNotFound { reference: String },
    /// A value has the wrong shape for the syntax that uses it
    #[error("Invalid value: expected {expected}, got {got}")]
    InvalidShape { expected: String, got: String },
    /// A reference chain leads back to itself
    #[error("Circular reference detected")]
    CircularReference,
    /// Slug already present in a registry that refuses overwrites
    #[error("Class slug '{slug}' is already registered")]
    AlreadyRegistered { slug: String },
    /// Pass order names a syntax with no pass behind it
    #[error("No pass configured for syntax '{syntax}'")]
    InvalidPipeline { syntax: String },
    /// Read access to a path that doesn't exist in a resolved tree
    #[error("Path not found")]
    PathNotFound,
    /// Internal error (bug in emkonfig)
    #[error("Internal error")]
    Internal,
}

impl Error {
    fn from_kind(kind: ErrorKind) -> Self {
        Self {
            kind,
            path: None,
            source_location: None,
            help: None,
            cause: None,
        }
    }

    /// Create a new parse error
    pub fn parse(message: impl Into<String>) -> Self {
        Self {
            cause: Some(message.into()),
            ..Self::from_kind(ErrorKind::Parse)
        }
    }

    /// Create a file not found error
    pub fn file_not_found(file_path: impl Into<String>) -> Self {
        Self {
            help: Some("Check that the included file exists relative to the working directory or base path".into()),
            ..Self::from_kind(ErrorKind::FileNotFound {
                path: file_path.into(),
            })
        }
    }

    /// Create an I/O error for a document that exists but could not be read
    pub fn io(file_path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            source_location: Some(SourceLocation {
                file: file_path.into(),
                line: None,
                column: None,
            }),
            cause: Some(message.into()),
            ..Self::from_kind(ErrorKind::Io)
        }
    }

    /// Create an unknown slug error
    pub fn unknown_slug(slug: impl Into<String>) -> Self {
        let slug = slug.into();
        Self {
            help: Some(format!(
                "Register a type under '{}' before resolving, or check for typos",
                slug
            )),
            ..Self::from_kind(ErrorKind::UnknownSlug { slug })
        }
    }

    /// Create a broken reference error carrying the whole reference string
    pub fn ref_not_found(reference: impl Into<String>, missing: impl Into<String>) -> Self {
        let reference = reference.into();
        Self {
            help: Some(format!(
                "Check that every segment of '{}' exists in the configuration",
                reference
            )),
            cause: Some(format!("Missing segment: {}", missing.into())),
            ..Self::from_kind(ErrorKind::RefNotFound { reference })
        }
    }

    /// Create a shape error for malformed input
    pub fn invalid_shape(expected: impl Into<String>, got: impl Into<String>) -> Self {
        Self::from_kind(ErrorKind::InvalidShape {
            expected: expected.into(),
            got: got.into(),
        })
    }

    /// Create a circular reference error
    pub fn circular_reference(path: impl Into<String>, chain: Vec<String>) -> Self {
        let chain_str = chain.join(" → ");
        Self {
            path: Some(path.into()),
            help: Some("Break the circular dependency by removing one of the references".into()),
            cause: Some(format!("Chain: {}", chain_str)),
            ..Self::from_kind(ErrorKind::CircularReference)
        }
    }

    /// Create a slug already registered error
    pub fn already_registered(slug: impl Into<String>) -> Self {
        let slug = slug.into();
        Self {
            help: Some(format!(
                "Use register_with_force(..., true) to override the '{}' slug",
                slug
            )),
            ..Self::from_kind(ErrorKind::AlreadyRegistered { slug })
        }
    }

    /// Create an invalid pipeline error
    pub fn invalid_pipeline(syntax: impl Into<String>) -> Self {
        Self {
            help: Some("Add a pass for every syntax listed in the pass order".into()),
            ..Self::from_kind(ErrorKind::InvalidPipeline {
                syntax: syntax.into(),
            })
        }
    }

    /// Create a path not found error
    pub fn path_not_found(path: impl Into<String>) -> Self {
        let path_str = path.into();
        Self {
            help: Some(format!(
                "Check that '{}' exists in the resolved configuration",
                path_str
            )),
            path: Some(path_str),
            ..Self::from_kind(ErrorKind::PathNotFound)
        }
    }

    /// Create an internal error (bug in emkonfig)
    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            help: Some("This is likely a bug in emkonfig. Please report it.".into()),
            cause: Some(message.into()),
            ..Self::from_kind(ErrorKind::Internal)
        }
    }

    /// Add path context to the error, keeping the innermost path if one is set
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        if self.path.is_none() {
            self.path = Some(path.into());
        }
        self
    }

    /// Add source location to the error
    pub fn with_source_location(mut self, loc: SourceLocation) -> Self {
        self.source_location = Some(loc);
        self
    }

    /// Add help message to the error
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;

        if let Some(path) = &self.path {
            write!(f, "\n  Path: {}", path)?;
        }

        if let Some(loc) = &self.source_location {
            write!(f, "\n  File: {}", loc.file)?;
            if let Some(line) = loc.line {
                write!(f, ":{}", line)?;
            }
        }

        if let Some(cause) = &self.cause {
            write!(f, "\n  {}", cause)?;
        }

        if let Some(help) = &self.help {
            write!(f, "\n  Help: {}", help)?;
        }

        Ok(())
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_slug_error_display() {
        let err = Error::unknown_slug("missing").with_path("model");
        let display = format!("{}", err);

        assert!(display.contains("Unknown class slug: missing"));
        assert!(display.contains("Path: model"));
        assert!(display.contains("Register a type under 'missing'"));
    }

    #[test]
    fn test_ref_not_found_keeps_full_reference() {
        let err = Error::ref_not_found("a.b.c", "c");
        let display = format!("{}", err);

        assert_eq!(
            err.kind,
            ErrorKind::RefNotFound {
                reference: "a.b.c".into()
            }
        );
        assert!(display.contains("Invalid reference key: a.b.c"));
        assert!(display.contains("Missing segment: c"));
    }

    #[test]
    fn test_circular_reference_error_display() {
        let err = Error::circular_reference("x", vec!["a".into(), "b".into(), "a".into()]);
        let display = format!("{}", err);

        assert!(display.contains("Circular reference detected"));
        assert!(display.contains("a → b → a"));
    }

    #[test]
    fn test_with_path_keeps_innermost() {
        let err = Error::invalid_shape("mapping", "string")
            .with_path("model.encoder")
            .with_path("model");

        assert_eq!(err.path, Some("model.encoder".into()));
    }

    #[test]
    fn test_file_not_found_error() {
        let err = Error::file_not_found("configs/missing.yaml");
        let display = format!("{}", err);

        assert!(display.contains("File not found: configs/missing.yaml"));
        assert!(display.contains("Help:"));
    }

    #[test]
    fn test_io_error_has_source_location() {
        let err = Error::io("configs/locked.yaml", "permission denied");
        let display = format!("{}", err);

        assert!(display.contains("I/O error"));
        assert!(display.contains("File: configs/locked.yaml"));
        assert!(display.contains("permission denied"));
    }

    #[test]
    fn test_with_source_location() {
        let err = Error::parse("syntax error").with_source_location(SourceLocation {
            file: "config.yaml".into(),
            line: Some(42),
            column: None,
        });
        let display = format!("{}", err);

        assert!(display.contains("config.yaml:42"));
    }

    #[test]
    fn test_with_help() {
        let err = Error::parse("bad input").with_help("Try fixing the syntax");
        let display = format!("{}", err);

        assert!(display.contains("Help: Try fixing the syntax"));
    }

    #[test]
    fn test_invalid_pipeline_error() {
        let err = Error::invalid_pipeline("class_slug");
        assert!(err.to_string().contains("No pass configured for syntax 'class_slug'"));
    }

    #[test]
    fn test_internal_error() {
        let err = Error::internal("Unexpected state");
        let display = format!("{}", err);

        assert!(display.contains("Internal error"));
        assert!(display.contains("Unexpected state"));
    }
}

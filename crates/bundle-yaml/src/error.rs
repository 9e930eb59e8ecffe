//! Error types for YAML loading.

use bundle_diag::Diagnostic;
use bundle_dyn::Location;
use thiserror::Error;

/// Result type alias for bundle-yaml operations.
pub type Result<T> = std::result::Result<T, YamlError>;

/// Errors that make a YAML file unusable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum YamlError {
    /// The file could not be read.
    #[error("failed to read {path}: {message}")]
    Io { path: String, message: String },

    /// YAML syntax error reported by the scanner.
    #[error("{message}")]
    Syntax { message: String, location: Location },

    /// The same key appears twice in one mapping.
    #[error("key {key:?} is already defined at line {first_line}")]
    DuplicateKey {
        key: String,
        first_line: usize,
        location: Location,
    },

    /// A mapping key is a sequence or a mapping.
    #[error("mapping keys must be scalars")]
    NonScalarKey { location: Location },

    /// An alias refers to an anchor that was never defined.
    #[error("unknown anchor")]
    UnknownAnchor { location: Location },

    /// A `<<` merge key whose value is not a mapping or a list of mappings.
    #[error("merge key value must be a mapping or a sequence of mappings")]
    InvalidMerge { location: Location },
}

impl YamlError {
    /// Source position of the error, when there is one.
    pub fn location(&self) -> Option<&Location> {
        match self {
            YamlError::Io { .. } => None,
            YamlError::Syntax { location, .. }
            | YamlError::DuplicateKey { location, .. }
            | YamlError::NonScalarKey { location }
            | YamlError::UnknownAnchor { location }
            | YamlError::InvalidMerge { location } => Some(location),
        }
    }

    /// Convert into an error diagnostic carrying the best available location.
    pub fn to_diagnostic(&self) -> Diagnostic {
        let diag = Diagnostic::error(self.to_string());
        match self.location() {
            Some(location) => diag.with_location(location.clone()),
            None => diag,
        }
    }
}

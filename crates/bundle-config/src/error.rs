//! Fatal errors of the bundle configuration pipeline.
//!
//! Problems that stop the pipeline are [`BundleError`]s; problems that are
//! collected and reported are [`Diagnostic`]s. Every error converts into a
//! diagnostic via [`BundleError::to_diagnostic`] so callers can report both
//! the same way.

use bundle_diag::Diagnostic;
use bundle_dyn::{Location, Path};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BundleError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unable to locate bundle root: none of {} found in {}", crate::loader::ROOT_FILE_NAMES.join(", "), .dir.display())]
    RootNotFound { dir: PathBuf },

    #[error("multiple bundle root configuration files found in {}: {}", .dir.display(), .files.join(", "))]
    MultipleRoots { dir: PathBuf, files: Vec<String> },

    /// An error diagnostic that halts the pipeline: a file that failed to
    /// load, or the first error in fail-fast mode.
    #[error("{}", .0.summary)]
    Fatal(Diagnostic),

    #[error("{pattern}: includes must be relative paths")]
    AbsoluteInclude {
        pattern: String,
        location: Option<Location>,
    },

    #[error("{pattern} defined in 'include' section does not match any files")]
    IncludeNoMatch {
        pattern: String,
        location: Option<Location>,
    },

    #[error("{pattern}: include path {file} escapes the bundle root")]
    IncludeOutsideRoot {
        pattern: String,
        file: String,
        location: Option<Location>,
    },

    #[error("Files in the 'include' configuration section must be YAML files.")]
    IncludeNotYaml {
        file: String,
        location: Option<Location>,
    },

    #[error("{pattern}: invalid glob pattern: {message}")]
    InvalidGlob {
        pattern: String,
        message: String,
        location: Option<Location>,
    },

    #[error("no targets defined")]
    NoTargets,

    #[error("{name}: no such target. Available targets: {}", .available.join(", "))]
    NoSuchTarget { name: String, available: Vec<String> },

    #[error("multiple targets are marked as default ({})", .names.join(", "))]
    AmbiguousDefault { names: Vec<String> },

    #[error("please specify target")]
    NoDefaultTarget,

    #[error("both 'environments' and 'targets' are specified; only 'targets' should be used")]
    BothTargetsAndEnvironments { location: Option<Location> },

    #[error(
        "no value assigned to required variable {name}. Assignment can be done through the \"--var\" flag or by setting the BUNDLE_VAR_{name} environment variable"
    )]
    RequiredVariable { name: String },

    #[error("variable {name} is not defined but is assigned a value")]
    UndefinedVariableOverride {
        name: String,
        location: Option<Location>,
    },

    #[error("variable {name} has not been defined")]
    VariableNotDefined { name: String },

    #[error("unexpected flag value for variable assignment: {input}")]
    MalformedAssignment { input: String },

    #[error("variable has already been assigned value: {name}")]
    AlreadyAssigned { name: String },

    #[error("setting via environment variables (BUNDLE_VAR_{name}) is not supported for complex variable {name}")]
    ComplexFromEnvironment { name: String },

    #[error("setting via the --var flag is not supported for complex variable {name}")]
    ComplexFromFlag { name: String },

    #[error("invalid variable {name}: {message}")]
    InvalidVariable {
        name: String,
        message: String,
        location: Option<Location>,
    },

    #[error("failed to resolve {lookup}, err: {message}")]
    Lookup {
        variable: String,
        lookup: String,
        message: String,
        location: Option<Location>,
    },

    #[error("cycle detected in field resolution: {}", .chain.join(" -> "))]
    Cycle { chain: Vec<String> },

    #[error("cannot interpolate non-string value: {reference}")]
    NonStringInterpolation {
        reference: String,
        path: Path,
        location: Option<Location>,
    },

    #[error("invalid configuration at {path}: {message}")]
    Invalid {
        path: Path,
        message: String,
        location: Option<Location>,
    },
}

impl BundleError {
    /// Shorthand for [`BundleError::Invalid`].
    pub fn invalid(path: Path, message: impl Into<String>, location: Option<Location>) -> Self {
        Self::Invalid {
            path,
            message: message.into(),
            location,
        }
    }

    /// Source location the error points at, if any.
    pub fn location(&self) -> Option<&Location> {
        match self {
            BundleError::AbsoluteInclude { location, .. }
            | BundleError::IncludeNoMatch { location, .. }
            | BundleError::IncludeOutsideRoot { location, .. }
            | BundleError::IncludeNotYaml { location, .. }
            | BundleError::InvalidGlob { location, .. }
            | BundleError::BothTargetsAndEnvironments { location }
            | BundleError::UndefinedVariableOverride { location, .. }
            | BundleError::InvalidVariable { location, .. }
            | BundleError::Lookup { location, .. }
            | BundleError::NonStringInterpolation { location, .. }
            | BundleError::Invalid { location, .. } => location.as_ref(),
            BundleError::Fatal(diag) => diag.locations.first(),
            _ => None,
        }
    }

    /// Convert into an error diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        if let BundleError::Fatal(diag) = self {
            return diag.clone();
        }

        let mut diag = Diagnostic::error(self.to_string());
        if let Some(location) = self.location() {
            diag = diag.with_location(location.clone());
        }
        match self {
            BundleError::IncludeNotYaml { file, .. } => {
                diag = diag.with_path(Path::from_keys(["include"])).with_detail(format!(
                    "The file {file} in the 'include' configuration section is not a YAML file, and only YAML files are supported. To include files to sync, specify them in the 'sync.include' configuration section instead."
                ));
            }
            BundleError::AbsoluteInclude { .. }
            | BundleError::IncludeNoMatch { .. }
            | BundleError::IncludeOutsideRoot { .. }
            | BundleError::InvalidGlob { .. } => {
                diag = diag.with_path(Path::from_keys(["include"]));
            }
            BundleError::NonStringInterpolation { path, .. } | BundleError::Invalid { path, .. } => {
                diag = diag.with_path(path.clone());
            }
            BundleError::UndefinedVariableOverride { name, .. } => {
                diag = diag.with_path(Path::from_keys(["variables", name.as_str()]));
            }
            BundleError::InvalidVariable { name, .. } | BundleError::Lookup { variable: name, .. } => {
                diag = diag.with_path(Path::from_keys(["variables", name.as_str()]));
            }
            _ => {}
        }
        diag
    }
}

/// Result type alias for bundle-config operations.
pub type Result<T> = std::result::Result<T, BundleError>;

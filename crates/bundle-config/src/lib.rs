//! Bundle configuration pipeline.
//!
//! A bundle is a directory with a root configuration file (`databricks.yml`)
//! that may include further YAML files. This crate turns such a directory into
//! one fully resolved configuration document:
//!
//! 1. [`loader`] discovers the root file, expands `include` globs and merges
//!    every file into one document.
//! 2. [`target`] selects a target and merges its overrides.
//! 3. [`variables`] assigns variable values (flags, environment, defaults,
//!    remote lookups).
//! 4. [`interpolate`] substitutes `${...}` references.
//! 5. [`validate`] runs structural checks and reports [`Diagnostic`]s.
//!
//! Each step is a [`Mutator`] applied to a [`Bundle`]; [`phases`] assembles
//! the standard [`Pipeline`]s.
//!
//! # Example
//!
//! ```no_run
//! use bundle_config::{Bundle, BundleOptions, Environment, phases};
//!
//! let options = BundleOptions::new("./my-bundle").with_target("dev");
//! let mut bundle = Bundle::new(options, Environment::from_process());
//! phases::load_and_validate(&mut bundle)?;
//!
//! for diag in &bundle.diagnostics {
//!     eprintln!("{}", diag.to_text());
//! }
//! # Ok::<(), bundle_config::BundleError>(())
//! ```
//!
//! [`Diagnostic`]: bundle_diag::Diagnostic

pub mod bundle;
pub mod error;
pub mod interpolate;
pub mod loader;
pub mod merge_keyed;
pub mod mutator;
pub mod options;
pub mod phases;
pub mod registry;
pub mod resources;
pub mod target;
pub mod validate;
pub mod variables;
pub mod workspace;

pub use bundle::Bundle;
pub use error::{BundleError, Result};
pub use mutator::{Mutator, Pipeline};
pub use options::{BundleOptions, Environment, FailMode};
pub use registry::{ResourceKind, ResourceRegistry};
pub use workspace::{ClusterSource, ListFilter, LookupKind, NamedEntity, WorkspaceClient, WorkspaceError};

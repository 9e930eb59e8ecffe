//! Diagnostics for the bundle configuration pipeline.
//!
//! Every pipeline stage reports problems as [`Diagnostic`]s: a severity, a
//! one-line summary, and the source [`Location`]s and document [`Path`]s the
//! problem refers to. Diagnostics accumulate in a plain `Vec<Diagnostic>`;
//! [`DiagnosticsExt`] adds the queries callers need on such a list.
//!
//! # Example
//!
//! ```
//! use bundle_diag::{Diagnostic, DiagnosticsExt, Severity};
//! use bundle_dyn::Location;
//!
//! let diags = vec![
//!     Diagnostic::warning("Pattern dist does not match any files")
//!         .with_location(Location::new("databricks.yml", 12, 7)),
//! ];
//! assert!(!diags.has_error());
//! assert_eq!(diags[0].severity, Severity::Warning);
//! ```
//!
//! [`Location`]: bundle_dyn::Location
//! [`Path`]: bundle_dyn::Path

pub mod diagnostic;

pub use diagnostic::{Diagnostic, DiagnosticsExt, Severity, render_json, render_text};

//! # bundle-yaml
//!
//! Loads YAML configuration files into located [`Value`] trees.
//!
//! Every node carries the file, line and column it was parsed from. Anchors
//! and aliases are expanded inline: an aliased node is an independent copy that
//! keeps the location of the anchor definition, not of the alias.
//!
//! ## Example
//!
//! ```rust
//! use bundle_yaml::parse;
//!
//! let (value, warnings) = parse("bundle:\n  name: demo\n", "databricks.yml").unwrap();
//! assert!(warnings.is_empty());
//!
//! let name = value.get("bundle").and_then(|b| b.get("name")).unwrap();
//! assert_eq!(name.as_str(), Some("demo"));
//! assert_eq!(name.location().map(|l| (l.line, l.column)), Some((2, 9)));
//! ```
//!
//! [`Value`]: bundle_dyn::Value

mod error;
mod loader;
mod parser;
mod scalar;

pub use error::{Result, YamlError};
pub use loader::load_file;
pub use parser::parse;

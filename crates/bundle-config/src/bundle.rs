//! The bundle context that flows through the pipeline.

use crate::options::{BundleOptions, Environment};
use crate::registry::ResourceRegistry;
use crate::resources::Root;
use crate::workspace::WorkspaceClient;
use crate::{BundleError, Result};
use bundle_diag::Diagnostic;
use bundle_dyn::{Path, Value};
use std::path::PathBuf;
use std::sync::Arc;

/// One bundle invocation: its configuration document and everything the
/// pipeline needs to transform it.
///
/// Mutators get exclusive access in turn. Diagnostics are only ever
/// appended.
pub struct Bundle {
    /// Bundle root directory
    pub root: PathBuf,

    /// The configuration document
    pub config: Value,

    /// The selected target, once chosen
    pub target: Option<String>,

    pub options: BundleOptions,

    pub environment: Environment,

    pub registry: Arc<ResourceRegistry>,

    /// Needed only for variable lookups
    pub workspace: Option<Arc<dyn WorkspaceClient>>,

    pub diagnostics: Vec<Diagnostic>,
}

impl Bundle {
    /// Create a bundle with an empty document and the standard registry.
    pub fn new(options: BundleOptions, environment: Environment) -> Self {
        Self {
            root: options.root.clone(),
            config: Value::empty_mapping(),
            target: None,
            options,
            environment,
            registry: Arc::new(ResourceRegistry::standard()),
            workspace: None,
            diagnostics: Vec::new(),
        }
    }

    pub fn with_workspace(mut self, workspace: Arc<dyn WorkspaceClient>) -> Self {
        self.workspace = Some(workspace);
        self
    }

    pub fn with_registry(mut self, registry: Arc<ResourceRegistry>) -> Self {
        self.registry = registry;
        self
    }

    /// Get a node of the document by dotted path.
    pub fn get(&self, path: &str) -> Option<&Value> {
        let path: Path = path.parse().ok()?;
        self.config.get_by_path(&path)
    }

    /// Set a node of the document, creating intermediate mappings.
    pub fn set(&mut self, path: &Path, value: Value) -> Result<()> {
        self.config.set_by_path(path, value).map_err(|err| {
            BundleError::invalid(path.clone(), err.to_string(), None)
        })
    }

    /// Decode the document into its typed form.
    pub fn typed(&self) -> Result<Root> {
        Root::from_value(&self.config).map_err(|err| {
            BundleError::invalid(Path::root(), err.to_string(), self.config.location().cloned())
        })
    }
}

impl std::fmt::Debug for Bundle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bundle")
            .field("root", &self.root)
            .field("target", &self.target)
            .field("diagnostics", &self.diagnostics.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_and_set() {
        let mut bundle = Bundle::new(BundleOptions::new("/tmp"), Environment::default());
        bundle
            .set(&"bundle.name".parse().unwrap(), Value::from("demo"))
            .unwrap();
        assert_eq!(bundle.get("bundle.name").and_then(Value::as_str), Some("demo"));
        assert!(bundle.get("bundle.target").is_none());
        assert!(bundle.get("not a [path").is_none());
    }

    #[test]
    fn test_typed() {
        let mut bundle = Bundle::new(BundleOptions::new("/tmp"), Environment::default());
        bundle
            .set(&"bundle.name".parse().unwrap(), Value::from("demo"))
            .unwrap();
        assert_eq!(bundle.typed().unwrap().bundle.name, "demo");
    }
}

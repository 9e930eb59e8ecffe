//! Discovering and loading the bundle's configuration files.

mod includes;

pub use includes::ProcessRootIncludes;

use crate::bundle::Bundle;
use crate::mutator::Mutator;
use crate::validate::unique_keys::{KeyScope, duplicate_keys};
use crate::{BundleError, Result};
use bundle_diag::{Diagnostic, DiagnosticsExt};
use bundle_dyn::{Path, Value};
use std::path::{Path as FsPath, PathBuf};

/// Accepted root configuration file names, in lookup order.
pub const ROOT_FILE_NAMES: [&str; 4] = [
    "databricks.yml",
    "databricks.yaml",
    "bundle.yml",
    "bundle.yaml",
];

/// Find the single root configuration file in `dir`.
///
/// # Errors
///
/// Fails if no root file exists or if more than one does.
pub fn find_root_file(dir: &FsPath) -> Result<PathBuf> {
    let found: Vec<&str> = ROOT_FILE_NAMES
        .into_iter()
        .filter(|name| dir.join(name).is_file())
        .collect();

    match found.as_slice() {
        [] => Err(BundleError::RootNotFound {
            dir: dir.to_path_buf(),
        }),
        [name] => Ok(dir.join(name)),
        _ => Err(BundleError::MultipleRoots {
            dir: dir.to_path_buf(),
            files: found.iter().map(|s| s.to_string()).collect(),
        }),
    }
}

/// Load a configuration file relative to the bundle root.
///
/// A file that fails to load is fatal; warnings are returned.
pub(crate) fn load_relative(root: &FsPath, relative: &str) -> Result<(Value, Vec<Diagnostic>)> {
    let (value, diagnostics) = bundle_yaml::load_file(&root.join(relative), relative);
    if let Some(error) = diagnostics.first_error() {
        return Err(BundleError::Fatal(error.clone()));
    }
    if !value.is_mapping() {
        return Err(BundleError::invalid(
            Path::root(),
            format!("{relative}: expected a mapping at the top level, found {}", value.kind_name()),
            value.location().cloned(),
        ));
    }
    Ok((value, diagnostics))
}

/// Loads the root configuration file into the bundle.
pub struct LoadRoot;

impl Mutator for LoadRoot {
    fn name(&self) -> &str {
        "LoadRoot"
    }

    fn apply(&self, bundle: &mut Bundle) -> Result<Vec<Diagnostic>> {
        let root_file = find_root_file(&bundle.root)?;
        let name = root_file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        tracing::debug!(file = %root_file.display(), "loading root configuration");

        let (value, diagnostics) = load_relative(&bundle.root, &name)?;
        bundle.config = value;
        Ok(diagnostics)
    }
}

/// Reports resource keys defined more than once after all files are merged.
///
/// A key is duplicated when it appears under two resource types, or when a
/// single resource was defined in more than one file.
pub struct CheckDuplicateKeys;

impl Mutator for CheckDuplicateKeys {
    fn name(&self) -> &str {
        "CheckDuplicateKeys"
    }

    fn apply(&self, bundle: &mut Bundle) -> Result<Vec<Diagnostic>> {
        Ok(duplicate_keys(&bundle.config, KeyScope::AcrossFiles))
    }
}

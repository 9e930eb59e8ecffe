//! Loading YAML files from disk.

use crate::error::YamlError;
use crate::parser::parse;
use bundle_diag::Diagnostic;
use bundle_dyn::Value;
use std::path::Path;

/// Load a YAML file into a located value.
///
/// `name` is the file name recorded in locations, usually the path relative
/// to the bundle root. Read and parse failures do not return an error: the
/// value is null and the diagnostics contain the error.
pub fn load_file(path: &Path, name: &str) -> (Value, Vec<Diagnostic>) {
    tracing::debug!(file = name, "loading YAML file");

    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) => {
            let error = YamlError::Io {
                path: name.to_string(),
                message: err.to_string(),
            };
            return (Value::null(), vec![error.to_diagnostic()]);
        }
    };

    match parse(&content, name) {
        Ok((value, warnings)) => (value, warnings),
        Err(err) => (Value::null(), vec![err.to_diagnostic()]),
    }
}

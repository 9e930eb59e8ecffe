use super::Check;
use crate::bundle::Bundle;
use crate::interpolate::references;
use bundle_diag::Diagnostic;
use bundle_dyn::{Path, Value};

/// Warns about `${var.*}` references that survived interpolation.
///
/// Such a reference names a variable that was never declared, or a field
/// of a complex variable that does not exist.
pub struct UnresolvedReferences;

impl Check for UnresolvedReferences {
    fn name(&self) -> &str {
        "unresolved_references"
    }

    fn check(&self, bundle: &Bundle) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        bundle.config.walk(&mut |path: &Path, value: &Value| {
            let Some(text) = value.as_str() else {
                return;
            };
            for reference in references(text) {
                if reference.starts_with("var.") {
                    diagnostics.push(
                        Diagnostic::warning(format!("reference does not exist: ${{{reference}}}"))
                            .with_locations(value.locations.iter().cloned())
                            .with_path(path.clone()),
                    );
                }
            }
        });
        diagnostics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::{BundleOptions, Environment};

    #[test]
    fn test_leftover_variable_reference() {
        let mut bundle = Bundle::new(BundleOptions::new("/tmp"), Environment::default());
        bundle.config = bundle_yaml::parse(
            "workspace:\n  root_path: /a/${var.missing}/${bundle.target}\n",
            "databricks.yml",
        )
        .unwrap()
        .0;

        let diags = UnresolvedReferences.check(&bundle);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].summary, "reference does not exist: ${var.missing}");
        assert_eq!(diags[0].paths[0].to_string(), "workspace.root_path");
        assert_eq!(diags[0].locations[0].line, 2);
    }
}

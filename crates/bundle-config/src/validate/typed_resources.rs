use super::{Check, resource_entries};
use crate::bundle::Bundle;
use crate::resources::Root;
use bundle_diag::Diagnostic;
use bundle_dyn::Path;
use std::collections::BTreeSet;

/// Decodes every section into its typed record.
///
/// Resources are decoded one by one so a failure points at the resource
/// that caused it. Null resources are reported by
/// [`AllResourcesHaveValues`](super::AllResourcesHaveValues) instead.
pub struct TypedResources;

impl Check for TypedResources {
    fn name(&self) -> &str {
        "typed_resources"
    }

    fn check(&self, bundle: &Bundle) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        let mut unknown = BTreeSet::new();

        for (plural, key, value) in resource_entries(&bundle.config) {
            let Some(kind) = bundle.registry.get(plural) else {
                unknown.insert(plural);
                continue;
            };
            if value.is_null() {
                continue;
            }
            if let Err(err) = kind.decode(&value.to_json()) {
                diagnostics.push(
                    Diagnostic::error(format!("invalid {} {key}: {err}", kind.singular))
                        .with_locations(value.locations.iter().cloned())
                        .with_path(Path::from_keys(["resources", plural, key])),
                );
            }
        }

        for plural in unknown {
            let section = bundle
                .config
                .get("resources")
                .and_then(|r| r.get(plural));
            diagnostics.push(
                Diagnostic::warning(format!("unknown resource type {plural}"))
                    .with_locations(section.map(|s| s.locations.clone()).unwrap_or_default())
                    .with_path(Path::from_keys(["resources", plural])),
            );
        }

        let mut rest = bundle.config.clone();
        rest.remove("resources");
        if let Err(err) = Root::from_value(&rest) {
            diagnostics.push(
                Diagnostic::error(format!("invalid configuration: {err}"))
                    .with_locations(bundle.config.location().cloned()),
            );
        }
        diagnostics
    }
}

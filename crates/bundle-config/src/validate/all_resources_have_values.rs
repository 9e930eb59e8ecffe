use super::{Check, resource_entries};
use crate::bundle::Bundle;
use bundle_diag::Diagnostic;
use bundle_dyn::Path;

/// Every declared resource must have a body.
///
/// `resources: {jobs: {foo: }}` leaves `foo` null and `foo: {}` leaves it
/// empty. Either usually means an included stub was never filled in.
pub struct AllResourcesHaveValues;

impl Check for AllResourcesHaveValues {
    fn name(&self) -> &str {
        "all_resources_have_values"
    }

    fn check(&self, bundle: &Bundle) -> Vec<Diagnostic> {
        resource_entries(&bundle.config)
            .into_iter()
            .filter(|(_, _, value)| {
                value.is_null() || value.as_mapping().is_some_and(|m| m.is_empty())
            })
            .map(|(plural, key, value)| {
                let singular = bundle
                    .registry
                    .get(plural)
                    .map_or(plural, |kind| kind.singular);
                Diagnostic::error(format!("{singular} {key} is not defined"))
                    .with_locations(value.locations.iter().cloned())
                    .with_path(Path::from_keys(["resources", plural, key]))
            })
            .collect()
    }
}

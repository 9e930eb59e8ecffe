//! Read-only checks over the final document.
//!
//! Each [`Check`] reports diagnostics independently. [`Validate`] runs all of
//! them and concatenates the results, stopping after the first check that
//! reports an error when the bundle runs in fail-fast mode.

mod all_resources_have_values;
mod job_cluster_key;
mod sync_patterns;
mod typed_resources;
pub mod unique_keys;
mod unresolved;

pub use all_resources_have_values::AllResourcesHaveValues;
pub use job_cluster_key::JobClusterKeyDefined;
pub use sync_patterns::SyncPatternsMatch;
pub use typed_resources::TypedResources;
pub use unique_keys::UniqueResourceKeys;
pub use unresolved::UnresolvedReferences;

use crate::bundle::Bundle;
use crate::mutator::Mutator;
use crate::options::FailMode;
use crate::Result;
use bundle_diag::{Diagnostic, DiagnosticsExt};
use bundle_dyn::Value;

/// A single validation rule.
pub trait Check: Send + Sync {
    fn name(&self) -> &str;

    fn check(&self, bundle: &Bundle) -> Vec<Diagnostic>;
}

/// Runs a set of checks.
pub struct Validate {
    checks: Vec<Box<dyn Check>>,
}

impl Validate {
    pub fn new(checks: Vec<Box<dyn Check>>) -> Self {
        Self { checks }
    }

    /// The checks run by `bundle validate`.
    pub fn standard() -> Self {
        Self::new(vec![
            Box::new(UniqueResourceKeys),
            Box::new(AllResourcesHaveValues),
            Box::new(TypedResources),
            Box::new(JobClusterKeyDefined),
            Box::new(SyncPatternsMatch),
            Box::new(UnresolvedReferences),
        ])
    }

    pub fn check_names(&self) -> Vec<&str> {
        self.checks.iter().map(|c| c.name()).collect()
    }
}

impl Mutator for Validate {
    fn name(&self) -> &str {
        "Validate"
    }

    fn apply(&self, bundle: &mut Bundle) -> Result<Vec<Diagnostic>> {
        let mut diagnostics = Vec::new();
        for check in &self.checks {
            let found = check.check(bundle);
            tracing::debug!(check = check.name(), diagnostics = found.len(), "ran check");
            let stop = bundle.options.fail_mode == FailMode::FailFast && found.has_error();
            diagnostics.extend(found);
            if stop {
                break;
            }
        }
        Ok(diagnostics)
    }
}

/// Every `resources.<type>.<key>` entry, in document order.
pub(crate) fn resource_entries(config: &Value) -> Vec<(&str, &str, &Value)> {
    let Some(resources) = config.get("resources").and_then(Value::as_mapping) else {
        return Vec::new();
    };
    resources
        .iter()
        .filter_map(|(plural, entries)| Some((plural.as_str(), entries.as_mapping()?)))
        .flat_map(|(plural, entries)| {
            entries
                .iter()
                .map(move |(key, value)| (plural, key.as_str(), value))
        })
        .collect()
}

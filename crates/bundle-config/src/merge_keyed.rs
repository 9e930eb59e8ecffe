//! Collapsing keyed resource lists.

use crate::bundle::Bundle;
use crate::mutator::Mutator;
use crate::Result;
use bundle_diag::Diagnostic;
use bundle_dyn::{Value, merge_keyed_sequence};

/// Merges elements of keyed resource lists that share a natural key.
///
/// A job may list the same task twice, once in its own file and once in a
/// target override; afterwards each task key appears once, with the later
/// definition's fields taking precedence.
pub struct MergeKeyedSequences;

impl Mutator for MergeKeyedSequences {
    fn name(&self) -> &str {
        "MergeKeyedSequences"
    }

    fn apply(&self, bundle: &mut Bundle) -> Result<Vec<Diagnostic>> {
        let registry = bundle.registry.clone();
        let Some(resources) = bundle
            .config
            .get_mut("resources")
            .and_then(Value::as_mapping_mut)
        else {
            return Ok(Vec::new());
        };

        for (plural, entries) in resources.iter_mut() {
            let Some(kind) = registry.get(plural) else {
                continue;
            };
            let Some(entries) = entries.as_mapping_mut() else {
                continue;
            };
            for resource in entries.values_mut() {
                for (field, key) in kind.keyed_fields() {
                    if let Some(list) = resource.get_mut(field)
                        && list.is_sequence()
                    {
                        *list = merge_keyed_sequence(list, key);
                    }
                }
            }
        }
        Ok(Vec::new())
    }
}

use super::lookup::Lookup;
use crate::bundle::Bundle;
use crate::interpolate::{Resolver, Scope};
use crate::mutator::Mutator;
use crate::workspace::WorkspaceClient;
use crate::{BundleError, Result};
use bundle_diag::Diagnostic;
use bundle_dyn::{Path, Value};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Resolves variables that are still waiting for a `lookup`.
///
/// Lookup names may reference other parts of the document; those references
/// are substituted first. Lookups run concurrently since each writes only
/// its own variable; the first failure in declaration order is reported.
pub struct ResolveVariableLookups;

struct Pending {
    variable: String,
    lookup: Lookup,
}

impl Mutator for ResolveVariableLookups {
    fn name(&self) -> &str {
        "ResolveVariableLookups"
    }

    fn apply(&self, bundle: &mut Bundle) -> Result<Vec<Diagnostic>> {
        let pending = pending_lookups(&bundle.config)?;
        if pending.is_empty() {
            return Ok(Vec::new());
        }

        let Some(client) = bundle.workspace.clone() else {
            let first = &pending[0];
            return Err(BundleError::Lookup {
                variable: first.variable.clone(),
                lookup: first.lookup.to_string(),
                message: "no workspace client is configured".to_string(),
                location: first.lookup.location.clone(),
            });
        };

        let results = resolve_all(client.as_ref(), &pending);
        for (item, result) in pending.iter().zip(results) {
            let id = result.map_err(|err| BundleError::Lookup {
                variable: item.variable.clone(),
                lookup: item.lookup.to_string(),
                message: err.message,
                location: item.lookup.location.clone(),
            })?;
            tracing::debug!(variable = %item.variable, lookup = %item.lookup, "resolved lookup");

            let mut value = Value::from(id);
            if let Some(location) = &item.lookup.location {
                value = value.with_location(location.clone());
            }
            bundle.set(&Path::from_keys(["variables", item.variable.as_str(), "value"]), value)?;
        }
        Ok(Vec::new())
    }
}

/// Variables without a value that declare a lookup, with names interpolated.
fn pending_lookups(config: &Value) -> Result<Vec<Pending>> {
    let Some(variables) = config.get("variables").and_then(Value::as_mapping) else {
        return Ok(Vec::new());
    };

    let mut resolver = Resolver::new(config, Scope::WithoutResources);
    let mut pending = Vec::new();
    for (name, declaration) in variables {
        if declaration.get("value").is_some_and(|v| !v.is_null()) {
            continue;
        }
        let Some(block) = declaration.get("lookup").filter(|b| !b.is_null()) else {
            continue;
        };

        let mut lookup = Lookup::parse(name, block)?;
        let path = Path::from_keys(["variables", name.as_str(), "lookup", lookup.kind.as_str()]);
        let raw = Value::from(lookup.name.as_str());
        if let Some(resolved) = resolver.resolve_string(&path, &raw)?
            && let Some(text) = resolved.scalar_to_string()
        {
            lookup.name = text;
        }
        pending.push(Pending {
            variable: name.clone(),
            lookup,
        });
    }
    Ok(pending)
}

/// Upper bound on lookups in flight at once.
const MAX_PARALLEL_LOOKUPS: usize = 8;

type LookupResult = std::result::Result<String, crate::WorkspaceError>;

/// Resolve every lookup on a bounded pool of scoped workers.
///
/// Results come back in the order of `pending`.
fn resolve_all(client: &dyn WorkspaceClient, pending: &[Pending]) -> Vec<LookupResult> {
    let workers = pending.len().min(MAX_PARALLEL_LOOKUPS);
    if workers <= 1 {
        return pending.iter().map(|item| item.lookup.resolve(client)).collect();
    }

    let counter = AtomicUsize::new(0);
    let next = &counter;
    let mut results: Vec<Option<LookupResult>> = pending.iter().map(|_| None).collect();
    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..workers)
            .map(|_| {
                scope.spawn(move || {
                    let mut done = Vec::new();
                    loop {
                        let index = next.fetch_add(1, Ordering::Relaxed);
                        let Some(item) = pending.get(index) else {
                            break;
                        };
                        done.push((index, item.lookup.resolve(client)));
                    }
                    done
                })
            })
            .collect();
        for handle in handles {
            if let Ok(done) = handle.join() {
                for (index, result) in done {
                    results[index] = Some(result);
                }
            }
        }
    });
    results
        .into_iter()
        .map(|result| {
            result.unwrap_or_else(|| Err(crate::WorkspaceError::new("lookup panicked")))
        })
        .collect()
}

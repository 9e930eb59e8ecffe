use super::{Resolver, Scope};
use crate::bundle::Bundle;
use crate::mutator::Mutator;
use crate::Result;
use bundle_diag::Diagnostic;
use bundle_dyn::{Path, Value};

/// Substitutes `${...}` references in one part of the document.
pub struct ResolveReferences {
    scope: Scope,
}

impl ResolveReferences {
    /// Rewrites everything outside `resources`, reading `bundle`,
    /// `workspace` and `variables`.
    pub fn without_resources() -> Self {
        Self {
            scope: Scope::WithoutResources,
        }
    }

    /// Rewrites `resources`, which may also refer to other resources.
    pub fn resources_only() -> Self {
        Self {
            scope: Scope::ResourcesOnly,
        }
    }
}

impl Mutator for ResolveReferences {
    fn name(&self) -> &str {
        match self.scope {
            Scope::WithoutResources => "ResolveReferences(without resources)",
            Scope::ResourcesOnly => "ResolveReferences(resources only)",
        }
    }

    fn apply(&self, bundle: &mut Bundle) -> Result<Vec<Diagnostic>> {
        let snapshot = bundle.config.clone();
        let mut resolver = Resolver::new(&snapshot, self.scope);
        let scope = self.scope;

        bundle
            .config
            .rewrite_strings(&mut |path: &Path, value: &Value| -> Result<Option<Value>> {
                if !scope.rewrites(path) {
                    return Ok(None);
                }
                resolver.resolve_string(path, value)
            })?;
        Ok(Vec::new())
    }
}

//! `${...}` reference substitution.
//!
//! A reference is a dotted path into the document, e.g. `${bundle.name}` or
//! `${resources.jobs.etl.id}`. `${var.x}` is shorthand for
//! `${variables.x.value}`.
//!
//! A string that is exactly one reference takes the referenced value,
//! including its type. References embedded in longer strings must resolve to
//! scalars and are substituted as text. References that cannot be resolved
//! are left in place.

mod mutator;

pub use mutator::ResolveReferences;

use crate::{BundleError, Result};
use bundle_dyn::{Path, PathComponent, Value, ValueKind};
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

static REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\$\{([a-zA-Z]+([-_]?[a-zA-Z0-9]+)*(\.[a-zA-Z]+([-_]?[a-zA-Z0-9]+)*(\[[0-9]+\])*)*(\[[0-9]+\])*)\}",
    )
    .expect("Invalid regex pattern for references")
});

/// Which part of the document a resolution pass rewrites and may read.
///
/// Resources are resolved in a separate, later pass: their fields may refer
/// to anything, while nothing outside `resources` may refer into it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Rewrite everything except `resources`.
    WithoutResources,
    /// Rewrite only `resources`.
    ResourcesOnly,
}

impl Scope {
    /// Whether a reference into the section `root` may be resolved.
    fn can_read(self, root: &str) -> bool {
        match root {
            "bundle" | "workspace" | "variables" => true,
            "resources" => self == Scope::ResourcesOnly,
            _ => false,
        }
    }

    /// Whether strings at `path` are rewritten in this pass.
    pub fn rewrites(self, path: &Path) -> bool {
        let in_resources = path.components().first().and_then(PathComponent::as_key) == Some("resources");
        match self {
            Scope::WithoutResources => !in_resources,
            Scope::ResourcesOnly => in_resources,
        }
    }
}

/// Every reference in `text`, as written (without `${` and `}`).
pub fn references(text: &str) -> Vec<&str> {
    REFERENCE
        .captures_iter(text)
        .filter_map(|c| c.get(1).map(|m| m.as_str()))
        .collect()
}

/// Expand the `var.` shorthand into a document path.
pub fn normalize_reference(reference: &str) -> Option<Path> {
    let path: Path = reference.parse().ok()?;
    match path.components() {
        [PathComponent::Key(first), PathComponent::Key(name), rest @ ..] if first == "var" => {
            let base = Path::from_keys(["variables", name.as_str(), "value"]);
            Some(base.join(&Path::from(rest.to_vec())))
        }
        _ => Some(path),
    }
}

/// Resolves references against a snapshot of the document.
///
/// Referenced values are resolved recursively and memoized. A reference
/// reached again while it is being resolved is a cycle.
pub struct Resolver<'a> {
    document: &'a Value,
    scope: Scope,
    cache: HashMap<String, Option<Value>>,
    stack: Vec<String>,
}

impl<'a> Resolver<'a> {
    pub fn new(document: &'a Value, scope: Scope) -> Self {
        Self {
            document,
            scope,
            cache: HashMap::new(),
            stack: Vec::new(),
        }
    }

    /// The resolved value `reference` points at, or `None` if it cannot be
    /// resolved in this pass.
    pub fn resolve_reference(&mut self, reference: &str) -> Result<Option<Value>> {
        let Some(path) = normalize_reference(reference) else {
            return Ok(None);
        };
        let Some(root) = path.components().first().and_then(PathComponent::as_key) else {
            return Ok(None);
        };
        if !self.scope.can_read(root) {
            return Ok(None);
        }

        let key = path.to_string();
        if let Some(start) = self.stack.iter().position(|p| *p == key) {
            let mut chain = self.stack[start..].to_vec();
            chain.push(key);
            return Err(BundleError::Cycle { chain });
        }
        if let Some(cached) = self.cache.get(&key) {
            return Ok(cached.clone());
        }

        let Some(target) = self.document.get_by_path(&path) else {
            self.cache.insert(key, None);
            return Ok(None);
        };

        self.stack.push(key.clone());
        let resolved = self.resolve_value(&path, target);
        self.stack.pop();
        let resolved = resolved?;

        self.cache.insert(key, Some(resolved.clone()));
        Ok(Some(resolved))
    }

    /// `value` with every reference inside it resolved.
    fn resolve_value(&mut self, path: &Path, value: &Value) -> Result<Value> {
        match &value.kind {
            ValueKind::String(_) => Ok(self
                .resolve_string(path, value)?
                .unwrap_or_else(|| value.clone())),
            ValueKind::Sequence(items) => {
                let mut out = Vec::with_capacity(items.len());
                for (i, item) in items.iter().enumerate() {
                    out.push(self.resolve_value(&path.index(i), item)?);
                }
                Ok(Value::sequence(out).with_locations(value.locations.clone()))
            }
            ValueKind::Mapping(fields) => {
                let mut out = Value::empty_mapping().with_locations(value.locations.clone());
                for (key, field) in fields {
                    let resolved = self.resolve_value(&path.key(key.as_str()), field)?;
                    out.insert(key.clone(), resolved);
                }
                Ok(out)
            }
            _ => Ok(value.clone()),
        }
    }

    /// Substitute the references in string `value` found at `path`.
    ///
    /// Returns `None` when nothing was substituted.
    pub fn resolve_string(&mut self, path: &Path, value: &Value) -> Result<Option<Value>> {
        let Some(text) = value.as_str() else {
            return Ok(None);
        };
        let matches: Vec<(std::ops::Range<usize>, String)> = REFERENCE
            .captures_iter(text)
            .filter_map(|c| Some((c.get(0)?.range(), c.get(1)?.as_str().to_string())))
            .collect();
        if matches.is_empty() {
            return Ok(None);
        }

        if let [(range, reference)] = matches.as_slice()
            && range.start == 0
            && range.end == text.len()
        {
            return Ok(self
                .resolve_reference(reference)?
                .map(|resolved| resolved.with_locations(value.locations.clone())));
        }

        let mut out = String::with_capacity(text.len());
        let mut last = 0;
        let mut changed = false;
        for (range, reference) in &matches {
            out.push_str(&text[last..range.start]);
            last = range.end;

            let Some(resolved) = self.resolve_reference(reference)? else {
                out.push_str(&text[range.clone()]);
                continue;
            };
            let Some(rendered) = resolved.scalar_to_string() else {
                return Err(BundleError::NonStringInterpolation {
                    reference: format!("${{{reference}}}"),
                    path: path.clone(),
                    location: value.location().cloned(),
                });
            };
            out.push_str(&rendered);
            changed = true;
        }
        out.push_str(&text[last..]);

        if !changed {
            return Ok(None);
        }
        Ok(Some(Value::from(out).with_locations(value.locations.clone())))
    }
}

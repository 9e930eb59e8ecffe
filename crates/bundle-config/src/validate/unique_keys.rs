//! Resource and script keys must be unique across all types.

use super::Check;
use crate::bundle::Bundle;
use bundle_diag::Diagnostic;
use bundle_dyn::{Location, Path, Value};
use indexmap::IndexMap;

/// What counts as a duplicate definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyScope {
    /// A key used by two types, or one resource defined in several files.
    AcrossFiles,
    /// Only a key used by two types.
    AcrossTypes,
}

/// One place a key is defined.
struct Site<'a> {
    section: &'a str,
    path: Path,
    locations: &'a [Location],
}

fn sites(config: &Value) -> IndexMap<&str, Vec<Site<'_>>> {
    let mut by_key: IndexMap<&str, Vec<Site<'_>>> = IndexMap::new();

    for (plural, key, value) in super::resource_entries(config) {
        by_key.entry(key).or_default().push(Site {
            section: plural,
            path: Path::from_keys(["resources", plural, key]),
            locations: &value.locations,
        });
    }
    if let Some(scripts) = config.get("scripts").and_then(Value::as_mapping) {
        for (key, value) in scripts {
            by_key.entry(key.as_str()).or_default().push(Site {
                section: "scripts",
                path: Path::from_keys(["scripts", key.as_str()]),
                locations: &value.locations,
            });
        }
    }
    by_key
}

fn is_duplicate(sites: &[Site<'_>], scope: KeyScope) -> bool {
    let first = sites[0].section;
    if sites.iter().any(|s| s.section != first) {
        return true;
    }
    scope == KeyScope::AcrossFiles
        && sites.iter().any(|s| {
            s.locations
                .iter()
                .any(|l| s.locations.first().is_some_and(|f| f.file != l.file))
        })
}

/// One error per duplicated key, in order of first definition.
///
/// Every definition site is listed, sorted by type and then by location.
pub fn duplicate_keys(config: &Value, scope: KeyScope) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    for (key, sites) in sites(config) {
        if !is_duplicate(&sites, scope) {
            continue;
        }

        let mut entries: Vec<(&str, &Location, &Path)> = sites
            .iter()
            .flat_map(|s| s.locations.iter().map(move |l| (s.section, l, &s.path)))
            .collect();
        entries.sort_by(|a, b| {
            (a.0, &a.1.file, a.1.line, a.1.column).cmp(&(b.0, &b.1.file, b.1.line, b.1.column))
        });
        entries.dedup_by(|a, b| a.1 == b.1);

        let mut sorted_sites: Vec<&Site<'_>> = sites.iter().collect();
        sorted_sites.sort_by_key(|s| s.section);

        let mut diag = Diagnostic::error(format!(
            "multiple resources or scripts have been defined with the same key: {key}"
        ))
        .with_locations(entries.iter().map(|(_, l, _)| (*l).clone()));
        let mut seen: Vec<&Path> = Vec::new();
        for site in sorted_sites {
            if !seen.contains(&&site.path) {
                seen.push(&site.path);
                diag = diag.with_path(site.path.clone());
            }
        }
        diagnostics.push(diag);
    }
    diagnostics
}

/// Post-target check: keys shared between types.
///
/// Keys already reported while loading are not reported again.
pub struct UniqueResourceKeys;

impl Check for UniqueResourceKeys {
    fn name(&self) -> &str {
        "unique_resource_keys"
    }

    fn check(&self, bundle: &Bundle) -> Vec<Diagnostic> {
        duplicate_keys(&bundle.config, KeyScope::AcrossTypes)
            .into_iter()
            .filter(|diag| !bundle.diagnostics.iter().any(|d| d.summary == diag.summary))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bundle_dyn::merge;

    fn doc(yaml: &str, file: &str) -> Value {
        bundle_yaml::parse(yaml, file).unwrap().0
    }

    #[test]
    fn test_key_shared_between_types() {
        let a = doc("resources:\n  pipelines:\n    foo:\n      name: p\n", "a.yml");
        let b = doc("resources:\n  jobs:\n    foo:\n      name: j\n", "b.yml");
        let config = merge(&a, &b);

        let diags = duplicate_keys(&config, KeyScope::AcrossTypes);
        assert_eq!(diags.len(), 1);
        let diag = &diags[0];
        assert_eq!(
            diag.summary,
            "multiple resources or scripts have been defined with the same key: foo"
        );
        assert_eq!(
            diag.locations,
            [Location::new("b.yml", 4, 7), Location::new("a.yml", 4, 7)]
        );
        let paths: Vec<String> = diag.paths.iter().map(|p| p.to_string()).collect();
        assert_eq!(paths, ["resources.jobs.foo", "resources.pipelines.foo"]);
    }

    #[test]
    fn test_resource_and_script() {
        let config = doc(
            "resources:\n  jobs:\n    build:\n      name: b\nscripts:\n  build:\n    content: make\n",
            "databricks.yml",
        );
        let diags = duplicate_keys(&config, KeyScope::AcrossTypes);
        let paths: Vec<String> = diags[0].paths.iter().map(|p| p.to_string()).collect();
        assert_eq!(paths, ["resources.jobs.build", "scripts.build"]);
    }

    #[test]
    fn test_same_resource_in_two_files() {
        let a = doc("resources:\n  jobs:\n    foo:\n      name: a\n", "a.yml");
        let b = doc("resources:\n  jobs:\n    foo:\n      tags: {x: y}\n", "b.yml");
        let config = merge(&a, &b);

        assert!(duplicate_keys(&config, KeyScope::AcrossTypes).is_empty());
        let diags = duplicate_keys(&config, KeyScope::AcrossFiles);
        assert_eq!(diags.len(), 1);
        assert_eq!(
            diags[0].locations,
            [Location::new("a.yml", 4, 7), Location::new("b.yml", 4, 7)]
        );
        assert_eq!(diags[0].paths.len(), 1);
    }

    #[test]
    fn test_check_skips_keys_reported_at_load() {
        use crate::options::{BundleOptions, Environment};

        let mut bundle = Bundle::new(BundleOptions::new("/tmp"), Environment::default());
        bundle.config = doc(
            "resources:\n  jobs:\n    foo: {}\n  pipelines:\n    foo: {}\n    bar: {}\n  experiments:\n    bar: {}\n",
            "databricks.yml",
        );
        bundle.diagnostics = duplicate_keys(&bundle.config, KeyScope::AcrossFiles)
            .into_iter()
            .filter(|d| d.summary.ends_with("foo"))
            .collect();

        let diags = UniqueResourceKeys.check(&bundle);
        assert_eq!(diags.len(), 1);
        assert!(diags[0].summary.ends_with(": bar"));
    }

    #[test]
    fn test_distinct_keys_are_fine() {
        let config = doc(
            "resources:\n  jobs:\n    a: {name: a}\n  pipelines:\n    b: {name: b}\n",
            "databricks.yml",
        );
        assert!(duplicate_keys(&config, KeyScope::AcrossFiles).is_empty());
    }
}

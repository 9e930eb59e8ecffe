//! Expanding `include` patterns and merging the included files.

use super::{ROOT_FILE_NAMES, load_relative};
use crate::bundle::Bundle;
use crate::mutator::Mutator;
use crate::{BundleError, Result};
use bundle_diag::Diagnostic;
use bundle_dyn::{Location, Path, Value, merge_with};
use std::collections::HashSet;
use std::path::{Component, Path as FsPath, PathBuf};

/// Expands the root file's `include` patterns and merges every matched file
/// into the document, in resolved order.
///
/// The resolved relative paths replace the patterns in `include`.
pub struct ProcessRootIncludes;

impl Mutator for ProcessRootIncludes {
    fn name(&self) -> &str {
        "ProcessRootIncludes"
    }

    fn apply(&self, bundle: &mut Bundle) -> Result<Vec<Diagnostic>> {
        let patterns = include_patterns(&bundle.config)?;
        if patterns.is_empty() {
            return Ok(Vec::new());
        }

        let files = resolve_includes(&bundle.root, &patterns)?;
        let resolved: Vec<Value> = files
            .iter()
            .map(|(file, location)| {
                let value = Value::from(file.as_str());
                match location {
                    Some(location) => value.with_location(location.clone()),
                    None => value,
                }
            })
            .collect();
        let include_locations = bundle
            .config
            .get("include")
            .map(|v| v.locations.clone())
            .unwrap_or_default();
        bundle.config.insert(
            "include",
            Value::sequence(resolved).with_locations(include_locations),
        );

        let mut diagnostics = Vec::new();
        for (file, _) in &files {
            tracing::debug!(file = %file, "merging included file");
            let (mut value, warnings) = load_relative(&bundle.root, file)?;
            diagnostics.extend(warnings);

            if let Some(nested) = value.remove("include") {
                diagnostics.push(
                    Diagnostic::warning("Include section is defined outside root file")
                        .with_locations(nested.locations)
                        .with_path(Path::from_keys(["include"])),
                );
            }
            bundle.config = merge_with(&bundle.config, &value, bundle.registry.as_ref());
        }

        Ok(diagnostics)
    }
}

/// The `include` entries with their locations.
fn include_patterns(config: &Value) -> Result<Vec<(String, Option<Location>)>> {
    let Some(include) = config.get("include") else {
        return Ok(Vec::new());
    };
    if include.is_null() {
        return Ok(Vec::new());
    }
    let Some(entries) = include.as_sequence() else {
        return Err(BundleError::invalid(
            Path::from_keys(["include"]),
            format!("expected a sequence, found {}", include.kind_name()),
            include.location().cloned(),
        ));
    };

    entries
        .iter()
        .enumerate()
        .map(|(i, entry)| match entry.as_str() {
            Some(pattern) => Ok((pattern.to_string(), entry.location().cloned())),
            None => Err(BundleError::invalid(
                Path::from_keys(["include"]).index(i),
                format!("expected a string, found {}", entry.kind_name()),
                entry.location().cloned(),
            )),
        })
        .collect()
}

fn is_glob(pattern: &str) -> bool {
    pattern.contains(['*', '?', '['])
}

/// Expand include patterns into relative file paths.
///
/// Matches are sorted per pattern and concatenated in declaration order.
/// Root configuration files and paths already matched by an earlier pattern
/// are skipped, so every file appears once.
pub fn resolve_includes(
    root: &FsPath,
    patterns: &[(String, Option<Location>)],
) -> Result<Vec<(String, Option<Location>)>> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut files = Vec::new();

    for (pattern, location) in patterns {
        if FsPath::new(pattern).is_absolute() {
            return Err(BundleError::AbsoluteInclude {
                pattern: pattern.clone(),
                location: location.clone(),
            });
        }

        let matches = expand_pattern(root, pattern, location)?;
        if matches.is_empty() && !is_glob(pattern) {
            return Err(BundleError::IncludeNoMatch {
                pattern: pattern.clone(),
                location: location.clone(),
            });
        }
        tracing::debug!(pattern = %pattern, matches = matches.len(), "expanded include");

        for rel in matches {
            if ROOT_FILE_NAMES.contains(&rel.as_str()) || seen.contains(&rel) {
                continue;
            }
            if !(rel.ends_with(".yml") || rel.ends_with(".yaml")) {
                return Err(BundleError::IncludeNotYaml {
                    file: rel,
                    location: location.clone(),
                });
            }
            seen.insert(rel.clone());
            files.push((rel, location.clone()));
        }
    }

    Ok(files)
}

/// Sorted relative paths of the files matching `pattern` under `root`.
fn expand_pattern(
    root: &FsPath,
    pattern: &str,
    location: &Option<Location>,
) -> Result<Vec<String>> {
    let root_str = root.to_string_lossy();
    let full = format!("{}/{}", glob::Pattern::escape(&root_str), pattern);
    let invalid = |message: String| BundleError::InvalidGlob {
        pattern: pattern.to_string(),
        message,
        location: location.clone(),
    };

    let root_normalized = lexical_normalize(root);
    let mut matches = Vec::new();
    for entry in glob::glob(&full).map_err(|err| invalid(err.to_string()))? {
        let path = entry.map_err(|err| invalid(err.to_string()))?;
        if path.is_dir() {
            continue;
        }
        let normalized = lexical_normalize(&path);
        let Ok(rel) = normalized.strip_prefix(&root_normalized) else {
            return Err(BundleError::IncludeOutsideRoot {
                pattern: pattern.to_string(),
                file: path.to_string_lossy().into_owned(),
                location: location.clone(),
            });
        };
        let rel: Vec<String> = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        matches.push(rel.join("/"));
    }
    matches.sort();
    matches.dedup();
    Ok(matches)
}

/// Drop `.` components and fold `..` into its parent without touching the
/// filesystem.
fn lexical_normalize(path: &FsPath) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if matches!(out.components().next_back(), Some(Component::Normal(_))) {
                    out.pop();
                } else {
                    out.push(component);
                }
            }
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(dir: &TempDir, name: &str) {
        let path = dir.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, "").unwrap();
    }

    fn patterns(list: &[&str]) -> Vec<(String, Option<Location>)> {
        list.iter().map(|p| (p.to_string(), None)).collect()
    }

    fn names(files: Vec<(String, Option<Location>)>) -> Vec<String> {
        files.into_iter().map(|(f, _)| f).collect()
    }

    #[test]
    fn test_glob_excludes_root_and_sorts() {
        let dir = TempDir::new().unwrap();
        touch(&dir, "databricks.yml");
        touch(&dir, "b.yml");
        touch(&dir, "a.yml");

        let files = resolve_includes(dir.path(), &patterns(&["*.yml"])).unwrap();
        assert_eq!(names(files), ["a.yml", "b.yml"]);
    }

    #[test]
    fn test_duplicate_patterns_dedup() {
        let dir = TempDir::new().unwrap();
        touch(&dir, "a.yml");

        let files = resolve_includes(dir.path(), &patterns(&["*.yml", "*.yml"])).unwrap();
        assert_eq!(names(files), ["a.yml"]);
    }

    #[test]
    fn test_overlapping_globs_keep_first_match_order() {
        let dir = TempDir::new().unwrap();
        touch(&dir, "resources/b.yml");
        touch(&dir, "resources/a.yml");
        touch(&dir, "z.yml");

        let files = resolve_includes(
            dir.path(),
            &patterns(&["z.yml", "resources/b.yml", "resources/*.yml", "*.yml"]),
        )
        .unwrap();
        assert_eq!(names(files), ["z.yml", "resources/b.yml", "resources/a.yml"]);
    }

    #[test]
    fn test_missing_literal_is_fatal() {
        let dir = TempDir::new().unwrap();
        let err = resolve_includes(dir.path(), &patterns(&["notexist.yml"])).unwrap_err();
        assert_eq!(
            err.to_string(),
            "notexist.yml defined in 'include' section does not match any files"
        );
    }

    #[test]
    fn test_empty_glob_is_fine() {
        let dir = TempDir::new().unwrap();
        let files = resolve_includes(dir.path(), &patterns(&["conf/*.yml"])).unwrap();
        assert!(files.is_empty());
    }

    #[test]
    fn test_absolute_include_is_fatal() {
        let dir = TempDir::new().unwrap();
        let err = resolve_includes(dir.path(), &patterns(&["/etc/*.yml"])).unwrap_err();
        assert!(matches!(err, BundleError::AbsoluteInclude { .. }));
    }

    #[test]
    fn test_non_yaml_match_is_fatal() {
        let dir = TempDir::new().unwrap();
        touch(&dir, "notes.txt");
        let err = resolve_includes(dir.path(), &patterns(&["*"])).unwrap_err();
        match err {
            BundleError::IncludeNotYaml { file, .. } => assert_eq!(file, "notes.txt"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_include_outside_root_is_fatal() {
        let dir = TempDir::new().unwrap();
        touch(&dir, "bundle/databricks.yml");
        touch(&dir, "shared/x.yml");
        let root = dir.path().join("bundle");

        let err = resolve_includes(&root, &patterns(&["../shared/x.yml"])).unwrap_err();
        match &err {
            BundleError::IncludeOutsideRoot { pattern, .. } => {
                assert_eq!(pattern, "../shared/x.yml");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(err.to_string().contains("escapes the bundle root"));
    }

    #[test]
    fn test_parent_components_inside_root_are_folded() {
        let dir = TempDir::new().unwrap();
        touch(&dir, "conf/a.yml");
        touch(&dir, "b.yml");

        let files =
            resolve_includes(dir.path(), &patterns(&["conf/../b.yml", "b.yml"])).unwrap();
        assert_eq!(names(files), ["b.yml"]);
    }

    #[test]
    fn test_directories_are_skipped() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("sub.yml")).unwrap();
        touch(&dir, "x.yml");
        let files = resolve_includes(dir.path(), &patterns(&["*.yml"])).unwrap();
        assert_eq!(names(files), ["x.yml"]);
    }
}

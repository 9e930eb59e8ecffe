use super::Check;
use crate::bundle::Bundle;
use bundle_diag::Diagnostic;
use bundle_dyn::{Path, Value};
use std::path::Path as FsPath;

/// Warns about `sync.include` and `sync.exclude` patterns that match nothing.
pub struct SyncPatternsMatch;

impl Check for SyncPatternsMatch {
    fn name(&self) -> &str {
        "sync_patterns_match"
    }

    fn check(&self, bundle: &Bundle) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        for field in ["include", "exclude"] {
            let Some(entries) = bundle
                .config
                .get("sync")
                .and_then(|s| s.get(field))
                .and_then(Value::as_sequence)
            else {
                continue;
            };
            for (i, entry) in entries.iter().enumerate() {
                let Some(pattern) = entry.as_str() else {
                    continue;
                };
                if matches_anything(&bundle.root, pattern) {
                    continue;
                }
                diagnostics.push(
                    Diagnostic::warning(format!("Pattern {pattern} does not match any files"))
                        .with_locations(entry.locations.iter().cloned())
                        .with_path(Path::from_keys(["sync", field]).index(i)),
                );
            }
        }
        diagnostics
    }
}

/// Whether `pattern` matches any file or directory under `root`.
///
/// Patterns follow gitignore conventions: a leading `!` negates, a trailing
/// `/` restricts to directories, and a pattern without a slash matches at
/// any depth.
fn matches_anything(root: &FsPath, pattern: &str) -> bool {
    let pattern = pattern.strip_prefix('!').unwrap_or(pattern);
    let dirs_only = pattern.ends_with('/');
    let pattern = pattern.trim_end_matches('/');
    if pattern.is_empty() {
        return true;
    }

    let base = glob::Pattern::escape(&root.to_string_lossy());
    let anchored = pattern.trim_start_matches('/');
    let mut candidates = vec![format!("{base}/{anchored}")];
    if !pattern.contains('/') {
        candidates.push(format!("{base}/**/{anchored}"));
    }

    candidates.iter().any(|candidate| {
        glob::glob(candidate).is_ok_and(|mut paths| {
            paths.any(|p| p.is_ok_and(|p| !dirs_only || p.is_dir()))
        })
    })
}

//! Target selection.
//!
//! A target is a named override block under `targets`. Exactly one target is
//! selected per invocation and merged on top of the base document.

use crate::bundle::Bundle;
use crate::mutator::Mutator;
use crate::variables::merge_target_variables;
use crate::{BundleError, Result};
use bundle_diag::Diagnostic;
use bundle_dyn::{Mapping, Path, Value, merge_with};

/// Top-level sections a target overrides by plain merge.
const MERGED_SECTIONS: [&str; 8] = [
    "bundle",
    "workspace",
    "artifacts",
    "resources",
    "sync",
    "permissions",
    "run_as",
    "presets",
];

/// Normalizes the target section.
///
/// `environments` is accepted as a legacy name for `targets`. A bundle
/// without targets gets an empty target named `default`.
pub struct DefineDefaultTarget;

impl Mutator for DefineDefaultTarget {
    fn name(&self) -> &str {
        "DefineDefaultTarget"
    }

    fn apply(&self, bundle: &mut Bundle) -> Result<Vec<Diagnostic>> {
        let config = &mut bundle.config;

        if let Some(environments) = config.remove("environments") {
            if config.get("targets").is_some() {
                return Err(BundleError::BothTargetsAndEnvironments {
                    location: environments.location().cloned(),
                });
            }
            config.insert("targets", environments);
        }

        let has_targets = config
            .get("targets")
            .and_then(Value::as_mapping)
            .is_some_and(|targets| !targets.is_empty());
        if !has_targets {
            tracing::debug!("no targets defined; adding implicit default target");
            config.insert(
                "targets",
                Value::from_pairs([("default", Value::empty_mapping())]),
            );
        }
        Ok(Vec::new())
    }
}

/// Name of the target to use when none was requested.
///
/// A lone target is selected; otherwise exactly one must set `default: true`.
pub fn default_target_name(targets: &Mapping) -> Result<String> {
    if targets.is_empty() {
        return Err(BundleError::NoTargets);
    }
    if targets.len() == 1 {
        return Ok(targets.keys().next().cloned().unwrap_or_default());
    }

    let mut defaults: Vec<String> = targets
        .iter()
        .filter(|(_, target)| {
            target
                .get("default")
                .and_then(Value::as_bool)
                .unwrap_or(false)
        })
        .map(|(name, _)| name.clone())
        .collect();
    defaults.sort();

    match defaults.len() {
        0 => Err(BundleError::NoDefaultTarget),
        1 => Ok(defaults.remove(0)),
        _ => Err(BundleError::AmbiguousDefault { names: defaults }),
    }
}

/// Selects a target and merges its overrides into the document.
///
/// Uses the target named in the options, or the default target. Afterwards
/// `bundle.target` names the selection and `targets` is gone.
pub struct SelectTarget;

impl Mutator for SelectTarget {
    fn name(&self) -> &str {
        "SelectTarget"
    }

    fn apply(&self, bundle: &mut Bundle) -> Result<Vec<Diagnostic>> {
        let targets = bundle
            .config
            .remove("targets")
            .unwrap_or_else(Value::empty_mapping);
        let Some(targets) = targets.as_mapping() else {
            return Err(BundleError::invalid(
                Path::from_keys(["targets"]),
                format!("expected a mapping, found {}", targets.kind_name()),
                targets.location().cloned(),
            ));
        };

        let name = match &bundle.options.target {
            Some(name) => name.clone(),
            None => default_target_name(targets)?,
        };
        let Some(target) = targets.get(&name) else {
            let mut available: Vec<String> = targets.keys().cloned().collect();
            available.sort();
            return Err(BundleError::NoSuchTarget { name, available });
        };
        tracing::debug!(target = %name, "selected target");

        if let Some(overrides) = target.get("variables") {
            let merged = merge_target_variables(bundle.config.get("variables"), overrides)?;
            bundle.config.insert("variables", merged);
        }

        let overlay = target_overlay(target);
        bundle.config = merge_with(&bundle.config, &overlay, bundle.registry.as_ref());

        let stamp = Value::from(name.as_str());
        bundle.set(&Path::from_keys(["bundle", "target"]), stamp.clone())?;
        bundle.set(&Path::from_keys(["bundle", "environment"]), stamp)?;
        bundle.target = Some(name);
        Ok(Vec::new())
    }
}

/// The part of a target that merges onto the base document.
fn target_overlay(target: &Value) -> Value {
    let mut overlay = Value::empty_mapping();
    for section in MERGED_SECTIONS {
        if let Some(value) = target.get(section) {
            overlay.insert(section, value.clone());
        }
    }

    let mut bundle_fields: Vec<(&str, Value)> = Vec::new();
    if let Some(mode) = target.get("mode") {
        bundle_fields.push(("mode", mode.clone()));
    }
    if let Some(cluster) = target.get("cluster_id").or_else(|| target.get("compute_id")) {
        bundle_fields.push(("cluster_id", cluster.clone()));
    }
    if let Some(git) = target.get("git") {
        bundle_fields.push(("git", git.clone()));
    }
    if !bundle_fields.is_empty() {
        let fields = Value::from_pairs(bundle_fields);
        let merged = match overlay.get("bundle") {
            Some(existing) => bundle_dyn::merge(existing, &fields),
            None => fields,
        };
        overlay.insert("bundle", merged);
    }
    overlay
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::{BundleOptions, Environment};
    use bundle_dyn::Location;

    fn bundle_with(yaml: &str, target: Option<&str>) -> Bundle {
        let mut options = BundleOptions::new("/tmp");
        if let Some(t) = target {
            options = options.with_target(t);
        }
        let mut bundle = Bundle::new(options, Environment::default());
        bundle.config = bundle_yaml::parse(yaml, "databricks.yml").unwrap().0;
        bundle
    }

    #[test]
    fn test_default_target_name_single() {
        let targets = Value::from_pairs([("dev", Value::empty_mapping())]);
        assert_eq!(default_target_name(targets.as_mapping().unwrap()).unwrap(), "dev");
    }

    #[test]
    fn test_default_target_name_errors() {
        let none = Value::empty_mapping();
        assert!(matches!(
            default_target_name(none.as_mapping().unwrap()),
            Err(BundleError::NoTargets)
        ));

        let unmarked = Value::from_pairs([
            ("dev", Value::empty_mapping()),
            ("prod", Value::empty_mapping()),
        ]);
        assert_eq!(
            default_target_name(unmarked.as_mapping().unwrap())
                .unwrap_err()
                .to_string(),
            "please specify target"
        );

        let marked = |v: bool| Value::from_pairs([("default", Value::from(v))]);
        let both = Value::from_pairs([("prod", marked(true)), ("dev", marked(true))]);
        assert_eq!(
            default_target_name(both.as_mapping().unwrap())
                .unwrap_err()
                .to_string(),
            "multiple targets are marked as default (dev, prod)"
        );
    }

    #[test]
    fn test_define_default_target() {
        let mut bundle = bundle_with("bundle:\n  name: x\n", None);
        DefineDefaultTarget.apply(&mut bundle).unwrap();
        assert!(bundle.get("targets.default").is_some());
    }

    #[test]
    fn test_environments_alias() {
        let mut bundle = bundle_with("environments:\n  dev:\n    default: true\n", None);
        DefineDefaultTarget.apply(&mut bundle).unwrap();
        assert!(bundle.get("targets.dev").is_some());
        assert!(bundle.get("environments").is_none());
    }

    #[test]
    fn test_targets_and_environments_conflict() {
        let mut bundle = bundle_with(
            "targets:\n  dev: {}\nenvironments:\n  prod: {}\n",
            None,
        );
        let err = DefineDefaultTarget.apply(&mut bundle).unwrap_err();
        assert_eq!(
            err.to_string(),
            "both 'environments' and 'targets' are specified; only 'targets' should be used"
        );
        assert_eq!(err.location(), Some(&Location::new("databricks.yml", 4, 3)));
    }

    #[test]
    fn test_select_target_merges_overrides() {
        let mut bundle = bundle_with(
            r#"
bundle:
  name: demo
workspace:
  host: https://base.example.com
resources:
  jobs:
    foo:
      name: base
      max_concurrent_runs: 1
targets:
  dev:
    default: true
    mode: development
    compute_id: abc-123
    workspace:
      host: https://dev.example.com
    resources:
      jobs:
        foo:
          name: dev
  prod: {}
"#,
            None,
        );
        SelectTarget.apply(&mut bundle).unwrap();

        assert_eq!(bundle.target.as_deref(), Some("dev"));
        let str_at = |p: &str| bundle.get(p).and_then(Value::as_str).map(str::to_string);
        assert_eq!(str_at("bundle.target").as_deref(), Some("dev"));
        assert_eq!(str_at("bundle.environment").as_deref(), Some("dev"));
        assert_eq!(str_at("bundle.name").as_deref(), Some("demo"));
        assert_eq!(str_at("bundle.mode").as_deref(), Some("development"));
        assert_eq!(str_at("bundle.cluster_id").as_deref(), Some("abc-123"));
        assert_eq!(str_at("workspace.host").as_deref(), Some("https://dev.example.com"));
        assert_eq!(str_at("resources.jobs.foo.name").as_deref(), Some("dev"));
        assert_eq!(
            bundle
                .get("resources.jobs.foo.max_concurrent_runs")
                .and_then(Value::as_i64),
            Some(1)
        );
        assert!(bundle.get("targets").is_none());
    }

    #[test]
    fn test_select_unknown_target() {
        let mut bundle = bundle_with("targets:\n  prod: {}\n  dev: {}\n", Some("staging"));
        let err = SelectTarget.apply(&mut bundle).unwrap_err();
        insta::assert_snapshot!(
            err.to_string(),
            @"staging: no such target. Available targets: dev, prod"
        );
    }

    #[test]
    fn test_select_target_keeps_override_location() {
        let mut bundle = bundle_with(
            "workspace:\n  host: a\ntargets:\n  dev:\n    workspace:\n      host: b\n",
            Some("dev"),
        );
        SelectTarget.apply(&mut bundle).unwrap();
        let host = bundle.get("workspace.host").unwrap();
        assert_eq!(host.location(), Some(&Location::new("databricks.yml", 6, 13)));
        assert_eq!(host.locations.len(), 2);
    }
}

//! Invocation options and the process environment snapshot.

use std::collections::BTreeMap;
use std::path::PathBuf;

/// Prefix of environment variables that assign bundle variables.
pub const BUNDLE_VAR_PREFIX: &str = "BUNDLE_VAR_";

/// How the pipeline treats error diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailMode {
    /// Collect every diagnostic and keep going.
    #[default]
    Collect,
    /// Stop at the first error diagnostic.
    FailFast,
}

/// Options for one pipeline invocation.
#[derive(Debug, Clone, Default)]
pub struct BundleOptions {
    /// Bundle root directory
    pub root: PathBuf,

    /// Explicitly selected target
    pub target: Option<String>,

    /// Raw `name=value` variable assignments from the command line
    pub variables: Vec<String>,

    pub fail_mode: FailMode,
}

impl BundleOptions {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Default::default()
        }
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    /// Add a raw `name=value` assignment.
    pub fn with_variable(mut self, assignment: impl Into<String>) -> Self {
        self.variables.push(assignment.into());
        self
    }

    pub fn with_fail_mode(mut self, fail_mode: FailMode) -> Self {
        self.fail_mode = fail_mode;
        self
    }
}

/// Snapshot of environment variables visible to the pipeline.
///
/// Built from the process environment in the CLI and from explicit pairs in
/// tests, so no stage reads ambient process state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment {
    vars: BTreeMap<String, String>,
}

impl Environment {
    /// Capture the current process environment.
    pub fn from_process() -> Self {
        Self {
            vars: std::env::vars().collect(),
        }
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    /// Value of `BUNDLE_VAR_<name>`, if set.
    pub fn bundle_var(&self, name: &str) -> Option<&str> {
        self.get(&format!("{BUNDLE_VAR_PREFIX}{name}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundle_var() {
        let env = Environment::from_pairs([("BUNDLE_VAR_b", "def"), ("HOME", "/root")]);
        assert_eq!(env.bundle_var("b"), Some("def"));
        assert_eq!(env.bundle_var("HOME"), None);
        assert_eq!(env.get("HOME"), Some("/root"));
    }

    #[test]
    fn test_options_builder() {
        let options = BundleOptions::new("/tmp/bundle")
            .with_target("dev")
            .with_variable("a=1")
            .with_fail_mode(FailMode::FailFast);
        assert_eq!(options.target.as_deref(), Some("dev"));
        assert_eq!(options.variables, ["a=1"]);
        assert_eq!(options.fail_mode, FailMode::FailFast);
    }
}

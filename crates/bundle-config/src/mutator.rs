//! Mutator pipeline infrastructure.
//!
//! - [`Mutator`] - a single pipeline step over a [`Bundle`]
//! - [`Pipeline`] - an ordered list of mutators
//!
//! A mutator either fails outright (a [`BundleError`]) or returns
//! diagnostics, which the pipeline appends to the bundle. In
//! [`FailMode::FailFast`] the first error diagnostic stops the pipeline.

use crate::bundle::Bundle;
use crate::options::FailMode;
use crate::{BundleError, Result};
use bundle_diag::Diagnostic;

/// A transformation step over a bundle.
pub trait Mutator: Send + Sync {
    /// Name used for logging.
    fn name(&self) -> &str;

    /// Apply the step.
    ///
    /// # Errors
    ///
    /// Returns an error if the bundle cannot be processed further.
    fn apply(&self, bundle: &mut Bundle) -> Result<Vec<Diagnostic>>;
}

/// An ordered sequence of mutators.
pub struct Pipeline {
    mutators: Vec<Box<dyn Mutator>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self {
            mutators: Vec::new(),
        }
    }

    /// Add a mutator; mutators run in the order they are added.
    pub fn push(&mut self, mutator: Box<dyn Mutator>) {
        self.mutators.push(mutator);
    }

    pub fn extend(&mut self, mutators: impl IntoIterator<Item = Box<dyn Mutator>>) {
        self.mutators.extend(mutators);
    }

    pub fn len(&self) -> usize {
        self.mutators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mutators.is_empty()
    }

    /// Run every mutator in order.
    ///
    /// # Errors
    ///
    /// Returns the first fatal error. In fail-fast mode the first error
    /// diagnostic is returned as [`BundleError::Fatal`]; diagnostics reported
    /// before it stay on the bundle.
    pub fn execute(&self, bundle: &mut Bundle) -> Result<()> {
        for mutator in &self.mutators {
            tracing::debug!(mutator = mutator.name(), "Running mutator");
            let diagnostics = mutator.apply(bundle)?;
            append(bundle, mutator.name(), diagnostics)?;
        }
        Ok(())
    }

    pub fn mutator_names(&self) -> Vec<&str> {
        self.mutators.iter().map(|m| m.name()).collect()
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

fn append(bundle: &mut Bundle, mutator: &str, diagnostics: Vec<Diagnostic>) -> Result<()> {
    for diag in diagnostics {
        tracing::debug!(mutator, severity = ?diag.severity, summary = %diag.summary, "diagnostic");
        if diag.is_error() && bundle.options.fail_mode == FailMode::FailFast {
            return Err(BundleError::Fatal(diag));
        }
        bundle.diagnostics.push(diag);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::{BundleOptions, Environment};
    use std::sync::{Arc, Mutex};

    struct Recording {
        name: &'static str,
        log: Arc<Mutex<Vec<&'static str>>>,
        emits: Vec<Diagnostic>,
    }

    impl Mutator for Recording {
        fn name(&self) -> &str {
            self.name
        }

        fn apply(&self, _bundle: &mut Bundle) -> Result<Vec<Diagnostic>> {
            self.log.lock().unwrap().push(self.name);
            Ok(self.emits.clone())
        }
    }

    struct Failing;

    impl Mutator for Failing {
        fn name(&self) -> &str {
            "failing"
        }

        fn apply(&self, _bundle: &mut Bundle) -> Result<Vec<Diagnostic>> {
            Err(BundleError::NoTargets)
        }
    }

    fn pipeline(log: &Arc<Mutex<Vec<&'static str>>>) -> Pipeline {
        let mut pipeline = Pipeline::new();
        pipeline.push(Box::new(Recording {
            name: "first",
            log: log.clone(),
            emits: vec![Diagnostic::warning("w1"), Diagnostic::error("e1")],
        }));
        pipeline.push(Box::new(Recording {
            name: "second",
            log: log.clone(),
            emits: vec![Diagnostic::error("e2")],
        }));
        pipeline
    }

    #[test]
    fn test_collect_mode_runs_everything() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut bundle = Bundle::new(BundleOptions::new("/tmp"), Environment::default());

        pipeline(&log).execute(&mut bundle).unwrap();

        assert_eq!(*log.lock().unwrap(), ["first", "second"]);
        let summaries: Vec<_> = bundle.diagnostics.iter().map(|d| d.summary.as_str()).collect();
        assert_eq!(summaries, ["w1", "e1", "e2"]);
    }

    #[test]
    fn test_fail_fast_stops_at_first_error() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let options = BundleOptions::new("/tmp").with_fail_mode(FailMode::FailFast);
        let mut bundle = Bundle::new(options, Environment::default());

        let err = pipeline(&log).execute(&mut bundle).unwrap_err();

        assert_eq!(err.to_string(), "e1");
        assert_eq!(*log.lock().unwrap(), ["first"]);
        assert_eq!(bundle.diagnostics.len(), 1);
        assert_eq!(bundle.diagnostics[0].summary, "w1");
    }

    #[test]
    fn test_fatal_error_propagates() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut p = Pipeline::new();
        p.push(Box::new(Failing));
        p.extend(pipeline(&log).mutators);
        assert_eq!(p.mutator_names(), ["failing", "first", "second"]);

        let mut bundle = Bundle::new(BundleOptions::new("/tmp"), Environment::default());
        assert!(matches!(p.execute(&mut bundle), Err(BundleError::NoTargets)));
        assert!(log.lock().unwrap().is_empty());
    }
}

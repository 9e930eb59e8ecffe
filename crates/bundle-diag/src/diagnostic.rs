//! Core diagnostic types.

use bundle_dyn::{Location, Path};
use serde::{Deserialize, Serialize};
use std::fmt::Write;

/// The severity of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// A problem that makes the configuration unusable
    Error,
    /// A likely mistake that does not prevent processing
    Warning,
    /// Informational message
    Info,
}

impl Severity {
    fn label(self) -> &'static str {
        match self {
            Severity::Error => "Error",
            Severity::Warning => "Warning",
            Severity::Info => "Info",
        }
    }
}

/// A located problem report.
///
/// The serialized form is the shape callers (and test harnesses) consume:
/// `{severity, summary, detail?, locations: [{file, line, column}], paths: [string]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Error, Warning or Info
    pub severity: Severity,

    /// One-line description of the problem
    pub summary: String,

    /// Optional longer explanation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,

    /// Source positions the problem refers to, most relevant first
    #[serde(default)]
    pub locations: Vec<Location>,

    /// Document paths the problem refers to
    #[serde(default)]
    pub paths: Vec<Path>,
}

impl Diagnostic {
    /// Create a diagnostic with just a severity and summary.
    pub fn new(severity: Severity, summary: impl Into<String>) -> Self {
        Self {
            severity,
            summary: summary.into(),
            detail: None,
            locations: Vec::new(),
            paths: Vec::new(),
        }
    }

    /// Create an error diagnostic.
    pub fn error(summary: impl Into<String>) -> Self {
        Self::new(Severity::Error, summary)
    }

    /// Create a warning diagnostic.
    pub fn warning(summary: impl Into<String>) -> Self {
        Self::new(Severity::Warning, summary)
    }

    /// Create an info diagnostic.
    pub fn info(summary: impl Into<String>) -> Self {
        Self::new(Severity::Info, summary)
    }

    /// Set the detail text.
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Add a location.
    pub fn with_location(mut self, location: Location) -> Self {
        self.locations.push(location);
        self
    }

    /// Add several locations.
    pub fn with_locations(mut self, locations: impl IntoIterator<Item = Location>) -> Self {
        self.locations.extend(locations);
        self
    }

    /// Add a document path.
    pub fn with_path(mut self, path: Path) -> Self {
        self.paths.push(path);
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    /// Render as text.
    ///
    /// Format:
    /// ```text
    /// Error: summary
    ///   at resources.jobs.foo
    ///   in databricks.yml:3:5
    ///
    /// detail text
    /// ```
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{}: {}", self.severity.label(), self.summary);

        for path in &self.paths {
            let _ = writeln!(out, "  at {}", path);
        }
        for loc in &self.locations {
            let _ = writeln!(out, "  in {}", loc);
        }
        if let Some(detail) = &self.detail {
            let _ = write!(out, "\n{}\n", detail);
        }
        out
    }
}

/// Queries over a list of diagnostics.
pub trait DiagnosticsExt {
    /// Whether any diagnostic is an error.
    fn has_error(&self) -> bool;

    /// The first error, if any.
    fn first_error(&self) -> Option<&Diagnostic>;

    /// Diagnostics of the given severity.
    fn filter_severity(&self, severity: Severity) -> Vec<&Diagnostic>;
}

impl DiagnosticsExt for [Diagnostic] {
    fn has_error(&self) -> bool {
        self.iter().any(Diagnostic::is_error)
    }

    fn first_error(&self) -> Option<&Diagnostic> {
        self.iter().find(|d| d.is_error())
    }

    fn filter_severity(&self, severity: Severity) -> Vec<&Diagnostic> {
        self.iter().filter(|d| d.severity == severity).collect()
    }
}

impl DiagnosticsExt for Vec<Diagnostic> {
    fn has_error(&self) -> bool {
        self.as_slice().has_error()
    }

    fn first_error(&self) -> Option<&Diagnostic> {
        self.as_slice().first_error()
    }

    fn filter_severity(&self, severity: Severity) -> Vec<&Diagnostic> {
        self.as_slice().filter_severity(severity)
    }
}

/// Render diagnostics as text, separated by blank lines.
pub fn render_text(diagnostics: &[Diagnostic]) -> String {
    diagnostics
        .iter()
        .map(Diagnostic::to_text)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Render diagnostics as a JSON array.
pub fn render_json(diagnostics: &[Diagnostic]) -> serde_json::Value {
    serde_json::to_value(diagnostics).unwrap_or(serde_json::Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn located_error() -> Diagnostic {
        Diagnostic::error("job foo is not defined")
            .with_location(Location::new("databricks.yml", 3, 5))
            .with_path("resources.jobs.foo".parse().unwrap())
    }

    #[test]
    fn test_builder() {
        let d = located_error().with_detail("more");
        assert!(d.is_error());
        assert_eq!(d.locations.len(), 1);
        assert_eq!(d.paths.len(), 1);
        assert_eq!(d.detail.as_deref(), Some("more"));
    }

    #[test]
    fn test_json_shape() {
        let json = serde_json::to_value(located_error()).unwrap();
        assert_eq!(
            json,
            json!({
                "severity": "error",
                "summary": "job foo is not defined",
                "locations": [{"file": "databricks.yml", "line": 3, "column": 5}],
                "paths": ["resources.jobs.foo"],
            })
        );
    }

    #[test]
    fn test_to_text() {
        insta::assert_snapshot!(
            located_error().to_text().trim_end(),
            @r"
        Error: job foo is not defined
          at resources.jobs.foo
          in databricks.yml:3:5
        "
        );
    }

    #[test]
    fn test_diagnostics_ext() {
        let diags = vec![
            Diagnostic::warning("w"),
            located_error(),
            Diagnostic::error("second"),
        ];
        assert!(diags.has_error());
        assert_eq!(diags.first_error().unwrap().summary, "job foo is not defined");
        assert_eq!(diags.filter_severity(Severity::Warning).len(), 1);

        let warnings_only = vec![Diagnostic::warning("w")];
        assert!(!warnings_only.has_error());
        assert!(warnings_only.first_error().is_none());
    }

    #[test]
    fn test_render_json_array() {
        let diags = vec![Diagnostic::warning("w")];
        assert_eq!(
            render_json(&diags),
            json!([{"severity": "warning", "summary": "w", "locations": [], "paths": []}])
        );
    }
}

//! `databricks bundle validate`.
//!
//! Runs the full configuration pipeline and prints the diagnostics. Fatal
//! errors are reported like any other error diagnostic; the exit code is 1
//! whenever an error was found.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use tracing::debug;

use bundle_config::{Bundle, BundleOptions, Environment, FailMode, phases};
use bundle_diag::{Diagnostic, DiagnosticsExt, Severity, render_json, render_text};

use crate::OutputFormat;

/// Arguments for the validate command
#[derive(Debug)]
pub struct ValidateArgs {
    pub target: Option<String>,
    /// Raw `NAME=VALUE` assignments
    pub variables: Vec<String>,
    pub output: OutputFormat,
    pub fail_fast: bool,
    /// Bundle root; the current directory if unset
    pub directory: Option<PathBuf>,
}

/// Execute the validate command
pub fn execute(args: ValidateArgs) -> Result<ExitCode> {
    let root = match args.directory {
        Some(dir) => dir,
        None => std::env::current_dir().context("Failed to determine the current directory")?,
    };
    let root = root
        .canonicalize()
        .with_context(|| format!("Failed to resolve bundle root {}", root.display()))?;
    debug!(root = %root.display(), "validating bundle");

    let mut options = BundleOptions::new(root);
    options.target = args.target;
    options.variables = args.variables;
    if args.fail_fast {
        options = options.with_fail_mode(FailMode::FailFast);
    }

    let mut bundle = Bundle::new(options, Environment::from_process());
    let outcome = phases::load_and_validate(&mut bundle);

    let mut diagnostics = bundle.diagnostics.clone();
    if let Err(err) = &outcome {
        diagnostics.push(err.to_diagnostic());
    }

    match args.output {
        OutputFormat::Text => {
            let rendered = render_text(&diagnostics);
            if !rendered.is_empty() {
                println!("{rendered}");
            }
            if outcome.is_ok() {
                println!("{}", bundle_summary(&bundle));
            }
            println!("{}", summary_line(&diagnostics));
        }
        OutputFormat::Json => {
            let mut json = serde_json::json!({ "diagnostics": render_json(&diagnostics) });
            if outcome.is_ok() {
                json["config"] = bundle.config.to_json();
            }
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
    }

    Ok(if diagnostics.has_error() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

/// Name, target and workspace of a loaded bundle.
fn bundle_summary(bundle: &Bundle) -> String {
    let field = |path: &str| {
        bundle
            .get(path)
            .and_then(|v| v.scalar_to_string())
            .unwrap_or_default()
    };
    let mut out = format!("Name: {}\nTarget: {}\n", field("bundle.name"), field("bundle.target"));
    let host = field("workspace.host");
    if !host.is_empty() {
        out.push_str(&format!("Workspace:\n  Host: {host}\n"));
    }
    out
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{n} {word}")
    } else {
        format!("{n} {word}s")
    }
}

/// "Validation OK!" or the error and warning counts.
fn summary_line(diagnostics: &[Diagnostic]) -> String {
    let count = |severity: Severity| diagnostics.iter().filter(|d| d.severity == severity).count();
    let errors = count(Severity::Error);
    let warnings = count(Severity::Warning);

    match (errors, warnings) {
        (0, 0) => "Validation OK!".to_string(),
        (0, w) => format!("Found {}", plural(w, "warning")),
        (e, 0) => format!("Found {}", plural(e, "error")),
        (e, w) => format!("Found {} and {}", plural(e, "error"), plural(w, "warning")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_summary_line() {
        assert_eq!(summary_line(&[]), "Validation OK!");
        assert_eq!(
            summary_line(&[Diagnostic::error("a"), Diagnostic::warning("b"), Diagnostic::warning("c")]),
            "Found 1 error and 2 warnings"
        );
        assert_eq!(summary_line(&[Diagnostic::warning("b")]), "Found 1 warning");
    }

    #[test]
    fn test_bundle_summary() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("databricks.yml"),
            "bundle:\n  name: demo\nworkspace:\n  host: https://example.com\n",
        )
        .unwrap();
        let mut bundle = Bundle::new(BundleOptions::new(dir.path()), Environment::default());
        phases::load_and_validate(&mut bundle).unwrap();

        assert_eq!(
            bundle_summary(&bundle),
            "Name: demo\nTarget: default\nWorkspace:\n  Host: https://example.com\n"
        );
    }

    #[test]
    fn test_execute_reports_failure() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("databricks.yml"), "include:\n  - missing.yml\n").unwrap();

        let code = execute(ValidateArgs {
            target: None,
            variables: Vec::new(),
            output: OutputFormat::Json,
            fail_fast: false,
            directory: Some(dir.path().to_path_buf()),
        })
        .unwrap();
        assert_eq!(format!("{code:?}"), format!("{:?}", ExitCode::FAILURE));
    }
}

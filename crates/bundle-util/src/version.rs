//! Version reported by `databricks --version`.
//!
//! Release builds are compiled with `DATABRICKS_CLI_VERSION` set to the
//! release tag. Every other build reports [`DEV_VERSION`].

/// Version reported by builds without a release tag.
pub const DEV_VERSION: &str = "0.0.0-dev";

/// The version string the CLI reports.
pub fn cli_version() -> &'static str {
    from_release_tag(option_env!("DATABRICKS_CLI_VERSION"))
}

/// `v0.218.0` and `0.218.0` both report `0.218.0`; a missing or blank tag
/// reports the dev version.
fn from_release_tag(tag: Option<&'static str>) -> &'static str {
    match tag.map(str::trim) {
        Some(tag) if !tag.is_empty() => tag.strip_prefix('v').unwrap_or(tag),
        _ => DEV_VERSION,
    }
}

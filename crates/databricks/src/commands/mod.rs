//! Command implementations for the Databricks CLI
//!
//! Each command module handles the CLI interface and delegates to
//! bundle-config for the actual work.

pub mod validate;

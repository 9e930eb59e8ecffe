//! Shared utilities for the bundle tooling.

pub mod env_matrix;
pub mod version;

pub use env_matrix::expand_env_matrix;
pub use version::{DEV_VERSION, cli_version};

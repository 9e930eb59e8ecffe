//! Dynamic document model for bundle configuration.
//!
//! Every configuration file is loaded into a [`Value`]: an order-preserving
//! tree of mappings, sequences and scalars where each node remembers the
//! source [`Location`]s it came from. The rest of the configuration pipeline
//! (include assembly, target overrides, variable interpolation, validation)
//! operates on this tree, and only decodes typed records once the tree is final.
//!
//! # Key Features
//!
//! - **Source location preservation**: every node carries its [`Location`]s
//!   through merges, so diagnostics can point at the exact file and line
//! - **Explicit merge semantics**: [`merge`] is a pure, recursive function
//!   with "override wins" rules and a real `null` override
//! - **Keyed sequences**: a [`MergePolicy`] can declare that certain sequences
//!   merge element-wise by a natural key instead of being replaced
//! - **Paths**: [`Path`] addresses any node and round-trips through its
//!   `a.b[0].c` string form
//!
//! # Example
//!
//! ```rust
//! use bundle_dyn::{Value, merge};
//!
//! let base = Value::from_pairs([("a", Value::from(1))]);
//! let over = Value::from_pairs([("b", Value::from(2))]);
//!
//! let merged = merge(&base, &over);
//! assert_eq!(merged, Value::from_pairs([("a", Value::from(1)), ("b", Value::from(2))]));
//! ```

mod error;
mod json;
mod location;
mod merge;
mod path;
mod value;
mod visit;

pub use error::{DynError, Result};
pub use location::Location;
pub use merge::{
    MergePolicy, ReplaceSequences, SequenceKey, merge, merge_keyed_sequence, merge_optional,
    merge_with,
};
pub use path::{Path, PathComponent};
pub use value::{Mapping, Value, ValueKind};

//! Source location information for document nodes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Source location of a document node.
///
/// Lines and columns are 1-based. Locations order by file, then line, then
/// column, which is the order diagnostics list them in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Location {
    /// Path of the file the node was parsed from
    pub file: String,

    /// Line number (1-based)
    pub line: usize,

    /// Column number (1-based, in characters)
    pub column: usize,
}

impl Location {
    /// Create a new location.
    pub fn new(file: impl Into<String>, line: usize, column: usize) -> Self {
        Self {
            file: file.into(),
            line,
            column,
        }
    }

    /// Location pointing at the first character of a file.
    pub fn start_of(file: impl Into<String>) -> Self {
        Self::new(file, 1, 1)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let loc = Location::new("databricks.yml", 3, 5);
        assert_eq!(loc.to_string(), "databricks.yml:3:5");
    }

    #[test]
    fn test_ordering() {
        let a = Location::new("a.yml", 10, 1);
        let b = Location::new("b.yml", 1, 1);
        let a2 = Location::new("a.yml", 10, 7);

        assert!(a < b);
        assert!(a < a2);
        assert!(a2 < b);
    }

    #[test]
    fn test_serialization_shape() {
        let loc = Location::new("x.yml", 2, 4);
        let json = serde_json::to_value(&loc).unwrap();
        assert_eq!(json, serde_json::json!({"file": "x.yml", "line": 2, "column": 4}));
    }
}

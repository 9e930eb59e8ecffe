//! Paths addressing nodes in a document.
//!
//! A [`Path`] is an ordered list of mapping keys and sequence indices. Its
//! string form joins keys with `.` and renders indices as `[n]`, for example
//! `resources.jobs.foo.tasks[0]`.

use crate::error::{DynError, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// One step of a [`Path`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PathComponent {
    /// Mapping key
    Key(String),
    /// Sequence index
    Index(usize),
}

impl PathComponent {
    /// The key, if this component is a mapping key.
    pub fn as_key(&self) -> Option<&str> {
        match self {
            PathComponent::Key(k) => Some(k),
            PathComponent::Index(_) => None,
        }
    }

    /// The index, if this component is a sequence index.
    pub fn as_index(&self) -> Option<usize> {
        match self {
            PathComponent::Key(_) => None,
            PathComponent::Index(i) => Some(*i),
        }
    }
}

/// Address of a node inside a document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Path(Vec<PathComponent>);

impl Path {
    /// The empty path, addressing the document root.
    pub fn root() -> Self {
        Path(Vec::new())
    }

    /// Build a path from a list of mapping keys.
    pub fn from_keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Path(keys.into_iter().map(|k| PathComponent::Key(k.into())).collect())
    }

    /// Return a new path with a key appended.
    pub fn key(&self, key: impl Into<String>) -> Self {
        let mut out = self.clone();
        out.0.push(PathComponent::Key(key.into()));
        out
    }

    /// Return a new path with an index appended.
    pub fn index(&self, index: usize) -> Self {
        let mut out = self.clone();
        out.0.push(PathComponent::Index(index));
        out
    }

    /// Return a new path with all components of `other` appended.
    pub fn join(&self, other: &Path) -> Self {
        let mut out = self.clone();
        out.0.extend(other.0.iter().cloned());
        out
    }

    /// Append a component in place.
    pub fn push(&mut self, component: PathComponent) {
        self.0.push(component);
    }

    /// Remove the last component in place.
    pub fn pop(&mut self) -> Option<PathComponent> {
        self.0.pop()
    }

    /// The path components.
    pub fn components(&self) -> &[PathComponent] {
        &self.0
    }

    /// Number of components.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether this is the root path.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Component at `index`, if any.
    pub fn get(&self, index: usize) -> Option<&PathComponent> {
        self.0.get(index)
    }

    /// Whether `prefix` is a prefix of this path (a path is a prefix of itself).
    pub fn has_prefix(&self, prefix: &Path) -> bool {
        self.0.len() >= prefix.0.len() && self.0[..prefix.0.len()] == prefix.0[..]
    }

    /// The sub-path after the first `n` components.
    pub fn skip(&self, n: usize) -> Path {
        Path(self.0.iter().skip(n).cloned().collect())
    }
}

impl From<Vec<PathComponent>> for Path {
    fn from(components: Vec<PathComponent>) -> Self {
        Path(components)
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, component) in self.0.iter().enumerate() {
            match component {
                PathComponent::Key(k) => {
                    if i > 0 {
                        f.write_str(".")?;
                    }
                    f.write_str(k)?;
                }
                PathComponent::Index(idx) => write!(f, "[{}]", idx)?,
            }
        }
        Ok(())
    }
}

impl FromStr for Path {
    type Err = DynError;

    fn from_str(input: &str) -> Result<Self> {
        let invalid = |message: &str| DynError::InvalidPath {
            input: input.to_string(),
            message: message.to_string(),
        };

        let mut components = Vec::new();
        let mut chars = input.chars().peekable();
        let mut key = String::new();
        // Whether the next character may start a key (start of input or after '.').
        let mut expect_key = true;

        while let Some(c) = chars.next() {
            match c {
                '.' => {
                    if key.is_empty() {
                        return Err(invalid("empty key"));
                    }
                    components.push(PathComponent::Key(std::mem::take(&mut key)));
                    expect_key = true;
                }
                '[' => {
                    if !key.is_empty() {
                        components.push(PathComponent::Key(std::mem::take(&mut key)));
                    } else if expect_key && !components.is_empty() {
                        return Err(invalid("index must follow a key or another index"));
                    }
                    let mut digits = String::new();
                    loop {
                        match chars.next() {
                            Some(']') => break,
                            Some(d) if d.is_ascii_digit() => digits.push(d),
                            Some(_) => return Err(invalid("index must be a non-negative integer")),
                            None => return Err(invalid("unterminated index")),
                        }
                    }
                    let idx = digits
                        .parse::<usize>()
                        .map_err(|_| invalid("index must be a non-negative integer"))?;
                    components.push(PathComponent::Index(idx));
                    expect_key = false;
                    match chars.peek() {
                        None | Some('.') | Some('[') => {}
                        Some(_) => return Err(invalid("unexpected character after index")),
                    }
                    if chars.peek() == Some(&'.') {
                        chars.next();
                        expect_key = true;
                        if chars.peek().is_none() {
                            return Err(invalid("trailing '.'"));
                        }
                    }
                }
                ']' => return Err(invalid("unexpected ']'")),
                other => {
                    key.push(other);
                    expect_key = false;
                }
            }
        }

        if !key.is_empty() {
            components.push(PathComponent::Key(key));
        } else if expect_key && !components.is_empty() {
            return Err(invalid("trailing '.'"));
        }

        Ok(Path(components))
    }
}

impl Serialize for Path {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Path {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let path = Path::from_keys(["resources", "jobs", "foo", "tasks"]).index(0);
        insta::assert_snapshot!(path.to_string(), @"resources.jobs.foo.tasks[0]");
    }

    #[test]
    fn test_parse_round_trip() {
        for input in [
            "bundle.name",
            "resources.jobs.foo.tasks[0].task_key",
            "sync.include[12]",
            "a[0][1].b",
            "variables.my-var.value",
        ] {
            let path: Path = input.parse().unwrap();
            assert_eq!(path.to_string(), input);
        }
    }

    #[test]
    fn test_parse_components() {
        let path: Path = "a[1].b".parse().unwrap();
        assert_eq!(
            path.components(),
            &[
                PathComponent::Key("a".into()),
                PathComponent::Index(1),
                PathComponent::Key("b".into()),
            ]
        );
    }

    #[test]
    fn test_parse_empty_is_root() {
        let path: Path = "".parse().unwrap();
        assert!(path.is_empty());
    }

    #[test]
    fn test_parse_errors() {
        for input in ["a..b", "a.", ".a", "a[x]", "a[1", "a]", "a[1]b"] {
            assert!(input.parse::<Path>().is_err(), "expected error for {input:?}");
        }
    }

    #[test]
    fn test_has_prefix() {
        let path: Path = "resources.jobs.foo".parse().unwrap();
        assert!(path.has_prefix(&Path::from_keys(["resources"])));
        assert!(path.has_prefix(&path));
        assert!(!path.has_prefix(&Path::from_keys(["bundle"])));
        assert!(!Path::from_keys(["resources"]).has_prefix(&path));
    }

    #[test]
    fn test_serialize_as_string() {
        let path: Path = "sync.exclude[0]".parse().unwrap();
        assert_eq!(
            serde_json::to_value(&path).unwrap(),
            serde_json::json!("sync.exclude[0]")
        );
    }
}

//! Path-based access and tree traversal.

use crate::error::{DynError, Result};
use crate::path::{Path, PathComponent};
use crate::value::{Mapping, Value, ValueKind};

impl Value {
    /// Get the node at `path`, if it exists.
    pub fn get_by_path(&self, path: &Path) -> Option<&Value> {
        let mut current = self;
        for component in path.components() {
            current = match (component, &current.kind) {
                (PathComponent::Key(k), ValueKind::Mapping(m)) => m.get(k)?,
                (PathComponent::Index(i), ValueKind::Sequence(items)) => items.get(*i)?,
                _ => return None,
            };
        }
        Some(current)
    }

    /// Mutable access to the node at `path`, if it exists.
    pub fn get_by_path_mut(&mut self, path: &Path) -> Option<&mut Value> {
        let mut current = self;
        for component in path.components() {
            current = match (component, &mut current.kind) {
                (PathComponent::Key(k), ValueKind::Mapping(m)) => m.get_mut(k)?,
                (PathComponent::Index(i), ValueKind::Sequence(items)) => items.get_mut(*i)?,
                _ => return None,
            };
        }
        Some(current)
    }

    /// Set the node at `path`, creating intermediate mappings for missing keys.
    ///
    /// A null intermediate is replaced by an empty mapping. Indices must
    /// address existing sequence elements.
    pub fn set_by_path(&mut self, path: &Path, value: Value) -> Result<()> {
        let Some((last, parents)) = path.components().split_last() else {
            return Err(DynError::EmptyPath);
        };

        let mut current = self;
        let mut walked = Path::root();
        for component in parents {
            current = step_or_create(current, component, &walked)?;
            walked.push(component.clone());
        }

        match last {
            PathComponent::Key(k) => {
                if current.is_null() {
                    current.kind = ValueKind::Mapping(Mapping::new());
                }
                let found = current.kind_name();
                match current.as_mapping_mut() {
                    Some(m) => {
                        m.insert(k.clone(), value);
                        Ok(())
                    }
                    None => Err(DynError::KindMismatch {
                        path: walked.to_string(),
                        expected: "mapping",
                        found,
                    }),
                }
            }
            PathComponent::Index(i) => {
                let found = current.kind_name();
                match current.as_sequence_mut() {
                    Some(items) if *i < items.len() => {
                        items[*i] = value;
                        Ok(())
                    }
                    Some(items) => Err(DynError::IndexOutOfBounds {
                        path: walked.to_string(),
                        index: *i,
                        len: items.len(),
                    }),
                    None => Err(DynError::KindMismatch {
                        path: walked.to_string(),
                        expected: "sequence",
                        found,
                    }),
                }
            }
        }
    }

    /// Remove the node at `path`. Returns the removed node, if any.
    pub fn remove_by_path(&mut self, path: &Path) -> Option<Value> {
        let (last, parents) = path.components().split_last()?;
        let parent = self.get_by_path_mut(&Path::from(parents.to_vec()))?;
        match (last, &mut parent.kind) {
            (PathComponent::Key(k), ValueKind::Mapping(m)) => m.shift_remove(k),
            (PathComponent::Index(i), ValueKind::Sequence(items)) if *i < items.len() => {
                Some(items.remove(*i))
            }
            _ => None,
        }
    }

    /// Visit every node in pre-order together with its path.
    pub fn walk<F>(&self, f: &mut F)
    where
        F: FnMut(&Path, &Value),
    {
        let mut path = Path::root();
        walk_impl(self, &mut path, f);
    }

    /// Visit every string scalar mutably, in pre-order.
    ///
    /// The callback returns `Ok(Some(v))` to replace the string node with `v`
    /// or `Ok(None)` to leave it untouched. The first error aborts the walk.
    pub fn rewrite_strings<F, E>(&mut self, f: &mut F) -> std::result::Result<(), E>
    where
        F: FnMut(&Path, &Value) -> std::result::Result<Option<Value>, E>,
    {
        let mut path = Path::root();
        rewrite_impl(self, &mut path, f)
    }
}

fn step_or_create<'a>(
    current: &'a mut Value,
    component: &PathComponent,
    walked: &Path,
) -> Result<&'a mut Value> {
    if current.is_null() && matches!(component, PathComponent::Key(_)) {
        current.kind = ValueKind::Mapping(Mapping::new());
    }
    let found = current.kind_name();
    match (component, &mut current.kind) {
        (PathComponent::Key(k), ValueKind::Mapping(m)) => {
            Ok(m.entry(k.clone()).or_insert_with(Value::empty_mapping))
        }
        (PathComponent::Index(i), ValueKind::Sequence(items)) => {
            let len = items.len();
            items.get_mut(*i).ok_or_else(|| DynError::IndexOutOfBounds {
                path: walked.to_string(),
                index: *i,
                len,
            })
        }
        (PathComponent::Key(_), _) => Err(DynError::KindMismatch {
            path: walked.to_string(),
            expected: "mapping",
            found,
        }),
        (PathComponent::Index(_), _) => Err(DynError::KindMismatch {
            path: walked.to_string(),
            expected: "sequence",
            found,
        }),
    }
}

fn walk_impl<F>(value: &Value, path: &mut Path, f: &mut F)
where
    F: FnMut(&Path, &Value),
{
    f(path, value);
    match &value.kind {
        ValueKind::Mapping(m) => {
            for (k, v) in m {
                path.push(PathComponent::Key(k.clone()));
                walk_impl(v, path, f);
                path.pop();
            }
        }
        ValueKind::Sequence(items) => {
            for (i, v) in items.iter().enumerate() {
                path.push(PathComponent::Index(i));
                walk_impl(v, path, f);
                path.pop();
            }
        }
        _ => {}
    }
}

fn rewrite_impl<F, E>(value: &mut Value, path: &mut Path, f: &mut F) -> std::result::Result<(), E>
where
    F: FnMut(&Path, &Value) -> std::result::Result<Option<Value>, E>,
{
    if matches!(value.kind, ValueKind::String(_)) {
        if let Some(replacement) = f(path, value)? {
            *value = replacement;
        }
        return Ok(());
    }

    match &mut value.kind {
        ValueKind::Mapping(m) => {
            for (k, v) in m.iter_mut() {
                path.push(PathComponent::Key(k.clone()));
                rewrite_impl(v, path, f)?;
                path.pop();
            }
        }
        ValueKind::Sequence(items) => {
            for (i, v) in items.iter_mut().enumerate() {
                path.push(PathComponent::Index(i));
                rewrite_impl(v, path, f)?;
                path.pop();
            }
        }
        _ => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Value {
        Value::from_pairs([
            (
                "resources",
                Value::from_pairs([(
                    "jobs",
                    Value::from_pairs([(
                        "foo",
                        Value::from_pairs([(
                            "tasks",
                            Value::sequence(vec![Value::from_pairs([(
                                "task_key",
                                Value::from("t1"),
                            )])]),
                        )]),
                    )]),
                )]),
            ),
            ("bundle", Value::from_pairs([("name", Value::from("demo"))])),
        ])
    }

    #[test]
    fn test_get_by_path() {
        let v = sample();
        let path: Path = "resources.jobs.foo.tasks[0].task_key".parse().unwrap();
        assert_eq!(v.get_by_path(&path).and_then(Value::as_str), Some("t1"));
        assert!(v.get_by_path(&"resources.jobs.bar".parse().unwrap()).is_none());
        assert!(v.get_by_path(&"bundle.name[0]".parse().unwrap()).is_none());
        assert_eq!(v.get_by_path(&Path::root()), Some(&v));
    }

    #[test]
    fn test_set_by_path_creates_mappings() {
        let mut v = Value::empty_mapping();
        v.set_by_path(&"variables.foo.value".parse().unwrap(), Value::from("x"))
            .unwrap();
        assert_eq!(
            v.get_by_path(&"variables.foo.value".parse().unwrap())
                .and_then(Value::as_str),
            Some("x")
        );
    }

    #[test]
    fn test_set_by_path_replaces_null_intermediate() {
        let mut v = Value::from_pairs([("bundle", Value::null())]);
        v.set_by_path(&"bundle.target".parse().unwrap(), Value::from("dev"))
            .unwrap();
        assert_eq!(v.get("bundle").and_then(|b| b.get("target")), Some(&Value::from("dev")));
    }

    #[test]
    fn test_set_by_path_kind_mismatch() {
        let mut v = sample();
        let err = v
            .set_by_path(&"bundle.name.x".parse().unwrap(), Value::from(1))
            .unwrap_err();
        assert!(matches!(err, DynError::KindMismatch { .. }));
    }

    #[test]
    fn test_set_by_path_index() {
        let mut v = sample();
        let path: Path = "resources.jobs.foo.tasks[0]".parse().unwrap();
        v.set_by_path(&path, Value::from("replaced")).unwrap();
        assert_eq!(v.get_by_path(&path), Some(&Value::from("replaced")));

        let out_of_bounds: Path = "resources.jobs.foo.tasks[3]".parse().unwrap();
        assert!(matches!(
            v.set_by_path(&out_of_bounds, Value::null()),
            Err(DynError::IndexOutOfBounds { index: 3, len: 1, .. })
        ));
    }

    #[test]
    fn test_remove_by_path() {
        let mut v = sample();
        let removed = v.remove_by_path(&"bundle.name".parse().unwrap());
        assert_eq!(removed, Some(Value::from("demo")));
        assert!(v.get_by_path(&"bundle.name".parse().unwrap()).is_none());
    }

    #[test]
    fn test_walk_visits_in_preorder() {
        let v = sample();
        let mut paths = Vec::new();
        v.walk(&mut |p, _| paths.push(p.to_string()));
        assert_eq!(
            paths,
            [
                "",
                "resources",
                "resources.jobs",
                "resources.jobs.foo",
                "resources.jobs.foo.tasks",
                "resources.jobs.foo.tasks[0]",
                "resources.jobs.foo.tasks[0].task_key",
                "bundle",
                "bundle.name",
            ]
        );
    }

    #[test]
    fn test_rewrite_strings() {
        let mut v = sample();
        v.rewrite_strings::<_, ()>(&mut |_, s| {
            Ok(s.as_str().map(|s| Value::from(s.to_uppercase())))
        })
        .unwrap();
        assert_eq!(
            v.get_by_path(&"bundle.name".parse().unwrap()),
            Some(&Value::from("DEMO"))
        );
    }
}

//! Structural merge of document values.
//!
//! # Rules
//!
//! - Mapping × Mapping: union of keys. Shared keys merge recursively; the
//!   result keeps the base's key order with override-only keys appended.
//! - Sequence × Sequence: the override replaces the base, unless the active
//!   [`MergePolicy`] declares the sequence as keyed, in which case elements
//!   are matched by natural key (see [`merge_keyed_sequence`]).
//! - Anything else: the override wins, including an explicit `null`.
//!
//! Merging never mutates its inputs; the result is a fresh tree.

use crate::path::Path;
use crate::value::{Mapping, Value, ValueKind};
use indexmap::IndexMap;

/// Natural-key extraction for a keyed sequence.
pub trait SequenceKey {
    /// The element's natural key, or `None` if the element has none.
    fn key_of(&self, element: &Value) -> Option<String>;
}

/// Decides which sequences merge by natural key.
pub trait MergePolicy {
    /// The natural key for sequences at `path`, if they merge element-wise.
    fn sequence_key(&self, path: &Path) -> Option<&dyn SequenceKey>;
}

/// The default policy: every sequence is replaced wholesale.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReplaceSequences;

impl MergePolicy for ReplaceSequences {
    fn sequence_key(&self, _path: &Path) -> Option<&dyn SequenceKey> {
        None
    }
}

/// Merge `over` on top of `base` with the default policy.
pub fn merge(base: &Value, over: &Value) -> Value {
    merge_with(base, over, &ReplaceSequences)
}

/// Merge where either side may be absent.
///
/// An absent side yields the other side unchanged (value and locations).
pub fn merge_optional(
    base: Option<&Value>,
    over: Option<&Value>,
    policy: &dyn MergePolicy,
) -> Option<Value> {
    match (base, over) {
        (None, None) => None,
        (Some(b), None) => Some(b.clone()),
        (None, Some(o)) => Some(o.clone()),
        (Some(b), Some(o)) => Some(merge_with(b, o, policy)),
    }
}

/// Merge `over` on top of `base`, consulting `policy` for keyed sequences.
pub fn merge_with(base: &Value, over: &Value, policy: &dyn MergePolicy) -> Value {
    let mut path = Path::root();
    merge_at(base, over, policy, &mut path)
}

fn merge_at(base: &Value, over: &Value, policy: &dyn MergePolicy, path: &mut Path) -> Value {
    match (&base.kind, &over.kind) {
        (ValueKind::Mapping(b), ValueKind::Mapping(o)) => {
            let merged = merge_mappings(b, o, policy, path);
            let mut out = Value::new(ValueKind::Mapping(merged)).with_locations(base.locations.clone());
            out.append_locations(&over.locations);
            out
        }
        (ValueKind::Sequence(b), ValueKind::Sequence(o)) => match policy.sequence_key(path) {
            Some(key) => {
                let merged = keyed_merge(b.iter().chain(o.iter()), key, policy, path);
                let mut out = Value::sequence(merged).with_locations(base.locations.clone());
                out.append_locations(&over.locations);
                out
            }
            None => replaced(base, over),
        },
        _ => replaced(base, over),
    }
}

/// The override value, remembering where the replaced value came from.
fn replaced(base: &Value, over: &Value) -> Value {
    let mut out = over.clone();
    out.append_locations(&base.locations);
    out
}

fn merge_mappings(
    base: &Mapping,
    over: &Mapping,
    policy: &dyn MergePolicy,
    path: &mut Path,
) -> Mapping {
    let mut out: Mapping = IndexMap::with_capacity(base.len() + over.len());

    for (key, base_value) in base {
        let merged = match over.get(key) {
            Some(over_value) => {
                path.push(crate::PathComponent::Key(key.clone()));
                let merged = merge_at(base_value, over_value, policy, path);
                path.pop();
                merged
            }
            None => base_value.clone(),
        };
        out.insert(key.clone(), merged);
    }

    for (key, over_value) in over {
        if !base.contains_key(key) {
            out.insert(key.clone(), over_value.clone());
        }
    }

    out
}

/// Merge elements sharing a natural key, in order of first appearance.
///
/// Elements without a key are kept as they are. Matched elements are merged
/// with later occurrences taking precedence.
fn keyed_merge<'a>(
    items: impl Iterator<Item = &'a Value>,
    key: &dyn SequenceKey,
    policy: &dyn MergePolicy,
    path: &mut Path,
) -> Vec<Value> {
    let mut out: Vec<Value> = Vec::new();
    let mut by_key: IndexMap<String, usize> = IndexMap::new();

    for item in items {
        match key.key_of(item) {
            Some(k) => match by_key.get(&k) {
                Some(&slot) => {
                    path.push(crate::PathComponent::Index(slot));
                    let merged = merge_at(&out[slot], item, policy, path);
                    path.pop();
                    out[slot] = merged;
                }
                None => {
                    by_key.insert(k, out.len());
                    out.push(item.clone());
                }
            },
            None => out.push(item.clone()),
        }
    }

    out
}

/// Collapse elements of a single sequence that share a natural key.
///
/// Returns `seq` unchanged (cloned) if it is not a sequence.
pub fn merge_keyed_sequence(seq: &Value, key: &dyn SequenceKey) -> Value {
    match seq.as_sequence() {
        Some(items) => {
            let mut path = Path::root();
            let merged = keyed_merge(items.iter(), key, &ReplaceSequences, &mut path);
            Value::sequence(merged).with_locations(seq.locations.clone())
        }
        None => seq.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::Location;

    fn loc(file: &str, line: usize) -> Location {
        Location::new(file, line, 1)
    }

    fn map(pairs: Vec<(&str, Value)>) -> Value {
        Value::from_pairs(pairs)
    }

    struct ByName;

    impl SequenceKey for ByName {
        fn key_of(&self, element: &Value) -> Option<String> {
            element.get("name").and_then(Value::as_str).map(str::to_string)
        }
    }

    struct ItemsByName;

    impl MergePolicy for ItemsByName {
        fn sequence_key(&self, path: &Path) -> Option<&dyn SequenceKey> {
            if *path == Path::from_keys(["items"]) {
                Some(&ByName)
            } else {
                None
            }
        }
    }

    #[test]
    fn test_non_overlapping_keys() {
        let a = map(vec![("a", Value::from(1))]);
        let b = map(vec![("b", Value::from(2))]);
        let merged = merge(&a, &b);
        assert_eq!(merged, map(vec![("a", Value::from(1)), ("b", Value::from(2))]));
    }

    #[test]
    fn test_associative_for_disjoint_keys() {
        let a = map(vec![("a", Value::from(1))]);
        let b = map(vec![("b", Value::from(2))]);
        let c = map(vec![("c", Value::from(3))]);
        assert_eq!(merge(&merge(&a, &b), &c), merge(&a, &merge(&b, &c)));
    }

    #[test]
    fn test_override_wins_on_scalar() {
        let base = map(vec![("x", Value::from("base"))]);
        let over = map(vec![("x", Value::from("override"))]);
        assert_eq!(merge(&base, &over), map(vec![("x", Value::from("override"))]));
    }

    #[test]
    fn test_null_is_a_real_override() {
        let base = map(vec![("x", Value::from("base"))]);
        let over = map(vec![("x", Value::null())]);
        let merged = merge(&base, &over);
        assert_eq!(merged, map(vec![("x", Value::null())]));
        assert!(merged.get("x").unwrap().is_null());
    }

    #[test]
    fn test_sequence_replaces() {
        let base = map(vec![("l", Value::sequence(vec![Value::from(1), Value::from(2)]))]);
        let over = map(vec![("l", Value::sequence(vec![Value::from(3)]))]);
        assert_eq!(
            merge(&base, &over),
            map(vec![("l", Value::sequence(vec![Value::from(3)]))])
        );
    }

    #[test]
    fn test_key_order_base_first_then_override() {
        let base = map(vec![("b", Value::from(1)), ("a", Value::from(1))]);
        let over = map(vec![("z", Value::from(2)), ("a", Value::from(2)), ("c", Value::from(2))]);
        let merged = merge(&base, &over);
        let keys: Vec<&str> = merged.as_mapping().unwrap().keys().map(String::as_str).collect();
        assert_eq!(keys, ["b", "a", "z", "c"]);
    }

    #[test]
    fn test_inputs_are_not_mutated() {
        let base = map(vec![("x", map(vec![("y", Value::from(1))]))]);
        let over = map(vec![("x", map(vec![("z", Value::from(2))]))]);
        let base_before = base.clone();
        let over_before = over.clone();
        let _ = merge(&base, &over);
        assert_eq!(base, base_before);
        assert_eq!(over, over_before);
    }

    #[test]
    fn test_locations_carried_through() {
        let base = map(vec![("only_base", Value::from(1).with_location(loc("a.yml", 2)))])
            .with_location(loc("a.yml", 1));
        let over = map(vec![("only_over", Value::from(2).with_location(loc("b.yml", 5)))])
            .with_location(loc("b.yml", 4));

        let merged = merge(&base, &over);
        assert_eq!(merged.locations, vec![loc("a.yml", 1), loc("b.yml", 4)]);
        assert_eq!(merged.get("only_base").unwrap().locations, vec![loc("a.yml", 2)]);
        assert_eq!(merged.get("only_over").unwrap().locations, vec![loc("b.yml", 5)]);
    }

    #[test]
    fn test_replaced_scalar_keeps_override_location_first() {
        let base = map(vec![("x", Value::from("a").with_location(loc("a.yml", 3)))]);
        let over = map(vec![("x", Value::from("b").with_location(loc("b.yml", 7)))]);
        let merged = merge(&base, &over);
        let x = merged.get("x").unwrap();
        assert_eq!(x.location(), Some(&loc("b.yml", 7)));
        assert_eq!(x.locations.len(), 2);
    }

    #[test]
    fn test_merge_optional() {
        let v = Value::from(1).with_location(loc("a.yml", 1));
        let out = merge_optional(None, Some(&v), &ReplaceSequences).unwrap();
        assert_eq!(out, v);
        assert_eq!(out.locations, v.locations);
        assert!(merge_optional(None, None, &ReplaceSequences).is_none());
    }

    #[test]
    fn test_keyed_sequence_merge_by_policy() {
        let base = map(vec![(
            "items",
            Value::sequence(vec![
                map(vec![("name", Value::from("a")), ("v", Value::from(1))]),
                map(vec![("name", Value::from("b")), ("v", Value::from(1))]),
            ]),
        )]);
        let over = map(vec![(
            "items",
            Value::sequence(vec![
                map(vec![("name", Value::from("b")), ("v", Value::from(2))]),
                map(vec![("name", Value::from("c")), ("v", Value::from(3))]),
            ]),
        )]);

        let merged = merge_with(&base, &over, &ItemsByName);
        let expected = map(vec![(
            "items",
            Value::sequence(vec![
                map(vec![("name", Value::from("a")), ("v", Value::from(1))]),
                map(vec![("name", Value::from("b")), ("v", Value::from(2))]),
                map(vec![("name", Value::from("c")), ("v", Value::from(3))]),
            ]),
        )]);
        assert_eq!(merged, expected);
    }

    #[test]
    fn test_keyed_sequence_only_applies_at_policy_path() {
        let base = map(vec![("other", Value::sequence(vec![Value::from(1)]))]);
        let over = map(vec![("other", Value::sequence(vec![Value::from(2)]))]);
        let merged = merge_with(&base, &over, &ItemsByName);
        assert_eq!(merged, map(vec![("other", Value::sequence(vec![Value::from(2)]))]));
    }

    #[test]
    fn test_merge_keyed_sequence_collapses_duplicates() {
        let seq = Value::sequence(vec![
            map(vec![("name", Value::from("a")), ("x", Value::from(1))]),
            map(vec![("v", Value::from("no key"))]),
            map(vec![("name", Value::from("a")), ("y", Value::from(2))]),
        ]);
        let merged = merge_keyed_sequence(&seq, &ByName);
        let expected = Value::sequence(vec![
            map(vec![
                ("name", Value::from("a")),
                ("x", Value::from(1)),
                ("y", Value::from(2)),
            ]),
            map(vec![("v", Value::from("no key"))]),
        ]);
        assert_eq!(merged, expected);
    }
}

//! YAML parser that builds located `Value` trees.

use crate::error::{Result, YamlError};
use crate::scalar::resolve_plain;
use bundle_diag::Diagnostic;
use bundle_dyn::{Location, Mapping, Value, ValueKind};
use std::collections::HashMap;
use yaml_rust2::parser::{Event, MarkedEventReceiver, Parser, Tag};
use yaml_rust2::scanner::{Marker, TScalarStyle};

/// Parse YAML text into a located value.
///
/// `file` is recorded in every node's location. Only the first document of a
/// stream is loaded; later documents produce a warning. An empty document
/// loads as an empty mapping located at the start of the file.
///
/// # Example
///
/// ```rust
/// use bundle_yaml::parse;
///
/// let (value, _) = parse("a: &x [1, 2]\nb: *x\n", "f.yml").unwrap();
/// assert_eq!(value.get("a"), value.get("b"));
/// ```
///
/// # Errors
///
/// Returns an error for YAML syntax errors, duplicate keys, non-scalar keys
/// and malformed merge keys.
pub fn parse(content: &str, file: &str) -> Result<(Value, Vec<Diagnostic>)> {
    let mut parser = Parser::new_from_str(content);
    let mut builder = ValueBuilder::new(file);

    parser
        .load(&mut builder, true)
        .map_err(|err| YamlError::Syntax {
            message: err.info().to_string(),
            location: builder.location(err.marker()),
        })?;

    builder.finish()
}

/// A mapping key as seen in the source.
struct Key {
    name: String,
    location: Location,
    /// A plain `<<` key
    is_merge: bool,
}

/// A container being constructed.
enum Frame {
    Sequence {
        location: Location,
        anchor: usize,
        items: Vec<Value>,
    },
    Mapping {
        location: Location,
        anchor: usize,
        entries: Vec<(Key, Value)>,
        pending: Option<Key>,
    },
}

struct ValueBuilder {
    file: String,
    stack: Vec<Frame>,
    anchors: HashMap<usize, Value>,
    root: Option<Value>,
    documents: usize,
    warnings: Vec<Diagnostic>,
    /// First structural error; the scanner keeps feeding events after it
    error: Option<YamlError>,
}

impl ValueBuilder {
    fn new(file: &str) -> Self {
        Self {
            file: file.to_string(),
            stack: Vec::new(),
            anchors: HashMap::new(),
            root: None,
            documents: 0,
            warnings: Vec::new(),
            error: None,
        }
    }

    fn location(&self, marker: &Marker) -> Location {
        Location::new(self.file.clone(), marker.line(), marker.col() + 1)
    }

    fn fail(&mut self, error: YamlError) {
        if self.error.is_none() {
            self.error = Some(error);
        }
    }

    fn finish(self) -> Result<(Value, Vec<Diagnostic>)> {
        if let Some(error) = self.error {
            return Err(error);
        }
        let start = Location::start_of(self.file);
        let value = match self.root {
            Some(v) if v.is_null() => {
                let location = v.location().cloned().unwrap_or(start);
                Value::located(ValueKind::Mapping(Mapping::new()), location)
            }
            Some(v) => v,
            None => Value::located(ValueKind::Mapping(Mapping::new()), start),
        };
        Ok((value, self.warnings))
    }

    /// Whether the next completed node is a mapping key.
    fn expecting_key(&self) -> bool {
        matches!(self.stack.last(), Some(Frame::Mapping { pending: None, .. }))
    }

    fn remember(&mut self, anchor: usize, value: &Value) {
        if anchor > 0 {
            self.anchors.insert(anchor, value.clone());
        }
    }

    fn push_key(&mut self, key: Key) {
        if let Some(Frame::Mapping { pending, .. }) = self.stack.last_mut() {
            *pending = Some(key);
        }
    }

    /// Attach a completed node to its parent, or make it the document root.
    fn push_complete(&mut self, node: Value) {
        if self.expecting_key() {
            match key_from_value(&node) {
                Some(name) => {
                    let location = node
                        .location()
                        .cloned()
                        .unwrap_or_else(|| Location::start_of(self.file.clone()));
                    self.push_key(Key {
                        name,
                        location,
                        is_merge: false,
                    });
                }
                None => {
                    let location = node
                        .location()
                        .cloned()
                        .unwrap_or_else(|| Location::start_of(self.file.clone()));
                    self.fail(YamlError::NonScalarKey { location });
                    self.push_key(Key {
                        name: String::new(),
                        location: Location::start_of(self.file.clone()),
                        is_merge: false,
                    });
                }
            }
            return;
        }

        match self.stack.last_mut() {
            None => self.root = Some(node),
            Some(Frame::Sequence { items, .. }) => items.push(node),
            Some(Frame::Mapping {
                entries, pending, ..
            }) => {
                if let Some(key) = pending.take() {
                    entries.push((key, node));
                }
            }
        }
    }

    fn on_scalar(
        &mut self,
        text: String,
        style: TScalarStyle,
        anchor: usize,
        tag: Option<Tag>,
        marker: &Marker,
    ) {
        let location = self.location(marker);

        if self.expecting_key() {
            let is_merge = text == "<<" && matches!(style, TScalarStyle::Plain);
            let key_value = Value::located(ValueKind::String(text.clone()), location.clone());
            self.remember(anchor, &key_value);
            self.push_key(Key {
                name: text,
                location,
                is_merge,
            });
            return;
        }

        let forced_string = tag.as_ref().is_some_and(|t| t.suffix == "str");
        let kind = if matches!(style, TScalarStyle::Plain) && !forced_string {
            resolve_plain(&text)
        } else {
            ValueKind::String(text)
        };
        let node = Value::located(kind, location);
        self.remember(anchor, &node);
        self.push_complete(node);
    }

    fn end_mapping(&mut self) {
        let Some(Frame::Mapping {
            location,
            anchor,
            entries,
            ..
        }) = self.stack.pop()
        else {
            return;
        };

        let mut mapping = Mapping::new();
        let mut first_lines: HashMap<String, usize> = HashMap::new();
        let mut merge_sources = Vec::new();

        for (key, value) in entries {
            if key.is_merge {
                merge_sources.push((key.location, value));
                continue;
            }
            if let Some(first_line) = first_lines.get(&key.name) {
                self.fail(YamlError::DuplicateKey {
                    key: key.name.clone(),
                    first_line: *first_line,
                    location: key.location,
                });
                continue;
            }
            first_lines.insert(key.name.clone(), key.location.line);
            mapping.insert(key.name, value);
        }

        // Explicit keys win over merged ones; earlier merge sources win over later ones.
        for (merge_location, source) in merge_sources {
            let sources: Vec<Value> = match source.kind {
                ValueKind::Mapping(_) => vec![source],
                ValueKind::Sequence(items) if items.iter().all(Value::is_mapping) => items,
                _ => {
                    self.fail(YamlError::InvalidMerge {
                        location: merge_location,
                    });
                    continue;
                }
            };
            for source in sources {
                if let ValueKind::Mapping(m) = source.kind {
                    for (k, v) in m {
                        mapping.entry(k).or_insert(v);
                    }
                }
            }
        }

        let node = Value::located(ValueKind::Mapping(mapping), location);
        self.remember(anchor, &node);
        self.push_complete(node);
    }

    fn end_sequence(&mut self) {
        let Some(Frame::Sequence {
            location,
            anchor,
            items,
        }) = self.stack.pop()
        else {
            return;
        };
        let node = Value::located(ValueKind::Sequence(items), location);
        self.remember(anchor, &node);
        self.push_complete(node);
    }

    fn on_alias(&mut self, anchor: usize, marker: &Marker) {
        match self.anchors.get(&anchor).cloned() {
            Some(node) => self.push_complete(node),
            None => {
                let location = self.location(marker);
                self.fail(YamlError::UnknownAnchor {
                    location: location.clone(),
                });
                self.push_complete(Value::located(ValueKind::Null, location));
            }
        }
    }
}

/// String form of a scalar used as a mapping key.
fn key_from_value(value: &Value) -> Option<String> {
    match &value.kind {
        ValueKind::Null => Some("null".to_string()),
        ValueKind::Sequence(_) | ValueKind::Mapping(_) => None,
        _ => value.scalar_to_string(),
    }
}

impl MarkedEventReceiver for ValueBuilder {
    fn on_event(&mut self, ev: Event, marker: Marker) {
        if let Event::DocumentStart = ev {
            self.documents += 1;
            if self.documents == 2 {
                self.warnings.push(
                    Diagnostic::warning(
                        "multiple YAML documents found; only the first document is loaded",
                    )
                    .with_location(self.location(&marker)),
                );
            }
            return;
        }
        if self.documents > 1 {
            return;
        }

        match ev {
            Event::Nothing
            | Event::StreamStart
            | Event::StreamEnd
            | Event::DocumentStart
            | Event::DocumentEnd => {}

            Event::Scalar(text, style, anchor, tag) => {
                self.on_scalar(text, style, anchor, tag, &marker);
            }

            Event::SequenceStart(anchor, _tag) => {
                let location = self.location(&marker);
                if self.expecting_key() {
                    self.fail(YamlError::NonScalarKey {
                        location: location.clone(),
                    });
                }
                self.stack.push(Frame::Sequence {
                    location,
                    anchor,
                    items: Vec::new(),
                });
            }

            Event::SequenceEnd => self.end_sequence(),

            Event::MappingStart(anchor, _tag) => {
                let location = self.location(&marker);
                if self.expecting_key() {
                    self.fail(YamlError::NonScalarKey {
                        location: location.clone(),
                    });
                }
                self.stack.push(Frame::Mapping {
                    location,
                    anchor,
                    entries: Vec::new(),
                    pending: None,
                });
            }

            Event::MappingEnd => self.end_mapping(),

            Event::Alias(anchor) => self.on_alias(anchor, &marker),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok(content: &str) -> Value {
        let (value, warnings) = parse(content, "test.yml").unwrap();
        assert!(warnings.is_empty(), "unexpected warnings: {warnings:?}");
        value
    }

    fn line_col(v: &Value) -> (usize, usize) {
        let loc = v.location().unwrap();
        (loc.line, loc.column)
    }

    #[test]
    fn test_parse_scalars() {
        let v = parse_ok("s: hello\ni: 42\nb: true\nn: ~\nf: 1.5\nq: \"true\"\n");
        assert_eq!(v.get("s").and_then(Value::as_str), Some("hello"));
        assert_eq!(v.get("i").and_then(Value::as_i64), Some(42));
        assert_eq!(v.get("b").and_then(Value::as_bool), Some(true));
        assert!(v.get("n").unwrap().is_null());
        assert_eq!(v.get("f").and_then(Value::as_f64), Some(1.5));
        assert_eq!(v.get("q").and_then(Value::as_str), Some("true"));
    }

    #[test]
    fn test_tagged_str() {
        let v = parse_ok("version: !!str 1.0\n");
        assert_eq!(v.get("version").and_then(Value::as_str), Some("1.0"));
    }

    #[test]
    fn test_keys_are_strings() {
        let v = parse_ok("1: one\ntrue: yes\n~: nothing\n");
        let keys: Vec<&String> = v.as_mapping().unwrap().keys().collect();
        assert_eq!(keys, ["1", "true", "~"]);
    }

    #[test]
    fn test_locations() {
        let v = parse_ok("bundle:\n  name: demo\nlist:\n  - a\n  - b\n");
        let name = v.get("bundle").and_then(|b| b.get("name")).unwrap();
        assert_eq!(line_col(name), (2, 9));
        assert_eq!(name.location().unwrap().file, "test.yml");

        let list = v.get("list").and_then(Value::as_sequence).unwrap();
        assert_eq!(line_col(&list[0]), (4, 5));
        assert_eq!(line_col(&list[1]), (5, 5));
    }

    #[test]
    fn test_preserves_key_order() {
        let v = parse_ok("z: 1\na: 2\nm: 3\n");
        let keys: Vec<&String> = v.as_mapping().unwrap().keys().collect();
        assert_eq!(keys, ["z", "a", "m"]);
    }

    #[test]
    fn test_anchor_copies_keep_anchor_location() {
        let v = parse_ok(
            "tasks:\n  - &base\n    task_key: t\n    notebook: nb.py\n  - *base\n",
        );
        let tasks = v.get("tasks").and_then(Value::as_sequence).unwrap();
        assert_eq!(tasks[0], tasks[1]);
        let first = tasks[0].get("task_key").unwrap();
        let second = tasks[1].get("task_key").unwrap();
        assert_eq!(line_col(first), line_col(second));
        assert_eq!(first.location().unwrap().line, 3);
    }

    #[test]
    fn test_merge_key() {
        let v = parse_ok(
            "defaults: &d\n  a: 1\n  b: 2\nitem:\n  <<: *d\n  b: 3\n",
        );
        let item = v.get("item").unwrap();
        assert_eq!(item.get("a").and_then(Value::as_i64), Some(1));
        assert_eq!(item.get("b").and_then(Value::as_i64), Some(3));
        assert!(item.get("<<").is_none());
    }

    #[test]
    fn test_merge_key_list() {
        let v = parse_ok("x: &x {a: 1}\ny: &y {a: 2, b: 2}\nz:\n  <<: [*x, *y]\n");
        let z = v.get("z").unwrap();
        assert_eq!(z.get("a").and_then(Value::as_i64), Some(1));
        assert_eq!(z.get("b").and_then(Value::as_i64), Some(2));
    }

    #[test]
    fn test_invalid_merge_key() {
        let err = parse("a:\n  <<: 3\n", "test.yml").unwrap_err();
        assert!(matches!(err, YamlError::InvalidMerge { .. }));
    }

    #[test]
    fn test_duplicate_key() {
        let err = parse("a: 1\nb: 2\na: 3\n", "test.yml").unwrap_err();
        assert_eq!(err.to_string(), "key \"a\" is already defined at line 1");
        assert_eq!(err.location().unwrap().line, 3);
    }

    #[test]
    fn test_non_scalar_key() {
        let err = parse("? [a, b]\n: value\n", "test.yml").unwrap_err();
        assert!(matches!(err, YamlError::NonScalarKey { .. }));
    }

    #[test]
    fn test_syntax_error_has_location() {
        let err = parse("a: [1, 2\nb: 3\n", "bad.yml").unwrap_err();
        let loc = err.location().unwrap();
        assert_eq!(loc.file, "bad.yml");
        assert!(loc.line >= 1);
    }

    #[test]
    fn test_empty_document_is_empty_mapping() {
        for content in ["", "# only a comment\n", "~\n"] {
            let v = parse_ok(content);
            assert!(v.as_mapping().is_some_and(|m| m.is_empty()));
            assert!(v.location().is_some());
        }
        let v = parse_ok("");
        assert_eq!(line_col(&v), (1, 1));
    }

    #[test]
    fn test_extra_documents_warn() {
        let (v, warnings) = parse("a: 1\n---\nb: 2\n", "test.yml").unwrap();
        assert!(v.get("a").is_some());
        assert!(v.get("b").is_none());
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].locations[0].line, 2);
    }
}

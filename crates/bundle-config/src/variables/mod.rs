//! Bundle variables.
//!
//! A variable is declared under `variables.<name>` with an optional
//! `default`, `type` and `lookup`. Its value is chosen in priority order:
//!
//! 1. a `--var name=value` assignment
//! 2. the `BUNDLE_VAR_<name>` environment variable
//! 3. the `default` (a target override replaces the root default)
//! 4. a remote `lookup`, resolved by [`ResolveVariableLookups`]
//!
//! The chosen value is stored at `variables.<name>.value`, which is where
//! `${var.<name>}` points.

pub mod lookup;
mod resolve_lookups;

pub use lookup::Lookup;
pub use resolve_lookups::ResolveVariableLookups;

use crate::bundle::Bundle;
use crate::mutator::Mutator;
use crate::{BundleError, Result};
use bundle_diag::Diagnostic;
use bundle_dyn::{Mapping, Path, Value};
use indexmap::IndexMap;

/// The only supported explicit variable type.
pub const COMPLEX_TYPE: &str = "complex";

/// Fields of a variable declaration object.
const DECLARATION_FIELDS: [&str; 5] = ["default", "description", "lookup", "type", "value"];

fn is_complex(declaration: &Value) -> bool {
    declaration.get("type").and_then(Value::as_str) == Some(COMPLEX_TYPE)
}

fn is_set(value: Option<&Value>) -> bool {
    value.is_some_and(|v| !v.is_null())
}

/// Bring a declaration into object form.
///
/// `name: value` is shorthand for `name: {default: value}`. For a complex
/// variable a mapping is shorthand too, unless it only uses declaration
/// fields.
fn normalize_declaration(declaration: &Value, complex: bool) -> Value {
    match declaration.as_mapping() {
        Some(fields) if !complex || fields.keys().all(|k| DECLARATION_FIELDS.contains(&k.as_str())) => {
            declaration.clone()
        }
        _ if declaration.is_null() => Value::empty_mapping().with_locations(declaration.locations.clone()),
        _ => Value::from_pairs([("default", declaration.clone())])
            .with_locations(declaration.locations.clone()),
    }
}

/// Apply a target's `variables` block to the root declarations.
///
/// Every overridden variable must be declared at the root. Each field the
/// target sets replaces the root field whole. A `lookup` without a
/// `default` drops the root default so the lookup takes effect.
pub fn merge_target_variables(root: Option<&Value>, overrides: &Value) -> Result<Value> {
    let mut merged = root.cloned().unwrap_or_else(Value::empty_mapping);
    if overrides.is_null() {
        return Ok(merged);
    }
    let Some(entries) = overrides.as_mapping() else {
        return Err(BundleError::invalid(
            Path::from_keys(["variables"]),
            format!("expected a mapping, found {}", overrides.kind_name()),
            overrides.location().cloned(),
        ));
    };

    for (name, over) in entries {
        let Some(declaration) = merged.get(name) else {
            return Err(BundleError::UndefinedVariableOverride {
                name: name.clone(),
                location: over.location().cloned(),
            });
        };
        let complex = is_complex(declaration) || is_complex(over);
        let mut base = normalize_declaration(declaration, complex);
        let over = normalize_declaration(over, complex);

        if is_set(over.get("lookup")) && over.get("default").is_none() {
            base.remove("default");
        }
        for (field, value) in over.as_mapping().into_iter().flatten() {
            base.insert(field.clone(), value.clone());
        }
        base.append_locations(&over.locations);
        merged.insert(name.clone(), base);
    }
    Ok(merged)
}

/// Parse `name=value` assignments against the declared variable names.
pub fn parse_assignments(
    assignments: &[String],
    declared: &Mapping,
) -> Result<IndexMap<String, String>> {
    let mut parsed = IndexMap::new();
    for input in assignments {
        let Some((name, value)) = input.split_once('=') else {
            return Err(BundleError::MalformedAssignment {
                input: input.clone(),
            });
        };
        if name.is_empty() {
            return Err(BundleError::MalformedAssignment {
                input: input.clone(),
            });
        }
        if !declared.contains_key(name) {
            return Err(BundleError::VariableNotDefined {
                name: name.to_string(),
            });
        }
        if parsed.contains_key(name) {
            return Err(BundleError::AlreadyAssigned {
                name: name.to_string(),
            });
        }
        parsed.insert(name.to_string(), value.to_string());
    }
    Ok(parsed)
}

/// Assigns every declared variable its value.
///
/// Variables left for a lookup keep no `value` until
/// [`ResolveVariableLookups`] runs. A variable with neither a value source
/// nor a lookup is a fatal error.
pub struct SetVariables;

impl Mutator for SetVariables {
    fn name(&self) -> &str {
        "SetVariables"
    }

    fn apply(&self, bundle: &mut Bundle) -> Result<Vec<Diagnostic>> {
        let declared = match bundle.config.get("variables") {
            None => Mapping::new(),
            Some(v) if v.is_null() => Mapping::new(),
            Some(v) => match v.as_mapping() {
                Some(m) => m.clone(),
                None => {
                    return Err(BundleError::invalid(
                        Path::from_keys(["variables"]),
                        format!("expected a mapping, found {}", v.kind_name()),
                        v.location().cloned(),
                    ));
                }
            },
        };
        let assignments = parse_assignments(&bundle.options.variables, &declared)?;
        if declared.is_empty() {
            return Ok(Vec::new());
        }

        let mut resolved = Mapping::with_capacity(declared.len());
        for (name, declaration) in declared {
            let declaration = assign(bundle, &name, &declaration, assignments.get(&name))?;
            resolved.insert(name, declaration);
        }

        let locations = bundle
            .config
            .get("variables")
            .map(|v| v.locations.clone())
            .unwrap_or_default();
        bundle.config.insert(
            "variables",
            Value::new(bundle_dyn::ValueKind::Mapping(resolved)).with_locations(locations),
        );
        Ok(Vec::new())
    }
}

/// The declaration of `name` with its `value` set, if one is available now.
fn assign(
    bundle: &Bundle,
    name: &str,
    declaration: &Value,
    from_flag: Option<&String>,
) -> Result<Value> {
    let complex = is_complex(declaration);
    let mut declaration = normalize_declaration(declaration, complex);
    let invalid = |message: String| BundleError::InvalidVariable {
        name: name.to_string(),
        message,
        location: declaration.location().cloned(),
    };

    if let Some(kind) = declaration.get("type").and_then(Value::as_str)
        && kind != COMPLEX_TYPE
    {
        return Err(invalid(format!("unsupported variable type {kind:?}")));
    }
    if let Some(default) = declaration.get("default")
        && !complex
        && !default.is_null()
        && !default.is_scalar()
    {
        return Err(invalid(format!(
            "the default value is a {}, which requires the variable to be of type complex",
            default.kind_name()
        )));
    }

    if is_set(declaration.get("value")) {
        return Ok(declaration);
    }

    let value = if let Some(raw) = from_flag {
        if complex {
            return Err(BundleError::ComplexFromFlag {
                name: name.to_string(),
            });
        }
        tracing::debug!(variable = name, "value from --var");
        Some(Value::from(raw.as_str()))
    } else if let Some(raw) = bundle.environment.bundle_var(name) {
        if complex {
            return Err(BundleError::ComplexFromEnvironment {
                name: name.to_string(),
            });
        }
        tracing::debug!(variable = name, "value from environment");
        Some(Value::from(raw))
    } else if let Some(default) = declaration.get("default").filter(|d| !d.is_null()) {
        Some(default.clone())
    } else if is_set(declaration.get("lookup")) {
        tracing::debug!(variable = name, "deferring to lookup");
        None
    } else {
        return Err(BundleError::RequiredVariable {
            name: name.to_string(),
        });
    };

    if let Some(value) = value {
        declaration.insert("value", value);
    }
    Ok(declaration)
}

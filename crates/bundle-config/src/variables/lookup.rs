//! Variable lookups: resolving a workspace object's ID from its name.

use crate::workspace::{ListFilter, LookupKind, WorkspaceClient, WorkspaceError};
use crate::{BundleError, Result};
use bundle_dyn::{Location, Value};
use std::fmt;

/// A parsed `lookup` block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lookup {
    pub kind: LookupKind,
    pub name: String,
    pub location: Option<Location>,
}

impl Lookup {
    /// Parse the `lookup` block of variable `variable`.
    ///
    /// Exactly one kind must be set.
    pub fn parse(variable: &str, block: &Value) -> Result<Self> {
        let invalid = |message: String, location: Option<&Location>| BundleError::InvalidVariable {
            name: variable.to_string(),
            message,
            location: location.or(block.location()).cloned(),
        };

        let Some(fields) = block.as_mapping() else {
            return Err(invalid(
                format!("lookup must be a mapping, found {}", block.kind_name()),
                None,
            ));
        };

        let mut found = Vec::new();
        for (key, value) in fields {
            let kind: LookupKind = key.parse().map_err(|e| invalid(e, value.location()))?;
            if value.is_null() {
                continue;
            }
            let Some(name) = value.scalar_to_string() else {
                return Err(invalid(
                    format!("lookup {kind} must be a string, found {}", value.kind_name()),
                    value.location(),
                ));
            };
            found.push(Lookup {
                kind,
                name,
                location: value.location().cloned(),
            });
        }

        match found.len() {
            1 => Ok(found.remove(0)),
            0 => Err(invalid("exactly one lookup field must be set, found none".to_string(), None)),
            n => {
                let kinds: Vec<&str> = found.iter().map(|l| l.kind.as_str()).collect();
                Err(invalid(
                    format!(
                        "exactly one lookup field must be set, found {n}: {}",
                        kinds.join(", ")
                    ),
                    None,
                ))
            }
        }
    }

    /// Resolve the object's ID.
    ///
    /// Kinds without an exact-name API are listed and filtered by name; zero
    /// or several matches are errors.
    pub fn resolve(&self, client: &dyn WorkspaceClient) -> std::result::Result<String, WorkspaceError> {
        if !self.kind.resolved_by_listing() {
            return client.get_by_name(self.kind, &self.name);
        }

        let entities = client.list_all(self.kind, &ListFilter::for_kind(self.kind))?;
        let matches: Vec<_> = entities.into_iter().filter(|e| e.name == self.name).collect();
        let (singular, plural) = self.kind.display_names();
        match matches.as_slice() {
            [only] => Ok(only.id.clone()),
            [] => Err(WorkspaceError::new(format!(
                "{singular} named '{}' does not exist",
                self.name
            ))),
            many => Err(WorkspaceError::new(format!(
                "there are {} instances of {plural} named '{}'",
                many.len(),
                self.name
            ))),
        }
    }
}

impl fmt::Display for Lookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.name)
    }
}

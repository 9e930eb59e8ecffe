//! The resource type registry.
//!
//! Maps each `resources.<type>` key to its singular name, its typed record
//! and the list fields whose elements merge by natural key. The registry is
//! an ordinary value: the standard one is built by
//! [`ResourceRegistry::standard`] and handed to the [`Bundle`] explicitly.
//!
//! [`Bundle`]: crate::Bundle

use crate::resources;
use bundle_dyn::{MergePolicy, Path, PathComponent, SequenceKey, Value};
use serde::de::DeserializeOwned;

/// Checks that a resource's JSON form decodes into its typed record.
pub type Decoder = fn(&serde_json::Value) -> Result<(), serde_json::Error>;

fn decode_as<T: DeserializeOwned>(json: &serde_json::Value) -> Result<(), serde_json::Error> {
    T::deserialize(json).map(|_| ())
}

/// Natural key of a keyed list element: the string value of one field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldKey {
    field: &'static str,
    /// Lowercase the key and use this value when the field is missing
    case_insensitive_default: Option<&'static str>,
}

impl FieldKey {
    pub const fn exact(field: &'static str) -> Self {
        Self {
            field,
            case_insensitive_default: None,
        }
    }

    pub const fn case_insensitive(field: &'static str, default: &'static str) -> Self {
        Self {
            field,
            case_insensitive_default: Some(default),
        }
    }

    pub fn field(&self) -> &'static str {
        self.field
    }
}

impl SequenceKey for FieldKey {
    fn key_of(&self, element: &Value) -> Option<String> {
        let raw = element.get(self.field).and_then(Value::scalar_to_string);
        match self.case_insensitive_default {
            None => raw,
            Some(default) => Some(raw.unwrap_or_else(|| default.to_string()).to_lowercase()),
        }
    }
}

/// One resource type.
#[derive(Debug, Clone)]
pub struct ResourceKind {
    /// Key under `resources`, e.g. `jobs`
    pub plural: &'static str,
    /// Name used in messages, e.g. `job`
    pub singular: &'static str,
    keyed_fields: Vec<(&'static str, FieldKey)>,
    decoder: Decoder,
}

impl ResourceKind {
    pub fn new(plural: &'static str, singular: &'static str, decoder: Decoder) -> Self {
        Self {
            plural,
            singular,
            keyed_fields: Vec::new(),
            decoder,
        }
    }

    /// Declare that list `field` merges elements by `key`.
    pub fn with_keyed_field(mut self, field: &'static str, key: FieldKey) -> Self {
        self.keyed_fields.push((field, key));
        self
    }

    /// The natural key for list `field`, if it is keyed.
    pub fn keyed_field(&self, field: &str) -> Option<&FieldKey> {
        self.keyed_fields
            .iter()
            .find(|(name, _)| *name == field)
            .map(|(_, key)| key)
    }

    /// Keyed list fields with their natural keys.
    pub fn keyed_fields(&self) -> impl Iterator<Item = (&'static str, &FieldKey)> {
        self.keyed_fields.iter().map(|(name, key)| (*name, key))
    }

    /// Decode a resource into its typed record, discarding the result.
    pub fn decode(&self, json: &serde_json::Value) -> Result<(), serde_json::Error> {
        (self.decoder)(json)
    }
}

/// All known resource types.
#[derive(Debug, Clone)]
pub struct ResourceRegistry {
    kinds: Vec<ResourceKind>,
}

impl ResourceRegistry {
    pub fn new(kinds: Vec<ResourceKind>) -> Self {
        Self { kinds }
    }

    /// The resource types supported by bundles.
    pub fn standard() -> Self {
        Self::new(vec![
            ResourceKind::new("apps", "app", decode_as::<resources::App>)
                .with_keyed_field("resources", FieldKey::exact("name")),
            ResourceKind::new("clusters", "cluster", decode_as::<resources::Cluster>),
            ResourceKind::new("dashboards", "dashboard", decode_as::<resources::Dashboard>),
            ResourceKind::new("experiments", "experiment", decode_as::<resources::Experiment>),
            ResourceKind::new("jobs", "job", decode_as::<resources::Job>)
                .with_keyed_field("job_clusters", FieldKey::exact("job_cluster_key"))
                .with_keyed_field("tasks", FieldKey::exact("task_key"))
                .with_keyed_field("parameters", FieldKey::exact("name")),
            ResourceKind::new(
                "model_serving_endpoints",
                "model_serving_endpoint",
                decode_as::<resources::ModelServingEndpoint>,
            ),
            ResourceKind::new("models", "model", decode_as::<resources::Model>),
            ResourceKind::new("pipelines", "pipeline", decode_as::<resources::Pipeline>)
                .with_keyed_field("clusters", FieldKey::case_insensitive("label", "default")),
            ResourceKind::new(
                "quality_monitors",
                "quality_monitor",
                decode_as::<resources::QualityMonitor>,
            ),
            ResourceKind::new(
                "registered_models",
                "registered_model",
                decode_as::<resources::RegisteredModel>,
            ),
            ResourceKind::new("schemas", "schema", decode_as::<resources::Schema>),
            ResourceKind::new("secret_scopes", "secret_scope", decode_as::<resources::SecretScope>),
            ResourceKind::new("volumes", "volume", decode_as::<resources::Volume>),
        ])
    }

    /// Look up a resource type by its `resources` key.
    pub fn get(&self, plural: &str) -> Option<&ResourceKind> {
        self.kinds.iter().find(|k| k.plural == plural)
    }

    pub fn kinds(&self) -> &[ResourceKind] {
        &self.kinds
    }
}

impl Default for ResourceRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

/// Lists at `resources.<type>.<name>.<field>` merge by the field's natural key.
impl MergePolicy for ResourceRegistry {
    fn sequence_key(&self, path: &Path) -> Option<&dyn SequenceKey> {
        match path.components() {
            [
                PathComponent::Key(section),
                PathComponent::Key(plural),
                PathComponent::Key(_),
                PathComponent::Key(field),
            ] if section == "resources" => self
                .get(plural)?
                .keyed_field(field)
                .map(|key| key as &dyn SequenceKey),
            _ => None,
        }
    }
}

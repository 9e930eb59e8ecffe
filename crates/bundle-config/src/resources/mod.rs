//! Typed views of the resolved configuration.
//!
//! Loading, merging and interpolation work on the untyped [`Value`] tree.
//! Once those are done the tree decodes into these records. Fields the
//! records do not model are kept in `extra`, so decoding never drops
//! configuration.

use bundle_dyn::Value;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Fields a record does not model explicitly.
pub type Extra = BTreeMap<String, serde_json::Value>;

macro_rules! named_resource {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
        pub struct $name {
            #[serde(default, skip_serializing_if = "Option::is_none")]
            pub name: Option<String>,

            #[serde(flatten)]
            pub extra: Extra,
        }
    };
}

named_resource!(
    /// An MLflow experiment.
    Experiment
);
named_resource!(
    /// A legacy workspace model registry model.
    Model
);
named_resource!(
    /// A Unity Catalog registered model.
    RegisteredModel
);
named_resource!(
    /// A model serving endpoint.
    ModelServingEndpoint
);
named_resource!(
    /// A Unity Catalog schema.
    Schema
);
named_resource!(
    /// A Unity Catalog volume.
    Volume
);
named_resource!(
    /// A secret scope.
    SecretScope
);

/// A Lakeview dashboard.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dashboard {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,

    #[serde(flatten)]
    pub extra: Extra,
}

/// An all-purpose cluster.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cluster {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_name: Option<String>,

    #[serde(flatten)]
    pub extra: Extra,
}

/// A quality monitor on a table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QualityMonitor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_name: Option<String>,

    #[serde(flatten)]
    pub extra: Extra,
}

/// A Databricks app.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct App {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_code_path: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resources: Vec<AppResource>,

    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppResource {
    pub name: String,

    #[serde(flatten)]
    pub extra: Extra,
}

/// A job.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Job {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tasks: Vec<Task>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub job_clusters: Vec<JobCluster>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<JobParameter>,

    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Task {
    #[serde(default)]
    pub task_key: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_cluster_key: Option<String>,

    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobCluster {
    pub job_cluster_key: String,

    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobParameter {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,

    #[serde(flatten)]
    pub extra: Extra,
}

/// A Lakeflow declarative pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Pipeline {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub clusters: Vec<PipelineCluster>,

    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineCluster {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    #[serde(flatten)]
    pub extra: Extra,
}

/// All resources of a bundle, keyed by resource key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Resources {
    pub apps: IndexMap<String, App>,
    pub clusters: IndexMap<String, Cluster>,
    pub dashboards: IndexMap<String, Dashboard>,
    pub experiments: IndexMap<String, Experiment>,
    pub jobs: IndexMap<String, Job>,
    pub model_serving_endpoints: IndexMap<String, ModelServingEndpoint>,
    pub models: IndexMap<String, Model>,
    pub pipelines: IndexMap<String, Pipeline>,
    pub quality_monitors: IndexMap<String, QualityMonitor>,
    pub registered_models: IndexMap<String, RegisteredModel>,
    pub schemas: IndexMap<String, Schema>,
    pub secret_scopes: IndexMap<String, SecretScope>,
    pub volumes: IndexMap<String, Volume>,
}

/// The `bundle` section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BundleSection {
    #[serde(default)]
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,

    /// Legacy alias of `target`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git: Option<Git>,

    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Git {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin_url: Option<String>,

    #[serde(flatten)]
    pub extra: Extra,
}

/// The `workspace` section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Workspace {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_path: Option<String>,

    #[serde(flatten)]
    pub extra: Extra,
}

/// The `sync` section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    pub paths: Vec<String>,
}

/// A variable declaration with its resolved value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Variable {
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub variable_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lookup: Option<BTreeMap<String, String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
}

/// The resolved configuration document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Root {
    pub bundle: BundleSection,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub workspace: Option<Workspace>,

    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub variables: IndexMap<String, Variable>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub include: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub sync: Option<SyncConfig>,

    pub resources: Resources,
}

impl Root {
    /// Decode a resolved configuration tree.
    ///
    /// Top-level sections the record does not model (`permissions`,
    /// `presets`, ...) are ignored.
    pub fn from_value(value: &Value) -> Result<Self, serde_json::Error> {
        Root::deserialize(value.to_json())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_job_keeps_unknown_fields() {
        let job: Job = serde_json::from_value(json!({
            "name": "nightly",
            "tasks": [{"task_key": "t1", "job_cluster_key": "c", "notebook_task": {"notebook_path": "nb"}}],
            "max_concurrent_runs": 2,
        }))
        .unwrap();
        assert_eq!(job.name.as_deref(), Some("nightly"));
        assert_eq!(job.tasks[0].job_cluster_key.as_deref(), Some("c"));
        assert!(job.tasks[0].extra.contains_key("notebook_task"));
        assert_eq!(job.extra.get("max_concurrent_runs"), Some(&json!(2)));
    }

    #[test]
    fn test_job_rejects_wrong_shape() {
        let err = serde_json::from_value::<Job>(json!({"tasks": "not a list"}));
        assert!(err.is_err());
    }

    #[test]
    fn test_root_from_value() {
        let value = Value::from_json(&json!({
            "bundle": {"name": "demo", "target": "dev"},
            "variables": {"warehouse": {"default": "abc", "value": "abc"}},
            "resources": {"jobs": {"foo": {"name": "foo"}}},
            "permissions": [{"level": "CAN_VIEW", "group_name": "users"}],
        }));
        let root = Root::from_value(&value).unwrap();
        assert_eq!(root.bundle.name, "demo");
        assert_eq!(root.bundle.target.as_deref(), Some("dev"));
        assert_eq!(root.variables["warehouse"].value, Some(json!("abc")));
        assert!(root.resources.jobs.contains_key("foo"));
    }
}

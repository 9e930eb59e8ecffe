use super::Check;
use crate::bundle::Bundle;
use bundle_diag::Diagnostic;
use bundle_dyn::{Path, Value};
use std::collections::HashSet;

/// Task fields that give a task its compute.
const COMPUTE_FIELDS: [&str; 4] = [
    "job_cluster_key",
    "existing_cluster_id",
    "new_cluster",
    "environment_key",
];

/// Tasks must refer to job clusters the job declares.
///
/// Both findings are warnings: the job may still deploy, but the task will
/// not run where its author expects.
pub struct JobClusterKeyDefined;

impl Check for JobClusterKeyDefined {
    fn name(&self) -> &str {
        "job_cluster_key_defined"
    }

    fn check(&self, bundle: &Bundle) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        let Some(jobs) = bundle
            .config
            .get("resources")
            .and_then(|r| r.get("jobs"))
            .and_then(Value::as_mapping)
        else {
            return diagnostics;
        };

        for (job_key, job) in jobs {
            let Some(tasks) = job.get("tasks").and_then(Value::as_sequence) else {
                continue;
            };
            let defined: HashSet<String> = job
                .get("job_clusters")
                .and_then(Value::as_sequence)
                .unwrap_or_default()
                .iter()
                .filter_map(|c| c.get("job_cluster_key").and_then(Value::scalar_to_string))
                .collect();

            for (i, task) in tasks.iter().enumerate() {
                let task_path = Path::from_keys(["resources", "jobs", job_key.as_str(), "tasks"]).index(i);

                if let Some(key) = task.get("job_cluster_key") {
                    let Some(name) = key.scalar_to_string() else {
                        continue;
                    };
                    if !defined.contains(&name) {
                        diagnostics.push(
                            Diagnostic::warning(format!("job_cluster_key {name} is not defined"))
                                .with_locations(key.locations.iter().cloned())
                                .with_path(task_path.key("job_cluster_key")),
                        );
                    }
                    continue;
                }

                let has_compute = COMPUTE_FIELDS.iter().any(|f| task.get(f).is_some());
                if !has_compute && !defined.is_empty() {
                    let task_key = task
                        .get("task_key")
                        .and_then(Value::scalar_to_string)
                        .unwrap_or_else(|| i.to_string());
                    diagnostics.push(
                        Diagnostic::warning(format!(
                            "task {task_key} has no job_cluster_key but job {job_key} defines job_clusters"
                        ))
                        .with_locations(task.locations.iter().cloned())
                        .with_path(task_path),
                    );
                }
            }
        }
        diagnostics
    }
}

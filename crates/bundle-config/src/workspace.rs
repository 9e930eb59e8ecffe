//! The workspace capability consumed by variable lookups.
//!
//! The pipeline never talks to a concrete HTTP client. Anything that can find
//! a workspace object's ID by name implements [`WorkspaceClient`].

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Kinds of workspace objects a variable lookup can resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LookupKind {
    Alert,
    Cluster,
    ClusterPolicy,
    Dashboard,
    InstancePool,
    Job,
    Metastore,
    NotificationDestination,
    Pipeline,
    Query,
    ServicePrincipal,
    Warehouse,
}

impl LookupKind {
    pub const ALL: [LookupKind; 12] = [
        LookupKind::Alert,
        LookupKind::Cluster,
        LookupKind::ClusterPolicy,
        LookupKind::Dashboard,
        LookupKind::InstancePool,
        LookupKind::Job,
        LookupKind::Metastore,
        LookupKind::NotificationDestination,
        LookupKind::Pipeline,
        LookupKind::Query,
        LookupKind::ServicePrincipal,
        LookupKind::Warehouse,
    ];

    /// Field name in a `lookup` block.
    pub fn as_str(self) -> &'static str {
        match self {
            LookupKind::Alert => "alert",
            LookupKind::Cluster => "cluster",
            LookupKind::ClusterPolicy => "cluster_policy",
            LookupKind::Dashboard => "dashboard",
            LookupKind::InstancePool => "instance_pool",
            LookupKind::Job => "job",
            LookupKind::Metastore => "metastore",
            LookupKind::NotificationDestination => "notification_destination",
            LookupKind::Pipeline => "pipeline",
            LookupKind::Query => "query",
            LookupKind::ServicePrincipal => "service_principal",
            LookupKind::Warehouse => "warehouse",
        }
    }

    /// Human-readable singular and plural names.
    pub fn display_names(self) -> (&'static str, &'static str) {
        match self {
            LookupKind::Alert => ("alert", "alerts"),
            LookupKind::Cluster => ("cluster", "clusters"),
            LookupKind::ClusterPolicy => ("cluster policy", "cluster policies"),
            LookupKind::Dashboard => ("dashboard", "dashboards"),
            LookupKind::InstancePool => ("instance pool", "instance pools"),
            LookupKind::Job => ("job", "jobs"),
            LookupKind::Metastore => ("metastore", "metastores"),
            LookupKind::NotificationDestination => {
                ("notification destination", "notification destinations")
            }
            LookupKind::Pipeline => ("pipeline", "pipelines"),
            LookupKind::Query => ("query", "queries"),
            LookupKind::ServicePrincipal => ("service principal", "service principals"),
            LookupKind::Warehouse => ("warehouse", "warehouses"),
        }
    }

    /// Whether the kind has no exact-name API and is resolved by listing.
    pub fn resolved_by_listing(self) -> bool {
        matches!(
            self,
            LookupKind::Cluster
                | LookupKind::Dashboard
                | LookupKind::Metastore
                | LookupKind::NotificationDestination
        )
    }
}

impl fmt::Display for LookupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LookupKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LookupKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| format!("unknown lookup kind: {s}"))
    }
}

/// Origin of a cluster, used to narrow cluster listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClusterSource {
    Api,
    Ui,
    Job,
    Pipeline,
}

/// Server-side filter for [`WorkspaceClient::list_all`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListFilter {
    /// Only return clusters created from these sources (empty = all)
    pub cluster_sources: Vec<ClusterSource>,
}

impl ListFilter {
    /// The filter used for a listing lookup of `kind`.
    pub fn for_kind(kind: LookupKind) -> Self {
        match kind {
            LookupKind::Cluster => Self {
                cluster_sources: vec![ClusterSource::Api, ClusterSource::Ui],
            },
            _ => Self::default(),
        }
    }
}

/// An object returned by a listing call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedEntity {
    pub id: String,
    pub name: String,
}

impl NamedEntity {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Failure reported by a workspace client.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct WorkspaceError {
    pub message: String,
}

impl WorkspaceError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Name-to-ID resolution against a workspace.
///
/// Calls are blocking. Implementations own any retry and deadline policy.
pub trait WorkspaceClient: Send + Sync {
    /// ID of the object of `kind` with exactly this name.
    fn get_by_name(&self, kind: LookupKind, name: &str) -> Result<String, WorkspaceError>;

    /// Every object of `kind` matching `filter`.
    fn list_all(
        &self,
        kind: LookupKind,
        filter: &ListFilter,
    ) -> Result<Vec<NamedEntity>, WorkspaceError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_round_trip() {
        for kind in LookupKind::ALL {
            assert_eq!(kind.as_str().parse::<LookupKind>(), Ok(kind));
        }
        assert!("nope".parse::<LookupKind>().is_err());
    }

    #[test]
    fn test_cluster_filter() {
        assert_eq!(
            ListFilter::for_kind(LookupKind::Cluster).cluster_sources,
            [ClusterSource::Api, ClusterSource::Ui]
        );
        assert!(ListFilter::for_kind(LookupKind::Dashboard).cluster_sources.is_empty());
    }

    #[test]
    fn test_listing_kinds() {
        let listed: Vec<_> = LookupKind::ALL
            .into_iter()
            .filter(|k| k.resolved_by_listing())
            .map(LookupKind::as_str)
            .collect();
        assert_eq!(
            listed,
            ["cluster", "dashboard", "metastore", "notification_destination"]
        );
    }
}

// Copyright 2025 Sushanth (https://github.com/sushanthpy)
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Persistence
//!
//! The platform database is an external collaborator reached through the
//! [`PlatformStore`] trait. [`MemoryStore`] is the bundled implementation:
//! a [`PlatformSnapshot`] loaded from JSON and kept behind a
//! `parking_lot::RwLock`. Only workflow executions are ever written.

use crate::catalog::{
    DependencyEdge, DependencyLink, Service, ServiceStatus, ServiceType, Team, User,
};
use crate::deployment::Deployment;
use crate::error::{StoreError, StoreResult};
use crate::incident::{Incident, IncidentStatus, Severity};
use crate::metric::MetricSample;
use crate::workflow::{ExecutionStatus, Workflow, WorkflowExecution, WorkflowStatus};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

/// Service listing filter. Results are ordered by name.
#[derive(Debug, Clone, Default)]
pub struct ServiceFilter {
    /// Owning team name, case-insensitive
    pub team: Option<String>,
    pub service_type: Option<ServiceType>,
    pub status: Option<ServiceStatus>,
    /// Exact element of the service's language list, case-insensitive
    pub language: Option<String>,
    pub limit: Option<usize>,
}

/// Incident filter. Results are ordered by detection time, newest first.
#[derive(Debug, Clone, Default)]
pub struct IncidentFilter {
    pub service_id: Option<String>,
    /// Owning service name, case-insensitive
    pub service_name: Option<String>,
    pub status: Option<IncidentStatus>,
    pub severity: Option<Severity>,
    /// OPEN or INVESTIGATING only
    pub active_only: bool,
    pub detected_since: Option<DateTime<Utc>>,
    pub limit: Option<usize>,
}

impl IncidentFilter {
    pub fn active() -> Self {
        Self {
            active_only: true,
            ..Default::default()
        }
    }

    fn matches(&self, incident: &Incident, service_ids: Option<&[String]>) -> bool {
        self.service_id
            .as_ref()
            .map_or(true, |id| &incident.service_id == id)
            && service_ids.map_or(true, |ids| ids.contains(&incident.service_id))
            && self.status.map_or(true, |s| incident.status == s)
            && self.severity.map_or(true, |s| incident.severity == s)
            && (!self.active_only || incident.is_active())
            && self
                .detected_since
                .map_or(true, |since| incident.detected_at >= since)
    }
}

/// Deployment filter. Results are ordered by start time, newest first.
#[derive(Debug, Clone, Default)]
pub struct DeploymentFilter {
    pub service_id: Option<String>,
    pub started_since: Option<DateTime<Utc>>,
    pub limit: Option<usize>,
}

/// Metric query for one service. Results are in ascending time order.
#[derive(Debug, Clone)]
pub struct MetricQuery {
    pub service_id: String,
    pub since: DateTime<Utc>,
    /// Metric names to include; empty means all
    pub names: Vec<String>,
    /// Keep only the most recent `limit` samples
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExecutionOrder {
    #[default]
    StartedAt,
    CompletedAt,
}

/// Execution filter. Results are ordered newest first by `order_by`.
#[derive(Debug, Clone, Default)]
pub struct ExecutionFilter {
    /// Allowed statuses; empty means all
    pub statuses: Vec<ExecutionStatus>,
    pub completed_since: Option<DateTime<Utc>>,
    pub order_by: ExecutionOrder,
    pub limit: Option<usize>,
}

/// Read/write access to the platform database.
#[async_trait]
pub trait PlatformStore: Send + Sync {
    /// Case-insensitive exact name lookup.
    async fn find_service(&self, name: &str) -> StoreResult<Option<Service>>;

    async fn find_service_by_id(&self, id: &str) -> StoreResult<Option<Service>>;

    async fn list_services(&self, filter: &ServiceFilter) -> StoreResult<Vec<Service>>;

    /// Every service name, in catalog order.
    async fn service_names(&self) -> StoreResult<Vec<String>>;

    /// Outgoing edges: services `service_id` depends on.
    async fn dependencies_of(&self, service_id: &str) -> StoreResult<Vec<DependencyLink>>;

    /// Incoming edges: services depending on `service_id`.
    async fn dependents_of(&self, service_id: &str) -> StoreResult<Vec<DependencyLink>>;

    async fn metrics(&self, query: &MetricQuery) -> StoreResult<Vec<MetricSample>>;

    async fn incidents(&self, filter: &IncidentFilter) -> StoreResult<Vec<Incident>>;

    async fn count_incidents(&self, filter: &IncidentFilter) -> StoreResult<usize>;

    async fn deployments(&self, filter: &DeploymentFilter) -> StoreResult<Vec<Deployment>>;

    async fn count_services(&self, status: Option<ServiceStatus>) -> StoreResult<usize>;

    async fn count_teams(&self) -> StoreResult<usize>;

    async fn count_users(&self) -> StoreResult<usize>;

    async fn find_team(&self, id: &str) -> StoreResult<Option<Team>>;

    async fn find_user(&self, id: &str) -> StoreResult<Option<User>>;

    /// Case-insensitive exact name lookup among ACTIVE workflows.
    async fn find_active_workflow(&self, name: &str) -> StoreResult<Option<Workflow>>;

    async fn active_workflow_names(&self) -> StoreResult<Vec<String>>;

    async fn find_workflow(&self, id: &str) -> StoreResult<Option<Workflow>>;

    async fn create_execution(&self, execution: &WorkflowExecution) -> StoreResult<()>;

    /// Replace a stored execution. Fails with `NotFound` for unknown ids.
    async fn update_execution(&self, execution: &WorkflowExecution) -> StoreResult<()>;

    async fn find_execution(&self, id: &str) -> StoreResult<Option<WorkflowExecution>>;

    async fn executions(&self, filter: &ExecutionFilter) -> StoreResult<Vec<WorkflowExecution>>;
}

/// Full contents of the platform database.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformSnapshot {
    pub services: Vec<Service>,
    pub teams: Vec<Team>,
    pub users: Vec<User>,
    pub dependencies: Vec<DependencyEdge>,
    pub metrics: Vec<MetricSample>,
    pub incidents: Vec<Incident>,
    pub deployments: Vec<Deployment>,
    pub workflows: Vec<Workflow>,
    pub executions: Vec<WorkflowExecution>,
}

impl PlatformSnapshot {
    pub fn from_json(json: &str) -> StoreResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> StoreResult<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&raw)
    }

    /// Latest timestamp among metrics, incidents and deployments.
    pub fn latest_timestamp(&self) -> Option<DateTime<Utc>> {
        let metrics = self.metrics.iter().map(|m| m.timestamp);
        let incidents = self.incidents.iter().map(|i| i.detected_at);
        let deployments = self.deployments.iter().map(|d| d.started_at);
        metrics.chain(incidents).chain(deployments).max()
    }

    /// Shift every recorded timestamp so the latest one lands on `now`.
    ///
    /// Keeps a static demo snapshot inside the trailing query windows.
    pub fn rebase_to(&mut self, now: DateTime<Utc>) {
        let Some(latest) = self.latest_timestamp() else {
            return;
        };
        let offset = now - latest;

        for m in &mut self.metrics {
            m.timestamp += offset;
        }
        for i in &mut self.incidents {
            i.detected_at += offset;
            i.resolved_at = i.resolved_at.map(|t| t + offset);
        }
        for d in &mut self.deployments {
            d.started_at += offset;
            d.completed_at = d.completed_at.map(|t| t + offset);
        }
        for e in &mut self.executions {
            e.started_at += offset;
            e.completed_at = e.completed_at.map(|t| t + offset);
        }
    }

    fn service_by_id(&self, id: &str) -> Option<&Service> {
        self.services.iter().find(|s| s.id == id)
    }
}

fn truncate<T>(mut items: Vec<T>, limit: Option<usize>) -> Vec<T> {
    if let Some(limit) = limit {
        items.truncate(limit);
    }
    items
}

/// In-memory [`PlatformStore`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: RwLock<PlatformSnapshot>,
}

impl MemoryStore {
    pub fn new(snapshot: PlatformSnapshot) -> Self {
        info!(
            services = snapshot.services.len(),
            metrics = snapshot.metrics.len(),
            incidents = snapshot.incidents.len(),
            workflows = snapshot.workflows.len(),
            "Platform snapshot loaded"
        );
        Self {
            data: RwLock::new(snapshot),
        }
    }

    pub fn from_path(path: impl AsRef<Path>) -> StoreResult<Self> {
        Ok(Self::new(PlatformSnapshot::load(path)?))
    }

    /// Copy of the current contents.
    pub fn snapshot(&self) -> PlatformSnapshot {
        self.data.read().clone()
    }

    fn links<F>(&self, edge_filter: F, other_end: fn(&DependencyEdge) -> &str) -> Vec<DependencyLink>
    where
        F: Fn(&DependencyEdge) -> bool,
    {
        let data = self.data.read();
        data.dependencies
            .iter()
            .filter(|edge| edge_filter(edge))
            .filter_map(|edge| {
                data.service_by_id(other_end(edge)).map(|service| DependencyLink {
                    service: service.summary(),
                    dependency_type: edge.dependency_type.clone(),
                    description: edge.description.clone(),
                })
            })
            .collect()
    }
}

#[async_trait]
impl PlatformStore for MemoryStore {
    async fn find_service(&self, name: &str) -> StoreResult<Option<Service>> {
        Ok(self
            .data
            .read()
            .services
            .iter()
            .find(|s| s.name_matches(name))
            .cloned())
    }

    async fn find_service_by_id(&self, id: &str) -> StoreResult<Option<Service>> {
        Ok(self.data.read().service_by_id(id).cloned())
    }

    async fn list_services(&self, filter: &ServiceFilter) -> StoreResult<Vec<Service>> {
        let data = self.data.read();
        let team_id = match &filter.team {
            Some(name) => match data.teams.iter().find(|t| t.name.eq_ignore_ascii_case(name)) {
                Some(team) => Some(team.id.as_str()),
                None => return Ok(Vec::new()),
            },
            None => None,
        };

        let mut services: Vec<Service> = data
            .services
            .iter()
            .filter(|s| team_id.map_or(true, |id| s.owner_id == id))
            .filter(|s| filter.service_type.map_or(true, |t| s.service_type == t))
            .filter(|s| filter.status.map_or(true, |st| s.status == st))
            .filter(|s| {
                filter.language.as_ref().map_or(true, |lang| {
                    s.language.iter().any(|l| l.eq_ignore_ascii_case(lang))
                })
            })
            .cloned()
            .collect();
        services.sort_by(|a, b| a.name.cmp(&b.name));

        Ok(truncate(services, filter.limit))
    }

    async fn service_names(&self) -> StoreResult<Vec<String>> {
        Ok(self
            .data
            .read()
            .services
            .iter()
            .map(|s| s.name.clone())
            .collect())
    }

    async fn dependencies_of(&self, service_id: &str) -> StoreResult<Vec<DependencyLink>> {
        Ok(self.links(|e| e.service_id == service_id, |e| e.depends_on_id.as_str()))
    }

    async fn dependents_of(&self, service_id: &str) -> StoreResult<Vec<DependencyLink>> {
        Ok(self.links(|e| e.depends_on_id == service_id, |e| e.service_id.as_str()))
    }

    async fn metrics(&self, query: &MetricQuery) -> StoreResult<Vec<MetricSample>> {
        let data = self.data.read();
        let mut samples: Vec<MetricSample> = data
            .metrics
            .iter()
            .filter(|m| m.service_id == query.service_id && m.timestamp >= query.since)
            .filter(|m| query.names.is_empty() || query.names.contains(&m.name))
            .cloned()
            .collect();
        samples.sort_by_key(|m| m.timestamp);

        if let Some(limit) = query.limit {
            let skip = samples.len().saturating_sub(limit);
            samples.drain(..skip);
        }
        debug!(service_id = %query.service_id, samples = samples.len(), "Metrics query");
        Ok(samples)
    }

    async fn incidents(&self, filter: &IncidentFilter) -> StoreResult<Vec<Incident>> {
        let data = self.data.read();
        let service_ids: Option<Vec<String>> = filter.service_name.as_ref().map(|name| {
            data.services
                .iter()
                .filter(|s| s.name_matches(name))
                .map(|s| s.id.clone())
                .collect()
        });

        let mut incidents: Vec<Incident> = data
            .incidents
            .iter()
            .filter(|i| filter.matches(i, service_ids.as_deref()))
            .cloned()
            .collect();
        incidents.sort_by(|a, b| b.detected_at.cmp(&a.detected_at));

        Ok(truncate(incidents, filter.limit))
    }

    async fn count_incidents(&self, filter: &IncidentFilter) -> StoreResult<usize> {
        Ok(self.incidents(filter).await?.len())
    }

    async fn deployments(&self, filter: &DeploymentFilter) -> StoreResult<Vec<Deployment>> {
        let data = self.data.read();
        let mut deployments: Vec<Deployment> = data
            .deployments
            .iter()
            .filter(|d| {
                filter
                    .service_id
                    .as_ref()
                    .map_or(true, |id| &d.service_id == id)
            })
            .filter(|d| filter.started_since.map_or(true, |since| d.started_at >= since))
            .cloned()
            .collect();
        deployments.sort_by(|a, b| b.started_at.cmp(&a.started_at));

        Ok(truncate(deployments, filter.limit))
    }

    async fn count_services(&self, status: Option<ServiceStatus>) -> StoreResult<usize> {
        Ok(self
            .data
            .read()
            .services
            .iter()
            .filter(|s| status.map_or(true, |st| s.status == st))
            .count())
    }

    async fn count_teams(&self) -> StoreResult<usize> {
        Ok(self.data.read().teams.len())
    }

    async fn count_users(&self) -> StoreResult<usize> {
        Ok(self.data.read().users.len())
    }

    async fn find_team(&self, id: &str) -> StoreResult<Option<Team>> {
        Ok(self.data.read().teams.iter().find(|t| t.id == id).cloned())
    }

    async fn find_user(&self, id: &str) -> StoreResult<Option<User>> {
        Ok(self.data.read().users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_active_workflow(&self, name: &str) -> StoreResult<Option<Workflow>> {
        Ok(self
            .data
            .read()
            .workflows
            .iter()
            .find(|w| w.status == WorkflowStatus::Active && w.name.eq_ignore_ascii_case(name))
            .cloned())
    }

    async fn active_workflow_names(&self) -> StoreResult<Vec<String>> {
        Ok(self
            .data
            .read()
            .workflows
            .iter()
            .filter(|w| w.status == WorkflowStatus::Active)
            .map(|w| w.name.clone())
            .collect())
    }

    async fn find_workflow(&self, id: &str) -> StoreResult<Option<Workflow>> {
        Ok(self.data.read().workflows.iter().find(|w| w.id == id).cloned())
    }

    async fn create_execution(&self, execution: &WorkflowExecution) -> StoreResult<()> {
        self.data.write().executions.push(execution.clone());
        Ok(())
    }

    async fn update_execution(&self, execution: &WorkflowExecution) -> StoreResult<()> {
        let mut data = self.data.write();
        let slot = data
            .executions
            .iter_mut()
            .find(|e| e.id == execution.id)
            .ok_or_else(|| StoreError::NotFound(format!("workflow execution {}", execution.id)))?;
        *slot = execution.clone();
        Ok(())
    }

    async fn find_execution(&self, id: &str) -> StoreResult<Option<WorkflowExecution>> {
        Ok(self
            .data
            .read()
            .executions
            .iter()
            .find(|e| e.id == id)
            .cloned())
    }

    async fn executions(&self, filter: &ExecutionFilter) -> StoreResult<Vec<WorkflowExecution>> {
        let data = self.data.read();
        let mut executions: Vec<WorkflowExecution> = data
            .executions
            .iter()
            .filter(|e| filter.statuses.is_empty() || filter.statuses.contains(&e.status))
            .filter(|e| {
                filter.completed_since.map_or(true, |since| {
                    e.completed_at.map_or(false, |done| done >= since)
                })
            })
            .cloned()
            .collect();

        match filter.order_by {
            ExecutionOrder::StartedAt => executions.sort_by(|a, b| b.started_at.cmp(&a.started_at)),
            ExecutionOrder::CompletedAt => {
                executions.sort_by(|a, b| b.completed_at.cmp(&a.completed_at))
            }
        }

        Ok(truncate(executions, filter.limit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::Parameters;
    use chrono::Duration;
    use serde_json::json;
    use std::io::Write;

    fn snapshot() -> PlatformSnapshot {
        serde_json::from_value(json!({
            "teams": [
                { "id": "t1", "name": "platform", "displayName": "Platform Team",
                  "members": [{ "userId": "u1", "role": "LEAD" }] }
            ],
            "users": [{ "id": "u1", "email": "ada@example.com", "firstName": "Ada" }],
            "services": [
                { "id": "s2", "name": "orders", "displayName": "Orders", "type": "SERVICE",
                  "status": "ACTIVE", "ownerId": "t1", "language": ["Rust"] },
                { "id": "s1", "name": "auth", "displayName": "Auth", "type": "SERVICE",
                  "status": "DEPRECATED", "ownerId": "t1", "language": ["Go", "TypeScript"] },
                { "id": "s3", "name": "orders-db", "displayName": "Orders DB", "type": "DATABASE",
                  "status": "ACTIVE", "ownerId": "t2" }
            ],
            "dependencies": [
                { "serviceId": "s2", "dependsOnId": "s1", "type": "API" },
                { "serviceId": "s2", "dependsOnId": "s3", "type": "DATABASE", "description": "primary" }
            ],
            "incidents": [
                { "id": "i1", "serviceId": "s2", "title": "latency", "severity": "HIGH",
                  "status": "OPEN", "detectedAt": "2025-05-01T10:00:00Z" },
                { "id": "i2", "serviceId": "s2", "title": "old", "severity": "LOW",
                  "status": "CLOSED", "detectedAt": "2025-04-01T10:00:00Z" }
            ],
            "workflows": [
                { "id": "w1", "name": "Deploy Service", "status": "ACTIVE",
                  "definition": { "nodes": [] } },
                { "id": "w2", "name": "Legacy Deploy", "status": "INACTIVE" }
            ]
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_find_service_is_case_insensitive() {
        let store = MemoryStore::new(snapshot());
        let found = store.find_service("ORDERS").await.unwrap().unwrap();
        assert_eq!(found.id, "s2");
        assert!(store.find_service("order").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_services_filters_and_orders_by_name() {
        let store = MemoryStore::new(snapshot());

        let all = store.list_services(&ServiceFilter::default()).await.unwrap();
        let names: Vec<&str> = all.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["auth", "orders", "orders-db"]);

        let by_team = store
            .list_services(&ServiceFilter {
                team: Some("PLATFORM".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(by_team.len(), 2);

        let by_lang = store
            .list_services(&ServiceFilter {
                language: Some("go".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(by_lang[0].name, "auth");

        let unknown_team = store
            .list_services(&ServiceFilter {
                team: Some("nobody".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(unknown_team.is_empty());
    }

    #[tokio::test]
    async fn test_dependency_links_resolve_both_ends() {
        let store = MemoryStore::new(snapshot());
        let deps = store.dependencies_of("s2").await.unwrap();
        assert_eq!(deps.len(), 2);
        assert_eq!(deps[1].service.name, "orders-db");
        assert_eq!(deps[1].description.as_deref(), Some("primary"));

        let dependents = store.dependents_of("s1").await.unwrap();
        assert_eq!(dependents.len(), 1);
        assert_eq!(dependents[0].service.name, "orders");
    }

    #[tokio::test]
    async fn test_incident_filters() {
        let store = MemoryStore::new(snapshot());
        assert_eq!(store.count_incidents(&IncidentFilter::active()).await.unwrap(), 1);

        let by_name = store
            .incidents(&IncidentFilter {
                service_name: Some("Orders".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(by_name.len(), 2);
        assert_eq!(by_name[0].id, "i1");

        let missing = store
            .incidents(&IncidentFilter {
                service_name: Some("ghost".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(missing.is_empty());
    }

    #[tokio::test]
    async fn test_workflow_lookup_only_sees_active() {
        let store = MemoryStore::new(snapshot());
        assert!(store.find_active_workflow("deploy service").await.unwrap().is_some());
        assert!(store.find_active_workflow("legacy deploy").await.unwrap().is_none());
        assert_eq!(store.active_workflow_names().await.unwrap(), vec!["Deploy Service"]);
    }

    #[tokio::test]
    async fn test_execution_lifecycle() {
        let store = MemoryStore::new(snapshot());
        let mut execution = WorkflowExecution::pending("w1", "u1", Parameters::new());
        store.create_execution(&execution).await.unwrap();

        let in_flight = store
            .executions(&ExecutionFilter {
                statuses: vec![ExecutionStatus::Pending, ExecutionStatus::Running],
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(in_flight.len(), 1);

        execution.status = ExecutionStatus::Success;
        execution.completed_at = Some(Utc::now());
        store.update_execution(&execution).await.unwrap();

        let recent = store
            .executions(&ExecutionFilter {
                completed_since: Some(Utc::now() - Duration::hours(24)),
                order_by: ExecutionOrder::CompletedAt,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(recent[0].status, ExecutionStatus::Success);

        let ghost = WorkflowExecution::pending("w1", "u1", Parameters::new());
        assert!(matches!(
            store.update_execution(&ghost).await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn test_rebase_moves_latest_to_now() {
        let mut snap = snapshot();
        let now = Utc::now();
        snap.rebase_to(now);
        assert_eq!(snap.latest_timestamp(), Some(now));
        let gap = snap.incidents[0].detected_at - snap.incidents[1].detected_at;
        assert_eq!(gap, Duration::days(30));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", serde_json::to_string(&snapshot()).unwrap()).unwrap();
        let store = MemoryStore::from_path(file.path()).unwrap();
        assert_eq!(store.snapshot().services.len(), 3);

        let mut broken = tempfile::NamedTempFile::new().unwrap();
        write!(broken, "{{ not json").unwrap();
        assert!(matches!(
            MemoryStore::from_path(broken.path()),
            Err(StoreError::Parse(_))
        ));
    }
}

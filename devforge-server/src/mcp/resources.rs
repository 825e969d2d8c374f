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

//! Read-only MCP resources.

use crate::mcp::context::PlatformContext;
use crate::mcp::protocol::{Resource, JSON_MIME_TYPE};
use crate::mcp::tools::catalog::service_rows;
use crate::mcp::tools::workflows::triggered_by;
use chrono::{Duration, Utc};
use devforge_core::dashboard::platform_dashboard;
use devforge_core::error::StoreResult;
use devforge_core::store::{ExecutionFilter, ExecutionOrder, PlatformStore, ServiceFilter};
use devforge_core::workflow::{ExecutionStatus, WorkflowExecution};
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashMap};

pub const SERVICE_CATALOG_URI: &str = "devforge://services/catalog";
pub const METRICS_DASHBOARD_URI: &str = "devforge://metrics/dashboard";
pub const ACTIVE_WORKFLOWS_URI: &str = "devforge://workflows/active";

const ACTIVE_EXECUTION_LIMIT: usize = 50;
const RECENT_EXECUTION_LIMIT: usize = 100;

pub fn list_resources() -> Vec<Resource> {
    let resource = |uri: &str, name: &str, description: &str| Resource {
        uri: uri.to_string(),
        name: name.to_string(),
        description: Some(description.to_string()),
        mime_type: Some(JSON_MIME_TYPE.to_string()),
    };

    vec![
        resource(
            SERVICE_CATALOG_URI,
            "Service Catalog",
            "Complete service catalog with dependencies and metadata",
        ),
        resource(
            METRICS_DASHBOARD_URI,
            "Platform Metrics",
            "Real-time platform metrics and health data",
        ),
        resource(
            ACTIVE_WORKFLOWS_URI,
            "Active Workflows",
            "Currently running and recent workflow executions",
        ),
    ]
}

/// Body of the resource at `uri`, or `None` for an unknown URI.
pub async fn read_resource(context: &PlatformContext, uri: &str) -> StoreResult<Option<Value>> {
    let store = context.store.as_ref();
    let body = match uri {
        SERVICE_CATALOG_URI => service_catalog(store).await?,
        METRICS_DASHBOARD_URI => {
            let dashboard = platform_dashboard(store, context.telemetry.as_ref(), Utc::now()).await?;
            serde_json::to_value(dashboard)?
        }
        ACTIVE_WORKFLOWS_URI => active_workflows(store).await?,
        _ => return Ok(None),
    };
    Ok(Some(body))
}

async fn service_catalog(store: &dyn PlatformStore) -> StoreResult<Value> {
    let services = store.list_services(&ServiceFilter::default()).await?;
    let rows = service_rows(store, services).await?;

    let mut by_type: BTreeMap<&str, usize> = BTreeMap::new();
    let mut by_status: BTreeMap<&str, usize> = BTreeMap::new();
    for row in &rows {
        *by_type.entry(row.service.service_type.as_str()).or_default() += 1;
        *by_status.entry(row.service.status.as_str()).or_default() += 1;
    }

    let services: Vec<Value> = rows
        .iter()
        .map(|row| {
            json!({
                "id": row.service.id,
                "name": row.service.name,
                "displayName": row.service.display_name,
                "type": row.service.service_type,
                "status": row.service.status,
                "team": row.team.as_ref().map(|t| t.display_name.as_str()),
                "language": row.service.language,
                "framework": row.service.framework,
                "dependencyCount": row.dependency_count,
                "dependentCount": row.dependent_count,
                "activeIncidents": row.active_incidents,
                "healthScore": row.health_score,
            })
        })
        .collect();

    Ok(json!({
        "totalServices": rows.len(),
        "servicesByType": by_type,
        "servicesByStatus": by_status,
        "services": services,
    }))
}

/// Resolves workflow names and user display names once per id.
struct ExecutionViews<'a> {
    store: &'a dyn PlatformStore,
    workflows: HashMap<String, String>,
    users: HashMap<String, String>,
}

impl<'a> ExecutionViews<'a> {
    fn new(store: &'a dyn PlatformStore) -> Self {
        Self {
            store,
            workflows: HashMap::new(),
            users: HashMap::new(),
        }
    }

    async fn row(&mut self, execution: &WorkflowExecution, with_completion: bool) -> StoreResult<Value> {
        if !self.workflows.contains_key(&execution.workflow_id) {
            let name = self
                .store
                .find_workflow(&execution.workflow_id)
                .await?
                .map_or_else(|| execution.workflow_id.clone(), |w| w.name);
            self.workflows.insert(execution.workflow_id.clone(), name);
        }
        if !self.users.contains_key(&execution.user_id) {
            let name = triggered_by(self.store, &execution.user_id).await?;
            self.users.insert(execution.user_id.clone(), name);
        }

        let mut row = json!({
            "executionId": execution.id,
            "workflowName": self.workflows.get(&execution.workflow_id),
            "status": execution.status,
            "triggeredBy": self.users.get(&execution.user_id),
            "startedAt": execution.started_at,
            "duration": execution.duration,
        });
        if with_completion {
            row["completedAt"] = json!(execution.completed_at);
        }
        Ok(row)
    }
}

async fn active_workflows(store: &dyn PlatformStore) -> StoreResult<Value> {
    let active = store
        .executions(&ExecutionFilter {
            statuses: vec![ExecutionStatus::Pending, ExecutionStatus::Running],
            order_by: ExecutionOrder::StartedAt,
            limit: Some(ACTIVE_EXECUTION_LIMIT),
            ..Default::default()
        })
        .await?;
    let recent = store
        .executions(&ExecutionFilter {
            statuses: vec![
                ExecutionStatus::Success,
                ExecutionStatus::Failed,
                ExecutionStatus::Cancelled,
            ],
            completed_since: Some(Utc::now() - Duration::hours(24)),
            order_by: ExecutionOrder::CompletedAt,
            limit: Some(RECENT_EXECUTION_LIMIT),
        })
        .await?;

    let mut views = ExecutionViews::new(store);
    let mut active_rows = Vec::with_capacity(active.len());
    for execution in &active {
        active_rows.push(views.row(execution, false).await?);
    }
    let mut recent_rows = Vec::with_capacity(recent.len());
    for execution in &recent {
        recent_rows.push(views.row(execution, true).await?);
    }

    let succeeded = recent
        .iter()
        .filter(|e| e.status == ExecutionStatus::Success)
        .count();
    let success_rate = if recent.is_empty() {
        0.0
    } else {
        succeeded as f64 / recent.len() as f64 * 100.0
    };

    Ok(json!({
        "activeExecutions": active_rows,
        "recentExecutions": recent_rows,
        "summary": {
            "activeCount": active.len(),
            "recentCount": recent.len(),
            "successRate": success_rate,
        },
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use devforge_core::dashboard::StaticTelemetryFeed;
    use devforge_core::scoring::PlatformScorer;
    use devforge_core::store::{MemoryStore, PlatformSnapshot};
    use devforge_core::workflow::{ExecutorRegistry, NodeDelays, SimulationSettings, WorkflowRunner};
    use std::sync::Arc;

    fn context(snapshot: serde_json::Value) -> PlatformContext {
        let snapshot: PlatformSnapshot = serde_json::from_value(snapshot).unwrap();
        let settings = SimulationSettings {
            delays: NodeDelays::none(),
            test_failure_rate: 0.0,
        };
        PlatformContext::new(
            Arc::new(MemoryStore::new(snapshot)),
            Arc::new(StaticTelemetryFeed::default()),
            PlatformScorer::default(),
            WorkflowRunner::new(ExecutorRegistry::simulated(&settings)),
        )
    }

    #[test]
    fn test_resource_list() {
        let uris: Vec<String> = list_resources().into_iter().map(|r| r.uri).collect();
        assert_eq!(
            uris,
            vec![SERVICE_CATALOG_URI, METRICS_DASHBOARD_URI, ACTIVE_WORKFLOWS_URI]
        );
    }

    #[tokio::test]
    async fn test_unknown_uri_is_none() {
        let ctx = context(json!({}));
        assert!(read_resource(&ctx, "devforge://nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_catalog_groups_services() {
        let ctx = context(json!({
            "teams": [{ "id": "t1", "name": "core", "displayName": "Core Team" }],
            "services": [
                { "id": "s1", "name": "api", "displayName": "API", "type": "SERVICE", "status": "ACTIVE", "ownerId": "t1" },
                { "id": "s2", "name": "jobs", "displayName": "Jobs", "type": "QUEUE", "status": "ACTIVE", "ownerId": "t1" },
                { "id": "s3", "name": "old", "displayName": "Old", "type": "SERVICE", "status": "DEPRECATED", "ownerId": "gone" }
            ],
            "dependencies": [{ "serviceId": "s1", "dependsOnId": "s2", "type": "ASYNC" }]
        }));

        let catalog = read_resource(&ctx, SERVICE_CATALOG_URI).await.unwrap().unwrap();
        assert_eq!(catalog["totalServices"], 3);
        assert_eq!(catalog["servicesByType"]["SERVICE"], 2);
        assert_eq!(catalog["servicesByType"]["QUEUE"], 1);
        assert_eq!(catalog["servicesByStatus"]["DEPRECATED"], 1);

        let api = &catalog["services"][0];
        assert_eq!(api["name"], "api");
        assert_eq!(api["team"], "Core Team");
        assert_eq!(api["dependencyCount"], 1);
        assert_eq!(catalog["services"][1]["dependentCount"], 1);
        assert!(catalog["services"][2]["team"].is_null());
    }

    #[tokio::test]
    async fn test_active_workflows_summary() {
        let now = Utc::now();
        let at = |minutes: i64| (now - Duration::minutes(minutes)).to_rfc3339();
        let ctx = context(json!({
            "users": [{ "id": "u1", "email": "ada@example.com", "firstName": "Ada", "lastName": "Lovelace" }],
            "workflows": [{ "id": "w1", "name": "Deploy Service", "status": "ACTIVE", "definition": { "nodes": [] } }],
            "executions": [
                { "id": "e1", "workflowId": "w1", "userId": "u1", "status": "RUNNING", "startedAt": at(5) },
                { "id": "e2", "workflowId": "w1", "userId": "u1", "status": "SUCCESS", "startedAt": at(60), "completedAt": at(55) },
                { "id": "e3", "workflowId": "w1", "userId": "system", "status": "FAILED", "startedAt": at(30), "completedAt": at(29) },
                { "id": "e4", "workflowId": "w1", "userId": "u1", "status": "SUCCESS", "startedAt": at(3000), "completedAt": at(2990) }
            ]
        }));

        let body = read_resource(&ctx, ACTIVE_WORKFLOWS_URI).await.unwrap().unwrap();
        assert_eq!(body["summary"]["activeCount"], 1);
        assert_eq!(body["summary"]["recentCount"], 2);
        assert_eq!(body["summary"]["successRate"], 50.0);

        let active = &body["activeExecutions"][0];
        assert_eq!(active["workflowName"], "Deploy Service");
        assert_eq!(active["triggeredBy"], "Ada Lovelace");
        assert!(active.get("completedAt").is_none());

        // newest completion first
        assert_eq!(body["recentExecutions"][0]["executionId"], "e3");
        assert_eq!(body["recentExecutions"][0]["triggeredBy"], "system");
    }
}

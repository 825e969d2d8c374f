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

//! Service catalog tools: `get_service_info`, `list_services`,
//! `get_service_dependencies`.

use super::params::{parse_params, DependencyParams, ListServicesParams, ServiceInfoParams};
use super::registry::{McpTool, ToolContext, ToolError, ToolResult};
use super::SUGGESTION_LIMIT;
use crate::mcp::context::PlatformContext;
use async_trait::async_trait;
use chrono::{Duration, Utc};
use devforge_core::aggregate::catalog_performance;
use devforge_core::catalog::{similar_names, DependencyLink, Service, Team};
use devforge_core::error::StoreResult;
use devforge_core::graph::DependencyWalker;
use devforge_core::scoring::{service_health_score, ServiceHealthInput};
use devforge_core::store::{DeploymentFilter, IncidentFilter, MetricQuery, PlatformStore, ServiceFilter};
use serde_json::{json, Value};
use std::collections::HashMap;
use tracing::info;

const RECENT_DEPLOYMENTS: usize = 10;
const RECENT_METRIC_SAMPLES: usize = 100;

/// Catalog row with the relation counts listings need.
pub(crate) struct ServiceRow {
    pub service: Service,
    pub team: Option<Team>,
    pub dependency_count: usize,
    pub dependent_count: usize,
    pub active_incidents: usize,
    pub health_score: f64,
}

/// Resolve owners and counts for `services`. Listing scores carry no
/// deployment history.
pub(crate) async fn service_rows(
    store: &dyn PlatformStore,
    services: Vec<Service>,
) -> StoreResult<Vec<ServiceRow>> {
    let now = Utc::now();
    let mut teams: HashMap<String, Option<Team>> = HashMap::new();
    let mut rows = Vec::with_capacity(services.len());

    for service in services {
        if !teams.contains_key(&service.owner_id) {
            let team = store.find_team(&service.owner_id).await?;
            teams.insert(service.owner_id.clone(), team);
        }
        let team = teams.get(&service.owner_id).cloned().flatten();

        let active_incidents = store
            .count_incidents(&IncidentFilter {
                service_id: Some(service.id.clone()),
                ..IncidentFilter::active()
            })
            .await?;
        let health_score = service_health_score(
            &ServiceHealthInput {
                status: service.status,
                active_incidents,
                deployments: None,
            },
            now,
        );

        rows.push(ServiceRow {
            dependency_count: store.dependencies_of(&service.id).await?.len(),
            dependent_count: store.dependents_of(&service.id).await?.len(),
            active_incidents,
            health_score,
            team,
            service,
        });
    }

    Ok(rows)
}

fn link_view(link: &DependencyLink) -> Value {
    json!({
        "name": link.service.name,
        "type": link.service.service_type,
        "status": link.service.status,
        "dependencyType": link.dependency_type,
        "description": link.description,
    })
}

async fn team_view(store: &dyn PlatformStore, team: Option<Team>) -> StoreResult<Value> {
    let Some(team) = team else {
        return Ok(Value::Null);
    };

    let mut members = Vec::with_capacity(team.members.len());
    for member in &team.members {
        if let Some(user) = store.find_user(&member.user_id).await? {
            members.push(json!({
                "name": user.display_name(),
                "email": user.email,
                "role": member.role,
            }));
        }
    }

    Ok(json!({
        "name": team.name,
        "displayName": team.display_name,
        "members": members,
    }))
}

pub struct GetServiceInfoTool {
    context: PlatformContext,
    schema: Value,
}

impl GetServiceInfoTool {
    pub fn new(context: PlatformContext) -> Self {
        Self {
            context,
            schema: json!({
                "type": "object",
                "properties": {
                    "serviceName": {
                        "type": "string",
                        "description": "Name of the service to get information about"
                    }
                },
                "required": ["serviceName"]
            }),
        }
    }
}

#[async_trait]
impl McpTool for GetServiceInfoTool {
    fn name(&self) -> &str {
        "get_service_info"
    }

    fn description(&self) -> &str {
        "Get detailed information about a specific service"
    }

    fn input_schema(&self) -> &Value {
        &self.schema
    }

    async fn execute(&self, params: Value, _context: &ToolContext) -> Result<ToolResult, ToolError> {
        let params: ServiceInfoParams = parse_params(params)?;
        let store = self.context.store.as_ref();

        let Some(service) = store.find_service(&params.service_name).await? else {
            let names = store.service_names().await?;
            return ToolResult::not_found(
                format!("Service \"{}\" not found", params.service_name),
                Some(similar_names(
                    &params.service_name,
                    names.iter().map(String::as_str),
                    SUGGESTION_LIMIT,
                )),
            );
        };

        let now = Utc::now();
        let team = store.find_team(&service.owner_id).await?;
        let depends_on = store.dependencies_of(&service.id).await?;
        let dependents = store.dependents_of(&service.id).await?;
        let incidents = store
            .incidents(&IncidentFilter {
                service_id: Some(service.id.clone()),
                ..IncidentFilter::active()
            })
            .await?;
        let samples = store
            .metrics(&MetricQuery {
                service_id: service.id.clone(),
                since: now - Duration::hours(24),
                names: Vec::new(),
                limit: Some(RECENT_METRIC_SAMPLES),
            })
            .await?;
        let deployments = store
            .deployments(&DeploymentFilter {
                service_id: Some(service.id.clone()),
                limit: Some(RECENT_DEPLOYMENTS),
                ..Default::default()
            })
            .await?;

        let health_score = service_health_score(
            &ServiceHealthInput {
                status: service.status,
                active_incidents: incidents.len(),
                deployments: Some(&deployments),
            },
            now,
        );

        let info = json!({
            "basic": {
                "id": service.id,
                "name": service.name,
                "displayName": service.display_name,
                "description": service.description,
                "type": service.service_type,
                "status": service.status,
                "language": service.language,
                "framework": service.framework,
                "tags": service.tags,
            },
            "repository": {
                "url": service.repository_url,
                "branch": service.branch,
            },
            "team": team_view(store, team).await?,
            "dependencies": {
                "dependsOn": depends_on.iter().map(link_view).collect::<Vec<_>>(),
                "dependents": dependents.iter().map(link_view).collect::<Vec<_>>(),
            },
            "health": {
                "score": health_score,
                "activeIncidents": incidents.len(),
                "incidents": incidents.iter().map(|i| json!({
                    "id": i.id,
                    "title": i.title,
                    "severity": i.severity,
                    "status": i.status,
                    "detectedAt": i.detected_at,
                })).collect::<Vec<_>>(),
            },
            "performance": catalog_performance(&samples),
            "deployments": {
                "recent": deployments.iter().map(|d| json!({
                    "id": d.id,
                    "version": d.version,
                    "environment": d.environment,
                    "status": d.status,
                    "startedAt": d.started_at,
                    "completedAt": d.completed_at,
                    "duration": d.duration,
                })).collect::<Vec<_>>(),
            },
        });

        info!(service = %service.name, "Retrieved service info");
        ToolResult::json(&info)
    }
}

pub struct ListServicesTool {
    context: PlatformContext,
    schema: Value,
}

impl ListServicesTool {
    pub fn new(context: PlatformContext) -> Self {
        Self {
            context,
            schema: json!({
                "type": "object",
                "properties": {
                    "team": { "type": "string", "description": "Filter services by team" },
                    "type": {
                        "type": "string",
                        "enum": ["SERVICE", "DATABASE", "QUEUE", "API_GATEWAY", "LOAD_BALANCER"],
                        "description": "Filter services by type"
                    },
                    "status": {
                        "type": "string",
                        "enum": ["ACTIVE", "DEPRECATED", "ARCHIVED", "MAINTENANCE"],
                        "description": "Filter services by status"
                    },
                    "language": { "type": "string", "description": "Filter services by programming language" },
                    "limit": {
                        "type": "integer",
                        "description": "Maximum number of services to return (default: 50)",
                        "default": 50
                    }
                }
            }),
        }
    }
}

#[async_trait]
impl McpTool for ListServicesTool {
    fn name(&self) -> &str {
        "list_services"
    }

    fn description(&self) -> &str {
        "List all services with optional filtering"
    }

    fn input_schema(&self) -> &Value {
        &self.schema
    }

    async fn execute(&self, params: Value, _context: &ToolContext) -> Result<ToolResult, ToolError> {
        let params: ListServicesParams = parse_params(params)?;
        let store = self.context.store.as_ref();

        let services = store
            .list_services(&ServiceFilter {
                team: params.team.clone(),
                service_type: params.service_type,
                status: params.status,
                language: params.language.clone(),
                limit: Some(params.limit as usize),
            })
            .await?;
        let rows = service_rows(store, services).await?;

        let services: Vec<Value> = rows
            .into_iter()
            .map(|row| {
                json!({
                    "id": row.service.id,
                    "name": row.service.name,
                    "displayName": row.service.display_name,
                    "description": row.service.description,
                    "type": row.service.service_type,
                    "status": row.service.status,
                    "language": row.service.language,
                    "framework": row.service.framework,
                    "team": row.team.map(|t| json!({ "name": t.name, "displayName": t.display_name })),
                    "dependencyCount": row.dependency_count,
                    "dependentCount": row.dependent_count,
                    "activeIncidents": row.active_incidents,
                    "tags": row.service.tags,
                    "healthScore": row.health_score,
                })
            })
            .collect();

        info!(
            count = services.len(),
            team = ?params.team,
            service_type = ?params.service_type,
            status = ?params.status,
            language = ?params.language,
            "Listed services"
        );

        ToolResult::json(&json!({
            "totalCount": services.len(),
            "filters": {
                "team": params.team,
                "type": params.service_type,
                "status": params.status,
                "language": params.language,
            },
            "services": services,
        }))
    }
}

pub struct GetServiceDependenciesTool {
    context: PlatformContext,
    schema: Value,
}

impl GetServiceDependenciesTool {
    pub fn new(context: PlatformContext) -> Self {
        Self {
            context,
            schema: json!({
                "type": "object",
                "properties": {
                    "serviceName": { "type": "string", "description": "Name of the service" },
                    "depth": {
                        "type": "integer",
                        "description": "Depth of dependency traversal (default: 2)",
                        "default": 2
                    }
                },
                "required": ["serviceName"]
            }),
        }
    }
}

#[async_trait]
impl McpTool for GetServiceDependenciesTool {
    fn name(&self) -> &str {
        "get_service_dependencies"
    }

    fn description(&self) -> &str {
        "Get dependency graph for a service"
    }

    fn input_schema(&self) -> &Value {
        &self.schema
    }

    async fn execute(&self, params: Value, _context: &ToolContext) -> Result<ToolResult, ToolError> {
        let params: DependencyParams = parse_params(params)?;
        let graph = DependencyWalker::new(self.context.store.as_ref())
            .walk(&params.service_name, params.depth)
            .await?;

        info!(service = %params.service_name, depth = params.depth, "Built dependency graph");
        ToolResult::json(&json!({
            "rootService": params.service_name,
            "depth": params.depth,
            "graph": graph,
        }))
    }
}

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

//! Analytics tools: `get_service_metrics`, `get_incidents`,
//! `analyze_platform_health`.

use super::params::{parse_params, IncidentParams, PlatformHealthParams, ServiceMetricsParams};
use super::registry::{McpTool, ToolContext, ToolError, ToolResult};
use crate::mcp::context::PlatformContext;
use async_trait::async_trait;
use chrono::Utc;
use devforge_core::aggregate::{aggregate_metrics, performance_scores, TrendPolicy};
use devforge_core::analysis::{analyze_platform, AnalysisOptions};
use devforge_core::incident::{incident_impact, incident_summary};
use devforge_core::insights::metric_insights;
use devforge_core::store::{IncidentFilter, MetricQuery};
use serde_json::{json, Value};
use std::collections::HashMap;
use tracing::info;

pub struct GetServiceMetricsTool {
    context: PlatformContext,
    schema: Value,
}

impl GetServiceMetricsTool {
    pub fn new(context: PlatformContext) -> Self {
        Self {
            context,
            schema: json!({
                "type": "object",
                "properties": {
                    "serviceName": { "type": "string", "description": "Name of the service" },
                    "timeRange": {
                        "type": "string",
                        "enum": ["1h", "6h", "24h", "7d", "30d"],
                        "description": "Time range for metrics (default: 24h)",
                        "default": "24h"
                    },
                    "metrics": {
                        "type": "array",
                        "items": {
                            "type": "string",
                            "enum": ["response_time", "error_rate", "throughput", "cpu_usage", "memory_usage"]
                        },
                        "description": "Specific metrics to retrieve"
                    }
                },
                "required": ["serviceName"]
            }),
        }
    }
}

#[async_trait]
impl McpTool for GetServiceMetricsTool {
    fn name(&self) -> &str {
        "get_service_metrics"
    }

    fn description(&self) -> &str {
        "Get performance metrics for a service"
    }

    fn input_schema(&self) -> &Value {
        &self.schema
    }

    async fn execute(&self, params: Value, _context: &ToolContext) -> Result<ToolResult, ToolError> {
        let params: ServiceMetricsParams = parse_params(params)?;
        let store = self.context.store.as_ref();

        let Some(service) = store.find_service(&params.service_name).await? else {
            return ToolResult::not_found(
                format!("Service \"{}\" not found", params.service_name),
                None,
            );
        };

        let now = Utc::now();
        let start = params.time_range.start(now);
        let samples = store
            .metrics(&MetricQuery {
                service_id: service.id.clone(),
                since: start,
                names: params.metrics,
                limit: None,
            })
            .await?;

        let metrics = aggregate_metrics(&samples, TrendPolicy::ANALYTICS);
        let result = json!({
            "service": { "name": service.name, "id": service.id },
            "timeRange": params.time_range,
            "period": { "start": start, "end": now },
            "performance": performance_scores(&metrics),
            "insights": metric_insights(&metrics),
            "metrics": metrics,
        });

        info!(service = %service.name, samples = samples.len(), "Retrieved service metrics");
        ToolResult::json(&result)
    }
}

pub struct GetIncidentsTool {
    context: PlatformContext,
    schema: Value,
}

impl GetIncidentsTool {
    pub fn new(context: PlatformContext) -> Self {
        Self {
            context,
            schema: json!({
                "type": "object",
                "properties": {
                    "status": {
                        "type": "string",
                        "enum": ["OPEN", "INVESTIGATING", "RESOLVED", "CLOSED"],
                        "description": "Filter incidents by status"
                    },
                    "severity": {
                        "type": "string",
                        "enum": ["LOW", "MEDIUM", "HIGH", "CRITICAL"],
                        "description": "Filter incidents by severity"
                    },
                    "serviceName": { "type": "string", "description": "Filter incidents by service" },
                    "limit": {
                        "type": "integer",
                        "description": "Maximum number of incidents to return",
                        "default": 20
                    }
                }
            }),
        }
    }
}

#[async_trait]
impl McpTool for GetIncidentsTool {
    fn name(&self) -> &str {
        "get_incidents"
    }

    fn description(&self) -> &str {
        "Get current and recent incidents"
    }

    fn input_schema(&self) -> &Value {
        &self.schema
    }

    async fn execute(&self, params: Value, _context: &ToolContext) -> Result<ToolResult, ToolError> {
        let params: IncidentParams = parse_params(params)?;
        let store = self.context.store.as_ref();

        let incidents = store
            .incidents(&IncidentFilter {
                service_name: params.service_name.clone(),
                status: params.status,
                severity: params.severity,
                limit: Some(params.limit as usize),
                ..Default::default()
            })
            .await?;

        // owning service and team, resolved once per service
        let mut owners: HashMap<String, Value> = HashMap::new();
        let mut rows = Vec::with_capacity(incidents.len());
        for incident in &incidents {
            if !owners.contains_key(&incident.service_id) {
                let owner = match store.find_service_by_id(&incident.service_id).await? {
                    Some(service) => {
                        let team = store.find_team(&service.owner_id).await?;
                        json!({
                            "name": service.name,
                            "type": service.service_type,
                            "team": team.map(|t| t.display_name),
                        })
                    }
                    None => Value::Null,
                };
                owners.insert(incident.service_id.clone(), owner);
            }

            rows.push(json!({
                "id": incident.id,
                "title": incident.title,
                "description": incident.description,
                "severity": incident.severity,
                "status": incident.status,
                "service": owners.get(&incident.service_id),
                "timeline": {
                    "detectedAt": incident.detected_at,
                    "resolvedAt": incident.resolved_at,
                    "duration": incident.duration,
                },
                "impact": incident_impact(incident),
            }));
        }

        info!(
            count = incidents.len(),
            status = ?params.status,
            severity = ?params.severity,
            service = ?params.service_name,
            "Retrieved incidents"
        );

        ToolResult::json(&json!({
            "totalCount": incidents.len(),
            "filters": {
                "status": params.status,
                "severity": params.severity,
                "serviceName": params.service_name,
            },
            "incidents": rows,
            "summary": incident_summary(&incidents),
        }))
    }
}

pub struct AnalyzePlatformHealthTool {
    context: PlatformContext,
    schema: Value,
}

impl AnalyzePlatformHealthTool {
    pub fn new(context: PlatformContext) -> Self {
        Self {
            context,
            schema: json!({
                "type": "object",
                "properties": {
                    "includeRecommendations": {
                        "type": "boolean",
                        "description": "Include recommendations for low-scoring categories",
                        "default": true
                    },
                    "focusAreas": {
                        "type": "array",
                        "items": {
                            "type": "string",
                            "enum": ["security", "performance", "reliability", "cost", "compliance"]
                        },
                        "description": "Specific areas to focus the analysis on"
                    }
                }
            }),
        }
    }
}

#[async_trait]
impl McpTool for AnalyzePlatformHealthTool {
    fn name(&self) -> &str {
        "analyze_platform_health"
    }

    fn description(&self) -> &str {
        "Analyze overall platform health and provide recommendations"
    }

    fn input_schema(&self) -> &Value {
        &self.schema
    }

    async fn execute(&self, params: Value, _context: &ToolContext) -> Result<ToolResult, ToolError> {
        let params: PlatformHealthParams = parse_params(params)?;
        let options = AnalysisOptions {
            include_recommendations: params.include_recommendations,
            focus_areas: params.focus_areas,
        };

        let analysis = analyze_platform(
            self.context.store.as_ref(),
            &self.context.scorer,
            &options,
            Utc::now(),
        )
        .await?;

        info!(score = analysis.overall.score, "Platform health analysis completed");
        ToolResult::json(&analysis)
    }
}

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

//! Workflow tools: `execute_workflow`, `get_workflow_status`.

use super::params::{parse_params, ExecuteWorkflowParams, WorkflowStatusParams};
use super::registry::{McpTool, ToolContext, ToolError, ToolResult};
use super::SUGGESTION_LIMIT;
use crate::mcp::context::PlatformContext;
use async_trait::async_trait;
use devforge_core::catalog::similar_names;
use devforge_core::error::StoreResult;
use devforge_core::store::PlatformStore;
use devforge_core::workflow::WorkflowExecution;
use serde_json::{json, Value};
use tracing::info;

/// Display name of the triggering user, or the raw id for service accounts
/// such as `system`.
pub(crate) async fn triggered_by(store: &dyn PlatformStore, user_id: &str) -> StoreResult<String> {
    Ok(store
        .find_user(user_id)
        .await?
        .map(|user| user.display_name())
        .unwrap_or_else(|| user_id.to_string()))
}

pub struct ExecuteWorkflowTool {
    context: PlatformContext,
    schema: Value,
}

impl ExecuteWorkflowTool {
    pub fn new(context: PlatformContext) -> Self {
        Self {
            context,
            schema: json!({
                "type": "object",
                "properties": {
                    "workflowName": { "type": "string", "description": "Name of the workflow to execute" },
                    "parameters": {
                        "type": "object",
                        "description": "Parameters to pass to the workflow"
                    },
                    "environment": {
                        "type": "string",
                        "enum": ["DEVELOPMENT", "STAGING", "PRODUCTION"],
                        "description": "Target environment for the workflow",
                        "default": "DEVELOPMENT"
                    },
                    "userId": {
                        "type": "string",
                        "description": "User triggering the execution (default: system)",
                        "default": "system"
                    }
                },
                "required": ["workflowName"]
            }),
        }
    }
}

#[async_trait]
impl McpTool for ExecuteWorkflowTool {
    fn name(&self) -> &str {
        "execute_workflow"
    }

    fn description(&self) -> &str {
        "Execute a predefined workflow or action"
    }

    fn input_schema(&self) -> &Value {
        &self.schema
    }

    async fn execute(&self, params: Value, _context: &ToolContext) -> Result<ToolResult, ToolError> {
        let params: ExecuteWorkflowParams = parse_params(params)?;
        let store = self.context.store.as_ref();

        let Some(workflow) = store.find_active_workflow(&params.workflow_name).await? else {
            let names = store.active_workflow_names().await?;
            return ToolResult::not_found(
                format!("Workflow \"{}\" not found or not active", params.workflow_name),
                Some(similar_names(
                    &params.workflow_name,
                    names.iter().map(String::as_str),
                    SUGGESTION_LIMIT,
                )),
            );
        };

        let mut execution =
            WorkflowExecution::pending(&workflow.id, &params.user_id, params.parameters.clone());
        store.create_execution(&execution).await?;

        let outcome = self
            .context
            .runner
            .run(&workflow, params.parameters.clone(), &params.environment)
            .await;
        let status = outcome.status;
        let logs = outcome.logs.clone();
        execution.complete(outcome);
        store.update_execution(&execution).await?;

        info!(
            workflow = %params.workflow_name,
            execution_id = %execution.id,
            %status,
            "Workflow execution started: {} ({})",
            params.workflow_name,
            execution.id
        );

        ToolResult::json(&json!({
            "executionId": execution.id,
            "workflowName": params.workflow_name,
            "status": status,
            "startedAt": execution.started_at,
            "parameters": params.parameters,
            "environment": params.environment,
            "message": format!("Workflow \"{}\" execution initiated", params.workflow_name),
            "logs": logs,
        }))
    }
}

pub struct GetWorkflowStatusTool {
    context: PlatformContext,
    schema: Value,
}

impl GetWorkflowStatusTool {
    pub fn new(context: PlatformContext) -> Self {
        Self {
            context,
            schema: json!({
                "type": "object",
                "properties": {
                    "executionId": { "type": "string", "description": "ID of the workflow execution" }
                },
                "required": ["executionId"]
            }),
        }
    }
}

#[async_trait]
impl McpTool for GetWorkflowStatusTool {
    fn name(&self) -> &str {
        "get_workflow_status"
    }

    fn description(&self) -> &str {
        "Get the status and logs of a workflow execution"
    }

    fn input_schema(&self) -> &Value {
        &self.schema
    }

    async fn execute(&self, params: Value, _context: &ToolContext) -> Result<ToolResult, ToolError> {
        let params: WorkflowStatusParams = parse_params(params)?;
        let store = self.context.store.as_ref();

        let Some(execution) = store.find_execution(&params.execution_id).await? else {
            return ToolResult::not_found(
                format!("Workflow execution \"{}\" not found", params.execution_id),
                None,
            );
        };

        let workflow = store.find_workflow(&execution.workflow_id).await?;
        let status = json!({
            "executionId": execution.id,
            "workflow": {
                "name": workflow.as_ref().map_or(execution.workflow_id.as_str(), |w| w.name.as_str()),
                "description": workflow.as_ref().and_then(|w| w.description.as_deref()),
            },
            "status": execution.status,
            "triggeredBy": triggered_by(store, &execution.user_id).await?,
            "startedAt": execution.started_at,
            "completedAt": execution.completed_at,
            "duration": execution.duration,
            "input": execution.input,
            "output": execution.output,
            "logs": execution.logs,
            "error": execution.error,
            "nodeExecutions": execution.node_executions,
        });

        info!(execution_id = %params.execution_id, "Retrieved workflow status");
        ToolResult::json(&status)
    }
}

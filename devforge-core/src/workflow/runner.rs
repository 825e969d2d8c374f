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

use super::executor::{ExecutorRegistry, NodeContext};
use super::model::{ExecutionStatus, NodeExecution, Parameters, RunOutcome, Workflow};
use chrono::Utc;
use serde_json::Value;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Sequential workflow runner.
///
/// Nodes run strictly in definition order; `edges` are not consulted. A
/// failing critical node stops the run, a failing non-critical node is
/// recorded and skipped.
#[derive(Clone, Default)]
pub struct WorkflowRunner {
    executors: ExecutorRegistry,
}

impl WorkflowRunner {
    pub fn new(executors: ExecutorRegistry) -> Self {
        Self { executors }
    }

    pub async fn run(
        &self,
        workflow: &Workflow,
        mut parameters: Parameters,
        environment: &str,
    ) -> RunOutcome {
        let start = Instant::now();
        let mut logs = Vec::new();
        let mut node_executions = Vec::new();

        logs.push(format!("Starting workflow: {}", workflow.name));
        logs.push(format!("Environment: {}", environment));
        logs.push(format!(
            "Parameters: {}",
            Value::Object(parameters.clone())
        ));

        let mut error = None;
        if workflow.definition.nodes.is_empty() {
            error = Some("Workflow has no nodes defined".to_string());
        }

        for node in &workflow.definition.nodes {
            logs.push(format!("Executing node: {} ({})", node.name, node.kind));
            debug!(workflow = %workflow.name, node = %node.name, kind = %node.kind, "Executing node");

            let node_start = Instant::now();
            let started_at = Utc::now();
            let result = self
                .executors
                .executor_for(&node.kind)
                .execute(
                    node,
                    NodeContext {
                        parameters: &parameters,
                        environment,
                    },
                )
                .await;
            let completed_at = Utc::now();
            let duration = node_start.elapsed().as_millis() as u64;

            let mut record = NodeExecution {
                node_id: node.id.clone(),
                node_name: node.name.clone(),
                node_type: node.kind.to_string(),
                status: ExecutionStatus::Success,
                started_at,
                completed_at,
                duration,
                output: None,
                error: None,
            };

            match result {
                Ok(output) => {
                    record.output = Some(Value::Object(output.clone()));
                    logs.push(format!("Node completed successfully: {}", node.name));
                    parameters.extend(output);
                }
                Err(e) => {
                    let message = e.to_string();
                    record.status = ExecutionStatus::Failed;
                    record.error = Some(message.clone());
                    logs.push(format!("Node failed: {} - {}", node.name, message));
                    warn!(
                        workflow = %workflow.name,
                        node = %node.name,
                        critical = node.is_critical(),
                        error = %message,
                        "Workflow node failed"
                    );
                    if node.is_critical() {
                        error = Some(message);
                    }
                }
            }

            node_executions.push(record);
            if error.is_some() {
                break;
            }
        }

        let duration = start.elapsed().as_millis() as u64;
        let status = match &error {
            None => {
                logs.push(format!("Workflow completed successfully in {}ms", duration));
                ExecutionStatus::Success
            }
            Some(message) => {
                logs.push(format!("Workflow failed: {}", message));
                ExecutionStatus::Failed
            }
        };

        info!(
            workflow = %workflow.name,
            status = %status,
            nodes = node_executions.len(),
            duration_ms = duration,
            "Workflow run finished"
        );

        RunOutcome {
            status,
            output: parameters,
            logs,
            error,
            duration,
            node_executions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NodeError;
    use crate::workflow::executor::{NodeDelays, NodeExecutor, SimulationSettings};
    use crate::workflow::model::{NodeKind, WorkflowDefinition, WorkflowNode, WorkflowStatus};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Arc;

    fn node(id: &str, kind: NodeKind, critical: Option<bool>) -> WorkflowNode {
        WorkflowNode {
            id: id.to_string(),
            name: format!("{} node", id),
            kind,
            critical,
            config: Value::Null,
        }
    }

    fn workflow(nodes: Vec<WorkflowNode>) -> Workflow {
        Workflow {
            id: "wf-1".to_string(),
            name: "release".to_string(),
            description: None,
            status: WorkflowStatus::Active,
            definition: WorkflowDefinition {
                nodes,
                edges: vec![],
            },
        }
    }

    fn runner(test_failure_rate: f64) -> WorkflowRunner {
        WorkflowRunner::new(ExecutorRegistry::simulated(&SimulationSettings {
            delays: NodeDelays::none(),
            test_failure_rate,
        }))
    }

    #[tokio::test]
    async fn test_critical_failure_aborts() {
        let wf = workflow(vec![
            node("t", NodeKind::Test, None),
            node("n", NodeKind::Notification, None),
        ]);
        let outcome = runner(1.0).run(&wf, Parameters::new(), "DEVELOPMENT").await;

        assert_eq!(outcome.status, ExecutionStatus::Failed);
        assert_eq!(outcome.node_executions.len(), 1);
        assert_eq!(outcome.node_executions[0].status, ExecutionStatus::Failed);
        assert_eq!(outcome.error.as_deref(), Some("Tests failed"));
        assert_eq!(outcome.logs.last().unwrap(), "Workflow failed: Tests failed");
    }

    #[tokio::test]
    async fn test_non_critical_failure_continues() {
        let wf = workflow(vec![
            node("t", NodeKind::Test, Some(false)),
            node("n", NodeKind::Notification, None),
        ]);
        let outcome = runner(1.0).run(&wf, Parameters::new(), "DEVELOPMENT").await;

        assert_eq!(outcome.status, ExecutionStatus::Success);
        assert_eq!(outcome.node_executions.len(), 2);
        assert_eq!(outcome.node_executions[0].status, ExecutionStatus::Failed);
        assert_eq!(outcome.node_executions[1].status, ExecutionStatus::Success);
        assert!(outcome.error.is_none());
        assert!(outcome.logs.contains(&"Node failed: t node - Tests failed".to_string()));
        assert_eq!(outcome.output["notificationSent"], true);
    }

    #[tokio::test]
    async fn test_empty_workflow_fails() {
        let outcome = runner(0.0).run(&workflow(vec![]), Parameters::new(), "PRODUCTION").await;
        assert_eq!(outcome.status, ExecutionStatus::Failed);
        assert_eq!(outcome.error.as_deref(), Some("Workflow has no nodes defined"));
        assert!(outcome.node_executions.is_empty());
    }

    #[tokio::test]
    async fn test_outputs_merge_into_parameters() {
        let wf = workflow(vec![
            node("d", NodeKind::Deploy, None),
            node("s", NodeKind::Script, None),
        ]);
        let mut params = Parameters::new();
        params.insert("status".to_string(), json!("requested"));
        params.insert("version".to_string(), json!("1.2.3"));

        let outcome = runner(0.0).run(&wf, params, "STAGING").await;
        assert_eq!(outcome.status, ExecutionStatus::Success);
        assert_eq!(outcome.output["status"], "deployed");
        assert_eq!(outcome.output["version"], "1.2.3");
        assert_eq!(outcome.output["exitCode"], 0);
        assert_eq!(
            outcome.logs[..3],
            [
                "Starting workflow: release".to_string(),
                "Environment: STAGING".to_string(),
                "Parameters: {\"status\":\"requested\",\"version\":\"1.2.3\"}".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_custom_executor_sees_merged_parameters() {
        struct Echo;

        #[async_trait]
        impl NodeExecutor for Echo {
            async fn execute(
                &self,
                _node: &WorkflowNode,
                ctx: NodeContext<'_>,
            ) -> Result<Parameters, NodeError> {
                match ctx.parameters.get("approved") {
                    Some(Value::Bool(true)) => Ok(Parameters::new()),
                    _ => Err(NodeError::Failed("not approved".to_string())),
                }
            }
        }

        let executors = ExecutorRegistry::simulated(&SimulationSettings {
            delays: NodeDelays::none(),
            test_failure_rate: 0.0,
        })
        .register(NodeKind::Other("gate".to_string()), Arc::new(Echo));

        let wf = workflow(vec![
            node("gate-first", NodeKind::Other("gate".to_string()), Some(false)),
            node("a", NodeKind::Approval, None),
            node("gate-second", NodeKind::Other("gate".to_string()), None),
        ]);
        let outcome = WorkflowRunner::new(executors)
            .run(&wf, Parameters::new(), "DEVELOPMENT")
            .await;

        let statuses: Vec<ExecutionStatus> =
            outcome.node_executions.iter().map(|n| n.status).collect();
        assert_eq!(
            statuses,
            vec![
                ExecutionStatus::Failed,
                ExecutionStatus::Success,
                ExecutionStatus::Success
            ]
        );
        assert_eq!(outcome.status, ExecutionStatus::Success);
    }
}

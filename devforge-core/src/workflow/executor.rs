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

//! Node executors
//!
//! Every node type is handled by a [`NodeExecutor`]. The built-in executors
//! only simulate work: they sleep for a configured delay and return a mock
//! output. Real integrations register their own executor per node type.

use super::model::{NodeKind, Parameters, WorkflowNode};
use crate::error::NodeError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Simulated latency per node type, in milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeDelays {
    pub deploy_ms: u64,
    pub test_ms: u64,
    pub notification_ms: u64,
    pub approval_ms: u64,
    pub script_ms: u64,
    pub other_ms: u64,
}

impl Default for NodeDelays {
    fn default() -> Self {
        Self {
            deploy_ms: 2000,
            test_ms: 1000,
            notification_ms: 500,
            approval_ms: 1000,
            script_ms: 1500,
            other_ms: 500,
        }
    }
}

impl NodeDelays {
    pub fn none() -> Self {
        Self {
            deploy_ms: 0,
            test_ms: 0,
            notification_ms: 0,
            approval_ms: 0,
            script_ms: 0,
            other_ms: 0,
        }
    }
}

/// Settings of the simulated executors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationSettings {
    #[serde(flatten)]
    pub delays: NodeDelays,
    /// Probability in [0, 1] that a test node fails
    pub test_failure_rate: f64,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            delays: NodeDelays::default(),
            test_failure_rate: 0.1,
        }
    }
}

/// Inputs visible to a node.
#[derive(Debug, Clone, Copy)]
pub struct NodeContext<'a> {
    pub parameters: &'a Parameters,
    pub environment: &'a str,
}

#[async_trait]
pub trait NodeExecutor: Send + Sync {
    /// Run `node`, returning the object merged into the run's parameters.
    async fn execute(
        &self,
        node: &WorkflowNode,
        ctx: NodeContext<'_>,
    ) -> Result<Parameters, NodeError>;
}

async fn simulate(delay_ms: u64) {
    if delay_ms > 0 {
        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }
}

fn object(value: serde_json::Value) -> Parameters {
    match value {
        serde_json::Value::Object(map) => map,
        _ => Parameters::new(),
    }
}

pub struct DeployExecutor {
    pub delay_ms: u64,
}

#[async_trait]
impl NodeExecutor for DeployExecutor {
    async fn execute(
        &self,
        _node: &WorkflowNode,
        ctx: NodeContext<'_>,
    ) -> Result<Parameters, NodeError> {
        simulate(self.delay_ms).await;
        Ok(object(json!({
            "deploymentId": format!("deploy-{}", chrono::Utc::now().timestamp_millis()),
            "environment": ctx.environment,
            "status": "deployed",
        })))
    }
}

pub struct TestExecutor {
    pub delay_ms: u64,
    pub failure_rate: f64,
}

#[async_trait]
impl NodeExecutor for TestExecutor {
    async fn execute(
        &self,
        _node: &WorkflowNode,
        _ctx: NodeContext<'_>,
    ) -> Result<Parameters, NodeError> {
        simulate(self.delay_ms).await;
        if rand::random::<f64>() < self.failure_rate {
            return Err(NodeError::TestsFailed);
        }
        Ok(object(json!({
            "testResults": { "passed": 45, "failed": 0, "skipped": 2 },
        })))
    }
}

pub struct NotificationExecutor {
    pub delay_ms: u64,
}

#[async_trait]
impl NodeExecutor for NotificationExecutor {
    async fn execute(
        &self,
        _node: &WorkflowNode,
        _ctx: NodeContext<'_>,
    ) -> Result<Parameters, NodeError> {
        simulate(self.delay_ms).await;
        Ok(object(json!({
            "notificationSent": true,
            "recipients": ["team@example.com"],
        })))
    }
}

/// Auto-approves.
pub struct ApprovalExecutor {
    pub delay_ms: u64,
}

#[async_trait]
impl NodeExecutor for ApprovalExecutor {
    async fn execute(
        &self,
        _node: &WorkflowNode,
        _ctx: NodeContext<'_>,
    ) -> Result<Parameters, NodeError> {
        simulate(self.delay_ms).await;
        Ok(object(json!({ "approved": true, "approver": "system" })))
    }
}

pub struct ScriptExecutor {
    pub delay_ms: u64,
}

#[async_trait]
impl NodeExecutor for ScriptExecutor {
    async fn execute(
        &self,
        _node: &WorkflowNode,
        _ctx: NodeContext<'_>,
    ) -> Result<Parameters, NodeError> {
        simulate(self.delay_ms).await;
        Ok(object(json!({
            "scriptOutput": "Script executed successfully",
            "exitCode": 0,
        })))
    }
}

/// Fallback for node types without a dedicated executor.
pub struct GenericExecutor {
    pub delay_ms: u64,
}

#[async_trait]
impl NodeExecutor for GenericExecutor {
    async fn execute(
        &self,
        node: &WorkflowNode,
        _ctx: NodeContext<'_>,
    ) -> Result<Parameters, NodeError> {
        simulate(self.delay_ms).await;
        Ok(object(json!({ "nodeType": node.kind.as_str(), "executed": true })))
    }
}

/// Node executors keyed by node type.
#[derive(Clone)]
pub struct ExecutorRegistry {
    by_kind: HashMap<NodeKind, Arc<dyn NodeExecutor>>,
    fallback: Arc<dyn NodeExecutor>,
}

impl ExecutorRegistry {
    /// Registry with no dedicated executors; everything hits `fallback`.
    pub fn with_fallback(fallback: Arc<dyn NodeExecutor>) -> Self {
        Self {
            by_kind: HashMap::new(),
            fallback,
        }
    }

    /// Built-in simulated executors for every known node type.
    pub fn simulated(settings: &SimulationSettings) -> Self {
        let delays = &settings.delays;
        Self::with_fallback(Arc::new(GenericExecutor {
            delay_ms: delays.other_ms,
        }))
        .register(
            NodeKind::Deploy,
            Arc::new(DeployExecutor {
                delay_ms: delays.deploy_ms,
            }),
        )
        .register(
            NodeKind::Test,
            Arc::new(TestExecutor {
                delay_ms: delays.test_ms,
                failure_rate: settings.test_failure_rate,
            }),
        )
        .register(
            NodeKind::Notification,
            Arc::new(NotificationExecutor {
                delay_ms: delays.notification_ms,
            }),
        )
        .register(
            NodeKind::Approval,
            Arc::new(ApprovalExecutor {
                delay_ms: delays.approval_ms,
            }),
        )
        .register(
            NodeKind::Script,
            Arc::new(ScriptExecutor {
                delay_ms: delays.script_ms,
            }),
        )
    }

    pub fn register(mut self, kind: NodeKind, executor: Arc<dyn NodeExecutor>) -> Self {
        self.by_kind.insert(kind, executor);
        self
    }

    pub fn executor_for(&self, kind: &NodeKind) -> &dyn NodeExecutor {
        self.by_kind
            .get(kind)
            .map(|e| e.as_ref())
            .unwrap_or_else(|| self.fallback.as_ref())
    }
}

impl Default for ExecutorRegistry {
    fn default() -> Self {
        Self::simulated(&SimulationSettings::default())
    }
}

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

//! Workflow definitions and execution records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

pub type Parameters = Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkflowStatus {
    Active,
    Inactive,
    Draft,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutionStatus {
    Pending,
    Running,
    Success,
    Failed,
    Cancelled,
}

impl ExecutionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionStatus::Pending => "PENDING",
            ExecutionStatus::Running => "RUNNING",
            ExecutionStatus::Success => "SUCCESS",
            ExecutionStatus::Failed => "FAILED",
            ExecutionStatus::Cancelled => "CANCELLED",
        }
    }

    /// Still pending or running.
    pub fn is_in_flight(&self) -> bool {
        matches!(self, ExecutionStatus::Pending | ExecutionStatus::Running)
    }
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Node type tag. Unknown tags are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum NodeKind {
    Deploy,
    Test,
    Notification,
    Approval,
    Script,
    Other(String),
}

impl NodeKind {
    pub fn as_str(&self) -> &str {
        match self {
            NodeKind::Deploy => "deploy",
            NodeKind::Test => "test",
            NodeKind::Notification => "notification",
            NodeKind::Approval => "approval",
            NodeKind::Script => "script",
            NodeKind::Other(tag) => tag,
        }
    }
}

impl From<String> for NodeKind {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "deploy" => NodeKind::Deploy,
            "test" => NodeKind::Test,
            "notification" => NodeKind::Notification,
            "approval" => NodeKind::Approval,
            "script" => NodeKind::Script,
            _ => NodeKind::Other(tag),
        }
    }
}

impl From<NodeKind> for String {
    fn from(kind: NodeKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowNode {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    /// Absent means critical
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub critical: Option<bool>,
    #[serde(default)]
    pub config: Value,
}

impl WorkflowNode {
    pub fn is_critical(&self) -> bool {
        self.critical != Some(false)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkflowDefinition {
    #[serde(default)]
    pub nodes: Vec<WorkflowNode>,
    /// Carried for completeness; execution is strictly sequential over `nodes`
    #[serde(default)]
    pub edges: Vec<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workflow {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub status: WorkflowStatus,
    #[serde(default)]
    pub definition: WorkflowDefinition,
}

/// Outcome of one node within a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeExecution {
    pub node_id: String,
    pub node_name: String,
    pub node_type: String,
    pub status: ExecutionStatus,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    /// Milliseconds
    pub duration: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Persisted record of a workflow run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowExecution {
    pub id: String,
    pub workflow_id: String,
    pub user_id: String,
    pub status: ExecutionStatus,
    #[serde(default)]
    pub input: Parameters,
    #[serde(default)]
    pub output: Option<Parameters>,
    #[serde(default)]
    pub logs: Vec<String>,
    #[serde(default)]
    pub error: Option<String>,
    /// Milliseconds
    #[serde(default)]
    pub duration: Option<u64>,
    pub started_at: DateTime<Utc>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub node_executions: Vec<NodeExecution>,
}

impl WorkflowExecution {
    /// New PENDING record with a fresh v4 id.
    pub fn pending(workflow_id: &str, user_id: &str, input: Parameters) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            workflow_id: workflow_id.to_string(),
            user_id: user_id.to_string(),
            status: ExecutionStatus::Pending,
            input,
            output: None,
            logs: Vec::new(),
            error: None,
            duration: None,
            started_at: Utc::now(),
            completed_at: None,
            node_executions: Vec::new(),
        }
    }

    /// Record the final outcome of a run.
    pub fn complete(&mut self, outcome: RunOutcome) {
        self.status = outcome.status;
        self.output = Some(outcome.output);
        self.logs = outcome.logs;
        self.error = outcome.error;
        self.duration = Some(outcome.duration);
        if !outcome.status.is_in_flight() {
            self.completed_at = Some(Utc::now());
        }
        self.node_executions = outcome.node_executions;
    }
}

/// Result of [`WorkflowRunner::run`](super::WorkflowRunner::run).
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub status: ExecutionStatus,
    /// Parameters after merging every successful node output
    pub output: Parameters,
    pub logs: Vec<String>,
    pub error: Option<String>,
    /// Milliseconds
    pub duration: u64,
    pub node_executions: Vec<NodeExecution>,
}

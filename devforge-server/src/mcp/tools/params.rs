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

//! Typed tool arguments.
//!
//! Arguments pass the tool's JSON schema first, then deserialize into one of
//! these structs, then go through [`ToolParams::validate`].

use super::registry::ToolError;
use devforge_core::catalog::{ServiceStatus, ServiceType};
use devforge_core::error::ValidationError;
use devforge_core::graph::MAX_DEPTH;
use devforge_core::incident::{IncidentStatus, Severity};
use devforge_core::metric::TimeRange;
use devforge_core::scoring::PlatformCategory;
use devforge_core::workflow::Parameters;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

pub const MAX_LIMIT: i64 = 500;

pub trait ToolParams: DeserializeOwned {
    fn validate(&self) -> Result<(), ValidationError> {
        Ok(())
    }
}

pub fn parse_params<T: ToolParams>(params: Value) -> Result<T, ToolError> {
    let parsed: T =
        serde_json::from_value(params).map_err(|e| ToolError::InvalidParams(e.to_string()))?;
    parsed.validate()?;
    Ok(parsed)
}

fn require_name(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::EmptyField(field));
    }
    Ok(())
}

fn check_range(field: &'static str, value: i64, min: i64, max: i64) -> Result<(), ValidationError> {
    if value < min || value > max {
        return Err(ValidationError::OutOfRange {
            field,
            min,
            max,
            value,
        });
    }
    Ok(())
}

fn default_list_limit() -> i64 {
    50
}

fn default_incident_limit() -> i64 {
    20
}

fn default_depth() -> i64 {
    2
}

fn default_true() -> bool {
    true
}

fn default_environment() -> String {
    "DEVELOPMENT".to_string()
}

fn default_user_id() -> String {
    "system".to_string()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceInfoParams {
    pub service_name: String,
}

impl ToolParams for ServiceInfoParams {
    fn validate(&self) -> Result<(), ValidationError> {
        require_name("serviceName", &self.service_name)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListServicesParams {
    pub team: Option<String>,
    #[serde(rename = "type")]
    pub service_type: Option<ServiceType>,
    pub status: Option<ServiceStatus>,
    pub language: Option<String>,
    #[serde(default = "default_list_limit")]
    pub limit: i64,
}

impl ToolParams for ListServicesParams {
    fn validate(&self) -> Result<(), ValidationError> {
        check_range("limit", self.limit, 1, MAX_LIMIT)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyParams {
    pub service_name: String,
    #[serde(default = "default_depth")]
    pub depth: i64,
}

impl ToolParams for DependencyParams {
    fn validate(&self) -> Result<(), ValidationError> {
        require_name("serviceName", &self.service_name)?;
        check_range("depth", self.depth, 0, MAX_DEPTH)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceMetricsParams {
    pub service_name: String,
    #[serde(default)]
    pub time_range: TimeRange,
    /// Empty means every metric
    #[serde(default)]
    pub metrics: Vec<String>,
}

impl ToolParams for ServiceMetricsParams {
    fn validate(&self) -> Result<(), ValidationError> {
        require_name("serviceName", &self.service_name)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncidentParams {
    pub status: Option<IncidentStatus>,
    pub severity: Option<Severity>,
    pub service_name: Option<String>,
    #[serde(default = "default_incident_limit")]
    pub limit: i64,
}

impl ToolParams for IncidentParams {
    fn validate(&self) -> Result<(), ValidationError> {
        check_range("limit", self.limit, 1, MAX_LIMIT)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformHealthParams {
    #[serde(default = "default_true")]
    pub include_recommendations: bool,
    #[serde(default)]
    pub focus_areas: Vec<PlatformCategory>,
}

impl ToolParams for PlatformHealthParams {}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteWorkflowParams {
    pub workflow_name: String,
    #[serde(default)]
    pub parameters: Parameters,
    #[serde(default = "default_environment")]
    pub environment: String,
    #[serde(default = "default_user_id")]
    pub user_id: String,
}

impl ToolParams for ExecuteWorkflowParams {
    fn validate(&self) -> Result<(), ValidationError> {
        require_name("workflowName", &self.workflow_name)?;
        require_name("userId", &self.user_id)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowStatusParams {
    pub execution_id: String,
}

impl ToolParams for WorkflowStatusParams {
    fn validate(&self) -> Result<(), ValidationError> {
        require_name("executionId", &self.execution_id)
    }
}

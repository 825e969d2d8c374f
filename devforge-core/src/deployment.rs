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

//! Deployment records and success-rate statistics.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeploymentStatus {
    Pending,
    Running,
    Success,
    Failed,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deployment {
    pub id: String,
    pub service_id: String,
    pub version: String,
    pub environment: String,
    pub status: DeploymentStatus,
    pub started_at: DateTime<Utc>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    /// Milliseconds
    #[serde(default)]
    pub duration: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentStats {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    /// Percentage of successful deployments, 0 when there are none
    pub success_rate: f64,
}

impl DeploymentStats {
    pub fn from_deployments(deployments: &[Deployment]) -> Self {
        let total = deployments.len();
        let successful = count_status(deployments, DeploymentStatus::Success);
        let failed = count_status(deployments, DeploymentStatus::Failed);
        let success_rate = if total > 0 {
            successful as f64 / total as f64 * 100.0
        } else {
            0.0
        };

        Self {
            total,
            successful,
            failed,
            success_rate,
        }
    }
}

/// Deployment counts for the dashboard, including in-flight ones.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentDeployments {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    pub pending: usize,
}

impl RecentDeployments {
    pub fn from_deployments(deployments: &[Deployment]) -> Self {
        Self {
            total: deployments.len(),
            successful: count_status(deployments, DeploymentStatus::Success),
            failed: count_status(deployments, DeploymentStatus::Failed),
            pending: count_status(deployments, DeploymentStatus::Pending),
        }
    }
}

fn count_status(deployments: &[Deployment], status: DeploymentStatus) -> usize {
    deployments.iter().filter(|d| d.status == status).count()
}

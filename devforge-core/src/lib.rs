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

//! DevForge Core
//!
//! Platform intelligence for an internal developer platform: the service
//! catalog model, metric aggregation, health scoring, rule-based insights
//! and recommendations, dependency graph traversal and workflow execution.
//!
//! Persistence is abstracted by [`store::PlatformStore`]; [`store::MemoryStore`]
//! serves a JSON snapshot.

pub mod aggregate;
pub mod analysis;
pub mod catalog;
pub mod dashboard;
pub mod deployment;
pub mod error;
pub mod graph;
pub mod incident;
pub mod insights;
pub mod metric;
pub mod recommend;
pub mod scoring;
pub mod store;
pub mod workflow;

pub use aggregate::{aggregate_metrics, classify_trend, AggregatedMetric, Trend, TrendPolicy};
pub use analysis::{analyze_platform, AnalysisOptions, PlatformAnalysis};
pub use catalog::{Service, ServiceStatus, ServiceSummary, ServiceType, Team, User};
pub use dashboard::{platform_dashboard, StaticTelemetryFeed, TelemetryFeed};
pub use error::{NodeError, StoreError, StoreResult, ValidationError};
pub use graph::{DependencyNode, DependencyWalker};
pub use incident::{Incident, IncidentStatus, Severity};
pub use metric::{MetricSample, TimeRange};
pub use scoring::{
    service_health_score, CategoryScorer, HealthStatus, PlatformCategory, PlatformScorer,
};
pub use store::{MemoryStore, PlatformSnapshot, PlatformStore};
pub use workflow::{WorkflowExecution, WorkflowRunner};

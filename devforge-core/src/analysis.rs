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

//! Platform health analysis: gathers the signals from the store and runs
//! them through scoring, insights and recommendations.

use crate::deployment::DeploymentStats;
use crate::error::StoreResult;
use crate::incident::{incident_trend, IncidentTrend};
use crate::insights::{platform_insights, PlatformStatistics};
use crate::recommend::recommendations;
use crate::scoring::{
    overall_health, CategoryScores, HealthDistribution, HealthStatus, PlatformCategory,
    PlatformScorer, PlatformSignals, ServiceHealthSummary,
};
use crate::store::{DeploymentFilter, IncidentFilter, PlatformStore, ServiceFilter};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Trailing window for incident and deployment signals.
pub const ANALYSIS_WINDOW_DAYS: i64 = 7;

#[derive(Debug, Clone, Default)]
pub struct AnalysisOptions {
    pub include_recommendations: bool,
    /// Restricts recommendations; empty means all categories
    pub focus_areas: Vec<PlatformCategory>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverallSection {
    pub score: f64,
    pub status: HealthStatus,
    pub last_updated: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendSection {
    pub incidents: IncidentTrend,
    pub deployments: DeploymentStats,
    pub services: HealthDistribution,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformAnalysis {
    pub overall: OverallSection,
    pub categories: CategoryScores,
    pub statistics: PlatformStatistics,
    pub trends: TrendSection,
    /// Absent when recommendations were not requested
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommendations: Option<Vec<String>>,
    pub insights: Vec<String>,
}

pub async fn platform_statistics(store: &dyn PlatformStore) -> StoreResult<PlatformStatistics> {
    Ok(PlatformStatistics {
        services: store.count_services(None).await?,
        teams: store.count_teams().await?,
        users: store.count_users().await?,
    })
}

/// Score every service from its active incident count and status.
pub async fn service_health(
    store: &dyn PlatformStore,
    now: DateTime<Utc>,
) -> StoreResult<ServiceHealthSummary> {
    let services = store.list_services(&ServiceFilter::default()).await?;
    let mut rows = Vec::with_capacity(services.len());
    for service in &services {
        let active = store
            .count_incidents(&IncidentFilter {
                service_id: Some(service.id.clone()),
                ..IncidentFilter::active()
            })
            .await?;
        rows.push((service, active));
    }
    Ok(ServiceHealthSummary::from_services(rows, now))
}

pub async fn analyze_platform(
    store: &dyn PlatformStore,
    scorer: &PlatformScorer,
    options: &AnalysisOptions,
    now: DateTime<Utc>,
) -> StoreResult<PlatformAnalysis> {
    let since = now - Duration::days(ANALYSIS_WINDOW_DAYS);

    let statistics = platform_statistics(store).await?;
    let services = service_health(store, now).await?;
    let recent_incidents = store
        .incidents(&IncidentFilter {
            detected_since: Some(since),
            ..Default::default()
        })
        .await?;
    let deployments = DeploymentStats::from_deployments(
        &store
            .deployments(&DeploymentFilter {
                started_since: Some(since),
                ..Default::default()
            })
            .await?,
    );

    let categories = scorer.score(&PlatformSignals {
        services: &services,
        recent_incidents: &recent_incidents,
        deployments: &deployments,
    });
    let overall = overall_health(&categories);
    debug!(score = overall.score, status = ?overall.status, "Platform scored");

    let recommendations = options
        .include_recommendations
        .then(|| recommendations(&categories, &options.focus_areas));
    let insights = platform_insights(&categories, &statistics);

    Ok(PlatformAnalysis {
        overall: OverallSection {
            score: overall.score,
            status: overall.status,
            last_updated: now,
        },
        trends: TrendSection {
            incidents: incident_trend(&recent_incidents),
            deployments,
            services: services.summary,
        },
        categories,
        statistics,
        recommendations,
        insights,
    })
}

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

//! Dashboard feed
//!
//! Platform-wide runtime metrics and active alerts come from a monitoring
//! system outside the platform database, reached through [`TelemetryFeed`].
//! [`StaticTelemetryFeed`] serves configured values.

use crate::catalog::ServiceStatus;
use crate::deployment::RecentDeployments;
use crate::error::StoreResult;
use crate::incident::Severity;
use crate::store::{DeploymentFilter, IncidentFilter, PlatformStore};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformMetrics {
    /// Milliseconds
    pub avg_response_time: f64,
    /// Percent
    pub error_rate: f64,
    /// Percent
    pub uptime: f64,
    /// Requests per second
    pub throughput: f64,
}

impl Default for PlatformMetrics {
    fn default() -> Self {
        Self {
            avg_response_time: 125.0,
            error_rate: 0.15,
            uptime: 99.95,
            throughput: 1250.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub id: String,
    pub severity: String,
    pub message: String,
    pub service: String,
    pub triggered_at: DateTime<Utc>,
}

#[async_trait]
pub trait TelemetryFeed: Send + Sync {
    async fn platform_metrics(&self) -> StoreResult<PlatformMetrics>;

    async fn active_alerts(&self) -> StoreResult<Vec<Alert>>;
}

/// Alert template with a trigger time relative to the request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaticAlert {
    pub id: String,
    pub severity: String,
    pub message: String,
    pub service: String,
    pub minutes_ago: i64,
}

/// Configured telemetry values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StaticTelemetry {
    pub metrics: PlatformMetrics,
    pub alerts: Vec<StaticAlert>,
}

impl Default for StaticTelemetry {
    fn default() -> Self {
        Self {
            metrics: PlatformMetrics::default(),
            alerts: vec![
                StaticAlert {
                    id: "alert-1".to_string(),
                    severity: "WARNING".to_string(),
                    message: "High CPU usage on user-service".to_string(),
                    service: "user-service".to_string(),
                    minutes_ago: 5,
                },
                StaticAlert {
                    id: "alert-2".to_string(),
                    severity: "CRITICAL".to_string(),
                    message: "Database connection pool exhausted".to_string(),
                    service: "database".to_string(),
                    minutes_ago: 2,
                },
            ],
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct StaticTelemetryFeed {
    telemetry: StaticTelemetry,
}

impl StaticTelemetryFeed {
    pub fn new(telemetry: StaticTelemetry) -> Self {
        Self { telemetry }
    }
}

#[async_trait]
impl TelemetryFeed for StaticTelemetryFeed {
    async fn platform_metrics(&self) -> StoreResult<PlatformMetrics> {
        Ok(self.telemetry.metrics.clone())
    }

    async fn active_alerts(&self) -> StoreResult<Vec<Alert>> {
        let now = Utc::now();
        Ok(self
            .telemetry
            .alerts
            .iter()
            .map(|a| Alert {
                id: a.id.clone(),
                severity: a.severity.clone(),
                message: a.message.clone(),
                service: a.service.clone(),
                triggered_at: now - Duration::minutes(a.minutes_ago),
            })
            .collect())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceCounts {
    pub total: usize,
    pub active: usize,
    pub deprecated: usize,
}

/// Active (OPEN or INVESTIGATING) incident counts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveIncidentCounts {
    pub total: usize,
    pub critical: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dashboard {
    pub timestamp: DateTime<Utc>,
    pub services: ServiceCounts,
    pub incidents: ActiveIncidentCounts,
    /// Last 24 hours
    pub deployments: RecentDeployments,
    pub performance: PlatformMetrics,
    pub alerts: Vec<Alert>,
}

async fn service_counts(store: &dyn PlatformStore) -> StoreResult<ServiceCounts> {
    Ok(ServiceCounts {
        total: store.count_services(None).await?,
        active: store.count_services(Some(ServiceStatus::Active)).await?,
        deprecated: store.count_services(Some(ServiceStatus::Deprecated)).await?,
    })
}

async fn active_incident_counts(store: &dyn PlatformStore) -> StoreResult<ActiveIncidentCounts> {
    Ok(ActiveIncidentCounts {
        total: store.count_incidents(&IncidentFilter::active()).await?,
        critical: store
            .count_incidents(&IncidentFilter {
                severity: Some(Severity::Critical),
                ..IncidentFilter::active()
            })
            .await?,
    })
}

async fn recent_deployments(
    store: &dyn PlatformStore,
    now: DateTime<Utc>,
) -> StoreResult<RecentDeployments> {
    let deployments = store
        .deployments(&DeploymentFilter {
            started_since: Some(now - Duration::hours(24)),
            ..Default::default()
        })
        .await?;
    Ok(RecentDeployments::from_deployments(&deployments))
}

/// Collect the dashboard sections concurrently.
pub async fn platform_dashboard(
    store: &dyn PlatformStore,
    feed: &dyn TelemetryFeed,
    now: DateTime<Utc>,
) -> StoreResult<Dashboard> {
    let (services, incidents, deployments, performance) = futures::try_join!(
        service_counts(store),
        active_incident_counts(store),
        recent_deployments(store, now),
        feed.platform_metrics(),
    )?;
    let alerts = feed.active_alerts().await?;

    Ok(Dashboard {
        timestamp: now,
        services,
        incidents,
        deployments,
        performance,
        alerts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, PlatformSnapshot};
    use serde_json::json;

    #[tokio::test]
    async fn test_static_feed_alerts_are_relative_to_now() {
        let feed = StaticTelemetryFeed::default();
        let alerts = feed.active_alerts().await.unwrap();
        assert_eq!(alerts.len(), 2);
        assert!(alerts[0].triggered_at < alerts[1].triggered_at);
        assert_eq!(feed.platform_metrics().await.unwrap().uptime, 99.95);
    }

    #[tokio::test]
    async fn test_dashboard_counts() {
        let now = Utc::now();
        let recent = (now - Duration::hours(2)).to_rfc3339();
        let stale = (now - Duration::days(3)).to_rfc3339();
        let snapshot: PlatformSnapshot = serde_json::from_value(json!({
            "services": [
                { "id": "s1", "name": "a", "displayName": "A", "type": "SERVICE", "status": "ACTIVE", "ownerId": "t" },
                { "id": "s2", "name": "b", "displayName": "B", "type": "QUEUE", "status": "DEPRECATED", "ownerId": "t" },
                { "id": "s3", "name": "c", "displayName": "C", "type": "QUEUE", "status": "ARCHIVED", "ownerId": "t" }
            ],
            "incidents": [
                { "id": "i1", "serviceId": "s1", "title": "x", "severity": "CRITICAL", "status": "OPEN", "detectedAt": recent },
                { "id": "i2", "serviceId": "s1", "title": "y", "severity": "LOW", "status": "INVESTIGATING", "detectedAt": recent },
                { "id": "i3", "serviceId": "s1", "title": "z", "severity": "CRITICAL", "status": "RESOLVED", "detectedAt": recent }
            ],
            "deployments": [
                { "id": "d1", "serviceId": "s1", "version": "1", "environment": "PRODUCTION", "status": "PENDING", "startedAt": recent },
                { "id": "d2", "serviceId": "s1", "version": "0", "environment": "PRODUCTION", "status": "SUCCESS", "startedAt": stale }
            ]
        }))
        .unwrap();
        let store = MemoryStore::new(snapshot);

        let dashboard = platform_dashboard(&store, &StaticTelemetryFeed::default(), now)
            .await
            .unwrap();
        assert_eq!(
            dashboard.services,
            ServiceCounts {
                total: 3,
                active: 1,
                deprecated: 1
            }
        );
        assert_eq!(
            dashboard.incidents,
            ActiveIncidentCounts {
                total: 2,
                critical: 1
            }
        );
        assert_eq!(dashboard.deployments.total, 1);
        assert_eq!(dashboard.deployments.pending, 1);
    }
}

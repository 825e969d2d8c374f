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

//! Health scoring
//!
//! Service score:
//!
//! ```text
//! 100 - 20 * active_incidents
//!     - 30 if DEPRECATED, 15 if MAINTENANCE
//!     - 10 if the latest supplied deployment is older than 30 days
//! clamped to [0, 100]
//! ```
//!
//! Platform score: mean of five category scores (security, performance,
//! reliability, cost, compliance). Each category is produced by a
//! [`CategoryScorer`]; cost and compliance have no real signal yet and
//! default to [`FixedScorer`] placeholders supplied by configuration.

use crate::aggregate::mean;
use crate::catalog::{Service, ServiceStatus};
use crate::deployment::{Deployment, DeploymentStats};
use crate::incident::Incident;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

pub const MAX_SCORE: f64 = 100.0;

const INCIDENT_PENALTY: f64 = 20.0;
const DEPRECATED_PENALTY: f64 = 30.0;
const MAINTENANCE_PENALTY: f64 = 15.0;
const STALE_DEPLOY_PENALTY: f64 = 10.0;
const STALE_DEPLOY_DAYS: i64 = 30;
const SECURITY_INCIDENT_PENALTY: f64 = 10.0;

pub fn clamp_score(score: f64) -> f64 {
    score.clamp(0.0, MAX_SCORE)
}

/// Signals feeding a single service's score.
#[derive(Debug, Clone, Copy)]
pub struct ServiceHealthInput<'a> {
    pub status: ServiceStatus,
    pub active_incidents: usize,
    /// Deployment history, when the caller fetched it. `None` skips the
    /// staleness check entirely.
    pub deployments: Option<&'a [Deployment]>,
}

pub fn service_health_score(input: &ServiceHealthInput<'_>, now: DateTime<Utc>) -> f64 {
    let mut score = MAX_SCORE;

    score -= input.active_incidents as f64 * INCIDENT_PENALTY;

    match input.status {
        ServiceStatus::Deprecated => score -= DEPRECATED_PENALTY,
        ServiceStatus::Maintenance => score -= MAINTENANCE_PENALTY,
        ServiceStatus::Active | ServiceStatus::Archived => {}
    }

    let latest = input
        .deployments
        .and_then(|history| history.iter().map(|d| d.started_at).max());
    if let Some(latest) = latest {
        if now - latest > Duration::days(STALE_DEPLOY_DAYS) {
            score -= STALE_DEPLOY_PENALTY;
        }
    }

    clamp_score(score)
}

/// Five-level status of an overall score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Excellent,
    Good,
    Fair,
    Poor,
    Critical,
}

impl HealthStatus {
    pub fn from_score(score: f64) -> Self {
        if score >= 90.0 {
            HealthStatus::Excellent
        } else if score >= 80.0 {
            HealthStatus::Good
        } else if score >= 70.0 {
            HealthStatus::Fair
        } else if score >= 60.0 {
            HealthStatus::Poor
        } else {
            HealthStatus::Critical
        }
    }
}

/// Coarse status reported next to each category score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryStatus {
    Good,
    Warning,
    Critical,
}

/// Strict lower bounds for `good` and `warning`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatusBands {
    pub good_above: f64,
    pub warning_above: f64,
}

impl StatusBands {
    pub const DEFAULT: StatusBands = StatusBands {
        good_above: 80.0,
        warning_above: 60.0,
    };

    pub const RELIABILITY: StatusBands = StatusBands {
        good_above: 95.0,
        warning_above: 85.0,
    };

    pub fn classify(&self, score: f64) -> CategoryStatus {
        if score > self.good_above {
            CategoryStatus::Good
        } else if score > self.warning_above {
            CategoryStatus::Warning
        } else {
            CategoryStatus::Critical
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlatformCategory {
    Security,
    Performance,
    Reliability,
    Cost,
    Compliance,
}

impl PlatformCategory {
    pub const ALL: [PlatformCategory; 5] = [
        PlatformCategory::Security,
        PlatformCategory::Performance,
        PlatformCategory::Reliability,
        PlatformCategory::Cost,
        PlatformCategory::Compliance,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PlatformCategory::Security => "security",
            PlatformCategory::Performance => "performance",
            PlatformCategory::Reliability => "reliability",
            PlatformCategory::Cost => "cost",
            PlatformCategory::Compliance => "compliance",
        }
    }
}

impl fmt::Display for PlatformCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Score row for one service in the platform analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceHealth {
    pub name: String,
    pub score: f64,
    pub status: ServiceStatus,
    pub active_incidents: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HealthDistribution {
    pub average: f64,
    /// score > 80
    pub healthy: usize,
    /// 60 <= score <= 80
    pub warning: usize,
    /// score < 60
    pub critical: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceHealthSummary {
    pub services: Vec<ServiceHealth>,
    pub summary: HealthDistribution,
}

impl ServiceHealthSummary {
    /// Score every service from its active incident count and status.
    /// Deployment history is not consulted here.
    pub fn from_services<'a, I>(services: I, now: DateTime<Utc>) -> Self
    where
        I: IntoIterator<Item = (&'a Service, usize)>,
    {
        let rows: Vec<ServiceHealth> = services
            .into_iter()
            .map(|(service, active_incidents)| ServiceHealth {
                name: service.name.clone(),
                score: service_health_score(
                    &ServiceHealthInput {
                        status: service.status,
                        active_incidents,
                        deployments: None,
                    },
                    now,
                ),
                status: service.status,
                active_incidents,
            })
            .collect();

        let scores: Vec<f64> = rows.iter().map(|r| r.score).collect();
        let summary = HealthDistribution {
            average: mean(&scores),
            healthy: scores.iter().filter(|s| **s > 80.0).count(),
            warning: scores
                .iter()
                .filter(|s| **s >= 60.0 && **s <= 80.0)
                .count(),
            critical: scores.iter().filter(|s| **s < 60.0).count(),
        };

        Self {
            services: rows,
            summary,
        }
    }
}

/// Everything a category scorer may look at.
#[derive(Debug, Clone, Copy)]
pub struct PlatformSignals<'a> {
    pub services: &'a ServiceHealthSummary,
    /// Incidents detected in the trailing analysis window
    pub recent_incidents: &'a [Incident],
    /// Deployments started in the trailing analysis window
    pub deployments: &'a DeploymentStats,
}

/// Pluggable scorer for one platform category.
pub trait CategoryScorer: Send + Sync {
    /// Raw score; the caller clamps it to [0, 100].
    fn score(&self, signals: &PlatformSignals<'_>) -> f64;

    fn bands(&self) -> StatusBands {
        StatusBands::DEFAULT
    }
}

/// 100 minus 10 per recent incident with "security" in its title.
pub struct SecurityScorer;

impl CategoryScorer for SecurityScorer {
    fn score(&self, signals: &PlatformSignals<'_>) -> f64 {
        let hits = signals
            .recent_incidents
            .iter()
            .filter(|i| i.title.to_lowercase().contains("security"))
            .count();
        MAX_SCORE - hits as f64 * SECURITY_INCIDENT_PENALTY
    }
}

/// Mean of the per-service scores.
pub struct PerformanceScorer;

impl CategoryScorer for PerformanceScorer {
    fn score(&self, signals: &PlatformSignals<'_>) -> f64 {
        signals.services.summary.average
    }
}

/// Deployment success rate in the trailing window.
pub struct ReliabilityScorer;

impl CategoryScorer for ReliabilityScorer {
    fn score(&self, signals: &PlatformSignals<'_>) -> f64 {
        signals.deployments.success_rate
    }

    fn bands(&self) -> StatusBands {
        StatusBands::RELIABILITY
    }
}

/// Constant placeholder for categories without a data source.
pub struct FixedScorer(pub f64);

impl CategoryScorer for FixedScorer {
    fn score(&self, _signals: &PlatformSignals<'_>) -> f64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CategoryScore {
    pub score: f64,
    pub status: CategoryStatus,
}

pub type CategoryScores = BTreeMap<PlatformCategory, CategoryScore>;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OverallHealth {
    pub score: f64,
    pub status: HealthStatus,
}

/// Mean of all category scores, with its status.
pub fn overall_health(categories: &CategoryScores) -> OverallHealth {
    let scores: Vec<f64> = categories.values().map(|c| c.score).collect();
    let score = mean(&scores);
    OverallHealth {
        score,
        status: HealthStatus::from_score(score),
    }
}

/// Category scorer table.
#[derive(Clone)]
pub struct PlatformScorer {
    scorers: BTreeMap<PlatformCategory, Arc<dyn CategoryScorer>>,
}

impl PlatformScorer {
    /// Built-in scorers, with fixed placeholders for cost and compliance.
    pub fn new(cost_placeholder: f64, compliance_placeholder: f64) -> Self {
        let mut scorers: BTreeMap<PlatformCategory, Arc<dyn CategoryScorer>> = BTreeMap::new();
        scorers.insert(PlatformCategory::Security, Arc::new(SecurityScorer));
        scorers.insert(PlatformCategory::Performance, Arc::new(PerformanceScorer));
        scorers.insert(PlatformCategory::Reliability, Arc::new(ReliabilityScorer));
        scorers.insert(PlatformCategory::Cost, Arc::new(FixedScorer(cost_placeholder)));
        scorers.insert(
            PlatformCategory::Compliance,
            Arc::new(FixedScorer(compliance_placeholder)),
        );
        Self { scorers }
    }

    /// Replace the scorer of one category.
    pub fn with_scorer(mut self, category: PlatformCategory, scorer: Arc<dyn CategoryScorer>) -> Self {
        self.scorers.insert(category, scorer);
        self
    }

    pub fn score(&self, signals: &PlatformSignals<'_>) -> CategoryScores {
        self.scorers
            .iter()
            .map(|(category, scorer)| {
                let score = clamp_score(scorer.score(signals));
                (
                    *category,
                    CategoryScore {
                        score,
                        status: scorer.bands().classify(score),
                    },
                )
            })
            .collect()
    }
}

impl Default for PlatformScorer {
    fn default() -> Self {
        Self::new(85.0, 90.0)
    }
}

impl fmt::Debug for PlatformScorer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlatformScorer")
            .field("categories", &self.scorers.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ServiceType;
    use crate::deployment::tests::deployment;
    use crate::deployment::DeploymentStatus;
    use crate::incident::tests::incident;
    use crate::incident::{IncidentStatus, Severity};
    use proptest::prelude::*;

    fn input(status: ServiceStatus, active_incidents: usize) -> ServiceHealthInput<'static> {
        ServiceHealthInput {
            status,
            active_incidents,
            deployments: None,
        }
    }

    fn service(name: &str, status: ServiceStatus) -> Service {
        Service {
            id: format!("id-{}", name),
            name: name.to_string(),
            display_name: name.to_string(),
            description: None,
            service_type: ServiceType::Service,
            status,
            language: vec![],
            framework: None,
            tags: vec![],
            owner_id: "team-1".to_string(),
            repository_url: None,
            branch: None,
        }
    }

    #[test]
    fn test_service_score_deductions() {
        let now = Utc::now();
        assert_eq!(service_health_score(&input(ServiceStatus::Active, 0), now), 100.0);
        assert_eq!(service_health_score(&input(ServiceStatus::Active, 2), now), 60.0);
        assert_eq!(service_health_score(&input(ServiceStatus::Deprecated, 1), now), 50.0);
        assert_eq!(service_health_score(&input(ServiceStatus::Maintenance, 0), now), 85.0);
    }

    #[test]
    fn test_service_score_clamps_at_zero() {
        let now = Utc::now();
        assert_eq!(service_health_score(&input(ServiceStatus::Active, 10), now), 0.0);
    }

    #[test]
    fn test_stale_deployment_penalty_only_with_history() {
        let now = Utc::now();
        let old = vec![
            deployment("a", DeploymentStatus::Success, now - Duration::days(45)),
            deployment("b", DeploymentStatus::Success, now - Duration::days(60)),
        ];
        let fresh = vec![
            deployment("a", DeploymentStatus::Success, now - Duration::days(45)),
            deployment("c", DeploymentStatus::Failed, now - Duration::days(2)),
        ];

        let mut with_old = input(ServiceStatus::Active, 0);
        with_old.deployments = Some(&old);
        assert_eq!(service_health_score(&with_old, now), 90.0);

        let mut with_fresh = input(ServiceStatus::Active, 0);
        with_fresh.deployments = Some(&fresh);
        assert_eq!(service_health_score(&with_fresh, now), 100.0);

        let mut with_empty = input(ServiceStatus::Active, 0);
        with_empty.deployments = Some(&[]);
        assert_eq!(service_health_score(&with_empty, now), 100.0);
    }

    #[test]
    fn test_health_status_thresholds() {
        assert_eq!(HealthStatus::from_score(90.0), HealthStatus::Excellent);
        assert_eq!(HealthStatus::from_score(89.9), HealthStatus::Good);
        assert_eq!(HealthStatus::from_score(70.0), HealthStatus::Fair);
        assert_eq!(HealthStatus::from_score(60.0), HealthStatus::Poor);
        assert_eq!(HealthStatus::from_score(59.9), HealthStatus::Critical);
    }

    #[test]
    fn test_status_bands_are_strict() {
        assert_eq!(StatusBands::DEFAULT.classify(80.0), CategoryStatus::Warning);
        assert_eq!(StatusBands::DEFAULT.classify(80.5), CategoryStatus::Good);
        assert_eq!(StatusBands::RELIABILITY.classify(90.0), CategoryStatus::Warning);
        assert_eq!(StatusBands::RELIABILITY.classify(85.0), CategoryStatus::Critical);
    }

    #[test]
    fn test_service_health_summary_buckets() {
        let now = Utc::now();
        let a = service("a", ServiceStatus::Active);
        let b = service("b", ServiceStatus::Active);
        let c = service("c", ServiceStatus::Deprecated);
        let summary = ServiceHealthSummary::from_services([(&a, 0), (&b, 1), (&c, 1)], now);

        assert_eq!(summary.services.len(), 3);
        assert_eq!(summary.summary.healthy, 1);
        assert_eq!(summary.summary.warning, 1);
        assert_eq!(summary.summary.critical, 1);
        assert!((summary.summary.average - (100.0 + 80.0 + 50.0) / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_platform_scores_and_overall() {
        let now = Utc::now();
        let a = service("a", ServiceStatus::Active);
        let services = ServiceHealthSummary::from_services([(&a, 1)], now);
        let incidents = vec![
            incident("1", "Security breach in auth", Severity::High, IncidentStatus::Open, now),
            incident("2", "SECURITY scan failed", Severity::Low, IncidentStatus::Closed, now),
            incident("3", "disk full", Severity::Low, IncidentStatus::Open, now),
        ];
        let deployments = DeploymentStats {
            total: 10,
            successful: 9,
            failed: 1,
            success_rate: 90.0,
        };

        let categories = PlatformScorer::default().score(&PlatformSignals {
            services: &services,
            recent_incidents: &incidents,
            deployments: &deployments,
        });

        assert_eq!(categories[&PlatformCategory::Security].score, 80.0);
        assert_eq!(categories[&PlatformCategory::Performance].score, 80.0);
        assert_eq!(categories[&PlatformCategory::Reliability].score, 90.0);
        assert_eq!(
            categories[&PlatformCategory::Reliability].status,
            CategoryStatus::Warning
        );
        assert_eq!(categories[&PlatformCategory::Cost].score, 85.0);
        assert_eq!(categories[&PlatformCategory::Compliance].score, 90.0);

        let overall = overall_health(&categories);
        assert_eq!(overall.score, 85.0);
        assert_eq!(overall.status, HealthStatus::Good);
    }

    #[test]
    fn test_scorer_override_is_clamped() {
        struct Wild;
        impl CategoryScorer for Wild {
            fn score(&self, _signals: &PlatformSignals<'_>) -> f64 {
                250.0
            }
        }

        let services = ServiceHealthSummary::default();
        let deployments = DeploymentStats::default();
        let categories = PlatformScorer::new(10.0, 20.0)
            .with_scorer(PlatformCategory::Cost, Arc::new(Wild))
            .score(&PlatformSignals {
                services: &services,
                recent_incidents: &[],
                deployments: &deployments,
            });
        assert_eq!(categories[&PlatformCategory::Cost].score, 100.0);
        assert_eq!(categories[&PlatformCategory::Compliance].score, 20.0);
        assert_eq!(categories[&PlatformCategory::Security].score, 100.0);
    }

    #[test]
    fn test_category_keys_serialize_in_declared_order() {
        let services = ServiceHealthSummary::default();
        let deployments = DeploymentStats::default();
        let categories = PlatformScorer::default().score(&PlatformSignals {
            services: &services,
            recent_incidents: &[],
            deployments: &deployments,
        });
        let text = serde_json::to_string(&categories).unwrap();
        let positions: Vec<usize> = PlatformCategory::ALL
            .iter()
            .map(|c| text.find(&format!("\"{}\":", c)).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]), "{}", text);

        let json: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(json["reliability"]["status"], "critical");
    }

    proptest! {
        #[test]
        fn prop_service_score_in_range(incidents in 0usize..50, status_idx in 0usize..4, age_days in 0i64..400) {
            let status = [
                ServiceStatus::Active,
                ServiceStatus::Deprecated,
                ServiceStatus::Archived,
                ServiceStatus::Maintenance,
            ][status_idx];
            let now = Utc::now();
            let history = vec![deployment("d", DeploymentStatus::Success, now - Duration::days(age_days))];
            let score = service_health_score(
                &ServiceHealthInput { status, active_incidents: incidents, deployments: Some(&history) },
                now,
            );
            prop_assert!((0.0..=100.0).contains(&score));
        }
    }
}

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

//! Incident records and incident analytics (impact, summary, daily trend).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

const MS_PER_MINUTE: f64 = 60_000.0;
const MS_PER_HOUR: f64 = 3_600_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "LOW",
            Severity::Medium => "MEDIUM",
            Severity::High => "HIGH",
            Severity::Critical => "CRITICAL",
        }
    }

    fn impact_points(&self) -> f64 {
        match self {
            Severity::Low => 1.0,
            Severity::Medium => 2.0,
            Severity::High => 3.0,
            Severity::Critical => 4.0,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IncidentStatus {
    Open,
    Investigating,
    Resolved,
    Closed,
}

impl IncidentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            IncidentStatus::Open => "OPEN",
            IncidentStatus::Investigating => "INVESTIGATING",
            IncidentStatus::Resolved => "RESOLVED",
            IncidentStatus::Closed => "CLOSED",
        }
    }

    /// Open or under investigation.
    pub fn is_active(&self) -> bool {
        matches!(self, IncidentStatus::Open | IncidentStatus::Investigating)
    }
}

impl fmt::Display for IncidentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Incident {
    pub id: String,
    pub service_id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub severity: Severity,
    pub status: IncidentStatus,
    pub detected_at: DateTime<Utc>,
    #[serde(default)]
    pub resolved_at: Option<DateTime<Utc>>,
    /// Time to resolution in milliseconds
    #[serde(default)]
    pub duration: Option<u64>,
}

impl Incident {
    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImpactLevel {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncidentImpact {
    pub score: u32,
    pub level: ImpactLevel,
}

/// Severity points plus up to 10 points for duration (one point per two hours).
pub fn incident_impact(incident: &Incident) -> IncidentImpact {
    let mut impact = incident.severity.impact_points();
    if let Some(duration) = incident.duration.filter(|d| *d > 0) {
        let hours = duration as f64 / MS_PER_HOUR;
        impact += (hours / 2.0).min(10.0);
    }

    let level = if impact < 3.0 {
        ImpactLevel::Low
    } else if impact < 6.0 {
        ImpactLevel::Medium
    } else {
        ImpactLevel::High
    };

    IncidentImpact {
        score: impact.round() as u32,
        level,
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncidentSummary {
    pub total: usize,
    pub by_severity: BTreeMap<String, usize>,
    pub by_status: BTreeMap<String, usize>,
    /// Mean time to resolution in whole minutes
    pub avg_resolution_time: u64,
    pub active_count: usize,
}

pub fn incident_summary(incidents: &[Incident]) -> IncidentSummary {
    let mut summary = IncidentSummary {
        total: incidents.len(),
        ..Default::default()
    };

    for incident in incidents {
        *summary
            .by_severity
            .entry(incident.severity.to_string())
            .or_insert(0) += 1;
        *summary
            .by_status
            .entry(incident.status.to_string())
            .or_insert(0) += 1;
        if incident.is_active() {
            summary.active_count += 1;
        }
    }

    let durations: Vec<u64> = incidents
        .iter()
        .filter_map(|i| i.duration)
        .filter(|d| *d > 0)
        .collect();
    if !durations.is_empty() {
        let total: f64 = durations.iter().map(|d| *d as f64).sum();
        summary.avg_resolution_time =
            (total / durations.len() as f64 / MS_PER_MINUTE).round() as u64;
    }

    summary
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PeakDay {
    pub day: String,
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncidentTrend {
    pub total_incidents: usize,
    pub avg_per_day: f64,
    pub peak_day: PeakDay,
}

/// Group incidents by UTC calendar day of detection.
///
/// `avg_per_day` divides by the number of days that had incidents, not by
/// the window length. Ties for the peak go to the earliest day.
pub fn incident_trend(incidents: &[Incident]) -> IncidentTrend {
    let mut by_day: BTreeMap<String, usize> = BTreeMap::new();
    for incident in incidents {
        let day = incident.detected_at.format("%Y-%m-%d").to_string();
        *by_day.entry(day).or_insert(0) += 1;
    }

    let days = by_day.len();
    let avg_per_day = if days > 0 {
        ((incidents.len() as f64 / days as f64) * 100.0).round() / 100.0
    } else {
        0.0
    };

    let peak_day = by_day
        .iter()
        .fold(PeakDay::default(), |peak, (day, count)| {
            if *count > peak.count {
                PeakDay {
                    day: day.clone(),
                    count: *count,
                }
            } else {
                peak
            }
        });

    IncidentTrend {
        total_incidents: incidents.len(),
        avg_per_day,
        peak_day,
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::Duration;

    pub(crate) fn incident(
        id: &str,
        title: &str,
        severity: Severity,
        status: IncidentStatus,
        detected_at: DateTime<Utc>,
    ) -> Incident {
        Incident {
            id: id.to_string(),
            service_id: "svc-1".to_string(),
            title: title.to_string(),
            description: None,
            severity,
            status,
            detected_at,
            resolved_at: None,
            duration: None,
        }
    }

    fn day(d: u32, h: u32) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(&format!("2025-04-{:02}T{:02}:00:00Z", d, h))
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn test_impact_combines_severity_and_duration() {
        let mut inc = incident("i1", "db down", Severity::High, IncidentStatus::Resolved, day(1, 0));
        assert_eq!(
            incident_impact(&inc),
            IncidentImpact {
                score: 3,
                level: ImpactLevel::Medium
            }
        );

        // 6 hours -> +3
        inc.duration = Some(6 * 3_600_000);
        assert_eq!(incident_impact(&inc).score, 6);
        assert_eq!(incident_impact(&inc).level, ImpactLevel::High);

        // duration points cap at 10
        inc.duration = Some(100 * 3_600_000);
        assert_eq!(incident_impact(&inc).score, 13);
    }

    #[test]
    fn test_low_severity_short_incident() {
        let inc = incident("i1", "flaky", Severity::Low, IncidentStatus::Closed, day(1, 0));
        assert_eq!(incident_impact(&inc).level, ImpactLevel::Low);
    }

    #[test]
    fn test_summary_counts_and_resolution_time() {
        let mut resolved = incident("a", "x", Severity::Low, IncidentStatus::Resolved, day(1, 0));
        resolved.duration = Some(30 * 60_000);
        let mut closed = incident("b", "y", Severity::Low, IncidentStatus::Closed, day(1, 0));
        closed.duration = Some(90 * 60_000);
        let open = incident("c", "z", Severity::Critical, IncidentStatus::Open, day(2, 0));
        let investigating =
            incident("d", "w", Severity::High, IncidentStatus::Investigating, day(2, 0));

        let summary = incident_summary(&[resolved, closed, open, investigating]);
        assert_eq!(summary.total, 4);
        assert_eq!(summary.active_count, 2);
        assert_eq!(summary.by_severity["LOW"], 2);
        assert_eq!(summary.by_status["OPEN"], 1);
        assert_eq!(summary.avg_resolution_time, 60);
    }

    #[test]
    fn test_resolution_time_with_huge_durations() {
        let half = u64::MAX / 2 + 1;
        let mut a = incident("a", "x", Severity::Low, IncidentStatus::Resolved, day(1, 0));
        a.duration = Some(half);
        let mut b = incident("b", "y", Severity::Low, IncidentStatus::Resolved, day(1, 0));
        b.duration = Some(half);

        let summary = incident_summary(&[a, b]);
        assert_eq!(
            summary.avg_resolution_time,
            (half as f64 / MS_PER_MINUTE).round() as u64
        );
    }

    #[test]
    fn test_trend_groups_by_day() {
        let incidents = vec![
            incident("a", "x", Severity::Low, IncidentStatus::Open, day(1, 3)),
            incident("b", "x", Severity::Low, IncidentStatus::Open, day(2, 3)),
            incident("c", "x", Severity::Low, IncidentStatus::Open, day(2, 9)),
        ];
        let trend = incident_trend(&incidents);
        assert_eq!(trend.total_incidents, 3);
        assert_eq!(trend.avg_per_day, 1.5);
        assert_eq!(trend.peak_day.day, "2025-04-02");
        assert_eq!(trend.peak_day.count, 2);

        let empty = incident_trend(&[]);
        assert_eq!(empty.avg_per_day, 0.0);
        assert_eq!(empty.peak_day.count, 0);
    }

    #[test]
    fn test_trend_rounds_to_two_decimals() {
        let base = day(1, 0);
        let incidents: Vec<Incident> = (0..3)
            .map(|i| {
                incident(
                    &format!("i{}", i),
                    "x",
                    Severity::Low,
                    IncidentStatus::Open,
                    base + Duration::days(i % 2 * 2) + Duration::hours(i),
                )
            })
            .chain(std::iter::once(incident(
                "z",
                "x",
                Severity::Low,
                IncidentStatus::Open,
                base + Duration::days(5),
            )))
            .collect();
        // 4 incidents over 3 distinct days
        assert_eq!(incident_trend(&incidents).avg_per_day, 1.33);
    }
}

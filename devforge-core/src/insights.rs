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

//! Rule-based observations over aggregated metrics and platform scores.

use crate::aggregate::{AggregatedMetric, Trend};
use crate::metric::{ERROR_RATE, RESPONSE_TIME};
use crate::scoring::{overall_health, CategoryScores, PlatformCategory};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const ANOMALY_FACTOR: f64 = 1.5;

/// Entity counts reported next to the platform analysis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformStatistics {
    pub services: usize,
    pub teams: usize,
    pub users: usize,
}

/// Observations in metric-name order.
pub fn metric_insights(metrics: &BTreeMap<String, AggregatedMetric>) -> Vec<String> {
    let mut insights = Vec::new();

    for (name, data) in metrics {
        if data.trend == Trend::Increasing && name == ERROR_RATE {
            insights.push(format!(
                "Error rate is increasing ({}). Current: {}{}",
                data.trend.as_str(),
                data.current,
                data.unit
            ));
        }

        if data.trend == Trend::Increasing && name == RESPONSE_TIME {
            insights.push(format!(
                "Response time is degrading ({}). Average: {:.2}{}",
                data.trend.as_str(),
                data.average,
                data.unit
            ));
        }

        if data.current > data.average * ANOMALY_FACTOR {
            insights.push(format!(
                "Current {} ({}{}) is significantly above average ({:.2}{})",
                name, data.current, data.unit, data.average, data.unit
            ));
        }
    }

    insights
}

pub fn platform_insights(categories: &CategoryScores, stats: &PlatformStatistics) -> Vec<String> {
    let mut insights = vec![
        format!(
            "Platform health score is {:.1}/100",
            overall_health(categories).score
        ),
        format!(
            "Managing {} services across {} teams",
            stats.services, stats.teams
        ),
    ];

    let below = |category: PlatformCategory, threshold: f64| {
        categories
            .get(&category)
            .map(|c| c.score < threshold)
            .unwrap_or(false)
    };

    if below(PlatformCategory::Performance, 80.0) {
        insights.push("Some services may need performance attention".to_string());
    }
    if below(PlatformCategory::Reliability, 95.0) {
        insights.push("Deployment success rate could be improved".to_string());
    }

    insights
}

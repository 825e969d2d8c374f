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

//! Metric aggregation
//!
//! Groups raw samples by metric name and summarises each group:
//!
//! ```text
//! current   = value of the chronologically last sample
//! average   = arithmetic mean
//! trend     = mean(second half) vs mean(first half), first half = ⌊n/2⌋ samples
//! ```
//!
//! Two trend conventions coexist. The analytics tools use a ±10% band and
//! report `stable` for short series; the service catalog uses a ±5% band and
//! reports `unknown`. They are separate [`TrendPolicy`] values on purpose.

use crate::metric::{MetricSample, ERROR_RATE, RESPONSE_TIME, THROUGHPUT};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Coarse direction of a metric over its window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Increasing,
    Decreasing,
    Stable,
    Unknown,
}

impl Trend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Trend::Increasing => "increasing",
            Trend::Decreasing => "decreasing",
            Trend::Stable => "stable",
            Trend::Unknown => "unknown",
        }
    }
}

/// Band and short-series label used by [`classify_trend`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrendPolicy {
    /// Percentage change that must be exceeded to leave `stable`
    pub threshold_pct: f64,
    /// Reported when fewer than two samples are available
    pub short_series: Trend,
}

impl TrendPolicy {
    /// Convention of the metrics/analytics tools.
    pub const ANALYTICS: TrendPolicy = TrendPolicy {
        threshold_pct: 10.0,
        short_series: Trend::Stable,
    };

    /// Convention of the service catalog.
    pub const CATALOG: TrendPolicy = TrendPolicy {
        threshold_pct: 5.0,
        short_series: Trend::Unknown,
    };
}

/// One point of an aggregated time series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimePoint {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

/// Summary of one metric over the query window. Recomputed per query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedMetric {
    pub current: f64,
    pub average: f64,
    pub min: f64,
    pub max: f64,
    pub trend: Trend,
    pub data_points: usize,
    pub unit: String,
    pub timeseries: Vec<TimePoint>,
}

/// Partition `samples` by name and summarise each partition.
///
/// Input order is irrelevant; every partition is sorted by timestamp before
/// anything is computed. Empty input yields an empty map.
pub fn aggregate_metrics(
    samples: &[MetricSample],
    policy: TrendPolicy,
) -> BTreeMap<String, AggregatedMetric> {
    let mut grouped: BTreeMap<&str, Vec<&MetricSample>> = BTreeMap::new();
    for sample in samples {
        grouped.entry(sample.name.as_str()).or_default().push(sample);
    }

    grouped
        .into_iter()
        .filter_map(|(name, mut group)| {
            group.sort_by_key(|s| s.timestamp);
            summarize(&group, policy).map(|agg| (name.to_string(), agg))
        })
        .collect()
}

fn summarize(sorted: &[&MetricSample], policy: TrendPolicy) -> Option<AggregatedMetric> {
    let last = sorted.last()?;
    let values: Vec<f64> = sorted.iter().map(|s| s.value).collect();

    let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);

    Some(AggregatedMetric {
        current: last.value,
        average: mean(&values),
        min,
        max,
        trend: classify_trend(&values, policy),
        data_points: values.len(),
        unit: sorted[0].unit.clone(),
        timeseries: sorted
            .iter()
            .map(|s| TimePoint {
                timestamp: s.timestamp,
                value: s.value,
            })
            .collect(),
    })
}

/// Classify time-ordered `values` by comparing the mean of the second half
/// against the mean of the first half.
///
/// A zero first-half mean has no defined percentage change; the sign of the
/// second-half mean decides instead.
pub fn classify_trend(values: &[f64], policy: TrendPolicy) -> Trend {
    if values.len() < 2 {
        return policy.short_series;
    }

    let (first, second) = values.split_at(values.len() / 2);
    let first_avg = mean(first);
    let second_avg = mean(second);

    if first_avg == 0.0 {
        return if second_avg > 0.0 {
            Trend::Increasing
        } else if second_avg < 0.0 {
            Trend::Decreasing
        } else {
            Trend::Stable
        };
    }

    let change = (second_avg - first_avg) / first_avg * 100.0;
    if change > policy.threshold_pct {
        Trend::Increasing
    } else if change < -policy.threshold_pct {
        Trend::Decreasing
    } else {
        Trend::Stable
    }
}

pub(crate) fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Per-metric performance scores derived from aggregated averages.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceScores {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_time: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_rate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub throughput: Option<f64>,
}

/// Score the well-known metrics present in `metrics`.
///
/// - response time: 100 at 0ms, 0 at 1000ms and beyond
/// - error rate: 100 at 0%, 0 at 10% and beyond
/// - throughput: logarithmic, capped at 100
pub fn performance_scores(metrics: &BTreeMap<String, AggregatedMetric>) -> PerformanceScores {
    PerformanceScores {
        response_time: metrics
            .get(RESPONSE_TIME)
            .map(|m| (100.0 - m.average / 10.0).max(0.0)),
        error_rate: metrics
            .get(ERROR_RATE)
            .map(|m| (100.0 - m.average * 10.0).max(0.0)),
        throughput: metrics
            .get(THROUGHPUT)
            .map(|m| ((m.average + 1.0).log10() * 50.0).min(100.0)),
    }
}

/// Nullable average and trend for one catalog metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricDigest {
    pub average: Option<f64>,
    pub trend: Trend,
    pub unit: String,
}

/// Fixed three-metric digest shown on a service's catalog page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogPerformance {
    pub response_time: MetricDigest,
    pub error_rate: MetricDigest,
    pub throughput: MetricDigest,
}

/// Build the catalog digest from recent samples of a single service,
/// using the catalog trend convention.
pub fn catalog_performance(samples: &[MetricSample]) -> CatalogPerformance {
    let digest = |name: &str, unit: &str| {
        let mut series: Vec<&MetricSample> = samples.iter().filter(|s| s.name == name).collect();
        series.sort_by_key(|s| s.timestamp);
        let values: Vec<f64> = series.iter().map(|s| s.value).collect();
        MetricDigest {
            average: (!values.is_empty()).then(|| mean(&values)),
            trend: classify_trend(&values, TrendPolicy::CATALOG),
            unit: unit.to_string(),
        }
    };

    CatalogPerformance {
        response_time: digest(RESPONSE_TIME, "ms"),
        error_rate: digest(ERROR_RATE, "%"),
        throughput: digest(THROUGHPUT, "req/s"),
    }
}

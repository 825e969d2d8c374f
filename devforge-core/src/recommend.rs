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

use crate::scoring::{CategoryScores, PlatformCategory};

/// Categories scoring below this get an advisory.
pub const RECOMMENDATION_THRESHOLD: f64 = 80.0;

pub fn advisory(category: PlatformCategory) -> &'static str {
    match category {
        PlatformCategory::Security => {
            "Consider implementing additional security monitoring and incident response procedures"
        }
        PlatformCategory::Performance => {
            "Review service performance metrics and consider optimization or scaling"
        }
        PlatformCategory::Reliability => {
            "Improve deployment processes and implement better testing procedures"
        }
        PlatformCategory::Cost => {
            "Analyze resource usage and consider cost optimization opportunities"
        }
        PlatformCategory::Compliance => {
            "Review compliance requirements and implement missing controls"
        }
    }
}

/// Advisories for low-scoring categories, in category order.
///
/// An empty `focus_areas` means every category is considered.
pub fn recommendations(categories: &CategoryScores, focus_areas: &[PlatformCategory]) -> Vec<String> {
    categories
        .iter()
        .filter(|(category, _)| focus_areas.is_empty() || focus_areas.contains(category))
        .filter(|(_, score)| score.score < RECOMMENDATION_THRESHOLD)
        .map(|(category, _)| advisory(*category).to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::{CategoryScore, CategoryStatus};

    fn scores(pairs: &[(PlatformCategory, f64)]) -> CategoryScores {
        pairs
            .iter()
            .map(|(c, s)| {
                (
                    *c,
                    CategoryScore {
                        score: *s,
                        status: CategoryStatus::Warning,
                    },
                )
            })
            .collect()
    }

    #[test]
    fn test_threshold_is_exclusive() {
        let at = scores(&[(PlatformCategory::Cost, 80.0)]);
        assert!(recommendations(&at, &[]).is_empty());

        let below = scores(&[(PlatformCategory::Cost, 79.0)]);
        assert_eq!(
            recommendations(&below, &[]),
            vec!["Analyze resource usage and consider cost optimization opportunities".to_string()]
        );
    }

    #[test]
    fn test_focus_areas_filter() {
        let all_low = scores(&[
            (PlatformCategory::Security, 10.0),
            (PlatformCategory::Reliability, 10.0),
            (PlatformCategory::Compliance, 10.0),
        ]);

        let focused = recommendations(&all_low, &[PlatformCategory::Reliability]);
        assert_eq!(focused, vec![advisory(PlatformCategory::Reliability).to_string()]);

        assert_eq!(recommendations(&all_low, &[]).len(), 3);
    }
}
